//! Immutable skeleton definition data.
//!
//! Everything in this module is produced by an external loader, validated by
//! [`Skeleton::new`](crate::Skeleton::new) / [`Player::set_clip`](crate::Player),
//! and never mutated afterwards. Runtime pose state lives in [`crate::runtime`].

use glam::Vec2;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct BoneData {
    pub name: String,
    pub parent: Option<usize>,
    /// Authored bone length; carried through for tooling, unused by evaluation.
    pub length: f32,
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
    /// Parsed but not evaluated.
    pub shear: Vec2,
    pub inherit: Inherit,
}

/// Which parts of the parent's world transform a bone inherits.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Inherit {
    #[default]
    Normal,
    OnlyTranslation,
    NoRotationOrReflection,
    NoScale,
    NoScaleOrReflection,
}

#[derive(Clone, Debug)]
pub struct SlotData {
    pub name: String,
    pub bone: usize,
    pub attachment: Option<String>,
    pub color: [f32; 4],
    /// Secondary multiply color for two-color tinting.
    pub dark_color: [f32; 4],
    pub blend: BlendMode,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Additive,
    Multiply,
    Screen,
}

#[derive(Clone, Debug)]
pub struct VertexWeight {
    pub bone: usize,
    /// Offset from the influencing bone, in that bone's local space.
    pub offset: Vec2,
    pub weight: f32,
}

/// Attachment vertex storage. Weights for one logical point sum to 1.
#[derive(Clone, Debug)]
pub enum Vertices {
    Rigid(Vec<Vec2>),
    Weighted(Vec<Vec<VertexWeight>>),
}

impl Vertices {
    pub fn len(&self) -> usize {
        match self {
            Vertices::Rigid(points) => points.len(),
            Vertices::Weighted(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug)]
pub struct RegionAttachmentData {
    pub name: String,
    pub slot: usize,
    pub path: String,
    pub color: [f32; 4],
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
    /// Quad extents in bone space; the quad is centered on `position`.
    pub size: Vec2,
}

#[derive(Clone, Debug)]
pub struct MeshAttachmentData {
    pub name: String,
    pub slot: usize,
    pub path: String,
    pub color: [f32; 4],
    pub vertices: Vertices,
    pub uvs: Vec<Vec2>,
    pub triangles: Vec<u16>,
}

#[derive(Clone, Debug)]
pub struct PathAttachmentData {
    pub name: String,
    pub slot: usize,
    /// Stored as triples: two Bezier control points, then the on-curve point.
    pub vertices: Vertices,
    pub lengths: Vec<f32>,
    pub closed: bool,
    pub constant_speed: bool,
}

#[derive(Clone, Debug)]
pub struct ClippingAttachmentData {
    pub name: String,
    pub slot: usize,
    pub vertices: Vertices,
    pub end_slot: Option<usize>,
}

/// An attachment is uniquely keyed by (slot index, name); skins may reuse a
/// name across slots.
#[derive(Clone, Debug)]
pub enum AttachmentData {
    Region(RegionAttachmentData),
    Mesh(MeshAttachmentData),
    Path(PathAttachmentData),
    Clipping(ClippingAttachmentData),
}

impl AttachmentData {
    pub fn name(&self) -> &str {
        match self {
            AttachmentData::Region(a) => a.name.as_str(),
            AttachmentData::Mesh(a) => a.name.as_str(),
            AttachmentData::Path(a) => a.name.as_str(),
            AttachmentData::Clipping(a) => a.name.as_str(),
        }
    }

    pub fn slot(&self) -> usize {
        match self {
            AttachmentData::Region(a) => a.slot,
            AttachmentData::Mesh(a) => a.slot,
            AttachmentData::Path(a) => a.slot,
            AttachmentData::Clipping(a) => a.slot,
        }
    }

    /// Vertex storage for kinds that carry vertices; region quads are implicit.
    pub fn vertices(&self) -> Option<&Vertices> {
        match self {
            AttachmentData::Region(_) => None,
            AttachmentData::Mesh(a) => Some(&a.vertices),
            AttachmentData::Path(a) => Some(&a.vertices),
            AttachmentData::Clipping(a) => Some(&a.vertices),
        }
    }
}

/// Easing between a keyframe and its successor. Attached to the earlier frame
/// of the pair; the last frame of a track carries no meaningful curve.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub enum Curve {
    #[default]
    Linear,
    Stepped,
    Bezier {
        cx1: f32,
        cy1: f32,
        cx2: f32,
        cy2: f32,
    },
}

#[derive(Clone, Debug)]
pub struct RotateFrame {
    pub time: f32,
    /// Delta from the rest rotation, in degrees.
    pub angle: f32,
    pub curve: Curve,
}

#[derive(Clone, Debug)]
pub struct Vec2Frame {
    pub time: f32,
    pub value: Vec2,
    pub curve: Curve,
}

#[derive(Clone, Debug)]
pub struct AttachmentFrame {
    pub time: f32,
    pub name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ColorFrame {
    pub time: f32,
    pub color: [f32; 4],
    pub curve: Curve,
}

#[derive(Clone, Debug)]
pub struct TwoColorFrame {
    pub time: f32,
    pub light: [f32; 4],
    pub dark: [f32; 4],
    pub curve: Curve,
}

/// Deform offsets are deltas from the rest vertices, matching the target
/// attachment's storage: per vertex when rigid, per influence when weighted.
#[derive(Clone, Debug)]
pub enum DeformOffsets {
    Rigid(Vec<Vec2>),
    Weighted(Vec<Vec<Vec2>>),
}

#[derive(Clone, Debug)]
pub struct DeformFrame {
    pub time: f32,
    pub offsets: DeformOffsets,
    pub curve: Curve,
}

#[derive(Clone, Debug)]
pub struct DrawOrderFrame {
    pub time: f32,
    /// Complete permutation: `order[i]` is the draw position of slot `i`.
    pub order: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct MixFrame {
    pub time: f32,
    pub rotate: f32,
    pub offset: f32,
    pub scale: f32,
    pub curve: Curve,
}

#[derive(Clone, Debug)]
pub struct RotateTimeline {
    pub bone: usize,
    pub frames: Vec<RotateFrame>,
}

#[derive(Clone, Debug)]
pub struct TranslateTimeline {
    pub bone: usize,
    pub frames: Vec<Vec2Frame>,
}

#[derive(Clone, Debug)]
pub struct ScaleTimeline {
    pub bone: usize,
    pub frames: Vec<Vec2Frame>,
}

#[derive(Clone, Debug)]
pub struct ShearTimeline {
    pub bone: usize,
    pub frames: Vec<Vec2Frame>,
}

#[derive(Clone, Debug)]
pub struct AttachmentTimeline {
    pub slot: usize,
    pub frames: Vec<AttachmentFrame>,
}

#[derive(Clone, Debug)]
pub struct ColorTimeline {
    pub slot: usize,
    pub frames: Vec<ColorFrame>,
}

#[derive(Clone, Debug)]
pub struct TwoColorTimeline {
    pub slot: usize,
    pub frames: Vec<TwoColorFrame>,
}

#[derive(Clone, Debug)]
pub struct DeformTimeline {
    pub slot: usize,
    pub attachment: String,
    pub frames: Vec<DeformFrame>,
}

#[derive(Clone, Debug)]
pub struct DrawOrderTimeline {
    pub frames: Vec<DrawOrderFrame>,
}

#[derive(Clone, Debug)]
pub struct TransformMixTimeline {
    pub constraint: usize,
    pub frames: Vec<MixFrame>,
}

/// One animation track. The frame sequence is time-ascending and non-empty;
/// empty tracks are skipped (with a warning) when a clip is selected.
#[derive(Clone, Debug)]
pub enum Timeline {
    Rotate(RotateTimeline),
    Translate(TranslateTimeline),
    Scale(ScaleTimeline),
    /// Parsed for schema completeness, never evaluated.
    Shear(ShearTimeline),
    Attachment(AttachmentTimeline),
    Color(ColorTimeline),
    TwoColor(TwoColorTimeline),
    Deform(DeformTimeline),
    DrawOrder(DrawOrderTimeline),
    TransformMix(TransformMixTimeline),
}

#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    /// Max last-keyframe time across the clip's timelines.
    pub duration: f32,
    pub timelines: Vec<Timeline>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PositionMode {
    Fixed,
    Percent,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SpacingMode {
    Length,
    Fixed,
    Percent,
    Proportional,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RotateMode {
    Tangent,
    Chain,
    ChainScale,
}

#[derive(Clone, Debug)]
pub struct PathConstraintData {
    pub name: String,
    pub bones: Vec<usize>,
    /// Slot whose current attachment supplies the path.
    pub target: usize,
    pub position_mode: PositionMode,
    pub spacing_mode: SpacingMode,
    pub rotate_mode: RotateMode,
    pub position: f32,
    pub spacing: f32,
    pub mix_rotate: f32,
    pub mix_offset: f32,
}

#[derive(Clone, Debug)]
pub struct TransformConstraintData {
    pub name: String,
    pub bones: Vec<usize>,
    /// Source bone whose world transform is mixed into the dependents.
    pub target: usize,
    /// Local/relative spaces are not implemented and rejected at construction.
    pub local: bool,
    pub relative: bool,
    pub offset_rotation: f32,
    /// Offset in the target bone's local space.
    pub offset: Vec2,
    pub offset_scale: Vec2,
    pub mix_rotate: f32,
    pub mix_offset: f32,
    pub mix_scale: f32,
}

#[derive(Clone, Debug)]
pub struct SkeletonData {
    /// Parent-before-child order.
    pub bones: Vec<BoneData>,
    /// Slot index is the stable draw-order base.
    pub slots: Vec<SlotData>,
    pub attachments: Vec<AttachmentData>,
    /// Per-slot name → index into `attachments`.
    pub attachment_index: Vec<HashMap<String, usize>>,
    pub animations: Vec<AnimationClip>,
    pub animation_index: HashMap<String, usize>,
    pub transform_constraints: Vec<TransformConstraintData>,
    pub path_constraints: Vec<PathConstraintData>,
}

impl SkeletonData {
    pub fn animation(&self, name: &str) -> Option<(usize, &AnimationClip)> {
        let index = *self.animation_index.get(name)?;
        Some((index, &self.animations[index]))
    }

    pub fn attachment(&self, slot: usize, name: &str) -> Option<(usize, &AttachmentData)> {
        let index = *self.attachment_index.get(slot)?.get(name)?;
        Some((index, &self.attachments[index]))
    }

    /// Builds the per-slot attachment lookup; loaders call this once after
    /// assembling the flat attachment list.
    pub fn build_attachment_index(
        slot_count: usize,
        attachments: &[AttachmentData],
    ) -> Vec<HashMap<String, usize>> {
        let mut index = vec![HashMap::new(); slot_count];
        for (i, attachment) in attachments.iter().enumerate() {
            if let Some(slot_map) = index.get_mut(attachment.slot()) {
                slot_map.insert(attachment.name().to_string(), i);
            }
        }
        index
    }

    pub fn build_animation_index(animations: &[AnimationClip]) -> HashMap<String, usize> {
        animations
            .iter()
            .enumerate()
            .map(|(i, clip)| (clip.name.clone(), i))
            .collect()
    }
}
