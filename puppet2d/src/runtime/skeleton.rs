use crate::{
    AttachmentData, BlendMode, Error, Inherit, PositionMode, RotateMode, SkeletonData, SpacingMode,
    Vertices,
};
use glam::{Mat2, Vec2};
use std::sync::Arc;

/// A bone's animated local transform. Rebuilt from rest data at the start of
/// every frame, then mutated in place by timelines.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocalPose {
    pub rotation: f32,
    pub position: Vec2,
    pub scale: Vec2,
}

impl From<&crate::BoneData> for LocalPose {
    fn from(rest: &crate::BoneData) -> Self {
        Self {
            rotation: rest.rotation,
            position: rest.position,
            scale: rest.scale,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Bone {
    data_index: usize,
    parent: Option<usize>,
    pub inherit: Inherit,
    pub pose: LocalPose,
    /// Rotation and scale composed into a 2×2 linear map. Places child-local
    /// and attachment-local points into world space together with
    /// `world_position`.
    pub world: Mat2,
    pub world_position: Vec2,
    /// Set when a constraint wrote this bone's world state directly; cleared
    /// whenever the world state is recomputed from the local pose.
    pub modified: bool,
}

impl Bone {
    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn parent_index(&self) -> Option<usize> {
        self.parent
    }

    /// World rotation in degrees, extracted from the map's first column.
    pub fn world_rotation(&self) -> f32 {
        self.world.x_axis.y.atan2(self.world.x_axis.x).to_degrees()
    }

    /// Per-axis world scale: Euclidean norms of the map's columns.
    pub fn world_scale(&self) -> Vec2 {
        Vec2::new(self.world.x_axis.length(), self.world.y_axis.length())
    }

    pub fn world_point(&self, local: Vec2) -> Vec2 {
        self.world * local + self.world_position
    }
}

#[derive(Clone, Debug)]
pub struct Slot {
    data_index: usize,
    pub bone: usize,
    pub attachment: Option<String>,
    pub color: [f32; 4],
    pub dark_color: [f32; 4],
    pub blend: BlendMode,
    pub draw_order: usize,
}

impl Slot {
    pub fn data_index(&self) -> usize {
        self.data_index
    }
}

/// Per-frame working copy of an attachment's vertices. Deform timelines add
/// offsets onto these buffers after they are rebuilt from rest data.
#[derive(Clone, Debug, Default)]
pub struct AttachmentPose {
    pub vertices: Vec<Vec2>,
    /// Working bone-local offsets, one per influence, for weighted attachments.
    pub weighted_offsets: Vec<Vec<Vec2>>,
}

#[derive(Clone, Debug)]
pub struct TransformConstraint {
    data_index: usize,
    pub bones: Vec<usize>,
    pub target: usize,
    pub mix_rotate: f32,
    pub mix_offset: f32,
    pub mix_scale: f32,
}

impl TransformConstraint {
    pub fn data_index(&self) -> usize {
        self.data_index
    }
}

#[derive(Clone, Debug)]
pub struct PathConstraint {
    data_index: usize,
    pub bones: Vec<usize>,
    /// Slot index.
    pub target: usize,
    pub position: f32,
    pub spacing: f32,
    pub mix_rotate: f32,
    pub mix_offset: f32,
}

impl PathConstraint {
    pub fn data_index(&self) -> usize {
        self.data_index
    }
}

/// How world state is pushed forward after constraints write bones directly.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub enum Repropagation {
    /// Skip unmodified subtrees. When an ancestor and one of its descendants
    /// were both modified in the same frame, the ancestor's forced pass
    /// overwrites the descendant's result.
    #[default]
    Subtree,
    /// One parent-before-child pass that recomputes every clean bone and keeps
    /// every constrained bone's value.
    FullPass,
}

#[derive(Clone, Debug)]
pub struct Skeleton {
    pub data: Arc<SkeletonData>,
    pub bones: Vec<Bone>,
    children: Vec<Vec<usize>>,
    pub slots: Vec<Slot>,
    pub attachment_poses: Vec<AttachmentPose>,
    pub transform_constraints: Vec<TransformConstraint>,
    pub path_constraints: Vec<PathConstraint>,
    repropagation: Repropagation,
}

impl Skeleton {
    /// Builds the runtime skeleton, validating every cross-reference and
    /// rejecting constraint configurations outside the supported subset.
    pub fn new(data: Arc<SkeletonData>) -> Result<Self, Error> {
        validate(&data)?;

        let bones = data
            .bones
            .iter()
            .enumerate()
            .map(|(data_index, rest)| Bone {
                data_index,
                parent: rest.parent,
                inherit: rest.inherit,
                pose: LocalPose::from(rest),
                world: Mat2::IDENTITY,
                world_position: Vec2::ZERO,
                modified: false,
            })
            .collect::<Vec<_>>();

        let mut children = vec![Vec::new(); bones.len()];
        for (index, bone) in bones.iter().enumerate() {
            if let Some(parent) = bone.parent {
                children[parent].push(index);
            }
        }

        let slots = data
            .slots
            .iter()
            .enumerate()
            .map(|(data_index, rest)| Slot {
                data_index,
                bone: rest.bone,
                attachment: rest.attachment.clone(),
                color: rest.color,
                dark_color: rest.dark_color,
                blend: rest.blend,
                draw_order: data_index,
            })
            .collect::<Vec<_>>();

        let attachment_poses = data
            .attachments
            .iter()
            .map(|attachment| {
                let mut pose = AttachmentPose::default();
                rebuild_attachment_pose(&mut pose, attachment);
                pose
            })
            .collect::<Vec<_>>();

        let transform_constraints = data
            .transform_constraints
            .iter()
            .enumerate()
            .map(|(data_index, c)| TransformConstraint {
                data_index,
                bones: c.bones.clone(),
                target: c.target,
                mix_rotate: c.mix_rotate,
                mix_offset: c.mix_offset,
                mix_scale: c.mix_scale,
            })
            .collect::<Vec<_>>();

        let path_constraints = data
            .path_constraints
            .iter()
            .enumerate()
            .map(|(data_index, c)| PathConstraint {
                data_index,
                bones: c.bones.clone(),
                target: c.target,
                position: c.position,
                spacing: c.spacing,
                mix_rotate: c.mix_rotate,
                mix_offset: c.mix_offset,
            })
            .collect::<Vec<_>>();

        Ok(Self {
            data,
            bones,
            children,
            slots,
            attachment_poses,
            transform_constraints,
            path_constraints,
            repropagation: Repropagation::default(),
        })
    }

    pub fn repropagation(&self) -> Repropagation {
        self.repropagation
    }

    pub fn set_repropagation(&mut self, mode: Repropagation) {
        self.repropagation = mode;
    }

    /// Returns all runtime state to the rest pose. Runs at the start of every
    /// frame so a track that is silent for part of the clip cannot leave a
    /// stale value from a previous update behind.
    pub fn reset_to_rest(&mut self) {
        for (bone, rest) in self.bones.iter_mut().zip(self.data.bones.iter()) {
            bone.pose = LocalPose::from(rest);
            bone.modified = false;
        }
        for (index, (slot, rest)) in self
            .slots
            .iter_mut()
            .zip(self.data.slots.iter())
            .enumerate()
        {
            slot.attachment = rest.attachment.clone();
            slot.color = rest.color;
            slot.dark_color = rest.dark_color;
            slot.draw_order = index;
        }
        for (pose, attachment) in self
            .attachment_poses
            .iter_mut()
            .zip(self.data.attachments.iter())
        {
            rebuild_attachment_pose(pose, attachment);
        }
        for (constraint, rest) in self
            .transform_constraints
            .iter_mut()
            .zip(self.data.transform_constraints.iter())
        {
            constraint.mix_rotate = rest.mix_rotate;
            constraint.mix_offset = rest.mix_offset;
            constraint.mix_scale = rest.mix_scale;
        }
    }

    /// Computes every bone's world transform from its local pose, depth-first
    /// from the roots.
    pub fn update_world_transform(&mut self) {
        let mut stack = self.root_indices();
        while let Some(index) = stack.pop() {
            self.compute_world(index);
            stack.extend(self.children[index].iter().copied());
        }
    }

    /// Pushes constraint-written world state forward to descendants. See
    /// [`Repropagation`] for the two strategies.
    pub fn propagate_modified(&mut self) {
        match self.repropagation {
            Repropagation::Subtree => {
                let mut stack: Vec<(usize, bool)> = self
                    .root_indices()
                    .into_iter()
                    .map(|index| (index, false))
                    .collect();
                while let Some((index, forced)) = stack.pop() {
                    let modified = std::mem::take(&mut self.bones[index].modified);
                    let force_children = if forced {
                        // A forced pass recomputes this bone even if a
                        // constraint also wrote it; the constraint result is
                        // overwritten.
                        self.compute_world(index);
                        true
                    } else {
                        modified
                    };
                    for &child in &self.children[index] {
                        stack.push((child, force_children));
                    }
                }
            }
            Repropagation::FullPass => {
                // Bones are parent-before-child, so one forward pass sees every
                // parent's final world state before its children.
                for index in 0..self.bones.len() {
                    if std::mem::take(&mut self.bones[index].modified) {
                        continue;
                    }
                    self.compute_world(index);
                }
            }
        }
    }

    /// Slot indices sorted by current draw order (stable against the setup
    /// order for equal values).
    pub fn draw_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.slots.len()).collect();
        order.sort_by_key(|&index| self.slots[index].draw_order);
        order
    }

    /// Resolves a slot's current attachment, if any.
    pub fn slot_attachment(&self, slot_index: usize) -> Option<(usize, &AttachmentData)> {
        let name = self.slots.get(slot_index)?.attachment.as_deref()?;
        self.data.attachment(slot_index, name)
    }

    /// World position of one logical vertex of an attachment, blending
    /// weighted influences or mapping through the given bone for rigid data.
    pub fn attachment_world_vertex(&self, attachment_index: usize, vertex: usize) -> Option<Vec2> {
        let pose = self.attachment_poses.get(attachment_index)?;
        match self.data.attachments.get(attachment_index)?.vertices()? {
            Vertices::Rigid(_) => {
                let slot = self.data.attachments[attachment_index].slot();
                let bone = &self.bones[self.data.slots.get(slot)?.bone];
                Some(bone.world_point(*pose.vertices.get(vertex)?))
            }
            Vertices::Weighted(weights) => {
                let influences = weights.get(vertex)?;
                let offsets = pose.weighted_offsets.get(vertex)?;
                let mut point = Vec2::ZERO;
                for (influence, offset) in influences.iter().zip(offsets.iter()) {
                    point += self.bones[influence.bone].world_point(*offset) * influence.weight;
                }
                Some(point)
            }
        }
    }

    fn root_indices(&self) -> Vec<usize> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| bone.parent.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    pub(crate) fn compute_world(&mut self, index: usize) {
        let pose = self.bones[index].pose;
        let inherit = self.bones[index].inherit;
        let local = Mat2::from_angle(pose.rotation.to_radians()) * Mat2::from_diagonal(pose.scale);

        let (world, world_position) = match self.bones[index].parent {
            None => (local, pose.position),
            Some(parent_index) => {
                let parent = &self.bones[parent_index];
                let position = parent.world * pose.position + parent.world_position;
                let world = match inherit {
                    Inherit::Normal => parent.world * local,
                    Inherit::OnlyTranslation => local,
                    Inherit::NoRotationOrReflection => {
                        // Cancel the parent's rotation before composing so only
                        // its scale flows through.
                        let parent_rotation = parent.world_rotation();
                        parent.world
                            * Mat2::from_angle((pose.rotation - parent_rotation).to_radians())
                            * Mat2::from_diagonal(pose.scale)
                    }
                    Inherit::NoScale | Inherit::NoScaleOrReflection => {
                        // Divide out the parent's extracted scale so only its
                        // rotation flows through. A near-zero axis is a known
                        // degenerate input and is left unguarded.
                        let scale = parent.world_scale();
                        let unscaled = Mat2::from_cols(
                            parent.world.x_axis / scale.x,
                            parent.world.y_axis / scale.y,
                        );
                        unscaled * local
                    }
                };
                (world, position)
            }
        };

        let bone = &mut self.bones[index];
        bone.world = world;
        bone.world_position = world_position;
        bone.modified = false;
    }
}

fn rebuild_attachment_pose(pose: &mut AttachmentPose, attachment: &AttachmentData) {
    match attachment.vertices() {
        Some(Vertices::Rigid(points)) => {
            pose.vertices.clear();
            pose.vertices.extend_from_slice(points);
            pose.weighted_offsets.clear();
        }
        Some(Vertices::Weighted(points)) => {
            pose.vertices.clear();
            pose.weighted_offsets.clear();
            pose.weighted_offsets.extend(
                points
                    .iter()
                    .map(|influences| influences.iter().map(|w| w.offset).collect::<Vec<_>>()),
            );
        }
        None => {
            pose.vertices.clear();
            pose.weighted_offsets.clear();
        }
    }
}

fn validate(data: &SkeletonData) -> Result<(), Error> {
    let bone_count = data.bones.len();
    let slot_count = data.slots.len();

    for (index, bone) in data.bones.iter().enumerate() {
        if let Some(parent) = bone.parent {
            if parent >= index {
                return Err(Error::InvalidBoneParent {
                    bone: bone.name.clone(),
                    parent,
                });
            }
        }
    }

    for slot in &data.slots {
        if slot.bone >= bone_count {
            return Err(Error::BoneOutOfRange {
                context: format!("slot '{}'", slot.name),
                index: slot.bone,
                count: bone_count,
            });
        }
    }

    for attachment in &data.attachments {
        if attachment.slot() >= slot_count {
            return Err(Error::SlotOutOfRange {
                context: format!("attachment '{}'", attachment.name()),
                index: attachment.slot(),
                count: slot_count,
            });
        }
        if let Some(Vertices::Weighted(points)) = attachment.vertices() {
            for influence in points.iter().flatten() {
                if influence.bone >= bone_count {
                    return Err(Error::BoneOutOfRange {
                        context: format!("attachment '{}'", attachment.name()),
                        index: influence.bone,
                        count: bone_count,
                    });
                }
            }
        }
    }

    for constraint in &data.transform_constraints {
        if constraint.local || constraint.relative {
            return Err(Error::UnsupportedTransformConstraintMode {
                constraint: constraint.name.clone(),
            });
        }
        if constraint.target >= bone_count {
            return Err(Error::BoneOutOfRange {
                context: format!("transform constraint '{}'", constraint.name),
                index: constraint.target,
                count: bone_count,
            });
        }
        for &bone in &constraint.bones {
            if bone >= bone_count {
                return Err(Error::BoneOutOfRange {
                    context: format!("transform constraint '{}'", constraint.name),
                    index: bone,
                    count: bone_count,
                });
            }
        }
    }

    for constraint in &data.path_constraints {
        if constraint.position_mode != PositionMode::Percent {
            return Err(Error::UnsupportedPathConstraintMode {
                constraint: constraint.name.clone(),
                field: "position mode".to_string(),
                value: format!("{:?}", constraint.position_mode),
            });
        }
        if constraint.spacing_mode != SpacingMode::Percent {
            return Err(Error::UnsupportedPathConstraintMode {
                constraint: constraint.name.clone(),
                field: "spacing mode".to_string(),
                value: format!("{:?}", constraint.spacing_mode),
            });
        }
        if constraint.rotate_mode != RotateMode::ChainScale {
            return Err(Error::UnsupportedPathConstraintMode {
                constraint: constraint.name.clone(),
                field: "rotate mode".to_string(),
                value: format!("{:?}", constraint.rotate_mode),
            });
        }
        if constraint.target >= slot_count {
            return Err(Error::SlotOutOfRange {
                context: format!("path constraint '{}'", constraint.name),
                index: constraint.target,
                count: slot_count,
            });
        }
        for &bone in &constraint.bones {
            if bone >= bone_count {
                return Err(Error::BoneOutOfRange {
                    context: format!("path constraint '{}'", constraint.name),
                    index: bone,
                    count: bone_count,
                });
            }
        }
    }

    Ok(())
}
