//! Renderer-facing output: a flat draw list assembled from the evaluated pose,
//! plus pure blend-state descriptors. The crate never touches the GPU; a
//! backend walks [`DrawList`] and binds textures/blend state itself.

use crate::{AttachmentData, BlendMode, Skeleton};
use glam::{Mat2, Vec2};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

#[derive(Clone, Debug, PartialEq)]
pub struct Draw {
    /// Texture the backend should bind; empty for clip polygons.
    pub texture_path: String,
    pub blend: BlendMode,
    pub color: [f32; 4],
    pub dark_color: [f32; 4],
    pub first_index: usize,
    pub index_count: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawList {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub draws: Vec<Draw>,
}

impl DrawList {
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draws.clear();
    }
}

pub fn build_draw_list(skeleton: &Skeleton) -> DrawList {
    let mut out = DrawList::default();
    append_draw_list(&mut out, skeleton);
    out
}

/// Walks slots in current draw order and appends one batch per drawable
/// attachment. Path attachments produce no geometry; clip polygons are emitted
/// as texture-less fans for downstream stencil use.
pub fn append_draw_list(out: &mut DrawList, skeleton: &Skeleton) {
    for slot_index in skeleton.draw_order() {
        let Some((attachment_index, attachment)) = skeleton.slot_attachment(slot_index) else {
            continue;
        };
        let slot = &skeleton.slots[slot_index];

        match attachment {
            AttachmentData::Region(region) => {
                let bone = &skeleton.bones[slot.bone];
                let local =
                    Mat2::from_angle(region.rotation.to_radians()) * Mat2::from_diagonal(region.scale);
                let half = region.size * 0.5;
                let corners = [
                    Vec2::new(-half.x, half.y),
                    Vec2::new(half.x, half.y),
                    Vec2::new(half.x, -half.y),
                    Vec2::new(-half.x, -half.y),
                ];
                let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

                let base = out.vertices.len() as u32;
                for (corner, uv) in corners.iter().zip(uvs) {
                    let world = bone.world_point(local * *corner + region.position);
                    out.vertices.push(Vertex {
                        position: world.into(),
                        uv,
                    });
                }
                let indices = [base, base + 1, base + 2, base + 2, base + 3, base];
                push_draw(
                    out,
                    region.path.clone(),
                    slot.blend,
                    multiply_rgba(slot.color, region.color),
                    slot.dark_color,
                    &indices,
                );
            }
            AttachmentData::Mesh(mesh) => {
                let base = out.vertices.len() as u32;
                for vertex in 0..mesh.vertices.len() {
                    let Some(world) = skeleton.attachment_world_vertex(attachment_index, vertex)
                    else {
                        continue;
                    };
                    let uv = mesh.uvs.get(vertex).copied().unwrap_or(Vec2::ZERO);
                    out.vertices.push(Vertex {
                        position: world.into(),
                        uv: uv.into(),
                    });
                }
                let indices: Vec<u32> = mesh
                    .triangles
                    .iter()
                    .map(|&index| base + u32::from(index))
                    .collect();
                push_draw(
                    out,
                    mesh.path.clone(),
                    slot.blend,
                    multiply_rgba(slot.color, mesh.color),
                    slot.dark_color,
                    &indices,
                );
            }
            AttachmentData::Clipping(clip) => {
                let base = out.vertices.len() as u32;
                let count = clip.vertices.len();
                for vertex in 0..count {
                    let Some(world) = skeleton.attachment_world_vertex(attachment_index, vertex)
                    else {
                        continue;
                    };
                    out.vertices.push(Vertex {
                        position: world.into(),
                        uv: [0.0, 0.0],
                    });
                }
                let mut indices = Vec::new();
                for i in 2..count as u32 {
                    indices.extend_from_slice(&[base, base + i - 1, base + i]);
                }
                push_draw(
                    out,
                    String::new(),
                    slot.blend,
                    slot.color,
                    slot.dark_color,
                    &indices,
                );
            }
            AttachmentData::Path(_) => {}
        }
    }
}

/// Appends indices and either extends the previous batch (same texture, blend
/// and tint, contiguous indices) or starts a new one.
fn push_draw(
    out: &mut DrawList,
    texture_path: String,
    blend: BlendMode,
    color: [f32; 4],
    dark_color: [f32; 4],
    indices: &[u32],
) {
    if indices.is_empty() {
        return;
    }
    let first_index = out.indices.len();
    out.indices.extend_from_slice(indices);

    if let Some(last) = out.draws.last_mut() {
        if last.texture_path == texture_path
            && last.blend == blend
            && last.color == color
            && last.dark_color == dark_color
            && last.first_index + last.index_count == first_index
        {
            last.index_count += indices.len();
            return;
        }
    }

    out.draws.push(Draw {
        texture_path,
        blend,
        color,
        dark_color,
        first_index,
        index_count: indices.len(),
    });
}

fn multiply_rgba(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    [a[0] * b[0], a[1] * b[1], a[2] * b[2], a[3] * b[3]]
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlendFactor {
    Zero,
    One,
    OneMinusSrcAlpha,
    OneMinusSrcColor,
    DstColor,
    DstAlpha,
}

/// Source/destination factors for one blend mode, color and alpha channels
/// separately. The blend operation is always additive.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BlendDescriptor {
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
}

/// Maps a slot blend mode to backend blend factors. Pure function; backends
/// may build their pipeline states from this once at startup.
pub fn blend_descriptor(mode: BlendMode) -> BlendDescriptor {
    match mode {
        BlendMode::Normal => BlendDescriptor {
            src_color: BlendFactor::One,
            dst_color: BlendFactor::OneMinusSrcAlpha,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::OneMinusSrcAlpha,
        },
        BlendMode::Additive => BlendDescriptor {
            src_color: BlendFactor::One,
            dst_color: BlendFactor::One,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::One,
        },
        BlendMode::Multiply => BlendDescriptor {
            src_color: BlendFactor::DstColor,
            dst_color: BlendFactor::Zero,
            src_alpha: BlendFactor::DstAlpha,
            dst_alpha: BlendFactor::Zero,
        },
        BlendMode::Screen => BlendDescriptor {
            src_color: BlendFactor::One,
            dst_color: BlendFactor::OneMinusSrcColor,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::OneMinusSrcAlpha,
        },
    }
}
