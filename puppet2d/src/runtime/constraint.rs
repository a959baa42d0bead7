//! Path and transform constraint solving. Runs after the hierarchy has fully
//! propagated; constrained bones are marked modified so the follow-up
//! re-propagation pushes their world state into descendants.

use super::skeleton::Skeleton;
use crate::AttachmentData;
use crate::interp::lerp_degrees;
use glam::{Mat2, Vec2};
use tracing::warn;

/// Denominator clamp when recomposing a blended scale into the linear map.
const MIN_SCALE: f32 = 1.0e-5;

impl Skeleton {
    /// Applies every path constraint, then every transform constraint.
    /// Authored priority ordering is not implemented.
    pub fn apply_constraints(&mut self) {
        for index in 0..self.path_constraints.len() {
            self.apply_path_constraint(index);
        }
        for index in 0..self.transform_constraints.len() {
            self.apply_transform_constraint(index);
        }
    }

    fn apply_transform_constraint(&mut self, index: usize) {
        let (target, mix_rotate, mix_offset, mix_scale) = {
            let constraint = &self.transform_constraints[index];
            (
                constraint.target,
                constraint.mix_rotate,
                constraint.mix_offset,
                constraint.mix_scale,
            )
        };
        if mix_rotate <= 0.0 && mix_offset <= 0.0 && mix_scale <= 0.0 {
            return;
        }

        let (offset_rotation, offset, offset_scale) = {
            let data = &self.data.transform_constraints[index];
            (data.offset_rotation, data.offset, data.offset_scale)
        };
        let (target_rotation, target_point, target_scale) = {
            let target = &self.bones[target];
            (
                target.world_rotation() + offset_rotation,
                target.world_point(offset),
                target.world_scale() + offset_scale,
            )
        };

        for position in 0..self.transform_constraints[index].bones.len() {
            let bone_index = self.transform_constraints[index].bones[position];
            let bone = &mut self.bones[bone_index];
            if mix_rotate > 0.0 {
                let current = bone.world_rotation();
                let blended = lerp_degrees(current, target_rotation, mix_rotate);
                bone.world = Mat2::from_angle((blended - current).to_radians()) * bone.world;
                bone.modified = true;
            }
            if mix_offset > 0.0 {
                bone.world_position = bone.world_position.lerp(target_point, mix_offset);
                bone.modified = true;
            }
            if mix_scale > 0.0 {
                let current = bone.world_scale();
                let blended = current.lerp(target_scale, mix_scale);
                let factor = Vec2::new(
                    blended.x / current.x.max(MIN_SCALE),
                    blended.y / current.y.max(MIN_SCALE),
                );
                bone.world *= Mat2::from_diagonal(factor);
                bone.modified = true;
            }
        }
    }

    fn apply_path_constraint(&mut self, index: usize) {
        let (target_slot, position, spacing, mix_rotate, mix_offset) = {
            let constraint = &self.path_constraints[index];
            (
                constraint.target,
                constraint.position,
                constraint.spacing,
                constraint.mix_rotate,
                constraint.mix_offset,
            )
        };
        if mix_rotate <= 0.0 && mix_offset <= 0.0 {
            return;
        }

        // The target slot's *current* attachment supplies the path; an
        // attachment timeline may have swapped it to something else.
        let attachment_index = match self.slot_attachment(target_slot) {
            Some((attachment_index, AttachmentData::Path(_))) => attachment_index,
            _ => {
                warn!(
                    constraint = %self.data.path_constraints[index].name,
                    slot = target_slot,
                    "path constraint target slot shows no path attachment, skipping"
                );
                return;
            }
        };

        let points = self.path_world_points(target_slot, attachment_index);
        if points.len() < 2 {
            warn!(
                constraint = %self.data.path_constraints[index].name,
                "path resolves to fewer than two points, skipping"
            );
            return;
        }

        let mut cumulative = Vec::with_capacity(points.len());
        cumulative.push(0.0f32);
        let mut total = 0.0f32;
        for pair in points.windows(2) {
            total += pair[0].distance(pair[1]);
            cumulative.push(total);
        }

        for position_index in 0..self.path_constraints[index].bones.len() {
            let bone_index = self.path_constraints[index].bones[position_index];
            let fraction = position + position_index as f32 * spacing;
            let (point, angle) = point_on_path(&points, &cumulative, total, fraction);

            let bone = &mut self.bones[bone_index];
            if mix_offset > 0.0 {
                bone.world_position = bone.world_position.lerp(point, mix_offset);
                bone.modified = true;
            }
            if mix_rotate > 0.0 {
                let current = bone.world_rotation();
                let blended = lerp_degrees(current, angle, mix_rotate);
                bone.world = Mat2::from_angle((blended - current).to_radians()) * bone.world;
                bone.modified = true;
            }
        }
    }

    /// On-curve polyline of a path attachment in world space. Points are
    /// stored as triples; the two control points of each triple are skipped.
    fn path_world_points(&self, slot_index: usize, attachment_index: usize) -> Vec<Vec2> {
        let pose = &self.attachment_poses[attachment_index];
        let mut points = Vec::new();
        if pose.weighted_offsets.is_empty() {
            let bone = &self.bones[self.slots[slot_index].bone];
            for i in (2..pose.vertices.len()).step_by(3) {
                points.push(bone.world_point(pose.vertices[i]));
            }
        } else if let AttachmentData::Path(path) = &self.data.attachments[attachment_index] {
            if let crate::Vertices::Weighted(weights) = &path.vertices {
                for i in (2..weights.len()).step_by(3) {
                    let mut point = Vec2::ZERO;
                    for (influence, offset) in
                        weights[i].iter().zip(pose.weighted_offsets[i].iter())
                    {
                        point += self.bones[influence.bone].world_point(*offset) * influence.weight;
                    }
                    points.push(point);
                }
            }
        }
        points
    }
}

/// Position and direction (degrees) at `fraction` of the polyline's total
/// length. Out-of-range fractions clamp to the end points and their adjacent
/// segment directions.
fn point_on_path(points: &[Vec2], cumulative: &[f32], total: f32, fraction: f32) -> (Vec2, f32) {
    let last = points.len() - 1;
    if fraction <= 0.0 || total <= 0.0 {
        return (points[0], direction_degrees(points[1] - points[0]));
    }
    let distance = fraction * total;
    if distance >= total {
        return (
            points[last],
            direction_degrees(points[last] - points[last - 1]),
        );
    }

    let mut segment = 1;
    while cumulative[segment] < distance {
        segment += 1;
    }
    let segment_start = cumulative[segment - 1];
    let segment_length = cumulative[segment] - segment_start;
    let t = if segment_length > 0.0 {
        (distance - segment_start) / segment_length
    } else {
        0.0
    };
    (
        points[segment - 1].lerp(points[segment], t),
        direction_degrees(points[segment] - points[segment - 1]),
    )
}

fn direction_degrees(direction: Vec2) -> f32 {
    direction.y.atan2(direction.x).to_degrees()
}
