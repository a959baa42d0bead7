//! Timeline evaluation: one `apply_*` function per track kind, sharing the
//! keyframe lookup and curve-eased blending scheme.

use super::skeleton::Skeleton;
use crate::interp::{curve_rate, lerp, lerp_color, lerp_degrees};
use crate::{
    AttachmentTimeline, ColorFrame, ColorTimeline, Curve, DeformFrame, DeformOffsets,
    DeformTimeline, DrawOrderTimeline, MixFrame, RotateFrame, RotateTimeline, ScaleTimeline,
    ShearTimeline, Timeline, TransformMixTimeline, TranslateTimeline, TwoColorFrame,
    TwoColorTimeline, Vec2Frame,
};
use glam::Vec2;

pub(crate) fn apply_timeline(skeleton: &mut Skeleton, timeline: &Timeline, time: f32) {
    match timeline {
        Timeline::Rotate(t) => apply_rotate(skeleton, t, time),
        Timeline::Translate(t) => apply_translate(skeleton, t, time),
        Timeline::Scale(t) => apply_scale(skeleton, t, time),
        Timeline::Shear(t) => apply_shear(skeleton, t, time),
        Timeline::Attachment(t) => apply_attachment(skeleton, t, time),
        Timeline::Color(t) => apply_color(skeleton, t, time),
        Timeline::TwoColor(t) => apply_two_color(skeleton, t, time),
        Timeline::Deform(t) => apply_deform(skeleton, t, time),
        Timeline::DrawOrder(t) => apply_draw_order(skeleton, t, time),
        Timeline::TransformMix(t) => apply_transform_mix(skeleton, t, time),
    }
}

/// Adds the sampled delta onto the bone's local rotation.
pub(crate) fn apply_rotate(skeleton: &mut Skeleton, timeline: &RotateTimeline, time: f32) {
    let angle = sample_rotate(&timeline.frames, time);
    skeleton.bones[timeline.bone].pose.rotation += angle;
}

/// Adds the sampled offset onto the bone's local position.
pub(crate) fn apply_translate(skeleton: &mut Skeleton, timeline: &TranslateTimeline, time: f32) {
    let offset = sample_vec2(&timeline.frames, time);
    skeleton.bones[timeline.bone].pose.position += offset;
}

/// Multiplies the sampled factor component-wise against the rest scale.
pub(crate) fn apply_scale(skeleton: &mut Skeleton, timeline: &ScaleTimeline, time: f32) {
    let factor = sample_vec2(&timeline.frames, time);
    let rest = skeleton.data.bones[timeline.bone].scale;
    skeleton.bones[timeline.bone].pose.scale = rest * factor;
}

/// Shear tracks are vetted out at clip selection; nothing to evaluate.
pub(crate) fn apply_shear(_skeleton: &mut Skeleton, _timeline: &ShearTimeline, _time: f32) {}

/// No interpolation: the looked-up frame's attachment name is assigned as-is.
pub(crate) fn apply_attachment(skeleton: &mut Skeleton, timeline: &AttachmentTimeline, time: f32) {
    let index = timeline.frames.partition_point(|f| f.time <= time);
    let frame = &timeline.frames[index.saturating_sub(1)];
    skeleton.slots[timeline.slot].attachment = frame.name.clone();
}

pub(crate) fn apply_color(skeleton: &mut Skeleton, timeline: &ColorTimeline, time: f32) {
    skeleton.slots[timeline.slot].color = sample_color(&timeline.frames, time);
}

pub(crate) fn apply_two_color(skeleton: &mut Skeleton, timeline: &TwoColorTimeline, time: f32) {
    let (light, dark) = sample_two_color(&timeline.frames, time);
    let slot = &mut skeleton.slots[timeline.slot];
    slot.color = light;
    slot.dark_color = dark;
}

/// Adds sampled offsets onto the attachment's working vertex buffers. The
/// buffers were rebuilt from rest data when the frame began, so offsets always
/// accumulate against the rest pose.
pub(crate) fn apply_deform(skeleton: &mut Skeleton, timeline: &DeformTimeline, time: f32) {
    let Some((attachment_index, _)) = skeleton.data.attachment(timeline.slot, &timeline.attachment)
    else {
        return;
    };
    let offsets = sample_deform(&timeline.frames, time);
    let pose = &mut skeleton.attachment_poses[attachment_index];
    match offsets {
        DeformOffsets::Rigid(offsets) => {
            for (vertex, offset) in pose.vertices.iter_mut().zip(offsets) {
                *vertex += offset;
            }
        }
        DeformOffsets::Weighted(offsets) => {
            for (influences, deltas) in pose.weighted_offsets.iter_mut().zip(offsets) {
                for (offset, delta) in influences.iter_mut().zip(deltas) {
                    *offset += delta;
                }
            }
        }
    }
}

/// No interpolation: the looked-up frame's permutation is applied verbatim.
pub(crate) fn apply_draw_order(skeleton: &mut Skeleton, timeline: &DrawOrderTimeline, time: f32) {
    let index = timeline.frames.partition_point(|f| f.time <= time);
    let frame = &timeline.frames[index.saturating_sub(1)];
    for (slot, &order) in skeleton.slots.iter_mut().zip(frame.order.iter()) {
        slot.draw_order = order;
    }
}

pub(crate) fn apply_transform_mix(
    skeleton: &mut Skeleton,
    timeline: &TransformMixTimeline,
    time: f32,
) {
    let (rotate, offset, scale) = sample_mix(&timeline.frames, time);
    let constraint = &mut skeleton.transform_constraints[timeline.constraint];
    constraint.mix_rotate = rotate;
    constraint.mix_offset = offset;
    constraint.mix_scale = scale;
}

/// Blend rate between two keyframes at `time`, eased by the earlier frame's
/// curve. Coincident frame times snap to the later frame.
fn segment_rate(curve: Curve, time1: f32, time2: f32, time: f32) -> f32 {
    let denom = time2 - time1;
    if denom <= 0.0 {
        return 1.0;
    }
    curve_rate(curve, (time - time1) / denom)
}

fn sample_rotate(frames: &[RotateFrame], time: f32) -> f32 {
    let index = frames.partition_point(|f| f.time <= time);
    if index == 0 {
        return frames[0].angle;
    }
    if index >= frames.len() {
        return frames[frames.len() - 1].angle;
    }
    let prev = &frames[index - 1];
    let next = &frames[index];
    let rate = segment_rate(prev.curve, prev.time, next.time, time);
    lerp_degrees(prev.angle, next.angle, rate)
}

fn sample_vec2(frames: &[Vec2Frame], time: f32) -> Vec2 {
    let index = frames.partition_point(|f| f.time <= time);
    if index == 0 {
        return frames[0].value;
    }
    if index >= frames.len() {
        return frames[frames.len() - 1].value;
    }
    let prev = &frames[index - 1];
    let next = &frames[index];
    let rate = segment_rate(prev.curve, prev.time, next.time, time);
    prev.value.lerp(next.value, rate)
}

fn sample_color(frames: &[ColorFrame], time: f32) -> [f32; 4] {
    let index = frames.partition_point(|f| f.time <= time);
    if index == 0 {
        return frames[0].color;
    }
    if index >= frames.len() {
        return frames[frames.len() - 1].color;
    }
    let prev = &frames[index - 1];
    let next = &frames[index];
    let rate = segment_rate(prev.curve, prev.time, next.time, time);
    lerp_color(prev.color, next.color, rate)
}

fn sample_two_color(frames: &[TwoColorFrame], time: f32) -> ([f32; 4], [f32; 4]) {
    let index = frames.partition_point(|f| f.time <= time);
    if index == 0 {
        let frame = &frames[0];
        return (frame.light, frame.dark);
    }
    if index >= frames.len() {
        let frame = &frames[frames.len() - 1];
        return (frame.light, frame.dark);
    }
    let prev = &frames[index - 1];
    let next = &frames[index];
    let rate = segment_rate(prev.curve, prev.time, next.time, time);
    (
        lerp_color(prev.light, next.light, rate),
        lerp_color(prev.dark, next.dark, rate),
    )
}

fn sample_mix(frames: &[MixFrame], time: f32) -> (f32, f32, f32) {
    let index = frames.partition_point(|f| f.time <= time);
    if index == 0 {
        let frame = &frames[0];
        return (frame.rotate, frame.offset, frame.scale);
    }
    if index >= frames.len() {
        let frame = &frames[frames.len() - 1];
        return (frame.rotate, frame.offset, frame.scale);
    }
    let prev = &frames[index - 1];
    let next = &frames[index];
    let rate = segment_rate(prev.curve, prev.time, next.time, time);
    (
        lerp(prev.rotate, next.rotate, rate),
        lerp(prev.offset, next.offset, rate),
        lerp(prev.scale, next.scale, rate),
    )
}

fn sample_deform(frames: &[DeformFrame], time: f32) -> DeformOffsets {
    let index = frames.partition_point(|f| f.time <= time);
    if index == 0 {
        return frames[0].offsets.clone();
    }
    if index >= frames.len() {
        return frames[frames.len() - 1].offsets.clone();
    }
    let prev = &frames[index - 1];
    let next = &frames[index];
    let rate = segment_rate(prev.curve, prev.time, next.time, time);
    match (&prev.offsets, &next.offsets) {
        (DeformOffsets::Rigid(a), DeformOffsets::Rigid(b)) => DeformOffsets::Rigid(
            a.iter()
                .zip(b.iter())
                .map(|(a, b)| a.lerp(*b, rate))
                .collect(),
        ),
        (DeformOffsets::Weighted(a), DeformOffsets::Weighted(b)) => DeformOffsets::Weighted(
            a.iter()
                .zip(b.iter())
                .map(|(a, b)| {
                    a.iter()
                        .zip(b.iter())
                        .map(|(a, b)| a.lerp(*b, rate))
                        .collect()
                })
                .collect(),
        ),
        // Mixed storage inside one track cannot come from a well-formed
        // definition; fall back to the earlier frame.
        _ => prev.offsets.clone(),
    }
}
