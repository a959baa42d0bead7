use super::animation::apply_timeline;
use super::skeleton::Skeleton;
use crate::{AnimationClip, Error, SkeletonData, Timeline};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Drives the active clip: owns the vetted evaluator list, advances a
/// monotonic clock and restarts it when the clip runs out. There is no pause
/// state; switching clips is a full replacement of the evaluator set.
#[derive(Clone, Debug)]
pub struct Player {
    data: Arc<SkeletonData>,
    clip: usize,
    /// Indices of the clip's timelines that passed vetting.
    timelines: Vec<usize>,
    started: Instant,
}

impl Player {
    pub fn new(data: Arc<SkeletonData>, clip: &str) -> Result<Self, Error> {
        let mut player = Self {
            data,
            clip: 0,
            timelines: Vec::new(),
            started: Instant::now(),
        };
        player.set_clip(clip)?;
        Ok(player)
    }

    /// Replaces the active clip: the old evaluator list is discarded, one
    /// evaluator per supported timeline is vetted against the new clip, and
    /// the clock restarts from zero.
    pub fn set_clip(&mut self, name: &str) -> Result<(), Error> {
        let (index, clip) = self
            .data
            .animation(name)
            .ok_or_else(|| Error::UnknownAnimation {
                name: name.to_string(),
            })?;
        let timelines = vet_timelines(&self.data, clip)?;
        debug!(clip = name, timelines = timelines.len(), "clip selected");
        self.clip = index;
        self.timelines = timelines;
        self.started = Instant::now();
        Ok(())
    }

    pub fn clip_name(&self) -> &str {
        &self.data.animations[self.clip].name
    }

    pub fn duration(&self) -> f32 {
        self.data.animations[self.clip].duration
    }

    /// Evaluates one frame at the wall-clock time since the clip started and
    /// loops: once the elapsed time passes the clip duration, the clock origin
    /// resets so the next tick starts a fresh pass from zero.
    pub fn advance(&mut self, skeleton: &mut Skeleton) {
        let elapsed = self.started.elapsed().as_secs_f32();
        self.advance_at(skeleton, elapsed);
        if elapsed > self.data.animations[self.clip].duration {
            self.started = Instant::now();
        }
    }

    /// Evaluates one frame at an explicit clip time: reset to rest, apply
    /// every vetted timeline, propagate the hierarchy, solve constraints,
    /// re-propagate the constrained subtrees.
    pub fn advance_at(&self, skeleton: &mut Skeleton, time: f32) {
        skeleton.reset_to_rest();
        let clip = &self.data.animations[self.clip];
        for &index in &self.timelines {
            apply_timeline(skeleton, &clip.timelines[index], time);
        }
        skeleton.update_world_transform();
        skeleton.apply_constraints();
        skeleton.propagate_modified();
    }
}

/// Checks every timeline of a clip against the skeleton definition. Supported
/// kinds with bad references are hard errors; shear tracks and empty tracks
/// are skipped with a warning.
fn vet_timelines(data: &SkeletonData, clip: &AnimationClip) -> Result<Vec<usize>, Error> {
    let mut vetted = Vec::with_capacity(clip.timelines.len());
    for (index, timeline) in clip.timelines.iter().enumerate() {
        if frame_count(timeline) == 0 {
            warn!(clip = %clip.name, index, "timeline has no keyframes, skipping");
            continue;
        }
        match timeline {
            Timeline::Rotate(t) => check_bone(data, t.bone, "rotate timeline")?,
            Timeline::Translate(t) => check_bone(data, t.bone, "translate timeline")?,
            Timeline::Scale(t) => check_bone(data, t.bone, "scale timeline")?,
            Timeline::Shear(_) => {
                warn!(clip = %clip.name, index, "shear timelines are not evaluated, skipping");
                continue;
            }
            Timeline::Attachment(t) => check_slot(data, t.slot, "attachment timeline")?,
            Timeline::Color(t) => check_slot(data, t.slot, "color timeline")?,
            Timeline::TwoColor(t) => check_slot(data, t.slot, "two-color timeline")?,
            Timeline::Deform(t) => {
                check_slot(data, t.slot, "deform timeline")?;
                if data.attachment(t.slot, &t.attachment).is_none() {
                    return Err(Error::UnknownAttachment {
                        slot: t.slot,
                        name: t.attachment.clone(),
                    });
                }
            }
            Timeline::DrawOrder(t) => {
                for frame in &t.frames {
                    check_draw_order(&clip.name, data.slots.len(), &frame.order)?;
                }
            }
            Timeline::TransformMix(t) => {
                if t.constraint >= data.transform_constraints.len() {
                    return Err(Error::ConstraintOutOfRange {
                        index: t.constraint,
                        count: data.transform_constraints.len(),
                    });
                }
            }
        }
        vetted.push(index);
    }
    Ok(vetted)
}

fn frame_count(timeline: &Timeline) -> usize {
    match timeline {
        Timeline::Rotate(t) => t.frames.len(),
        Timeline::Translate(t) => t.frames.len(),
        Timeline::Scale(t) => t.frames.len(),
        Timeline::Shear(t) => t.frames.len(),
        Timeline::Attachment(t) => t.frames.len(),
        Timeline::Color(t) => t.frames.len(),
        Timeline::TwoColor(t) => t.frames.len(),
        Timeline::Deform(t) => t.frames.len(),
        Timeline::DrawOrder(t) => t.frames.len(),
        Timeline::TransformMix(t) => t.frames.len(),
    }
}

fn check_bone(data: &SkeletonData, index: usize, context: &str) -> Result<(), Error> {
    if index >= data.bones.len() {
        return Err(Error::BoneOutOfRange {
            context: context.to_string(),
            index,
            count: data.bones.len(),
        });
    }
    Ok(())
}

fn check_slot(data: &SkeletonData, index: usize, context: &str) -> Result<(), Error> {
    if index >= data.slots.len() {
        return Err(Error::SlotOutOfRange {
            context: context.to_string(),
            index,
            count: data.slots.len(),
        });
    }
    Ok(())
}

/// A draw-order frame must be a bijection over `[0, slot_count)`.
fn check_draw_order(animation: &str, slot_count: usize, order: &[usize]) -> Result<(), Error> {
    if order.len() != slot_count {
        return Err(Error::InvalidDrawOrder {
            animation: animation.to_string(),
            message: format!("frame lists {} slots, expected {}", order.len(), slot_count),
        });
    }
    let mut seen = vec![false; slot_count];
    for &position in order {
        if position >= slot_count || seen[position] {
            return Err(Error::InvalidDrawOrder {
                animation: animation.to_string(),
                message: format!("position {position} is out of range or repeated"),
            });
        }
        seen[position] = true;
    }
    Ok(())
}
