use super::animation::apply_timeline;
use crate::{
    AttachmentFrame, AttachmentTimeline, BoneData, ColorFrame, ColorTimeline, Curve,
    DrawOrderFrame, DrawOrderTimeline, Inherit, MixFrame, RotateFrame, RotateTimeline,
    ScaleTimeline, Skeleton, SkeletonData, SlotData, Timeline, TransformConstraintData,
    TransformMixTimeline, TranslateTimeline, TwoColorFrame, TwoColorTimeline, Vec2Frame,
};
use glam::Vec2;
use std::collections::HashMap;
use std::sync::Arc;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-5,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

fn bone(name: &str, rotation: f32, position: Vec2, scale: Vec2) -> BoneData {
    BoneData {
        name: name.to_string(),
        parent: None,
        length: 0.0,
        position,
        rotation,
        scale,
        shear: Vec2::ZERO,
        inherit: Inherit::Normal,
    }
}

fn slot(name: &str, attachment: Option<&str>) -> SlotData {
    SlotData {
        name: name.to_string(),
        bone: 0,
        attachment: attachment.map(str::to_string),
        color: [1.0, 1.0, 1.0, 1.0],
        dark_color: [0.0, 0.0, 0.0, 1.0],
        blend: Default::default(),
    }
}

fn fixture(
    bones: Vec<BoneData>,
    slots: Vec<SlotData>,
    transform_constraints: Vec<TransformConstraintData>,
) -> Skeleton {
    let slot_count = slots.len();
    let data = Arc::new(SkeletonData {
        bones,
        slots,
        attachments: Vec::new(),
        attachment_index: vec![HashMap::new(); slot_count],
        animations: Vec::new(),
        animation_index: HashMap::new(),
        transform_constraints,
        path_constraints: Vec::new(),
    });
    Skeleton::new(data).unwrap()
}

fn rotate_frames(frames: &[(f32, f32)]) -> Vec<RotateFrame> {
    frames
        .iter()
        .map(|&(time, angle)| RotateFrame {
            time,
            angle,
            curve: Curve::Linear,
        })
        .collect()
}

#[test]
fn rotate_adds_the_interpolated_delta() {
    let mut skeleton = fixture(
        vec![bone("root", 10.0, Vec2::ZERO, Vec2::ONE)],
        Vec::new(),
        Vec::new(),
    );
    skeleton.reset_to_rest();
    let timeline = Timeline::Rotate(RotateTimeline {
        bone: 0,
        frames: rotate_frames(&[(0.0, 0.0), (1.0, 90.0)]),
    });
    apply_timeline(&mut skeleton, &timeline, 0.5);
    assert_approx(skeleton.bones[0].pose.rotation, 55.0);
}

#[test]
fn rotate_takes_the_shortest_arc_between_frames() {
    let mut skeleton = fixture(
        vec![bone("root", 0.0, Vec2::ZERO, Vec2::ONE)],
        Vec::new(),
        Vec::new(),
    );
    skeleton.reset_to_rest();
    let timeline = Timeline::Rotate(RotateTimeline {
        bone: 0,
        frames: rotate_frames(&[(0.0, 170.0), (1.0, -170.0)]),
    });
    apply_timeline(&mut skeleton, &timeline, 0.5);
    assert_approx(skeleton.bones[0].pose.rotation, 180.0);
}

#[test]
fn evaluation_clamps_outside_the_keyed_range() {
    let mut skeleton = fixture(
        vec![bone("root", 0.0, Vec2::ZERO, Vec2::ONE)],
        Vec::new(),
        Vec::new(),
    );
    let timeline = Timeline::Translate(TranslateTimeline {
        bone: 0,
        frames: vec![
            Vec2Frame {
                time: 0.0,
                value: Vec2::new(3.0, 4.0),
                curve: Curve::Linear,
            },
            Vec2Frame {
                time: 1.0,
                value: Vec2::new(7.0, 8.0),
                curve: Curve::Linear,
            },
        ],
    });

    skeleton.reset_to_rest();
    apply_timeline(&mut skeleton, &timeline, -5.0);
    assert_approx(skeleton.bones[0].pose.position.x, 3.0);
    assert_approx(skeleton.bones[0].pose.position.y, 4.0);

    skeleton.reset_to_rest();
    apply_timeline(&mut skeleton, &timeline, 5.0);
    assert_approx(skeleton.bones[0].pose.position.x, 7.0);
    assert_approx(skeleton.bones[0].pose.position.y, 8.0);
}

#[test]
fn single_keyframe_tracks_never_interpolate() {
    let mut skeleton = fixture(
        vec![bone("root", 0.0, Vec2::ZERO, Vec2::ONE)],
        Vec::new(),
        Vec::new(),
    );
    let timeline = Timeline::Rotate(RotateTimeline {
        bone: 0,
        frames: rotate_frames(&[(0.5, 30.0)]),
    });
    for time in [0.0f32, 0.5, 100.0] {
        skeleton.reset_to_rest();
        apply_timeline(&mut skeleton, &timeline, time);
        assert_approx(skeleton.bones[0].pose.rotation, 30.0);
    }
}

#[test]
fn stepped_curve_holds_until_the_next_frame() {
    let mut skeleton = fixture(
        vec![bone("root", 0.0, Vec2::ZERO, Vec2::ONE)],
        Vec::new(),
        Vec::new(),
    );
    let mut frames = rotate_frames(&[(0.0, 10.0), (1.0, 90.0)]);
    frames[0].curve = Curve::Stepped;
    let timeline = Timeline::Rotate(RotateTimeline { bone: 0, frames });

    skeleton.reset_to_rest();
    apply_timeline(&mut skeleton, &timeline, 0.99);
    assert_approx(skeleton.bones[0].pose.rotation, 10.0);

    skeleton.reset_to_rest();
    apply_timeline(&mut skeleton, &timeline, 1.0);
    assert_approx(skeleton.bones[0].pose.rotation, 90.0);
}

#[test]
fn translate_accumulates_onto_the_rest_position() {
    let mut skeleton = fixture(
        vec![bone("root", 0.0, Vec2::new(2.0, 3.0), Vec2::ONE)],
        Vec::new(),
        Vec::new(),
    );
    skeleton.reset_to_rest();
    let timeline = Timeline::Translate(TranslateTimeline {
        bone: 0,
        frames: vec![Vec2Frame {
            time: 0.0,
            value: Vec2::new(10.0, 0.0),
            curve: Curve::Linear,
        }],
    });
    apply_timeline(&mut skeleton, &timeline, 0.0);
    assert_approx(skeleton.bones[0].pose.position.x, 12.0);
    assert_approx(skeleton.bones[0].pose.position.y, 3.0);
}

#[test]
fn scale_multiplies_against_the_rest_scale() {
    let mut skeleton = fixture(
        vec![bone("root", 0.0, Vec2::ZERO, Vec2::new(2.0, 4.0))],
        Vec::new(),
        Vec::new(),
    );
    skeleton.reset_to_rest();
    let timeline = Timeline::Scale(ScaleTimeline {
        bone: 0,
        frames: vec![Vec2Frame {
            time: 0.0,
            value: Vec2::new(0.5, 0.5),
            curve: Curve::Linear,
        }],
    });
    apply_timeline(&mut skeleton, &timeline, 0.0);
    assert_approx(skeleton.bones[0].pose.scale.x, 1.0);
    assert_approx(skeleton.bones[0].pose.scale.y, 2.0);
}

#[test]
fn attachment_switch_assigns_the_looked_up_frame() {
    let mut skeleton = fixture(
        vec![bone("root", 0.0, Vec2::ZERO, Vec2::ONE)],
        vec![slot("body", Some("idle"))],
        Vec::new(),
    );
    let timeline = Timeline::Attachment(AttachmentTimeline {
        slot: 0,
        frames: vec![
            AttachmentFrame {
                time: 0.0,
                name: Some("open".to_string()),
            },
            AttachmentFrame {
                time: 1.0,
                name: None,
            },
        ],
    });

    skeleton.reset_to_rest();
    apply_timeline(&mut skeleton, &timeline, -1.0);
    assert_eq!(skeleton.slots[0].attachment.as_deref(), Some("open"));

    skeleton.reset_to_rest();
    apply_timeline(&mut skeleton, &timeline, 0.4);
    assert_eq!(skeleton.slots[0].attachment.as_deref(), Some("open"));

    skeleton.reset_to_rest();
    apply_timeline(&mut skeleton, &timeline, 1.2);
    assert_eq!(skeleton.slots[0].attachment, None);
}

#[test]
fn color_assigns_the_interpolated_value() {
    let mut skeleton = fixture(
        vec![bone("root", 0.0, Vec2::ZERO, Vec2::ONE)],
        vec![slot("body", None)],
        Vec::new(),
    );
    skeleton.reset_to_rest();
    let timeline = Timeline::Color(ColorTimeline {
        slot: 0,
        frames: vec![
            ColorFrame {
                time: 0.0,
                color: [0.0, 0.0, 0.0, 0.0],
                curve: Curve::Linear,
            },
            ColorFrame {
                time: 1.0,
                color: [1.0, 0.5, 0.0, 1.0],
                curve: Curve::Linear,
            },
        ],
    });
    apply_timeline(&mut skeleton, &timeline, 0.5);
    let color = skeleton.slots[0].color;
    assert_approx(color[0], 0.5);
    assert_approx(color[1], 0.25);
    assert_approx(color[2], 0.0);
    assert_approx(color[3], 0.5);
}

#[test]
fn two_color_assigns_light_and_dark() {
    let mut skeleton = fixture(
        vec![bone("root", 0.0, Vec2::ZERO, Vec2::ONE)],
        vec![slot("body", None)],
        Vec::new(),
    );
    skeleton.reset_to_rest();
    let timeline = Timeline::TwoColor(TwoColorTimeline {
        slot: 0,
        frames: vec![
            TwoColorFrame {
                time: 0.0,
                light: [1.0, 1.0, 1.0, 1.0],
                dark: [0.0, 0.0, 0.0, 1.0],
                curve: Curve::Linear,
            },
            TwoColorFrame {
                time: 1.0,
                light: [0.0, 0.0, 0.0, 1.0],
                dark: [1.0, 1.0, 1.0, 1.0],
                curve: Curve::Linear,
            },
        ],
    });
    apply_timeline(&mut skeleton, &timeline, 0.5);
    assert_approx(skeleton.slots[0].color[0], 0.5);
    assert_approx(skeleton.slots[0].dark_color[0], 0.5);
}

#[test]
fn draw_order_applies_the_permutation_verbatim() {
    let mut skeleton = fixture(
        vec![bone("root", 0.0, Vec2::ZERO, Vec2::ONE)],
        vec![slot("a", None), slot("b", None), slot("c", None)],
        Vec::new(),
    );
    skeleton.reset_to_rest();
    let timeline = Timeline::DrawOrder(DrawOrderTimeline {
        frames: vec![DrawOrderFrame {
            time: 0.0,
            order: vec![2, 0, 1],
        }],
    });
    apply_timeline(&mut skeleton, &timeline, 0.0);
    assert_eq!(skeleton.slots[0].draw_order, 2);
    assert_eq!(skeleton.slots[1].draw_order, 0);
    assert_eq!(skeleton.slots[2].draw_order, 1);
    assert_eq!(skeleton.draw_order(), vec![1, 2, 0]);
}

#[test]
fn transform_mix_assigns_the_three_weights() {
    let mut skeleton = fixture(
        vec![bone("root", 0.0, Vec2::ZERO, Vec2::ONE)],
        Vec::new(),
        vec![TransformConstraintData {
            name: "grab".to_string(),
            bones: vec![0],
            target: 0,
            local: false,
            relative: false,
            offset_rotation: 0.0,
            offset: Vec2::ZERO,
            offset_scale: Vec2::ZERO,
            mix_rotate: 0.0,
            mix_offset: 0.0,
            mix_scale: 0.0,
        }],
    );
    skeleton.reset_to_rest();
    let timeline = Timeline::TransformMix(TransformMixTimeline {
        constraint: 0,
        frames: vec![
            MixFrame {
                time: 0.0,
                rotate: 0.0,
                offset: 0.0,
                scale: 0.0,
                curve: Curve::Linear,
            },
            MixFrame {
                time: 1.0,
                rotate: 1.0,
                offset: 0.5,
                scale: 0.25,
                curve: Curve::Linear,
            },
        ],
    });
    apply_timeline(&mut skeleton, &timeline, 0.5);
    let constraint = &skeleton.transform_constraints[0];
    assert_approx(constraint.mix_rotate, 0.5);
    assert_approx(constraint.mix_offset, 0.25);
    assert_approx(constraint.mix_scale, 0.125);
}
