use crate::{
    AnimationClip, BoneData, Curve, DeformTimeline, DrawOrderFrame, DrawOrderTimeline, Error,
    Inherit, Player, RotateFrame, RotateTimeline, ShearTimeline, Skeleton, SkeletonData, SlotData,
    Timeline, TransformMixTimeline, Vec2Frame,
};
use glam::Vec2;
use std::sync::Arc;

fn assert_approx(actual: f32, expected: f32) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= 1.0e-5,
        "expected {expected}, got {actual} (diff {diff})"
    );
}

fn bone(name: &str, parent: Option<usize>, position: Vec2, rotation: f32) -> BoneData {
    BoneData {
        name: name.to_string(),
        parent,
        length: 0.0,
        position,
        rotation,
        scale: Vec2::ONE,
        shear: Vec2::ZERO,
        inherit: Inherit::Normal,
    }
}

fn data_with_clips(bones: Vec<BoneData>, slots: Vec<SlotData>, animations: Vec<AnimationClip>) -> Arc<SkeletonData> {
    let attachment_index = vec![Default::default(); slots.len()];
    let animation_index = SkeletonData::build_animation_index(&animations);
    Arc::new(SkeletonData {
        bones,
        slots,
        attachments: Vec::new(),
        attachment_index,
        animations,
        animation_index,
        transform_constraints: Vec::new(),
        path_constraints: Vec::new(),
    })
}

fn turn_clip() -> AnimationClip {
    AnimationClip {
        name: "turn".to_string(),
        duration: 1.0,
        timelines: vec![Timeline::Rotate(RotateTimeline {
            bone: 1,
            frames: vec![
                RotateFrame {
                    time: 0.0,
                    angle: 0.0,
                    curve: Curve::Linear,
                },
                RotateFrame {
                    time: 1.0,
                    angle: 90.0,
                    curve: Curve::Linear,
                },
            ],
        })],
    }
}

#[test]
fn two_bone_rig_rotates_through_the_full_pipeline() {
    let data = data_with_clips(
        vec![
            bone("root", None, Vec2::ZERO, 0.0),
            bone("child", Some(0), Vec2::new(10.0, 0.0), 0.0),
        ],
        Vec::new(),
        vec![turn_clip()],
    );
    let mut skeleton = Skeleton::new(data.clone()).unwrap();
    let player = Player::new(data, "turn").unwrap();

    player.advance_at(&mut skeleton, 0.5);
    assert_approx(skeleton.bones[1].pose.rotation, 45.0);
    assert_approx(skeleton.bones[1].world_rotation(), 45.0);
    assert_approx(skeleton.bones[1].world_position.x, 10.0);

    player.advance_at(&mut skeleton, 1.0);
    assert_approx(skeleton.bones[1].world_rotation(), 90.0);
}

#[test]
fn silent_tracks_fall_back_to_rest_each_frame() {
    let data = data_with_clips(
        vec![
            bone("root", None, Vec2::ZERO, 0.0),
            bone("child", Some(0), Vec2::new(10.0, 0.0), 0.0),
        ],
        Vec::new(),
        vec![turn_clip()],
    );
    let mut skeleton = Skeleton::new(data.clone()).unwrap();
    let player = Player::new(data, "turn").unwrap();

    player.advance_at(&mut skeleton, 0.5);
    // Manual damage to an untracked bone must not survive the next frame.
    skeleton.bones[0].pose.position = Vec2::new(50.0, 50.0);
    player.advance_at(&mut skeleton, 0.5);
    assert_approx(skeleton.bones[0].world_position.x, 0.0);
    assert_approx(skeleton.bones[1].pose.rotation, 45.0);
}

#[test]
fn unknown_clip_is_rejected() {
    let data = data_with_clips(
        vec![bone("root", None, Vec2::ZERO, 0.0)],
        Vec::new(),
        vec![turn_clip()],
    );
    match Player::new(data, "missing") {
        Err(Error::UnknownAnimation { name }) => assert_eq!(name, "missing"),
        other => panic!("expected UnknownAnimation, got {other:?}"),
    }
}

#[test]
fn set_clip_replaces_the_active_clip() {
    let data = data_with_clips(
        vec![
            bone("root", None, Vec2::ZERO, 0.0),
            bone("child", Some(0), Vec2::new(10.0, 0.0), 0.0),
        ],
        Vec::new(),
        vec![
            turn_clip(),
            AnimationClip {
                name: "hold".to_string(),
                duration: 2.0,
                timelines: vec![Timeline::Rotate(RotateTimeline {
                    bone: 1,
                    frames: vec![RotateFrame {
                        time: 0.0,
                        angle: 10.0,
                        curve: Curve::Linear,
                    }],
                })],
            },
        ],
    );
    let mut skeleton = Skeleton::new(data.clone()).unwrap();
    let mut player = Player::new(data, "turn").unwrap();
    assert_eq!(player.clip_name(), "turn");
    assert_approx(player.duration(), 1.0);

    player.set_clip("hold").unwrap();
    assert_eq!(player.clip_name(), "hold");
    assert_approx(player.duration(), 2.0);

    player.advance_at(&mut skeleton, 0.5);
    assert_approx(skeleton.bones[1].pose.rotation, 10.0);
}

#[test]
fn shear_tracks_are_skipped_without_error() {
    let data = data_with_clips(
        vec![bone("root", None, Vec2::ZERO, 0.0)],
        Vec::new(),
        vec![AnimationClip {
            name: "lean".to_string(),
            duration: 1.0,
            timelines: vec![Timeline::Shear(ShearTimeline {
                bone: 0,
                frames: vec![Vec2Frame {
                    time: 0.0,
                    value: Vec2::new(1.0, 0.0),
                    curve: Curve::Linear,
                }],
            })],
        }],
    );
    let mut skeleton = Skeleton::new(data.clone()).unwrap();
    let player = Player::new(data, "lean").unwrap();
    player.advance_at(&mut skeleton, 0.5);
    assert_approx(skeleton.bones[0].world_rotation(), 0.0);
}

#[test]
fn empty_timelines_are_skipped_without_error() {
    let data = data_with_clips(
        vec![bone("root", None, Vec2::ZERO, 0.0)],
        Vec::new(),
        vec![AnimationClip {
            name: "noop".to_string(),
            duration: 0.0,
            timelines: vec![Timeline::Rotate(RotateTimeline {
                bone: 0,
                frames: Vec::new(),
            })],
        }],
    );
    let mut skeleton = Skeleton::new(data.clone()).unwrap();
    let player = Player::new(data, "noop").unwrap();
    player.advance_at(&mut skeleton, 0.0);
}

#[test]
fn deform_timeline_with_unknown_attachment_is_rejected() {
    let data = data_with_clips(
        vec![bone("root", None, Vec2::ZERO, 0.0)],
        vec![SlotData {
            name: "body".to_string(),
            bone: 0,
            attachment: None,
            color: [1.0; 4],
            dark_color: [0.0, 0.0, 0.0, 1.0],
            blend: Default::default(),
        }],
        vec![AnimationClip {
            name: "pulse".to_string(),
            duration: 1.0,
            timelines: vec![Timeline::Deform(DeformTimeline {
                slot: 0,
                attachment: "ghost".to_string(),
                frames: vec![crate::DeformFrame {
                    time: 0.0,
                    offsets: crate::DeformOffsets::Rigid(Vec::new()),
                    curve: Curve::Linear,
                }],
            })],
        }],
    );
    match Player::new(data, "pulse") {
        Err(Error::UnknownAttachment { slot, name }) => {
            assert_eq!(slot, 0);
            assert_eq!(name, "ghost");
        }
        other => panic!("expected UnknownAttachment, got {other:?}"),
    }
}

#[test]
fn non_bijective_draw_order_is_rejected() {
    let slots = vec![
        SlotData {
            name: "a".to_string(),
            bone: 0,
            attachment: None,
            color: [1.0; 4],
            dark_color: [0.0, 0.0, 0.0, 1.0],
            blend: Default::default(),
        },
        SlotData {
            name: "b".to_string(),
            bone: 0,
            attachment: None,
            color: [1.0; 4],
            dark_color: [0.0, 0.0, 0.0, 1.0],
            blend: Default::default(),
        },
    ];
    let data = data_with_clips(
        vec![bone("root", None, Vec2::ZERO, 0.0)],
        slots,
        vec![AnimationClip {
            name: "shuffle".to_string(),
            duration: 1.0,
            timelines: vec![Timeline::DrawOrder(DrawOrderTimeline {
                frames: vec![DrawOrderFrame {
                    time: 0.0,
                    order: vec![1, 1],
                }],
            })],
        }],
    );
    assert!(matches!(
        Player::new(data, "shuffle"),
        Err(Error::InvalidDrawOrder { .. })
    ));
}

#[test]
fn transform_mix_timeline_without_constraint_is_rejected() {
    let data = data_with_clips(
        vec![bone("root", None, Vec2::ZERO, 0.0)],
        Vec::new(),
        vec![AnimationClip {
            name: "mix".to_string(),
            duration: 1.0,
            timelines: vec![Timeline::TransformMix(TransformMixTimeline {
                constraint: 0,
                frames: vec![crate::MixFrame {
                    time: 0.0,
                    rotate: 1.0,
                    offset: 1.0,
                    scale: 1.0,
                    curve: Curve::Linear,
                }],
            })],
        }],
    );
    assert!(matches!(
        Player::new(data, "mix"),
        Err(Error::ConstraintOutOfRange { index: 0, count: 0 })
    ));
}
