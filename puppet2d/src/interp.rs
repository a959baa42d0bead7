//! Scalar, vector and angle interpolation plus keyframe curve easing.

use crate::Curve;

/// Absolute tolerance for the Bezier x-solve.
const BEZIER_TOLERANCE: f32 = 1.0e-5;

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub fn lerp_color(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        lerp(a[0], b[0], t),
        lerp(a[1], b[1], t),
        lerp(a[2], b[2], t),
        lerp(a[3], b[3], t),
    ]
}

/// Maps an angle delta into `[-180, 180]`.
pub fn wrap_degrees(degrees: f32) -> f32 {
    let mut wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

/// Interpolates between two angles along the shortest arc. Every rotation blend
/// goes through this so a 170° → -170° key pair sweeps 20°, not 340°.
pub fn lerp_degrees(a: f32, b: f32, t: f32) -> f32 {
    a + wrap_degrees(b - a) * t
}

/// Evaluates a keyframe easing curve at normalized segment time `t ∈ [0, 1]`,
/// returning the blend rate toward the next keyframe.
pub fn curve_rate(curve: Curve, t: f32) -> f32 {
    match curve {
        Curve::Linear => t,
        Curve::Stepped => 0.0,
        Curve::Bezier { cx1, cy1, cx2, cy2 } => {
            bezier_blend(cy1, cy2, solve_bezier_x(cx1, cx2, t))
        }
    }
}

/// Cubic Bezier blend with fixed endpoints (0,0) and (1,1).
fn bezier_blend(c1: f32, c2: f32, u: f32) -> f32 {
    let inv = 1.0 - u;
    3.0 * u * inv * inv * c1 + 3.0 * u * u * inv * c2 + u * u * u
}

/// Bisects `[0, 1]` for the curve parameter whose x-component equals `x`.
fn solve_bezier_x(cx1: f32, cx2: f32, x: f32) -> f32 {
    let mut start = 0.0f32;
    let mut stop = 1.0f32;
    let mut u = 0.5f32;
    let mut value = bezier_blend(cx1, cx2, u);
    while (x - value).abs() > BEZIER_TOLERANCE {
        if x < value {
            stop = u;
        } else {
            start = u;
        }
        let next = (stop + start) * 0.5;
        if next == u {
            // The bracket collapsed at f32 precision.
            break;
        }
        u = next;
        value = bezier_blend(cx1, cx2, u);
    }
    u
}
