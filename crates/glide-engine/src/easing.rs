//! Easing curves sampled by the timeline engine.

use std::f64::consts::PI;

use config::Curve;

/// Linear interpolation between two values.
#[inline]
pub fn lerp(start: f64, end: f64, t: f64) -> f64 {
    (end - start).mul_add(t, start)
}

/// Map linear progress `t` (clamped to `0..=1`) through `curve`.
pub fn sample(curve: Curve, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    match curve {
        Curve::Linear => t,
        Curve::InQuad => t * t,
        Curve::OutQuad => t * (2.0 - t),
        Curve::InOutQuad => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                (4.0 - 2.0 * t).mul_add(t, -1.0)
            }
        }
        Curve::InCubic => t * t * t,
        Curve::OutCubic => {
            let t1 = t - 1.0;
            (t1 * t1).mul_add(t1, 1.0)
        }
        Curve::InOutCubic => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                let t1 = 2.0f64.mul_add(t, -2.0);
                (0.5 * t1 * t1).mul_add(t1, 1.0)
            }
        }
        Curve::InOutSine => 0.5 * (1.0 - (PI * t).cos()),
        // exp(-5 (2t - 1)^2)
        Curve::Gaussian => {
            let x = 2.0f64.mul_add(t, -1.0);
            (-5.0 * x * x).exp()
        }
    }
}
