//! Reverse Park transform from the rotor-synchronous frame to the
//! stationary frame.
use libm::{cosf, sinf};

use crate::clamp::QdVoltage;

/// Stationary-frame voltage components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaBetaVoltage {
    pub alpha: f32,
    pub beta: f32,
}

/// Rotates the clamped rotor-frame vector by the rotor angle `theta`
/// (radians) into the stationary frame:
///
/// `alpha = q*cos(theta) + d*sin(theta)`
/// `beta  = -q*sin(theta) + d*cos(theta)`
///
/// Pure and stateless; any real angle is valid. Run the circle limiter on
/// the input first, the rotation preserves magnitude.
pub fn reverse_park(v: QdVoltage, theta: f32) -> AlphaBetaVoltage {
    let sin = sinf(theta);
    let cos = cosf(theta);
    AlphaBetaVoltage {
        alpha: v.q as f32 * cos + v.d as f32 * sin,
        beta: -(v.q as f32) * sin + v.d as f32 * cos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::{FRAC_PI_2, TAU};
    use libm::fabsf;

    fn approx_eq(a: f32, b: f32) -> bool {
        fabsf(a - b) < 1e-2
    }

    #[test]
    fn zero_angle_is_identity() {
        let out = reverse_park(QdVoltage::new(12000, -3000), 0.);
        assert_eq!(out.alpha, 12000.);
        assert_eq!(out.beta, -3000.);
    }

    #[test]
    fn quarter_turn_swaps_axes() {
        let out = reverse_park(QdVoltage::new(12000, -3000), FRAC_PI_2);
        assert!(approx_eq(out.alpha, -3000.));
        assert!(approx_eq(out.beta, -12000.));
    }

    #[test]
    fn full_turn_is_periodic() {
        let a = reverse_park(QdVoltage::new(5000, 7000), 1.2);
        let b = reverse_park(QdVoltage::new(5000, 7000), 1.2 + TAU);
        assert!(approx_eq(a.alpha, b.alpha));
        assert!(approx_eq(a.beta, b.beta));
    }

    #[test]
    fn rotation_preserves_magnitude() {
        let v = QdVoltage::new(9000, -14000);
        let out = reverse_park(v, 2.4);
        let mag_in = (v.q as f32) * (v.q as f32) + (v.d as f32) * (v.d as f32);
        let mag_out = out.alpha * out.alpha + out.beta * out.beta;
        assert!(fabsf(mag_in - mag_out) / mag_in < 1e-4);
    }
}
