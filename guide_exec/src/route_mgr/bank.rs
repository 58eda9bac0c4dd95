//! # Bank command law
//!
//! Converts the course error into a target bank angle. The lateral
//! acceleration demand `a = 2 sin(err) V omega` with `omega = sqrt(2) pi / T`
//! is turned into the bank of a coordinated turn, `-atan(a / g)`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use std::f64::consts::{PI, SQRT_2};

use super::Params;
use util::maths::wrap_180;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Acceleration due to gravity.
///
/// Units: meters/second^2
pub const GRAVITY_MS2: f64 = 9.81;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Output of the bank law.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BankCmd {
    /// Ground track minus target course, in (-180, 180].
    ///
    /// Units: degrees
    pub course_error_deg: f64,

    /// Commanded lateral acceleration.
    ///
    /// Units: meters/second^2
    pub accel_ms2: f64,

    /// Bank angle before limiting.
    ///
    /// Units: degrees
    pub raw_bank_deg: f64,

    /// Bank angle to fly, in [-bank_limit, bank_limit].
    ///
    /// Units: degrees
    pub bank_deg: f64,

    /// True if the bank limit was hit.
    pub limited: bool
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the target bank angle to bring the ground track onto the target
/// course.
///
/// A vehicle tracking right of the target course (positive error) is given a
/// negative (left) bank.
pub fn target_bank(
    groundtrack_deg: f64,
    target_course_deg: f64,
    groundspeed_ms: f64,
    params: &Params
) -> BankCmd {
    let course_error_deg = wrap_180(groundtrack_deg - target_course_deg);

    let omega_a = SQRT_2 * PI / params.l1_period_s;
    let v_omega_a = groundspeed_ms * omega_a;
    let accel_ms2 = 2.0 * course_error_deg.to_radians().sin() * v_omega_a;

    let raw_bank_deg = -(accel_ms2 / GRAVITY_MS2).atan().to_degrees();

    // A NaN here means bad inputs, fly wings level rather than pass it on
    let (bank_deg, limited) = if raw_bank_deg.is_nan() {
        (0.0, false)
    }
    else {
        let limit = params.bank_limit_deg;
        let clamped = raw_bank_deg.max(-limit).min(limit);
        (clamped, clamped != raw_bank_deg)
    };

    BankCmd {
        course_error_deg,
        accel_ms2,
        raw_bank_deg,
        bank_deg,
        limited
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bank_limited() {
        let params = Params {
            bank_limit_deg: 20.0,
            l1_period_s: 25.0,
            l1_damping: 0.7,
            ..Default::default()
        };

        // Track is 90 deg right of the course, so bank left
        let cmd = target_bank(90.0, 0.0, 15.0, &params);
        assert_eq!(cmd.course_error_deg, 90.0);
        assert!(cmd.raw_bank_deg < -20.0);
        assert_eq!(cmd.bank_deg, -20.0);
        assert!(cmd.limited);

        // And the other way
        let cmd = target_bank(0.0, 90.0, 15.0, &params);
        assert_eq!(cmd.course_error_deg, -90.0);
        assert_eq!(cmd.bank_deg, 20.0);
        assert!(cmd.limited);
    }

    #[test]
    fn test_zero_error_wings_level() {
        let params = Params::default();

        let cmd = target_bank(123.0, 123.0, 20.0, &params);
        assert_eq!(cmd.course_error_deg, 0.0);
        assert_eq!(cmd.bank_deg, 0.0);
        assert!(!cmd.limited);

        // No speed, no turn
        let cmd = target_bank(10.0, 100.0, 0.0, &params);
        assert_eq!(cmd.bank_deg, 0.0);
    }

    #[test]
    fn test_error_wraps() {
        let params = Params::default();

        // 350 -> 10 is a 20 deg turn right, not 340 left
        let cmd = target_bank(350.0, 10.0, 15.0, &params);
        assert!((cmd.course_error_deg - (-20.0)).abs() < 1e-9);
        assert!(cmd.bank_deg > 0.0);

        let cmd = target_bank(10.0, 190.0, 15.0, &params);
        assert_eq!(cmd.course_error_deg, 180.0);
    }

    #[test]
    fn test_small_error_unlimited() {
        let params = Params::default();

        let cmd = target_bank(5.0, 0.0, 15.0, &params);
        let omega = SQRT_2 * PI / params.l1_period_s;
        let accel = 2.0 * (5.0f64).to_radians().sin() * 15.0 * omega;
        let expected = -(accel / GRAVITY_MS2).atan().to_degrees();

        assert!((cmd.bank_deg - expected).abs() < 1e-12);
        assert!(cmd.bank_deg.abs() < params.bank_limit_deg);
        assert!(!cmd.limited);
    }

    #[test]
    fn test_always_within_limit() {
        let params = Params::default();

        for trk in (0..360).step_by(15) {
            for gs in &[0.0, 5.0, 15.0, 40.0, 100.0] {
                let cmd = target_bank(trk as f64, 37.0, *gs, &params);
                assert!(cmd.bank_deg.abs() <= params.bank_limit_deg);
                assert!(cmd.course_error_deg > -180.0 && cmd.course_error_deg <= 180.0);
            }
        }
    }
}
