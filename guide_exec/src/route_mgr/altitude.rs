//! Altitude targets for the current waypoint.
//!
//! A manual override always beats the waypoint, and a height above ground
//! always beats an altitude above sea level. Only one target is produced.

use super::{Waypoint, METERS_TO_FEET};

/// Overrides of a foot or less are treated as not set.
const OVERRIDE_MIN_FT: f64 = 1.0;

/// Waypoint altitudes of a meter or less are treated as not set.
const WAYPOINT_MIN_M: f64 = 1.0;

/// Altitude target to fly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AltitudeTarget {
    /// Height above ground level, in feet.
    AglFt(f64),

    /// Altitude above mean sea level, in feet.
    MslFt(f64)
}

/// Select the altitude target from the overrides and the current waypoint.
///
/// Returns `None` if nothing is set, in which case the current altitude
/// target should be left alone.
pub fn altitude_target(
    wp: &Waypoint,
    override_agl_ft: Option<f64>,
    override_msl_ft: Option<f64>
) -> Option<AltitudeTarget> {
    if let Some(agl_ft) = override_agl_ft.filter(|v| *v > OVERRIDE_MIN_FT) {
        return Some(AltitudeTarget::AglFt(agl_ft));
    }
    if let Some(msl_ft) = override_msl_ft.filter(|v| *v > OVERRIDE_MIN_FT) {
        return Some(AltitudeTarget::MslFt(msl_ft));
    }
    if wp.target_agl_m() > WAYPOINT_MIN_M {
        return Some(AltitudeTarget::AglFt(wp.target_agl_m() * METERS_TO_FEET));
    }
    if wp.target_alt_m() > WAYPOINT_MIN_M {
        return Some(AltitudeTarget::MslFt(wp.target_alt_m() * METERS_TO_FEET));
    }

    None
}
