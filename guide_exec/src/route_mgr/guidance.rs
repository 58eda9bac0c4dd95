//! # Guidance law
//!
//! Computes the navigation course and distance for the current leg.
//!
//! The leg runs from the previous waypoint to the current one. The angle
//! between the leg course and the direct course to the current waypoint gives
//! the cross track distance (`sin(angle) * direct_distance`, positive to the
//! right of the leg) and the projected distance still to run along the leg
//! (`cos(angle) * direct_distance`).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;
use std::f64::consts::PI;

// Internal
use super::{CompletionMode, FollowMode, Params, Waypoint};
use util::{
    geo::{GeoPoint, Geodesy},
    maths::{wrap_180, wrap_360}
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Limit on the cross track course compensation.
///
/// Units: degrees
pub const XTRACK_COMP_LIMIT_DEG: f64 = 45.0;

/// Beyond this angle between leg and direct course cross track steering on
/// the direct course gives up and flies direct-to.
///
/// Units: degrees
pub const XTRACK_MAX_ANGLE_DEG: f64 = 45.0;

/// Look-ahead distances below this are treated as no forward speed.
///
/// Units: meters
pub const MIN_L1_DIST_M: f64 = 0.01;

/// Floor on the L1 pursuit angle.
///
/// Units: degrees
pub const MIN_PURSUIT_ANGLE_DEG: f64 = 30.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Inputs to one evaluation of the guidance law.
#[derive(Debug, Clone, Copy)]
pub struct GuidanceInput<'a> {
    /// Current position of the vehicle
    pub position: GeoPoint,

    /// Current groundspeed.
    ///
    /// Units: meters/second
    pub groundspeed_ms: f64,

    /// Waypoint at the start of the leg
    pub prev: &'a Waypoint,

    /// Waypoint being flown to
    pub current: &'a Waypoint,

    /// Index of `current` in the route
    pub current_index: usize,

    /// Number of waypoints in the route
    pub route_size: usize,

    /// Whether the route has been acquired
    pub acquired: bool
}

/// Result of the guidance law.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NavSolution {
    /// Course from the vehicle direct to the current waypoint.
    ///
    /// Units: degrees
    pub direct_course_deg: f64,

    /// Distance from the vehicle direct to the current waypoint.
    ///
    /// Units: meters
    pub direct_dist_m: f64,

    /// Course of the leg from the previous waypoint to the current one.
    ///
    /// Units: degrees
    pub leg_course_deg: f64,

    /// Length of the leg.
    ///
    /// Units: meters
    pub leg_dist_m: f64,

    /// Leg course minus direct course, in (-180, 180].
    ///
    /// Units: degrees
    pub angle_deg: f64,

    /// Signed distance from the leg centreline, positive to the right.
    ///
    /// Units: meters
    pub xtrack_m: f64,

    /// Distance remaining along the leg.
    ///
    /// Units: meters
    pub proj_dist_m: f64,

    /// Cross track course compensation, in [-45, 45].
    ///
    /// Units: degrees
    pub xtrack_comp_deg: f64,

    /// Course to steer, in [0, 360).
    ///
    /// Units: degrees
    pub nav_course_deg: f64,

    /// Distance used for waypoint acquisition.
    ///
    /// Units: meters
    pub nav_dist_m: f64
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Evaluate the guidance law for one cycle.
///
/// `follow_mode` and `completion_mode` are the modes currently in force, which
/// may differ from those in `params` (see the sequencer start-up rule).
pub fn compute<G: Geodesy>(
    geo: &G,
    params: &Params,
    follow_mode: FollowMode,
    completion_mode: CompletionMode,
    input: &GuidanceInput
) -> NavSolution {
    let mut sol = NavSolution::default();

    // Direct and leg geometry
    let (direct_course_deg, direct_dist_m) =
        geo.course_and_distance(&input.position, input.current.target());
    let (leg_course_deg, leg_dist_m) =
        geo.course_and_distance(input.prev.target(), input.current.target());

    sol.direct_course_deg = direct_course_deg;
    sol.direct_dist_m = direct_dist_m;
    sol.leg_course_deg = leg_course_deg;
    sol.leg_dist_m = leg_dist_m;

    // Cross track and projected distances
    sol.angle_deg = wrap_180(leg_course_deg - direct_course_deg);
    let angle_rad = sol.angle_deg.to_radians();
    sol.xtrack_m = angle_rad.sin() * direct_dist_m;
    sol.proj_dist_m = angle_rad.cos() * direct_dist_m;

    sol.xtrack_comp_deg = xtrack_compensation(sol.xtrack_m, params.xtrack_gain_deg_per_m);

    // Start out flying direct to, each mode overrides as required
    let mut nav_course_deg = direct_course_deg;
    sol.nav_dist_m = direct_dist_m;

    // The first waypoint of a route which doesn't loop has no leg to track,
    // a looping route tracks the leg closing the loop.
    let first_wpt_direct =
        input.current_index == 0 && completion_mode != CompletionMode::Loop;

    // The last leg is extended beyond the last waypoint if requested
    let extend_last_leg =
        input.current_index + 1 == input.route_size
        && completion_mode == CompletionMode::ExtendLastLeg;

    match follow_mode {
        FollowMode::Direct => (),
        FollowMode::XtrackDirectHdg => {
            if first_wpt_direct {
                // Direct to
            }
            else if extend_last_leg {
                nav_course_deg = leg_course_deg - sol.xtrack_comp_deg;
            }
            else if sol.angle_deg.abs() <= XTRACK_MAX_ANGLE_DEG {
                nav_course_deg = direct_course_deg - sol.xtrack_comp_deg;
            }
        },
        FollowMode::XtrackLegHdg => {
            if !first_wpt_direct {
                sol.nav_dist_m = sol.proj_dist_m;
                nav_course_deg = leg_course_deg - sol.xtrack_comp_deg;
            }
        },
        FollowMode::Leader => {
            // Until the route is acquired fly direct to avoid oscillating onto
            // the first leg.
            if input.acquired {
                if let Some(crs) = leader_course(
                    direct_course_deg,
                    sol.angle_deg,
                    sol.xtrack_m,
                    l1_distance(params, input.groundspeed_ms)
                ) {
                    nav_course_deg = crs;
                    sol.nav_dist_m = sol.proj_dist_m;
                }
            }
        }
    }

    sol.nav_course_deg = wrap_360(nav_course_deg);

    trace!(
        "Guidance: direct {:.1} deg/{:.1} m, leg {:.1} deg, xtrack {:.1} m, nav {:.1} deg/{:.1} m",
        sol.direct_course_deg, sol.direct_dist_m, sol.leg_course_deg,
        sol.xtrack_m, sol.nav_course_deg, sol.nav_dist_m
    );

    sol
}

/// Course compensation for the given cross track distance, saturated at
/// +/- 45 degrees.
pub fn xtrack_compensation(xtrack_m: f64, gain_deg_per_m: f64) -> f64 {
    let comp = xtrack_m * gain_deg_per_m;
    if comp.is_nan() {
        return 0.0;
    }
    comp.max(-XTRACK_COMP_LIMIT_DEG).min(XTRACK_COMP_LIMIT_DEG)
}

/// The L1 look-ahead distance, `damping * period * groundspeed / pi`.
///
/// Units: meters
pub fn l1_distance(params: &Params, groundspeed_ms: f64) -> f64 {
    (1.0 / PI) * params.l1_damping * params.l1_period_s * groundspeed_ms
}

/// Course of the L1 leader law.
///
/// Returns `None` if there is no meaningful look-ahead distance (no forward
/// speed), in which case direct-to should be flown.
pub fn leader_course(
    direct_course_deg: f64,
    angle_deg: f64,
    xtrack_m: f64,
    l1_dist_m: f64
) -> Option<f64> {
    if !(l1_dist_m >= MIN_L1_DIST_M) {
        return None;
    }

    // Outside the look-ahead circle steer as directly at the leg as allowed,
    // inside it aim at the point on the leg one look-ahead distance away.
    let pursuit_deg = if l1_dist_m <= xtrack_m.abs() {
        0.0
    }
    else {
        (xtrack_m.abs() / l1_dist_m).acos().to_degrees()
    }
    .max(MIN_PURSUIT_ANGLE_DEG);

    // direct + angle is the leg course
    let leg_course_deg = direct_course_deg + angle_deg;
    if xtrack_m > 0.0 {
        Some(leg_course_deg - (90.0 - pursuit_deg))
    }
    else {
        Some(leg_course_deg + (90.0 - pursuit_deg))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use util::geo::GreatCircle;

    /// A northbound leg from (0, 0) to (0, 0.01), roughly 1.1 km long.
    fn leg() -> (Waypoint, Waypoint) {
        (Waypoint::at(0.0, 0.0), Waypoint::at(0.0, 0.01))
    }

    fn input<'a>(
        prev: &'a Waypoint,
        current: &'a Waypoint,
        position: GeoPoint,
        groundspeed_ms: f64,
        acquired: bool
    ) -> GuidanceInput<'a> {
        GuidanceInput {
            position,
            groundspeed_ms,
            prev,
            current,
            current_index: 1,
            route_size: 3,
            acquired
        }
    }

    #[test]
    fn test_xtrack_sign_and_distances() {
        let geo = GreatCircle::default();
        let (prev, current) = leg();

        // 0.001 deg east of the leg, half way along
        let sol = compute(
            &geo, &Params::default(), FollowMode::Direct, CompletionMode::Loop,
            &input(&prev, &current, GeoPoint::new(0.001, 0.005), 15.0, true)
        );

        // Right of a northbound leg is positive
        assert!((sol.xtrack_m - 111.2).abs() < 1.0);
        assert!((sol.proj_dist_m - 556.0).abs() < 1.0);
        assert!(sol.leg_course_deg.abs() < 1e-9);
        // Direct mode flies the direct course
        assert_eq!(sol.nav_course_deg, sol.direct_course_deg);
        assert_eq!(sol.nav_dist_m, sol.direct_dist_m);

        // And left is negative
        let sol = compute(
            &geo, &Params::default(), FollowMode::Direct, CompletionMode::Loop,
            &input(&prev, &current, GeoPoint::new(-0.001, 0.005), 15.0, true)
        );
        assert!(sol.xtrack_m < 0.0);
    }

    #[test]
    fn test_xtrack_compensation_clamped() {
        assert_eq!(xtrack_compensation(10_000.0, 1.0), 45.0);
        assert_eq!(xtrack_compensation(-10_000.0, 1.0), -45.0);
        assert_eq!(xtrack_compensation(20.0, 0.5), 10.0);
        assert_eq!(xtrack_compensation(std::f64::INFINITY, 1.0), 45.0);
        assert_eq!(xtrack_compensation(std::f64::INFINITY, 0.0), 0.0);
    }

    #[test]
    fn test_xtrack_leg_hdg() {
        let geo = GreatCircle::default();
        let (prev, current) = leg();
        let params = Params {
            xtrack_gain_deg_per_m: 1.0,
            ..Default::default()
        };

        let sol = compute(
            &geo, &params, FollowMode::XtrackLegHdg, CompletionMode::Loop,
            &input(&prev, &current, GeoPoint::new(0.001, 0.005), 15.0, true)
        );

        // 111 m right * 1 deg/m saturates at 45 deg, steer left of the leg
        assert!((sol.nav_course_deg - 315.0).abs() < 1e-6);
        assert_eq!(sol.nav_dist_m, sol.proj_dist_m);
    }

    #[test]
    fn test_xtrack_first_wpt_is_direct() {
        let geo = GreatCircle::default();
        let (prev, current) = leg();
        let params = Params {
            xtrack_gain_deg_per_m: 0.1,
            ..Default::default()
        };
        let mut inp = input(&prev, &current, GeoPoint::new(0.001, 0.005), 15.0, true);
        inp.current_index = 0;

        for mode in &[FollowMode::XtrackLegHdg, FollowMode::XtrackDirectHdg] {
            let sol = compute(&geo, &params, *mode, CompletionMode::CircleLastWpt, &inp);
            assert_eq!(sol.nav_course_deg, sol.direct_course_deg);
            assert_eq!(sol.nav_dist_m, sol.direct_dist_m);
        }

        // Looping routes track the closing leg instead
        let sol = compute(&geo, &params, FollowMode::XtrackLegHdg, CompletionMode::Loop, &inp);
        assert_eq!(sol.nav_dist_m, sol.proj_dist_m);
    }

    #[test]
    fn test_xtrack_direct_hdg() {
        let geo = GreatCircle::default();
        let (prev, current) = leg();
        let params = Params {
            xtrack_gain_deg_per_m: 0.01,
            ..Default::default()
        };

        // Normal case, direct course corrected by the compensation
        let sol = compute(
            &geo, &params, FollowMode::XtrackDirectHdg, CompletionMode::Loop,
            &input(&prev, &current, GeoPoint::new(0.001, 0.005), 15.0, true)
        );
        let expected = wrap_360(sol.direct_course_deg - sol.xtrack_comp_deg);
        assert!((sol.nav_course_deg - expected).abs() < 1e-9);
        assert_eq!(sol.nav_dist_m, sol.direct_dist_m);

        // Way off to the side, more than 45 deg between leg and direct course
        let sol = compute(
            &geo, &params, FollowMode::XtrackDirectHdg, CompletionMode::Loop,
            &input(&prev, &current, GeoPoint::new(0.02, 0.005), 15.0, true)
        );
        assert!(sol.angle_deg.abs() > 45.0);
        assert_eq!(sol.nav_course_deg, sol.direct_course_deg);

        // Last leg of an extended route tracks the leg course
        let mut inp = input(&prev, &current, GeoPoint::new(0.001, 0.005), 15.0, true);
        inp.current_index = 2;
        let sol = compute(
            &geo, &params, FollowMode::XtrackDirectHdg, CompletionMode::ExtendLastLeg, &inp
        );
        let expected = wrap_360(sol.leg_course_deg - sol.xtrack_comp_deg);
        assert!((sol.nav_course_deg - expected).abs() < 1e-9);
        assert_eq!(sol.nav_dist_m, sol.direct_dist_m);
    }

    #[test]
    fn test_xtrack_leg_hdg_extended_last_leg() {
        let geo = GreatCircle::default();
        let (prev, current) = leg();
        let params = Params {
            xtrack_gain_deg_per_m: 0.01,
            ..Default::default()
        };

        // Past the last waypoint and east of the extended leg
        let mut inp = input(&prev, &current, GeoPoint::new(0.001, 0.012), 15.0, true);
        inp.current_index = 2;
        let sol = compute(
            &geo, &params, FollowMode::XtrackLegHdg, CompletionMode::ExtendLastLeg, &inp
        );

        assert!(sol.xtrack_m > 0.0);
        assert!(sol.proj_dist_m < 0.0);
        assert_eq!(sol.nav_dist_m, sol.proj_dist_m);

        let expected = wrap_360(sol.leg_course_deg - sol.xtrack_comp_deg);
        assert!((sol.nav_course_deg - expected).abs() < 1e-9);
        // Steering back left towards the leg
        assert!(sol.nav_course_deg > 270.0);
    }

    #[test]
    fn test_leader_zero_groundspeed_flies_direct() {
        let geo = GreatCircle::default();
        let (prev, current) = leg();

        let sol = compute(
            &geo, &Params::default(), FollowMode::Leader, CompletionMode::Loop,
            &input(&prev, &current, GeoPoint::new(0.001, 0.005), 0.0, true)
        );

        assert_eq!(sol.nav_course_deg, sol.direct_course_deg);
        assert_eq!(sol.nav_dist_m, sol.direct_dist_m);
    }

    #[test]
    fn test_leader_not_acquired_flies_direct() {
        let geo = GreatCircle::default();
        let (prev, current) = leg();

        let sol = compute(
            &geo, &Params::default(), FollowMode::Leader, CompletionMode::Loop,
            &input(&prev, &current, GeoPoint::new(0.001, 0.005), 20.0, false)
        );

        assert_eq!(sol.nav_course_deg, sol.direct_course_deg);
        assert_eq!(sol.nav_dist_m, sol.direct_dist_m);
    }

    #[test]
    fn test_leader_acquired() {
        let geo = GreatCircle::default();
        let (prev, current) = leg();

        // L1 = 0.7 * 25 * 20 / pi = 111.4 m, just larger than the 111.2 m
        // cross track so the pursuit angle hits the 30 deg floor.
        let sol = compute(
            &geo, &Params::default(), FollowMode::Leader, CompletionMode::Loop,
            &input(&prev, &current, GeoPoint::new(0.001, 0.005), 20.0, true)
        );

        // Right of a northbound leg, steer 60 deg left of the leg
        assert!((sol.nav_course_deg - 300.0).abs() < 1e-6);
        assert_eq!(sol.nav_dist_m, sol.proj_dist_m);
    }

    #[test]
    fn test_leader_course() {
        // Far outside the look-ahead, pursuit angle floored at 30 deg
        assert_eq!(leader_course(10.0, -10.0, 500.0, 100.0), Some(-60.0));
        assert_eq!(leader_course(10.0, -10.0, -500.0, 100.0), Some(60.0));

        // On the leg, acos(0) = 90 deg so steer the leg course
        assert_eq!(leader_course(10.0, -10.0, 0.0, 100.0), Some(0.0));

        // Inside the look-ahead, pursuit angle acos(xt / L1)
        let crs = leader_course(0.0, 0.0, 50.0, 100.0).unwrap();
        assert!((crs - (-30.0)).abs() < 1e-9);
        let crs = leader_course(0.0, 0.0, 10.0, 100.0).unwrap();
        let expected = -(90.0 - (0.1f64).acos().to_degrees());
        assert!((crs - expected).abs() < 1e-9);

        assert_eq!(leader_course(0.0, 0.0, 10.0, 0.0), None);
        assert_eq!(leader_course(0.0, 0.0, 10.0, std::f64::NAN), None);
    }

    #[test]
    fn test_nav_course_range() {
        let geo = GreatCircle::default();
        let (prev, current) = leg();
        let params = Params {
            xtrack_gain_deg_per_m: 1.0,
            ..Default::default()
        };

        let modes = [
            FollowMode::Direct,
            FollowMode::XtrackDirectHdg,
            FollowMode::XtrackLegHdg,
            FollowMode::Leader
        ];

        for i in 0..36 {
            let bearing = i as f64 * 10.0;
            let position = geo.direct(current.target(), bearing, 700.0);
            for mode in modes.iter() {
                let sol = compute(
                    &geo, &params, *mode, CompletionMode::Loop,
                    &input(&prev, &current, position, 18.0, true)
                );
                assert!(sol.nav_course_deg >= 0.0 && sol.nav_course_deg < 360.0);
                assert!(sol.angle_deg > -180.0 && sol.angle_deg <= 180.0);
                assert!(sol.xtrack_comp_deg.abs() <= 45.0);
            }
        }
    }
}
