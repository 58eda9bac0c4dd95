//! # Simulated vehicle
//!
//! A point mass flying coordinated turns at constant groundspeed. The bank
//! angle follows the demand at a limited roll rate and the ground track turns
//! at `g tan(bank) / V`. A positive bank turns right.
//!
//! The position fix can be made to drop out for a window of time to exercise
//! the stale fix handling of the route manager.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::route_mgr::{bank::GRAVITY_MS2, Home, InputData};
use util::{
    geo::{GeoPoint, Geodesy},
    maths::wrap_360
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Below this speed the vehicle is treated as not moving and doesn't turn.
///
/// Units: meters/second
const MIN_TURN_SPEED_MS: f64 = 0.1;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    /// Initial position of the vehicle
    pub start: GeoPoint,

    /// Units: meters MSL
    pub start_alt_m: f64,

    /// Units: degrees
    pub start_track_deg: f64,

    /// Units: meters/second
    pub groundspeed_ms: f64,

    /// Maximum rate of change of bank angle.
    ///
    /// Units: degrees/second
    pub max_roll_rate_degs: f64,

    /// Bank flown when the route manager asks for a circle or a fallback.
    ///
    /// Units: degrees
    pub loiter_bank_deg: f64,

    /// Length of the simulation.
    ///
    /// Units: seconds
    pub duration_s: f64,

    /// Home reference given to the route manager
    #[serde(default)]
    pub home: Option<Home>,

    /// Window during which no position fixes are received
    #[serde(default)]
    pub fix_dropout: Option<FixDropout>
}

/// A period of time with no position fixes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FixDropout {
    /// Units: seconds
    pub start_s: f64,

    /// Units: seconds
    pub end_s: f64
}

/// State of the simulated vehicle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SimVehicle {
    pub position: GeoPoint,

    /// Units: meters MSL
    pub alt_m: f64,

    /// Units: degrees
    pub track_deg: f64,

    /// Units: degrees
    pub bank_deg: f64,

    /// Units: meters/second
    pub groundspeed_ms: f64,

    /// Units: degrees/second
    max_roll_rate_degs: f64
}

/// Flat record of the vehicle state for archiving.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SimRecord {
    pub time_s: f64,
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub track_deg: f64,
    pub bank_deg: f64,
    pub bank_cmd_deg: f64
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimVehicle {
    /// Create a vehicle at the start point given in the parameters, flying
    /// wings level.
    pub fn new(params: &SimParams) -> Self {
        Self {
            position: params.start,
            alt_m: params.start_alt_m,
            track_deg: wrap_360(params.start_track_deg),
            bank_deg: 0.0,
            groundspeed_ms: params.groundspeed_ms,
            max_roll_rate_degs: params.max_roll_rate_degs
        }
    }

    /// Advance the vehicle by `dt_s` seconds with the given bank demand.
    pub fn step<G: Geodesy>(&mut self, geo: &G, bank_cmd_deg: f64, dt_s: f64) {
        // Roll towards the demand
        let max_change_deg = self.max_roll_rate_degs * dt_s;
        let change_deg = (bank_cmd_deg - self.bank_deg)
            .max(-max_change_deg)
            .min(max_change_deg);
        self.bank_deg += change_deg;

        // Coordinated turn
        if self.groundspeed_ms > MIN_TURN_SPEED_MS {
            let turn_rate_rads =
                GRAVITY_MS2 * self.bank_deg.to_radians().tan() / self.groundspeed_ms;
            self.track_deg = wrap_360(self.track_deg + turn_rate_rads.to_degrees() * dt_s);
        }

        self.position = geo.direct(&self.position, self.track_deg, self.groundspeed_ms * dt_s);
    }

    /// Build the route manager input for the given simulation time.
    pub fn input_data(&self, time_s: f64, params: &SimParams) -> InputData {
        InputData {
            position: self.position,
            alt_m: self.alt_m,
            groundspeed_ms: self.groundspeed_ms,
            groundtrack_deg: self.track_deg,
            fix_age_s: fix_age_s(time_s, params.fix_dropout),
            home: params.home,
            override_agl_ft: None,
            override_msl_ft: None
        }
    }

    pub fn record(&self, time_s: f64, bank_cmd_deg: f64) -> SimRecord {
        SimRecord {
            time_s,
            lon_deg: self.position.lon_deg,
            lat_deg: self.position.lat_deg,
            track_deg: self.track_deg,
            bank_deg: self.bank_deg,
            bank_cmd_deg
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Age of the position fix at `time_s`. Fixes are fresh outside of the dropout
/// window and age from the start of it inside.
pub fn fix_age_s(time_s: f64, dropout: Option<FixDropout>) -> f64 {
    match dropout {
        Some(d) if time_s >= d.start_s && time_s < d.end_s => time_s - d.start_s,
        _ => 0.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data_store::DataStore;
    use crate::route_mgr::{
        CompletionMode, FollowMode, Params, RouteEntry, RouteMgr, WaypointSpec
    };
    use util::{geo::GreatCircle, module::State};

    fn params() -> SimParams {
        SimParams {
            start: GeoPoint::new(0.0, -0.005),
            start_alt_m: 300.0,
            start_track_deg: 0.0,
            groundspeed_ms: 15.0,
            max_roll_rate_degs: 30.0,
            loiter_bank_deg: 15.0,
            duration_s: 60.0,
            home: None,
            fix_dropout: None
        }
    }

    #[test]
    fn test_straight_flight() {
        let geo = GreatCircle::default();
        let mut v = SimVehicle::new(&params());

        for _ in 0..10 {
            v.step(&geo, 0.0, 0.1);
        }

        let (crs, dist) = geo.course_and_distance(&GeoPoint::new(0.0, -0.005), &v.position);
        assert!(crs.abs() < 1e-6);
        assert!((dist - 15.0).abs() < 1e-6);
        assert_eq!(v.track_deg, 0.0);
    }

    #[test]
    fn test_roll_rate_and_turn_direction() {
        let geo = GreatCircle::default();
        let mut v = SimVehicle::new(&params());

        // 30 deg/s for 0.1 s
        v.step(&geo, 20.0, 0.1);
        assert!((v.bank_deg - 3.0).abs() < 1e-9);
        assert!(v.track_deg > 0.0 && v.track_deg < 1.0);

        for _ in 0..20 {
            v.step(&geo, 20.0, 0.1);
        }
        assert!((v.bank_deg - 20.0).abs() < 1e-9);

        // Left bank turns left
        let mut v = SimVehicle::new(&params());
        v.step(&geo, -20.0, 0.1);
        assert!(v.track_deg > 359.0);
    }

    #[test]
    fn test_fix_dropout() {
        let dropout = Some(FixDropout { start_s: 10.0, end_s: 15.0 });

        assert_eq!(fix_age_s(9.9, dropout), 0.0);
        assert!((fix_age_s(12.5, dropout) - 2.5).abs() < 1e-12);
        assert_eq!(fix_age_s(15.0, dropout), 0.0);
        assert_eq!(fix_age_s(12.5, None), 0.0);
    }

    #[test]
    fn test_closed_loop_flies_route() {
        let geo = GreatCircle::default();
        let sim_params = params();
        let mut v = SimVehicle::new(&sim_params);

        let mut mgr = RouteMgr::new(
            Params {
                follow_mode: FollowMode::Direct,
                completion_mode: CompletionMode::ExtendLastLeg,
                ..Default::default()
            },
            GreatCircle::default()
        );
        let entries: Vec<RouteEntry> = [(0.0, 0.0), (0.0, 0.01), (0.01, 0.01)]
            .iter()
            .map(|&(lon_deg, lat_deg)| RouteEntry::wpt(&WaypointSpec {
                lon_deg,
                lat_deg,
                ..Default::default()
            }))
            .collect();
        mgr.load_route(&entries).unwrap();

        let dt = 0.1;
        let mut reached_last = false;
        for i in 0..3000 {
            let time_s = i as f64 * dt;
            let (out, _) = mgr.proc(&v.input_data(time_s, &sim_params)).unwrap();
            assert!(out.target_bank_deg.abs() <= mgr.params().bank_limit_deg);
            v.step(&geo, out.target_bank_deg, dt);

            if out.target_waypoint_idx == 2 {
                reached_last = true;
                break;
            }
        }

        assert!(reached_last);
        assert!(mgr.active_route().is_acquired());
    }

    #[test]
    fn test_circle_held_after_last_waypoint() {
        let geo = GreatCircle::default();
        let sim_params = params();
        let mut v = SimVehicle::new(&sim_params);

        let mut ds = DataStore::default();
        ds.route_mgr = RouteMgr::new(
            Params {
                follow_mode: FollowMode::Direct,
                completion_mode: CompletionMode::CircleLastWpt,
                ..Default::default()
            },
            GreatCircle::default()
        );
        let entries: Vec<RouteEntry> = [(0.0, 0.0), (0.0, 0.01)]
            .iter()
            .map(|&(lon_deg, lat_deg)| RouteEntry::wpt(&WaypointSpec {
                lon_deg,
                lat_deg,
                ..Default::default()
            }))
            .collect();
        ds.route_mgr.load_route(&entries).unwrap();

        let dt = 0.1;
        let mut first_loiter_s = None;
        let mut toggles = 0;
        for _ in 0..6000 {
            ds.cycle_start(1.0 / dt);
            ds.route_mgr_input = v.input_data(ds.sim_time_s, &sim_params);
            let (out, _) = ds.route_mgr.proc(&ds.route_mgr_input).unwrap();
            ds.route_mgr_output = out;

            let was_loitering = ds.loitering;
            ds.select_bank_dem(sim_params.loiter_bank_deg);
            if ds.loitering != was_loitering {
                toggles += 1;
                first_loiter_s.get_or_insert(ds.sim_time_s);
            }

            v.step(&geo, ds.bank_dem_deg, dt);
            ds.num_cycles += 1;
        }

        // Once circling the vehicle never goes back to following the route
        assert!(first_loiter_s.is_some());
        assert_eq!(toggles, 1);
        assert!(ds.loitering);
        assert_eq!(ds.bank_dem_deg, sim_params.loiter_bank_deg);
    }

    #[test]
    fn test_shipped_sim_params() {
        let params: SimParams =
            util::params::from_str(include_str!("../../params/sim.toml")).unwrap();

        assert_eq!(params.groundspeed_ms, 18.0);
        assert!(params.home.is_some());
        assert!(params.fix_dropout.is_some());
    }
}
