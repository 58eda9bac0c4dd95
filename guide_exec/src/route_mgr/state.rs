//! Implementations for the RouteMgr state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// Internal
use super::{
    altitude::{altitude_target, AltitudeTarget},
    bank::target_bank,
    build::build_route,
    guidance::{self, GuidanceInput},
    sequencer::{apply_start_mode, sequence, Arrival, CircleRequest, RuntimeModes},
    Params, Route, RouteCmd, RouteEntry, RouteFile, RouteMgrError, RouteStore,
    Waypoint, WaypointMode
};
use util::{
    archive::{Archived, Archiver},
    geo::{GeoPoint, Geodesy, GreatCircle},
    module::State,
    session::Session
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Reference points closer than this to (0, 0) in both longitude and
/// latitude are assumed to be unset.
///
/// Units: degrees
const REFERENCE_UNSET_DEG: f64 = 0.0001;

/// ETA is only estimated above this groundspeed.
///
/// Units: meters/second
const MIN_ETA_GROUNDSPEED_MS: f64 = 0.1;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Route manager module state
pub struct RouteMgr<G: Geodesy = GreatCircle> {

    pub(crate) params: Params,

    geo: G,

    store: RouteStore,

    /// Modes in force for the active route
    modes: RuntimeModes,

    /// Set when a route has been activated and the start-up rule has not yet
    /// been applied to it.
    ///
    /// The rule is applied once per activation, so a looping route flies
    /// through waypoint 0 on later laps rather than skipping it each time the
    /// cursor wraps.
    start_pending: bool,

    /// Set once the last waypoint has been reached under `CircleLastWpt`,
    /// cleared when another route is activated
    circling: bool,

    /// Home used for the last reposition check
    last_home: Option<Home>,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    pub(crate) output: Option<OutputData>,
    arch_output: Archiver,

    /// True while the position fix is stale
    fix_stale: bool
}

/// Initialisation data for the route manager.
#[derive(Debug, Clone, Default)]
pub struct InitData {
    /// Path to the parameter file, relative to the params directory
    pub params_path: String,

    /// Path to a route file to load, relative to the params directory
    pub route_path: Option<String>
}

/// Input data to the route manager.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct InputData {
    /// Current position of the vehicle
    pub position: GeoPoint,

    /// Current altitude.
    ///
    /// Units: meters MSL
    pub alt_m: f64,

    /// Units: meters/second
    pub groundspeed_ms: f64,

    /// Units: degrees
    pub groundtrack_deg: f64,

    /// Age of the position fix.
    ///
    /// Units: seconds
    pub fix_age_s: f64,

    /// Home reference for relative waypoints, if known
    pub home: Option<Home>,

    /// Manual height above ground override.
    ///
    /// Units: feet
    pub override_agl_ft: Option<f64>,

    /// Manual altitude override.
    ///
    /// Units: feet MSL
    pub override_msl_ft: Option<f64>
}

/// Home reference point and azimuth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Home {
    pub lon_deg: f64,
    pub lat_deg: f64,

    /// Reference heading of the pattern.
    ///
    /// Units: degrees
    pub azimuth_deg: f64
}

/// Outputs of the route manager for the flight control loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OutputData {
    /// Course to steer, in [0, 360).
    ///
    /// Units: degrees
    pub target_course_deg: f64,

    /// Bank angle to fly.
    ///
    /// Units: degrees
    pub target_bank_deg: f64,

    /// Cross track distance, positive right of the leg.
    ///
    /// Units: meters
    pub xtrack_dist_m: f64,

    /// Distance remaining along the leg.
    ///
    /// Units: meters
    pub proj_dist_m: f64,

    /// Index of the waypoint being flown to
    pub target_waypoint_idx: usize,

    /// Direct distance to the current waypoint.
    ///
    /// Units: meters
    pub wp_dist_m: f64,

    /// Time to the current waypoint, zero if not moving.
    ///
    /// Units: seconds
    pub wp_eta_s: f64,

    /// Distance to the end of the route.
    ///
    /// Units: meters
    pub dist_remaining_m: f64,

    /// Height above ground target, `None` leaves the previous target.
    ///
    /// Units: feet
    pub target_agl_ft: Option<f64>,

    /// Altitude target, `None` leaves the previous target.
    ///
    /// Units: feet MSL
    pub target_msl_ft: Option<f64>,

    /// Set when the vehicle should circle the given point
    pub circle_request: Option<CircleRequest>,

    /// Set when there is no route to fly and the caller should fall back
    pub fallback_requested: Option<FallbackRequest>
}

/// Flat copy of the output for archiving.
#[derive(Debug, Clone, Copy, Serialize)]
struct OutputRecord {
    target_course_deg: f64,
    target_bank_deg: f64,
    xtrack_dist_m: f64,
    proj_dist_m: f64,
    target_waypoint_idx: usize,
    wp_dist_m: f64,
    wp_eta_s: f64,
    dist_remaining_m: f64,
    target_agl_ft: Option<f64>,
    target_msl_ft: Option<f64>,
    circle_lon_deg: Option<f64>,
    circle_lat_deg: Option<f64>,
    fallback_requested: bool
}

/// Status report for RouteMgr processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// Guidance was held because the position fix is stale
    pub fix_stale: bool,

    /// Guidance was not computed because the active route is empty
    pub route_empty: bool,

    /// Relative waypoints were placed around a new home this cycle
    pub repositioned: bool,

    pub route_acquired: bool,

    /// The cursor moved on this cycle
    pub wpt_advanced: bool,

    /// The last waypoint has been reached and is being held
    pub holding_last_wpt: bool,

    pub bank_limited: bool,

    pub direct_course_deg: f64,
    pub leg_course_deg: f64,
    pub angle_deg: f64,
    pub xtrack_comp_deg: f64,
    pub nav_dist_m: f64,
    pub course_error_deg: f64,
    pub raw_bank_deg: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Fallback behaviour requested of the surrounding system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackRequest {
    /// Loiter around the home position.
    LoiterHome
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for RouteMgr<GreatCircle> {
    fn default() -> Self {
        Self::new(Params::default(), GreatCircle::default())
    }
}

impl<G: Geodesy> State for RouteMgr<G> {
    type InitData = InitData;
    type InitError = RouteMgrError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = RouteMgrError;

    /// Initialise the RouteMgr module.
    ///
    /// Loads the parameters and, if one is given, the initial route.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        let mut params: Params = util::params::load(&init_data.params_path)
            .map_err(RouteMgrError::ParamLoadError)?;
        params.apply_defaults();
        self.modes = modes_from(&params);
        self.params = params;

        // Initialise the archivers
        self.arch_report = Archiver::from_path(session, "route_mgr/status_report.csv")?;
        self.arch_output = Archiver::from_path(session, "route_mgr/output.csv")?;

        // Load the initial route
        if let Some(ref route_path) = init_data.route_path {
            let file: RouteFile = util::params::load(route_path)
                .map_err(RouteMgrError::RouteLoadError)?;
            self.load_route(&file.entries)?;
        }

        Ok(())
    }

    /// Perform cyclic processing of the route manager.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        if let Some(home) = input_data.home {
            self.report.repositioned = self.reposition_if_necessary(home);
        }

        // Nothing to fly, hold the previous targets and ask for a fallback
        if self.store.active().is_empty() {
            self.report.route_empty = true;

            let mut output = self.output.unwrap_or_default();
            output.circle_request = None;
            output.fallback_requested = Some(FallbackRequest::LoiterHome);

            trace!("RouteMgr: no active route, fallback requested");

            self.output = Some(output);
            return Ok((output, self.report));
        }

        // Hold the previous output on a stale fix rather than extrapolate
        if !(input_data.fix_age_s < self.params.fix_timeout_s) {
            if !self.fix_stale {
                warn!(
                    "Position fix is stale ({:.1} s old), holding guidance",
                    input_data.fix_age_s
                );
            }
            self.fix_stale = true;
            self.report.fix_stale = true;

            let output = self.output.unwrap_or_default();
            self.output = Some(output);
            return Ok((output, self.report));
        }
        else if self.fix_stale {
            info!("Position fix recovered, resuming guidance");
            self.fix_stale = false;
        }

        let output = self.compute_guidance(input_data);

        trace!(
            "RouteMgr output: course {:.1} deg, bank {:.1} deg, wpt {}",
            output.target_course_deg, output.target_bank_deg, output.target_waypoint_idx
        );

        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl<G: Geodesy> Archived for RouteMgr<G> {
    fn write(&mut self) -> Result<(), util::archive::ArchiveError> {
        self.arch_report.serialise(self.report)?;
        if let Some(ref output) = self.output {
            self.arch_output.serialise(OutputRecord::from(output))?;
        }

        Ok(())
    }
}

impl<G: Geodesy> RouteMgr<G> {
    /// Create a new route manager with the given parameters and earth model.
    ///
    /// Unconfigured L1 parameters are substituted with their defaults.
    pub fn new(mut params: Params, geo: G) -> Self {
        params.apply_defaults();

        Self {
            modes: modes_from(&params),
            params,
            geo,
            store: RouteStore::new(),
            start_pending: false,
            circling: false,
            last_home: None,
            report: StatusReport::default(),
            arch_report: Archiver::default(),
            output: None,
            arch_output: Archiver::default(),
            fix_stale: false
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The route being flown.
    pub fn active_route(&self) -> &Route {
        self.store.active()
    }

    /// The route being built.
    pub fn standby_route(&self) -> &Route {
        self.store.standby()
    }

    /// The modes currently in force.
    pub fn modes(&self) -> RuntimeModes {
        self.modes
    }

    /// The last output produced.
    pub fn output(&self) -> Option<&OutputData> {
        self.output.as_ref()
    }

    /// Apply a command. Must only be called between cycles.
    pub fn handle_cmd(&mut self, cmd: &RouteCmd) -> Result<(), RouteMgrError> {
        debug!("RouteMgr command: {:?}", cmd);

        match cmd {
            RouteCmd::Load { entries } => self.load_route(entries).map(|_| ()),
            RouteCmd::AppendWaypoint { text } => {
                self.new_waypoint_str(text);
                Ok(())
            },
            RouteCmd::AppendWaypointFields { field1, field2, alt_m, mode } => {
                self.new_waypoint(*field1, *field2, *alt_m, *mode);
                Ok(())
            },
            RouteCmd::ClearStandby => {
                self.store.standby_mut().clear();
                Ok(())
            },
            RouteCmd::Swap => self.swap(),
            RouteCmd::Reposition { lon_deg, lat_deg, heading_deg } => {
                self.reposition_pattern(GeoPoint::new(*lon_deg, *lat_deg), *heading_deg)
            }
        }
    }

    /// Build a route into standby and promote it.
    ///
    /// If the route can't be built the standby route is discarded and the
    /// active route is kept. Returns the number of waypoints loaded.
    pub fn load_route(&mut self, entries: &[RouteEntry]) -> Result<usize, RouteMgrError> {
        let num_wpts = build_route(entries, self.store.standby_mut())?;
        self.swap()?;
        Ok(num_wpts)
    }

    /// Append a waypoint in the compact `lon,lat[@alt_ft]` form to the
    /// standby route.
    pub fn new_waypoint_str(&mut self, text: &str) {
        let wp = match Waypoint::from_str(text) {
            Ok(wp) => wp,
            Err(never) => match never {}
        };
        self.store.standby_mut().add_waypoint(wp);
    }

    /// Append a waypoint built from fields to the standby route.
    ///
    /// Relative waypoints take the distance (meters) as `field1` and the
    /// heading offset (degrees) as `field2`. `alt_m` is a height above
    /// ground.
    pub fn new_waypoint(&mut self, field1: f64, field2: f64, alt_m: f64, mode: WaypointMode) {
        self.store.standby_mut().add_waypoint(Waypoint::from_fields(field1, field2, alt_m, mode));
    }

    /// Promote the standby route to active.
    ///
    /// The modes are reset to the configured ones and the start-up rule will
    /// be applied on the next cycle. Relative waypoints of the new route are
    /// placed around the last known home.
    pub fn swap(&mut self) -> Result<(), RouteMgrError> {
        if let Err(e) = self.store.swap() {
            warn!("Swap rejected: {}", e);
            return Err(e.into());
        }

        self.modes = modes_from(&self.params);
        self.start_pending = true;
        self.circling = false;

        if let Some(home) = self.last_home {
            let reference = GeoPoint::new(home.lon_deg, home.lat_deg);
            if self.reposition_pattern(reference, home.azimuth_deg).is_err() {
                debug!("Last home is not valid, new route not repositioned");
            }
        }

        Ok(())
    }

    /// Place the relative waypoints of the active route around `reference`.
    ///
    /// A reference within 0.0001 degrees of (0, 0) is assumed to be unset and
    /// is rejected, leaving the route unchanged.
    pub fn reposition_pattern(
        &mut self,
        reference: GeoPoint,
        heading_deg: f64
    ) -> Result<(), RouteMgrError> {
        if !(reference.lon_deg.abs() > REFERENCE_UNSET_DEG
            || reference.lat_deg.abs() > REFERENCE_UNSET_DEG)
        {
            return Err(RouteMgrError::InvalidReference(reference.lon_deg, reference.lat_deg));
        }

        self.store.active_mut().refresh_offset_positions(&self.geo, &reference, heading_deg);

        info!(
            "Route pattern updated: {:.6} {:.6} (course = {:.1})",
            reference.lon_deg, reference.lat_deg, heading_deg
        );

        Ok(())
    }

    /// Reposition the route if home has moved since the last check.
    ///
    /// The new home is remembered even if the reposition is rejected. Returns
    /// `true` if home had moved.
    pub fn reposition_if_necessary(&mut self, home: Home) -> bool {
        let moved = match self.last_home {
            Some(last) => {
                (home.lon_deg - last.lon_deg).abs() > self.params.home_lon_epsilon_deg
                || (home.lat_deg - last.lat_deg).abs() > self.params.home_lat_epsilon_deg
                || (home.azimuth_deg - last.azimuth_deg).abs()
                    > self.params.home_azimuth_epsilon_deg
            },
            None => true
        };

        if !moved {
            return false;
        }

        let reference = GeoPoint::new(home.lon_deg, home.lat_deg);
        if let Err(e) = self.reposition_pattern(reference, home.azimuth_deg) {
            warn!("{}", e);
        }
        self.last_home = Some(home);

        true
    }

    /// Run the guidance, bank and sequencing laws on the active route.
    ///
    /// The active route must not be empty.
    fn compute_guidance(&mut self, input_data: &InputData) -> OutputData {
        if self.start_pending {
            apply_start_mode(self.store.active_mut(), &mut self.modes);
            self.start_pending = false;
        }

        let route = self.store.active();
        let (sol, altitude, dist_remaining_m) = match (route.previous(), route.current()) {
            (Some(prev), Some(current)) => {
                let sol = guidance::compute(
                    &self.geo,
                    &self.params,
                    self.modes.follow,
                    self.modes.completion,
                    &GuidanceInput {
                        position: input_data.position,
                        groundspeed_ms: input_data.groundspeed_ms,
                        prev,
                        current,
                        current_index: route.current_index(),
                        route_size: route.size(),
                        acquired: route.is_acquired()
                    }
                );

                let altitude = altitude_target(
                    current,
                    input_data.override_agl_ft,
                    input_data.override_msl_ft
                );

                let dist_remaining_m =
                    sol.nav_dist_m + route.remaining_distance_from_current(&self.geo);

                (sol, altitude, dist_remaining_m)
            },
            _ => return self.output.unwrap_or_default()
        };

        let bank = target_bank(
            input_data.groundtrack_deg,
            sol.nav_course_deg,
            input_data.groundspeed_ms,
            &self.params
        );

        let arrival = sequence(
            self.store.active_mut(),
            self.modes.completion,
            sol.nav_dist_m,
            self.params.acquire_radius_m
        );

        match arrival {
            Arrival::Advanced => self.report.wpt_advanced = true,
            Arrival::Holding => self.report.holding_last_wpt = true,
            Arrival::CircleRequested(_) => {
                if !self.circling {
                    info!("Last waypoint reached, requesting a circle");
                }
                self.circling = true;
            },
            Arrival::None => ()
        }

        // The circle is held for the rest of the route's life, wherever the
        // loiter takes the vehicle. The centre follows any reposition.
        let circle_request = if self.circling {
            self.report.holding_last_wpt = true;
            self.store.active().current().map(|wp| CircleRequest { centre: *wp.target() })
        }
        else {
            None
        };

        let (target_agl_ft, target_msl_ft) = match altitude {
            Some(AltitudeTarget::AglFt(ft)) => (Some(ft), None),
            Some(AltitudeTarget::MslFt(ft)) => (None, Some(ft)),
            None => (None, None)
        };

        let wp_eta_s = if input_data.groundspeed_ms > MIN_ETA_GROUNDSPEED_MS {
            sol.direct_dist_m / input_data.groundspeed_ms
        }
        else {
            0.0
        };

        self.report.route_acquired = self.store.active().is_acquired();
        self.report.bank_limited = bank.limited;
        self.report.direct_course_deg = sol.direct_course_deg;
        self.report.leg_course_deg = sol.leg_course_deg;
        self.report.angle_deg = sol.angle_deg;
        self.report.xtrack_comp_deg = sol.xtrack_comp_deg;
        self.report.nav_dist_m = sol.nav_dist_m;
        self.report.course_error_deg = bank.course_error_deg;
        self.report.raw_bank_deg = bank.raw_bank_deg;

        OutputData {
            target_course_deg: sol.nav_course_deg,
            target_bank_deg: bank.bank_deg,
            xtrack_dist_m: sol.xtrack_m,
            proj_dist_m: sol.proj_dist_m,
            target_waypoint_idx: self.store.active().current_index(),
            wp_dist_m: sol.direct_dist_m,
            wp_eta_s,
            dist_remaining_m,
            target_agl_ft,
            target_msl_ft,
            circle_request,
            fallback_requested: None
        }
    }
}

impl From<&OutputData> for OutputRecord {
    fn from(o: &OutputData) -> Self {
        Self {
            target_course_deg: o.target_course_deg,
            target_bank_deg: o.target_bank_deg,
            xtrack_dist_m: o.xtrack_dist_m,
            proj_dist_m: o.proj_dist_m,
            target_waypoint_idx: o.target_waypoint_idx,
            wp_dist_m: o.wp_dist_m,
            wp_eta_s: o.wp_eta_s,
            dist_remaining_m: o.dist_remaining_m,
            target_agl_ft: o.target_agl_ft,
            target_msl_ft: o.target_msl_ft,
            circle_lon_deg: o.circle_request.map(|c| c.centre.lon_deg),
            circle_lat_deg: o.circle_request.map(|c| c.centre.lat_deg),
            fallback_requested: o.fallback_requested.is_some()
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn modes_from(params: &Params) -> RuntimeModes {
    RuntimeModes {
        start: params.start_mode,
        follow: params.follow_mode,
        completion: params.completion_mode
    }
}
