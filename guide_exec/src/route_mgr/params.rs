//! Route manager parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Values below this are treated as "not configured" for the L1 parameters.
const UNSET_THRESHOLD: f64 = 0.1;

/// Bank limit used when none is configured.
pub const DEFAULT_BANK_LIMIT_DEG: f64 = 20.0;

/// L1 period used when none is configured.
pub const DEFAULT_L1_PERIOD_S: f64 = 25.0;

/// L1 damping used when none is configured.
pub const DEFAULT_L1_DAMPING: f64 = 0.7;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the route manager
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Params {

    // ---- L1 CONTROLLER ----

    /// Maximum magnitude of the bank command.
    ///
    /// Units: degrees
    #[serde(default)]
    pub bank_limit_deg: f64,

    /// L1 period, the time constant of the pursuit law.
    ///
    /// Units: seconds
    #[serde(default)]
    pub l1_period_s: f64,

    /// L1 damping ratio.
    #[serde(default)]
    pub l1_damping: f64,

    // ---- CROSS TRACK ----

    /// Gain from cross track distance to course compensation.
    ///
    /// Units: degrees/meter
    #[serde(default)]
    pub xtrack_gain_deg_per_m: f64,

    // ---- SEQUENCING ----

    /// Distance under which a waypoint is considered reached.
    ///
    /// Units: meters
    #[serde(default = "default_acquire_radius_m")]
    pub acquire_radius_m: f64,

    /// Position fixes older than this are considered stale and guidance is
    /// held.
    ///
    /// Units: seconds
    #[serde(default = "default_fix_timeout_s")]
    pub fix_timeout_s: f64,

    #[serde(default)]
    pub start_mode: StartMode,

    #[serde(default)]
    pub follow_mode: FollowMode,

    #[serde(default)]
    pub completion_mode: CompletionMode,

    // ---- REPOSITIONING ----

    /// Home longitude change which triggers a reposition.
    ///
    /// Units: degrees
    #[serde(default = "default_home_pos_epsilon_deg")]
    pub home_lon_epsilon_deg: f64,

    /// Home latitude change which triggers a reposition.
    ///
    /// Units: degrees
    #[serde(default = "default_home_pos_epsilon_deg")]
    pub home_lat_epsilon_deg: f64,

    /// Home azimuth change which triggers a reposition.
    ///
    /// Units: degrees
    #[serde(default = "default_home_az_epsilon_deg")]
    pub home_azimuth_epsilon_deg: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How a newly activated route is started.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartMode {
    /// Fly to the first waypoint.
    FirstWpt,

    /// Track the leg from the first waypoint to the second.
    FirstLeg
}

/// How the navigation course is derived from the position relative to the
/// route.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FollowMode {
    /// Steer the direct course to the current waypoint.
    Direct,

    /// Steer the direct course corrected by the cross track compensation.
    XtrackDirectHdg,

    /// Steer the leg course corrected by the cross track compensation.
    XtrackLegHdg,

    /// Adaptive L1 pursuit of a point on the leg ahead of the vehicle.
    Leader
}

/// What happens once the last waypoint of the route is reached.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionMode {
    /// Go back to the first waypoint.
    Loop,

    /// Request a circle around the last waypoint.
    CircleLastWpt,

    /// Keep tracking the last leg beyond the last waypoint.
    ExtendLastLeg
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Substitute conservative values for any L1 parameter which has not been
    /// configured.
    ///
    /// Returns `true` if any value was substituted.
    pub fn apply_defaults(&mut self) -> bool {
        let mut substituted = false;

        if self.bank_limit_deg < UNSET_THRESHOLD {
            warn!(
                "Bank limit not configured ({}), using {} deg",
                self.bank_limit_deg, DEFAULT_BANK_LIMIT_DEG
            );
            self.bank_limit_deg = DEFAULT_BANK_LIMIT_DEG;
            substituted = true;
        }
        if self.l1_period_s < UNSET_THRESHOLD {
            warn!(
                "L1 period not configured ({}), using {} s",
                self.l1_period_s, DEFAULT_L1_PERIOD_S
            );
            self.l1_period_s = DEFAULT_L1_PERIOD_S;
            substituted = true;
        }
        if self.l1_damping < UNSET_THRESHOLD {
            warn!(
                "L1 damping not configured ({}), using {}",
                self.l1_damping, DEFAULT_L1_DAMPING
            );
            self.l1_damping = DEFAULT_L1_DAMPING;
            substituted = true;
        }

        substituted
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            bank_limit_deg: DEFAULT_BANK_LIMIT_DEG,
            l1_period_s: DEFAULT_L1_PERIOD_S,
            l1_damping: DEFAULT_L1_DAMPING,
            xtrack_gain_deg_per_m: 0.0,
            acquire_radius_m: default_acquire_radius_m(),
            fix_timeout_s: default_fix_timeout_s(),
            start_mode: StartMode::default(),
            follow_mode: FollowMode::default(),
            completion_mode: CompletionMode::default(),
            home_lon_epsilon_deg: default_home_pos_epsilon_deg(),
            home_lat_epsilon_deg: default_home_pos_epsilon_deg(),
            home_azimuth_epsilon_deg: default_home_az_epsilon_deg(),
        }
    }
}

impl Default for StartMode {
    fn default() -> Self {
        StartMode::FirstWpt
    }
}

impl Default for FollowMode {
    fn default() -> Self {
        FollowMode::XtrackLegHdg
    }
}

impl Default for CompletionMode {
    fn default() -> Self {
        CompletionMode::Loop
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_acquire_radius_m() -> f64 {
    50.0
}

fn default_fix_timeout_s() -> f64 {
    10.0
}

fn default_home_pos_epsilon_deg() -> f64 {
    0.000001
}

fn default_home_az_epsilon_deg() -> f64 {
    0.001
}
