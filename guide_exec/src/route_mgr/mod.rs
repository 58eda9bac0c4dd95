//! # Route manager module
//!
//! The route manager is responsible for flying the vehicle along a route, a
//! sequence of geographic waypoints. Once per control cycle it turns the
//! current position, ground track and groundspeed into a target course and a
//! target bank angle for the flight control loop, and advances through the
//! route as waypoints are reached.
//!
//! The cycle is made up of the following steps:
//!
//!  1. The start-up rule is applied to a freshly activated route (track the
//!     first leg rather than orbit the first waypoint if requested).
//!  2. The guidance law compares the direct course to the current waypoint
//!     with the course of the leg arriving at it. The difference gives the
//!     cross-track distance (positive to the right of the leg) and the
//!     distance remaining along the leg. The follow mode then decides which
//!     course to steer: direct-to, cross-track corrected, or the adaptive L1
//!     pursuit law.
//!  3. The bank command law converts the course error into a coordinated
//!     turn bank angle, saturated at the bank limit.
//!  4. The sequencer marks the route acquired and moves the cursor on once
//!     the vehicle is inside the acquisition radius, following the
//!     completion mode at the end of the route.
//!
//! Routes are double buffered. New routes are built into the standby slot
//! while the active route keeps flying, and are promoted by a swap between
//! cycles. A route that fails to build never reaches the active slot.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod altitude;
pub mod bank;
pub mod build;
pub mod cmd;
pub mod guidance;
pub mod params;
pub mod route;
pub mod route_store;
pub mod sequencer;
pub mod state;
pub mod waypoint;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use altitude::AltitudeTarget;
pub use bank::BankCmd;
pub use build::{RouteBuildError, RouteEntry, RouteFile};
pub use cmd::RouteCmd;
pub use params::{CompletionMode, FollowMode, Params, StartMode};
pub use route::Route;
pub use guidance::NavSolution;
pub use route_store::{RouteStore, RouteStoreError};
pub use sequencer::{Arrival, CircleRequest, RuntimeModes};
pub use state::*;
pub use waypoint::{Waypoint, WaypointError, WaypointMode, WaypointSpec};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Conversion factor from feet to meters.
pub const FEET_TO_METERS: f64 = 0.3048;

/// Conversion factor from meters to feet.
pub const METERS_TO_FEET: f64 = 1.0 / FEET_TO_METERS;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur during processing of the module.
#[derive(Debug, thiserror::Error)]
pub enum RouteMgrError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Could not load the route file: {0}")]
    RouteLoadError(util::params::LoadError),

    /// The route could not be built. The standby route has been discarded and the active route
    /// is still being flown.
    #[error("Route rejected: {0}")]
    BuildError(#[from] RouteBuildError),

    #[error("Could not swap routes: {0}")]
    SwapError(#[from] RouteStoreError),

    /// The reference point for repositioning is unset or bogus.
    #[error("Reposition rejected, reference point ({0:.6}, {1:.6}) is not a valid location")]
    InvalidReference(f64, f64),

    #[error("Could not archive route manager data: {0}")]
    ArchiveError(#[from] util::archive::ArchiveError)
}
