//! # Sequencer
//!
//! Moves the route cursor on as waypoints are reached. The sequencing state
//! is the cursor and acquired flag of the route together with the completion
//! mode in force.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{CompletionMode, FollowMode, Route, StartMode};
use util::geo::GeoPoint;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Modes currently in force for the active route.
///
/// These start from the configured modes but may be overridden by the
/// start-up rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuntimeModes {
    pub start: StartMode,
    pub follow: FollowMode,
    pub completion: CompletionMode
}

/// Request for an external circle (orbit) around a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleRequest {
    pub centre: GeoPoint
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Result of sequencing for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arrival {
    /// The current waypoint has not been reached.
    None,

    /// The current waypoint was reached and the cursor moved on.
    Advanced,

    /// The last waypoint was reached and the cursor is held there.
    Holding,

    /// The last waypoint was reached and a circle around it is requested.
    CircleRequested(CircleRequest)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply the start-up rule to a freshly activated route.
///
/// With `FirstLeg` starts the cursor is moved from the first waypoint to the
/// second so the first leg is tracked. A route of a single waypoint has no
/// leg, so the modes are forced to `FirstWpt` and `Direct` instead.
pub fn apply_start_mode(route: &mut Route, modes: &mut RuntimeModes) {
    if modes.start != StartMode::FirstLeg || route.current_index() != 0 {
        return;
    }

    if route.size() > 1 {
        route.increment_current();
        debug!("First leg start, now tracking waypoint 1");
    }
    else {
        warn!("Cannot start on the first leg of a single waypoint route, flying direct");
        modes.start = StartMode::FirstWpt;
        modes.follow = FollowMode::Direct;
    }
}

/// Sequence the route given the navigation distance to the current waypoint.
///
/// At most one waypoint is passed per call.
pub fn sequence(
    route: &mut Route,
    completion: CompletionMode,
    nav_dist_m: f64,
    acquire_radius_m: f64
) -> Arrival {
    if route.is_empty() || !(nav_dist_m < acquire_radius_m) {
        return Arrival::None;
    }

    if !route.is_acquired() {
        info!("Route acquired");
    }
    route.set_acquired(true);

    match completion {
        CompletionMode::Loop => {
            route.increment_current_wrapping();
            Arrival::Advanced
        },
        CompletionMode::CircleLastWpt if route.on_last() => {
            match route.current() {
                Some(wp) => Arrival::CircleRequested(CircleRequest {
                    centre: *wp.target()
                }),
                None => Arrival::Holding
            }
        },
        CompletionMode::ExtendLastLeg if route.on_last() => Arrival::Holding,
        _ => {
            route.increment_current();
            Arrival::Advanced
        }
    }
}
