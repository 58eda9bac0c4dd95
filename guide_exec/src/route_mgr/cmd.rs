//! Commands to the route manager, applied between control cycles.

use serde::{Deserialize, Serialize};

use super::{RouteEntry, WaypointMode};

/// A command to the route manager.
///
/// In scripts commands are written as JSON, for example
/// `{"type": "AppendWaypoint", "text": "-93.15,45.21@400"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RouteCmd {
    /// Build the given entries into the standby route and promote it.
    Load {
        entries: Vec<RouteEntry>
    },

    /// Append a waypoint given in the compact `lon,lat[@alt_ft]` form to the
    /// standby route.
    AppendWaypoint {
        text: String
    },

    /// Append a waypoint given as fields to the standby route.
    AppendWaypointFields {
        field1: f64,
        field2: f64,
        alt_m: f64,
        #[serde(default)]
        mode: WaypointMode
    },

    /// Empty the standby route.
    ClearStandby,

    /// Promote the standby route.
    Swap,

    /// Place the relative waypoints of the active route around a reference.
    Reposition {
        lon_deg: f64,
        lat_deg: f64,
        heading_deg: f64
    }
}
