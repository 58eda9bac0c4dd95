//! # Route building
//!
//! Routes are defined as an ordered list of entries. Each entry has a `kind`
//! which decides how the rest of its fields are read:
//!
//! ```toml
//! [[entries]]
//! kind = "wpt"
//! lon_deg = -93.15
//! lat_deg = 45.21
//! alt_ft = 400.0
//!
//! [[entries]]
//! kind = "enable"
//! ```
//!
//! `wpt` entries are waypoints, `enable` entries are accepted and ignored, and
//! anything else rejects the whole route.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::TryFrom;

// Internal
use super::{Route, Waypoint, WaypointError, WaypointSpec};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A route definition file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteFile {
    #[serde(default)]
    pub entries: Vec<RouteEntry>
}

/// A single entry of a route definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Kind of the entry
    pub kind: String,

    /// The remaining fields of the entry, interpreted according to `kind`
    #[serde(flatten)]
    pub fields: Map<String, Value>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RouteBuildError {
    #[error("Unknown route entry kind `{kind}` at entry {index}")]
    UnknownEntry {
        index: usize,
        kind: String
    },

    #[error("Route entry {index} is not a valid waypoint definition: {source}")]
    InvalidWaypointSpec {
        index: usize,
        source: serde_json::Error
    },

    #[error("Route entry {index} is not a valid waypoint: {source}")]
    InvalidWaypoint {
        index: usize,
        source: WaypointError
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RouteEntry {
    /// Create a waypoint entry from a spec.
    pub fn wpt(spec: &WaypointSpec) -> Self {
        let fields = match serde_json::to_value(spec) {
            Ok(Value::Object(m)) => m,
            _ => Map::new()
        };

        Self {
            kind: String::from("wpt"),
            fields
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build `route` from the given entries.
///
/// The route is cleared first. On error the route is left cleared so a
/// partially built route can never be promoted. Returns the number of
/// waypoints loaded.
pub fn build_route(entries: &[RouteEntry], route: &mut Route) -> Result<usize, RouteBuildError> {
    route.clear();

    for (index, entry) in entries.iter().enumerate() {
        if let Err(e) = build_entry(index, entry, route) {
            error!("{}", e);
            route.clear();
            return Err(e);
        }
    }

    info!("Loaded {} waypoints", route.size());

    Ok(route.size())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn build_entry(index: usize, entry: &RouteEntry, route: &mut Route) -> Result<(), RouteBuildError> {
    match entry.kind.as_str() {
        "wpt" => {
            let spec = WaypointSpec::deserialize(Value::Object(entry.fields.clone()))
                .map_err(|source| RouteBuildError::InvalidWaypointSpec { index, source })?;
            let wp = Waypoint::try_from(&spec)
                .map_err(|source| RouteBuildError::InvalidWaypoint { index, source })?;
            route.add_waypoint(wp);
            Ok(())
        },
        "enable" => Ok(()),
        kind => Err(RouteBuildError::UnknownEntry {
            index,
            kind: kind.to_string()
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::route_mgr::WaypointMode;

    const ROUTE_TOML: &str = r#"
        [[entries]]
        kind = "enable"

        [[entries]]
        kind = "wpt"
        lon_deg = -93.15
        lat_deg = 45.21
        alt_ft = 400.0
        id = "first"

        [[entries]]
        kind = "wpt"
        mode = "relative"
        offset_heading_deg = 90.0
        offset_dist_m = 300.0
        agl_ft = 200.0
    "#;

    #[test]
    fn test_build_from_toml() {
        let file: RouteFile = util::params::from_str(ROUTE_TOML).unwrap();
        assert_eq!(file.entries.len(), 3);

        let mut route = Route::new();
        assert_eq!(build_route(&file.entries, &mut route).unwrap(), 2);

        let first = &route.waypoints()[0];
        assert_eq!(first.target_lon_deg(), -93.15);
        assert_eq!(first.target_lat_deg(), 45.21);
        assert!((first.target_alt_m() - 121.92).abs() < 1e-9);
        assert_eq!(first.id(), "first");

        let second = &route.waypoints()[1];
        assert_eq!(second.mode(), WaypointMode::Relative);
        assert_eq!(second.offset_hdg_deg(), 90.0);
        assert_eq!(second.offset_dist_m(), 300.0);
        assert!((second.target_agl_m() - 60.96).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_entry_rejects_route() {
        let file: RouteFile = util::params::from_str(
            r#"
            [[entries]]
            kind = "wpt"
            lon_deg = 1.0
            lat_deg = 1.0

            [[entries]]
            kind = "loiter"
            "#
        ).unwrap();

        let mut route = Route::new();
        match build_route(&file.entries, &mut route) {
            Err(RouteBuildError::UnknownEntry { index, kind }) => {
                assert_eq!(index, 1);
                assert_eq!(kind, "loiter");
            },
            _ => panic!("Expected an unknown entry error")
        }

        // Nothing half built is left behind
        assert!(route.is_empty());
    }

    #[test]
    fn test_bad_waypoint_field() {
        let file: RouteFile = util::params::from_str(
            r#"
            [[entries]]
            kind = "wpt"
            lon_deg = "east"
            "#
        ).unwrap();

        let mut route = Route::new();
        assert!(matches!(
            build_route(&file.entries, &mut route),
            Err(RouteBuildError::InvalidWaypointSpec { index: 0, .. })
        ));
    }

    #[test]
    fn test_entry_from_spec() {
        let spec = WaypointSpec {
            lon_deg: 3.0,
            lat_deg: 4.0,
            ..Default::default()
        };

        let mut route = Route::new();
        build_route(&[RouteEntry::wpt(&spec)], &mut route).unwrap();
        assert_eq!(route.waypoints()[0].target_lat_deg(), 4.0);
    }

    #[test]
    fn test_shipped_route() {
        let file: RouteFile =
            util::params::from_str(include_str!("../../../params/route.toml")).unwrap();

        let mut route = Route::new();
        assert_eq!(build_route(&file.entries, &mut route).unwrap(), 4);
        assert_eq!(route.waypoints()[3].mode(), WaypointMode::Relative);
    }
}
