//! # Route
//!
//! An ordered sequence of waypoints with a cursor on the waypoint currently
//! being flown to.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::Waypoint;
use util::geo::{GeoPoint, Geodesy};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A route, the insertion order of the waypoints is the order they are flown
/// in.
///
/// Whenever the route is not empty the cursor lies in `[0, size - 1]`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Route {
    waypoints: Vec<Waypoint>,

    /// Index of the waypoint currently being flown to
    current: usize,

    /// True once the vehicle has first reached a waypoint of this route
    acquired: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a waypoint to the end of the route.
    pub fn add_waypoint(&mut self, wp: Waypoint) {
        self.waypoints.push(wp);
    }

    /// Remove all waypoints and reset the cursor and acquired flag.
    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.current = 0;
        self.acquired = false;
    }

    pub fn size(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Index of the current waypoint.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Set the current waypoint, clamped to the last waypoint.
    pub fn set_current(&mut self, index: usize) {
        self.current = index.min(self.last_index());
    }

    /// Move on to the next waypoint, staying on the last one at the end of the route.
    pub fn increment_current(&mut self) {
        self.set_current(self.current + 1);
    }

    /// Move on to the next waypoint, going back to the first at the end of the route.
    pub fn increment_current_wrapping(&mut self) {
        if self.current >= self.last_index() {
            self.current = 0;
        }
        else {
            self.current += 1;
        }
    }

    /// True if the cursor is on the last waypoint.
    pub fn on_last(&self) -> bool {
        !self.is_empty() && self.current == self.last_index()
    }

    /// The waypoint currently being flown to.
    pub fn current(&self) -> Option<&Waypoint> {
        self.waypoints.get(self.current)
    }

    /// The waypoint at the start of the current leg.
    ///
    /// At the first waypoint this is the last waypoint of the route, so a
    /// looping route closes on itself.
    pub fn previous(&self) -> Option<&Waypoint> {
        if self.current == 0 {
            self.waypoints.last()
        }
        else {
            self.waypoints.get(self.current - 1)
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    pub fn set_acquired(&mut self, acquired: bool) {
        self.acquired = acquired;
    }

    /// Length of the route from the current waypoint to the last one, not
    /// including the distance to reach the current waypoint.
    ///
    /// Units: meters
    pub fn remaining_distance_from_current<G: Geodesy>(&self, geo: &G) -> f64 {
        self.waypoints
            .get(self.current..)
            .unwrap_or(&[])
            .windows(2)
            .map(|pair| geo.course_and_distance(pair[0].target(), pair[1].target()).1)
            .sum()
    }

    /// Place all relative waypoints around a new reference point and heading.
    pub fn refresh_offset_positions<G: Geodesy>(
        &mut self,
        geo: &G,
        reference: &GeoPoint,
        ref_heading_deg: f64
    ) {
        for wp in self.waypoints.iter_mut() {
            *wp = wp.resolved(geo, reference, ref_heading_deg);
        }
    }

    fn last_index(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::route_mgr::waypoint::{WaypointMode, ALT_UNSET_M};
    use util::geo::GreatCircle;

    fn three_point_route() -> Route {
        let mut route = Route::new();
        route.add_waypoint(Waypoint::at(0.0, 0.0));
        route.add_waypoint(Waypoint::at(0.0, 0.01));
        route.add_waypoint(Waypoint::at(0.01, 0.01));
        route
    }

    #[test]
    fn test_cursor_clamped() {
        let mut route = three_point_route();

        route.set_current(10);
        assert_eq!(route.current_index(), 2);

        route.increment_current();
        assert_eq!(route.current_index(), 2);
        assert!(route.on_last());

        route.increment_current_wrapping();
        assert_eq!(route.current_index(), 0);

        route.increment_current_wrapping();
        assert_eq!(route.current_index(), 1);

        let mut empty = Route::new();
        empty.set_current(3);
        assert_eq!(empty.current_index(), 0);
        empty.increment_current_wrapping();
        assert_eq!(empty.current_index(), 0);
        assert!(empty.current().is_none());
        assert!(empty.previous().is_none());
        assert!(!empty.on_last());
    }

    #[test]
    fn test_previous_wraps_to_last() {
        let mut route = three_point_route();

        assert_eq!(route.previous().unwrap().target_lon_deg(), 0.01);

        route.set_current(1);
        assert_eq!(route.previous().unwrap().target_lat_deg(), 0.0);
        assert_eq!(route.current().unwrap().target_lat_deg(), 0.01);
    }

    #[test]
    fn test_remaining_distance() {
        let geo = GreatCircle::default();
        let mut route = three_point_route();

        let leg_0 = geo.course_and_distance(
            route.waypoints()[0].target(), route.waypoints()[1].target()
        ).1;
        let leg_1 = geo.course_and_distance(
            route.waypoints()[1].target(), route.waypoints()[2].target()
        ).1;

        assert!((route.remaining_distance_from_current(&geo) - (leg_0 + leg_1)).abs() < 1e-9);

        route.set_current(1);
        assert!((route.remaining_distance_from_current(&geo) - leg_1).abs() < 1e-9);

        route.set_current(2);
        assert_eq!(route.remaining_distance_from_current(&geo), 0.0);
    }

    #[test]
    fn test_clear() {
        let mut route = three_point_route();
        route.set_current(2);
        route.set_acquired(true);

        route.clear();
        assert!(route.is_empty());
        assert_eq!(route.current_index(), 0);
        assert!(!route.is_acquired());
    }

    #[test]
    fn test_refresh_offset_positions() {
        let geo = GreatCircle::default();
        let mut route = Route::new();
        route.add_waypoint(Waypoint::at(1.0, 1.0));
        route.add_waypoint(Waypoint::new(
            0.0, 500.0, ALT_UNSET_M, ALT_UNSET_M, 0.0, WaypointMode::Relative, ""
        ));

        let home = GeoPoint::new(10.0, 50.0);
        route.refresh_offset_positions(&geo, &home, 270.0);

        assert_eq!(route.waypoints()[0].target(), &GeoPoint::new(1.0, 1.0));

        let (crs, dist) = geo.course_and_distance(&home, route.waypoints()[1].target());
        assert!((crs - 270.0).abs() < 1e-6);
        assert!((dist - 500.0).abs() < 1e-6);
    }
}
