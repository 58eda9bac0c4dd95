//! # Route store
//!
//! Double buffer of routes. A new route is built in the standby slot while
//! the active route keeps flying, then promoted by swapping the slots. The
//! swap only flips which slot is active, no waypoint data is copied.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;

use super::Route;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Holds the active and standby routes.
#[derive(Debug, Clone, Default)]
pub struct RouteStore {
    slots: [Route; 2],

    /// Index of the active slot, the other slot is standby
    active: usize
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RouteStoreError {
    #[error("The standby route is empty")]
    StandbyEmpty
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &Route {
        &self.slots[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Route {
        &mut self.slots[self.active]
    }

    pub fn standby(&self) -> &Route {
        &self.slots[1 - self.active]
    }

    pub fn standby_mut(&mut self) -> &mut Route {
        &mut self.slots[1 - self.active]
    }

    /// Promote the standby route to active.
    ///
    /// The new active route starts from its first waypoint. Fails, leaving
    /// both routes untouched, if the standby route is empty.
    pub fn swap(&mut self) -> Result<(), RouteStoreError> {
        if self.standby().is_empty() {
            return Err(RouteStoreError::StandbyEmpty);
        }

        self.active = 1 - self.active;
        self.active_mut().set_current(0);

        info!("Route swapped, {} waypoints now active", self.active().size());

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::route_mgr::Waypoint;

    #[test]
    fn test_swap_empty_standby_fails() {
        let mut store = RouteStore::new();
        store.active_mut().add_waypoint(Waypoint::at(1.0, 1.0));
        store.active_mut().add_waypoint(Waypoint::at(2.0, 2.0));
        store.active_mut().set_current(1);

        assert!(store.swap().is_err());

        // Active is left exactly as it was
        assert_eq!(store.active().size(), 2);
        assert_eq!(store.active().current_index(), 1);
    }

    #[test]
    fn test_swap_resets_cursor() {
        let mut store = RouteStore::new();
        store.active_mut().add_waypoint(Waypoint::at(1.0, 1.0));

        store.standby_mut().add_waypoint(Waypoint::at(5.0, 5.0));
        store.standby_mut().add_waypoint(Waypoint::at(6.0, 6.0));
        store.standby_mut().add_waypoint(Waypoint::at(7.0, 7.0));
        store.standby_mut().set_current(2);

        store.swap().unwrap();

        assert_eq!(store.active().size(), 3);
        assert_eq!(store.active().current_index(), 0);

        // The old active route is now standby
        assert_eq!(store.standby().size(), 1);

        // And can be promoted back
        store.swap().unwrap();
        assert_eq!(store.active().size(), 1);
        assert_eq!(store.active().current_index(), 0);
    }
}
