//! # Data Store

use log::{info, warn};

use crate::route_mgr;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of consecutive cycle overruns after which the executable gives up
/// on holding the cycle period.
pub const MAX_CONSEC_CYCLE_OVERRUNS: u64 = 500;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Simulation elapsed time
    pub sim_time_s: f64,

    // RouteMgr
    pub route_mgr: route_mgr::RouteMgr,
    pub route_mgr_input: route_mgr::InputData,
    pub route_mgr_output: route_mgr::OutputData,
    pub route_mgr_status_rpt: route_mgr::StatusReport,

    /// Bank angle demanded of the vehicle this cycle
    pub bank_dem_deg: f64,

    /// True while the vehicle is loitering rather than following the route
    pub loitering: bool,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, sets the 1Hz cycle flag and
    /// the simulation time.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.route_mgr_input = route_mgr::InputData::default();
        self.route_mgr_status_rpt = route_mgr::StatusReport::default();

        self.sim_time_s = (self.num_cycles as f64) / cycle_frequency_hz;
    }

    /// Record whether this cycle overran its period.
    ///
    /// Returns `true` once more than `MAX_CONSEC_CYCLE_OVERRUNS` cycles in a
    /// row have overrun.
    pub fn record_overrun(&mut self, overran: bool) -> bool {
        if overran {
            self.num_consec_cycle_overruns += 1;
        }
        else {
            self.num_consec_cycle_overruns = 0;
        }

        self.num_consec_cycle_overruns > MAX_CONSEC_CYCLE_OVERRUNS
    }

    /// Select the bank angle to fly from the route manager output.
    ///
    /// Circle and fallback requests are flown as a constant bank loiter.
    pub fn select_bank_dem(&mut self, loiter_bank_deg: f64) {
        let loiter = self.route_mgr_output.circle_request.is_some()
            || self.route_mgr_output.fallback_requested.is_some();

        if loiter && !self.loitering {
            match self.route_mgr_output.circle_request {
                Some(req) => info!(
                    "Circling last waypoint ({:.6}, {:.6})",
                    req.centre.lon_deg, req.centre.lat_deg
                ),
                None => warn!("No route to follow, loitering")
            }
        }
        else if !loiter && self.loitering {
            info!("Resuming route following");
        }
        self.loitering = loiter;

        self.bank_dem_deg = if loiter {
            loiter_bank_deg
        }
        else {
            self.route_mgr_output.target_bank_deg
        };
    }
}
