//! # Guidance library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the guidance crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data store - the per-cycle shared state of the executable
pub mod data_store;

/// Route manager - waypoint sequencing, navigation laws and bank command generation
pub mod route_mgr;

/// Simulated vehicle - flies the commanded bank angle so the executable can run without hardware
pub mod sim;
