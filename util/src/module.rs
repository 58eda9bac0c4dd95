//! # Cyclic modules
//!
//! A module is initialised once against the session, then processed once per
//! control cycle. Commands which change the module's configuration are applied
//! between calls to `proc`, never during one, so a cycle always sees a single
//! consistent configuration.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// The internal state of a cyclic module.
pub trait State {
    type InitData;
    type InitError;

    /// Measurements the module consumes each cycle.
    type InputData;

    /// Demands the module produces each cycle.
    type OutputData;

    /// Diagnostics of a single cycle, archived alongside the output.
    type StatusReport;

    type ProcError;

    /// Load parameters and open the module's archives in `session`.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one control cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
