//! # Logger
//!
//! Log records go to both stdout and the session's log file, stamped with the
//! time elapsed since the session epoch. Individual modules can be given a
//! more verbose level than the rest of the executable, which is how the per
//! cycle traces of the route manager are turned on without flooding the log
//! with everything else.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info, Level};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `WARN`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Module {0} was given a log level of `{1}`, which would hide its warnings")]
    InvalidModuleLogLevel(String, LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `module_levels` overrides `min_level` for the given module paths, for
/// example `("guide_lib::route_mgr", LevelFilter::Trace)`.
///
/// Neither the global level nor any override may hide warnings.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: LevelFilter,
    module_levels: &[(&'static str, LevelFilter)],
    session: &Session
) -> Result<(), LoggerInitError> {

    if min_level < Level::Warn {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            // Targets are only useful when debugging
            if record.level() > Level::Info {
                out.finish(format_args!(
                    "[{:10.6} {}] {}: {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    record.target(),
                    message
                ))
            }
            else {
                out.finish(format_args!(
                    "[{:10.6} {}] {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    message
                ))
            }
        })
        .level(min_level);

    for &(module, level) in module_levels {
        if level < Level::Warn {
            return Err(LoggerInitError::InvalidModuleLogLevel(module.into(), level))
        }
        dispatch = dispatch.level_for(module, level);
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    for (module, level) in module_levels {
        info!("    Log level of {}: {:?}", module, level);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the string representation of a log level
fn level_to_str(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info  => "INF".normal(),
        Level::Warn  => "WRN".yellow(),
        Level::Error => "ERR".red().bold()
    }
}
