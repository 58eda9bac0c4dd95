//! # Script interpreter module
//!
//! This module provides an interpreter for timestamped command scripts,
//! allowing commands to be replayed against the control loop at set times.
//!
//! A script is made up of lines of the form `<time_s>: <json>;`, where the
//! JSON payload deserialises into the command type of the interpreter.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
struct Command<T> {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The command to run
    cmd: T
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending`
/// to acquire a list of commands that need executing.
pub struct ScriptInterpreter<T> {
    script_path: Option<PathBuf>,
    cmds: VecDeque<Command<T>>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid command at {0} s: {1}")]
    InvalidCommand(f64, serde_json::Error)
}

/// The commands due for execution.
pub enum Pending<T> {
    None,
    Some(Vec<T>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T: DeserializeOwned> ScriptInterpreter<T> {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path)
            .map_err(ScriptError::ScriptLoadError)?;

        let mut si = Self::from_script(&script)?;
        si.script_path = Some(path);

        Ok(si)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {
        // Empty queue of commands
        let mut cmd_queue: VecDeque<Command<T>> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = match RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
        {
            Ok(r) => r,
            Err(_) => return Err(ScriptError::ScriptEmpty)
        };

        for cap in re.captures_iter(script) {
            let (time_str, payload) = match (cap.get(1), cap.get(3)) {
                (Some(t), Some(p)) => (t.as_str(), p.as_str()),
                _ => continue
            };

            // Parse the exec time
            let exec_time_s: f64 = time_str.parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            // Parse the command from the payload. The scripts contain JSON only.
            let cmd = serde_json::from_str(payload)
                .map_err(|e| ScriptError::InvalidCommand(exec_time_s, e))?;

            cmd_queue.push_back(Command {
                exec_time_s,
                cmd
            });
        }

        if cmd_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(ScriptInterpreter {
            script_path: None,
            cmds: cmd_queue
        })
    }
}

impl<T> ScriptInterpreter<T> {
    /// Return the commands which are due at `current_time_s`.
    ///
    /// Commands are returned in script order, each exactly once.
    pub fn get_pending(&mut self, current_time_s: f64) -> Pending<T> {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return Pending::EndOfScript
        }

        let mut cmd_vec: Vec<T> = vec![];

        // Pop items from the queue while the head's exec time has passed
        while let Some(head) = self.cmds.front() {
            if head.exec_time_s > current_time_s {
                break;
            }

            if let Some(c) = self.cmds.pop_front() {
                cmd_vec.push(c.cmd);
            }
        }

        if cmd_vec.is_empty() {
            Pending::None
        }
        else {
            Pending::Some(cmd_vec)
        }
    }

    /// Get the number of commands remaining in the script
    pub fn get_num_cmds(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }

    /// Path the script was loaded from, if it came from a file.
    pub fn script_path(&self) -> Option<&Path> {
        self.script_path.as_deref()
    }
}
