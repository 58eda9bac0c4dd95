//! Host platform utility functions

use std::path::PathBuf;

/// Name of the environment variable pointing at the root of the software tree.
pub const SW_ROOT_ENV_VAR: &str = "GUIDANCE_SW_ROOT";

/// Get the root directory of the software tree.
///
/// The root is read from the `GUIDANCE_SW_ROOT` environment variable and holds the `params` and
/// `sessions` directories.
pub fn get_guidance_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
