//! Configuration file handling.

use std::path::Path;

use dbhub::HubConfig;

use crate::error::{CliError, CliResult};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "dbhub.toml";

/// Load a configuration file, failing with a readable message when it is missing.
pub fn load(path: &Path) -> CliResult<HubConfig> {
    if !path.exists() {
        return Err(CliError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }
    Ok(HubConfig::from_file(path)?)
}
