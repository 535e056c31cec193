//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;

use std::path::Path;

use invren_core::models::ConfigStore;

/// Load the configuration named on the command line, or the built-in default.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ConfigStore> {
    match config_path {
        Some(path) => Ok(ConfigStore::from_file(Path::new(path))?),
        None => Ok(ConfigStore::builtin()),
    }
}
