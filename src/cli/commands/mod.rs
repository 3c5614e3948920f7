pub mod config;
pub mod generate;
pub mod scan;

use std::path::Path;

use crate::config::{Config, ConfigLoader};
use crate::types::Result;

/// Explicit config file, or the layered global/project/env resolution
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
