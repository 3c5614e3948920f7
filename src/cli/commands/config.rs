//! Config Command
//!
//! Usage:
//!   repowiki config show [--json]
//!   repowiki config path
//!   repowiki config init [-g] [--force]

use std::path::Path;

use super::load_config;
use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Print the effective configuration (all layers merged)
pub fn show(json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    println!("{}", ConfigLoader::render_config(&config, json)?);
    Ok(())
}

pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

pub fn init(global: bool, force: bool) -> Result<()> {
    let out = Output::new();
    let existed = if global {
        ConfigLoader::global_config_path().is_some_and(|p| p.exists())
    } else {
        ConfigLoader::project_config_path().exists()
    };

    let config_path = ConfigLoader::init(global, force)?;
    if existed && !force {
        out.info(&format!(
            "Config already exists: {} (use --force to overwrite)",
            config_path.display()
        ));
    } else {
        let scope = if global { "global" } else { "project" };
        out.success(&format!("Initialized {} configuration", scope));
        out.field("Config", config_path.display());
    }
    Ok(())
}
