//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (platform config dir, e.g. ~/.config/repowiki/config.toml)
//! 3. Project config (.repowiki/config.toml)
//! 4. Environment variables (REPOWIKI_ prefix, `__` separates sections)

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{Result, WikiError};

const ENV_PREFIX: &str = "REPOWIKI_";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with the full resolution chain:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment()
            .extract()
            .map_err(|e| WikiError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file only (defaults + file)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| WikiError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// The merged provider chain, before extraction
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // REPOWIKI_LLM__MODEL -> llm.model, REPOWIKI_BATCHING__BATCH_SIZE -> batching.batch_size
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Global config directory
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "repowiki").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn project_dir() -> PathBuf {
        PathBuf::from(".repowiki")
    }

    pub fn project_config_path() -> PathBuf {
        Self::project_dir().join("config.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Print configuration file locations
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Render the effective configuration as TOML or JSON
    pub fn render_config(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| WikiError::Config(e.to_string()))
        }
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write a commented default config file; returns its path
    pub fn init(global: bool, force: bool) -> Result<PathBuf> {
        let config_path = if global {
            Self::global_config_path().ok_or_else(|| {
                WikiError::Config("Cannot determine global config directory".to_string())
            })?
        } else {
            Self::project_config_path()
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if !config_path.exists() || force {
            fs::write(&config_path, Self::default_config_template())?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }

        Ok(config_path)
    }

    fn default_config_template() -> String {
        let defaults = Config::default();
        format!(
            r#"# repowiki configuration
# Environment variables override this file, e.g. REPOWIKI_LLM__MODEL=gpt-4o

version = "1.0"

[llm]
provider = "{provider}"
model = "{model}"
timeout_secs = {timeout}
max_retries = {retries}

[scan]
max_files = {max_files}
# Extra directory names to skip, in addition to the built-in ignore set
extra_ignore_dirs = []
# Glob patterns matched against repository-relative paths
exclude = []

[batching]
batch_size = {batch_size}
topic_char_budget = {budget}

[generation]
concurrency = {concurrency}
refine_plan = true
overview = true

[output]
dir = "{output}"
"#,
            provider = defaults.llm.provider,
            model = defaults.llm.model,
            timeout = defaults.llm.timeout_secs,
            retries = defaults.llm.max_retries,
            max_files = defaults.scan.max_files,
            batch_size = defaults.batching.batch_size,
            budget = defaults.batching.topic_char_budget,
            concurrency = defaults.generation.concurrency,
            output = defaults.output.dir.display(),
        )
    }
}
