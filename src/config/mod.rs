//! Configuration Management
//!
//! Hierarchical resolution, later layers win:
//! 1. Built-in defaults
//! 2. Global config (~/.config/repowiki/config.toml)
//! 3. Project config (.repowiki/config.toml)
//! 4. Environment variables (REPOWIKI_<SECTION>__<KEY>)
//! 5. CLI arguments

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
