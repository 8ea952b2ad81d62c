//! FretCAM Settings Crate
//!
//! Handles pipeline configuration and its persistence as JSON or TOML.

pub mod config;
pub mod error;

pub use config::{default_config_path, Config, CONFIG_FILE_NAME};
pub use error::{SettingsError, SettingsResult};
