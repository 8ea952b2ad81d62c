//! Configuration and settings management for FretCAM
//!
//! Collects the tunables of every pipeline stage in one record that can be
//! stored as JSON or TOML. Sections:
//! - Tool (diameter, stepover, feeds)
//! - Offsetting (ring cap, repair policy, chord tolerance)
//! - Planning (entry policy, milling direction)
//! - Corner engagement thresholds
//! - Emission (safe Z, cut depth, feeds, units)
//! - Simulation (rapid rate, default feed, arc interpolation)

use std::path::{Path, PathBuf};

use fretcam_core::Tool;
use fretcam_designer::{EmitterSettings, EngagementSettings, OffsetSettings, PlannerSettings};
use fretcam_postdb::ProfileRegistry;
use fretcam_visualizer::SimulationSettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SettingsError, SettingsResult};

/// File name used inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extra post profiles loaded on top of the built-ins (.json or .toml)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_profiles_path: Option<PathBuf>,
    pub tool: Tool,
    pub offset: OffsetSettings,
    pub planner: PlannerSettings,
    pub engagement: EngagementSettings,
    pub emitter: EmitterSettings,
    pub simulation: SimulationSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        _ => Err(SettingsError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Default location of the user config file.
pub fn default_config_path() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("fretcam").join(CONFIG_FILE_NAME))
        .ok_or_else(|| {
            SettingsError::ConfigDirectory("no platform config directory".to_string())
        })
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads `path` if given, otherwise the default file if it exists,
    /// otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match default_config_path() {
            Ok(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if let Err(e) = self.tool.validate() {
            return Err(fretcam_core::ConfigError::InvalidValue {
                key: "tool".to_string(),
                reason: e.to_string(),
            }
            .into());
        }
        self.offset.validate()?;
        self.engagement.validate()?;
        self.emitter_settings().validate()?;
        self.simulation.validate()?;
        Ok(())
    }

    /// Emitter settings with feeds and spindle speed taken from the tool.
    pub fn emitter_settings(&self) -> EmitterSettings {
        self.emitter.clone().with_tool(&self.tool)
    }

    /// Built-in post profiles plus the configured profile file, if any.
    pub fn profile_registry(&self) -> SettingsResult<ProfileRegistry> {
        let mut registry = ProfileRegistry::with_builtins();
        if let Some(path) = &self.post_profiles_path {
            let count = registry.load_from_file(path)?;
            debug!("Loaded {} post profiles from {}", count, path.display());
        }
        Ok(registry)
    }
}
