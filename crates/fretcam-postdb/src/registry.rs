//! Immutable table of post profiles.
//!
//! The table is built once (built-ins plus an optional JSON or TOML file)
//! and handed to the emitter by reference. Nothing here is global.

use std::collections::BTreeMap;
use std::path::Path;

use fretcam_core::ConfigError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PostDbError, PostDbResult};
use crate::model::PostProfile;
use crate::traits::PostProfileProvider;

/// On-disk layout of a profile table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileTable {
    #[serde(default)]
    pub profiles: Vec<PostProfile>,
}

/// Profiles keyed by id
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, PostProfile>,
}

impl ProfileRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in profiles.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for profile in PostProfile::builtins() {
            registry.profiles.insert(profile.id.clone(), profile);
        }
        registry
    }

    /// Adds a profile; ids must be unique.
    pub fn insert(&mut self, profile: PostProfile) -> PostDbResult<()> {
        profile.validate()?;
        if self.profiles.contains_key(&profile.id) {
            return Err(PostDbError::ProfileAlreadyExists(profile.id));
        }
        self.profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    /// Adds a profile, replacing any profile with the same id.
    pub fn upsert(&mut self, profile: PostProfile) -> PostDbResult<()> {
        profile.validate()?;
        self.profiles.insert(profile.id.clone(), profile);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PostProfile> {
        self.profiles.values()
    }

    /// Parses a profile table from a `.json` or `.toml` file.
    pub fn read_table(path: &Path) -> PostDbResult<ProfileTable> {
        let content = std::fs::read_to_string(path)?;
        let table: ProfileTable = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)
                .map_err(|e| PostDbError::LoadError(format!("Invalid TOML: {}", e)))?
        } else {
            return Err(PostDbError::UnsupportedFormat(path.display().to_string()));
        };
        Ok(table)
    }

    /// Merges the profiles of a table file over the current ones.
    pub fn load_from_file(&mut self, path: &Path) -> PostDbResult<usize> {
        let table = Self::read_table(path)?;
        let count = table.profiles.len();
        for profile in table.profiles {
            debug!("Loaded post profile '{}' from {}", profile.id, path.display());
            self.upsert(profile)?;
        }
        info!("Loaded {} post profiles from {}", count, path.display());
        Ok(count)
    }

    /// Writes every profile to a `.json` or `.toml` table file.
    pub fn save_to_file(&self, path: &Path) -> PostDbResult<()> {
        let table = ProfileTable {
            profiles: self.profiles.values().cloned().collect(),
        };
        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(&table)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(&table)
                .map_err(|e| PostDbError::LoadError(format!("Failed to serialize: {}", e)))?
        } else {
            return Err(PostDbError::UnsupportedFormat(path.display().to_string()));
        };
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl PostProfileProvider for ProfileRegistry {
    fn get_profile(&self, id: &str) -> Result<&PostProfile, ConfigError> {
        self.profiles
            .get(id)
            .ok_or_else(|| ConfigError::UnknownProfile(id.to_string()))
    }

    fn profile_ids(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }
}
