use fretcam_core::ConfigError;

use crate::model::PostProfile;

/// Read-only source of post profiles, injected into the emitter at call time.
pub trait PostProfileProvider {
    /// Looks up a profile by id.
    fn get_profile(&self, id: &str) -> Result<&PostProfile, ConfigError>;

    /// Ids of every available profile, sorted.
    fn profile_ids(&self) -> Vec<String>;
}
