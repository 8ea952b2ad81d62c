//! Error types for the post-profile database crate.

use std::io;

use fretcam_core::ConfigError;
use thiserror::Error;

/// Errors that can occur while loading or querying post profiles.
#[derive(Error, Debug)]
pub enum PostDbError {
    /// A profile with this ID already exists.
    #[error("Profile already exists: {0}")]
    ProfileAlreadyExists(String),

    /// Failed to parse a profile table.
    #[error("Failed to load profiles: {0}")]
    LoadError(String),

    /// The profile table file has an unsupported extension.
    #[error("Profile table must be .json or .toml: {0}")]
    UnsupportedFormat(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A profile failed validation or lookup.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<PostDbError> for fretcam_core::Error {
    fn from(err: PostDbError) -> Self {
        match err {
            PostDbError::Config(e) => fretcam_core::Error::Config(e),
            PostDbError::IoError(e) => fretcam_core::Error::Io(e),
            PostDbError::SerializationError(e) => fretcam_core::Error::Json(e),
            other => fretcam_core::Error::other(other.to_string()),
        }
    }
}

/// Result type alias for post-profile operations.
pub type PostDbResult<T> = Result<T, PostDbError>;
