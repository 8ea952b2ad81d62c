//! Error handling for FretCAM
//!
//! Provides error types for the fatal failure classes of the toolpath core:
//! - Geometry errors (degenerate or unrepairable input)
//! - Offset exhaustion (tool and margin larger than the pocket)
//! - Configuration errors (unsupported post-profile combinations)
//!
//! Non-fatal G-code problems are not errors; the simulator reports them as
//! issues alongside its statistics.
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Geometry error type
///
/// Raised when input loops or computed rings cannot be machined safely.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Loop has fewer than three distinct points
    #[error("Degenerate loop {loop_index}: {reason}")]
    Degenerate {
        /// Index of the offending loop in the request.
        loop_index: usize,
        /// Why the loop was rejected.
        reason: String,
    },

    /// Loop encloses no area
    #[error("Loop {loop_index} has zero area")]
    ZeroArea {
        /// Index of the offending loop in the request.
        loop_index: usize,
    },

    /// Loop still crosses itself after the repair pass
    #[error("Ring {ring_index} is self-intersecting ({crossings} crossings)")]
    SelfIntersecting {
        /// Index of the offending ring.
        ring_index: usize,
        /// Number of segment crossings found.
        crossings: usize,
    },

    /// Island loop crosses its boundary loop
    #[error("Island {island_index} crosses the pocket boundary")]
    IslandCrossesBoundary {
        /// Index of the offending island.
        island_index: usize,
    },

    /// Topology repair changed the enclosed area more than the caller allows
    #[error("Repair of ring level {level} changed area by {delta_percent:.2}% (limit {limit_percent:.2}%)")]
    RepairRejected {
        /// Offset level at which the repair happened.
        level: usize,
        /// Area change in percent.
        delta_percent: f64,
        /// Configured limit in percent.
        limit_percent: f64,
    },

    /// A numeric parameter is outside its valid range
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Why the value is invalid.
        reason: String,
    },
}

/// Offset exhaustion error
///
/// The tool diameter plus margin leaves no usable offset ring inside the
/// input geometry.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("No usable offset rings: tool diameter {tool_diameter:.3}mm plus margin {margin:.3}mm exceeds the smallest pocket feature")]
pub struct OffsetExhaustedError {
    /// Tool diameter in mm.
    pub tool_diameter: f64,
    /// Margin left on the walls in mm.
    pub margin: f64,
}

/// Configuration error type
///
/// Raised when a requested emission setup is not supported by the selected
/// post profile, or when a string selector does not name a known variant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// No post profile is registered under this id
    #[error("Unknown post profile: {0}")]
    UnknownProfile(String),

    /// Feed override mode not supported by the profile
    #[error("Post profile '{profile}' does not support feed override mode '{mode}'")]
    UnsupportedFeedOverride {
        /// Profile id.
        profile: String,
        /// Requested mode.
        mode: String,
    },

    /// Arc mode not supported by the profile
    #[error("Post profile '{profile}' does not support arc mode '{mode}'")]
    UnsupportedArcMode {
        /// Profile id.
        profile: String,
        /// Requested mode.
        mode: String,
    },

    /// `mcode` feed override requested but the profile defines no M-code pair
    #[error("Post profile '{profile}' has no custom M-code pair for mcode feed override")]
    MissingMcodePair {
        /// Profile id.
        profile: String,
    },

    /// String selector does not name a known variant
    #[error("Unknown {kind} '{value}'")]
    UnknownVariant {
        /// Selector kind (strategy, feed override, ...).
        kind: String,
        /// Rejected value.
        value: String,
    },

    /// A configuration value is out of range
    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Why the value is invalid.
        reason: String,
    },
}

/// Main error type for FretCAM
///
/// A unified error type for every fatal failure of planning and emission.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Offset exhaustion
    #[error(transparent)]
    OffsetExhausted(#[from] OffsetExhaustedError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }

    /// Check if this is an offset exhaustion error
    pub fn is_offset_exhausted(&self) -> bool {
        matches!(self, Error::OffsetExhausted(_))
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
