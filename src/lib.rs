//! # FretCAM
//!
//! CAM toolpath core for a lutherie design studio:
//! - Inward polygon offsetting with islands and topology repair
//! - Adaptive pocketing (Spiral and Lanes) with corner engagement control
//! - Dialect-specific G-code emission driven by post profiles
//! - G-code parsing and machining simulation
//!
//! ## Architecture
//!
//! FretCAM is organized as a workspace with multiple crates:
//!
//! 1. **fretcam-core** - Geometry primitives, tool, units, error types
//! 2. **fretcam-postdb** - Post profiles and the profile registry
//! 3. **fretcam-designer** - Offsetting, pocket planning, G-code emission
//! 4. **fretcam-visualizer** - G-code tokenizer, modal state, simulator
//! 5. **fretcam-settings** - Pipeline configuration (JSON/TOML)
//! 6. **fretcam** - Request/response API and the command-line driver

pub mod api;

pub use fretcam_core::{
    ConfigError, Error, GeometryError, Loop, OffsetExhaustedError, Point, Result, Tool, Units,
};
pub use fretcam_designer as designer;
pub use fretcam_postdb as postdb;
pub use fretcam_settings::Config;
pub use fretcam_visualizer as visualizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Pretty formatted output on stderr, so JSON on stdout stays parseable
/// - RUST_LOG environment variable support
/// - `json` switches to one JSON object per event
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .json();
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_line_number(true)
            .pretty();
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
