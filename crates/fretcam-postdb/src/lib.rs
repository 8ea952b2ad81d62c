//! # FretCAM Post Profiles
//!
//! Post-processor dialect records, the built-in profile set and an
//! immutable registry that the G-code emitter reads through the
//! [`PostProfileProvider`] trait.

pub mod error;
pub mod model;
pub mod registry;
pub mod traits;

pub use error::{PostDbError, PostDbResult};
pub use model::{ArcMode, FeedOverrideMode, McodePair, PostProfile};
pub use registry::{ProfileRegistry, ProfileTable};
pub use traits::PostProfileProvider;
