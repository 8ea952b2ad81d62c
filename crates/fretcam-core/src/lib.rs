//! # FretCAM Core
//!
//! Core types shared by every FretCAM crate.
//! Provides planar geometry primitives, unit handling, the cutting tool
//! record and the fatal error taxonomy.

pub mod error;
pub mod geometry;
pub mod tool;
pub mod units;

pub use error::{ConfigError, Error, GeometryError, OffsetExhaustedError, Result};
pub use geometry::{
    arc_sweep, circumradius, point_segment_distance, segment_intersection, sweep_angle, Bounds,
    Loop, Orientation, Point,
};
pub use tool::Tool;
pub use units::{format_coord, Units, MM_PER_INCH};
