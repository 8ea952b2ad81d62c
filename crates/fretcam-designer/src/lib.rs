//! # FretCAM Designer
//!
//! Pocket toolpath generation for FretCAM. Turns 2D boundaries with islands
//! into machine toolpaths and renders them as dialect-specific G-code.
//!
//! ## Pipeline
//!
//! ```text
//! Loops (boundary + islands)
//!   └── OffsetEngine (nested inward rings, topology repair)
//!         └── PocketPlanner (Spiral | Lanes, corner engagement)
//!               └── Toolpath (typed moves + stats)
//!                     └── GcodeEmitter (post profile)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fretcam_core::{Loop, Tool};
//! use fretcam_designer::{EngagementSettings, OffsetEngine, PocketPlanner, PocketStrategy};
//!
//! let outer = Loop::from_xy(&[(0.0, 0.0), (100.0, 0.0), (100.0, 60.0), (0.0, 60.0)]);
//! let rings = OffsetEngine::default().compute(&outer, &[], 6.0, 0.45, 0.0)?;
//! let planner = PocketPlanner::new(Tool::new(6.0, 0.45), Default::default());
//! let toolpath = planner.plan(&rings.rings, PocketStrategy::Spiral, &EngagementSettings::default())?;
//! ```

pub mod engagement;
pub mod gcode_gen;
pub mod offset;
pub mod pocket_operations;
pub mod repair;
pub mod toolpath;

pub use engagement::{
    local_radius, relief_loop, ring_moves, tight_corners, CornerMode, EngagementReport,
    EngagementSettings,
};
pub use gcode_gen::{EmitterSettings, GcodeEmitter};
pub use offset::{
    classify_loops, OffsetEngine, OffsetResult, OffsetRing, OffsetSettings, PocketRegion,
    RegionRings, RingSource,
};
pub use pocket_operations::{
    EntryPolicy, MillingDirection, PlannerSettings, PocketPlanner, PocketStrategy,
};
pub use repair::{repair_loop, RepairNotice, RepairPolicy, Repaired};
pub use toolpath::{
    ArcDirection, FeedClass, MoveAnnotations, Toolpath, ToolpathMove, ToolpathStats,
};
