//! # FretCAM Visualizer
//!
//! G-code parsing and machining simulation for FretCAM.
//! Turns arbitrary G-code text back into tool positions, modal state,
//! distances and machining time, reporting problems as non-fatal issues.

pub mod gcode;
pub mod issue;
pub mod simulator;

pub use gcode::{
    parse_line, tokenize_line, ArcGeometry, Block, DistanceMode, ModalState, MotionMode, Plane,
    SpindleState,
};
pub use issue::{IssueCode, Severity, SimulationIssue};
pub use simulator::{Point3, SimulationResult, SimulationSettings, Simulator, TrajectoryEntry};
