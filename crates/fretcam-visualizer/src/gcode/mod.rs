//! G-code tokenizer, block parser and arc geometry
//!
//! This module provides:
//! - Comment stripping and word tokenization
//! - Block assembly and modal state types
//! - Arc centre solving for I/J/K and R words

pub mod arc;
pub mod lexer;
pub mod parser;

pub use arc::{center_from_radius, sweep_angle, ArcGeometry, RadiusArcError};
pub use lexer::{tokenize_line, LexedLine, Word};
pub use parser::{
    build_block, parse_line, Block, Code, DistanceMode, ModalState, MotionMode, Plane,
    SpindleState,
};
