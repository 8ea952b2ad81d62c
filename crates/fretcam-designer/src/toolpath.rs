//! Typed toolpath moves.

use fretcam_core::{arc_sweep, Point};
use serde::{Deserialize, Serialize};

/// Rapid traverse or cutting feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedClass {
    Rapid,
    Cut,
}

/// Arc rotation seen from +Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArcDirection {
    #[serde(rename = "CW")]
    Cw,
    #[serde(rename = "CCW")]
    Ccw,
}

impl ArcDirection {
    pub fn is_clockwise(&self) -> bool {
        matches!(self, ArcDirection::Cw)
    }
}

/// Advisory flags used for reporting and feed-override emission only
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveAnnotations {
    pub tight_corner: bool,
    pub trochoid_relief: bool,
    /// Suggested feed multiplier for this move
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_scale: Option<f64>,
}

impl MoveAnnotations {
    /// Returns true if any flag is set.
    pub fn is_annotated(&self) -> bool {
        self.tight_corner || self.trochoid_relief || self.feed_scale.is_some()
    }
}

/// A single move of a toolpath
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolpathMove {
    Rapid {
        start: Point,
        end: Point,
    },
    Linear {
        start: Point,
        end: Point,
        #[serde(default)]
        annotations: MoveAnnotations,
    },
    Arc {
        start: Point,
        end: Point,
        center: Point,
        radius: f64,
        direction: ArcDirection,
        #[serde(default)]
        annotations: MoveAnnotations,
    },
}

impl ToolpathMove {
    pub fn rapid(start: Point, end: Point) -> Self {
        ToolpathMove::Rapid { start, end }
    }

    pub fn linear(start: Point, end: Point) -> Self {
        ToolpathMove::Linear {
            start,
            end,
            annotations: MoveAnnotations::default(),
        }
    }

    /// Arc from `start` to `end` around `center`; the radius is taken from `start`.
    pub fn arc(start: Point, end: Point, center: Point, direction: ArcDirection) -> Self {
        ToolpathMove::Arc {
            start,
            end,
            center,
            radius: start.distance_to(&center),
            direction,
            annotations: MoveAnnotations::default(),
        }
    }

    pub fn start(&self) -> Point {
        match self {
            ToolpathMove::Rapid { start, .. }
            | ToolpathMove::Linear { start, .. }
            | ToolpathMove::Arc { start, .. } => *start,
        }
    }

    pub fn end(&self) -> Point {
        match self {
            ToolpathMove::Rapid { end, .. }
            | ToolpathMove::Linear { end, .. }
            | ToolpathMove::Arc { end, .. } => *end,
        }
    }

    pub fn feed_class(&self) -> FeedClass {
        match self {
            ToolpathMove::Rapid { .. } => FeedClass::Rapid,
            _ => FeedClass::Cut,
        }
    }

    pub fn is_rapid(&self) -> bool {
        self.feed_class() == FeedClass::Rapid
    }

    pub fn annotations(&self) -> MoveAnnotations {
        match self {
            ToolpathMove::Rapid { .. } => MoveAnnotations::default(),
            ToolpathMove::Linear { annotations, .. } | ToolpathMove::Arc { annotations, .. } => {
                *annotations
            }
        }
    }

    /// Mutable annotations; rapids carry none.
    pub fn annotations_mut(&mut self) -> Option<&mut MoveAnnotations> {
        match self {
            ToolpathMove::Rapid { .. } => None,
            ToolpathMove::Linear { annotations, .. } | ToolpathMove::Arc { annotations, .. } => {
                Some(annotations)
            }
        }
    }

    pub fn with_annotations(mut self, value: MoveAnnotations) -> Self {
        if let Some(annotations) = self.annotations_mut() {
            *annotations = value;
        }
        self
    }

    /// Signed sweep in radians for arcs, zero otherwise.
    pub fn sweep(&self) -> f64 {
        match self {
            ToolpathMove::Arc {
                start,
                end,
                center,
                direction,
                ..
            } => arc_sweep(start, end, center, direction.is_clockwise()),
            _ => 0.0,
        }
    }

    /// Path length in mm.
    pub fn length(&self) -> f64 {
        match self {
            ToolpathMove::Arc { radius, .. } => radius * self.sweep().abs(),
            _ => self.start().distance_to(&self.end()),
        }
    }
}

/// Summary of a planned toolpath
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolpathStats {
    pub cut_length: f64,
    pub rapid_length: f64,
    pub move_count: usize,
    pub cut_moves: usize,
    pub rapid_moves: usize,
    pub arc_moves: usize,
    pub ring_count: usize,
    pub region_count: usize,
    pub tight_corners: usize,
    pub relief_loops: usize,
    pub repair_notices: usize,
}

/// An ordered move list with its statistics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Toolpath {
    pub moves: Vec<ToolpathMove>,
    pub stats: ToolpathStats,
}

impl Toolpath {
    /// Creates a new empty toolpath.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mv: ToolpathMove) {
        self.moves.push(mv);
    }

    /// Position after the last move.
    pub fn current_position(&self) -> Option<Point> {
        self.moves.last().map(|m| m.end())
    }

    /// Gets the total length of the toolpath.
    pub fn total_length(&self) -> f64 {
        self.moves.iter().map(|m| m.length()).sum()
    }

    /// Recomputes the move-derived statistics, keeping planner counts.
    pub fn refresh_stats(&mut self) {
        let mut stats = ToolpathStats {
            ring_count: self.stats.ring_count,
            region_count: self.stats.region_count,
            tight_corners: self.stats.tight_corners,
            relief_loops: self.stats.relief_loops,
            repair_notices: self.stats.repair_notices,
            ..Default::default()
        };
        for mv in &self.moves {
            let length = mv.length();
            match mv {
                ToolpathMove::Rapid { .. } => {
                    stats.rapid_moves += 1;
                    stats.rapid_length += length;
                }
                ToolpathMove::Arc { .. } => {
                    stats.arc_moves += 1;
                    stats.cut_moves += 1;
                    stats.cut_length += length;
                }
                ToolpathMove::Linear { .. } => {
                    stats.cut_moves += 1;
                    stats.cut_length += length;
                }
            }
        }
        stats.move_count = self.moves.len();
        self.stats = stats;
    }

    /// Appends another toolpath, summing planner counts.
    pub fn extend(&mut self, other: Toolpath) {
        self.moves.extend(other.moves);
        self.stats.ring_count += other.stats.ring_count;
        self.stats.region_count += other.stats.region_count;
        self.stats.tight_corners += other.stats.tight_corners;
        self.stats.relief_loops += other.stats.relief_loops;
        self.stats.repair_notices += other.stats.repair_notices;
        self.refresh_stats();
    }
}
