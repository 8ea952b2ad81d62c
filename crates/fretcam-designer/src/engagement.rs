//! Corner engagement control.
//!
//! At a tight corner the cutter wraps around more material than on a
//! straight pass. The local path radius at a vertex is the circumradius of
//! the points one tool radius before and after it along the ring; below
//! `corner_radius_min` the corner is tight and is either annotated with a
//! reduced feed or relieved with a small circular detour.

use std::fmt;
use std::str::FromStr;

use fretcam_core::{circumradius, ConfigError, Loop, Point};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::toolpath::{ArcDirection, MoveAnnotations, ToolpathMove};

/// What to do at a tight corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerMode {
    Off,
    #[default]
    Annotate,
    Trochoidal,
}

impl fmt::Display for CornerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CornerMode::Off => "off",
            CornerMode::Annotate => "annotate",
            CornerMode::Trochoidal => "trochoidal",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for CornerMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" => Ok(CornerMode::Off),
            "annotate" => Ok(CornerMode::Annotate),
            "trochoidal" => Ok(CornerMode::Trochoidal),
            _ => Err(ConfigError::UnknownVariant {
                kind: "corner_mode".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Corner engagement thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementSettings {
    /// Local path radius below which a corner is tight (mm)
    pub corner_radius_min: f64,
    pub mode: CornerMode,
    /// Feed multiplier suggested on tight corners and relief loops
    pub feed_scale: f64,
    /// Relief loop radius as a fraction of the tool radius
    pub relief_radius_fraction: f64,
    /// Minimum path distance between two relief loops on one ring (mm)
    pub relief_min_spacing: f64,
}

impl Default for EngagementSettings {
    fn default() -> Self {
        Self {
            corner_radius_min: 2.5,
            mode: CornerMode::Annotate,
            feed_scale: 0.6,
            relief_radius_fraction: 0.5,
            relief_min_spacing: 10.0,
        }
    }
}

impl EngagementSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.corner_radius_min >= 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "engagement.corner_radius_min".to_string(),
                reason: "must be >= 0".to_string(),
            });
        }
        if !(self.feed_scale > 0.0 && self.feed_scale <= 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "engagement.feed_scale".to_string(),
                reason: format!("must be in (0, 1], got {}", self.feed_scale),
            });
        }
        if !(self.relief_radius_fraction > 0.0 && self.relief_radius_fraction <= 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "engagement.relief_radius_fraction".to_string(),
                reason: format!("must be in (0, 1], got {}", self.relief_radius_fraction),
            });
        }
        if !(self.relief_min_spacing >= 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "engagement.relief_min_spacing".to_string(),
                reason: "must be >= 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Corner counts for one ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngagementReport {
    pub tight_corners: usize,
    pub relief_loops: usize,
}

/// Point `distance` along a closed loop from vertex `index`.
fn walk(path: &Loop, index: usize, distance: f64, forward: bool) -> Point {
    let n = path.len();
    let mut remaining = distance;
    let mut current = index;
    for _ in 0..n {
        let next = if forward {
            (current + 1) % n
        } else {
            (current + n - 1) % n
        };
        let a = path.points[current];
        let b = path.points[next];
        let len = a.distance_to(&b);
        if len >= remaining {
            let t = if len > 0.0 { remaining / len } else { 0.0 };
            return a.lerp(&b, t);
        }
        remaining -= len;
        current = next;
    }
    path.points[current]
}

/// Local radius of the path at vertex `index`; infinite on straight runs.
pub fn local_radius(path: &Loop, index: usize, reach: f64) -> f64 {
    if path.len() < 3 {
        return f64::INFINITY;
    }
    let reach = reach.min(path.perimeter() / 3.0);
    let before = walk(path, index, reach, false);
    let after = walk(path, index, reach, true);
    circumradius(&before, &path.points[index], &after)
}

/// Indices of vertices whose local radius is below the threshold.
pub fn tight_corners(path: &Loop, tool_radius: f64, settings: &EngagementSettings) -> Vec<usize> {
    (0..path.len())
        .filter(|&i| local_radius(path, i, tool_radius) < settings.corner_radius_min)
        .collect()
}

fn normalized(x: f64, y: f64) -> Option<(f64, f64)> {
    let len = (x * x + y * y).sqrt();
    (len > 1e-12).then(|| (x / len, y / len))
}

/// A closed circular detour through `vertex`, as two half-circle arcs.
///
/// The circle lies on the pocket side of the path: left of travel when
/// `pocket_left`, right otherwise, bisecting the corner.
pub fn relief_loop(
    prev: Point,
    vertex: Point,
    next: Point,
    radius: f64,
    pocket_left: bool,
) -> [ToolpathMove; 2] {
    let left_normal = |a: Point, b: Point| normalized(-(b.y - a.y), b.x - a.x);
    let n_in = left_normal(prev, vertex);
    let n_out = left_normal(vertex, next);
    let (nx, ny) = match (n_in, n_out) {
        (Some(a), Some(b)) => normalized(a.0 + b.0, a.1 + b.1).unwrap_or(a),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => (0.0, 1.0),
    };
    let side = if pocket_left { 1.0 } else { -1.0 };
    let center = Point::new(
        vertex.x + side * radius * nx,
        vertex.y + side * radius * ny,
    );
    let far = Point::new(
        vertex.x + 2.0 * side * radius * nx,
        vertex.y + 2.0 * side * radius * ny,
    );
    let direction = if pocket_left {
        ArcDirection::Ccw
    } else {
        ArcDirection::Cw
    };
    [
        ToolpathMove::arc(vertex, far, center, direction),
        ToolpathMove::arc(far, vertex, center, direction),
    ]
}

/// Cuts one closed ring starting at its first vertex, applying corner control.
///
/// The returned moves end back at `path.points[0]`.
pub fn ring_moves(
    path: &Loop,
    tool_radius: f64,
    pocket_left: bool,
    settings: &EngagementSettings,
) -> (Vec<ToolpathMove>, EngagementReport) {
    let n = path.len();
    let mut report = EngagementReport::default();
    let mut moves = Vec::with_capacity(n + 2);
    if n < 2 {
        return (moves, report);
    }

    let tight: Vec<bool> = if settings.mode == CornerMode::Off {
        vec![false; n]
    } else {
        (0..n)
            .map(|i| local_radius(path, i, tool_radius) < settings.corner_radius_min)
            .collect()
    };

    let mut relief_at = vec![false; n];
    let mut annotate_at = vec![false; n];
    let mut since_relief = f64::INFINITY;
    for i in 0..n {
        if tight[i] {
            report.tight_corners += 1;
            if settings.mode == CornerMode::Trochoidal && since_relief >= settings.relief_min_spacing
            {
                relief_at[i] = true;
                report.relief_loops += 1;
                since_relief = 0.0;
            } else {
                annotate_at[i] = true;
            }
        }
        since_relief += path.points[i].distance_to(&path.points[(i + 1) % n]);
    }

    let feed_scale = Some(settings.feed_scale);
    for i in 0..n {
        let j = (i + 1) % n;
        if relief_at[i] {
            let prev = path.points[(i + n - 1) % n];
            let radius = settings.relief_radius_fraction * tool_radius;
            for arc in relief_loop(prev, path.points[i], path.points[j], radius, pocket_left) {
                moves.push(arc.with_annotations(MoveAnnotations {
                    trochoid_relief: true,
                    feed_scale,
                    ..Default::default()
                }));
            }
        }
        let mut edge = ToolpathMove::linear(path.points[i], path.points[j]);
        if annotate_at[i] || annotate_at[j] {
            edge = edge.with_annotations(MoveAnnotations {
                tight_corner: true,
                feed_scale,
                ..Default::default()
            });
        }
        moves.push(edge);
    }

    trace!(
        "Ring of {} vertices: {} tight corners, {} relief loops",
        n,
        report.tight_corners,
        report.relief_loops
    );
    (moves, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn square(size: f64) -> Loop {
        Loop::from_xy(&[(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)])
    }

    #[test]
    fn test_local_radius_of_square_corner() {
        // Points 3 before and after a right angle: circumradius is 3 / sqrt(2).
        let r = local_radius(&square(20.0), 1, 3.0);
        assert!((r - 3.0 / 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_local_radius_of_circle() {
        let points: Vec<(f64, f64)> = (0..360)
            .map(|i| {
                let a = i as f64 * PI / 180.0;
                (10.0 * a.cos(), 10.0 * a.sin())
            })
            .collect();
        let circle = Loop::from_xy(&points);
        let r = local_radius(&circle, 0, 1.0);
        assert!((r - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_straight_run_is_not_tight() {
        let path = Loop::from_xy(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)]);
        assert!(local_radius(&path, 1, 3.0).is_infinite());
    }

    #[test]
    fn test_annotate_flags_corner_edges() {
        let settings = EngagementSettings::default();
        let (moves, report) = ring_moves(&square(20.0), 3.0, true, &settings);
        assert_eq!(moves.len(), 4);
        assert_eq!(report.tight_corners, 4);
        assert_eq!(report.relief_loops, 0);
        assert!(moves.iter().all(|m| m.annotations().tight_corner));
        assert_eq!(moves[0].annotations().feed_scale, Some(0.6));
        assert_eq!(moves.last().unwrap().end(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_off_mode_leaves_moves_plain() {
        let settings = EngagementSettings {
            mode: CornerMode::Off,
            ..Default::default()
        };
        let (moves, report) = ring_moves(&square(20.0), 3.0, true, &settings);
        assert_eq!(report, EngagementReport::default());
        assert!(moves.iter().all(|m| !m.annotations().is_annotated()));
    }

    #[test]
    fn test_trochoidal_inserts_relief_with_spacing() {
        let settings = EngagementSettings {
            mode: CornerMode::Trochoidal,
            relief_min_spacing: 30.0,
            ..Default::default()
        };
        let (moves, report) = ring_moves(&square(20.0), 3.0, true, &settings);
        // Corners at 0 and 2 are 40mm apart; 1 and 3 fall inside the spacing.
        assert_eq!(report.tight_corners, 4);
        assert_eq!(report.relief_loops, 2);
        assert_eq!(moves.len(), 8);
        let reliefs: Vec<_> = moves
            .iter()
            .filter(|m| m.annotations().trochoid_relief)
            .collect();
        assert_eq!(reliefs.len(), 4);
    }

    #[test]
    fn test_relief_loop_geometry() {
        let [a, b] = relief_loop(
            Point::new(0.0, -10.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            1.0,
            false,
        );
        // Travelling up then right, the right-hand side points into the lower right.
        assert_eq!(a.start(), Point::new(0.0, 0.0));
        assert_eq!(b.end(), Point::new(0.0, 0.0));
        let far = a.end();
        assert!(far.x > 0.0 && far.y < 0.0);
        assert!((far.distance_to(&Point::new(0.0, 0.0)) - 2.0).abs() < 1e-9);
        assert!((a.length() + b.length() - 2.0 * PI).abs() < 1e-9);
        assert!(matches!(
            a,
            ToolpathMove::Arc {
                direction: ArcDirection::Cw,
                ..
            }
        ));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("Trochoidal".parse::<CornerMode>().unwrap(), CornerMode::Trochoidal);
        assert!("zigzag".parse::<CornerMode>().is_err());
    }
}
