//! Pocket operations for CAM toolpath generation.
//!
//! Turns offset rings into an ordered move list. Two strategies are
//! supported: a contour-parallel spiral over the rings and a back-and-forth
//! lane pattern clipped to the outermost rings.

use std::fmt;
use std::str::FromStr;

use fretcam_core::{
    segment_intersection, Bounds, ConfigError, GeometryError, Loop, Orientation, Point, Result,
    Tool,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engagement::{ring_moves, EngagementReport, EngagementSettings};
use crate::offset::{OffsetRing, RegionRings, RingSource};
use crate::toolpath::{Toolpath, ToolpathMove};

/// Strategy for pocket milling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PocketStrategy {
    /// Contour-parallel rings joined by short transitions
    #[default]
    #[serde(alias = "spiral")]
    Spiral,
    /// Zig-zag lanes followed by a wall contour
    #[serde(alias = "lanes")]
    Lanes,
}

impl fmt::Display for PocketStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PocketStrategy::Spiral => write!(f, "Spiral"),
            PocketStrategy::Lanes => write!(f, "Lanes"),
        }
    }
}

impl FromStr for PocketStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Spiral" | "spiral" => Ok(PocketStrategy::Spiral),
            "Lanes" | "lanes" => Ok(PocketStrategy::Lanes),
            _ => Err(ConfigError::UnknownVariant {
                kind: "strategy".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Order in which spiral levels are cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPolicy {
    /// Plunge at the centre and work out to the walls
    #[default]
    InsideOut,
    /// Start at the walls and work in
    OutsideIn,
}

/// Cutting direction relative to spindle rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MillingDirection {
    #[default]
    Climb,
    Conventional,
}

impl MillingDirection {
    /// Winding a ring is cut in.
    pub fn ring_orientation(&self, source: RingSource) -> Orientation {
        let climb = match source {
            RingSource::Boundary => Orientation::CounterClockwise,
            RingSource::Island => Orientation::Clockwise,
        };
        match self {
            MillingDirection::Climb => climb,
            MillingDirection::Conventional => climb.reversed(),
        }
    }

    /// Whether the pocket lies left of travel.
    pub fn pocket_left(&self) -> bool {
        matches!(self, MillingDirection::Climb)
    }
}

/// Planner options that are not part of the engagement heuristics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    pub entry: EntryPolicy,
    pub direction: MillingDirection,
    /// Tool position before the first move
    pub home: Point,
}

/// Generates pocket toolpaths from offset rings.
#[derive(Debug, Clone)]
pub struct PocketPlanner {
    pub tool: Tool,
    pub settings: PlannerSettings,
}

/// End points of lane segments sit this far inside the scan range.
const LANE_NUDGE: f64 = 1e-6;

impl PocketPlanner {
    pub fn new(tool: Tool, settings: PlannerSettings) -> Self {
        Self { tool, settings }
    }

    /// Plans one pocket's rings.
    pub fn plan(
        &self,
        rings: &[OffsetRing],
        strategy: PocketStrategy,
        engagement: &EngagementSettings,
    ) -> Result<Toolpath> {
        self.plan_from(rings, strategy, engagement, self.settings.home)
    }

    /// Plans several regions in order, continuing from where the last one ended.
    pub fn plan_regions(
        &self,
        regions: &[RegionRings],
        strategy: PocketStrategy,
        engagement: &EngagementSettings,
    ) -> Result<Toolpath> {
        let mut toolpath = Toolpath::new();
        let mut position = self.settings.home;
        for region in regions {
            let mut part = self.plan_from(&region.result.rings, strategy, engagement, position)?;
            part.stats.repair_notices = region.result.repairs.len();
            position = part.current_position().unwrap_or(position);
            toolpath.extend(part);
        }
        toolpath.stats.region_count = regions.len();
        info!(
            "Planned {} regions: {} moves, cut {:.1}mm, rapid {:.1}mm",
            regions.len(),
            toolpath.stats.move_count,
            toolpath.stats.cut_length,
            toolpath.stats.rapid_length
        );
        Ok(toolpath)
    }

    fn plan_from(
        &self,
        rings: &[OffsetRing],
        strategy: PocketStrategy,
        engagement: &EngagementSettings,
        start: Point,
    ) -> Result<Toolpath> {
        self.tool.validate()?;
        engagement.validate()?;
        if rings.is_empty() {
            return Err(GeometryError::InvalidParameter {
                name: "rings".to_string(),
                reason: "no rings to plan".to_string(),
            }
            .into());
        }
        for ring in rings {
            if ring.path.len() < 3 {
                return Err(GeometryError::Degenerate {
                    loop_index: ring.index,
                    reason: format!("ring has {} points", ring.path.len()),
                }
                .into());
            }
            let crossings = ring.path.self_intersections().len();
            if crossings > 0 {
                return Err(GeometryError::SelfIntersecting {
                    ring_index: ring.index,
                    crossings,
                }
                .into());
            }
        }

        let mut toolpath = match strategy {
            PocketStrategy::Spiral => self.plan_spiral(rings, engagement, start),
            PocketStrategy::Lanes => self.plan_lanes(rings, engagement, start),
        };
        toolpath.stats.ring_count = rings.len();
        toolpath.stats.region_count = 1;
        toolpath.refresh_stats();
        debug!(
            "{} plan: {} moves, {} tight corners, {} relief loops",
            strategy,
            toolpath.stats.move_count,
            toolpath.stats.tight_corners,
            toolpath.stats.relief_loops
        );
        Ok(toolpath)
    }

    /// Connects the current position to `target`.
    fn transition(&self, toolpath: &mut Toolpath, from: Point, target: Point) {
        if toolpath.moves.is_empty() {
            toolpath.push(ToolpathMove::rapid(from, target));
            return;
        }
        let distance = from.distance_to(&target);
        if distance <= 1e-9 {
            return;
        }
        if distance <= self.tool.diameter {
            toolpath.push(ToolpathMove::linear(from, target));
        } else {
            toolpath.push(ToolpathMove::rapid(from, target));
        }
    }

    /// Appends a full ring cut, starting at the vertex nearest `position`.
    fn cut_ring(
        &self,
        toolpath: &mut Toolpath,
        ring: &OffsetRing,
        position: Point,
        engagement: &EngagementSettings,
    ) -> Point {
        let oriented = ring
            .path
            .with_orientation(self.settings.direction.ring_orientation(ring.source));
        let start = oriented.nearest_vertex(&position).unwrap_or(0);
        let path = oriented.rotated_to_start(start);
        let entry = path.points[0];
        self.transition(toolpath, position, entry);

        let (moves, report) = ring_moves(
            &path,
            self.tool.radius(),
            self.settings.direction.pocket_left(),
            engagement,
        );
        record(toolpath, report);
        for mv in moves {
            toolpath.push(mv);
        }
        entry
    }

    fn plan_spiral(
        &self,
        rings: &[OffsetRing],
        engagement: &EngagementSettings,
        start: Point,
    ) -> Toolpath {
        let max_depth = rings.iter().map(|r| r.depth).max().unwrap_or(0);
        let depths: Vec<usize> = match self.settings.entry {
            EntryPolicy::InsideOut => (0..=max_depth).rev().collect(),
            EntryPolicy::OutsideIn => (0..=max_depth).collect(),
        };

        let mut toolpath = Toolpath::new();
        let mut position = start;
        for depth in depths {
            let mut remaining: Vec<&OffsetRing> = rings.iter().filter(|r| r.depth == depth).collect();
            remaining.sort_by_key(|r| r.index);
            while !remaining.is_empty() {
                let mut best = 0;
                let mut best_distance = f64::INFINITY;
                for (k, ring) in remaining.iter().enumerate() {
                    let d = nearest_vertex_distance(&ring.path, &position);
                    if d < best_distance {
                        best = k;
                        best_distance = d;
                    }
                }
                let ring = remaining.remove(best);
                position = self.cut_ring(&mut toolpath, ring, position, engagement);
            }
        }
        toolpath
    }

    fn plan_lanes(
        &self,
        rings: &[OffsetRing],
        engagement: &EngagementSettings,
        start: Point,
    ) -> Toolpath {
        let mut outer: Vec<&OffsetRing> = rings.iter().filter(|r| r.depth == 0).collect();
        outer.sort_by_key(|r| r.index);
        let loops: Vec<&Loop> = outer.iter().map(|r| &r.path).collect();

        let mut bounds = Bounds::empty();
        for l in &loops {
            bounds.union(&l.bounds());
        }

        let mut toolpath = Toolpath::new();
        let mut position = start;
        let spacing_max = self.tool.stepover_distance();
        let span = bounds.height();
        let lines = if span > 2.0 * LANE_NUDGE {
            (span / spacing_max).ceil().max(1.0) as usize
        } else {
            0
        };

        let mut lane_index = 0;
        for k in 0..=lines {
            let y = if lines == 0 {
                bounds.min_y + span / 2.0
            } else if k == 0 {
                bounds.min_y + LANE_NUDGE
            } else if k == lines {
                bounds.max_y - LANE_NUDGE
            } else {
                bounds.min_y + span * k as f64 / lines as f64
            };

            let mut intervals = scan_intervals(&loops, y);
            if intervals.is_empty() {
                continue;
            }
            let forward = lane_index % 2 == 0;
            lane_index += 1;
            if !forward {
                intervals.reverse();
            }
            for (x0, x1) in intervals {
                let (a, b) = if forward {
                    (Point::new(x0, y), Point::new(x1, y))
                } else {
                    (Point::new(x1, y), Point::new(x0, y))
                };
                self.link(&mut toolpath, &loops, position, a);
                toolpath.push(ToolpathMove::linear(a, b));
                position = b;
            }
        }

        // Wall contour to clean up the scallops between lane ends.
        for ring in outer {
            position = self.cut_ring(&mut toolpath, ring, position, engagement);
        }
        toolpath
    }

    /// Joins lanes: a cut if short and inside the region, otherwise a rapid.
    fn link(&self, toolpath: &mut Toolpath, loops: &[&Loop], from: Point, to: Point) {
        if toolpath.moves.is_empty() {
            toolpath.push(ToolpathMove::rapid(from, to));
            return;
        }
        let distance = from.distance_to(&to);
        if distance <= 1e-9 {
            return;
        }
        let mid = from.lerp(&to, 0.5);
        let inside = inside_region(loops, &mid)
            || loops.iter().any(|l| l.distance_to_point(&mid) < 1e-6);
        let crosses = loops.iter().any(|l| {
            l.edges()
                .any(|(a, b)| segment_intersection(&from, &to, &a, &b).is_some())
        });
        if distance <= self.tool.diameter && inside && !crosses {
            toolpath.push(ToolpathMove::linear(from, to));
        } else {
            toolpath.push(ToolpathMove::rapid(from, to));
        }
    }
}

fn record(toolpath: &mut Toolpath, report: EngagementReport) {
    toolpath.stats.tight_corners += report.tight_corners;
    toolpath.stats.relief_loops += report.relief_loops;
}

fn nearest_vertex_distance(path: &Loop, point: &Point) -> f64 {
    path.points
        .iter()
        .map(|p| p.distance_to(point))
        .fold(f64::INFINITY, f64::min)
}

/// Even-odd containment over all loops of a region.
fn inside_region(loops: &[&Loop], point: &Point) -> bool {
    loops.iter().filter(|l| l.contains(point)).count() % 2 == 1
}

/// Inside intervals of the horizontal line at `y`, sorted left to right.
fn scan_intervals(loops: &[&Loop], y: f64) -> Vec<(f64, f64)> {
    let mut xs = Vec::new();
    for l in loops {
        for (p1, p2) in l.edges() {
            if (p1.y <= y && p2.y > y) || (p2.y <= y && p1.y > y) {
                xs.push(p1.x + (y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y));
            }
        }
    }
    xs.sort_by(|a, b| a.total_cmp(b));
    xs.chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .filter(|(a, b)| b - a > 1e-9)
        .collect()
}
