//! G-code machining simulator
//!
//! Re-derives geometry, modal state, distances and machining time from
//! arbitrary G-code text. The simulator is a standalone consumer: it knows
//! nothing about how the text was produced and never fails. Problems are
//! reported as [`SimulationIssue`]s next to best-effort statistics.
//!
//! Within a block, words take effect in the usual interpreter order:
//! feed, spindle speed, tool, spindle state, dwell, plane, units, distance
//! mode, then motion.

use fretcam_core::{Bounds, ConfigError, Units};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::gcode::arc::{center_from_radius, ArcGeometry, RadiusArcError};
use crate::gcode::parser::{parse_line, Block, DistanceMode, ModalState, MotionMode, Plane, SpindleState};
use crate::issue::{IssueCode, SimulationIssue};

/// A point of the interpolated tool path in mm
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    fn from_array(p: [f64; 3]) -> Self {
        Self::new(p[0], p[1], p[2])
    }
}

/// Tunables for a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Unit mode in effect before the first G20/G21
    pub initial_units: Units,
    /// Interpolated points per arc
    pub arc_segments: usize,
    /// Rapid traverse rate in mm/min
    pub rapid_rate: f64,
    /// Feed used for cutting moves when no F word has been seen (mm/min)
    pub default_feed: f64,
    /// Lower clamp for zero or negative feeds (mm/min)
    pub min_feed: f64,
    /// Allowed difference between start and end radius of I/J arcs (mm)
    pub arc_radius_tolerance: f64,
    /// Record the modal state after every block
    pub record_trajectory: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            initial_units: Units::Mm,
            arc_segments: 64,
            rapid_rate: 5000.0,
            default_feed: 0.0,
            min_feed: 1.0,
            arc_radius_tolerance: 0.05,
            record_trajectory: false,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arc_segments == 0 {
            return Err(ConfigError::InvalidValue {
                key: "simulation.arc_segments".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        if !(self.rapid_rate > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "simulation.rapid_rate".to_string(),
                reason: format!("must be positive, got {}", self.rapid_rate),
            });
        }
        if !(self.min_feed > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "simulation.min_feed".to_string(),
                reason: format!("must be positive, got {}", self.min_feed),
            });
        }
        if self.default_feed < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "simulation.default_feed".to_string(),
                reason: "must be >= 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Modal state after one block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryEntry {
    pub line: usize,
    pub state: ModalState,
}

/// Everything the simulator derives from a program
///
/// Times are in minutes, distances in millimeters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub points: Vec<Point3>,
    pub rapid_distance: f64,
    pub cut_distance: f64,
    pub rapid_time: f64,
    pub feed_time: f64,
    pub dwell_time: f64,
    pub total_time: f64,
    pub bounds: Bounds,
    pub issues: Vec<SimulationIssue>,
    pub final_state: ModalState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trajectory: Vec<TrajectoryEntry>,
}

impl SimulationResult {
    /// XY projection of the interpolated points.
    pub fn points_xy(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.x, p.y)).collect()
    }
}

/// Stateless G-code simulator
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    pub settings: SimulationSettings,
}

impl Simulator {
    pub fn new(settings: SimulationSettings) -> Self {
        Self { settings }
    }

    /// Simulates a complete program.
    pub fn simulate(&self, gcode: &str) -> SimulationResult {
        debug!("Starting G-code simulation, input size: {} bytes", gcode.len());

        let mut run = Run::new(&self.settings);
        for (index, raw) in gcode.lines().enumerate() {
            let (block, issues) = parse_line(index + 1, raw);
            run.issues.extend(issues);
            if block.is_empty() {
                continue;
            }
            run.execute(&block);
            if self.settings.record_trajectory {
                run.trajectory.push(TrajectoryEntry {
                    line: block.line,
                    state: run.state,
                });
            }
        }

        let result = run.finish();
        debug!(
            "Simulation done: {} points, cut {:.3}mm, rapid {:.3}mm, {:.3}min, {} issues",
            result.points.len(),
            result.cut_distance,
            result.rapid_distance,
            result.total_time,
            result.issues.len()
        );
        result
    }
}

/// Mutable accumulators for one simulation call.
struct Run<'a> {
    settings: &'a SimulationSettings,
    state: ModalState,
    points: Vec<Point3>,
    bounds: Bounds,
    rapid_distance: f64,
    cut_distance: f64,
    rapid_time: f64,
    feed_time: f64,
    dwell_time: f64,
    issues: Vec<SimulationIssue>,
    trajectory: Vec<TrajectoryEntry>,
    feed_defaulted: bool,
}

impl<'a> Run<'a> {
    fn new(settings: &'a SimulationSettings) -> Self {
        let state = ModalState::new(settings.initial_units);
        let origin = Point3::from_array(state.position);
        let mut bounds = Bounds::empty();
        bounds.include(origin.x, origin.y);
        Self {
            settings,
            state,
            points: vec![origin],
            bounds,
            rapid_distance: 0.0,
            cut_distance: 0.0,
            rapid_time: 0.0,
            feed_time: 0.0,
            dwell_time: 0.0,
            issues: Vec::new(),
            trajectory: Vec::new(),
            feed_defaulted: false,
        }
    }

    fn execute(&mut self, block: &Block) {
        let line = block.line;

        if let Some(f) = block.f {
            self.set_feed(line, f);
        }
        if let Some(s) = block.s {
            self.state.spindle_rpm = s.max(0.0);
        }
        if let Some(t) = block.t {
            self.state.tool = t.max(0.0).round() as u32;
        }
        for code in &block.m_codes {
            self.apply_m_code(line, code.major, code.minor);
        }

        let mut motion = None;
        let mut skip_motion = false;
        let mut dwell = false;
        for code in &block.g_codes {
            match (code.major, code.minor) {
                (0, None) => motion = Some(MotionMode::Rapid),
                (1, None) => motion = Some(MotionMode::Linear),
                (2, None) => motion = Some(MotionMode::ArcCw),
                (3, None) => motion = Some(MotionMode::ArcCcw),
                (4, None) => dwell = true,
                (17, None) => self.state.plane = Plane::XY,
                (18, None) => self.state.plane = Plane::ZX,
                (19, None) => self.state.plane = Plane::YZ,
                (20, None) => self.state.units = Units::Inch,
                (21, None) => self.state.units = Units::Mm,
                (90, None) => self.state.distance = DistanceMode::Absolute,
                (91, None) => self.state.distance = DistanceMode::Incremental,
                (94, None) => {}
                (93, None) | (95, None) => self.issues.push(SimulationIssue::warning(
                    line,
                    IssueCode::UnsupportedFeedMode,
                    format!("G{} feed mode not simulated, feeds read as units/min", code),
                )),
                // Accepted modal codes with no effect on geometry or timing.
                (40, None) | (49, None) | (80, None) | (61, _) | (64, None) | (43, None) => {}
                (54..=59, _) => {}
                // Work offsets are not simulated, so machine coordinates equal work coordinates.
                (53, None) => {}
                // Axis words of these blocks are not a move to the given point.
                (10, _) | (28, _) | (30, _) | (92, _) => {
                    self.issues.push(SimulationIssue::warning(
                        line,
                        IssueCode::MotionNotSimulated,
                        format!("G{} not simulated, block motion skipped", code),
                    ));
                    skip_motion = true;
                }
                _ => self.issues.push(SimulationIssue::info(
                    line,
                    IssueCode::UnknownGCode,
                    format!("G{} ignored", code),
                )),
            }
        }

        if dwell {
            self.dwell(block);
        }

        if let Some(mode) = motion {
            self.state.motion = mode;
        }
        // G4 consumes its block; axis words without a motion code use the modal motion.
        let full_circle = matches!(motion, Some(MotionMode::ArcCw | MotionMode::ArcCcw))
            && (block.offsets.iter().any(Option::is_some) || block.r.is_some());
        if skip_motion || dwell || !(block.has_axis_words() || full_circle) {
            return;
        }

        match self.state.motion {
            MotionMode::Rapid | MotionMode::Linear => self.linear_move(block),
            MotionMode::ArcCw => self.arc_move(block, true),
            MotionMode::ArcCcw => self.arc_move(block, false),
        }
    }

    fn set_feed(&mut self, line: usize, f: f64) {
        let feed = self.state.units.to_mm(f);
        if feed < self.settings.min_feed {
            self.issues.push(SimulationIssue::warning(
                line,
                IssueCode::FeedClamped,
                format!(
                    "feed F{} is below the minimum, clamped to {} mm/min",
                    f, self.settings.min_feed
                ),
            ));
        }
        self.state.feed_rate = feed.max(self.settings.min_feed);
    }

    fn apply_m_code(&mut self, line: usize, major: u32, minor: Option<u32>) {
        if minor.is_some() {
            self.issues.push(SimulationIssue::warning(
                line,
                IssueCode::UnknownMCode,
                format!("M{}.{} ignored", major, minor.unwrap_or(0)),
            ));
            return;
        }
        match major {
            3 => self.state.spindle = SpindleState::Cw,
            4 => self.state.spindle = SpindleState::Ccw,
            5 => self.state.spindle = SpindleState::Off,
            // Program stops, tool change, coolant and user-defined codes
            0 | 1 | 2 | 6 | 7 | 8 | 9 | 30 | 100..=199 => {}
            _ => self.issues.push(SimulationIssue::warning(
                line,
                IssueCode::UnknownMCode,
                format!("M{} ignored", major),
            )),
        }
    }

    fn dwell(&mut self, block: &Block) {
        match block.p {
            Some(seconds) if seconds >= 0.0 => {
                self.dwell_time += seconds / 60.0;
            }
            _ => self.issues.push(SimulationIssue::warning(
                block.line,
                IssueCode::DwellMissingTime,
                "G4 without a non-negative P word",
            )),
        }
    }

    /// Effective cutting feed in mm/min.
    fn cut_feed(&mut self, line: usize) -> f64 {
        if self.state.feed_rate > 0.0 {
            return self.state.feed_rate;
        }
        if !self.feed_defaulted {
            self.feed_defaulted = true;
            let fallback = self.settings.default_feed.max(self.settings.min_feed);
            self.issues.push(SimulationIssue::warning(
                line,
                IssueCode::FeedDefaulted,
                format!("cutting move before any F word, using {} mm/min", fallback),
            ));
        }
        self.settings.default_feed.max(self.settings.min_feed)
    }

    fn target(&self, block: &Block) -> [f64; 3] {
        let mut target = self.state.position;
        for (axis, value) in block.axes.iter().enumerate() {
            if let Some(v) = value {
                target[axis] = self.state.resolve_axis(axis, *v);
            }
        }
        target
    }

    fn push_point(&mut self, p: [f64; 3]) {
        self.bounds.include(p[0], p[1]);
        self.points.push(Point3::from_array(p));
    }

    fn account(&mut self, line: usize, length: f64, rapid: bool) {
        if rapid {
            self.rapid_distance += length;
            self.rapid_time += length / self.settings.rapid_rate.max(self.settings.min_feed);
        } else {
            let feed = self.cut_feed(line);
            self.cut_distance += length;
            self.feed_time += length / feed;
        }
    }

    fn linear_move(&mut self, block: &Block) {
        let start = self.state.position;
        let end = self.target(block);
        let length = ((end[0] - start[0]).powi(2)
            + (end[1] - start[1]).powi(2)
            + (end[2] - start[2]).powi(2))
        .sqrt();
        let rapid = self.state.motion == MotionMode::Rapid;
        trace!("Line {}: {} move {:.3}mm", block.line, if rapid { "rapid" } else { "linear" }, length);

        self.account(block.line, length, rapid);
        self.state.position = end;
        self.push_point(end);
    }

    /// Falls back to a straight cut when the arc centre cannot be found.
    fn chord_fallback(&mut self, block: &Block, code: IssueCode, message: String) {
        self.issues.push(SimulationIssue::warning(block.line, code, message));
        let start = self.state.position;
        let end = self.target(block);
        let length = ((end[0] - start[0]).powi(2)
            + (end[1] - start[1]).powi(2)
            + (end[2] - start[2]).powi(2))
        .sqrt();
        self.account(block.line, length, false);
        self.state.position = end;
        self.push_point(end);
    }

    fn arc_move(&mut self, block: &Block, clockwise: bool) {
        let (a, b, axial) = self.state.plane.axes();
        let start = self.state.position;
        let end = self.target(block);
        let start_2d = (start[a], start[b]);
        let end_2d = (end[a], end[b]);
        let units = self.state.units;

        let center = if let Some(r) = block.r {
            match center_from_radius(
                start_2d,
                end_2d,
                units.to_mm(r),
                clockwise,
                self.settings.arc_radius_tolerance,
            ) {
                Ok(center) => center,
                Err(RadiusArcError::CoincidentEndpoints) => {
                    self.issues.push(SimulationIssue::warning(
                        block.line,
                        IssueCode::ArcInvalidRadius,
                        "R arc with coincident endpoints has no unique centre, skipped",
                    ));
                    self.state.position = end;
                    return;
                }
                Err(RadiusArcError::RadiusTooSmall { radius, half_chord }) => {
                    self.chord_fallback(
                        block,
                        IssueCode::ArcInvalidRadius,
                        format!(
                            "radius {:.4}mm shorter than half chord {:.4}mm, cut as straight line",
                            radius, half_chord
                        ),
                    );
                    return;
                }
            }
        } else {
            let off_a = block.offsets[a];
            let off_b = block.offsets[b];
            if off_a.is_none() && off_b.is_none() {
                self.chord_fallback(
                    block,
                    IssueCode::ArcMissingCenter,
                    "arc without centre offsets or R word, cut as straight line".to_string(),
                );
                return;
            }
            (
                start_2d.0 + units.to_mm(off_a.unwrap_or(0.0)),
                start_2d.1 + units.to_mm(off_b.unwrap_or(0.0)),
            )
        };

        let arc = ArcGeometry::from_center(start_2d, end_2d, center, clockwise);
        if arc.radius < 1e-9 {
            self.chord_fallback(
                block,
                IssueCode::ArcInvalidRadius,
                "arc centre coincides with its start point, cut as straight line".to_string(),
            );
            return;
        }
        let end_radius = (end_2d.0 - center.0).hypot(end_2d.1 - center.1);
        if (end_radius - arc.radius).abs() > self.settings.arc_radius_tolerance {
            self.issues.push(SimulationIssue::warning(
                block.line,
                IssueCode::ArcRadiusMismatch,
                format!(
                    "start radius {:.4}mm and end radius {:.4}mm differ",
                    arc.radius, end_radius
                ),
            ));
        }

        let axial_delta = end[axial] - start[axial];
        let length = arc.helical_length(axial_delta);
        trace!(
            "Line {}: arc r={:.3} sweep={:.2}deg length {:.3}mm",
            block.line,
            arc.radius,
            arc.sweep.to_degrees(),
            length
        );
        self.account(block.line, length, false);

        let segments = self.settings.arc_segments.max(1);
        for step in 1..=segments {
            let t = step as f64 / segments as f64;
            let mut p = start;
            if step == segments {
                p = end;
            } else {
                let (pa, pb) = arc.point_at(t);
                p[a] = pa;
                p[b] = pb;
                p[axial] = start[axial] + axial_delta * t;
            }
            self.push_point(p);
        }
        self.state.position = end;
    }

    fn finish(self) -> SimulationResult {
        SimulationResult {
            points: self.points,
            rapid_distance: self.rapid_distance,
            cut_distance: self.cut_distance,
            rapid_time: self.rapid_time,
            feed_time: self.feed_time,
            dwell_time: self.dwell_time,
            total_time: self.rapid_time + self.feed_time + self.dwell_time,
            bounds: self.bounds,
            issues: self.issues,
            final_state: self.state,
            trajectory: self.trajectory,
        }
    }
}
