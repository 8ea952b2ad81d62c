//! Request/response boundary of the toolpath core.
//!
//! Requests carry lengths in their own `units`; everything is normalized to
//! millimeters on the way in and converted back on the way out. Simulation
//! statistics are always reported in millimeters and minutes.

use fretcam_core::{Bounds, Loop, Point, Result, Tool, Units};
use fretcam_designer::{
    classify_loops, CornerMode, GcodeEmitter, OffsetEngine, PocketPlanner, PocketStrategy,
    RegionRings, RepairNotice, ToolpathMove, ToolpathStats,
};
use fretcam_postdb::{ArcMode, FeedOverrideMode, PostProfileProvider};
use fretcam_settings::Config;
use fretcam_visualizer::{SimulationIssue, Simulator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetRequest {
    /// Boundaries and islands in any order; nesting decides their role
    pub loops: Vec<Loop>,
    #[serde(default)]
    pub units: Units,
    pub tool_d: f64,
    pub stepover: f64,
    #[serde(default)]
    pub margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetResponse {
    pub units: Units,
    pub regions: Vec<RegionRings>,
    pub repairs: Vec<RepairNotice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub loops: Vec<Loop>,
    #[serde(default)]
    pub units: Units,
    pub tool_d: f64,
    pub stepover: f64,
    #[serde(default)]
    pub margin: f64,
    #[serde(default)]
    pub strategy: PocketStrategy,
    /// Overrides the configured tight-corner threshold
    #[serde(default)]
    pub corner_radius_min: Option<f64>,
    #[serde(default)]
    pub corner_mode: Option<CornerMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub units: Units,
    pub moves: Vec<ToolpathMove>,
    pub stats: ToolpathStats,
}

/// Machine parameters that replace the configured emitter settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitOverrides {
    pub safe_z: Option<f64>,
    pub cut_z: Option<f64>,
    pub feed_rate: Option<f64>,
    pub plunge_rate: Option<f64>,
    pub spindle_rpm: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitRequest {
    pub moves: Vec<ToolpathMove>,
    #[serde(default)]
    pub units: Units,
    pub post_profile_id: String,
    #[serde(default)]
    pub feed_override: FeedOverrideMode,
    #[serde(default)]
    pub arc_mode: Option<ArcMode>,
    #[serde(default)]
    pub overrides: EmitOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitResponse {
    pub gcode_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulateRequest {
    pub gcode_text: String,
    /// Unit mode before the first G20/G21
    #[serde(default)]
    pub units: Units,
    /// Units per minute in the request units
    #[serde(default)]
    pub rapid_rate: Option<f64>,
    #[serde(default)]
    pub default_feed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulateResponse {
    pub points_xy: Vec<(f64, f64)>,
    pub travel_mm: f64,
    pub cut_mm: f64,
    pub t_rapid_min: f64,
    pub t_feed_min: f64,
    pub t_dwell_min: f64,
    pub t_total_min: f64,
    pub bounds: Bounds,
    pub issues: Vec<SimulationIssue>,
}

fn scale_point(p: Point, k: f64) -> Point {
    Point::new(p.x * k, p.y * k)
}

fn scale_loop(l: &Loop, k: f64) -> Loop {
    Loop::new(l.points.iter().map(|p| scale_point(*p, k)).collect())
}

fn scale_bounds(b: &Bounds, k: f64) -> Bounds {
    if b.is_empty() {
        return *b;
    }
    Bounds {
        min_x: b.min_x * k,
        min_y: b.min_y * k,
        max_x: b.max_x * k,
        max_y: b.max_y * k,
    }
}

fn scale_move(mv: &ToolpathMove, k: f64) -> ToolpathMove {
    match *mv {
        ToolpathMove::Rapid { start, end } => ToolpathMove::Rapid {
            start: scale_point(start, k),
            end: scale_point(end, k),
        },
        ToolpathMove::Linear {
            start,
            end,
            annotations,
        } => ToolpathMove::Linear {
            start: scale_point(start, k),
            end: scale_point(end, k),
            annotations,
        },
        ToolpathMove::Arc {
            start,
            end,
            center,
            radius,
            direction,
            annotations,
        } => ToolpathMove::Arc {
            start: scale_point(start, k),
            end: scale_point(end, k),
            center: scale_point(center, k),
            radius: radius * k,
            direction,
            annotations,
        },
    }
}

fn scale_repair(notice: &RepairNotice, k: f64) -> RepairNotice {
    RepairNotice {
        area_before: notice.area_before * k * k,
        area_after: notice.area_after * k * k,
        ..notice.clone()
    }
}

fn scale_region(region: &RegionRings, k: f64) -> RegionRings {
    let mut scaled = region.clone();
    scaled.bounds = scale_bounds(&region.bounds, k);
    for ring in &mut scaled.result.rings {
        ring.path = scale_loop(&ring.path, k);
    }
    scaled.result.repairs = region
        .result
        .repairs
        .iter()
        .map(|n| scale_repair(n, k))
        .collect();
    scaled
}

/// Offsets every region of the request in millimeters.
fn offset_regions(
    loops: &[Loop],
    units: Units,
    tool_d: f64,
    stepover: f64,
    margin: f64,
    config: &Config,
) -> Result<Vec<RegionRings>> {
    let k = units.to_mm(1.0);
    let loops_mm: Vec<Loop> = loops.iter().map(|l| scale_loop(l, k)).collect();
    let regions = classify_loops(&loops_mm)?;
    debug!("{} loops classified into {} regions", loops.len(), regions.len());

    let engine = OffsetEngine::new(config.offset.clone());
    engine.compute_regions(&regions, units.to_mm(tool_d), stepover, units.to_mm(margin))
}

/// Computes nested offset rings for every pocket region.
pub fn offset(request: &OffsetRequest, config: &Config) -> Result<OffsetResponse> {
    let regions = offset_regions(
        &request.loops,
        request.units,
        request.tool_d,
        request.stepover,
        request.margin,
        config,
    )?;

    let k = request.units.from_mm(1.0);
    let regions: Vec<RegionRings> = regions.iter().map(|r| scale_region(r, k)).collect();
    let repairs = regions
        .iter()
        .flat_map(|r| r.result.repairs.iter().cloned())
        .collect();
    info!("Offset complete: {} regions", regions.len());

    Ok(OffsetResponse {
        units: request.units,
        regions,
        repairs,
    })
}

/// Offsets and plans a pocket toolpath.
pub fn plan(request: &PlanRequest, config: &Config) -> Result<PlanResponse> {
    let units = request.units;
    let regions = offset_regions(
        &request.loops,
        units,
        request.tool_d,
        request.stepover,
        request.margin,
        config,
    )?;

    let tool = Tool {
        diameter: units.to_mm(request.tool_d),
        stepover: request.stepover,
        ..config.tool.clone()
    };
    let mut engagement = config.engagement.clone();
    if let Some(radius) = request.corner_radius_min {
        engagement.corner_radius_min = units.to_mm(radius);
    }
    if let Some(mode) = request.corner_mode {
        engagement.mode = mode;
    }

    let planner = PocketPlanner::new(tool, config.planner.clone());
    let toolpath = planner.plan_regions(&regions, request.strategy, &engagement)?;

    let k = units.from_mm(1.0);
    let mut stats = toolpath.stats.clone();
    stats.cut_length *= k;
    stats.rapid_length *= k;
    info!(
        "Planned {} moves over {} rings ({})",
        stats.move_count, stats.ring_count, request.strategy
    );

    Ok(PlanResponse {
        units,
        moves: toolpath.moves.iter().map(|mv| scale_move(mv, k)).collect(),
        stats,
    })
}

/// Renders moves as G-code for the requested post profile.
pub fn emit(
    request: &EmitRequest,
    config: &Config,
    profiles: &dyn PostProfileProvider,
) -> Result<EmitResponse> {
    let units = request.units;
    let overrides = &request.overrides;
    let mut settings = config.emitter_settings();
    settings.units = units;
    if let Some(z) = overrides.safe_z {
        settings.safe_z = units.to_mm(z);
    }
    if let Some(z) = overrides.cut_z {
        settings.cut_z = units.to_mm(z);
    }
    if let Some(feed) = overrides.feed_rate {
        settings.feed_rate = units.to_mm(feed);
    }
    if let Some(feed) = overrides.plunge_rate {
        settings.plunge_rate = units.to_mm(feed);
    }
    if let Some(rpm) = overrides.spindle_rpm {
        settings.spindle_rpm = rpm;
    }

    let emitter = GcodeEmitter::from_provider(profiles, &request.post_profile_id, settings)?;
    let k = units.to_mm(1.0);
    let moves: Vec<ToolpathMove> = request.moves.iter().map(|mv| scale_move(mv, k)).collect();
    let gcode_text = emitter.emit(&moves, request.feed_override, request.arc_mode)?;

    Ok(EmitResponse { gcode_text })
}

/// Simulates G-code text. Never fails; problems are reported as issues.
pub fn simulate(request: &SimulateRequest, config: &Config) -> SimulateResponse {
    let units = request.units;
    let mut settings = config.simulation.clone();
    settings.initial_units = units;
    if let Some(rate) = request.rapid_rate {
        settings.rapid_rate = units.to_mm(rate);
    }
    if let Some(feed) = request.default_feed {
        settings.default_feed = units.to_mm(feed);
    }

    let result = Simulator::new(settings).simulate(&request.gcode_text);
    SimulateResponse {
        points_xy: result.points_xy(),
        travel_mm: result.rapid_distance,
        cut_mm: result.cut_distance,
        t_rapid_min: result.rapid_time,
        t_feed_min: result.feed_time,
        t_dwell_min: result.dwell_time,
        t_total_min: result.total_time,
        bounds: result.bounds,
        issues: result.issues,
    }
}
