//! Inward offset rings for pocketing.
//!
//! The pocket shape (boundary loops wound counter-clockwise, island loops
//! wound clockwise) is shrunk repeatedly with the cavalier_contours shape
//! offset. The first step clears the wall by the tool radius plus the margin,
//! each further step moves in by the stepover. After every step arcs are
//! flattened and each loop goes through the topology repair pass.

use std::f64::consts::FRAC_PI_2;
use std::panic;

use cavalier_contours::polyline::{
    seg_arc_radius_and_center, BooleanOp, PlineSource, PlineSourceMut, PlineVertex, Polyline,
};
use cavalier_contours::shape_algorithms::{Shape, ShapeOffsetOptions};
use fretcam_core::{
    Bounds, ConfigError, Error, GeometryError, Loop, OffsetExhaustedError, Orientation, Point,
    Result, Tool,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::repair::{RepairNotice, RepairPolicy};

/// Which input loop a ring was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RingSource {
    Boundary,
    Island,
}

impl RingSource {
    /// Winding used for this source inside a shape.
    pub fn orientation(&self) -> Orientation {
        match self {
            RingSource::Boundary => Orientation::CounterClockwise,
            RingSource::Island => Orientation::Clockwise,
        }
    }
}

/// One offset loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetRing {
    pub index: usize,
    /// Nesting depth: number of inward steps from the walls, starting at 0
    pub depth: usize,
    pub source: RingSource,
    /// Index of the ring this one was offset from
    pub parent: Option<usize>,
    pub path: Loop,
}

/// Offset engine tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffsetSettings {
    /// Hard cap on the number of offset levels
    pub max_rings: usize,
    /// Relative area change above which a repair is flagged
    pub repair_area_tolerance: f64,
    /// Fail instead of flagging when a repair exceeds the tolerance
    pub reject_repairs_above_tolerance: bool,
    /// Halvings of the step tried before giving up on the centre
    pub finishing_subdivisions: usize,
    /// Maximum deviation when flattening offset arcs (mm)
    pub chord_tolerance: f64,
    /// Loops smaller than this are dropped (mm^2)
    pub min_ring_area: f64,
}

impl Default for OffsetSettings {
    fn default() -> Self {
        Self {
            max_rings: 500,
            repair_area_tolerance: 0.01,
            reject_repairs_above_tolerance: false,
            finishing_subdivisions: 2,
            chord_tolerance: 0.01,
            min_ring_area: 1e-4,
        }
    }
}

impl OffsetSettings {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_rings == 0 {
            return Err(ConfigError::InvalidValue {
                key: "offset.max_rings".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        if !(self.repair_area_tolerance >= 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "offset.repair_area_tolerance".to_string(),
                reason: "must be >= 0".to_string(),
            });
        }
        if !(self.chord_tolerance > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "offset.chord_tolerance".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }

    fn repair_policy(&self) -> RepairPolicy {
        RepairPolicy {
            area_tolerance: self.repair_area_tolerance,
            reject_above_tolerance: self.reject_repairs_above_tolerance,
        }
    }
}

/// Rings of one pocket plus the repairs made along the way
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OffsetResult {
    pub rings: Vec<OffsetRing>,
    pub levels: usize,
    pub repairs: Vec<RepairNotice>,
    /// The ring cap stopped the sequence before the centre was reached
    pub hit_ring_cap: bool,
}

impl OffsetResult {
    pub fn rings_at(&self, depth: usize) -> impl Iterator<Item = &OffsetRing> {
        self.rings.iter().filter(move |r| r.depth == depth)
    }

    /// Net enclosed area of one level: boundary rings minus island rings.
    pub fn level_area(&self, depth: usize) -> f64 {
        net_area(self.rings_at(depth).map(|r| (&r.path, r.source)))
    }
}

/// A boundary with the islands directly inside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PocketRegion {
    pub boundary: Loop,
    pub islands: Vec<Loop>,
    pub bounds: Bounds,
}

/// Offset result for one region of a multi-region request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRings {
    pub region_index: usize,
    pub bounds: Bounds,
    pub result: OffsetResult,
}

fn net_area<'a>(loops: impl Iterator<Item = (&'a Loop, RingSource)>) -> f64 {
    loops
        .map(|(l, source)| match source {
            RingSource::Boundary => l.area(),
            RingSource::Island => -l.area(),
        })
        .sum()
}

fn to_polyline(l: &Loop) -> Polyline {
    let mut polyline = Polyline::new();
    for p in &l.points {
        polyline.add_vertex(PlineVertex::new(p.x, p.y, 0.0));
    }
    polyline.set_is_closed(true);
    polyline
}

/// Replaces arc segments with chords within `chord_tolerance`.
fn flatten_polyline(pline: &Polyline, chord_tolerance: f64) -> Loop {
    let n = pline.vertex_count();
    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let v1 = pline.at(i);
        let v2 = pline.at((i + 1) % n);
        points.push(Point::new(v1.x, v1.y));
        if v1.bulge_is_zero() {
            continue;
        }
        let (radius, center) = seg_arc_radius_and_center(v1, v2);
        let sweep = 4.0 * v1.bulge.atan();
        let start_angle = (v1.y - center.y).atan2(v1.x - center.x);
        let max_step = if radius > chord_tolerance {
            (2.0 * (1.0 - chord_tolerance / radius).acos()).max(1e-3)
        } else {
            FRAC_PI_2
        };
        let segments = ((sweep.abs() / max_step).ceil() as usize).clamp(1, 4096);
        for k in 1..segments {
            let a = start_angle + sweep * k as f64 / segments as f64;
            points.push(Point::new(
                center.x + radius * a.cos(),
                center.y + radius * a.sin(),
            ));
        }
    }
    Loop::new(points)
}

/// Unions overlapping islands so they act as one keep-out region.
fn union_islands(islands: Vec<Loop>, chord_tolerance: f64) -> Vec<Loop> {
    let mut merged: Vec<Loop> = islands
        .into_iter()
        .map(|l| l.with_orientation(Orientation::CounterClockwise))
        .collect();

    'outer: loop {
        for i in 0..merged.len() {
            for j in (i + 1)..merged.len() {
                if !loops_overlap(&merged[i], &merged[j]) {
                    continue;
                }
                let a = to_polyline(&merged[i]);
                let b = to_polyline(&merged[j]);
                let result =
                    panic::catch_unwind(panic::AssertUnwindSafe(|| a.boolean(&b, BooleanOp::Or)));
                let union = match result {
                    Ok(result) => result,
                    Err(_) => {
                        warn!("Panic during island union, islands {} and {} kept apart", i, j);
                        continue;
                    }
                };
                let mut pieces: Vec<Loop> = union
                    .pos_plines
                    .iter()
                    .map(|p| flatten_polyline(&p.pline, chord_tolerance).cleaned(1e-9))
                    .filter(|l| l.len() >= 3)
                    .map(|l| l.with_orientation(Orientation::CounterClockwise))
                    .collect();
                if !union.neg_plines.is_empty() {
                    warn!("Islands enclose a pocket area; the enclosed area is left uncut");
                }
                if pieces.is_empty() {
                    continue;
                }
                debug!("Merged overlapping islands {} and {}", i, j);
                merged.remove(j);
                merged.remove(i);
                merged.append(&mut pieces);
                continue 'outer;
            }
        }
        break;
    }
    merged
        .into_iter()
        .map(|l| l.with_orientation(Orientation::Clockwise))
        .collect()
}

fn loops_cross(a: &Loop, b: &Loop) -> bool {
    a.edges().any(|(a1, a2)| {
        b.edges()
            .any(|(b1, b2)| fretcam_core::segment_intersection(&a1, &a2, &b1, &b2).is_some())
    })
}

fn loops_overlap(a: &Loop, b: &Loop) -> bool {
    let ba = a.bounds();
    let bb = b.bounds();
    if ba.max_x < bb.min_x || bb.max_x < ba.min_x || ba.max_y < bb.min_y || bb.max_y < ba.min_y {
        return false;
    }
    loops_cross(a, b) || a.contains(&b.points[0]) || b.contains(&a.points[0])
}

/// Assigns loops to boundaries and islands by containment depth.
///
/// Loops at even depth are boundaries, loops at odd depth are islands of
/// the smallest loop containing them. Regions are ordered by the left edge
/// of their bounding box, then the bottom edge.
pub fn classify_loops(loops: &[Loop]) -> std::result::Result<Vec<PocketRegion>, GeometryError> {
    let cleaned = loops
        .iter()
        .enumerate()
        .map(|(i, l)| l.validated(i))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let areas: Vec<f64> = cleaned.iter().map(|l| l.area()).collect();
    let mut depth = vec![0usize; cleaned.len()];
    let mut parent: Vec<Option<usize>> = vec![None; cleaned.len()];
    for (i, inner) in cleaned.iter().enumerate() {
        let probe = inner.points[0];
        for (j, outer) in cleaned.iter().enumerate() {
            if i == j || areas[j] <= areas[i] || !outer.contains(&probe) {
                continue;
            }
            depth[i] += 1;
            if parent[i].map_or(true, |p| areas[j] < areas[p]) {
                parent[i] = Some(j);
            }
        }
    }

    let mut regions: Vec<PocketRegion> = Vec::new();
    for (b, boundary) in cleaned.iter().enumerate() {
        if depth[b] % 2 != 0 {
            continue;
        }
        let islands: Vec<Loop> = (0..cleaned.len())
            .filter(|&i| depth[i] % 2 == 1 && parent[i] == Some(b))
            .map(|i| cleaned[i].clone())
            .collect();
        regions.push(PocketRegion {
            boundary: boundary.clone(),
            islands,
            bounds: boundary.bounds(),
        });
    }
    regions.sort_by(|a, b| {
        a.bounds
            .min_x
            .total_cmp(&b.bounds.min_x)
            .then(a.bounds.min_y.total_cmp(&b.bounds.min_y))
    });
    debug!("Classified {} loops into {} regions", loops.len(), regions.len());
    Ok(regions)
}

/// Computes nested inward offset rings
#[derive(Debug, Clone, Default)]
pub struct OffsetEngine {
    pub settings: OffsetSettings,
}

impl OffsetEngine {
    pub fn new(settings: OffsetSettings) -> Self {
        Self { settings }
    }

    /// Computes the rings of one pocket.
    pub fn compute(
        &self,
        outer: &Loop,
        islands: &[Loop],
        tool_diameter: f64,
        stepover: f64,
        margin: f64,
    ) -> Result<OffsetResult> {
        Tool::new(tool_diameter, stepover).validate()?;
        if !margin.is_finite() || margin < 0.0 {
            return Err(GeometryError::InvalidParameter {
                name: "margin".to_string(),
                reason: format!("must be >= 0, got {}", margin),
            }
            .into());
        }
        self.settings.validate()?;

        let policy = self.settings.repair_policy();
        let mut repairs = Vec::new();

        let outer = outer.validated(0)?;
        let boundaries = policy.apply(
            &outer.with_orientation(Orientation::CounterClockwise),
            Orientation::CounterClockwise,
            RingSource::Boundary,
            None,
            &mut repairs,
        )?;
        if boundaries.is_empty() {
            return Err(GeometryError::SelfIntersecting {
                ring_index: 0,
                crossings: outer.self_intersections().len(),
            }
            .into());
        }

        let mut kept_islands = Vec::new();
        for (i, island) in islands.iter().enumerate() {
            let island_index = i + 1;
            let island = island.validated(island_index)?;
            let pieces = policy.apply(
                &island.with_orientation(Orientation::Clockwise),
                Orientation::Clockwise,
                RingSource::Island,
                None,
                &mut repairs,
            )?;
            if pieces.is_empty() {
                return Err(GeometryError::SelfIntersecting {
                    ring_index: island_index,
                    crossings: island.self_intersections().len(),
                }
                .into());
            }
            for piece in pieces {
                if boundaries.iter().any(|b| loops_cross(b, &piece)) {
                    return Err(GeometryError::IslandCrossesBoundary { island_index }.into());
                }
                if !boundaries.iter().any(|b| b.contains(&piece.points[0])) {
                    warn!("Island {} lies outside the pocket boundary, ignored", island_index);
                    continue;
                }
                kept_islands.push(piece);
            }
        }
        let islands = union_islands(kept_islands, self.settings.chord_tolerance);

        let mut current: Vec<(Loop, RingSource)> = boundaries
            .into_iter()
            .map(|l| (l, RingSource::Boundary))
            .chain(islands.into_iter().map(|l| (l, RingSource::Island)))
            .collect();

        let mut result = OffsetResult {
            repairs,
            ..Default::default()
        };
        let mut prev_area = net_area(current.iter().map(|(l, s)| (l, *s)));
        let mut prev_first_ring = 0;
        let mut step = tool_diameter / 2.0 + margin;
        let full_step = stepover * tool_diameter;
        let mut halvings = 0;

        loop {
            if result.levels >= self.settings.max_rings {
                result.hit_ring_cap = true;
                warn!("Offset ring cap of {} reached", self.settings.max_rings);
                break;
            }
            let depth = result.levels;
            let next = self.offset_level(&current, step, depth, &mut result.repairs)?;
            let area = net_area(next.iter().map(|(l, s)| (l, *s)));
            let has_boundary = next.iter().any(|(_, s)| *s == RingSource::Boundary);

            if !has_boundary || area <= self.settings.min_ring_area || area >= prev_area {
                if depth > 0 && halvings < self.settings.finishing_subdivisions {
                    halvings += 1;
                    step /= 2.0;
                    debug!("Level {} empty, retrying with step {:.4}", depth, step);
                    continue;
                }
                break;
            }

            let first_ring = result.rings.len();
            for (path, source) in &next {
                let parent = if depth == 0 {
                    None
                } else {
                    nearest_parent(&result.rings[prev_first_ring..first_ring], path, *source)
                };
                result.rings.push(OffsetRing {
                    index: result.rings.len(),
                    depth,
                    source: *source,
                    parent,
                    path: path.clone(),
                });
            }
            debug!(
                "Level {}: {} rings, area {:.3}mm^2",
                depth,
                next.len(),
                area
            );

            prev_first_ring = first_ring;
            prev_area = area;
            current = next;
            result.levels += 1;
            if depth == 0 {
                step = full_step;
            }
        }

        if result.rings.is_empty() {
            return Err(OffsetExhaustedError {
                tool_diameter,
                margin,
            }
            .into());
        }
        info!(
            "Offset complete: {} rings over {} levels, {} repairs",
            result.rings.len(),
            result.levels,
            result.repairs.len()
        );
        Ok(result)
    }

    /// Shrinks the current loops by `step` and repairs the output.
    fn offset_level(
        &self,
        current: &[(Loop, RingSource)],
        step: f64,
        depth: usize,
        repairs: &mut Vec<RepairNotice>,
    ) -> Result<Vec<(Loop, RingSource)>> {
        let plines: Vec<Polyline> = current
            .iter()
            .map(|(l, source)| to_polyline(&l.with_orientation(source.orientation())))
            .collect();
        let shape = Shape::from_plines(plines);
        let offset = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            shape.parallel_offset(step, ShapeOffsetOptions::default())
        }));
        let offset = match offset {
            Ok(offset) => offset,
            Err(_) => {
                warn!("Panic during shape offset at level {}", depth);
                return Ok(Vec::new());
            }
        };

        let policy = self.settings.repair_policy();
        let mut out = Vec::new();
        let groups = [
            (&offset.ccw_plines, RingSource::Boundary),
            (&offset.cw_plines, RingSource::Island),
        ];
        for (plines, source) in groups {
            for indexed in plines.iter() {
                let flat = flatten_polyline(&indexed.polyline, self.settings.chord_tolerance)
                    .cleaned(1e-6);
                if flat.len() < 3 || flat.area() < self.settings.min_ring_area {
                    continue;
                }
                let pieces = policy.apply(
                    &flat,
                    source.orientation(),
                    source,
                    Some(depth),
                    repairs,
                )?;
                for piece in pieces {
                    let crossings = piece.self_intersections().len();
                    if crossings > 0 {
                        return Err(Error::Geometry(GeometryError::SelfIntersecting {
                            ring_index: depth,
                            crossings,
                        }));
                    }
                    if piece.area() >= self.settings.min_ring_area {
                        out.push((piece, source));
                    }
                }
            }
        }
        Ok(out)
    }

    /// Computes rings for several regions in parallel, keeping region order.
    ///
    /// Regions too small for the tool are skipped; the call fails only if
    /// every region is exhausted.
    pub fn compute_regions(
        &self,
        regions: &[PocketRegion],
        tool_diameter: f64,
        stepover: f64,
        margin: f64,
    ) -> Result<Vec<RegionRings>> {
        let results: Vec<Result<OffsetResult>> = regions
            .par_iter()
            .map(|region| {
                self.compute(
                    &region.boundary,
                    &region.islands,
                    tool_diameter,
                    stepover,
                    margin,
                )
            })
            .collect();

        let mut out = Vec::new();
        for (region_index, (region, result)) in regions.iter().zip(results).enumerate() {
            match result {
                Ok(result) => out.push(RegionRings {
                    region_index,
                    bounds: region.bounds,
                    result,
                }),
                Err(Error::OffsetExhausted(e)) => {
                    warn!("Region {} skipped: {}", region_index, e);
                }
                Err(e) => return Err(e),
            }
        }
        if out.is_empty() {
            return Err(OffsetExhaustedError {
                tool_diameter,
                margin,
            }
            .into());
        }
        Ok(out)
    }
}

/// Ring of the previous level closest to `path`, preferring the same source.
fn nearest_parent(previous: &[OffsetRing], path: &Loop, source: RingSource) -> Option<usize> {
    let probe = path.points.first()?;
    let pick = |same_source: bool| {
        previous
            .iter()
            .filter(|r| !same_source || r.source == source)
            .map(|r| (r.index, r.path.distance_to_point(probe)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(index, _)| index)
    };
    pick(true).or_else(|| pick(false))
}
