//! Topology repair for self-intersecting loops.
//!
//! Equivalent to buffering a polygon by zero: the loop is split at every
//! self-crossing into simple lobes, lobes wound like the parent are kept and
//! inverted lobes are dropped. The change in enclosed area is reported so
//! the caller can decide whether the repair is acceptable.

use fretcam_core::{GeometryError, Loop, Orientation, Point};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::offset::RingSource;

/// Lobes smaller than this are discarded (mm^2).
pub const MIN_LOBE_AREA: f64 = 1e-6;

/// Upper bound on split operations for one loop.
const MAX_SPLITS: usize = 10_000;

/// A repair that changed a loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairNotice {
    /// Offset level; `None` for input geometry
    pub level: Option<usize>,
    pub source: RingSource,
    /// Total lobe area before the repair (mm^2)
    pub area_before: f64,
    /// Area of the kept lobes (mm^2)
    pub area_after: f64,
    /// Relative area change, `|before - after| / before`
    pub area_delta: f64,
    pub exceeds_tolerance: bool,
}

/// Outcome of repairing one loop
#[derive(Debug, Clone, PartialEq)]
pub struct Repaired {
    /// Simple loops wound like the parent
    pub loops: Vec<Loop>,
    /// Area bookkeeping when a split happened
    pub change: Option<(f64, f64)>,
}

/// Splits a loop at its first self-crossing.
fn split_at_crossing(poly: &Loop, i: usize, j: usize, p: Point) -> (Loop, Loop) {
    // Edge i runs points[i] -> points[i+1], edge j runs points[j] -> points[j+1].
    let n = poly.points.len();
    let mut first = vec![p];
    first.extend_from_slice(&poly.points[i + 1..=j]);

    let mut second = vec![p];
    for k in (j + 1)..(n + i + 1) {
        second.push(poly.points[k % n]);
    }
    (Loop::new(first), Loop::new(second))
}

/// Splits a loop into simple lobes and keeps those wound like `orientation`.
pub fn repair_loop(poly: &Loop, orientation: Orientation) -> Repaired {
    let crossings = poly.self_intersections();
    if crossings.is_empty() {
        return Repaired {
            loops: vec![poly.clone()],
            change: None,
        };
    }

    let mut pending = vec![poly.clone()];
    let mut simple = Vec::new();
    let mut splits = 0;
    while let Some(current) = pending.pop() {
        let hit = current.self_intersections().into_iter().next();
        match hit {
            Some((i, j, p)) if splits < MAX_SPLITS => {
                splits += 1;
                let (a, b) = split_at_crossing(&current, i, j, p);
                pending.push(a.cleaned(1e-9));
                pending.push(b.cleaned(1e-9));
            }
            Some(_) => {
                warn!("Repair split budget exhausted, dropping remaining lobe");
            }
            None => simple.push(current),
        }
    }

    let area_before: f64 = simple.iter().map(|l| l.area()).sum();
    let kept: Vec<Loop> = simple
        .into_iter()
        .filter(|l| l.len() >= 3 && l.area() > MIN_LOBE_AREA && l.orientation() == orientation)
        .collect();
    let area_after: f64 = kept.iter().map(|l| l.area()).sum();
    debug!(
        "Repaired loop with {} crossings into {} lobes, area {:.4} -> {:.4}",
        crossings.len(),
        kept.len(),
        area_before,
        area_after
    );

    Repaired {
        loops: kept,
        change: Some((area_before, area_after)),
    }
}

/// Repair policy applied to every loop the offset engine produces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepairPolicy {
    /// Relative area change above which a notice is flagged
    pub area_tolerance: f64,
    /// Turn flagged notices into errors
    pub reject_above_tolerance: bool,
}

impl RepairPolicy {
    /// Repairs `poly` and records a notice when the loop changed.
    pub fn apply(
        &self,
        poly: &Loop,
        orientation: Orientation,
        source: RingSource,
        level: Option<usize>,
        notices: &mut Vec<RepairNotice>,
    ) -> Result<Vec<Loop>, GeometryError> {
        let repaired = repair_loop(poly, orientation);
        if let Some((before, after)) = repaired.change {
            let area_delta = if before > 0.0 {
                (before - after).abs() / before
            } else {
                0.0
            };
            let exceeds_tolerance = area_delta > self.area_tolerance;
            if exceeds_tolerance {
                warn!(
                    "Repair at level {:?} changed area by {:.2}%",
                    level,
                    area_delta * 100.0
                );
                if self.reject_above_tolerance {
                    return Err(GeometryError::RepairRejected {
                        level: level.unwrap_or(0),
                        delta_percent: area_delta * 100.0,
                        limit_percent: self.area_tolerance * 100.0,
                    });
                }
            }
            notices.push(RepairNotice {
                level,
                source,
                area_before: before,
                area_after: after,
                area_delta,
                exceeds_tolerance,
            });
        }
        Ok(repaired.loops)
    }
}
