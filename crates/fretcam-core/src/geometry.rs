//! Planar geometry primitives
//!
//! Loops are ordered point lists that close implicitly (the last point
//! connects back to the first). Signed area is positive for
//! counter-clockwise loops.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Distance below which two consecutive vertices are treated as one.
pub const DUPLICATE_TOLERANCE: f64 = 1e-6;

/// Smallest enclosed area accepted for a loop (mm^2).
pub const MIN_LOOP_AREA: f64 = 1e-9;

/// A 2D point in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Linear interpolation towards `other` at parameter `t`.
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Returns true if both coordinates are within `tolerance`.
    pub fn approx_eq(&self, other: &Point, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

/// Winding direction of a loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
}

impl Orientation {
    pub fn reversed(self) -> Self {
        match self {
            Orientation::Clockwise => Orientation::CounterClockwise,
            Orientation::CounterClockwise => Orientation::Clockwise,
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bounds {
    /// An empty box that any included point will replace.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Grows the box to include a point.
    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Grows the box to include another box.
    pub fn union(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.include(other.min_x, other.min_y);
        self.include(other.max_x, other.max_y);
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }

    /// Returns true if `other` lies entirely inside this box.
    pub fn contains_bounds(&self, other: &Bounds) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }
}

/// A closed polygon given as an ordered list of vertices
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Loop {
    pub points: Vec<Point>,
}

impl Loop {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Builds a loop from `(x, y)` pairs.
    pub fn from_xy(coords: &[(f64, f64)]) -> Self {
        Self::new(coords.iter().map(|&p| Point::from(p)).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates over the closed edge list, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Shoelace area, positive for counter-clockwise winding.
    pub fn signed_area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        self.edges()
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum::<f64>()
            / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn orientation(&self) -> Orientation {
        if self.signed_area() >= 0.0 {
            Orientation::CounterClockwise
        } else {
            Orientation::Clockwise
        }
    }

    /// Total edge length including the closing edge.
    pub fn perimeter(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.edges().map(|(a, b)| a.distance_to(&b)).sum()
    }

    pub fn reversed(&self) -> Loop {
        let mut points = self.points.clone();
        points.reverse();
        Loop::new(points)
    }

    /// Returns a copy wound in the requested direction.
    pub fn with_orientation(&self, orientation: Orientation) -> Loop {
        if self.orientation() == orientation {
            self.clone()
        } else {
            self.reversed()
        }
    }

    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        for p in &self.points {
            bounds.include(p.x, p.y);
        }
        bounds
    }

    /// Even-odd point containment test.
    pub fn contains(&self, point: &Point) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.y > point.y) != (b.y > point.y) {
                let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if point.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Shortest distance from a point to the loop outline.
    pub fn distance_to_point(&self, point: &Point) -> f64 {
        self.edges()
            .map(|(a, b)| point_segment_distance(point, &a, &b))
            .fold(f64::INFINITY, f64::min)
    }

    /// Removes consecutive duplicate vertices and a repeated closing vertex.
    pub fn cleaned(&self, tolerance: f64) -> Loop {
        let mut points: Vec<Point> = Vec::with_capacity(self.points.len());
        for p in &self.points {
            match points.last() {
                Some(last) if last.distance_to(p) <= tolerance => {}
                _ => points.push(*p),
            }
        }
        while points.len() > 1 {
            let first = points[0];
            match points.last() {
                Some(last) if last.distance_to(&first) <= tolerance => {
                    points.pop();
                }
                _ => break,
            }
        }
        Loop::new(points)
    }

    /// Cleans the loop and checks it is usable as machining geometry.
    pub fn validated(&self, loop_index: usize) -> Result<Loop, GeometryError> {
        if self.points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(GeometryError::Degenerate {
                loop_index,
                reason: "non-finite coordinate".to_string(),
            });
        }
        let cleaned = self.cleaned(DUPLICATE_TOLERANCE);
        if cleaned.len() < 3 {
            return Err(GeometryError::Degenerate {
                loop_index,
                reason: format!("{} distinct points, need at least 3", cleaned.len()),
            });
        }
        if cleaned.area() <= MIN_LOOP_AREA {
            return Err(GeometryError::ZeroArea { loop_index });
        }
        Ok(cleaned)
    }

    /// All proper crossings between non-adjacent edges.
    ///
    /// Each entry is `(edge_a, edge_b, crossing_point)` with `edge_a < edge_b`.
    pub fn self_intersections(&self) -> Vec<(usize, usize, Point)> {
        let n = self.points.len();
        let mut hits = Vec::new();
        if n < 4 {
            return hits;
        }
        for i in 0..n {
            let a1 = self.points[i];
            let a2 = self.points[(i + 1) % n];
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                let b1 = self.points[j];
                let b2 = self.points[(j + 1) % n];
                if let Some(p) = segment_intersection(&a1, &a2, &b1, &b2) {
                    hits.push((i, j, p));
                }
            }
        }
        hits
    }

    pub fn is_self_intersecting(&self) -> bool {
        !self.self_intersections().is_empty()
    }

    /// Index of the vertex nearest to `point`; ties resolve to the lowest index.
    pub fn nearest_vertex(&self, point: &Point) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, p) in self.points.iter().enumerate() {
            let d = p.distance_to(point);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((i, d)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Returns a copy that starts at vertex `start`, keeping the winding.
    pub fn rotated_to_start(&self, start: usize) -> Loop {
        if self.points.is_empty() {
            return self.clone();
        }
        let start = start % self.points.len();
        let mut points = Vec::with_capacity(self.points.len());
        points.extend_from_slice(&self.points[start..]);
        points.extend_from_slice(&self.points[..start]);
        Loop::new(points)
    }
}

/// Proper intersection point of segments `a1-a2` and `b1-b2`.
///
/// Touching endpoints and collinear overlaps are not reported.
pub fn segment_intersection(a1: &Point, a2: &Point, b1: &Point, b2: &Point) -> Option<Point> {
    let d1x = a2.x - a1.x;
    let d1y = a2.y - a1.y;
    let d2x = b2.x - b1.x;
    let d2y = b2.y - b1.y;
    let denom = d1x * d2y - d1y * d2x;
    if denom.abs() < 1e-12 {
        return None;
    }
    let t = ((b1.x - a1.x) * d2y - (b1.y - a1.y) * d2x) / denom;
    let u = ((b1.x - a1.x) * d1y - (b1.y - a1.y) * d1x) / denom;
    const EPS: f64 = 1e-9;
    if t > EPS && t < 1.0 - EPS && u > EPS && u < 1.0 - EPS {
        Some(Point::new(a1.x + t * d1x, a1.y + t * d1y))
    } else {
        None
    }
}

/// Distance from `p` to the segment `a-b`.
pub fn point_segment_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq < 1e-24 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}

/// Signed sweep from `start_angle` to `end_angle` in the given direction.
///
/// The result lies in `(0, 2pi]` for counter-clockwise arcs and `[-2pi, 0)`
/// for clockwise arcs, so a closed arc is a full turn, never zero.
pub fn sweep_angle(start_angle: f64, end_angle: f64, clockwise: bool, closed: bool) -> f64 {
    use std::f64::consts::TAU;
    if closed {
        return if clockwise { -TAU } else { TAU };
    }
    let mut sweep = end_angle - start_angle;
    if clockwise {
        while sweep >= 0.0 {
            sweep -= TAU;
        }
        while sweep < -TAU {
            sweep += TAU;
        }
    } else {
        while sweep <= 0.0 {
            sweep += TAU;
        }
        while sweep > TAU {
            sweep -= TAU;
        }
    }
    sweep
}

/// Signed sweep of the arc from `start` to `end` around `center`.
///
/// Coincident endpoints describe a full circle.
pub fn arc_sweep(start: &Point, end: &Point, center: &Point, clockwise: bool) -> f64 {
    let a0 = (start.y - center.y).atan2(start.x - center.x);
    let a1 = (end.y - center.y).atan2(end.x - center.x);
    sweep_angle(a0, a1, clockwise, start.distance_to(end) < 1e-7)
}

/// Radius of the circle through three points; infinite when collinear.
pub fn circumradius(a: &Point, b: &Point, c: &Point) -> f64 {
    let ab = a.distance_to(b);
    let bc = b.distance_to(c);
    let ca = c.distance_to(a);
    let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
    let twice_area = cross.abs();
    if twice_area < 1e-12 {
        return f64::INFINITY;
    }
    (ab * bc * ca) / (2.0 * twice_area)
}
