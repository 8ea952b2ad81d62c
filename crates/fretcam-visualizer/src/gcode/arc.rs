//! Arc geometry in the active plane
//!
//! All functions work on 2D plane coordinates `(a, b)`; the caller maps
//! machine axes onto the plane with [`Plane::axes`](super::parser::Plane::axes).

pub use fretcam_core::sweep_angle;

/// Tolerance below which two plane points are the same point (mm).
pub const SAME_POINT_EPS: f64 = 1e-9;

/// Centre, radius and signed sweep of a planar arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGeometry {
    pub center: (f64, f64),
    pub radius: f64,
    pub start_angle: f64,
    /// Signed sweep in radians, positive counter-clockwise
    pub sweep: f64,
}

impl ArcGeometry {
    /// Builds the arc from a known centre.
    ///
    /// Coincident start and end points describe a full circle.
    pub fn from_center(start: (f64, f64), end: (f64, f64), center: (f64, f64), clockwise: bool) -> Self {
        let radius = distance(start, center);
        let start_angle = (start.1 - center.1).atan2(start.0 - center.0);
        let end_angle = (end.1 - center.1).atan2(end.0 - center.0);
        Self {
            center,
            radius,
            start_angle,
            sweep: sweep_angle(start_angle, end_angle, clockwise, distance(start, end) < 1e-7),
        }
    }

    /// Length of the planar part of the arc.
    pub fn planar_length(&self) -> f64 {
        self.radius * self.sweep.abs()
    }

    /// Length including a linear move along the axial direction.
    pub fn helical_length(&self, axial_delta: f64) -> f64 {
        self.planar_length().hypot(axial_delta)
    }

    /// Point on the arc at parameter `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> (f64, f64) {
        let angle = self.start_angle + self.sweep * t;
        (
            self.center.0 + self.radius * angle.cos(),
            self.center.1 + self.radius * angle.sin(),
        )
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Why an R-word arc has no centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadiusArcError {
    /// Start and end coincide; the centre is undetermined
    CoincidentEndpoints,
    /// The radius is shorter than half the chord
    RadiusTooSmall { radius: f64, half_chord: f64 },
}

/// Centre of an R-word arc.
///
/// Two circles of radius `|r|` pass through both endpoints. The direction
/// picks one: a positive radius selects the minor arc (sweep <= 180 degrees)
/// and a negative radius the major arc. For a minor counter-clockwise arc
/// the centre lies left of the chord; clockwise puts it on the right.
/// `tolerance` absorbs rounding when the radius is almost exactly half the
/// chord.
pub fn center_from_radius(
    start: (f64, f64),
    end: (f64, f64),
    r: f64,
    clockwise: bool,
    tolerance: f64,
) -> Result<(f64, f64), RadiusArcError> {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let chord = dx.hypot(dy);
    if chord < SAME_POINT_EPS {
        return Err(RadiusArcError::CoincidentEndpoints);
    }
    let half_chord = chord / 2.0;
    let radius = r.abs();
    if radius < half_chord - tolerance || radius == 0.0 {
        return Err(RadiusArcError::RadiusTooSmall { radius, half_chord });
    }
    let h = (radius * radius - half_chord * half_chord).max(0.0).sqrt();

    let mid = (start.0 + dx / 2.0, start.1 + dy / 2.0);
    let normal = (-dy / chord, dx / chord);
    let mut sign = if clockwise { -1.0 } else { 1.0 };
    if r < 0.0 {
        sign = -sign;
    }
    Ok((mid.0 + sign * h * normal.0, mid.1 + sign * h * normal.1))
}
