use std::f64::consts::PI;

use fretcam_visualizer::{IssueCode, Simulator};

#[test]
fn test_r_word_direction_picks_the_centre() {
    // From (0,0) to (10,0) with R10 there are two circles. G2 and G3 take
    // the minor arc on opposite sides of the chord: the max Y excursion
    // tells which centre was used.
    let sim = Simulator::default();
    let cw = sim.simulate("G1 F100\nG2 X10 Y0 R10");
    let ccw = sim.simulate("G1 F100\nG3 X10 Y0 R10");

    assert!(cw.bounds.max_y > 1.0 && cw.bounds.min_y > -1e-9);
    assert!(ccw.bounds.min_y < -1.0 && ccw.bounds.max_y < 1e-9);

    // Minor arc: 60 degrees of a radius-10 circle in both cases.
    let expected = 10.0 * PI / 3.0;
    assert!((cw.cut_distance - expected).abs() < 1e-6);
    assert!((ccw.cut_distance - expected).abs() < 1e-6);
}

#[test]
fn test_negative_r_takes_major_arc() {
    let sim = Simulator::default();
    let result = sim.simulate("G1 F100\nG2 X10 Y0 R-10");
    let expected = 10.0 * 5.0 * PI / 3.0;
    assert!((result.cut_distance - expected).abs() < 1e-6);
}

#[test]
fn test_full_circle_with_ij() {
    let sim = Simulator::default();
    let result = sim.simulate("G0 X5 Y0\nG3 X5 Y0 I-5 J0 F600");
    assert!((result.cut_distance - 10.0 * PI).abs() < 1e-9);
    assert!((result.bounds.min_x + 5.0).abs() < 0.1);
}

#[test]
fn test_helical_arc_length() {
    let sim = Simulator::default();
    let result = sim.simulate("G0 X5 Y0 Z0\nG3 X5 Y0 Z-3 I-5 J0 F600");
    let expected = (10.0 * PI).hypot(3.0);
    assert!((result.cut_distance - expected).abs() < 1e-9);
    let last = result.points.last().unwrap();
    assert!((last.z + 3.0).abs() < 1e-12);
}

#[test]
fn test_arc_in_zx_plane() {
    // G18 arcs use X/Z endpoints and I/K centre offsets.
    let sim = Simulator::default();
    let result = sim.simulate("G18\nG0 X0 Z0\nG2 X10 Z0 I5 K0 F100");
    assert!((result.cut_distance - 5.0 * PI).abs() < 1e-9);
    assert!(result.issues.is_empty());
    assert!(result.points.iter().all(|p| p.y.abs() < 1e-12));
}

#[test]
fn test_arc_in_yz_plane() {
    let sim = Simulator::default();
    let result = sim.simulate("G19\nG0 Y0 Z0\nG3 Y0 Z10 J0 K5 F100");
    assert!((result.cut_distance - 5.0 * PI).abs() < 1e-9);
    assert!(result.points.iter().all(|p| p.x.abs() < 1e-12));
}

#[test]
fn test_inch_arc_offsets_are_scaled() {
    let sim = Simulator::default();
    let result = sim.simulate("G20\nG0 X1 Y0\nG2 X2 Y0 I0.5 J0 F10");
    assert!((result.cut_distance - 0.5 * 25.4 * PI).abs() < 1e-6);
}

#[test]
fn test_radius_mismatch_is_reported() {
    let sim = Simulator::default();
    let result = sim.simulate("G0 X10 Y0\nG2 X21 Y0 I5 J0 F100");
    assert!(result
        .issues
        .iter()
        .any(|i| i.code == IssueCode::ArcRadiusMismatch && i.line == 2));
}
