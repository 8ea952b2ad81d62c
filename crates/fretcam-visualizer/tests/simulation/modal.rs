use fretcam_core::Units;
use fretcam_visualizer::{
    DistanceMode, IssueCode, MotionMode, Plane, Severity, SimulationSettings, Simulator,
    SpindleState,
};

#[test]
fn test_modal_motion_carries_over() {
    let sim = Simulator::default();
    let result = sim.simulate("G1 X10 F500\nY10\nX0");
    assert!((result.cut_distance - 30.0).abs() < 1e-9);
    assert_eq!(result.final_state.motion, MotionMode::Linear);
    assert_eq!(result.points.len(), 4);
}

#[test]
fn test_omitted_axes_keep_their_value() {
    let sim = Simulator::default();
    let result = sim.simulate("G0 X5 Y6 Z7\nG1 X8 F100");
    assert_eq!(result.final_state.position, [8.0, 6.0, 7.0]);
}

#[test]
fn test_rapid_time_uses_rapid_rate() {
    let sim = Simulator::new(SimulationSettings {
        rapid_rate: 1000.0,
        ..Default::default()
    });
    let result = sim.simulate("G0 X500");
    assert!((result.rapid_time - 0.5).abs() < 1e-12);
    assert_eq!(result.feed_time, 0.0);
}

#[test]
fn test_initial_units_from_settings() {
    let sim = Simulator::new(SimulationSettings {
        initial_units: Units::Inch,
        ..Default::default()
    });
    let result = sim.simulate("G1 X2 F10");
    assert!((result.cut_distance - 50.8).abs() < 1e-9);
    // 10 in/min is 254 mm/min
    assert!((result.feed_time - 0.2).abs() < 1e-9);
}

#[test]
fn test_default_feed_is_used_and_reported() {
    let sim = Simulator::new(SimulationSettings {
        default_feed: 200.0,
        ..Default::default()
    });
    let result = sim.simulate("G1 X100\nX200");
    assert!((result.feed_time - 1.0).abs() < 1e-9);
    let defaulted: Vec<_> = result
        .issues
        .iter()
        .filter(|i| i.code == IssueCode::FeedDefaulted)
        .collect();
    assert_eq!(defaulted.len(), 1);
}

#[test]
fn test_modal_groups_recorded() {
    let sim = Simulator::default();
    let result = sim.simulate("G91 G19 M4 S9000 T3\nG40 G49 G54 G80 G94 G64");
    let state = result.final_state;
    assert_eq!(state.distance, DistanceMode::Incremental);
    assert_eq!(state.plane, Plane::YZ);
    assert_eq!(state.spindle, SpindleState::Ccw);
    assert_eq!(state.tool, 3);
    assert!(result.issues.is_empty());
}

#[test]
fn test_unknown_codes_reported_in_order() {
    let sim = Simulator::default();
    let result = sim.simulate("M3\nG1 X1 F100\nM250\nQ4\nG65 P1");
    let codes: Vec<_> = result.issues.iter().map(|i| (i.line, i.code)).collect();
    assert_eq!(
        codes,
        vec![
            (3, IssueCode::UnknownMCode),
            (4, IssueCode::UnsupportedWord),
            (5, IssueCode::UnknownGCode),
        ]
    );
    assert_eq!(result.issues[1].severity, Severity::Info);
    assert_eq!(result.issues[2].severity, Severity::Info);
}

#[test]
fn test_user_mcodes_are_accepted() {
    let sim = Simulator::default();
    let result = sim.simulate("M100 P80\nG1 X10 F100\nM100 P0");
    assert!(result.issues.is_empty());
}
