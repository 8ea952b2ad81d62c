use fretcam_core::{ConfigError, Error, Loop, Point, Tool, Units};
use fretcam_designer::{
    ArcDirection, CornerMode, EmitterSettings, EngagementSettings, GcodeEmitter, OffsetEngine,
    PlannerSettings, PocketPlanner, PocketStrategy, Toolpath, ToolpathMove,
};
use fretcam_postdb::{ArcMode, FeedOverrideMode, PostProfile, ProfileRegistry};
use fretcam_visualizer::{SimulationSettings, Simulator};

/// Z moves would add travel the move list does not know about.
fn flat() -> EmitterSettings {
    EmitterSettings {
        safe_z: 0.0,
        cut_z: 0.0,
        ..Default::default()
    }
}

fn guitar_body_pocket(strategy: PocketStrategy) -> Toolpath {
    let outer = Loop::from_xy(&[
        (0.0, 0.0),
        (120.0, 0.0),
        (120.0, 40.0),
        (80.0, 40.0),
        (80.0, 70.0),
        (0.0, 70.0),
    ]);
    let island = Loop::from_xy(&[(20.0, 20.0), (20.0, 35.0), (40.0, 35.0), (40.0, 20.0)]);
    let rings = OffsetEngine::default()
        .compute(&outer, &[island], 6.0, 0.45, 0.0)
        .unwrap();
    let engagement = EngagementSettings {
        mode: CornerMode::Trochoidal,
        ..Default::default()
    };
    PocketPlanner::new(Tool::new(6.0, 0.45), PlannerSettings::default())
        .plan(&rings.rings, strategy, &engagement)
        .unwrap()
}

fn assert_close(actual: f64, expected: f64, what: &str) {
    let tolerance = 1e-3 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "{}: simulated {:.4}, planned {:.4}",
        what,
        actual,
        expected
    );
}

fn round_trip(toolpath: &Toolpath, profile: PostProfile, arc_mode: Option<ArcMode>) {
    let emitter = GcodeEmitter::new(profile, flat());
    let text = emitter
        .emit(&toolpath.moves, FeedOverrideMode::Inherit, arc_mode)
        .unwrap();
    let result = Simulator::default().simulate(&text);
    assert_close(result.cut_distance, toolpath.stats.cut_length, "cut");
    assert_close(result.rapid_distance, toolpath.stats.rapid_length, "rapid");
}

#[test]
fn spiral_distances_survive_emit_and_simulate() {
    let toolpath = guitar_body_pocket(PocketStrategy::Spiral);
    assert!(toolpath.stats.arc_moves > 0);
    round_trip(&toolpath, PostProfile::grbl(), None);
}

#[test]
fn lanes_distances_survive_emit_and_simulate() {
    let toolpath = guitar_body_pocket(PocketStrategy::Lanes);
    round_trip(&toolpath, PostProfile::grbl(), None);
}

#[test]
fn r_mode_and_split_arcs_round_trip() {
    let toolpath = guitar_body_pocket(PocketStrategy::Spiral);
    round_trip(&toolpath, PostProfile::fanuc_r(), None);
    round_trip(&toolpath, PostProfile::mach3(), None);
    round_trip(&toolpath, PostProfile::grbl(), Some(ArcMode::R));
}

#[test]
fn arc_length_matches_analytic_value() {
    let start = Point::new(10.0, 0.0);
    let moves = vec![
        ToolpathMove::rapid(Point::new(0.0, 0.0), start),
        ToolpathMove::arc(start, Point::new(20.0, 0.0), Point::new(15.0, 0.0), ArcDirection::Cw),
    ];
    let emitter = GcodeEmitter::new(PostProfile::grbl(), flat());
    let text = emitter.emit(&moves, FeedOverrideMode::Inherit, None).unwrap();
    assert!(text.contains("G02 X20.000 Y0.000 I5.000 J0.000"));
    let result = Simulator::default().simulate(&text);
    assert!((result.cut_distance - 5.0 * std::f64::consts::PI).abs() < 0.01);
}

#[test]
fn inch_output_simulates_to_the_same_millimetres() {
    let toolpath = guitar_body_pocket(PocketStrategy::Spiral);
    let settings = EmitterSettings {
        units: Units::Inch,
        ..flat()
    };
    let emitter = GcodeEmitter::new(PostProfile::grbl(), settings);
    let text = emitter
        .emit(&toolpath.moves, FeedOverrideMode::Inherit, None)
        .unwrap();
    let result = Simulator::new(SimulationSettings::default()).simulate(&text);
    // Three decimals in inches is 0.0254mm per coordinate.
    let tolerance = 0.01 * toolpath.stats.cut_length;
    assert!((result.cut_distance - toolpath.stats.cut_length).abs() < tolerance);
}

#[test]
fn unknown_profile_and_modes_are_config_errors() {
    let registry = ProfileRegistry::with_builtins();
    let err = GcodeEmitter::from_provider(&registry, "haas", flat()).unwrap_err();
    assert_eq!(err, ConfigError::UnknownProfile("haas".to_string()));

    let emitter = GcodeEmitter::from_provider(&registry, "mach3", flat()).unwrap();
    let err = emitter
        .emit(&[], FeedOverrideMode::Mcode, None)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::UnsupportedFeedOverride { .. })
    ));
}
