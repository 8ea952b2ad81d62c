use fretcam::api::{self, EmitOverrides, EmitRequest, PlanRequest, SimulateRequest};
use fretcam::designer::{CornerMode, PocketStrategy};
use fretcam::postdb::{FeedOverrideMode, PostProfile, ProfileRegistry};
use fretcam::{Config, Loop, Units};
use tempfile::TempDir;

fn body() -> Loop {
    Loop::from_xy(&[(0.0, 0.0), (80.0, 0.0), (80.0, 50.0), (0.0, 50.0)])
}

#[test]
fn test_plan_emit_simulate_from_saved_config() {
    let dir = TempDir::new().unwrap();

    let mut shop = PostProfile::linuxcnc();
    shop.id = "shop".to_string();
    shop.name = "Shop LinuxCNC".to_string();
    let mut table = ProfileRegistry::new();
    table.insert(shop).unwrap();
    let profiles_path = dir.path().join("profiles.json");
    table.save_to_file(&profiles_path).unwrap();

    let mut config = Config::new();
    config.post_profiles_path = Some(profiles_path);
    config.engagement.mode = CornerMode::Trochoidal;
    let config_path = dir.path().join("fretcam.toml");
    config.save_to_file(&config_path).unwrap();

    let config = Config::load_from_file(&config_path).unwrap();
    let planned = api::plan(
        &PlanRequest {
            loops: vec![body()],
            units: Units::Mm,
            tool_d: 6.0,
            stepover: 0.45,
            margin: 0.5,
            strategy: PocketStrategy::Spiral,
            corner_radius_min: Some(4.0),
            corner_mode: None,
        },
        &config,
    )
    .unwrap();
    assert!(planned.stats.relief_loops > 0);

    let profiles = config.profile_registry().unwrap();
    let emitted = api::emit(
        &EmitRequest {
            moves: planned.moves,
            units: Units::Mm,
            post_profile_id: "shop".to_string(),
            feed_override: FeedOverrideMode::Mcode,
            arc_mode: None,
            overrides: EmitOverrides {
                safe_z: Some(3.0),
                ..Default::default()
            },
        },
        &config,
        &profiles,
    )
    .unwrap();
    assert!(emitted.gcode_text.contains("Shop LinuxCNC"));
    assert!(emitted.gcode_text.lines().any(|l| l == "M100 P0"));

    let simulated = api::simulate(
        &SimulateRequest {
            gcode_text: emitted.gcode_text,
            units: Units::Mm,
            rapid_rate: None,
            default_feed: None,
        },
        &config,
    );
    assert!(simulated.cut_mm > 0.0);
    assert!(simulated.bounds.max_x <= 80.0);
}
