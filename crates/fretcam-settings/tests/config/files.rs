use fretcam_core::Units;
use fretcam_designer::{CornerMode, MillingDirection};
use fretcam_settings::{Config, SettingsError};
use tempfile::TempDir;

fn customized() -> Config {
    let mut config = Config::new();
    config.tool.diameter = 3.175;
    config.offset.max_rings = 120;
    config.planner.direction = MillingDirection::Conventional;
    config.engagement.mode = CornerMode::Trochoidal;
    config.emitter.units = Units::Inch;
    config.emitter.cut_z = -2.5;
    config.simulation.arc_segments = 48;
    config
}

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fretcam.toml");
    let config = customized();

    config.save_to_file(&path).unwrap();
    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_json_round_trip_creates_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("fretcam.json");
    let config = customized();

    config.save_to_file(&path).unwrap();
    assert!(path.exists());
    assert_eq!(Config::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fretcam.yaml");
    assert!(matches!(
        Config::new().save_to_file(&path),
        Err(SettingsError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::LoadError(_))
    ));
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[emitter]\nsafe_z = -5.0\ncut_z = 1.0\n").unwrap();
    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::Config(_))
    ));
}

#[test]
fn test_invalid_config_not_saved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    let mut config = Config::new();
    config.offset.max_rings = 0;
    assert!(config.save_to_file(&path).is_err());
    assert!(!path.exists());
}

#[test]
fn test_load_or_default_with_explicit_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("explicit.toml");
    customized().save_to_file(&path).unwrap();
    let loaded = Config::load_or_default(Some(&path)).unwrap();
    assert_eq!(loaded.tool.diameter, 3.175);
}

#[test]
fn test_profile_file_extends_registry() {
    let dir = TempDir::new().unwrap();
    let profiles = dir.path().join("profiles.json");
    let mut grbl = fretcam_postdb::PostProfile::grbl();
    grbl.id = "shop_grbl".to_string();
    grbl.name = "Shop GRBL".to_string();
    let mut registry = fretcam_postdb::ProfileRegistry::new();
    registry.insert(grbl).unwrap();
    registry.save_to_file(&profiles).unwrap();

    let config = Config {
        post_profiles_path: Some(profiles),
        ..Config::default()
    };
    let registry = config.profile_registry().unwrap();
    assert_eq!(registry.len(), 5);
    assert!(registry.iter().any(|p| p.id == "shop_grbl"));
}
