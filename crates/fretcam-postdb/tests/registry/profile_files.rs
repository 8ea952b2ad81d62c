use fretcam_postdb::{
    ArcMode, FeedOverrideMode, McodePair, PostDbError, PostProfile, PostProfileProvider,
    ProfileRegistry,
};
use tempfile::tempdir;

fn shop_profile() -> PostProfile {
    PostProfile {
        id: "shop_router".to_string(),
        name: "Shop Router".to_string(),
        arc_mode: ArcMode::R,
        feed_override_modes_supported: vec![FeedOverrideMode::Inherit, FeedOverrideMode::Mcode],
        mcode: Some(McodePair::new(120, 121)),
        feed_scale: 0.8,
        ..Default::default()
    }
}

#[test]
fn test_json_table_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("profiles.json");

    let mut registry = ProfileRegistry::new();
    registry.insert(shop_profile()).unwrap();
    registry.save_to_file(&path).unwrap();

    let mut loaded = ProfileRegistry::with_builtins();
    let count = loaded.load_from_file(&path).unwrap();
    assert_eq!(count, 1);
    assert_eq!(loaded.len(), 5);
    assert_eq!(loaded.get_profile("shop_router").unwrap(), &shop_profile());
}

#[test]
fn test_toml_table_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("profiles.toml");

    let registry = ProfileRegistry::with_builtins();
    registry.save_to_file(&path).unwrap();

    let mut loaded = ProfileRegistry::new();
    loaded.load_from_file(&path).unwrap();
    assert_eq!(loaded.profile_ids(), registry.profile_ids());
    assert_eq!(
        loaded.get_profile("fanuc_r").unwrap(),
        &PostProfile::fanuc_r()
    );
}

#[test]
fn test_file_profile_overrides_builtin() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("override.json");
    std::fs::write(
        &path,
        r#"{ "profiles": [ { "id": "grbl", "name": "Patched GRBL", "line_numbers": true } ] }"#,
    )
    .unwrap();

    let mut registry = ProfileRegistry::with_builtins();
    registry.load_from_file(&path).unwrap();
    let grbl = registry.get_profile("grbl").unwrap();
    assert_eq!(grbl.name, "Patched GRBL");
    assert!(grbl.line_numbers);
    // Unspecified fields fall back to defaults.
    assert_eq!(grbl.arc_mode, ArcMode::Ij);
}

#[test]
fn test_unknown_selector_in_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(
        &path,
        r#"{ "profiles": [ { "id": "x", "arc_mode": "XY" } ] }"#,
    )
    .unwrap();

    let mut registry = ProfileRegistry::new();
    assert!(matches!(
        registry.load_from_file(&path),
        Err(PostDbError::SerializationError(_))
    ));
}

#[test]
fn test_unsupported_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("profiles.yaml");
    std::fs::write(&path, "profiles: []").unwrap();

    let mut registry = ProfileRegistry::new();
    assert!(matches!(
        registry.load_from_file(&path),
        Err(PostDbError::UnsupportedFormat(_))
    ));
}
