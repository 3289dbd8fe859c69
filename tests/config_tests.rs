// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use camera_filter::{AppError, Config, FilterKind, SensorRotation};

fn temp_config_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("camera-filter-test-{}-{}", name, std::process::id()))
        .join("config.json")
}

#[test]
fn test_config_default() {
    // Test that default config can be created and is valid
    let config = Config::default();
    assert!(config.validate().is_ok());

    assert_eq!(config.default_filter, FilterKind::Identity);
    assert_eq!((config.width, config.height), (640, 480));
    assert_eq!(config.sensor_rotation, 90);
    assert_eq!(config.buffer_pool_size, 3);
    assert_eq!(config.sepia_tint_weight, 0.0);
    assert!(!config.mirror_preview);
}

#[test]
fn test_default_orientation_is_rotate90() {
    let settings = Config::default().analyzer_settings().unwrap();
    assert_eq!(settings.orientation.rotation, SensorRotation::Rotate90);
    assert!(!settings.orientation.mirror);
}

#[test]
fn test_validate_rejects_bad_rotation() {
    let config = Config {
        sensor_rotation: 45,
        ..Config::default()
    };
    assert!(matches!(config.validate(), Err(AppError::Config(_))));
}

#[test]
fn test_validate_rejects_out_of_range_filter_tuning() {
    let tint = Config {
        sepia_tint_weight: 1.5,
        ..Config::default()
    };
    assert!(tint.validate().is_err());

    let mut flat_vintage = Config::default();
    flat_vintage.vintage.fade = 0.0;
    flat_vintage.vintage.vignette_strength = 0.0;
    assert!(flat_vintage.validate().is_err());

    let nan = Config {
        sepia_tint_weight: f32::NAN,
        ..Config::default()
    };
    assert!(nan.validate().is_err());
}

#[test]
fn test_validate_rejects_odd_resolution_and_empty_pool() {
    let odd = Config {
        width: 641,
        ..Config::default()
    };
    assert!(odd.validate().is_err());

    let no_pool = Config {
        buffer_pool_size: 0,
        ..Config::default()
    };
    assert!(no_pool.validate().is_err());
}

#[test]
fn test_partial_json_uses_defaults() {
    let config: Config = serde_json::from_str(r#"{ "default_filter": "sepia", "mirror_preview": true }"#).unwrap();
    assert_eq!(config.default_filter, FilterKind::Sepia);
    assert!(config.mirror_preview);
    assert_eq!(config.framerate, Config::default().framerate);
    assert_eq!(config.vintage, Config::default().vintage);
}

#[test]
fn test_save_and_load_round_trip() {
    let path = temp_config_path("round-trip");
    let config = Config {
        default_filter: FilterKind::Vintage,
        sensor_rotation: 270,
        thumbnail_max_edge: Some(120),
        ..Config::default()
    };

    config.save_to(&path).unwrap();
    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_missing_file_yields_defaults() {
    let path = temp_config_path("missing");
    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn test_invalid_file_is_config_error() {
    let path = temp_config_path("invalid");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{ "sensor_rotation": 30 }"#).unwrap();

    assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));

    std::fs::write(&path, "not json").unwrap();
    assert!(matches!(Config::load_from(&path), Err(AppError::Config(_))));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_unreadable_path_is_config_error() {
    // A directory exists at the config path, so the read fails without NotFound
    let path = temp_config_path("unreadable");
    std::fs::create_dir_all(&path).unwrap();

    match Config::load_from(&path) {
        Err(AppError::Config(msg)) => assert!(msg.contains("Failed to read")),
        other => panic!("expected config error, got {:?}", other),
    }

    // Parent directory cannot be created under a regular file
    let blocked = path.join("blocker");
    std::fs::write(&blocked, "").unwrap();
    let result = Config::default().save_to(&blocked.join("config.json"));
    assert!(matches!(result, Err(AppError::Config(_))));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
