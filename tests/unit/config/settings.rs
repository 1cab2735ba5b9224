use super::*;

#[test]
fn defaults_match_persisted_profile() {
    let cfg = Configuration::default();
    assert_eq!(cfg.primary_color, Argb(0xFF1D_0130));
    assert_eq!(cfg.secondary_color, Some(Argb(0xFFFC_056C)));
    assert_eq!((cfg.start_x_pct, cfg.start_y_pct), (50, 60));
    assert_eq!((cfg.end_x_pct, cfg.end_y_pct), (100, 100));
    assert_eq!(cfg.fps, 60);
    assert_eq!(cfg.loop_seconds, 1);
    assert_eq!((cfg.scale_factor, cfg.tiling_factor), (2, 2));
    assert_eq!((cfg.min_noise_brightness, cfg.max_noise_brightness), (1, 23));
    assert_eq!(cfg.blend_mode, BlendMode::Screen);
    assert!(!cfg.rotation_support);
}

#[test]
fn missing_keys_take_defaults() {
    let cfg = Configuration::from_json_str(r##"{ "fps": 24, "blend_mode": "multiply" }"##).unwrap();
    assert_eq!(cfg.fps, 24);
    assert_eq!(cfg.blend_mode, BlendMode::Multiply);
    assert_eq!(cfg.loop_seconds, 1);
    assert_eq!(cfg.secondary_color, Some(DEFAULT_SECONDARY_COLOR));
}

#[test]
fn explicit_null_secondary_colour_disables_gradient() {
    let cfg = Configuration::from_json_str(r#"{ "wallpaper_color_2": null }"#).unwrap();
    assert_eq!(cfg.secondary_color, None);
}

#[test]
fn out_of_range_values_are_clamped() {
    let cfg = Configuration::from_json_str(
        r#"{
            "start_x_pct": 140, "fps": 0, "loop_seconds": 99,
            "scale_factor": 0, "tiling_factor": 12,
            "min_noise_brightness": 0, "max_noise_brightness": 999
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.start_x_pct, 100);
    assert_eq!(cfg.fps, 1);
    assert_eq!(cfg.loop_seconds, 10);
    assert_eq!(cfg.scale_factor, 1);
    assert_eq!(cfg.tiling_factor, 8);
    assert_eq!(cfg.min_noise_brightness, 1);
    assert_eq!(cfg.max_noise_brightness, 256);
}

#[test]
fn negative_and_oversized_integers_are_clamped() {
    let cfg = Configuration::from_json_str(
        r#"{
            "fps": -5, "scale_factor": 99, "min_noise_brightness": -3,
            "end_y_pct": -40, "loop_seconds": 9000000000
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.fps, 1);
    assert_eq!(cfg.scale_factor, 8);
    assert_eq!(cfg.min_noise_brightness, 1);
    assert_eq!(cfg.max_noise_brightness, 23);
    assert_eq!(cfg.end_y_pct, 0);
    assert_eq!(cfg.loop_seconds, 10);
}

#[test]
fn non_integer_range_values_are_still_rejected() {
    let err = Configuration::from_json_str(r#"{"fps": "fast"}"#).unwrap_err();
    assert!(matches!(err, NoiseError::Validation(_)));
}

#[test]
fn inverted_brightness_range_is_reordered() {
    let cfg = Configuration {
        min_noise_brightness: 200,
        max_noise_brightness: 10,
        ..Configuration::default()
    }
    .clamped();
    assert_eq!((cfg.min_noise_brightness, cfg.max_noise_brightness), (10, 200));
}

#[test]
fn unknown_blend_mode_is_a_validation_error() {
    let err = Configuration::from_json_str(r#"{ "blend_mode": "HUE" }"#).unwrap_err();
    assert!(matches!(err, NoiseError::Validation(_)));
}

#[test]
fn json_round_trip_preserves_snapshot() {
    let cfg = Configuration {
        secondary_color: None,
        rotation_support: true,
        blend_mode: BlendMode::Overlay,
        ..Configuration::default()
    };
    let json = cfg.to_json_pretty().unwrap();
    assert!(json.contains("\"wallpaper_color\""));
    assert_eq!(Configuration::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn frame_count_and_interval_follow_fps() {
    let cfg = Configuration {
        fps: 24,
        loop_seconds: 5,
        ..Configuration::default()
    };
    assert_eq!(cfg.total_frames(), 120);
    let ms = cfg.frame_interval().as_secs_f64() * 1000.0;
    assert!((ms - 41.667).abs() < 0.01, "interval = {ms}ms");
}

#[test]
fn parameter_groups_isolate_their_fields() {
    let base = Configuration::default();
    let recoloured = Configuration {
        primary_color: Argb(0xFF00_0000),
        blend_mode: BlendMode::Darken,
        ..base.clone()
    };
    assert_eq!(base.noise_params(), recoloured.noise_params());
    assert_ne!(base.gradient_params(), recoloured.gradient_params());

    let faster = Configuration {
        fps: 30,
        ..base.clone()
    };
    assert_ne!(base.noise_params(), faster.noise_params());
    assert_eq!(base.gradient_params(), faster.gradient_params());
}

#[test]
fn config_keys_parse_from_store_names() {
    for key in ConfigKey::ALL {
        assert_eq!(key.as_str().parse::<ConfigKey>().unwrap(), key);
    }
    assert!("colour".parse::<ConfigKey>().is_err());
}
