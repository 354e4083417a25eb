use super::*;

#[test]
fn defaults_match_editor_constants() {
    let cfg = StudioConfig::default();
    assert_eq!(cfg.api_base(), "https://dev.api.cre8.local");
    assert_eq!(cfg.default_width, 960);
    assert_eq!(cfg.surface_height, 640);
    assert_eq!(cfg.clear_rgba(), Rgba8::rgb(0x0b, 0x0d, 0x17));
    assert_eq!(cfg.fonts[0], "Space Grotesk");
    assert_eq!(cfg.size_options.len(), 4);
    assert_eq!(cfg.background_timeout(), Duration::from_millis(5_000));
    cfg.validate().unwrap();
}

#[test]
fn partial_json_fills_defaults() {
    let cfg: StudioConfig =
        serde_json::from_str(r#"{"api_url": "http://localhost:3000/", "surface_height": 480}"#)
            .unwrap();
    assert_eq!(cfg.api_base(), "http://localhost:3000");
    assert_eq!(cfg.surface_height, 480);
    assert_eq!(cfg.default_width, 960);
    assert!(cfg.system_fonts);

    let cfg: StudioConfig = serde_json::from_str(r#"{"system_fonts": false}"#).unwrap();
    assert!(!cfg.system_fonts);
    assert!(cfg.fonts_dir.is_none());
}

#[test]
fn from_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("studio.json");
    std::fs::write(&p, r#"{"export_multiplier": 3.0}"#).unwrap();
    let cfg = StudioConfig::from_path(&p).unwrap();
    assert_eq!(cfg.export_multiplier, 3.0);
}

#[test]
fn validate_rejects_bad_values() {
    let cfg = StudioConfig {
        surface_height: 0,
        ..StudioConfig::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = StudioConfig {
        clear_color: "black".to_owned(),
        ..StudioConfig::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = StudioConfig {
        export_multiplier: f64::NAN,
        ..StudioConfig::default()
    };
    assert!(cfg.validate().is_err());
}
