use std::path::Path;

use modelcanvas::CanvasConfig;
use modelcanvas_layout::{Direction, ViewMode};

#[test]
fn empty_config_uses_defaults() {
    assert_eq!(CanvasConfig::from_toml("").unwrap(), CanvasConfig::default());
}

#[test]
fn partial_tables_override_only_their_keys() {
    let config = CanvasConfig::from_toml(
        r#"
        [history]
        max_entries = 10

        [autosave]
        debounce_ms = 1000

        [layout]
        direction = "LR"

        [sizing]
        view_mode = "detailed"

        [sizing.frame]
        padding = 24.0

        [placement]
        default_center = { x = 0.0, y = 0.0 }
        "#,
    )
    .unwrap();

    assert_eq!(config.history.max_entries, 10);
    assert_eq!(config.history.debounce_ms, 300);
    assert_eq!(config.autosave.debounce_ms, 1000);
    assert_eq!(config.layout.direction, Direction::LR);
    assert_eq!(config.sizing.view_mode, ViewMode::Detailed);
    assert_eq!(config.sizing.frame.padding, 24.0);
    assert_eq!(config.sizing.frame.header_height, 40.0);
    assert_eq!(config.placement.default_center.x, 0.0);
    assert_eq!(config.placement.min_radius, 300.0);
}

#[test]
fn unknown_values_are_rejected() {
    assert!(CanvasConfig::from_toml("[layout]\ndirection = \"sideways\"").is_err());
}

#[test]
fn missing_file_is_an_error_and_no_file_is_default() {
    assert!(CanvasConfig::load(Some(Path::new("/nonexistent/canvas.toml"))).is_err());
    assert_eq!(CanvasConfig::load(None).unwrap(), CanvasConfig::default());
}
