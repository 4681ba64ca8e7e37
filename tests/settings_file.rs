use visionboard::settings::AppSettings;

#[test]
fn saved_settings_load_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("visionboard_settings.cfg");

    let settings = AppSettings {
        show_grid: false,
        grid_step: 32.0,
        element_scale: 0.25,
        preview_max_edge: 256,
        export_dir: "/tmp/boards".to_string(),
        log_level: "debug".to_string(),
        ..AppSettings::default()
    };
    settings.save_to(&path).expect("save");

    assert_eq!(AppSettings::load_from(&path), settings);
}

#[test]
fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loaded = AppSettings::load_from(&dir.path().join("nope.cfg"));
    assert_eq!(loaded, AppSettings::default());
}

#[test]
fn corrupt_lines_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("settings.cfg");
    std::fs::write(&path, "show_grid=false\nthis is not a setting\ngrid_step=banana\n").expect("write");

    let loaded = AppSettings::load_from(&path);
    assert!(!loaded.show_grid);
    assert_eq!(loaded.grid_step, AppSettings::default().grid_step);
}
