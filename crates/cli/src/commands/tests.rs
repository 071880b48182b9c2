use super::*;
use lectern_media_engine::PlaybackMode;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const CATALOG: &str = r#"[
    {
        "title": "The Canterville Ghost",
        "author": "Oscar Wilde",
        "imageURL": "canterville.jpg",
        "audioURL": "canterville.mp3",
        "duration": 40,
        "segmentSeconds": [[0, 10], [10, 25], [25, 40]],
        "transcript": "When Mr. Hiram B. Otis...",
        "sections": [
            { "start_time": 0, "end_time": 20, "image_url": "1.png" }
        ]
    }
]"#;

fn catalog_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_engine_config_from_defaults() {
    let config = engine_config(&PlayerConfig::default()).unwrap();

    assert_eq!(config.speed.value(), 1.0);
    assert_eq!(config.pause.secs(), 0.0);
    assert_eq!(config.progress_interval, Duration::from_millis(100));
    assert!(config.autoplay);
    assert_eq!(config.pause.mode(), PlaybackMode::Continuous);
}

#[test]
fn test_engine_config_with_pause_is_augmented() {
    let player = PlayerConfig {
        default_pause_secs: 2.0,
        default_speed: 1.5,
        ..PlayerConfig::default()
    };
    let config = engine_config(&player).unwrap();

    assert!(config.pause.mode().is_augmented());
    assert_eq!(config.speed.value(), 1.5);
}

#[test]
fn test_engine_config_rejects_out_of_range_speed() {
    let player = PlayerConfig {
        default_speed: 7.0,
        ..PlayerConfig::default()
    };
    let err = engine_config(&player).unwrap_err();
    assert!(err.to_string().contains("Invalid player settings"));
}

#[test]
fn test_engine_config_rejects_negative_pause() {
    let player = PlayerConfig {
        default_pause_secs: -1.0,
        ..PlayerConfig::default()
    };
    assert!(engine_config(&player).is_err());
}

#[test]
fn test_load_catalog_from_file() {
    let file = catalog_file(CATALOG);
    let catalog = load_catalog(file.path()).unwrap();

    assert_eq!(catalog.len(), 1);
    let track = catalog.get(0).unwrap();
    assert_eq!(track.segment_count(), 3);
    assert_eq!(
        track_summary(0, &track),
        "[0] The Canterville Ghost by Oscar Wilde (00:40, 3 segments)"
    );
}

#[test]
fn test_load_catalog_missing_file_names_path() {
    let err = load_catalog(Path::new("/no/such/catalog.json")).unwrap_err();
    assert!(err.to_string().contains("/no/such/catalog.json"));
}

#[test]
fn test_load_catalog_bad_segment_is_error() {
    let file = catalog_file(&CATALOG.replace("[10, 25]", "[10]"));
    assert!(load_catalog(file.path()).is_err());
}

#[test]
fn test_list_tracks_handles_empty_catalog() {
    let catalog = Catalog::new(Vec::new());
    assert!(list_tracks(&catalog).is_ok());
}

#[test]
fn test_format_presets() {
    assert_eq!(format_presets(&[0.5, 1.0, 2.0], "x"), "0.5x  1x  2x");
    assert_eq!(format_presets(&[], "s"), "");
}

#[test]
fn test_init_config_writes_once() {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_directory(dir.path().to_path_buf()).unwrap();

    init_config(&manager).unwrap();
    assert!(manager.config_path().exists());

    manager
        .update(|config| config.player.default_pause_secs = 3.0)
        .unwrap();
    init_config(&manager).unwrap();
    assert_eq!(manager.load().unwrap().player.default_pause_secs, 3.0);
}

#[test]
fn test_reset_config_restores_defaults() {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_directory(dir.path().to_path_buf()).unwrap();
    manager
        .update(|config| config.player.default_speed = 2.0)
        .unwrap();

    reset_config(&manager).unwrap();

    assert_eq!(manager.load().unwrap(), Config::default());
}

#[test]
fn test_show_config_reports_without_file() {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_directory(dir.path().to_path_buf()).unwrap();
    let config = manager.load().unwrap();
    assert!(show_config(&manager, &config).is_ok());
}
