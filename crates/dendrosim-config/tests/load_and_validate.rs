// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Loading a complete `dendrosim.toml` from disk and validating it

use std::collections::HashMap;
use std::fs;

use dendrosim_config::{load_config, validate_config, ConfigError, CONFIG_FILE_NAME};
use tempfile::tempdir;

const FULL_CONFIG: &str = r#"
[simulation]
dt = 0.0125
t_stop = 30.0
celsius = 36.0
v_init = -70.0
parallel_cells = false

[recording]
interval = 0.1

[detection]
default_threshold = -20.0
refractory = 2.0

[logging]
level = "warn"
progress_interval = 5.0
"#;

#[test]
fn test_full_file_round_trips_every_table() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, FULL_CONFIG).unwrap();

    let config = load_config(Some(&path), None).unwrap();
    validate_config(&config).unwrap();

    assert_eq!(config.simulation.dt, 0.0125);
    assert!(!config.simulation.parallel_cells);
    assert_eq!(config.recording.interval, 0.1);
    assert_eq!(config.detection.default_threshold, -20.0);
    assert_eq!(config.detection.refractory, 2.0);
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.progress_interval, 5.0);
}

#[test]
fn test_cli_override_can_invalidate() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, FULL_CONFIG).unwrap();

    let mut cli = HashMap::new();
    cli.insert("recording.interval".to_string(), "0.001".to_string());
    let config = load_config(Some(&path), Some(&cli)).unwrap();

    assert!(matches!(
        validate_config(&config),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let result = load_config(Some(&dir.path().join("nope.toml")), None);
    assert!(matches!(result, Err(ConfigError::IoError(_))));
}
