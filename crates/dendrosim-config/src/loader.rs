// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, DendrosimConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File searched for when no path is given
pub const CONFIG_FILE_NAME: &str = "dendrosim.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "DENDROSIM_CONFIG_PATH";

/// Environment variables and the `section.key` each one overrides
const ENV_OVERRIDES: [(&str, &str); 9] = [
    ("DENDROSIM_DT", "simulation.dt"),
    ("DENDROSIM_T_STOP", "simulation.t_stop"),
    ("DENDROSIM_CELSIUS", "simulation.celsius"),
    ("DENDROSIM_V_INIT", "simulation.v_init"),
    ("DENDROSIM_PARALLEL", "simulation.parallel_cells"),
    ("DENDROSIM_RECORD_INTERVAL", "recording.interval"),
    ("DENDROSIM_THRESHOLD", "detection.default_threshold"),
    ("DENDROSIM_REFRACTORY", "detection.refractory"),
    ("DENDROSIM_LOG_LEVEL", "logging.level"),
];

/// Find the dendrosim configuration file
///
/// Search order:
/// 1. `DENDROSIM_CONFIG_PATH` environment variable
/// 2. Current working directory: `./dendrosim.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(path) = search_paths.iter().find(|p| p.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet {} to specify a custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional `section.key` → value overrides
///
/// # Errors
///
/// Returns error if the file is missing or malformed, or a CLI override names
/// an unknown key or carries an unparsable value
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<DendrosimConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: DendrosimConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `DENDROSIM_DT` -> `simulation.dt`
/// - `DENDROSIM_T_STOP` -> `simulation.t_stop`
/// - `DENDROSIM_CELSIUS` -> `simulation.celsius`
/// - `DENDROSIM_V_INIT` -> `simulation.v_init`
/// - `DENDROSIM_PARALLEL` -> `simulation.parallel_cells`
/// - `DENDROSIM_RECORD_INTERVAL` -> `recording.interval`
/// - `DENDROSIM_THRESHOLD` -> `detection.default_threshold`
/// - `DENDROSIM_REFRACTORY` -> `detection.refractory`
/// - `DENDROSIM_LOG_LEVEL` -> `logging.level`
///
/// Values that do not parse are ignored.
pub fn apply_environment_overrides(config: &mut DendrosimConfig) {
    for (var, key) in ENV_OVERRIDES {
        if let Ok(value) = env::var(var) {
            let _ = set_value(config, key, &value);
        }
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Map of `section.key` to value (e.g. `{"simulation.dt": "0.01"}`)
///
/// # Errors
///
/// Unknown keys and unparsable values are rejected
pub fn apply_cli_overrides(
    config: &mut DendrosimConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    // Sorted so the first reported error does not depend on hash order
    let mut keys: Vec<&String> = cli_args.keys().collect();
    keys.sort();
    for key in keys {
        set_value(config, key, &cli_args[key])?;
    }
    Ok(())
}

/// Split a `section.key=value` argument
pub fn parse_override(arg: &str) -> ConfigResult<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ConfigError::InvalidValue(format!(
            "override '{}' is not of the form section.key=value",
            arg
        ))),
    }
}

fn set_value(config: &mut DendrosimConfig, key: &str, value: &str) -> ConfigResult<()> {
    match key {
        "simulation.dt" => config.simulation.dt = parse_number(key, value)?,
        "simulation.t_stop" => config.simulation.t_stop = parse_number(key, value)?,
        "simulation.celsius" => config.simulation.celsius = parse_number(key, value)?,
        "simulation.v_init" => config.simulation.v_init = parse_number(key, value)?,
        "simulation.parallel_cells" => config.simulation.parallel_cells = parse_bool(key, value)?,
        "recording.interval" => config.recording.interval = parse_number(key, value)?,
        "detection.default_threshold" => {
            config.detection.default_threshold = parse_number(key, value)?
        }
        "detection.refractory" => config.detection.refractory = parse_number(key, value)?,
        "logging.level" => config.logging.level = value.to_lowercase(),
        "logging.progress_interval" => {
            config.logging.progress_interval = parse_number(key, value)?
        }
        _ => {
            return Err(ConfigError::InvalidValue(format!(
                "unknown configuration key '{}'",
                key
            )))
        }
    }
    Ok(())
}

fn parse_number(key: &str, value: &str) -> ConfigResult<f64> {
    value.parse::<f64>().map_err(|_| {
        ConfigError::InvalidValue(format!("{} expects a number (got '{}')", key, value))
    })
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue(format!(
            "{} expects true or false (got '{}')",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_missing_env_path_is_not_found() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        env::set_var(CONFIG_PATH_ENV, dir.path().join("absent.toml"));
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let saved_dt = env::var("DENDROSIM_DT").ok();
        env::remove_var("DENDROSIM_DT");
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "dt = 0.05").unwrap();
        writeln!(file, "[recording]").unwrap();
        writeln!(file, "interval = 0.5").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.simulation.dt, 0.05);
        assert_eq!(config.recording.interval, 0.5);
        assert_eq!(config.simulation.v_init, -65.0);

        if let Some(value) = saved_dt {
            env::set_var("DENDROSIM_DT", value);
        }
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[simulation\ndt = ").unwrap();
        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = DendrosimConfig::default();

        env::set_var("DENDROSIM_CELSIUS", "36");
        env::set_var("DENDROSIM_PARALLEL", "no");
        env::set_var("DENDROSIM_T_STOP", "not-a-number");

        apply_environment_overrides(&mut config);

        env::remove_var("DENDROSIM_CELSIUS");
        env::remove_var("DENDROSIM_PARALLEL");
        env::remove_var("DENDROSIM_T_STOP");

        assert_eq!(config.simulation.celsius, 36.0);
        assert!(!config.simulation.parallel_cells);
        assert_eq!(config.simulation.t_stop, 50.0);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = DendrosimConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("simulation.t_stop".to_string(), "100".to_string());
        cli_args.insert("logging.level".to_string(), "DEBUG".to_string());

        apply_cli_overrides(&mut config, &cli_args).unwrap();

        assert_eq!(config.simulation.t_stop, 100.0);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_rejects_unknown_key_and_bad_value() {
        let mut config = DendrosimConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("simulation.speed".to_string(), "1".to_string());
        assert!(matches!(
            apply_cli_overrides(&mut config, &cli_args),
            Err(ConfigError::InvalidValue(_))
        ));

        let mut cli_args = HashMap::new();
        cli_args.insert("simulation.dt".to_string(), "fast".to_string());
        assert!(apply_cli_overrides(&mut config, &cli_args).is_err());
        assert_eq!(config.simulation.dt, 0.025);
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("simulation.dt = 0.01").unwrap(),
            ("simulation.dt".to_string(), "0.01".to_string())
        );
        assert!(parse_override("simulation.dt").is_err());
        assert!(parse_override("=3").is_err());
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "t_stop = 10.0").unwrap();
        writeln!(file, "v_init = -70.0").unwrap();

        env::set_var("DENDROSIM_T_STOP", "20");
        env::set_var("DENDROSIM_V_INIT", "-60");

        let mut cli_args = HashMap::new();
        cli_args.insert("simulation.t_stop".to_string(), "30".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args));

        env::remove_var("DENDROSIM_T_STOP");
        env::remove_var("DENDROSIM_V_INIT");

        // CLI wins for t_stop, env wins for v_init (no CLI override)
        let config = config.unwrap();
        assert_eq!(config.simulation.t_stop, 30.0);
        assert_eq!(config.simulation.v_init, -60.0);
    }
}
