// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that values are physically meaningful and consistent with each
//! other. All problems are collected and reported together.

use crate::{ConfigError, ConfigResult, DendrosimConfig};

/// Accepted values of `logging.level`
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    OutOfRange { field: String, value: f64, expected: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                expected,
            } => write!(f, "{} = {} must be {}", field, value, expected),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &DendrosimConfig) -> ConfigResult<()> {
    let errors = collect_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

/// Every problem in `config`, in table order
pub fn collect_errors(config: &DendrosimConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_simulation(config, &mut errors);
    validate_recording(config, &mut errors);
    validate_detection(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

fn out_of_range(field: &str, value: f64, expected: &str) -> ConfigValidationError {
    ConfigValidationError::OutOfRange {
        field: field.to_string(),
        value,
        expected: expected.to_string(),
    }
}

fn validate_simulation(config: &DendrosimConfig, errors: &mut Vec<ConfigValidationError>) {
    let sim = &config.simulation;
    if !(sim.dt.is_finite() && sim.dt > 0.0) {
        errors.push(out_of_range("simulation.dt", sim.dt, "> 0"));
    }
    if !(sim.t_stop.is_finite() && sim.t_stop >= 0.0) {
        errors.push(out_of_range("simulation.t_stop", sim.t_stop, ">= 0"));
    }
    if !(sim.celsius.is_finite() && sim.celsius > -273.15) {
        errors.push(out_of_range(
            "simulation.celsius",
            sim.celsius,
            "above absolute zero",
        ));
    }
    if !sim.v_init.is_finite() {
        errors.push(out_of_range("simulation.v_init", sim.v_init, "finite"));
    }
}

fn validate_recording(config: &DendrosimConfig, errors: &mut Vec<ConfigValidationError>) {
    let interval = config.recording.interval;
    if !(interval.is_finite() && interval >= 0.0) {
        errors.push(out_of_range("recording.interval", interval, ">= 0"));
    } else if interval > 0.0 && interval < config.simulation.dt {
        errors.push(ConfigValidationError::InvalidValue {
            field: "recording.interval".to_string(),
            reason: format!(
                "{} ms is shorter than simulation.dt ({} ms); use 0 to record every step",
                interval, config.simulation.dt
            ),
        });
    }
}

fn validate_detection(config: &DendrosimConfig, errors: &mut Vec<ConfigValidationError>) {
    let det = &config.detection;
    if !det.default_threshold.is_finite() {
        errors.push(out_of_range(
            "detection.default_threshold",
            det.default_threshold,
            "finite",
        ));
    }
    if !(det.refractory.is_finite() && det.refractory >= 0.0) {
        errors.push(out_of_range("detection.refractory", det.refractory, ">= 0"));
    }
}

fn validate_logging(config: &DendrosimConfig, errors: &mut Vec<ConfigValidationError>) {
    let logging = &config.logging;
    if !LOG_LEVELS.contains(&logging.level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }
    if !(logging.progress_interval.is_finite() && logging.progress_interval >= 0.0) {
        errors.push(out_of_range(
            "logging.progress_interval",
            logging.progress_interval,
            ">= 0",
        ));
    }
}
