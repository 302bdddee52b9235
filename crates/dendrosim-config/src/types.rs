// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to one table of `dendrosim.toml`. Every field has a
//! default, so a partial (or empty) file is valid.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DendrosimConfig {
    pub simulation: SimulationConfig,
    pub recording: RecordingConfig,
    pub detection: DetectionConfig,
    pub logging: LoggingConfig,
}

/// Integration clock and initial conditions
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Time step (ms)
    pub dt: f64,
    /// End time (ms)
    pub t_stop: f64,
    /// Temperature (°C)
    pub celsius: f64,
    /// Initial membrane potential (mV)
    pub v_init: f64,
    /// Integrate cells on the rayon pool
    pub parallel_cells: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.025,
            t_stop: 50.0,
            celsius: 6.3,
            v_init: -65.0,
            parallel_cells: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Sampling interval (ms); 0 records every step
    pub interval: f64,
}

/// Defaults for threshold sources that do not set their own
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// mV
    pub default_threshold: f64,
    /// ms; 0 = none
    pub refractory: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            default_threshold: 10.0,
            refractory: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error
    pub level: String,
    /// Simulated time between progress logs (ms); 0 disables them
    pub progress_interval: f64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            progress_interval: 0.0,
        }
    }
}
