// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Run-wide numerical and detection settings

use dendrosim_neural::{Result, SimError};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Integration step (ms)
    pub dt: f64,
    /// End time (ms)
    pub t_stop: f64,
    /// Temperature (°C)
    pub celsius: f64,
    /// Initial membrane potential (mV)
    pub v_init: f64,
    /// Solve cells on the rayon pool
    pub parallel_cells: bool,
    /// Recording interval (ms); 0 records every step
    pub record_interval: f64,
    /// Threshold for detectors that do not set their own (mV)
    pub default_threshold: f64,
    /// Refractory period for detectors that do not set their own (ms)
    pub default_refractory: f64,
    /// Simulated time between progress logs (ms); 0 disables
    pub progress_interval: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            dt: 0.025,
            t_stop: 50.0,
            celsius: 6.3,
            v_init: -65.0,
            parallel_cells: true,
            record_interval: 0.0,
            default_threshold: 10.0,
            default_refractory: 0.0,
            progress_interval: 0.0,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("t_stop", self.t_stop),
            ("record_interval", self.record_interval),
            ("default_refractory", self.default_refractory),
            ("progress_interval", self.progress_interval),
        ];
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "dt must be > 0 (got {})",
                self.dt
            )));
        }
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimError::InvalidParameter(format!(
                    "{} must be >= 0 (got {})",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("celsius", self.celsius),
            ("v_init", self.v_init),
            ("default_threshold", self.default_threshold),
        ] {
            if !value.is_finite() {
                return Err(SimError::InvalidParameter(format!(
                    "{} must be finite (got {})",
                    name, value
                )));
            }
        }
        if !(0.01..=0.1).contains(&self.dt) {
            warn!(
                "[SETTINGS] dt = {} ms is outside the usual 0.01-0.1 ms range",
                self.dt
            );
        }
        Ok(())
    }

    /// Number of steps needed to reach `t_stop`
    pub fn step_count(&self) -> u64 {
        (self.t_stop / self.dt).round() as u64
    }

    /// Record every `stride` steps
    pub fn record_stride(&self) -> u64 {
        if self.record_interval <= 0.0 {
            1
        } else {
            ((self.record_interval / self.dt).round() as u64).max(1)
        }
    }

    /// Events due within this distance of a step boundary are delivered there
    pub fn event_tolerance(&self) -> f64 {
        self.dt * 1e-6
    }
}
