// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for cell construction and integration
//!
//! Construction-time failures (topology, parameter, reference) are raised while
//! a network is assembled and abort before the first step. `SolverFailure` is
//! raised during integration and halts the run at the offending step.

/// Error taxonomy for dendrosim operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    /// Bad tree structure or attach point
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// Non-physical mechanism, geometry or simulation value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Connectivity specification names an unknown entity
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Singular or divergent linear system
    #[error("Solver failure at step {step} (t = {time} ms) in cell '{cell}', segment {segment}: {reason}")]
    SolverFailure {
        step: u64,
        time: f64,
        cell: String,
        segment: usize,
        reason: String,
    },
}

impl SimError {
    /// True for the errors that can only be raised before a run starts
    pub fn is_construction_error(&self) -> bool {
        !matches!(self, SimError::SolverFailure { .. })
    }
}

pub type Result<T> = core::result::Result<T, SimError>;

/// Reject anything that is not a finite, strictly positive number.
pub(crate) fn require_positive(what: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter(format!(
            "{} must be > 0 (got {})",
            what, value
        )))
    }
}

pub(crate) fn require_finite(what: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::InvalidParameter(format!(
            "{} must be finite (got {})",
            what, value
        )))
    }
}

pub(crate) fn require_unit_interval(what: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::InvalidParameter(format!(
            "{} must lie in [0, 1] (got {})",
            what, value
        )))
    }
}
