// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Point Processes
//!
//! Synapses and current clamps attached to a single segment. A point process
//! contributes a point current (nA, outward positive) and a conductance (µS)
//! that the cable solver folds into its host segment's row.
//!
//! Conductance synapses are event driven: [`SynapticMechanism::deliver`]
//! registers a weighted activation at its delivery time and the waveform is
//! evaluated analytically, so overlapping events sum linearly and an event
//! delivered at a step boundary after its nominal time is still exact.

use serde::{Deserialize, Serialize};

use crate::types::Result;

mod alpha;
mod clamp;
mod dual_exp;

pub use alpha::{AlphaParameters, AlphaSynapse};
pub use clamp::{ClampParameters, CurrentClamp};
pub use dual_exp::{DualExpParameters, DualExpSynapse};

/// Point current and conductance of one point process at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointCurrent {
    /// Outward-positive current (nA)
    pub current: f64,
    /// Conductance (µS) = `d current / dv`
    pub conductance: f64,
}

pub trait SynapticMechanism {
    fn name(&self) -> &'static str;

    /// Forget every activation
    fn reset(&mut self);

    /// Register an activation at time `t` (ms) with `weight`
    fn deliver(&mut self, t: f64, weight: f64);

    /// Whether [`deliver`](Self::deliver) has any effect
    fn accepts_events(&self) -> bool {
        true
    }

    /// Conductance (µS) at `t`
    fn conductance(&self, t: f64) -> f64;

    fn current(&self, t: f64, v: f64) -> PointCurrent;
}

/// One instantiated point process
#[derive(Debug, Clone, PartialEq)]
pub enum PointProcess {
    DualExp(DualExpSynapse),
    Alpha(AlphaSynapse),
    Clamp(CurrentClamp),
}

impl SynapticMechanism for PointProcess {
    fn name(&self) -> &'static str {
        match self {
            PointProcess::DualExp(s) => s.name(),
            PointProcess::Alpha(s) => s.name(),
            PointProcess::Clamp(s) => s.name(),
        }
    }

    fn reset(&mut self) {
        match self {
            PointProcess::DualExp(s) => s.reset(),
            PointProcess::Alpha(s) => s.reset(),
            PointProcess::Clamp(s) => s.reset(),
        }
    }

    fn deliver(&mut self, t: f64, weight: f64) {
        match self {
            PointProcess::DualExp(s) => s.deliver(t, weight),
            PointProcess::Alpha(s) => s.deliver(t, weight),
            PointProcess::Clamp(s) => s.deliver(t, weight),
        }
    }

    fn accepts_events(&self) -> bool {
        !matches!(self, PointProcess::Clamp(_))
    }

    fn conductance(&self, t: f64) -> f64 {
        match self {
            PointProcess::DualExp(s) => s.conductance(t),
            PointProcess::Alpha(s) => s.conductance(t),
            PointProcess::Clamp(s) => s.conductance(t),
        }
    }

    #[inline]
    fn current(&self, t: f64, v: f64) -> PointCurrent {
        match self {
            PointProcess::DualExp(s) => s.current(t, v),
            PointProcess::Alpha(s) => s.current(t, v),
            PointProcess::Clamp(s) => s.current(t, v),
        }
    }
}

/// Declarative point-process kind and parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointProcessSpec {
    DualExp(DualExpParameters),
    Alpha(AlphaParameters),
    Clamp(ClampParameters),
}

impl PointProcessSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            PointProcessSpec::DualExp(_) => "dual_exp",
            PointProcessSpec::Alpha(_) => "alpha",
            PointProcessSpec::Clamp(_) => "clamp",
        }
    }

    /// Validate the parameters and build a fresh instance
    pub fn instantiate(&self) -> Result<PointProcess> {
        Ok(match *self {
            PointProcessSpec::DualExp(p) => PointProcess::DualExp(DualExpSynapse::new(p)?),
            PointProcessSpec::Alpha(p) => PointProcess::Alpha(AlphaSynapse::new(p)?),
            PointProcessSpec::Clamp(p) => PointProcess::Clamp(CurrentClamp::new(p)?),
        })
    }
}
