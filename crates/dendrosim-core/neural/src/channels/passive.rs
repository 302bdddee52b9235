// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Passive leak (`pas`)

use serde::{Deserialize, Serialize};

use super::{IonEnvironment, MechanismParameters, MembraneCurrent, MembraneMechanism};
use crate::types::error::{require_finite, require_positive};
use crate::types::Result;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassiveParameters {
    /// Leak conductance (S/cm²)
    pub g: f64,
    /// Leak reversal (mV)
    pub e: f64,
}

impl Default for PassiveParameters {
    fn default() -> Self {
        Self { g: 0.001, e: -70.0 }
    }
}

impl MechanismParameters for PassiveParameters {
    fn validate(&self) -> Result<()> {
        require_positive("pas.g", self.g)?;
        require_finite("pas.e", self.e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Passive {
    params: PassiveParameters,
}

impl Passive {
    pub fn new(params: PassiveParameters) -> Self {
        Self { params }
    }
}

impl MembraneMechanism for Passive {
    type Parameters = PassiveParameters;

    fn name(&self) -> &'static str {
        "pas"
    }

    fn parameters(&self) -> &PassiveParameters {
        &self.params
    }

    fn initialize(&mut self, _v: f64, _ions: &IonEnvironment) {}

    #[inline]
    fn current(&self, v: f64, _ions: &IonEnvironment) -> MembraneCurrent {
        MembraneCurrent::nonspecific(self.params.g * (v - self.params.e))
    }

    fn advance(&mut self, _v: f64, _ions: &IonEnvironment, _dt: f64) {}

    fn state(&self, _name: &str) -> Option<f64> {
        None
    }
}
