// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Hyperpolarization-activated "anomalous rectifier" (`iar`)

use serde::{Deserialize, Serialize};

use super::rates::{boltzmann, relax};
use super::{IonEnvironment, MechanismParameters, MembraneCurrent, MembraneMechanism};
use crate::types::error::{require_finite, require_positive};
use crate::types::Result;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalousRectifierParameters {
    pub ghbar: f64,
    pub eh: f64,
}

impl Default for AnomalousRectifierParameters {
    fn default() -> Self {
        Self {
            ghbar: 2e-5,
            eh: -40.0,
        }
    }
}

impl MechanismParameters for AnomalousRectifierParameters {
    fn validate(&self) -> Result<()> {
        require_positive("iar.ghbar", self.ghbar)?;
        require_finite("iar.eh", self.eh)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnomalousRectifier {
    params: AnomalousRectifierParameters,
    m: f64,
}

impl AnomalousRectifier {
    pub fn new(params: AnomalousRectifierParameters) -> Self {
        Self { params, m: 0.0 }
    }

    pub fn rates(v: f64) -> (f64, f64) {
        let inf = boltzmann(v, -75.0, -5.5);
        let tau = 1.0 / ((-14.59 - 0.086 * v).exp() + (-1.87 + 0.0701 * v).exp());
        (inf, tau)
    }
}

impl MembraneMechanism for AnomalousRectifier {
    type Parameters = AnomalousRectifierParameters;

    fn name(&self) -> &'static str {
        "iar"
    }

    fn parameters(&self) -> &AnomalousRectifierParameters {
        &self.params
    }

    fn initialize(&mut self, v: f64, _ions: &IonEnvironment) {
        self.m = Self::rates(v).0;
    }

    #[inline]
    fn current(&self, v: f64, _ions: &IonEnvironment) -> MembraneCurrent {
        MembraneCurrent::nonspecific(self.params.ghbar * self.m * (v - self.params.eh))
    }

    fn advance(&mut self, v: f64, _ions: &IonEnvironment, dt: f64) {
        let (inf, tau) = Self::rates(v);
        self.m = relax(self.m, inf, tau, dt);
    }

    fn state(&self, name: &str) -> Option<f64> {
        (name == "m").then_some(self.m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activates_on_hyperpolarization() {
        let (depolarized, _) = AnomalousRectifier::rates(-40.0);
        let (hyperpolarized, tau) = AnomalousRectifier::rates(-100.0);
        assert!(hyperpolarized > 0.95);
        assert!(depolarized < 0.01);
        assert!(tau > 0.0);
    }
}
