// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Calcium-activated currents: slow AHP potassium (`iahp`) and non-specific
//! cation (`ican`).
//!
//! Both share the same gating scheme, a single gate whose opening rate is a
//! saturating (Hill, n = 2) function of the pool concentration:
//! `alpha = beta·(cai/cac)²`, `m_inf = alpha/(alpha+beta)`, `i = gbar·m²·(v - e)`.

use serde::{Deserialize, Serialize};

use super::rates::{relax, temperature_factor};
use super::{IonEnvironment, MechanismParameters, MembraneCurrent, MembraneMechanism};
use crate::types::error::{require_finite, require_positive};
use crate::types::Result;

#[inline]
fn calcium_gate(cai: f64, beta: f64, cac: f64, taumin: f64, tadj: f64) -> (f64, f64) {
    let alpha = beta * (cai / cac).powi(2);
    let sum = alpha + beta;
    (alpha / sum, (1.0 / sum / tadj).max(taumin))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalciumActivatedPotassiumParameters {
    pub gkbar: f64,
    /// Closing rate (1/ms)
    pub beta: f64,
    /// Half-activating concentration (mM)
    pub cac: f64,
    /// Lower bound on the time constant (ms)
    pub taumin: f64,
}

impl Default for CalciumActivatedPotassiumParameters {
    fn default() -> Self {
        Self {
            gkbar: 1e-4,
            beta: 0.03,
            cac: 0.025,
            taumin: 0.5,
        }
    }
}

impl MechanismParameters for CalciumActivatedPotassiumParameters {
    fn validate(&self) -> Result<()> {
        require_positive("iahp.gkbar", self.gkbar)?;
        require_positive("iahp.beta", self.beta)?;
        require_positive("iahp.cac", self.cac)?;
        require_positive("iahp.taumin", self.taumin)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalciumActivatedPotassium {
    params: CalciumActivatedPotassiumParameters,
    m: f64,
}

impl CalciumActivatedPotassium {
    pub fn new(params: CalciumActivatedPotassiumParameters) -> Self {
        Self { params, m: 0.0 }
    }

    fn gate(&self, ions: &IonEnvironment) -> (f64, f64) {
        let p = &self.params;
        calcium_gate(
            ions.cai,
            p.beta,
            p.cac,
            p.taumin,
            temperature_factor(3.0, ions.celsius, 22.0),
        )
    }
}

impl MembraneMechanism for CalciumActivatedPotassium {
    type Parameters = CalciumActivatedPotassiumParameters;

    fn name(&self) -> &'static str {
        "iahp"
    }

    fn parameters(&self) -> &CalciumActivatedPotassiumParameters {
        &self.params
    }

    fn initialize(&mut self, _v: f64, ions: &IonEnvironment) {
        self.m = self.gate(ions).0;
    }

    #[inline]
    fn current(&self, v: f64, ions: &IonEnvironment) -> MembraneCurrent {
        MembraneCurrent::nonspecific(self.params.gkbar * self.m * self.m * (v - ions.ek))
    }

    fn advance(&mut self, _v: f64, ions: &IonEnvironment, dt: f64) {
        let (inf, tau) = self.gate(ions);
        self.m = relax(self.m, inf, tau, dt);
    }

    fn state(&self, name: &str) -> Option<f64> {
        (name == "m").then_some(self.m)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalciumActivatedCationParameters {
    pub gbar: f64,
    /// Reversal of the mixed cation current (mV)
    pub en: f64,
    pub beta: f64,
    pub cac: f64,
    pub taumin: f64,
}

impl Default for CalciumActivatedCationParameters {
    fn default() -> Self {
        Self {
            gbar: 1e-5,
            en: -20.0,
            beta: 0.002,
            cac: 1.1e-4,
            taumin: 0.1,
        }
    }
}

impl MechanismParameters for CalciumActivatedCationParameters {
    fn validate(&self) -> Result<()> {
        require_positive("ican.gbar", self.gbar)?;
        require_finite("ican.en", self.en)?;
        require_positive("ican.beta", self.beta)?;
        require_positive("ican.cac", self.cac)?;
        require_positive("ican.taumin", self.taumin)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalciumActivatedCation {
    params: CalciumActivatedCationParameters,
    m: f64,
}

impl CalciumActivatedCation {
    pub fn new(params: CalciumActivatedCationParameters) -> Self {
        Self { params, m: 0.0 }
    }

    fn gate(&self, ions: &IonEnvironment) -> (f64, f64) {
        let p = &self.params;
        calcium_gate(
            ions.cai,
            p.beta,
            p.cac,
            p.taumin,
            temperature_factor(3.0, ions.celsius, 22.0),
        )
    }
}

impl MembraneMechanism for CalciumActivatedCation {
    type Parameters = CalciumActivatedCationParameters;

    fn name(&self) -> &'static str {
        "ican"
    }

    fn parameters(&self) -> &CalciumActivatedCationParameters {
        &self.params
    }

    fn initialize(&mut self, _v: f64, ions: &IonEnvironment) {
        self.m = self.gate(ions).0;
    }

    #[inline]
    fn current(&self, v: f64, _ions: &IonEnvironment) -> MembraneCurrent {
        MembraneCurrent::nonspecific(self.params.gbar * self.m * self.m * (v - self.params.en))
    }

    fn advance(&mut self, _v: f64, ions: &IonEnvironment, dt: f64) {
        let (inf, tau) = self.gate(ions);
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
    fn test_activation_saturates_with_calcium() {
        let (low, _) = calcium_gate(1e-5, 0.03, 0.025, 0.5, 1.0);
        let (mid, _) = calcium_gate(0.025, 0.03, 0.025, 0.5, 1.0);
        let (high, _) = calcium_gate(10.0, 0.03, 0.025, 0.5, 1.0);
        assert!(low < 1e-6);
        assert!((mid - 0.5).abs() < 1e-12);
        assert!(high > 0.999 && high < 1.0);
    }

    #[test]
    fn test_time_constant_floor() {
        let (_, tau) = calcium_gate(10.0, 0.03, 0.025, 0.5, 1.0);
        assert!(tau >= 0.5);
    }

    #[test]
    fn test_ahp_opens_after_calcium_rise() {
        let mut ahp = CalciumActivatedPotassium::new(Default::default());
        let rest = IonEnvironment {
            celsius: 22.0,
            ..Default::default()
        };
        ahp.initialize(-65.0, &rest);
        let m0 = ahp.state("m").unwrap();
        let loaded = IonEnvironment {
            cai: 0.05,
            ..rest
        };
        for _ in 0..200 {
            ahp.advance(-65.0, &loaded, 0.1);
        }

        // inf = 0.12 / 0.15, tau = 1 / 0.15 at the reference temperature
        let (inf, tau): (f64, f64) = (0.8, 1.0 / 0.15);
        let expected = inf + (m0 - inf) * (-20.0 / tau).exp();
        let m = ahp.state("m").unwrap();
        assert!((m - expected).abs() < 1e-9, "m = {}, expected {}", m, expected);
        assert!(m > 0.5);
        // Outward at rest because ek is below -65 mV
        assert!(ahp.current(-65.0, &loaded).total > 0.0);
    }

    #[test]
    fn test_ahp_slows_at_low_temperature() {
        let loaded = IonEnvironment {
            cai: 0.05,
            ..Default::default()
        };
        let mut ahp = CalciumActivatedPotassium::new(Default::default());
        for _ in 0..200 {
            ahp.advance(-65.0, &loaded, 0.1);
        }
        let tau = 1.0 / 0.15 / temperature_factor(3.0, 6.3, 22.0);
        let expected = 0.8 * (1.0 - (-20.0 / tau).exp());
        assert!((ahp.state("m").unwrap() - expected).abs() < 1e-9);
    }
}
