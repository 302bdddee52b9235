// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Calcium handling
//!
//! ```text
//! cad   submembrane pool fed by inward calcium current, decaying to cainf
//!       dcai/dt = max(-k·ica / (2F·depth), 0) + (cainf - cai) / taur
//!
//! ical  high-voltage-activated L-type current    ica = gcabar m²h (v - eca)
//! it2   low-threshold T-type current             ica = gcabar m²h (v - eca)
//! ```
//!
//! `eca` is the Nernst potential of the current pool concentration.

use serde::{Deserialize, Serialize};

use super::rates::{boltzmann, from_rates, relax, temperature_factor, vtrap};
use super::{IonEnvironment, MechanismParameters, MembraneCurrent, MembraneMechanism};
use crate::types::error::{require_finite, require_positive};
use crate::types::units::FARADAY;
use crate::types::Result;

/// Converts mA/cm² over a shell of depth µm into mM/ms
const SHELL_DRIVE: f64 = 1e4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalciumPoolParameters {
    /// Shell depth below the membrane (µm)
    pub depth: f64,
    /// Removal time constant (ms)
    pub taur: f64,
    /// Baseline concentration (mM)
    pub cainf: f64,
}

impl Default for CalciumPoolParameters {
    fn default() -> Self {
        Self {
            depth: 0.1,
            taur: 5.0,
            cainf: 2.4e-4,
        }
    }
}

impl MechanismParameters for CalciumPoolParameters {
    fn validate(&self) -> Result<()> {
        require_positive("cad.depth", self.depth)?;
        require_positive("cad.taur", self.taur)?;
        require_positive("cad.cainf", self.cainf)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalciumPool {
    params: CalciumPoolParameters,
    cai: f64,
}

impl CalciumPool {
    pub fn new(params: CalciumPoolParameters) -> Self {
        Self {
            params,
            cai: params.cainf,
        }
    }

    pub fn concentration(&self) -> f64 {
        self.cai
    }

    /// Influx rate (mM/ms) produced by a calcium current density (mA/cm²).
    /// Outward calcium current does not pump the pool.
    #[inline]
    pub fn drive(&self, ica: f64) -> f64 {
        (-SHELL_DRIVE * ica / (2.0 * FARADAY * self.params.depth)).max(0.0)
    }
}

impl MembraneMechanism for CalciumPool {
    type Parameters = CalciumPoolParameters;

    fn name(&self) -> &'static str {
        "cad"
    }

    fn parameters(&self) -> &CalciumPoolParameters {
        &self.params
    }

    fn initialize(&mut self, _v: f64, _ions: &IonEnvironment) {
        self.cai = self.params.cainf;
    }

    fn current(&self, _v: f64, _ions: &IonEnvironment) -> MembraneCurrent {
        MembraneCurrent::default()
    }

    fn advance(&mut self, _v: f64, ions: &IonEnvironment, dt: f64) {
        let steady = self.params.cainf + self.drive(ions.ica) * self.params.taur;
        self.cai = relax(self.cai, steady, self.params.taur, dt);
    }

    fn state(&self, name: &str) -> Option<f64> {
        match name {
            "cai" => Some(self.cai),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LTypeCalciumParameters {
    /// Maximal conductance (S/cm²)
    pub gcabar: f64,
}

impl Default for LTypeCalciumParameters {
    fn default() -> Self {
        Self { gcabar: 1e-4 }
    }
}

impl MechanismParameters for LTypeCalciumParameters {
    fn validate(&self) -> Result<()> {
        require_positive("ical.gcabar", self.gcabar)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LTypeCalcium {
    params: LTypeCalciumParameters,
    m: f64,
    h: f64,
}

impl LTypeCalcium {
    pub fn new(params: LTypeCalciumParameters) -> Self {
        Self {
            params,
            m: 0.0,
            h: 1.0,
        }
    }

    pub fn rates(v: f64, celsius: f64) -> [(f64, f64); 2] {
        let tadj = temperature_factor(3.0, celsius, 36.0);
        let m = from_rates(
            0.055 * vtrap(-27.0 - v, 3.8),
            0.94 * ((-75.0 - v) / 17.0).exp(),
            tadj,
        );
        let h = from_rates(
            0.000457 * ((-13.0 - v) / 50.0).exp(),
            0.0065 / (((-v - 15.0) / 28.0).exp() + 1.0),
            tadj,
        );
        [m, h]
    }
}

impl MembraneMechanism for LTypeCalcium {
    type Parameters = LTypeCalciumParameters;

    fn name(&self) -> &'static str {
        "ical"
    }

    fn parameters(&self) -> &LTypeCalciumParameters {
        &self.params
    }

    fn initialize(&mut self, v: f64, ions: &IonEnvironment) {
        let [m, h] = Self::rates(v, ions.celsius);
        self.m = m.0;
        self.h = h.0;
    }

    #[inline]
    fn current(&self, v: f64, ions: &IonEnvironment) -> MembraneCurrent {
        MembraneCurrent::calcium(self.params.gcabar * self.m * self.m * self.h * (v - ions.eca()))
    }

    fn advance(&mut self, v: f64, ions: &IonEnvironment, dt: f64) {
        let [m, h] = Self::rates(v, ions.celsius);
        self.m = relax(self.m, m.0, m.1, dt);
        self.h = relax(self.h, h.0, h.1, dt);
    }

    fn state(&self, name: &str) -> Option<f64> {
        match name {
            "m" => Some(self.m),
            "h" => Some(self.h),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TTypeCalciumParameters {
    /// Maximal conductance (S/cm²)
    pub gcabar: f64,
    /// Depolarizing shift of both activation curves (mV)
    pub shift: f64,
}

impl Default for TTypeCalciumParameters {
    fn default() -> Self {
        Self {
            gcabar: 2e-4,
            shift: 2.0,
        }
    }
}

impl MechanismParameters for TTypeCalciumParameters {
    fn validate(&self) -> Result<()> {
        require_positive("it2.gcabar", self.gcabar)?;
        require_finite("it2.shift", self.shift)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TTypeCalcium {
    params: TTypeCalciumParameters,
    m: f64,
    h: f64,
}

impl TTypeCalcium {
    pub fn new(params: TTypeCalciumParameters) -> Self {
        Self {
            params,
            m: 0.0,
            h: 1.0,
        }
    }

    pub fn rates(&self, v: f64, celsius: f64) -> [(f64, f64); 2] {
        let phi_m = temperature_factor(5.0, celsius, 24.0);
        let phi_h = temperature_factor(3.0, celsius, 24.0);
        let vs = v + self.params.shift;

        let m_inf = boltzmann(vs, -57.0, 6.2);
        let tau_m =
            (0.612 + 1.0 / ((-(vs + 132.0) / 16.7).exp() + ((vs + 16.8) / 18.2).exp())) / phi_m;

        let h_inf = boltzmann(vs, -81.0, -4.0);
        let tau_h = (if vs < -80.0 {
            ((vs + 467.0) / 66.6).exp()
        } else {
            28.0 + (-(vs + 22.0) / 10.5).exp()
        }) / phi_h;

        [(m_inf, tau_m), (h_inf, tau_h)]
    }
}

impl MembraneMechanism for TTypeCalcium {
    type Parameters = TTypeCalciumParameters;

    fn name(&self) -> &'static str {
        "it2"
    }

    fn parameters(&self) -> &TTypeCalciumParameters {
        &self.params
    }

    fn initialize(&mut self, v: f64, ions: &IonEnvironment) {
        let [m, h] = self.rates(v, ions.celsius);
        self.m = m.0;
        self.h = h.0;
    }

    #[inline]
    fn current(&self, v: f64, ions: &IonEnvironment) -> MembraneCurrent {
        MembraneCurrent::calcium(self.params.gcabar * self.m * self.m * self.h * (v - ions.eca()))
    }

    fn advance(&mut self, v: f64, ions: &IonEnvironment, dt: f64) {
        let [m, h] = self.rates(v, ions.celsius);
        self.m = relax(self.m, m.0, m.1, dt);
        self.h = relax(self.h, h.0, h.1, dt);
    }

    fn state(&self, name: &str) -> Option<f64> {
        match name {
            "m" => Some(self.m),
            "h" => Some(self.h),
            _ => None,
        }
    }
}
