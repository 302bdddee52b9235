// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Fast sodium / delayed-rectifier potassium kinetics
//!
//! ```text
//! hh   (squid axon, 6.3 °C reference, q10 = 3)
//!     i = gnabar m³h (v - ena) + gkbar n⁴ (v - ek) + gl (v - el)
//!
//! hh2  (Traub–Miles, 36 °C reference, q10 = 3, voltages relative to vtraub)
//!     i = gnabar m³h (v - ena) + gkbar n⁴ (v - ek)
//! ```

use serde::{Deserialize, Serialize};

use super::rates::{from_rates, relax, temperature_factor, vtrap};
use super::{IonEnvironment, MechanismParameters, MembraneCurrent, MembraneMechanism};
use crate::types::error::{require_finite, require_positive};
use crate::types::Result;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HodgkinHuxleyParameters {
    pub gnabar: f64,
    pub gkbar: f64,
    pub gl: f64,
    pub el: f64,
}

impl Default for HodgkinHuxleyParameters {
    fn default() -> Self {
        Self {
            gnabar: 0.12,
            gkbar: 0.036,
            gl: 0.0003,
            el: -54.3,
        }
    }
}

impl MechanismParameters for HodgkinHuxleyParameters {
    fn validate(&self) -> Result<()> {
        require_positive("hh.gnabar", self.gnabar)?;
        require_positive("hh.gkbar", self.gkbar)?;
        require_positive("hh.gl", self.gl)?;
        require_finite("hh.el", self.el)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HodgkinHuxley {
    params: HodgkinHuxleyParameters,
    m: f64,
    h: f64,
    n: f64,
}

impl HodgkinHuxley {
    pub fn new(params: HodgkinHuxleyParameters) -> Self {
        Self {
            params,
            m: 0.0,
            h: 0.0,
            n: 0.0,
        }
    }

    /// `(inf, tau)` for m, h and n
    pub fn rates(v: f64, celsius: f64) -> [(f64, f64); 3] {
        let q10 = temperature_factor(3.0, celsius, 6.3);
        let m = from_rates(0.1 * vtrap(-(v + 40.0), 10.0), 4.0 * (-(v + 65.0) / 18.0).exp(), q10);
        let h = from_rates(
            0.07 * (-(v + 65.0) / 20.0).exp(),
            1.0 / ((-(v + 35.0) / 10.0).exp() + 1.0),
            q10,
        );
        let n = from_rates(
            0.01 * vtrap(-(v + 55.0), 10.0),
            0.125 * (-(v + 65.0) / 80.0).exp(),
            q10,
        );
        [m, h, n]
    }
}

impl MembraneMechanism for HodgkinHuxley {
    type Parameters = HodgkinHuxleyParameters;

    fn name(&self) -> &'static str {
        "hh"
    }

    fn parameters(&self) -> &HodgkinHuxleyParameters {
        &self.params
    }

    fn initialize(&mut self, v: f64, ions: &IonEnvironment) {
        let [m, h, n] = Self::rates(v, ions.celsius);
        self.m = m.0;
        self.h = h.0;
        self.n = n.0;
    }

    #[inline]
    fn current(&self, v: f64, ions: &IonEnvironment) -> MembraneCurrent {
        let p = &self.params;
        let ina = p.gnabar * self.m.powi(3) * self.h * (v - ions.ena);
        let ik = p.gkbar * self.n.powi(4) * (v - ions.ek);
        let il = p.gl * (v - p.el);
        MembraneCurrent::nonspecific(ina + ik + il)
    }

    fn advance(&mut self, v: f64, ions: &IonEnvironment, dt: f64) {
        let [m, h, n] = Self::rates(v, ions.celsius);
        self.m = relax(self.m, m.0, m.1, dt);
        self.h = relax(self.h, h.0, h.1, dt);
        self.n = relax(self.n, n.0, n.1, dt);
    }

    fn state(&self, name: &str) -> Option<f64> {
        match name {
            "m" => Some(self.m),
            "h" => Some(self.h),
            "n" => Some(self.n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraubMilesParameters {
    pub gnabar: f64,
    pub gkbar: f64,
    /// Shifts the voltage dependence of all rates (mV)
    pub vtraub: f64,
}

impl Default for TraubMilesParameters {
    fn default() -> Self {
        Self {
            gnabar: 0.003,
            gkbar: 0.005,
            vtraub: -63.0,
        }
    }
}

impl MechanismParameters for TraubMilesParameters {
    fn validate(&self) -> Result<()> {
        require_positive("hh2.gnabar", self.gnabar)?;
        require_positive("hh2.gkbar", self.gkbar)?;
        require_finite("hh2.vtraub", self.vtraub)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraubMiles {
    params: TraubMilesParameters,
    m: f64,
    h: f64,
    n: f64,
}

impl TraubMiles {
    pub fn new(params: TraubMilesParameters) -> Self {
        Self {
            params,
            m: 0.0,
            h: 0.0,
            n: 0.0,
        }
    }

    pub fn rates(&self, v: f64, celsius: f64) -> [(f64, f64); 3] {
        let tadj = temperature_factor(3.0, celsius, 36.0);
        let v2 = v - self.params.vtraub;
        let m = from_rates(0.32 * vtrap(13.0 - v2, 4.0), 0.28 * vtrap(v2 - 40.0, 5.0), tadj);
        let h = from_rates(
            0.128 * ((17.0 - v2) / 18.0).exp(),
            4.0 / (1.0 + ((40.0 - v2) / 5.0).exp()),
            tadj,
        );
        let n = from_rates(0.032 * vtrap(15.0 - v2, 5.0), 0.5 * ((10.0 - v2) / 40.0).exp(), tadj);
        [m, h, n]
    }
}

impl MembraneMechanism for TraubMiles {
    type Parameters = TraubMilesParameters;

    fn name(&self) -> &'static str {
        "hh2"
    }

    fn parameters(&self) -> &TraubMilesParameters {
        &self.params
    }

    fn initialize(&mut self, v: f64, ions: &IonEnvironment) {
        let [m, h, n] = self.rates(v, ions.celsius);
        self.m = m.0;
        self.h = h.0;
        self.n = n.0;
    }

    #[inline]
    fn current(&self, v: f64, ions: &IonEnvironment) -> MembraneCurrent {
        let p = &self.params;
        MembraneCurrent::nonspecific(
            p.gnabar * self.m.powi(3) * self.h * (v - ions.ena)
                + p.gkbar * self.n.powi(4) * (v - ions.ek),
        )
    }

    fn advance(&mut self, v: f64, ions: &IonEnvironment, dt: f64) {
        let [m, h, n] = self.rates(v, ions.celsius);
        self.m = relax(self.m, m.0, m.1, dt);
        self.h = relax(self.h, h.0, h.1, dt);
        self.n = relax(self.n, n.0, n.1, dt);
    }

    fn state(&self, name: &str) -> Option<f64> {
        match name {
            "m" => Some(self.m),
            "h" => Some(self.h),
            "n" => Some(self.n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hh_resting_gates() {
        // Classic values at -65 mV
        let [m, h, n] = HodgkinHuxley::rates(-65.0, 6.3);
        assert!((m.0 - 0.0529).abs() < 1e-3, "m_inf = {}", m.0);
        assert!((h.0 - 0.5961).abs() < 1e-3, "h_inf = {}", h.0);
        assert!((n.0 - 0.3177).abs() < 1e-3, "n_inf = {}", n.0);
    }

    #[test]
    fn test_hh_temperature_speeds_up_kinetics() {
        let cold = HodgkinHuxley::rates(-50.0, 6.3);
        let warm = HodgkinHuxley::rates(-50.0, 16.3);
        for (c, w) in cold.iter().zip(warm.iter()) {
            assert!((c.0 - w.0).abs() < 1e-12);
            assert!((c.1 / w.1 - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_gates_stay_in_unit_interval() {
        let traub = TraubMiles::new(TraubMilesParameters::default());
        for step in 0..400 {
            let v = -120.0 + step as f64 * 0.4;
            for (inf, tau) in HodgkinHuxley::rates(v, 6.3)
                .iter()
                .chain(traub.rates(v, 36.0).iter())
            {
                assert!((0.0..=1.0).contains(inf), "inf {} at v {}", inf, v);
                assert!(*tau > 0.0 && tau.is_finite());
            }
        }
    }

    #[test]
    fn test_parameters_rejected_when_nonpositive() {
        let mut p = HodgkinHuxleyParameters::default();
        assert!(p.validate().is_ok());
        p.gkbar = 0.0;
        assert!(p.validate().is_err());
        let mut t = TraubMilesParameters::default();
        t.gnabar = -1.0;
        assert!(t.validate().is_err());
    }
}
