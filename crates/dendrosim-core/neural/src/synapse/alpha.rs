// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Alpha-function conductance synapse
//!
//! `g(t) = w·gmax·((t-t0)/τ)·exp(1 - (t-t0)/τ)`, peaking at `w·gmax` when
//! `t - t0 = τ`. An optional `onset` activates the synapse once with weight 1
//! without any incoming event; events add further activations.

use serde::{Deserialize, Serialize};

use super::{PointCurrent, SynapticMechanism};
use crate::types::error::{require_finite, require_positive};
use crate::types::{Result, SimError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlphaParameters {
    /// Standalone activation time (ms)
    pub onset: Option<f64>,
    pub tau: f64,
    /// Peak conductance (µS)
    pub gmax: f64,
    /// Reversal potential (mV)
    pub e: f64,
}

impl Default for AlphaParameters {
    fn default() -> Self {
        Self {
            onset: None,
            tau: 0.1,
            gmax: 1.0,
            e: 0.0,
        }
    }
}

impl AlphaParameters {
    pub fn validate(&self) -> Result<()> {
        require_positive("alpha.tau", self.tau)?;
        require_positive("alpha.gmax", self.gmax)?;
        require_finite("alpha.e", self.e)?;
        match self.onset {
            Some(onset) if !(onset.is_finite() && onset >= 0.0) => Err(SimError::InvalidParameter(
                format!("alpha.onset must be >= 0 (got {})", onset),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlphaSynapse {
    params: AlphaParameters,
    /// Σ w·exp(-(t_ref - t_k)/τ)
    a: f64,
    /// Σ w·(t_ref - t_k)·exp(-(t_ref - t_k)/τ)
    b: f64,
    t_ref: f64,
}

impl AlphaSynapse {
    pub fn new(params: AlphaParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            a: 0.0,
            b: 0.0,
            t_ref: 0.0,
        })
    }

    pub fn parameters(&self) -> &AlphaParameters {
        &self.params
    }

    /// Normalized kernel `(s/τ)·exp(1 - s/τ)` for `s >= 0`
    fn kernel(&self, s: f64) -> f64 {
        if s <= 0.0 {
            0.0
        } else {
            let x = s / self.params.tau;
            x * (1.0 - x).exp()
        }
    }
}

impl SynapticMechanism for AlphaSynapse {
    fn name(&self) -> &'static str {
        "alpha"
    }

    fn reset(&mut self) {
        self.a = 0.0;
        self.b = 0.0;
        self.t_ref = 0.0;
    }

    fn deliver(&mut self, t: f64, weight: f64) {
        let tau = self.params.tau;
        if t >= self.t_ref {
            let elapsed = t - self.t_ref;
            let decay = (-elapsed / tau).exp();
            self.b = (self.b + elapsed * self.a) * decay;
            self.a *= decay;
            self.t_ref = t;
            self.a += weight;
        } else {
            let age = self.t_ref - t;
            let decay = (-age / tau).exp();
            self.a += weight * decay;
            self.b += weight * age * decay;
        }
    }

    fn conductance(&self, t: f64) -> f64 {
        let onset = self
            .params
            .onset
            .map_or(0.0, |onset| self.kernel(t - onset));
        let elapsed = t - self.t_ref;
        let events = if elapsed < 0.0 {
            0.0
        } else {
            let tau = self.params.tau;
            core::f64::consts::E / tau * (-elapsed / tau).exp() * (elapsed * self.a + self.b)
        };
        self.params.gmax * (onset + events)
    }

    #[inline]
    fn current(&self, t: f64, v: f64) -> PointCurrent {
        let g = self.conductance(t);
        PointCurrent {
            current: g * (v - self.params.e),
            conductance: g,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_onset_peaks_at_tau() {
        let syn = AlphaSynapse::new(AlphaParameters {
            onset: Some(10.0),
            tau: 2.0,
            gmax: 0.05,
            e: 0.0,
        })
        .unwrap();
        assert_eq!(syn.conductance(9.0), 0.0);
        assert!((syn.conductance(12.0) - 0.05).abs() < 1e-12);
        assert!(syn.conductance(11.5) < 0.05);
        assert!(syn.conductance(12.5) < 0.05);
    }

    #[test]
    fn test_event_matches_closed_form() {
        let mut syn = AlphaSynapse::new(AlphaParameters {
            tau: 1.5,
            gmax: 0.02,
            ..Default::default()
        })
        .unwrap();
        syn.deliver(3.0, 2.0);
        syn.deliver(4.0, 1.0);
        for t in [4.5, 6.0, 9.0] {
            let expected = 0.02 * (2.0 * syn.kernel(t - 3.0) + syn.kernel(t - 4.0));
            assert!((syn.conductance(t) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_negative_onset_rejected() {
        let params = AlphaParameters {
            onset: Some(-1.0),
            ..Default::default()
        };
        assert!(AlphaSynapse::new(params).is_err());
    }
}
