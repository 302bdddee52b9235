// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Dual-exponential conductance synapse
//!
//! `g(t) = Σ w·gmax·factor·(exp(-(t-t0)/τ2) - exp(-(t-t0)/τ1))`, with
//! `factor` chosen so a single event of weight 1 peaks at exactly `gmax`.
//! Both exponentials are kept as amplitudes referenced to the time of the
//! latest delivery, which keeps evaluation O(1) per step however many events
//! overlap.

use serde::{Deserialize, Serialize};

use super::{PointCurrent, SynapticMechanism};
use crate::types::error::{require_finite, require_positive};
use crate::types::Result;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DualExpParameters {
    /// Rise time constant (ms)
    pub tau1: f64,
    /// Decay time constant (ms)
    pub tau2: f64,
    /// Reversal potential (mV)
    pub e: f64,
    /// Peak conductance for a weight-1 event (µS)
    pub gmax: f64,
}

impl Default for DualExpParameters {
    fn default() -> Self {
        Self {
            tau1: 0.1,
            tau2: 10.0,
            e: 0.0,
            gmax: 1.0,
        }
    }
}

impl DualExpParameters {
    pub fn validate(&self) -> Result<()> {
        require_positive("dual_exp.tau1", self.tau1)?;
        require_positive("dual_exp.tau2", self.tau2)?;
        require_positive("dual_exp.gmax", self.gmax)?;
        require_finite("dual_exp.e", self.e)
    }

    /// Time of peak after a single event (ms)
    pub fn peak_time(&self) -> f64 {
        let (tau1, tau2) = effective_taus(self.tau1, self.tau2);
        tau1 * tau2 / (tau2 - tau1) * (tau2 / tau1).ln()
    }
}

/// Rise must be strictly faster than decay for the normalization to exist
fn effective_taus(tau1: f64, tau2: f64) -> (f64, f64) {
    let ratio = tau1 / tau2;
    if ratio > 0.9999 {
        (0.9999 * tau2, tau2)
    } else if ratio < 1e-9 {
        (tau2 * 1e-9, tau2)
    } else {
        (tau1, tau2)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DualExpSynapse {
    params: DualExpParameters,
    tau1: f64,
    tau2: f64,
    factor: f64,
    /// Rise amplitude at `t_ref`
    a: f64,
    /// Decay amplitude at `t_ref`
    b: f64,
    t_ref: f64,
}

impl DualExpSynapse {
    pub fn new(params: DualExpParameters) -> Result<Self> {
        params.validate()?;
        let (tau1, tau2) = effective_taus(params.tau1, params.tau2);
        let tp = params.peak_time();
        let factor = 1.0 / ((-tp / tau2).exp() - (-tp / tau1).exp());
        Ok(Self {
            params,
            tau1,
            tau2,
            factor,
            a: 0.0,
            b: 0.0,
            t_ref: 0.0,
        })
    }

    pub fn parameters(&self) -> &DualExpParameters {
        &self.params
    }
}

impl SynapticMechanism for DualExpSynapse {
    fn name(&self) -> &'static str {
        "dual_exp"
    }

    fn reset(&mut self) {
        self.a = 0.0;
        self.b = 0.0;
        self.t_ref = 0.0;
    }

    fn deliver(&mut self, t: f64, weight: f64) {
        let amplitude = weight * self.factor;
        if t >= self.t_ref {
            let elapsed = t - self.t_ref;
            self.a *= (-elapsed / self.tau1).exp();
            self.b *= (-elapsed / self.tau2).exp();
            self.t_ref = t;
            self.a += amplitude;
            self.b += amplitude;
        } else {
            // Event older than the reference: add it already decayed
            let age = self.t_ref - t;
            self.a += amplitude * (-age / self.tau1).exp();
            self.b += amplitude * (-age / self.tau2).exp();
        }
    }

    fn conductance(&self, t: f64) -> f64 {
        let elapsed = t - self.t_ref;
        if elapsed < 0.0 {
            return 0.0;
        }
        let a = self.a * (-elapsed / self.tau1).exp();
        let b = self.b * (-elapsed / self.tau2).exp();
        self.params.gmax * (b - a)
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

    fn synapse(tau1: f64, tau2: f64) -> DualExpSynapse {
        DualExpSynapse::new(DualExpParameters {
            tau1,
            tau2,
            e: 0.0,
            gmax: 0.01,
        })
        .unwrap()
    }

    #[test]
    fn test_peak_time_and_height() {
        let mut syn = synapse(1.0, 2.0);
        syn.deliver(5.0, 5.0);
        let tp = 2.0 * 2f64.ln();
        assert!((syn.parameters().peak_time() - tp).abs() < 1e-12);
        assert!((syn.conductance(5.0 + tp) - 5.0 * 0.01).abs() < 1e-12);
        // Peak is a maximum
        assert!(syn.conductance(5.0 + tp - 0.01) < syn.conductance(5.0 + tp));
        assert!(syn.conductance(5.0 + tp + 0.01) < syn.conductance(5.0 + tp));
    }

    #[test]
    fn test_silent_before_first_event() {
        let mut syn = synapse(0.1, 4.2);
        assert_eq!(syn.conductance(3.0), 0.0);
        syn.deliver(5.0, 1.0);
        assert_eq!(syn.conductance(4.0), 0.0);
        assert_eq!(syn.conductance(5.0), 0.0);
    }

    #[test]
    fn test_overlapping_events_sum_linearly() {
        let mut both = synapse(0.5, 3.0);
        both.deliver(1.0, 1.0);
        both.deliver(2.5, 2.0);

        let mut first = synapse(0.5, 3.0);
        first.deliver(1.0, 1.0);
        let mut second = synapse(0.5, 3.0);
        second.deliver(2.5, 2.0);

        for t in [3.0, 4.0, 7.5, 12.0] {
            let expected = first.conductance(t) + second.conductance(t);
            assert!((both.conductance(t) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_late_delivery_is_exact() {
        let mut in_order = synapse(0.5, 3.0);
        in_order.deliver(1.0, 1.0);
        in_order.deliver(2.0, 1.0);

        let mut out_of_order = synapse(0.5, 3.0);
        out_of_order.deliver(2.0, 1.0);
        out_of_order.deliver(1.0, 1.0);

        assert!((in_order.conductance(5.0) - out_of_order.conductance(5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_equal_time_constants_are_nudged() {
        let mut syn = synapse(2.0, 2.0);
        syn.deliver(0.0, 1.0);
        let tp = syn.parameters().peak_time();
        assert!(tp.is_finite() && tp > 0.0);
        assert!((syn.conductance(tp) - 0.01).abs() < 1e-9);
    }
}
