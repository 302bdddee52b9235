// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared rate-function helpers for gating kinetics

/// `x / (exp(x / y) - 1)` with the removable singularity at `x = 0` handled
#[inline]
pub fn vtrap(x: f64, y: f64) -> f64 {
    if (x / y).abs() < 1e-6 {
        y * (1.0 - x / y / 2.0)
    } else {
        x / ((x / y).exp() - 1.0)
    }
}

/// Boltzmann curve `1 / (1 + exp(-(v - v_half) / k))`; negative `k` gives inactivation
#[inline]
pub fn boltzmann(v: f64, v_half: f64, k: f64) -> f64 {
    1.0 / (1.0 + (-(v - v_half) / k).exp())
}

/// Exact solution of `dx/dt = (inf - x) / tau` over `dt` with `inf`, `tau` frozen
#[inline]
pub fn relax(state: f64, inf: f64, tau: f64, dt: f64) -> f64 {
    inf + (state - inf) * (-dt / tau).exp()
}

/// Temperature scaling `q10^((celsius - reference) / 10)`
#[inline]
pub fn temperature_factor(q10: f64, celsius: f64, reference: f64) -> f64 {
    q10.powf((celsius - reference) / 10.0)
}

/// Steady state and time constant from opening/closing rates
#[inline]
pub fn from_rates(alpha: f64, beta: f64, scale: f64) -> (f64, f64) {
    let sum = alpha + beta;
    (alpha / sum, 1.0 / (scale * sum))
}
