// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Cable Solver
//!
//! Backward-Euler integration of the branched cable equation for one cell.
//!
//! ## Per step
//! 1. Linearize every segment's ionic current around its present voltage
//!    (`i(v)` and a numerical `di/dv`) and add point-process currents
//! 2. Assemble the tree-structured system for the voltage change `Δv`:
//!    ```text
//!    (C/dt + di/dv·A + g_syn + Σ g_axial) Δv_i - Σ g_axial Δv_j
//!        = -i(v)·A - i_syn + Σ g_axial (v_j - v_i)
//!    ```
//! 3. Eliminate from the highest segment index down to the root, then
//!    back-substitute; segments are ordered parents-first so this is O(n)
//! 4. Update gating and pool states with the new voltage
//!
//! Units: nF, µS, nA, mV, ms. Density currents are scaled by segment area.

use dendrosim_neural::channels::ChannelSet;
use dendrosim_neural::morphology::Morphology;
use dendrosim_neural::synapse::SynapticMechanism;
use dendrosim_neural::types::units::DENSITY_TO_POINT;
use dendrosim_neural::{Result, SimError};
use tracing::trace;

use crate::cell::AttachedProcess;

/// Smallest pivot accepted during elimination
const MIN_PIVOT: f64 = 1e-300;

/// Where in the run a step happens
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    /// Index of the step being taken (the first step is 1)
    pub step: u64,
    /// Time at the start of the step (ms)
    pub t: f64,
    pub dt: f64,
    pub celsius: f64,
}

impl StepContext {
    /// Time at the end of the step, where point processes are evaluated
    #[inline]
    pub fn t_end(&self) -> f64 {
        self.t + self.dt
    }
}

/// Scratch space for one cell's linear system
#[derive(Debug, Clone, Default)]
pub struct CableSolver {
    diag: Vec<f64>,
    rhs: Vec<f64>,
}

impl CableSolver {
    pub fn new(segment_count: usize) -> Self {
        Self {
            diag: vec![0.0; segment_count],
            rhs: vec![0.0; segment_count],
        }
    }

    /// Advance `voltage` and the channel states of one cell by `ctx.dt`.
    pub fn step(
        &mut self,
        cell: &str,
        morphology: &Morphology,
        channels: &mut ChannelSet,
        processes: &[AttachedProcess],
        voltage: &mut [f64],
        ctx: &StepContext,
    ) -> Result<()> {
        let segments = morphology.segments();
        let n = segments.len();
        self.diag.resize(n, 0.0);
        self.rhs.resize(n, 0.0);

        let failure = |segment: usize, reason: String| SimError::SolverFailure {
            step: ctx.step,
            time: ctx.t,
            cell: cell.to_string(),
            segment,
            reason,
        };

        // Membrane terms
        for (i, seg) in segments.iter().enumerate() {
            let (current, slope) = channels.segments()[i].linearize(voltage[i], ctx.celsius);
            let scale = seg.area * DENSITY_TO_POINT;
            self.diag[i] = seg.capacitance / ctx.dt + slope * scale;
            self.rhs[i] = -current * scale;
        }

        for attached in processes {
            let point = attached.process.current(ctx.t_end(), voltage[attached.segment]);
            self.diag[attached.segment] += point.conductance;
            self.rhs[attached.segment] -= point.current;
        }

        // Axial coupling
        for (i, seg) in segments.iter().enumerate() {
            match seg.parent {
                Some(p) => {
                    let g = seg.axial_conductance;
                    let flow = g * (voltage[p] - voltage[i]);
                    self.diag[i] += g;
                    self.diag[p] += g;
                    self.rhs[i] += flow;
                    self.rhs[p] -= flow;
                }
                None if i != 0 => {
                    return Err(failure(
                        i,
                        "segment is not connected to the root; system is singular".to_string(),
                    ))
                }
                None => {}
            }
        }

        // Leaves to root
        for i in (1..n).rev() {
            let pivot = self.diag[i];
            if !pivot.is_finite() || pivot.abs() < MIN_PIVOT {
                return Err(failure(i, format!("zero or non-finite pivot ({})", pivot)));
            }
            // Validated non-root above
            let p = segments[i].parent.unwrap_or(0);
            let off = -segments[i].axial_conductance;
            let factor = off / pivot;
            self.diag[p] -= factor * off;
            self.rhs[p] -= factor * self.rhs[i];
        }

        // Root to leaves
        let root_pivot = self.diag[0];
        if !root_pivot.is_finite() || root_pivot.abs() < MIN_PIVOT {
            return Err(failure(0, format!("zero or non-finite pivot ({})", root_pivot)));
        }
        self.rhs[0] /= root_pivot;
        for i in 1..n {
            let p = segments[i].parent.unwrap_or(0);
            let off = -segments[i].axial_conductance;
            self.rhs[i] = (self.rhs[i] - off * self.rhs[p]) / self.diag[i];
        }

        for (i, v) in voltage.iter_mut().enumerate() {
            *v += self.rhs[i];
            if !v.is_finite() {
                return Err(failure(i, format!("voltage diverged ({})", v)));
            }
        }

        for (i, seg_channels) in channels.segments_mut().iter_mut().enumerate() {
            seg_channels.advance(voltage[i], ctx.celsius, ctx.dt);
        }

        trace!(
            "[CABLE] {} step {} t={:.4} v0={:.4}",
            cell,
            ctx.step,
            ctx.t_end(),
            voltage.first().copied().unwrap_or_default()
        );
        Ok(())
    }
}
