// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Network
//!
//! Owns every cell, synapse, connection and the event queue of one run and
//! advances them together on a single clock.
//!
//! ## Step order
//! ```text
//! solve all cells over [t, t+dt]      (independent; optionally in parallel)
//! t ← t + dt
//! threshold checks → schedule events at t + delay
//! deliver every event due at or before t, as one batch
//! record probes
//! ```
//! Cells only interact through synapses whose state changes at step
//! boundaries, which is what makes the per-cell solves independent.

use std::time::Instant;

use ahash::AHashMap;
use dendrosim_neural::{Result, SimError, SynapseId, SynapticMechanism};
use rayon::prelude::*;
use tracing::{debug, error, info};

use crate::cable_solver::StepContext;
use crate::cell::{AttachedProcess, Cell};
use crate::connection::{Connection, ConnectionSource};
use crate::event_queue::{Event, EventQueue};
use crate::recorder::{Recorder, SimulationRecord};
use crate::settings::SimulationSettings;

/// Location of a synapse: host cell and slot on that cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynapseSlot {
    pub cell: usize,
    pub slot: usize,
}

#[derive(Debug)]
pub struct Network {
    settings: SimulationSettings,
    cells: Vec<Cell>,
    cell_index: AHashMap<String, usize>,
    synapses: Vec<SynapseSlot>,
    synapse_index: AHashMap<String, SynapseId>,
    connections: Vec<Connection>,
    queue: EventQueue,
    recorder: Recorder,
    step_index: u64,
    t: f64,
    due: Vec<Event>,
    halted: Option<SimError>,
}

impl Network {
    pub(crate) fn new(
        settings: SimulationSettings,
        cells: Vec<Cell>,
        cell_index: AHashMap<String, usize>,
        synapses: Vec<SynapseSlot>,
        synapse_index: AHashMap<String, SynapseId>,
        connections: Vec<Connection>,
        recorder: Recorder,
    ) -> Self {
        Self {
            settings,
            cells,
            cell_index,
            synapses,
            synapse_index,
            connections,
            queue: EventQueue::new(),
            recorder,
            step_index: 0,
            t: 0.0,
            due: Vec::new(),
            halted: None,
        }
    }

    /// Reset to `t = 0`: resting state everywhere, generator events queued,
    /// record cleared. Events due at `t = 0` are delivered immediately.
    pub fn initialize(&mut self) {
        let SimulationSettings {
            v_init, celsius, ..
        } = self.settings;
        self.step_index = 0;
        self.t = 0.0;
        self.halted = None;

        for cell in &mut self.cells {
            cell.initialize(v_init, celsius);
        }

        self.queue.clear();
        for conn in &mut self.connections {
            match &mut conn.source {
                ConnectionSource::Threshold(detector) => {
                    let v = self.cells[detector.cell]
                        .voltage(detector.segment)
                        .unwrap_or(v_init);
                    detector.initialize(v);
                }
                ConnectionSource::Generator { .. } => {
                    for event in conn.scheduled_events() {
                        self.queue.schedule(event);
                    }
                }
            }
        }

        self.recorder.clear();
        self.deliver_due();
        self.recorder.sample(0, 0.0, &self.cells);
        debug!(
            "[NETWORK] initialized at v_init={} mV, celsius={}, {} events pending",
            v_init,
            celsius,
            self.queue.len()
        );
    }

    /// Advance every cell by one `dt`, then detect, deliver and record.
    pub fn step(&mut self) -> Result<()> {
        if let Some(err) = &self.halted {
            return Err(err.clone());
        }

        let ctx = StepContext {
            step: self.step_index + 1,
            t: self.t,
            dt: self.settings.dt,
            celsius: self.settings.celsius,
        };

        let solved = if self.settings.parallel_cells && self.cells.len() > 1 {
            // Collected in cell order so the reported failure is deterministic
            let results: Vec<Result<()>> = self
                .cells
                .par_iter_mut()
                .map(|cell| cell.advance(&ctx))
                .collect();
            results.into_iter().collect::<Result<()>>()
        } else {
            self.cells.iter_mut().try_for_each(|cell| cell.advance(&ctx))
        };
        if let Err(err) = solved {
            error!("[NETWORK] run halted: {}", err);
            self.halted = Some(err.clone());
            return Err(err);
        }

        self.step_index += 1;
        self.t = self.step_index as f64 * self.settings.dt;
        let t = self.t;

        for conn in &mut self.connections {
            let ConnectionSource::Threshold(detector) = &mut conn.source else {
                continue;
            };
            let v = self.cells[detector.cell]
                .voltage(detector.segment)
                .unwrap_or(f64::NAN);
            if detector.check(v, t) {
                debug!(
                    "[NETWORK] '{}' crossed {} mV at t={:.4} ms",
                    conn.name, detector.threshold, t
                );
                self.recorder.crossing(&conn.name, t);
                for event in conn.events_from(t) {
                    self.queue.schedule(event);
                }
            }
        }

        self.deliver_due();
        self.recorder.sample(self.step_index, t, &self.cells);

        if self.settings.progress_interval > 0.0 {
            let every = ((self.settings.progress_interval / self.settings.dt).round() as u64).max(1);
            if self.step_index % every == 0 {
                info!(
                    "[NETWORK] t={:.3} ms ({} steps, {} events delivered)",
                    t,
                    self.step_index,
                    self.queue.delivered_count()
                );
            }
        }
        Ok(())
    }

    /// Step until `t_stop` from the settings
    pub fn run(&mut self) -> Result<&SimulationRecord> {
        self.run_until(self.settings.t_stop)
    }

    /// Step until the clock reaches `t_end` (ms)
    pub fn run_until(&mut self, t_end: f64) -> Result<&SimulationRecord> {
        let target = (t_end / self.settings.dt).round() as u64;
        let started = Instant::now();
        info!(
            "[NETWORK] running from t={:.3} to t={:.3} ms (dt={} ms)",
            self.t, t_end, self.settings.dt
        );
        while self.step_index < target {
            self.step()?;
        }
        info!(
            "[NETWORK] reached t={:.3} ms in {:.2?} ({} events delivered)",
            self.t,
            started.elapsed(),
            self.queue.delivered_count()
        );
        Ok(self.recorder.record())
    }

    fn deliver_due(&mut self) {
        let now = self.t + self.settings.event_tolerance();
        self.queue.pop_due_into(now, &mut self.due);
        for event in self.due.drain(..) {
            let Some(slot) = self.synapses.get(event.target.index()) else {
                continue;
            };
            if let Some(attached) = self.cells[slot.cell].process_mut(slot.slot) {
                attached.process.deliver(event.time, event.weight);
                debug!(
                    "[NETWORK] delivered w={} to '{}' (event t={:.4}, now {:.4})",
                    event.weight, attached.name, event.time, self.t
                );
            }
            self.recorder.delivery(event);
        }
    }

    /// Current simulation time (ms)
    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn step_index(&self) -> u64 {
        self.step_index
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cell_index.get(name).map(|&i| &self.cells[i])
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn synapse(&self, name: &str) -> Option<&AttachedProcess> {
        let id = self.synapse_index.get(name)?;
        let slot = self.synapses.get(id.index())?;
        self.cells[slot.cell].process(slot.slot)
    }

    /// Membrane potential at `cell.section(position)` (mV)
    pub fn voltage(&self, cell: &str, section: &str, position: f64) -> Result<f64> {
        let c = self
            .cell(cell)
            .ok_or_else(|| SimError::InvalidReference(format!("unknown cell '{}'", cell)))?;
        let segment = c.locate(section, position)?;
        Ok(c.voltages()[segment])
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    pub fn record(&self) -> &SimulationRecord {
        self.recorder.record()
    }

    pub fn into_record(self) -> SimulationRecord {
        self.recorder.into_record()
    }
}
