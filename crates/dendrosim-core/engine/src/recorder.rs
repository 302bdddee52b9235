// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Sampling of probes into a serializable record

use dendrosim_neural::SynapticMechanism;
use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::event_queue::Event;

/// A probe resolved to indices into the network
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeTarget {
    Voltage { cell: usize, segment: usize },
    Calcium { cell: usize, segment: usize },
    Conductance { cell: usize, slot: usize },
}

impl ProbeTarget {
    fn quantity(&self) -> (&'static str, &'static str) {
        match self {
            ProbeTarget::Voltage { .. } => ("voltage", "mV"),
            ProbeTarget::Calcium { .. } => ("calcium", "mM"),
            ProbeTarget::Conductance { .. } => ("conductance", "uS"),
        }
    }

    fn sample(&self, cells: &[Cell], t: f64) -> f64 {
        match *self {
            ProbeTarget::Voltage { cell, segment } => {
                cells[cell].voltage(segment).unwrap_or(f64::NAN)
            }
            ProbeTarget::Calcium { cell, segment } => cells[cell]
                .channels()
                .segment(segment)
                .and_then(|s| s.calcium())
                .unwrap_or(f64::NAN),
            ProbeTarget::Conductance { cell, slot } => cells[cell]
                .process(slot)
                .map_or(f64::NAN, |p| p.process.conductance(t)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub label: String,
    pub quantity: String,
    pub unit: String,
    pub values: Vec<f64>,
}

/// A detector crossing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crossing {
    pub connection: String,
    pub time: f64,
}

/// Everything a run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    /// Sample times (ms), shared by every trace
    pub time: Vec<f64>,
    pub traces: Vec<Trace>,
    pub crossings: Vec<Crossing>,
    /// Delivered events in delivery order
    pub deliveries: Vec<Event>,
}

impl SimulationRecord {
    pub fn trace(&self, label: &str) -> Option<&Trace> {
        self.traces.iter().find(|t| t.label == label)
    }
}

#[derive(Debug, Clone)]
pub struct Recorder {
    stride: u64,
    probes: Vec<ProbeTarget>,
    record: SimulationRecord,
}

impl Recorder {
    pub fn new(stride: u64, probes: Vec<(String, ProbeTarget)>) -> Self {
        let traces = probes
            .iter()
            .map(|(label, target)| {
                let (quantity, unit) = target.quantity();
                Trace {
                    label: label.clone(),
                    quantity: quantity.to_string(),
                    unit: unit.to_string(),
                    values: Vec::new(),
                }
            })
            .collect();
        Self {
            stride: stride.max(1),
            probes: probes.into_iter().map(|(_, target)| target).collect(),
            record: SimulationRecord {
                traces,
                ..Default::default()
            },
        }
    }

    /// Sample every probe if `step` falls on the recording stride
    pub fn sample(&mut self, step: u64, t: f64, cells: &[Cell]) {
        if step % self.stride != 0 {
            return;
        }
        self.record.time.push(t);
        for (trace, probe) in self.record.traces.iter_mut().zip(&self.probes) {
            trace.values.push(probe.sample(cells, t));
        }
    }

    pub fn crossing(&mut self, connection: &str, time: f64) {
        self.record.crossings.push(Crossing {
            connection: connection.to_string(),
            time,
        });
    }

    pub fn delivery(&mut self, event: Event) {
        self.record.deliveries.push(event);
    }

    /// Drop everything recorded so far, keeping the probes
    pub fn clear(&mut self) {
        self.record.time.clear();
        self.record.crossings.clear();
        self.record.deliveries.clear();
        for trace in &mut self.record.traces {
            trace.values.clear();
        }
    }

    pub fn record(&self) -> &SimulationRecord {
        &self.record
    }

    pub fn into_record(self) -> SimulationRecord {
        self.record
    }
}
