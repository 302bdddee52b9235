// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Network Specification
//!
//! Declarative description consumed by [`NetworkBuilder`](crate::NetworkBuilder).
//! Everything is referenced by string id; the builder resolves ids and rejects
//! unknown ones before anything is simulated.
//!
//! ```json
//! {
//!   "cells": [{"id": "rc", "template": "relay", "pose": {"z": 1.0}}],
//!   "generators": [{"id": "stim", "start": 5.0, "interval": 4.5, "number": 1}],
//!   "synapses": [{"id": "exc", "cell": "rc", "section": "soma", "position": 0.95,
//!                 "kind": "dual_exp", "tau1": 1.0, "tau2": 2.0, "e": 42.0}],
//!   "connections": [{"source": {"kind": "generator", "generator": "stim"},
//!                    "targets": ["exc"], "weight": 5.0}],
//!   "probes": [{"kind": "voltage", "cell": "rc", "section": "soma", "position": 0.5}]
//! }
//! ```

use dendrosim_neural::morphology::Pose;
use dendrosim_neural::synapse::PointProcessSpec;
use dendrosim_neural::templates::CellTemplate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSpec {
    /// Custom templates; they shadow built-ins of the same name
    pub templates: Vec<CellTemplate>,
    pub cells: Vec<CellSpec>,
    pub generators: Vec<GeneratorSpec>,
    pub synapses: Vec<SynapseSpec>,
    pub connections: Vec<ConnectionSpec>,
    pub probes: Vec<ProbeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSpec {
    pub id: String,
    pub template: String,
    #[serde(default)]
    pub pose: Pose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSpec {
    pub id: String,
    pub start: f64,
    pub interval: f64,
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynapseSpec {
    pub id: String,
    pub cell: String,
    pub section: String,
    pub position: f64,
    #[serde(flatten)]
    pub process: PointProcessSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSpec {
    Generator {
        generator: String,
    },
    Threshold {
        cell: String,
        section: String,
        position: f64,
        /// Falls back to the run's default threshold
        #[serde(default)]
        threshold: Option<f64>,
        /// Falls back to the run's default refractory period
        #[serde(default)]
        refractory: Option<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    /// Generated from the position in the list when absent
    #[serde(default)]
    pub id: Option<String>,
    pub source: SourceSpec,
    pub targets: Vec<String>,
    pub weight: f64,
    #[serde(default)]
    pub delay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeSpec {
    /// Membrane potential (mV)
    Voltage {
        cell: String,
        section: String,
        position: f64,
    },
    /// Pool calcium concentration (mM)
    Calcium {
        cell: String,
        section: String,
        position: f64,
    },
    /// Synaptic conductance (µS)
    Conductance { synapse: String },
}

impl ProbeSpec {
    /// Trace label, e.g. `rc.soma(0.5).v`
    pub fn label(&self) -> String {
        match self {
            ProbeSpec::Voltage {
                cell,
                section,
                position,
            } => format!("{}.{}({}).v", cell, section, position),
            ProbeSpec::Calcium {
                cell,
                section,
                position,
            } => format!("{}.{}({}).cai", cell, section, position),
            ProbeSpec::Conductance { synapse } => format!("{}.g", synapse),
        }
    }
}
