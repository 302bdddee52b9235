// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # dendrosim
//!
//! Simulation of small networks of multi-compartment neurons: branched cable
//! integration within cells, spike events with axonal delays between them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dendrosim::prelude::*;
//!
//! let spec: NetworkSpec = serde_json::from_str(r#"{
//!     "cells": [{"id": "rc", "template": "relay"}],
//!     "generators": [{"id": "stim", "start": 5.0, "interval": 10.0, "number": 1}],
//!     "synapses": [{"id": "exc", "cell": "rc", "section": "soma", "position": 0.5,
//!                   "kind": "dual_exp", "tau1": 0.1, "tau2": 4.2, "e": 42.0}],
//!     "connections": [{"source": {"kind": "generator", "generator": "stim"},
//!                      "targets": ["exc"], "weight": 2.0}],
//!     "probes": [{"kind": "voltage", "cell": "rc", "section": "soma", "position": 0.5}]
//! }"#)?;
//!
//! let settings = settings_from_config(&DendrosimConfig::default());
//! let mut network = NetworkBuilder::new(settings).build(&spec)?;
//! let record = network.run()?;
//! println!("{} samples", record.time.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  dendrosim-neural                                       │
//! │  (morphology, mechanisms, synapse waveforms, templates) │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  dendrosim-engine                                       │
//! │  (cable solver, event queue, connections, network)      │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  dendrosim (this crate) + dendrosim-config              │
//! │  + dendrosim-observability: tools and run settings      │
//! └─────────────────────────────────────────────────────────┘
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use dendrosim_config as config;
pub use dendrosim_engine as engine;
pub use dendrosim_neural as neural;
pub use dendrosim_observability as observability;

use dendrosim_config::DendrosimConfig;
use dendrosim_engine::SimulationSettings;

/// Run settings for the engine from a loaded configuration
pub fn settings_from_config(config: &DendrosimConfig) -> SimulationSettings {
    SimulationSettings {
        dt: config.simulation.dt,
        t_stop: config.simulation.t_stop,
        celsius: config.simulation.celsius,
        v_init: config.simulation.v_init,
        parallel_cells: config.simulation.parallel_cells,
        record_interval: config.recording.interval,
        default_threshold: config.detection.default_threshold,
        default_refractory: config.detection.refractory,
        progress_interval: config.logging.progress_interval,
    }
}

/// Logging setup for the tools from a loaded configuration
pub fn logging_from_config(config: &DendrosimConfig) -> dendrosim_observability::LoggingConfig {
    dendrosim_observability::LoggingConfig::with_level(config.logging.level.clone())
}

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::{logging_from_config, settings_from_config};
    pub use dendrosim_config::{load_config, validate_config, DendrosimConfig};
    pub use dendrosim_engine::{
        Network, NetworkBuilder, NetworkSpec, ProbeSpec, SimulationRecord, SimulationSettings,
    };
    pub use dendrosim_neural::{
        builtin_template, CellTemplate, MechanismSpec, PointProcessSpec, Pose, SimError,
        SynapticMechanism,
    };
}
