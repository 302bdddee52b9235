// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Network Integration Engine
//!
//! Advances networks of compartmental cells in fixed time steps:
//! - **CableSolver**: implicit cable equation per cell (tree-ordered elimination)
//! - **EventQueue**: time-ordered spike events with FIFO ties
//! - **Connection**: generators and threshold detectors feeding synapses
//! - **NetworkBuilder**: resolves a declarative [`NetworkSpec`] into a [`Network`]
//! - **Recorder**: probe traces, crossings and deliveries of one run
//!
//! ```no_run
//! use dendrosim_engine::{NetworkBuilder, NetworkSpec, SimulationSettings};
//!
//! # fn main() -> dendrosim_engine::Result<()> {
//! let spec: NetworkSpec = Default::default();
//! let mut network = NetworkBuilder::new(SimulationSettings::default()).build(&spec)?;
//! let record = network.run()?;
//! println!("{} samples", record.time.len());
//! # Ok(())
//! # }
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cable_solver;
pub mod cell;
pub mod connection;
pub mod event_queue;
pub mod network;
pub mod network_builder;
pub mod recorder;
pub mod settings;
pub mod spec;

pub use dendrosim_neural::{Result, SimError};

pub use cable_solver::{CableSolver, StepContext};
pub use cell::{AttachedProcess, Cell};
pub use connection::{Connection, ConnectionSource, EventGenerator, ThresholdDetector};
pub use event_queue::{Event, EventQueue};
pub use network::{Network, SynapseSlot};
pub use network_builder::NetworkBuilder;
pub use recorder::{Crossing, ProbeTarget, Recorder, SimulationRecord, Trace};
pub use settings::SimulationSettings;
pub use spec::{
    CellSpec, ConnectionSpec, GeneratorSpec, NetworkSpec, ProbeSpec, SourceSpec, SynapseSpec,
};
