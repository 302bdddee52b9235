// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Compartmental Neuron Building Blocks
//!
//! Everything needed to describe a single multi-compartment cell:
//! - **Types**: ids, error taxonomy, unit conversions
//! - **Morphology**: sections, segments, the compartment tree and its 3D layout
//! - **Channels**: membrane mechanisms and their kinetic state
//! - **Synapse**: postsynaptic conductance waveforms and current clamps
//! - **Templates**: built-in interneuron / relay cell tables
//!
//! Integration in time lives in `dendrosim-engine`.
//!
//! ## Units
//! ```text
//! voltage      mV        length/diameter  µm
//! time         ms        axial resistivity Ω·cm
//! capacitance  µF/cm²    conductance density S/cm²
//! point current nA       point conductance µS
//! concentration mM
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod types;

pub mod morphology;

pub mod channels;

pub mod synapse;

pub mod templates;

pub use types::{CellId, Result, SectionId, SimError, SynapseId};

pub use morphology::{
    CellGeometry, CompartmentTree, DiameterProfile, Morphology, Point3, Pose, Section,
    SectionSpec, Segment,
};

pub use channels::{
    BiophysicsTable, ChannelSet, IonEnvironment, Mechanism, MechanismParameters, MechanismSpec,
    MembraneMechanism, SectionBiophysics,
};

pub use synapse::{
    AlphaSynapse, CurrentClamp, DualExpSynapse, PointCurrent, PointProcess, PointProcessSpec,
    SynapticMechanism,
};

pub use templates::{builtin_template, CellTemplate, SectionTemplate, TemplateAttachment};
