// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Cell Templates
//!
//! A template is a data table: one row per section with its geometry, its
//! attachment point and its biophysics. Building a cell from a template is a
//! uniform pass over that table, so cell variants differ only in their rows.
//!
//! Built-in templates:
//! - `interneuron`: soma, two-part axon and three two-part dendrites, each
//!   distal part attached to the 1-end of its own proximal part
//! - `interneuron_single_dendrite`: soma, two-part axon and one two-part dendrite
//! - `relay`: a single large soma

use serde::{Deserialize, Serialize};

use crate::channels::{
    BiophysicsTable, HodgkinHuxleyParameters, MechanismSpec, PassiveParameters, SectionBiophysics,
};
use crate::morphology::{CompartmentTree, DiameterProfile, Morphology, SectionSpec};
use crate::types::Result;

/// Where a section's 0-end attaches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateAttachment {
    pub section: String,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionTemplate {
    pub section: SectionSpec,
    /// `None` only for the root
    #[serde(default)]
    pub parent: Option<TemplateAttachment>,
    #[serde(default)]
    pub biophysics: SectionBiophysics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellTemplate {
    pub name: String,
    pub sections: Vec<SectionTemplate>,
}

impl CellTemplate {
    /// Create every section, then attach them; structural errors surface as
    /// `InvalidTopology`.
    pub fn build_morphology(&self) -> Result<Morphology> {
        let mut tree = CompartmentTree::new();
        for row in &self.sections {
            tree.create(row.section.clone())?;
        }
        for row in &self.sections {
            if let Some(parent) = &row.parent {
                tree.attach_by_name(&row.section.name, &parent.section, parent.position)?;
            }
        }
        tree.finalize()
    }

    pub fn biophysics(&self) -> BiophysicsTable {
        self.sections.iter().fold(BiophysicsTable::new(), |table, row| {
            table.with_section(row.section.name.clone(), row.biophysics.clone())
        })
    }
}

/// Look up a built-in template by name
pub fn builtin_template(name: &str) -> Option<CellTemplate> {
    match name {
        "interneuron" => Some(interneuron()),
        "interneuron_single_dendrite" => Some(interneuron_single_dendrite()),
        "relay" => Some(relay()),
        _ => None,
    }
}

/// Names accepted by [`builtin_template`]
pub const BUILTIN_TEMPLATES: [&str; 3] = ["interneuron", "interneuron_single_dendrite", "relay"];

const NSEG: u32 = 11;
const PROXIMAL_TAPER: DiameterProfile = DiameterProfile::Taper {
    zero_end: 4.0,
    one_end: 0.3,
};

fn row(
    section: SectionSpec,
    parent: Option<(&str, f64)>,
    biophysics: SectionBiophysics,
) -> SectionTemplate {
    SectionTemplate {
        section,
        parent: parent.map(|(section, position)| TemplateAttachment {
            section: section.to_string(),
            position,
        }),
        biophysics,
    }
}

/// Calcium and slow currents present on every section of both cell types
fn with_thalamic_currents(bio: SectionBiophysics) -> SectionBiophysics {
    bio.with(MechanismSpec::Iar(Default::default()))
        .with(MechanismSpec::Cad(Default::default()))
        .with(MechanismSpec::Ical(Default::default()))
        .with(MechanismSpec::It2(Default::default()))
        .with(MechanismSpec::Iahp(Default::default()))
        .with(MechanismSpec::Hh2(Default::default()))
        .with(MechanismSpec::Ican(Default::default()))
        .with_reversals(50.0, -90.0)
}

fn hh(gnabar: f64, gkbar: f64, gl: f64, el: f64) -> MechanismSpec {
    MechanismSpec::Hh(HodgkinHuxleyParameters {
        gnabar,
        gkbar,
        gl,
        el,
    })
}

fn pas(g: f64, e: f64) -> MechanismSpec {
    MechanismSpec::Pas(PassiveParameters { g, e })
}

/// Two-part neurites hanging off a shared soma
fn interneuron_rows(
    ra: f64,
    cm: f64,
    dendrites: &[(&str, &str, f64)],
    soma_bio: SectionBiophysics,
    neurite_bio: SectionBiophysics,
) -> Vec<SectionTemplate> {
    let cable = |name: &str, length: f64, diameter: DiameterProfile| {
        SectionSpec::new(name, length, diameter, NSEG).with_passive(ra, cm)
    };

    let mut rows = vec![
        row(
            cable("soma", 15.3, DiameterProfile::Uniform(17.4)),
            None,
            soma_bio,
        ),
        row(
            cable("axon_p", 100.0, PROXIMAL_TAPER),
            Some(("soma", 0.0)),
            neurite_bio.clone(),
        ),
        row(
            cable("axon_d", 400.0, DiameterProfile::Uniform(0.3)),
            Some(("axon_p", 1.0)),
            neurite_bio.clone(),
        ),
    ];
    for &(proximal, distal, position) in dendrites {
        rows.push(row(
            cable(proximal, 100.0, PROXIMAL_TAPER),
            Some(("soma", position)),
            neurite_bio.clone(),
        ));
        rows.push(row(
            cable(distal, 400.0, DiameterProfile::Uniform(0.3)),
            Some((proximal, 1.0)),
            neurite_bio.clone(),
        ));
    }
    rows
}

/// Every distal dendrite hangs off the 1-end of its own proximal part.
///
/// The `ballandsticks2` model script wires `dend3_d` to `dend2_p(1)` instead,
/// leaving `dend3_p` a bare stub. Traces from dendrite 2 and 3 will differ
/// from that script's output; build a custom template with the same rows and
/// `dend3_d` re-parented to reproduce it.
fn interneuron() -> CellTemplate {
    let soma = with_thalamic_currents(
        SectionBiophysics::new()
            .with(hh(0.05, 0.05, 0.0003, -50.0))
            .with(pas(0.0001, -60.0)),
    );
    let neurite = with_thalamic_currents(
        SectionBiophysics::new()
            .with(pas(0.005, -65.0))
            .with(hh(0.5, 0.1, 0.0003, -50.0)),
    );
    CellTemplate {
        name: "interneuron".to_string(),
        sections: interneuron_rows(
            250.0,
            1.0,
            &[
                ("dend1_p", "dend1_d", 0.3),
                ("dend2_p", "dend2_d", 0.6),
                ("dend3_p", "dend3_d", 0.9),
            ],
            soma,
            neurite,
        ),
    }
}

fn interneuron_single_dendrite() -> CellTemplate {
    let soma = with_thalamic_currents(
        SectionBiophysics::new()
            .with(hh(0.5, 0.1, 0.0003, -54.3))
            .with(pas(0.0001, -60.0)),
    );
    let neurite = with_thalamic_currents(
        SectionBiophysics::new()
            .with(pas(0.005, -65.0))
            .with(hh(0.5, 0.1, 0.0003, -54.3)),
    );
    CellTemplate {
        name: "interneuron_single_dendrite".to_string(),
        sections: interneuron_rows(113.0, 1.1, &[("dend_p", "dend_d", 1.0)], soma, neurite),
    }
}

fn relay() -> CellTemplate {
    let soma = with_thalamic_currents(
        SectionBiophysics::new()
            .with(hh(0.1, 0.025, 0.0001, -50.0))
            .with(pas(0.0001, -60.0)),
    );
    CellTemplate {
        name: "relay".to_string(),
        sections: vec![row(
            SectionSpec::new("soma", 50.0, DiameterProfile::Uniform(47.0), NSEG)
                .with_passive(1000.0, 1.0),
            None,
            soma,
        )],
    }
}
