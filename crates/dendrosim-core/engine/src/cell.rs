// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! A cell instance: morphology, installed channels, 3D layout, attached point
//! processes and the integration state that evolves during a run.

use dendrosim_neural::channels::ChannelSet;
use dendrosim_neural::morphology::{CellGeometry, Morphology, Pose};
use dendrosim_neural::synapse::PointProcess;
use dendrosim_neural::templates::CellTemplate;
use dendrosim_neural::{CellId, Result, SimError, SynapseId};

use crate::cable_solver::{CableSolver, StepContext};

/// A point process bound to one segment of its host cell
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedProcess {
    pub id: SynapseId,
    pub name: String,
    pub segment: usize,
    pub process: PointProcess,
}

#[derive(Debug, Clone)]
pub struct Cell {
    id: CellId,
    name: String,
    template: String,
    morphology: Morphology,
    channels: ChannelSet,
    geometry: CellGeometry,
    voltage: Vec<f64>,
    processes: Vec<AttachedProcess>,
    solver: CableSolver,
}

impl Cell {
    /// Build the morphology and channels of `template` and place the layout at `pose`.
    pub fn from_template(
        id: CellId,
        name: impl Into<String>,
        template: &CellTemplate,
        pose: &Pose,
    ) -> Result<Self> {
        let morphology = template.build_morphology()?;
        let channels = ChannelSet::install(&morphology, &template.biophysics())?;
        let mut geometry = CellGeometry::define_shape(&morphology);
        geometry.apply_pose(pose);
        let n = morphology.segment_count();
        Ok(Self {
            id,
            name: name.into(),
            template: template.name.clone(),
            morphology,
            channels,
            geometry,
            voltage: vec![0.0; n],
            processes: Vec::new(),
            solver: CableSolver::new(n),
        })
    }

    /// Attach a point process at `section(position)`; returns its slot on this cell.
    pub fn attach(
        &mut self,
        id: SynapseId,
        name: impl Into<String>,
        section: &str,
        position: f64,
        process: PointProcess,
    ) -> Result<usize> {
        let segment = self.locate(section, position)?;
        self.processes.push(AttachedProcess {
            id,
            name: name.into(),
            segment,
            process,
        });
        Ok(self.processes.len() - 1)
    }

    /// Flattened segment index of `section(position)`, with the cell named in errors
    pub fn locate(&self, section: &str, position: f64) -> Result<usize> {
        self.morphology.locate(section, position).map_err(|e| match e {
            SimError::InvalidReference(msg) => {
                SimError::InvalidReference(format!("cell '{}': {}", self.name, msg))
            }
            SimError::InvalidParameter(msg) => {
                SimError::InvalidParameter(format!("cell '{}': {}", self.name, msg))
            }
            other => other,
        })
    }

    /// Uniform voltage, steady-state gates, empty synapses
    pub fn initialize(&mut self, v_init: f64, celsius: f64) {
        self.voltage.iter_mut().for_each(|v| *v = v_init);
        self.channels.initialize(v_init, celsius);
        for attached in &mut self.processes {
            dendrosim_neural::SynapticMechanism::reset(&mut attached.process);
        }
    }

    pub fn advance(&mut self, ctx: &StepContext) -> Result<()> {
        self.solver.step(
            &self.name,
            &self.morphology,
            &mut self.channels,
            &self.processes,
            &mut self.voltage,
            ctx,
        )
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn morphology(&self) -> &Morphology {
        &self.morphology
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    pub fn geometry(&self) -> &CellGeometry {
        &self.geometry
    }

    pub fn voltages(&self) -> &[f64] {
        &self.voltage
    }

    #[inline]
    pub fn voltage(&self, segment: usize) -> Option<f64> {
        self.voltage.get(segment).copied()
    }

    pub fn processes(&self) -> &[AttachedProcess] {
        &self.processes
    }

    pub fn process(&self, slot: usize) -> Option<&AttachedProcess> {
        self.processes.get(slot)
    }

    pub fn process_mut(&mut self, slot: usize) -> Option<&mut AttachedProcess> {
        self.processes.get_mut(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dendrosim_neural::synapse::{ClampParameters, CurrentClamp};
    use dendrosim_neural::templates::builtin_template;

    #[test]
    fn test_attach_resolves_segment() {
        let template = builtin_template("relay").unwrap();
        let mut cell = Cell::from_template(CellId(0), "rc", &template, &Pose::default()).unwrap();
        let clamp = PointProcess::Clamp(CurrentClamp::new(ClampParameters::default()).unwrap());
        let slot = cell
            .attach(SynapseId(3), "stim", "soma", 0.95, clamp.clone())
            .unwrap();
        assert_eq!(slot, 0);
        assert_eq!(cell.process(0).unwrap().segment, 10);

        let err = cell
            .attach(SynapseId(4), "bad", "dend", 0.5, clamp)
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidReference(ref m) if m.contains("rc")));
    }

    #[test]
    fn test_pose_moves_layout_only() {
        let template = builtin_template("interneuron").unwrap();
        let pose = Pose {
            x: 100.0,
            y: -20.0,
            z: 5.0,
            theta: 1.0,
        };
        let placed = Cell::from_template(CellId(0), "in", &template, &pose).unwrap();
        let origin = Cell::from_template(CellId(1), "in0", &template, &Pose::default()).unwrap();
        assert_eq!(placed.morphology(), origin.morphology());
        let soma = placed.morphology().root();
        assert_eq!(placed.geometry().section_points(soma)[0].z, 5.0);
    }
}
