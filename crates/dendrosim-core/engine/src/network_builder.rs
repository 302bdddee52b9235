// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Network Builder
//!
//! Turns a [`NetworkSpec`] into a runnable [`Network`]. All ids are resolved
//! and all parameters validated here; any failure aborts the build, so a
//! network is either complete or not returned at all.
//!
//! Build order:
//! 1. templates (custom, then built-in) and cells
//! 2. synapses, attached to their host segments
//! 3. generators and connections
//! 4. probes

use ahash::AHashMap;
use dendrosim_neural::templates::{builtin_template, CellTemplate};
use dendrosim_neural::{CellId, Result, SimError, SynapseId, SynapticMechanism};
use tracing::{debug, info};

use crate::cell::Cell;
use crate::connection::{Connection, ConnectionSource, EventGenerator, ThresholdDetector};
use crate::network::{Network, SynapseSlot};
use crate::recorder::{ProbeTarget, Recorder};
use crate::settings::SimulationSettings;
use crate::spec::{NetworkSpec, ProbeSpec, SourceSpec};

#[derive(Debug, Clone, Default)]
pub struct NetworkBuilder {
    settings: SimulationSettings,
}

impl NetworkBuilder {
    pub fn new(settings: SimulationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Resolve, validate and instantiate everything in `spec`, then initialize
    /// the network so the first call to `step` integrates from `t = 0`.
    pub fn build(&self, spec: &NetworkSpec) -> Result<Network> {
        self.settings.validate()?;

        let templates = resolve_templates(spec)?;

        // Cells
        let mut cells = Vec::with_capacity(spec.cells.len());
        let mut cell_index: AHashMap<String, usize> = AHashMap::new();
        for (i, cell_spec) in spec.cells.iter().enumerate() {
            if cell_index.contains_key(&cell_spec.id) {
                return Err(SimError::InvalidReference(format!(
                    "duplicate cell id '{}'",
                    cell_spec.id
                )));
            }
            let template = templates.get(cell_spec.template.as_str()).ok_or_else(|| {
                SimError::InvalidReference(format!(
                    "cell '{}' uses unknown template '{}'",
                    cell_spec.id, cell_spec.template
                ))
            })?;
            let cell = Cell::from_template(CellId(i as u32), &cell_spec.id, template, &cell_spec.pose)?;
            debug!(
                "[BUILDER] cell '{}' ({}) with {} segments",
                cell_spec.id,
                cell_spec.template,
                cell.morphology().segment_count()
            );
            cell_index.insert(cell_spec.id.clone(), i);
            cells.push(cell);
        }

        let find_cell = |id: &str| -> Result<usize> {
            cell_index
                .get(id)
                .copied()
                .ok_or_else(|| SimError::InvalidReference(format!("unknown cell '{}'", id)))
        };

        // Synapses
        let mut synapses: Vec<SynapseSlot> = Vec::with_capacity(spec.synapses.len());
        let mut synapse_index: AHashMap<String, SynapseId> = AHashMap::new();
        for syn_spec in &spec.synapses {
            if synapse_index.contains_key(&syn_spec.id) {
                return Err(SimError::InvalidReference(format!(
                    "duplicate synapse id '{}'",
                    syn_spec.id
                )));
            }
            let cell = find_cell(&syn_spec.cell)?;
            let process = syn_spec.process.instantiate().map_err(|e| match e {
                SimError::InvalidParameter(msg) => {
                    SimError::InvalidParameter(format!("synapse '{}': {}", syn_spec.id, msg))
                }
                other => other,
            })?;
            let id = SynapseId(synapses.len() as u32);
            let slot = cells[cell].attach(
                id,
                &syn_spec.id,
                &syn_spec.section,
                syn_spec.position,
                process,
            )?;
            synapses.push(SynapseSlot { cell, slot });
            synapse_index.insert(syn_spec.id.clone(), id);
        }

        // Generators
        let mut generators: AHashMap<&str, EventGenerator> = AHashMap::new();
        for gen in &spec.generators {
            let generator = EventGenerator {
                start: gen.start,
                interval: gen.interval,
                number: gen.number,
            };
            generator.validate().map_err(|e| match e {
                SimError::InvalidParameter(msg) => {
                    SimError::InvalidParameter(format!("generator '{}': {}", gen.id, msg))
                }
                other => other,
            })?;
            if generators.insert(gen.id.as_str(), generator).is_some() {
                return Err(SimError::InvalidReference(format!(
                    "duplicate generator id '{}'",
                    gen.id
                )));
            }
        }

        // Connections
        let mut connections = Vec::with_capacity(spec.connections.len());
        for (i, conn_spec) in spec.connections.iter().enumerate() {
            let name = conn_spec
                .id
                .clone()
                .unwrap_or_else(|| format!("connection{}", i));

            let source = match &conn_spec.source {
                SourceSpec::Generator { generator } => {
                    let g = generators.get(generator.as_str()).ok_or_else(|| {
                        SimError::InvalidReference(format!(
                            "connection '{}' uses unknown generator '{}'",
                            name, generator
                        ))
                    })?;
                    ConnectionSource::Generator {
                        name: generator.clone(),
                        generator: *g,
                    }
                }
                SourceSpec::Threshold {
                    cell,
                    section,
                    position,
                    threshold,
                    refractory,
                } => {
                    let cell_idx = find_cell(cell)?;
                    let segment = cells[cell_idx].locate(section, *position)?;
                    ConnectionSource::Threshold(ThresholdDetector::new(
                        cell_idx,
                        segment,
                        threshold.unwrap_or(self.settings.default_threshold),
                        refractory.unwrap_or(self.settings.default_refractory),
                    )?)
                }
            };

            let mut targets = Vec::with_capacity(conn_spec.targets.len());
            for target in &conn_spec.targets {
                let id = *synapse_index.get(target.as_str()).ok_or_else(|| {
                    SimError::InvalidReference(format!(
                        "connection '{}' targets unknown synapse '{}'",
                        name, target
                    ))
                })?;
                let slot = synapses[id.index()];
                let accepts = cells[slot.cell]
                    .process(slot.slot)
                    .is_some_and(|p| p.process.accepts_events());
                if !accepts {
                    return Err(SimError::InvalidReference(format!(
                        "connection '{}' targets '{}', which does not receive events",
                        name, target
                    )));
                }
                targets.push(id);
            }

            connections.push(Connection::new(
                name,
                source,
                targets,
                conn_spec.weight,
                conn_spec.delay,
            )?);
        }

        // Probes
        let mut probes = Vec::with_capacity(spec.probes.len());
        for probe in &spec.probes {
            let target = match probe {
                ProbeSpec::Voltage {
                    cell,
                    section,
                    position,
                } => {
                    let cell = find_cell(cell)?;
                    let segment = cells[cell].locate(section, *position)?;
                    ProbeTarget::Voltage { cell, segment }
                }
                ProbeSpec::Calcium {
                    cell,
                    section,
                    position,
                } => {
                    let cell = find_cell(cell)?;
                    let segment = cells[cell].locate(section, *position)?;
                    let has_pool = cells[cell]
                        .channels()
                        .segment(segment)
                        .is_some_and(|s| s.calcium().is_some());
                    if !has_pool {
                        return Err(SimError::InvalidReference(format!(
                            "probe '{}': no calcium pool at that location",
                            probe.label()
                        )));
                    }
                    ProbeTarget::Calcium { cell, segment }
                }
                ProbeSpec::Conductance { synapse } => {
                    let id = synapse_index.get(synapse.as_str()).ok_or_else(|| {
                        SimError::InvalidReference(format!(
                            "probe on unknown synapse '{}'",
                            synapse
                        ))
                    })?;
                    let slot = synapses[id.index()];
                    ProbeTarget::Conductance {
                        cell: slot.cell,
                        slot: slot.slot,
                    }
                }
            };
            probes.push((probe.label(), target));
        }

        info!(
            "[BUILDER] network built: {} cells, {} synapses, {} connections, {} probes",
            cells.len(),
            synapses.len(),
            connections.len(),
            probes.len()
        );

        let recorder = Recorder::new(self.settings.record_stride(), probes);
        let mut network = Network::new(
            self.settings,
            cells,
            cell_index,
            synapses,
            synapse_index,
            connections,
            recorder,
        );
        network.initialize();
        Ok(network)
    }
}

/// Custom templates shadow built-ins of the same name
fn resolve_templates(spec: &NetworkSpec) -> Result<AHashMap<&str, CellTemplate>> {
    let mut templates: AHashMap<&str, CellTemplate> = AHashMap::new();
    for custom in &spec.templates {
        if templates.insert(custom.name.as_str(), custom.clone()).is_some() {
            return Err(SimError::InvalidReference(format!(
                "duplicate template '{}'",
                custom.name
            )));
        }
    }
    for cell in &spec.cells {
        let name = cell.template.as_str();
        if !templates.contains_key(name) {
            if let Some(template) = builtin_template(name) {
                templates.insert(name, template);
            }
        }
    }
    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{CellSpec, ConnectionSpec, GeneratorSpec, SynapseSpec};
    use dendrosim_neural::synapse::{ClampParameters, DualExpParameters, PointProcessSpec};

    fn base_spec() -> NetworkSpec {
        NetworkSpec {
            cells: vec![
                CellSpec {
                    id: "rc".into(),
                    template: "relay".into(),
                    pose: Default::default(),
                },
                CellSpec {
                    id: "in".into(),
                    template: "interneuron".into(),
                    pose: Default::default(),
                },
            ],
            generators: vec![GeneratorSpec {
                id: "stim".into(),
                start: 5.0,
                interval: 4.5,
                number: 1,
            }],
            synapses: vec![
                SynapseSpec {
                    id: "exc".into(),
                    cell: "rc".into(),
                    section: "soma".into(),
                    position: 0.95,
                    process: PointProcessSpec::DualExp(DualExpParameters::default()),
                },
                SynapseSpec {
                    id: "clamp".into(),
                    cell: "in".into(),
                    section: "dend1_p".into(),
                    position: 0.1,
                    process: PointProcessSpec::Clamp(ClampParameters::default()),
                },
            ],
            connections: vec![ConnectionSpec {
                id: None,
                source: SourceSpec::Generator {
                    generator: "stim".into(),
                },
                targets: vec!["exc".into()],
                weight: 5.0,
                delay: 0.0,
            }],
            ..Default::default()
        }
    }

    fn build(spec: &NetworkSpec) -> Result<Network> {
        NetworkBuilder::new(SimulationSettings {
            parallel_cells: false,
            ..Default::default()
        })
        .build(spec)
    }

    #[test]
    fn test_builds_valid_spec() {
        let net = build(&base_spec()).unwrap();
        assert_eq!(net.cells().len(), 2);
        assert_eq!(net.pending_events(), 1);
    }

    #[test]
    fn test_unknown_cell_is_reference_error() {
        let mut spec = base_spec();
        spec.synapses[0].cell = "ghost".into();
        assert!(matches!(build(&spec), Err(SimError::InvalidReference(_))));
    }

    #[test]
    fn test_unknown_section_is_reference_error() {
        let mut spec = base_spec();
        spec.synapses[0].section = "dend9".into();
        assert!(matches!(build(&spec), Err(SimError::InvalidReference(_))));
    }

    #[test]
    fn test_unknown_template_generator_and_target() {
        let mut spec = base_spec();
        spec.cells[0].template = "pyramidal".into();
        assert!(matches!(build(&spec), Err(SimError::InvalidReference(_))));

        let mut spec = base_spec();
        spec.connections[0].source = SourceSpec::Generator {
            generator: "nope".into(),
        };
        assert!(matches!(build(&spec), Err(SimError::InvalidReference(_))));

        let mut spec = base_spec();
        spec.connections[0].targets.push("missing".into());
        assert!(matches!(build(&spec), Err(SimError::InvalidReference(_))));
    }

    #[test]
    fn test_clamp_cannot_be_connection_target() {
        let mut spec = base_spec();
        spec.connections[0].targets = vec!["clamp".into()];
        assert!(matches!(build(&spec), Err(SimError::InvalidReference(_))));
    }

    #[test]
    fn test_bad_parameters_abort_build() {
        let mut spec = base_spec();
        spec.synapses[0].process = PointProcessSpec::DualExp(DualExpParameters {
            tau2: -1.0,
            ..Default::default()
        });
        assert!(matches!(build(&spec), Err(SimError::InvalidParameter(_))));

        let mut spec = base_spec();
        spec.connections[0].delay = -1.0;
        assert!(matches!(build(&spec), Err(SimError::InvalidParameter(_))));
    }

    #[test]
    fn test_calcium_probe_on_pooled_segment() {
        let mut spec = base_spec();
        spec.probes.push(ProbeSpec::Calcium {
            cell: "rc".into(),
            section: "soma".into(),
            position: 0.5,
        });
        assert!(build(&spec).is_ok());
    }
}
