// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Integration Tests: Network Dynamics
//!
//! End-to-end behaviour of built networks:
//! - Passive steady state under constant current
//! - Quiescent cells stay bounded
//! - Threshold crossing → delayed delivery
//! - Same-time events keep their scheduling order
//! - Synaptic conductance waveform seen through a probe

use dendrosim_engine::{
    CellSpec, ConnectionSpec, GeneratorSpec, Network, NetworkBuilder, NetworkSpec, ProbeSpec,
    SimulationSettings, SourceSpec, SynapseSpec,
};
use dendrosim_neural::channels::{MechanismSpec, PassiveParameters, SectionBiophysics};
use dendrosim_neural::morphology::{DiameterProfile, SectionSpec};
use dendrosim_neural::synapse::{ClampParameters, DualExpParameters, PointProcessSpec};
use dendrosim_neural::templates::{CellTemplate, SectionTemplate};

// ═══════════════════════════════════════════════════════════
// Helper Functions
// ═══════════════════════════════════════════════════════════

const LEAK_G: f64 = 0.001;
const LEAK_E: f64 = -65.0;
const SOMA_L: f64 = 10.0;
const SOMA_D: f64 = 10.0;

/// Single isopotential compartment with only a leak
fn point_cell_template() -> CellTemplate {
    CellTemplate {
        name: "point".into(),
        sections: vec![SectionTemplate {
            section: SectionSpec::new("soma", SOMA_L, DiameterProfile::Uniform(SOMA_D), 1),
            parent: None,
            biophysics: SectionBiophysics::new().with(MechanismSpec::Pas(PassiveParameters {
                g: LEAK_G,
                e: LEAK_E,
            })),
        }],
    }
}

/// Leak conductance of the point cell in µS
fn point_cell_leak() -> f64 {
    LEAK_G * std::f64::consts::PI * SOMA_D * SOMA_L * 1e-2
}

fn cell(id: &str, template: &str) -> CellSpec {
    CellSpec {
        id: id.into(),
        template: template.into(),
        pose: Default::default(),
    }
}

fn clamp(id: &str, cell: &str, delay: f64, dur: f64, amp: f64) -> SynapseSpec {
    SynapseSpec {
        id: id.into(),
        cell: cell.into(),
        section: "soma".into(),
        position: 0.5,
        process: PointProcessSpec::Clamp(ClampParameters { delay, dur, amp }),
    }
}

fn dual_exp(id: &str, cell: &str, tau1: f64, tau2: f64) -> SynapseSpec {
    SynapseSpec {
        id: id.into(),
        cell: cell.into(),
        section: "soma".into(),
        position: 0.5,
        process: PointProcessSpec::DualExp(DualExpParameters {
            tau1,
            tau2,
            e: 0.0,
            gmax: 1.0,
        }),
    }
}

fn voltage_probe(cell: &str) -> ProbeSpec {
    ProbeSpec::Voltage {
        cell: cell.into(),
        section: "soma".into(),
        position: 0.5,
    }
}

fn settings(dt: f64, t_stop: f64) -> SimulationSettings {
    SimulationSettings {
        dt,
        t_stop,
        v_init: LEAK_E,
        ..Default::default()
    }
}

fn build(settings: SimulationSettings, spec: &NetworkSpec) -> Network {
    NetworkBuilder::new(settings).build(spec).unwrap()
}

// ═══════════════════════════════════════════════════════════
// Passive dynamics
// ═══════════════════════════════════════════════════════════

#[test]
fn test_passive_steady_state_matches_ohm() {
    let amp = 0.1;
    let expected = LEAK_E + amp / point_cell_leak();

    for dt in [0.01, 0.025, 0.1] {
        let spec = NetworkSpec {
            templates: vec![point_cell_template()],
            cells: vec![cell("c", "point")],
            synapses: vec![clamp("stim", "c", 0.0, 1e9, amp)],
            ..Default::default()
        };
        // Membrane time constant is 1 ms
        let mut net = build(settings(dt, 30.0), &spec);
        net.run().unwrap();
        let v = net.voltage("c", "soma", 0.5).unwrap();
        assert!(
            (v - expected).abs() < 1e-6,
            "dt={}: v={} expected {}",
            dt,
            v,
            expected
        );
    }
}

#[test]
fn test_clamp_window_returns_to_rest() {
    let spec = NetworkSpec {
        templates: vec![point_cell_template()],
        cells: vec![cell("c", "point")],
        synapses: vec![clamp("stim", "c", 1.0, 2.0, 0.1)],
        probes: vec![voltage_probe("c")],
        ..Default::default()
    };
    let mut net = build(settings(0.025, 30.0), &spec);
    let record = net.run().unwrap().clone();
    let trace = record.trace("c.soma(0.5).v").unwrap();

    let peak = trace.values.iter().cloned().fold(f64::MIN, f64::max);
    assert!(peak > LEAK_E + 10.0);
    let last = *trace.values.last().unwrap();
    assert!((last - LEAK_E).abs() < 1e-6);
}

#[test]
fn test_quiescent_cells_stay_bounded() {
    let spec = NetworkSpec {
        cells: vec![
            cell("rc", "relay"),
            cell("in", "interneuron"),
            cell("in1", "interneuron_single_dendrite"),
        ],
        probes: vec![voltage_probe("rc"), voltage_probe("in"), voltage_probe("in1")],
        ..Default::default()
    };
    let mut net = build(settings(0.025, 50.0), &spec);
    let record = net.run().unwrap();
    assert_eq!(record.time.len(), 2001);
    for trace in &record.traces {
        assert!(
            trace.values.iter().all(|v| v.is_finite() && (-120.0..80.0).contains(v)),
            "{} left the physiological range",
            trace.label
        );
    }
    assert!(record.deliveries.is_empty());
}

#[test]
fn test_parallel_and_sequential_agree() {
    let spec = NetworkSpec {
        cells: vec![cell("rc", "relay"), cell("in", "interneuron")],
        synapses: vec![clamp("stim", "in", 1.0, 0.5, 1.0)],
        probes: vec![voltage_probe("rc"), voltage_probe("in")],
        ..Default::default()
    };
    let run = |parallel_cells: bool| {
        let mut net = build(
            SimulationSettings {
                parallel_cells,
                ..settings(0.025, 10.0)
            },
            &spec,
        );
        net.run().unwrap();
        net.into_record()
    };
    assert_eq!(run(true), run(false));
}

// ═══════════════════════════════════════════════════════════
// Events
// ═══════════════════════════════════════════════════════════

#[test]
fn test_threshold_crossing_delivers_after_delay() {
    let delay = 1.5;
    let spec = NetworkSpec {
        templates: vec![point_cell_template()],
        cells: vec![cell("pre", "point"), cell("post", "point")],
        synapses: vec![clamp("drive", "pre", 1.0, 1e9, 0.1), dual_exp("syn", "post", 0.5, 2.0)],
        connections: vec![ConnectionSpec {
            id: Some("pre_to_post".into()),
            source: SourceSpec::Threshold {
                cell: "pre".into(),
                section: "soma".into(),
                position: 0.5,
                threshold: Some(-50.0),
                refractory: None,
            },
            targets: vec!["syn".into()],
            weight: 0.01,
            delay,
        }],
        probes: vec![
            ProbeSpec::Conductance {
                synapse: "syn".into(),
            },
            voltage_probe("pre"),
        ],
        ..Default::default()
    };
    let mut net = build(settings(0.025, 20.0), &spec);
    let record = net.run().unwrap();

    // The driven cell rises through -50 mV once and stays above
    assert_eq!(record.crossings.len(), 1);
    let crossing = &record.crossings[0];
    assert_eq!(crossing.connection, "pre_to_post");
    assert!(crossing.time > 1.0);

    // Detection happens on the first sampled step at or above threshold
    let v_pre = &record.trace("pre.soma(0.5).v").unwrap().values;
    let first_above = record
        .time
        .iter()
        .zip(v_pre)
        .find(|(_, v)| **v >= -50.0)
        .map(|(t, _)| *t)
        .unwrap();
    assert_eq!(crossing.time, first_above);

    assert_eq!(record.deliveries.len(), 1);
    let delivered = &record.deliveries[0];
    assert!((delivered.time - (crossing.time + delay)).abs() < 1e-9);
    assert_eq!(delivered.weight, 0.01);

    // Nothing flows before the event time
    let g = &record.trace("syn.g").unwrap().values;
    for (t, g) in record.time.iter().zip(g) {
        if *t < delivered.time - 1e-9 {
            assert_eq!(*g, 0.0);
        }
    }
    assert!(g.iter().any(|g| *g > 0.0));
}

#[test]
fn test_same_time_events_keep_connection_order() {
    let generator = |id: &str| GeneratorSpec {
        id: id.into(),
        start: 2.0,
        interval: 1.0,
        number: 1,
    };
    let from = |generator: &str, weight: f64| ConnectionSpec {
        id: None,
        source: SourceSpec::Generator {
            generator: generator.into(),
        },
        targets: vec!["syn".into()],
        weight,
        delay: 0.0,
    };
    let spec = NetworkSpec {
        templates: vec![point_cell_template()],
        cells: vec![cell("c", "point")],
        generators: vec![generator("a"), generator("b")],
        synapses: vec![dual_exp("syn", "c", 0.1, 4.2)],
        connections: vec![from("b", 3.0), from("a", 1.0), from("a", 2.0)],
        ..Default::default()
    };
    let mut net = build(settings(0.025, 5.0), &spec);
    let record = net.run().unwrap();
    let weights: Vec<f64> = record.deliveries.iter().map(|e| e.weight).collect();
    assert_eq!(weights, vec![3.0, 1.0, 2.0]);
    assert!(record.deliveries.iter().all(|e| e.time == 2.0));
    assert_eq!(net.pending_events(), 0);
}

#[test]
fn test_generator_drives_dual_exp_peak() {
    let spec = NetworkSpec {
        templates: vec![point_cell_template()],
        cells: vec![cell("c", "point")],
        generators: vec![GeneratorSpec {
            id: "stim".into(),
            start: 5.0,
            interval: 10.0,
            number: 1,
        }],
        synapses: vec![dual_exp("syn", "c", 1.0, 2.0)],
        connections: vec![ConnectionSpec {
            id: None,
            source: SourceSpec::Generator {
                generator: "stim".into(),
            },
            targets: vec!["syn".into()],
            weight: 5.0,
            delay: 0.0,
        }],
        probes: vec![
            ProbeSpec::Conductance {
                synapse: "syn".into(),
            },
            voltage_probe("c"),
        ],
        ..Default::default()
    };
    let dt = 0.025;
    let mut net = build(settings(dt, 15.0), &spec);
    let record = net.run().unwrap();

    let g = &record.trace("syn.g").unwrap().values;
    let (peak_idx, peak) = g
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |best, (i, &g)| if g > best.1 { (i, g) } else { best });
    let peak_time = 5.0 + 2.0 * 2f64.ln();
    assert!((record.time[peak_idx] - peak_time).abs() <= dt);
    assert!((peak - 5.0).abs() < 5.0 * 1e-3);

    // Excitatory conductance depolarizes the cell
    let v = &record.trace("c.soma(0.5).v").unwrap().values;
    assert!(v[peak_idx] > LEAK_E + 1.0);
}

// ═══════════════════════════════════════════════════════════
// Run control
// ═══════════════════════════════════════════════════════════

#[test]
fn test_run_until_resumes_and_initialize_resets() {
    let spec = NetworkSpec {
        templates: vec![point_cell_template()],
        cells: vec![cell("c", "point")],
        synapses: vec![clamp("stim", "c", 0.0, 1e9, 0.1)],
        probes: vec![voltage_probe("c")],
        ..Default::default()
    };
    let mut split = build(settings(0.025, 10.0), &spec);
    split.run_until(4.0).unwrap();
    assert_eq!(split.step_index(), 160);
    split.run().unwrap();

    let mut whole = build(settings(0.025, 10.0), &spec);
    whole.run().unwrap();
    assert_eq!(split.record(), whole.record());

    split.initialize();
    assert_eq!(split.time(), 0.0);
    assert_eq!(split.record().time, vec![0.0]);
    assert_eq!(split.voltage("c", "soma", 0.5).unwrap(), LEAK_E);
}

#[test]
fn test_unknown_lookup_is_reference_error() {
    let spec = NetworkSpec {
        templates: vec![point_cell_template()],
        cells: vec![cell("c", "point")],
        ..Default::default()
    };
    let net = build(settings(0.025, 1.0), &spec);
    assert!(net.voltage("ghost", "soma", 0.5).is_err());
    assert!(net.voltage("c", "axon", 0.5).is_err());
    assert!(net.synapse("missing").is_none());
    assert!(net.cell("c").is_some());
}
