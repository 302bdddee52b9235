// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Integration Tests: Demo Models
//!
//! The shipped triad models load, build and run, and the `run_network` tool
//! honours its exit-code contract.

use std::path::PathBuf;
use std::process::Command;

use dendrosim::config::load_config;
use dendrosim::engine::{NetworkBuilder, NetworkSpec, SimulationRecord};
use dendrosim::settings_from_config;

const MODELS: [&str; 4] = ["model1", "model2", "model3", "model4"];

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn load_demo(name: &str) -> NetworkSpec {
    let raw = std::fs::read_to_string(repo_path(&format!("demos/{}.json", name))).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn run_demo(name: &str, t_stop: f64) -> SimulationRecord {
    let config = load_config(Some(&repo_path("dendrosim.toml")), None).unwrap();
    let mut settings = settings_from_config(&config);
    settings.t_stop = t_stop;
    let mut network = NetworkBuilder::new(settings).build(&load_demo(name)).unwrap();
    network.run().unwrap();
    network.into_record()
}

#[test]
fn test_demos_build() {
    for name in MODELS {
        let spec = load_demo(name);
        let network = NetworkBuilder::new(Default::default()).build(&spec);
        assert!(network.is_ok(), "{}: {:?}", name, network.err());
        assert_eq!(network.unwrap().cells().len(), 2);
    }
}

#[test]
fn test_demos_run_and_stay_finite() {
    for name in MODELS {
        let record = run_demo(name, 12.0);
        assert_eq!(record.time.len(), 481, "{}", name);
        for trace in &record.traces {
            assert!(
                trace.values.iter().all(|v| v.is_finite()),
                "{}: {} is not finite",
                name,
                trace.label
            );
        }
    }
}

#[test]
fn test_generator_inputs_arrive_together() {
    // model1: one generator fanning out to three synapses
    let record = run_demo("model1", 6.0);
    let at_onset = record.deliveries.iter().filter(|e| e.time == 5.0).count();
    assert_eq!(at_onset, 3);

    // model2: three generators, three synapses each
    let record = run_demo("model2", 6.0);
    let at_onset = record.deliveries.iter().filter(|e| e.time == 5.0).count();
    assert_eq!(at_onset, 9);
}

#[test]
fn test_clamp_inputs_depolarize_relay() {
    let record = run_demo("model3", 6.0);
    let soma = &record.trace("relay.soma(0.5).v").unwrap().values;
    let rest = soma[0];
    let peak = soma.iter().cloned().fold(f64::MIN, f64::max);
    assert!(peak > rest + 1.0);
}

#[test]
fn test_run_network_prints_record() {
    let output = Command::new(env!("CARGO_BIN_EXE_run_network"))
        .env("DENDROSIM_CONFIG_PATH", repo_path("dendrosim.toml"))
        .arg("--network")
        .arg(repo_path("demos/model3.json"))
        .args(["--set", "simulation.t_stop=1", "--set", "recording.interval=0.5"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let record: SimulationRecord = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record.time.len(), 3);
    assert!((record.time[2] - 1.0).abs() < 1e-9);
    assert!(!record.traces.is_empty());
}

#[test]
fn test_run_network_exit_codes() {
    let usage = Command::new(env!("CARGO_BIN_EXE_run_network"))
        .output()
        .unwrap();
    assert_eq!(usage.status.code(), Some(2));

    let bad_override = Command::new(env!("CARGO_BIN_EXE_run_network"))
        .args(["--network", "x.json", "--set", "no_equals_sign"])
        .output()
        .unwrap();
    assert_eq!(bad_override.status.code(), Some(2));

    let missing = Command::new(env!("CARGO_BIN_EXE_run_network"))
        .env("DENDROSIM_CONFIG_PATH", repo_path("dendrosim.toml"))
        .arg("--network")
        .arg(repo_path("demos/does_not_exist.json"))
        .output()
        .unwrap();
    assert_eq!(missing.status.code(), Some(1));
}

#[test]
fn test_run_network_rejects_missing_config_path() {
    let output = Command::new(env!("CARGO_BIN_EXE_run_network"))
        .env("DENDROSIM_CONFIG_PATH", repo_path("demos/no_such_config.toml"))
        .arg("--network")
        .arg(repo_path("demos/model1.json"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("DENDROSIM_CONFIG_PATH"), "{}", stderr);
}
