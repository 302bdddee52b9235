// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Build a network from a JSON specification, run it, and print the
//! simulation record as JSON on stdout.
//!
//! Exit codes: 0 success, 1 load/build/run failure, 2 usage error.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use dendrosim::config::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    parse_override, validate_config, ConfigError, DendrosimConfig, CONFIG_PATH_ENV,
};
use dendrosim::engine::{NetworkBuilder, NetworkSpec};
use dendrosim::observability::{debug_flags_help, parse_debug_flags};
use dendrosim::{logging_from_config, settings_from_config};
use tracing::info;

struct Args {
    network: PathBuf,
    config: Option<PathBuf>,
    overrides: HashMap<String, String>,
    pretty: bool,
}

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: run_network --network <spec.json> [--config <dendrosim.toml>] \
         [--set section.key=value]... [--pretty] [--debug-<crate>]...\n\n\
         Defaults:\n\
         - config: searched as dendrosim.toml (DENDROSIM_CONFIG_PATH, cwd, parents); \
         built-in defaults if absent\n\n{}",
        debug_flags_help()
    );
    process::exit(2);
}

fn parse_args() -> Args {
    let mut network = None;
    let mut config = None;
    let mut overrides = HashMap::new();
    let mut pretty = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--network" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                network = Some(PathBuf::from(v));
            }
            "--config" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                config = Some(PathBuf::from(v));
            }
            "--set" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                match parse_override(&v) {
                    Ok((key, value)) => {
                        overrides.insert(key, value);
                    }
                    Err(e) => {
                        eprintln!("{e}");
                        usage_and_exit();
                    }
                }
            }
            "--pretty" => pretty = true,
            "-h" | "--help" => usage_and_exit(),
            // Consumed by the debug flag parser
            other if other.starts_with("--debug-") => {}
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        }
    }

    let Some(network) = network else {
        eprintln!("Missing --network");
        usage_and_exit();
    };
    Args {
        network,
        config,
        overrides,
        pretty,
    }
}

/// File < environment < `--set`. Built-in defaults are used only when no file
/// was asked for and none is found by searching; a missing `--config` or
/// `DENDROSIM_CONFIG_PATH` file is an error.
fn resolve_config(path: Option<&Path>, overrides: &HashMap<String, String>) -> Result<DendrosimConfig> {
    let config = match path {
        Some(path) => load_config(Some(path), Some(overrides))
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => match find_config_file() {
            Ok(found) => load_config(Some(&found), Some(overrides))
                .with_context(|| format!("Failed to load config {}", found.display()))?,
            Err(ConfigError::FileNotFound(_)) if env::var_os(CONFIG_PATH_ENV).is_none() => {
                let mut config = DendrosimConfig::default();
                apply_environment_overrides(&mut config);
                apply_cli_overrides(&mut config, overrides)?;
                config
            }
            Err(e) => return Err(e.into()),
        },
    };
    validate_config(&config)?;
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = resolve_config(args.config.as_deref(), &args.overrides)?;

    let debug_flags = parse_debug_flags();
    let logging = logging_from_config(&config);
    #[cfg(feature = "file-logging")]
    let _guard = dendrosim::observability::init_logging(&debug_flags, &logging)?;
    #[cfg(not(feature = "file-logging"))]
    dendrosim::observability::init_console_logging(&debug_flags, &logging)?;

    let raw = fs::read_to_string(&args.network)
        .with_context(|| format!("Failed to read network {}", args.network.display()))?;
    let spec: NetworkSpec = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse network {}", args.network.display()))?;

    let settings = settings_from_config(&config);
    info!(
        "Running {} for {} ms (dt={} ms, {} °C)",
        args.network.display(),
        settings.t_stop,
        settings.dt,
        settings.celsius
    );

    let mut network = NetworkBuilder::new(settings)
        .build(&spec)
        .with_context(|| format!("Failed to build network {}", args.network.display()))?;
    network.run()?;
    let record = network.into_record();

    let json = if args.pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    println!("{json}");
    Ok(())
}

fn main() {
    let args = parse_args();
    if let Err(e) = run(&args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
