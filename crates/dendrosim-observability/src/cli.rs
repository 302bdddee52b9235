// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-dendrosim-engine` to raise one crate to debug
//! level while the rest stay at the configured level.

use std::collections::BTreeSet;
use std::env;

use crate::{crate_target, KNOWN_CRATES};

/// Environment variable listing crates to debug (comma-separated, or `all`)
pub const DEBUG_ENV: &str = "DENDROSIM_DEBUG";

/// Parse debug flags from command-line arguments
///
/// # Example
/// ```rust
/// use dendrosim_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-dendrosim-engine".to_string()]);
/// assert!(flags.is_enabled("dendrosim-engine"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Looks for arguments matching `--debug-{crate-name}`; `--debug-all`
    /// enables every known crate.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enable(crate_name);
            }
        }
        flags
    }

    /// Add crates named in a `DENDROSIM_DEBUG` style value
    pub fn merge_env_value(&mut self, value: &str) {
        if value.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            self.enable(crate_name);
        }
    }

    pub fn enable(&mut self, crate_name: &str) {
        self.enabled_crates.insert(crate_name.to_string());
    }

    pub fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enable(crate_name);
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `tracing::Level::DEBUG` if enabled, `tracing::Level::INFO` otherwise
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// `EnvFilter` directives: one `target=debug` per enabled crate, then
    /// `default_level` for everything else.
    pub fn to_filter_string(&self, default_level: &str) -> String {
        self.enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_target(crate_name)))
            .chain(std::iter::once(default_level.to_string()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Debug flags from the process arguments and `DENDROSIM_DEBUG`
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var(DEBUG_ENV) {
        flags.merge_env_value(&value);
    }
    flags
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  {env}={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  {env}=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", "),
        env = DEBUG_ENV
    )
}
