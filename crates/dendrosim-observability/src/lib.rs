// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # dendrosim-observability
//!
//! Logging setup shared by the dendrosim tools, with per-crate debug flags.
//!
//! ## Features
//! - `file-logging`: per-run log folders with daily rotation and retention

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use config::*;
pub use init::*;

/// Known dendrosim crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "dendrosim",
    "dendrosim-neural",
    "dendrosim-engine",
    "dendrosim-config",
    "dendrosim-observability",
];

/// Tracing target of a crate (`dendrosim-engine` logs under `dendrosim_engine`)
pub fn crate_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}
