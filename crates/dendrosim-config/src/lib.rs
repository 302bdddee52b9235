// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # dendrosim Configuration
//!
//! Run settings for simulations, loaded in three tiers:
//! 1. TOML file (`dendrosim.toml`)
//! 2. Environment variables (`DENDROSIM_*`)
//! 3. CLI overrides (`section.key=value`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dendrosim_config::{load_config, validate_config};
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! validate_config(&config).expect("Invalid config");
//! println!("dt = {} ms", config.simulation.dt);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    parse_override, CONFIG_FILE_NAME, CONFIG_PATH_ENV,
};
pub use types::*;
pub use validation::{collect_errors, validate_config, ConfigValidationError};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no dendrosim.toml found (searched: {0})")]
    FileNotFound(String),

    #[error("cannot read configuration: {0}")]
    IoError(#[from] std::io::Error),

    #[error("malformed TOML: {0}")]
    ParseError(String),

    #[error("configuration rejected: {0}")]
    ValidationError(String),

    #[error("bad override value: {0}")]
    InvalidValue(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DendrosimConfig::default();
        assert!(validate_config(&config).is_ok());
    }
}
