// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Unit conversions between membrane densities and per-segment quantities.
//!
//! A segment's membrane area is kept in µm². Density quantities (mA/cm²,
//! S/cm², µF/cm²) are converted to point quantities (nA, µS, nF) with the
//! factors below.

/// mA/cm² × µm² → nA, and S/cm² × µm² → µS
pub const DENSITY_TO_POINT: f64 = 1e-2;

/// µF/cm² × µm² → nF
pub const CAPACITANCE_TO_NF: f64 = 1e-5;

/// Ω·cm × µm / µm² → MΩ
pub const RESISTIVITY_TO_MEGAOHM: f64 = 1e-2;

/// Faraday constant (C/mol)
pub const FARADAY: f64 = 96_485.309;

/// Gas constant (J/(K·mol))
pub const GAS_CONSTANT: f64 = 8.314_510;

/// 0 °C in kelvin
pub const ZERO_CELSIUS: f64 = 273.15;

/// Nernst potential (mV) for an ion of valence `z` at `celsius`.
#[inline]
pub fn nernst(celsius: f64, z: f64, inside: f64, outside: f64) -> f64 {
    1e3 * GAS_CONSTANT * (celsius + ZERO_CELSIUS) / (z * FARADAY) * (outside / inside).ln()
}
