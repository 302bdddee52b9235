// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core type definitions shared by every dendrosim crate

pub mod error;
pub mod ids;
pub mod units;

pub use error::{Result, SimError};
pub use ids::{CellId, SectionId, SynapseId};
