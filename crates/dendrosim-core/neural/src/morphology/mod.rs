// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Morphology
//!
//! Sections are cylinders (optionally tapered) split into `nseg` segments.
//! A [`CompartmentTree`] collects sections and their attachment points and is
//! finalized into an immutable [`Morphology`] whose segments are ordered so
//! that every parent precedes its children. That ordering is what lets the
//! cable solver eliminate leaves-to-root in a single pass.

pub mod geometry;
pub mod section;
pub mod tree;

pub use geometry::{CellGeometry, Point3, Pose};
pub use section::{DiameterProfile, Section, SectionSpec, Segment};
pub use tree::{CompartmentTree, Morphology};
