// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Section and segment geometry

use core::f64::consts::PI;
use serde::{Deserialize, Serialize};

use crate::types::error::{require_positive, Result};
use crate::types::units::{CAPACITANCE_TO_NF, RESISTIVITY_TO_MEGAOHM};
use crate::types::SectionId;

/// Diameter along a section's normalized length
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiameterProfile {
    /// Same diameter everywhere (µm)
    Uniform(f64),
    /// Linear taper from the 0-end to the 1-end (µm)
    Taper { zero_end: f64, one_end: f64 },
}

impl DiameterProfile {
    /// Diameter at normalized position `x` in [0, 1]
    #[inline]
    pub fn at(&self, x: f64) -> f64 {
        match *self {
            DiameterProfile::Uniform(d) => d,
            DiameterProfile::Taper { zero_end, one_end } => (one_end - zero_end) * x + zero_end,
        }
    }

    fn validate(&self, section: &str) -> Result<()> {
        match *self {
            DiameterProfile::Uniform(d) => require_positive(&format!("{}.diam", section), d),
            DiameterProfile::Taper { zero_end, one_end } => {
                require_positive(&format!("{}.taper.zero_end", section), zero_end)?;
                require_positive(&format!("{}.taper.one_end", section), one_end)
            }
        }
    }
}

/// Geometric and passive electrical description of one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub name: String,
    /// Length (µm)
    pub length: f64,
    pub diameter: DiameterProfile,
    /// Number of segments (≥ 1)
    pub nseg: u32,
    /// Axial resistivity (Ω·cm)
    #[serde(default = "default_ra")]
    pub ra: f64,
    /// Specific membrane capacitance (µF/cm²)
    #[serde(default = "default_cm")]
    pub cm: f64,
}

fn default_ra() -> f64 {
    35.4
}

fn default_cm() -> f64 {
    1.0
}

impl SectionSpec {
    pub fn new(name: impl Into<String>, length: f64, diameter: DiameterProfile, nseg: u32) -> Self {
        Self {
            name: name.into(),
            length,
            diameter,
            nseg,
            ra: default_ra(),
            cm: default_cm(),
        }
    }

    pub fn with_passive(mut self, ra: f64, cm: f64) -> Self {
        self.ra = ra;
        self.cm = cm;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_positive(&format!("{}.L", self.name), self.length)?;
        self.diameter.validate(&self.name)?;
        require_positive(&format!("{}.Ra", self.name), self.ra)?;
        require_positive(&format!("{}.cm", self.name), self.cm)?;
        if self.nseg == 0 {
            return Err(crate::SimError::InvalidParameter(format!(
                "{}.nseg must be >= 1",
                self.name
            )));
        }
        Ok(())
    }

    /// Normalized position of segment `k`'s center
    #[inline]
    pub fn segment_center(&self, k: u32) -> f64 {
        (k as f64 + 0.5) / self.nseg as f64
    }

    /// Segment that contains normalized position `x`
    #[inline]
    pub fn segment_containing(&self, x: f64) -> u32 {
        ((x * self.nseg as f64).floor() as u32).min(self.nseg - 1)
    }

    #[inline]
    pub fn segment_length(&self) -> f64 {
        self.length / self.nseg as f64
    }

    /// Axial resistance (MΩ) of a cylinder of `length` µm at diameter `diam` µm
    #[inline]
    pub fn axial_resistance(&self, length: f64, diam: f64) -> f64 {
        RESISTIVITY_TO_MEGAOHM * self.ra * length / (PI * diam * diam / 4.0)
    }
}

/// A finalized section of a morphology
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: SectionId,
    pub spec: SectionSpec,
    /// Parent section and the normalized position on it
    pub parent: Option<(SectionId, f64)>,
    /// Index of this section's first segment in the flattened segment array
    pub first_segment: usize,
    pub children: Vec<SectionId>,
}

impl Section {
    #[inline]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    #[inline]
    pub fn segment_range(&self) -> core::ops::Range<usize> {
        self.first_segment..self.first_segment + self.spec.nseg as usize
    }

    /// Flattened index of the segment containing `x`
    #[inline]
    pub fn segment_at(&self, x: f64) -> usize {
        self.first_segment + self.spec.segment_containing(x) as usize
    }
}

/// The unit of discretization: one isopotential compartment
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub section: SectionId,
    /// Normalized position of the segment center within its section
    pub x: f64,
    /// Local diameter (µm)
    pub diameter: f64,
    /// Length (µm)
    pub length: f64,
    /// Membrane area (µm²)
    pub area: f64,
    /// Membrane capacitance (nF)
    pub capacitance: f64,
    /// Parent segment in the flattened ordering (always a lower index)
    pub parent: Option<usize>,
    /// Axial conductance to the parent segment (µS); 0 for the root segment
    pub axial_conductance: f64,
}

impl Segment {
    pub(crate) fn build(spec: &SectionSpec, section: SectionId, k: u32) -> Self {
        let x = spec.segment_center(k);
        let diameter = spec.diameter.at(x);
        let length = spec.segment_length();
        let area = PI * diameter * length;
        Self {
            section,
            x,
            diameter,
            length,
            area,
            capacitance: spec.cm * area * CAPACITANCE_TO_NF,
            parent: None,
            axial_conductance: 0.0,
        }
    }

    /// Axial resistance (MΩ) from the segment center to either end
    #[inline]
    pub(crate) fn half_resistance(&self, spec: &SectionSpec) -> f64 {
        spec.axial_resistance(self.length / 2.0, self.diameter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taper_matches_segment_centers() {
        let spec = SectionSpec::new(
            "dend_p",
            100.0,
            DiameterProfile::Taper {
                zero_end: 4.0,
                one_end: 0.3,
            },
            11,
        );
        let first = Segment::build(&spec, SectionId(0), 0);
        let last = Segment::build(&spec, SectionId(0), 10);
        let dx = 1.0 / 11.0;
        assert!((first.diameter - ((0.3 - 4.0) * dx / 2.0 + 4.0)).abs() < 1e-12);
        assert!((last.diameter - ((0.3 - 4.0) * (1.0 - dx / 2.0) + 4.0)).abs() < 1e-12);
        assert!(first.diameter > last.diameter);
    }

    #[test]
    fn test_segment_containing() {
        let spec = SectionSpec::new("soma", 10.0, DiameterProfile::Uniform(10.0), 5);
        assert_eq!(spec.segment_containing(0.0), 0);
        assert_eq!(spec.segment_containing(0.39), 1);
        assert_eq!(spec.segment_containing(1.0), 4);
    }

    #[test]
    fn test_validate_rejects_nonphysical() {
        let mut spec = SectionSpec::new("soma", 10.0, DiameterProfile::Uniform(10.0), 1);
        assert!(spec.validate().is_ok());
        spec.nseg = 0;
        assert!(spec.validate().is_err());
        spec.nseg = 1;
        spec.diameter = DiameterProfile::Uniform(-1.0);
        assert!(spec.validate().is_err());
        spec.diameter = DiameterProfile::Uniform(1.0);
        spec.ra = 0.0;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_capacitance_units() {
        // 10 µm x 10 µm cylinder at 1 µF/cm²: area = 314.16 µm² -> 3.1416 pF
        let spec = SectionSpec::new("soma", 10.0, DiameterProfile::Uniform(10.0), 1);
        let seg = Segment::build(&spec, SectionId(0), 0);
        assert!((seg.capacitance - 3.141_592_653e-3).abs() < 1e-9);
    }
}
