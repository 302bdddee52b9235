// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Membrane Mechanisms
//!
//! Every segment carries zero or more mechanism instances. Each instance owns
//! its own kinetic state and contributes a current density (mA/cm²) that the
//! cable solver linearizes around the present voltage.
//!
//! Mechanisms are configured per section name through a [`BiophysicsTable`];
//! [`ChannelSet::install`] validates every parameter set before any state is
//! allocated, so a bad table never yields a partially built cell.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::morphology::Morphology;
use crate::types::error::require_finite;
use crate::types::units::nernst;
use crate::types::{Result, SimError};

pub mod rates;

mod calcium;
mod calcium_activated;
mod hcn;
mod hodgkin_huxley;
mod passive;

pub use calcium::{
    CalciumPool, CalciumPoolParameters, LTypeCalcium, LTypeCalciumParameters, TTypeCalcium,
    TTypeCalciumParameters,
};
pub use calcium_activated::{
    CalciumActivatedCation, CalciumActivatedCationParameters, CalciumActivatedPotassium,
    CalciumActivatedPotassiumParameters,
};
pub use hcn::{AnomalousRectifier, AnomalousRectifierParameters};
pub use hodgkin_huxley::{
    HodgkinHuxley, HodgkinHuxleyParameters, TraubMiles, TraubMilesParameters,
};
pub use passive::{Passive, PassiveParameters};

/// Voltage increment (mV) used for the numerical conductance `di/dv`
pub const DERIVATIVE_STEP: f64 = 0.001;

/// Default sodium reversal potential (mV)
pub const DEFAULT_ENA: f64 = 50.0;

/// Default potassium reversal potential (mV)
pub const DEFAULT_EK: f64 = -77.0;

/// Intracellular calcium (mM) assumed where no pool is installed
pub const DEFAULT_CAI: f64 = 5e-5;

/// Extracellular calcium (mM)
pub const DEFAULT_CAO: f64 = 2.0;

/// Parameter set of a membrane mechanism
pub trait MechanismParameters {
    /// Reject non-physical values (zero/negative conductances, time constants...)
    fn validate(&self) -> Result<()>;
}

/// Kinetics of one mechanism instance on one segment
pub trait MembraneMechanism {
    type Parameters: MechanismParameters;

    /// Catalogue name (`"pas"`, `"hh"`, ...)
    fn name(&self) -> &'static str;

    fn parameters(&self) -> &Self::Parameters;

    /// Put every gate at its steady state for `v`
    fn initialize(&mut self, v: f64, ions: &IonEnvironment);

    /// Outward-positive current density (mA/cm²) at `v` with the present state
    fn current(&self, v: f64, ions: &IonEnvironment) -> MembraneCurrent;

    /// Advance the kinetic state by `dt` holding `v` fixed
    fn advance(&mut self, v: f64, ions: &IonEnvironment, dt: f64);

    /// Read a named state variable (`"m"`, `"cai"`, ...)
    fn state(&self, name: &str) -> Option<f64>;
}

/// Current density split into its total and its calcium-carried part
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MembraneCurrent {
    pub total: f64,
    pub calcium: f64,
}

impl MembraneCurrent {
    /// Current not carried by calcium
    #[inline]
    pub fn nonspecific(i: f64) -> Self {
        Self {
            total: i,
            calcium: 0.0,
        }
    }

    /// Current carried entirely by calcium
    #[inline]
    pub fn calcium(i: f64) -> Self {
        Self {
            total: i,
            calcium: i,
        }
    }
}

impl core::ops::AddAssign for MembraneCurrent {
    fn add_assign(&mut self, rhs: Self) {
        self.total += rhs.total;
        self.calcium += rhs.calcium;
    }
}

/// Ionic context a mechanism is evaluated in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IonEnvironment {
    /// Temperature (°C)
    pub celsius: f64,
    pub ena: f64,
    pub ek: f64,
    /// Intracellular calcium (mM)
    pub cai: f64,
    /// Extracellular calcium (mM)
    pub cao: f64,
    /// Net calcium current density (mA/cm²) of the segment
    pub ica: f64,
}

impl Default for IonEnvironment {
    fn default() -> Self {
        Self {
            celsius: 6.3,
            ena: DEFAULT_ENA,
            ek: DEFAULT_EK,
            cai: DEFAULT_CAI,
            cao: DEFAULT_CAO,
            ica: 0.0,
        }
    }
}

impl IonEnvironment {
    /// Calcium reversal potential (mV) from the present concentrations
    #[inline]
    pub fn eca(&self) -> f64 {
        nernst(self.celsius, 2.0, self.cai, self.cao)
    }
}

/// One installed mechanism instance
#[derive(Debug, Clone, PartialEq)]
pub enum Mechanism {
    Passive(Passive),
    HodgkinHuxley(HodgkinHuxley),
    TraubMiles(TraubMiles),
    CalciumPool(CalciumPool),
    LTypeCalcium(LTypeCalcium),
    TTypeCalcium(TTypeCalcium),
    CalciumActivatedPotassium(CalciumActivatedPotassium),
    CalciumActivatedCation(CalciumActivatedCation),
    AnomalousRectifier(AnomalousRectifier),
}

macro_rules! dispatch {
    ($self:expr, $m:ident => $body:expr) => {
        match $self {
            Mechanism::Passive($m) => $body,
            Mechanism::HodgkinHuxley($m) => $body,
            Mechanism::TraubMiles($m) => $body,
            Mechanism::CalciumPool($m) => $body,
            Mechanism::LTypeCalcium($m) => $body,
            Mechanism::TTypeCalcium($m) => $body,
            Mechanism::CalciumActivatedPotassium($m) => $body,
            Mechanism::CalciumActivatedCation($m) => $body,
            Mechanism::AnomalousRectifier($m) => $body,
        }
    };
}

impl Mechanism {
    pub fn name(&self) -> &'static str {
        dispatch!(self, m => m.name())
    }

    pub fn initialize(&mut self, v: f64, ions: &IonEnvironment) {
        dispatch!(self, m => m.initialize(v, ions))
    }

    #[inline]
    pub fn current(&self, v: f64, ions: &IonEnvironment) -> MembraneCurrent {
        dispatch!(self, m => m.current(v, ions))
    }

    pub fn advance(&mut self, v: f64, ions: &IonEnvironment, dt: f64) {
        dispatch!(self, m => m.advance(v, ions, dt))
    }

    pub fn state(&self, name: &str) -> Option<f64> {
        dispatch!(self, m => m.state(name))
    }

    fn is_pool(&self) -> bool {
        matches!(self, Mechanism::CalciumPool(_))
    }
}

/// Declarative mechanism entry, tagged by catalogue name
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MechanismSpec {
    Pas(PassiveParameters),
    Hh(HodgkinHuxleyParameters),
    Hh2(TraubMilesParameters),
    Cad(CalciumPoolParameters),
    Ical(LTypeCalciumParameters),
    It2(TTypeCalciumParameters),
    Iahp(CalciumActivatedPotassiumParameters),
    Ican(CalciumActivatedCationParameters),
    Iar(AnomalousRectifierParameters),
}

impl MechanismSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            MechanismSpec::Pas(_) => "pas",
            MechanismSpec::Hh(_) => "hh",
            MechanismSpec::Hh2(_) => "hh2",
            MechanismSpec::Cad(_) => "cad",
            MechanismSpec::Ical(_) => "ical",
            MechanismSpec::It2(_) => "it2",
            MechanismSpec::Iahp(_) => "iahp",
            MechanismSpec::Ican(_) => "ican",
            MechanismSpec::Iar(_) => "iar",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            MechanismSpec::Pas(p) => p.validate(),
            MechanismSpec::Hh(p) => p.validate(),
            MechanismSpec::Hh2(p) => p.validate(),
            MechanismSpec::Cad(p) => p.validate(),
            MechanismSpec::Ical(p) => p.validate(),
            MechanismSpec::It2(p) => p.validate(),
            MechanismSpec::Iahp(p) => p.validate(),
            MechanismSpec::Ican(p) => p.validate(),
            MechanismSpec::Iar(p) => p.validate(),
        }
    }

    /// Validate the parameters and build a fresh instance
    pub fn instantiate(&self) -> Result<Mechanism> {
        self.validate()?;
        Ok(match *self {
            MechanismSpec::Pas(p) => Mechanism::Passive(Passive::new(p)),
            MechanismSpec::Hh(p) => Mechanism::HodgkinHuxley(HodgkinHuxley::new(p)),
            MechanismSpec::Hh2(p) => Mechanism::TraubMiles(TraubMiles::new(p)),
            MechanismSpec::Cad(p) => Mechanism::CalciumPool(CalciumPool::new(p)),
            MechanismSpec::Ical(p) => Mechanism::LTypeCalcium(LTypeCalcium::new(p)),
            MechanismSpec::It2(p) => Mechanism::TTypeCalcium(TTypeCalcium::new(p)),
            MechanismSpec::Iahp(p) => {
                Mechanism::CalciumActivatedPotassium(CalciumActivatedPotassium::new(p))
            }
            MechanismSpec::Ican(p) => {
                Mechanism::CalciumActivatedCation(CalciumActivatedCation::new(p))
            }
            MechanismSpec::Iar(p) => Mechanism::AnomalousRectifier(AnomalousRectifier::new(p)),
        })
    }
}

/// Mechanisms and reversal potentials shared by every segment of a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionBiophysics {
    pub mechanisms: Vec<MechanismSpec>,
    pub ena: f64,
    pub ek: f64,
}

impl Default for SectionBiophysics {
    fn default() -> Self {
        Self {
            mechanisms: Vec::new(),
            ena: DEFAULT_ENA,
            ek: DEFAULT_EK,
        }
    }
}

impl SectionBiophysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mechanism, replacing any earlier one of the same kind
    pub fn with(mut self, spec: MechanismSpec) -> Self {
        self.insert(spec);
        self
    }

    pub fn insert(&mut self, spec: MechanismSpec) {
        match self.mechanisms.iter_mut().find(|m| m.kind() == spec.kind()) {
            Some(existing) => *existing = spec,
            None => self.mechanisms.push(spec),
        }
    }

    pub fn with_reversals(mut self, ena: f64, ek: f64) -> Self {
        self.ena = ena;
        self.ek = ek;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_finite("ena", self.ena)?;
        require_finite("ek", self.ek)?;
        for (i, spec) in self.mechanisms.iter().enumerate() {
            if self.mechanisms[..i].iter().any(|m| m.kind() == spec.kind()) {
                return Err(SimError::InvalidParameter(format!(
                    "mechanism '{}' listed twice",
                    spec.kind()
                )));
            }
            spec.validate()?;
        }
        Ok(())
    }
}

/// Section name → biophysics, with an optional fallback for unlisted sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiophysicsTable {
    pub sections: BTreeMap<String, SectionBiophysics>,
    pub default: Option<SectionBiophysics>,
}

impl BiophysicsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, name: impl Into<String>, biophysics: SectionBiophysics) -> Self {
        self.sections.insert(name.into(), biophysics);
        self
    }

    pub fn with_default(mut self, biophysics: SectionBiophysics) -> Self {
        self.default = Some(biophysics);
        self
    }

    pub fn for_section(&self, name: &str) -> Option<&SectionBiophysics> {
        self.sections.get(name).or(self.default.as_ref())
    }
}

/// Mechanism instances of a single segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentChannels {
    mechanisms: Vec<Mechanism>,
    ena: f64,
    ek: f64,
    /// Calcium current at the last state update
    ica: f64,
}

impl SegmentChannels {
    fn new(biophysics: &SectionBiophysics) -> Result<Self> {
        let mut mechanisms = biophysics
            .mechanisms
            .iter()
            .map(MechanismSpec::instantiate)
            .collect::<Result<Vec<_>>>()?;
        // The pool is updated last so it sees the calcium current of the new voltage
        mechanisms.sort_by_key(Mechanism::is_pool);
        Ok(Self {
            mechanisms,
            ena: biophysics.ena,
            ek: biophysics.ek,
            ica: 0.0,
        })
    }

    pub fn mechanisms(&self) -> &[Mechanism] {
        &self.mechanisms
    }

    pub fn has(&self, name: &str) -> bool {
        self.mechanisms.iter().any(|m| m.name() == name)
    }

    /// Pool concentration, if a pool is installed
    pub fn calcium(&self) -> Option<f64> {
        self.mechanisms.iter().find_map(|m| match m {
            Mechanism::CalciumPool(pool) => Some(pool.concentration()),
            _ => None,
        })
    }

    pub fn ions(&self, celsius: f64) -> IonEnvironment {
        IonEnvironment {
            celsius,
            ena: self.ena,
            ek: self.ek,
            cai: self.calcium().unwrap_or(DEFAULT_CAI),
            cao: DEFAULT_CAO,
            ica: self.ica,
        }
    }

    /// Summed current density at `v`
    pub fn current(&self, v: f64, ions: &IonEnvironment) -> MembraneCurrent {
        let mut sum = MembraneCurrent::default();
        for m in &self.mechanisms {
            sum += m.current(v, ions);
        }
        sum
    }

    /// Current density (mA/cm²) and its slope `di/dv` (S/cm²) at `v`
    pub fn linearize(&self, v: f64, celsius: f64) -> (f64, f64) {
        let ions = self.ions(celsius);
        let i = self.current(v, &ions).total;
        let i_shifted = self.current(v + DERIVATIVE_STEP, &ions).total;
        (i, (i_shifted - i) / DERIVATIVE_STEP)
    }

    pub fn initialize(&mut self, v: f64, celsius: f64) {
        for m in self.mechanisms.iter_mut().filter(|m| m.is_pool()) {
            m.initialize(v, &IonEnvironment::default());
        }
        let ions = self.ions(celsius);
        for m in self.mechanisms.iter_mut().filter(|m| !m.is_pool()) {
            m.initialize(v, &ions);
        }
        self.ica = self.current(v, &ions).calcium;
    }

    /// Update every kinetic state to the end of a step that settled at `v`
    pub fn advance(&mut self, v: f64, celsius: f64, dt: f64) {
        let mut ions = self.ions(celsius);
        ions.ica = self.current(v, &ions).calcium;
        self.ica = ions.ica;
        for m in &mut self.mechanisms {
            m.advance(v, &ions, dt);
        }
    }

    /// Read `mechanism.state`
    pub fn state(&self, mechanism: &str, name: &str) -> Option<f64> {
        self.mechanisms
            .iter()
            .find(|m| m.name() == mechanism)
            .and_then(|m| m.state(name))
    }
}

/// Per-segment mechanism instances of one cell
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSet {
    segments: Vec<SegmentChannels>,
}

impl ChannelSet {
    /// Instantiate the table's mechanisms on every segment of `morphology`.
    ///
    /// Sections missing from the table fall back to its default entry, or to
    /// a bare membrane if there is none. A table entry naming a section the
    /// morphology lacks is an `InvalidReference`.
    pub fn install(morphology: &Morphology, table: &BiophysicsTable) -> Result<Self> {
        if let Some(unknown) = table
            .sections
            .keys()
            .find(|name| morphology.section_by_name(name).is_none())
        {
            return Err(SimError::InvalidReference(format!(
                "biophysics given for unknown section '{}'",
                unknown
            )));
        }

        let bare = SectionBiophysics::default();
        let mut per_section = Vec::with_capacity(morphology.sections().len());
        for section in morphology.sections() {
            let biophysics = table.for_section(section.name()).unwrap_or(&bare);
            biophysics.validate().map_err(|e| match e {
                SimError::InvalidParameter(msg) => {
                    SimError::InvalidParameter(format!("section '{}': {}", section.name(), msg))
                }
                other => other,
            })?;
            per_section.push(biophysics);
        }

        let segments = morphology
            .segments()
            .iter()
            .map(|seg| SegmentChannels::new(per_section[seg.section.index()]))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }

    pub fn initialize(&mut self, v: f64, celsius: f64) {
        for seg in &mut self.segments {
            seg.initialize(v, celsius);
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment(&self, index: usize) -> Option<&SegmentChannels> {
        self.segments.get(index)
    }

    pub fn segments(&self) -> &[SegmentChannels] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [SegmentChannels] {
        &mut self.segments
    }
}
