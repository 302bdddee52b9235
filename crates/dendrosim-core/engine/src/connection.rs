// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Connections
//!
//! A connection binds one source to one or more target synapses with a
//! shared weight and delay. Sources are either
//! - an [`EventGenerator`]: `number` events from `start` every `interval`,
//!   independent of membrane state, or
//! - a [`ThresholdDetector`]: watches one segment's voltage and fires when it
//!   goes from below the threshold to at-or-above it.
//!
//! Detectors have no refractory period unless one is configured, so a
//! voltage that dips and re-crosses during a sustained depolarization fires
//! again.

use dendrosim_neural::{Result, SimError, SynapseId};
use serde::{Deserialize, Serialize};

use crate::event_queue::Event;

/// Periodic (or one-shot) event source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventGenerator {
    /// First event (ms)
    pub start: f64,
    /// Inter-event interval (ms)
    pub interval: f64,
    /// Number of events
    pub number: u32,
}

impl EventGenerator {
    pub fn validate(&self) -> Result<()> {
        if !(self.start.is_finite() && self.start >= 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "generator start must be >= 0 (got {})",
                self.start
            )));
        }
        if !(self.interval.is_finite() && self.interval > 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "generator interval must be > 0 (got {})",
                self.interval
            )));
        }
        Ok(())
    }

    /// Emission times, before any connection delay
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.number).map(move |k| self.start + k as f64 * self.interval)
    }
}

/// Upward threshold-crossing detector on one segment's voltage
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdDetector {
    /// Index of the watched cell in the network
    pub cell: usize,
    pub segment: usize,
    /// mV
    pub threshold: f64,
    /// Minimum time between firings (ms); 0 disables
    pub refractory: f64,
    above: bool,
    last_fire: Option<f64>,
}

impl ThresholdDetector {
    pub fn new(cell: usize, segment: usize, threshold: f64, refractory: f64) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(SimError::InvalidParameter(format!(
                "threshold must be finite (got {})",
                threshold
            )));
        }
        if !(refractory.is_finite() && refractory >= 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "refractory period must be >= 0 (got {})",
                refractory
            )));
        }
        Ok(Self {
            cell,
            segment,
            threshold,
            refractory,
            above: false,
            last_fire: None,
        })
    }

    /// A source that starts above threshold does not fire until it has dropped below
    pub fn initialize(&mut self, v: f64) {
        self.above = v >= self.threshold;
        self.last_fire = None;
    }

    /// Feed the voltage sampled at `t`; true when this sample is a crossing
    pub fn check(&mut self, v: f64, t: f64) -> bool {
        let above = v >= self.threshold;
        let crossed = above && !self.above;
        self.above = above;
        if !crossed {
            return false;
        }
        if let Some(last) = self.last_fire {
            if t - last < self.refractory {
                return false;
            }
        }
        self.last_fire = Some(t);
        true
    }

    pub fn last_fire(&self) -> Option<f64> {
        self.last_fire
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionSource {
    Generator {
        name: String,
        generator: EventGenerator,
    },
    Threshold(ThresholdDetector),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub name: String,
    pub source: ConnectionSource,
    pub targets: Vec<SynapseId>,
    pub weight: f64,
    /// Propagation delay (ms)
    pub delay: f64,
}

impl Connection {
    pub fn new(
        name: impl Into<String>,
        source: ConnectionSource,
        targets: Vec<SynapseId>,
        weight: f64,
        delay: f64,
    ) -> Result<Self> {
        let name = name.into();
        if !(delay.is_finite() && delay >= 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "connection '{}': delay must be >= 0 (got {})",
                name, delay
            )));
        }
        if !(weight.is_finite() && weight >= 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "connection '{}': weight must be >= 0 (got {})",
                name, weight
            )));
        }
        if targets.is_empty() {
            return Err(SimError::InvalidReference(format!(
                "connection '{}' has no targets",
                name
            )));
        }
        if let ConnectionSource::Generator { generator, .. } = &source {
            generator.validate()?;
        }
        Ok(Self {
            name,
            source,
            targets,
            weight,
            delay,
        })
    }

    /// One event per target, for a source firing at `t`
    pub fn events_from(&self, t: f64) -> impl Iterator<Item = Event> + '_ {
        let time = t + self.delay;
        self.targets.iter().map(move |&target| Event {
            time,
            target,
            weight: self.weight,
        })
    }

    /// Everything a generator source will ever emit, delay included
    pub fn scheduled_events(&self) -> Vec<Event> {
        match &self.source {
            ConnectionSource::Generator { generator, .. } => generator
                .times()
                .flat_map(|t| self.events_from(t).collect::<Vec<_>>())
                .collect(),
            ConnectionSource::Threshold(_) => Vec::new(),
        }
    }

    pub fn detector_mut(&mut self) -> Option<&mut ThresholdDetector> {
        match &mut self.source {
            ConnectionSource::Threshold(detector) => Some(detector),
            ConnectionSource::Generator { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_fires_on_upward_crossing_only() {
        let mut d = ThresholdDetector::new(0, 0, 10.0, 0.0).unwrap();
        d.initialize(-65.0);
        assert!(!d.check(5.0, 1.0));
        assert!(d.check(10.0, 1.1));
        assert!(!d.check(30.0, 1.2));
        assert!(!d.check(-20.0, 1.3));
        // Re-crossing fires again with no refractory period
        assert!(d.check(12.0, 1.4));
    }

    #[test]
    fn test_detector_starting_above_waits_for_reset() {
        let mut d = ThresholdDetector::new(0, 0, -70.0, 0.0).unwrap();
        d.initialize(-65.0);
        assert!(!d.check(-60.0, 0.025));
        assert!(!d.check(-75.0, 0.05));
        assert!(d.check(-69.0, 0.075));
    }

    #[test]
    fn test_refractory_suppresses_close_recrossings() {
        let mut d = ThresholdDetector::new(0, 0, 0.0, 2.0).unwrap();
        d.initialize(-65.0);
        assert!(d.check(10.0, 1.0));
        d.check(-10.0, 1.5);
        assert!(!d.check(10.0, 2.0));
        d.check(-10.0, 2.5);
        assert!(d.check(10.0, 3.0));
        assert_eq!(d.last_fire(), Some(3.0));
    }

    #[test]
    fn test_generator_events_include_delay() {
        let conn = Connection::new(
            "stim",
            ConnectionSource::Generator {
                name: "g".into(),
                generator: EventGenerator {
                    start: 5.0,
                    interval: 4.5,
                    number: 3,
                },
            },
            vec![SynapseId(0), SynapseId(1)],
            2.0,
            0.5,
        )
        .unwrap();
        let times: Vec<f64> = conn.scheduled_events().iter().map(|e| e.time).collect();
        assert_eq!(times, vec![5.5, 5.5, 10.0, 10.0, 14.5, 14.5]);
    }

    #[test]
    fn test_rejects_negative_delay_and_empty_targets() {
        let source = || ConnectionSource::Threshold(ThresholdDetector::new(0, 0, 10.0, 0.0).unwrap());
        assert!(matches!(
            Connection::new("c", source(), vec![SynapseId(0)], 1.0, -0.1),
            Err(SimError::InvalidParameter(_))
        ));
        assert!(matches!(
            Connection::new("c", source(), vec![], 1.0, 0.0),
            Err(SimError::InvalidReference(_))
        ));
    }
}
