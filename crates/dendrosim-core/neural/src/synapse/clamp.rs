// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Square-pulse current clamp

use serde::{Deserialize, Serialize};

use super::{PointCurrent, SynapticMechanism};
use crate::types::{Result, SimError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClampParameters {
    /// Onset (ms)
    pub delay: f64,
    /// Duration (ms)
    pub dur: f64,
    /// Injected current (nA), positive depolarizes
    pub amp: f64,
}

impl ClampParameters {
    pub fn validate(&self) -> Result<()> {
        if !(self.delay.is_finite() && self.delay >= 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "clamp.delay must be >= 0 (got {})",
                self.delay
            )));
        }
        if !(self.dur.is_finite() && self.dur >= 0.0) {
            return Err(SimError::InvalidParameter(format!(
                "clamp.dur must be >= 0 (got {})",
                self.dur
            )));
        }
        if !self.amp.is_finite() {
            return Err(SimError::InvalidParameter(format!(
                "clamp.amp must be finite (got {})",
                self.amp
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentClamp {
    params: ClampParameters,
}

impl CurrentClamp {
    pub fn new(params: ClampParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn parameters(&self) -> &ClampParameters {
        &self.params
    }

    pub fn is_on(&self, t: f64) -> bool {
        t >= self.params.delay && t < self.params.delay + self.params.dur
    }
}

impl SynapticMechanism for CurrentClamp {
    fn name(&self) -> &'static str {
        "clamp"
    }

    fn reset(&mut self) {}

    fn deliver(&mut self, _t: f64, _weight: f64) {}

    fn accepts_events(&self) -> bool {
        false
    }

    fn conductance(&self, _t: f64) -> f64 {
        0.0
    }

    #[inline]
    fn current(&self, t: f64, _v: f64) -> PointCurrent {
        PointCurrent {
            // Injected current is inward in the outward-positive convention
            current: if self.is_on(t) { -self.params.amp } else { 0.0 },
            conductance: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_open_window() {
        let clamp = CurrentClamp::new(ClampParameters {
            delay: 5.0,
            dur: 2.0,
            amp: 0.5,
        })
        .unwrap();
        assert_eq!(clamp.current(4.999, -65.0).current, 0.0);
        assert_eq!(clamp.current(5.0, -65.0).current, -0.5);
        assert_eq!(clamp.current(6.999, -65.0).current, -0.5);
        assert_eq!(clamp.current(7.0, -65.0).current, 0.0);
    }

    #[test]
    fn test_rejects_negative_duration() {
        let params = ClampParameters {
            dur: -1.0,
            ..Default::default()
        };
        assert!(CurrentClamp::new(params).is_err());
    }
}
