//! Cutting tool description.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// An end mill used for pocketing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tool {
    /// Cutter diameter in mm
    pub diameter: f64,
    /// Radial stepover as a fraction of the diameter (0, 1]
    pub stepover: f64,
    /// Plunge feed rate in mm/min
    pub plunge_rate: f64,
    /// Cutting feed rate in mm/min
    pub feed_rate: f64,
    /// Spindle speed in RPM
    pub spindle_rpm: u32,
    /// Number of flutes
    pub flutes: u32,
    /// Chipload per tooth in mm; replaces `feed_rate` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chipload: Option<f64>,
}

impl Default for Tool {
    fn default() -> Self {
        Self {
            diameter: 6.0,
            stepover: 0.45,
            plunge_rate: 300.0,
            feed_rate: 1200.0,
            spindle_rpm: 18000,
            flutes: 2,
            chipload: None,
        }
    }
}

impl Tool {
    pub fn new(diameter: f64, stepover: f64) -> Self {
        Self {
            diameter,
            stepover,
            ..Default::default()
        }
    }

    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    /// Radial step between neighbouring passes in mm.
    pub fn stepover_distance(&self) -> f64 {
        self.stepover * self.diameter
    }

    /// Feed rate (mm/min) for a given chipload per tooth in mm.
    pub fn feed_from_chipload(&self, chipload: f64) -> f64 {
        chipload * self.flutes as f64 * self.spindle_rpm as f64
    }

    /// Cutting feed in mm/min, derived from the chipload when one is set.
    pub fn cutting_feed(&self) -> f64 {
        match self.chipload {
            Some(chipload) => self.feed_from_chipload(chipload),
            None => self.feed_rate,
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.diameter.is_finite() || self.diameter <= 0.0 {
            return Err(GeometryError::InvalidParameter {
                name: "tool_diameter".to_string(),
                reason: format!("must be positive, got {}", self.diameter),
            });
        }
        if !self.stepover.is_finite() || self.stepover <= 0.0 || self.stepover > 1.0 {
            return Err(GeometryError::InvalidParameter {
                name: "stepover".to_string(),
                reason: format!("must be in (0, 1], got {}", self.stepover),
            });
        }
        if self.plunge_rate <= 0.0 || self.feed_rate <= 0.0 {
            return Err(GeometryError::InvalidParameter {
                name: "feed_rate".to_string(),
                reason: "feed and plunge rates must be positive".to_string(),
            });
        }
        if let Some(chipload) = self.chipload {
            if !(chipload > 0.0) || self.flutes == 0 || self.spindle_rpm == 0 {
                return Err(GeometryError::InvalidParameter {
                    name: "chipload".to_string(),
                    reason: "chipload, flutes and spindle speed must be positive".to_string(),
                });
            }
        }
        Ok(())
    }
}
