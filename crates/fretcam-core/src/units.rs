//! Unit conversion utilities
//!
//! Everything inside the toolpath core works in millimeters. Inputs in
//! inches are converted once at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Linear unit of a request or a G-code program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Millimeters (metric)
    #[default]
    Mm,
    /// Inches (imperial)
    Inch,
}

impl Units {
    /// Convert a value in these units to millimeters
    pub fn to_mm(self, value: f64) -> f64 {
        match self {
            Units::Mm => value,
            Units::Inch => value * MM_PER_INCH,
        }
    }

    /// Convert a value in millimeters to these units
    pub fn from_mm(self, value_mm: f64) -> f64 {
        match self {
            Units::Mm => value_mm,
            Units::Inch => value_mm / MM_PER_INCH,
        }
    }

    /// Scale factor from these units to millimeters
    pub fn scale_to_mm(self) -> f64 {
        self.to_mm(1.0)
    }

    /// The G-code word that selects this unit (G21 / G20)
    pub fn gcode(self) -> &'static str {
        match self {
            Units::Mm => "G21",
            Units::Inch => "G20",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::Mm => write!(f, "mm"),
            Units::Inch => write!(f, "inch"),
        }
    }
}

impl FromStr for Units {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mm" | "metric" | "millimeter" | "millimeters" => Ok(Self::Mm),
            "inch" | "in" | "imperial" | "inches" => Ok(Self::Inch),
            _ => Err(ConfigError::UnknownVariant {
                kind: "unit".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Format a length for G-code output with a fixed number of decimals.
///
/// Negative zero is normalized so identical geometry always prints the same
/// text.
pub fn format_coord(value: f64, decimals: usize) -> String {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.*}", decimals, rounded)
}
