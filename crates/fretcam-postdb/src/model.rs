//! Post-processor profile records.
//!
//! A profile describes one G-code dialect: the header and footer line
//! templates, how arcs are written and which feed-override styles the
//! controller understands.

use std::fmt;
use std::str::FromStr;

use fretcam_core::ConfigError;
use serde::{Deserialize, Serialize};

/// How arc centres are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ArcMode {
    /// Centre offsets relative to the arc start
    #[default]
    #[serde(rename = "IJ")]
    Ij,
    /// Signed radius word
    #[serde(rename = "R")]
    R,
}

impl fmt::Display for ArcMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ij => write!(f, "IJ"),
            Self::R => write!(f, "R"),
        }
    }
}

impl FromStr for ArcMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IJ" => Ok(Self::Ij),
            "R" => Ok(Self::R),
            _ => Err(ConfigError::UnknownVariant {
                kind: "arc mode".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// How the advisory feed scale of annotated moves reaches the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeedOverrideMode {
    /// Profile default scaling, no markers
    #[default]
    Inherit,
    /// `(FEED_HINT START)` / `(FEED_HINT END)` comments, feeds unchanged
    Comment,
    /// Explicit F word on each affected move
    InlineF,
    /// Custom M-code pair bracketing the affected range
    Mcode,
}

impl FeedOverrideMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inherit => "inherit",
            Self::Comment => "comment",
            Self::InlineF => "inline_f",
            Self::Mcode => "mcode",
        }
    }
}

impl fmt::Display for FeedOverrideMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedOverrideMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "inherit" => Ok(Self::Inherit),
            "comment" => Ok(Self::Comment),
            "inline_f" => Ok(Self::InlineF),
            "mcode" => Ok(Self::Mcode),
            _ => Err(ConfigError::UnknownVariant {
                kind: "feed override mode".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// M-codes that open and close a feed override range.
///
/// Emitted as `M<start> P<percent>` before the range and `M<end> P0` after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct McodePair {
    pub start: u32,
    pub end: u32,
}

impl McodePair {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

/// A G-code dialect description
///
/// Header and footer lines are templates. The placeholders `{units}`,
/// `{positioning}`, `{plane}`, `{spindle_rpm}`, `{safe_z}` and `{profile}`
/// are substituted at emission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProfile {
    pub id: String,
    pub name: String,
    pub header_lines: Vec<String>,
    pub footer_lines: Vec<String>,
    /// Default arc representation.
    pub arc_mode: ArcMode,
    pub arc_modes_supported: Vec<ArcMode>,
    /// Arcs sweeping more than this are split into equal sub-arcs.
    pub max_arc_sweep_deg: f64,
    pub feed_override_modes_supported: Vec<FeedOverrideMode>,
    /// Feed multiplier applied to annotated moves in `inherit` mode.
    pub feed_scale: f64,
    /// Prefix every body line with an `N` word.
    pub line_numbers: bool,
    pub line_number_step: u32,
    /// Decimal places for coordinates.
    pub decimals: usize,
    pub mcode: Option<McodePair>,
}

impl Default for PostProfile {
    fn default() -> Self {
        Self {
            id: "custom".to_string(),
            name: "Custom".to_string(),
            header_lines: vec![
                "({profile})".to_string(),
                "{units}".to_string(),
                "{positioning}".to_string(),
                "{plane}".to_string(),
                "M3 S{spindle_rpm}".to_string(),
                "G0 Z{safe_z}".to_string(),
            ],
            footer_lines: vec![
                "G0 Z{safe_z}".to_string(),
                "M5".to_string(),
                "M30".to_string(),
            ],
            arc_mode: ArcMode::Ij,
            arc_modes_supported: vec![ArcMode::Ij, ArcMode::R],
            max_arc_sweep_deg: 360.0,
            feed_override_modes_supported: vec![
                FeedOverrideMode::Inherit,
                FeedOverrideMode::Comment,
                FeedOverrideMode::InlineF,
            ],
            feed_scale: 1.0,
            line_numbers: false,
            line_number_step: 10,
            decimals: 3,
            mcode: None,
        }
    }
}

impl PostProfile {
    pub fn supports_arc_mode(&self, mode: ArcMode) -> bool {
        self.arc_modes_supported.contains(&mode)
    }

    pub fn supports_feed_override(&self, mode: FeedOverrideMode) -> bool {
        self.feed_override_modes_supported.contains(&mode)
    }

    /// Checks the requested emission setup against this profile.
    pub fn check_request(
        &self,
        feed_override: FeedOverrideMode,
        arc_mode: ArcMode,
    ) -> Result<(), ConfigError> {
        if !self.supports_feed_override(feed_override) {
            return Err(ConfigError::UnsupportedFeedOverride {
                profile: self.id.clone(),
                mode: feed_override.to_string(),
            });
        }
        if feed_override == FeedOverrideMode::Mcode && self.mcode.is_none() {
            return Err(ConfigError::MissingMcodePair {
                profile: self.id.clone(),
            });
        }
        if !self.supports_arc_mode(arc_mode) {
            return Err(ConfigError::UnsupportedArcMode {
                profile: self.id.clone(),
                mode: arc_mode.to_string(),
            });
        }
        Ok(())
    }

    /// Checks the profile record itself.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "id".to_string(),
                reason: "profile id must not be empty".to_string(),
            });
        }
        if !(self.max_arc_sweep_deg > 0.0 && self.max_arc_sweep_deg <= 360.0) {
            return Err(ConfigError::InvalidValue {
                key: format!("{}.max_arc_sweep_deg", self.id),
                reason: format!("must be in (0, 360], got {}", self.max_arc_sweep_deg),
            });
        }
        if self.feed_scale <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: format!("{}.feed_scale", self.id),
                reason: "must be positive".to_string(),
            });
        }
        if !self.supports_arc_mode(self.arc_mode) {
            return Err(ConfigError::UnsupportedArcMode {
                profile: self.id.clone(),
                mode: self.arc_mode.to_string(),
            });
        }
        if self.supports_feed_override(FeedOverrideMode::Mcode) && self.mcode.is_none() {
            return Err(ConfigError::MissingMcodePair {
                profile: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Plain GRBL hobby controllers.
    pub fn grbl() -> Self {
        Self {
            id: "grbl".to_string(),
            name: "GRBL 1.1".to_string(),
            footer_lines: vec![
                "G0 Z{safe_z}".to_string(),
                "M5".to_string(),
                "M2".to_string(),
            ],
            ..Default::default()
        }
    }

    /// LinuxCNC, with a user M-code for feed overrides.
    pub fn linuxcnc() -> Self {
        Self {
            id: "linuxcnc".to_string(),
            name: "LinuxCNC".to_string(),
            header_lines: vec![
                "({profile})".to_string(),
                "{units}".to_string(),
                "{positioning}".to_string(),
                "{plane}".to_string(),
                "G40 G49 G80".to_string(),
                "G64 P0.01".to_string(),
                "M3 S{spindle_rpm}".to_string(),
                "G0 Z{safe_z}".to_string(),
            ],
            feed_override_modes_supported: vec![
                FeedOverrideMode::Inherit,
                FeedOverrideMode::Comment,
                FeedOverrideMode::InlineF,
                FeedOverrideMode::Mcode,
            ],
            mcode: Some(McodePair::new(100, 100)),
            ..Default::default()
        }
    }

    /// Mach3, which rejects arcs above a half circle on some configurations.
    pub fn mach3() -> Self {
        Self {
            id: "mach3".to_string(),
            name: "Mach3".to_string(),
            header_lines: vec![
                "({profile})".to_string(),
                "{units} {positioning} {plane} G40 G49".to_string(),
                "M3 S{spindle_rpm}".to_string(),
                "G0 Z{safe_z}".to_string(),
            ],
            arc_modes_supported: vec![ArcMode::Ij],
            max_arc_sweep_deg: 180.0,
            line_numbers: true,
            ..Default::default()
        }
    }

    /// Fanuc-style control using radius words.
    pub fn fanuc_r() -> Self {
        Self {
            id: "fanuc_r".to_string(),
            name: "Fanuc R arcs".to_string(),
            header_lines: vec![
                "%".to_string(),
                "O1000 ({profile})".to_string(),
                "{units} {positioning} {plane}".to_string(),
                "M3 S{spindle_rpm}".to_string(),
                "G0 Z{safe_z}".to_string(),
            ],
            footer_lines: vec![
                "G0 Z{safe_z}".to_string(),
                "M5".to_string(),
                "M30".to_string(),
                "%".to_string(),
            ],
            arc_mode: ArcMode::R,
            arc_modes_supported: vec![ArcMode::R, ArcMode::Ij],
            max_arc_sweep_deg: 90.0,
            line_numbers: true,
            line_number_step: 5,
            ..Default::default()
        }
    }

    /// All profiles shipped with the crate.
    pub fn builtins() -> Vec<PostProfile> {
        vec![Self::grbl(), Self::linuxcnc(), Self::mach3(), Self::fanuc_r()]
    }
}
