//! Block assembly and modal state
//!
//! Groups the words of one line into a [`Block`] and defines the modal
//! machine state the simulator carries from block to block.

use fretcam_core::Units;
use serde::{Deserialize, Serialize};

use super::lexer::{tokenize_line, LexedLine};
use crate::issue::{IssueCode, SimulationIssue};

/// Distance mode - G90/G91
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMode {
    #[default]
    Absolute,
    Incremental,
}

/// Plane selection - G17/G18/G19
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Plane {
    #[default]
    XY,
    ZX,
    YZ,
}

impl Plane {
    /// Axis indices `(first, second, axial)` of this plane, ordered so that
    /// counter-clockwise is seen from the positive axial direction.
    pub fn axes(&self) -> (usize, usize, usize) {
        match self {
            Plane::XY => (0, 1, 2),
            Plane::ZX => (2, 0, 1),
            Plane::YZ => (1, 2, 0),
        }
    }
}

/// Motion mode - G0/G1/G2/G3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MotionMode {
    #[default]
    Rapid,
    Linear,
    ArcCw,
    ArcCcw,
}

/// Spindle state - M3/M4/M5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpindleState {
    #[default]
    Off,
    Cw,
    Ccw,
}

/// Modal machine state during one simulation
///
/// Lengths are stored in millimeters regardless of the active unit mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModalState {
    pub units: Units,
    pub distance: DistanceMode,
    pub plane: Plane,
    pub motion: MotionMode,
    /// Feed rate in mm/min; zero until an F word is seen
    pub feed_rate: f64,
    pub spindle: SpindleState,
    pub spindle_rpm: f64,
    pub tool: u32,
    /// Current position `[x, y, z]` in mm
    pub position: [f64; 3],
}

impl Default for ModalState {
    fn default() -> Self {
        Self::new(Units::Mm)
    }
}

impl ModalState {
    pub fn new(units: Units) -> Self {
        Self {
            units,
            distance: DistanceMode::Absolute,
            plane: Plane::XY,
            motion: MotionMode::Rapid,
            feed_rate: 0.0,
            spindle: SpindleState::Off,
            spindle_rpm: 0.0,
            tool: 0,
            position: [0.0; 3],
        }
    }

    /// Resolves an axis word to an absolute coordinate in mm.
    pub fn resolve_axis(&self, axis: usize, value: f64) -> f64 {
        let mm = self.units.to_mm(value);
        match self.distance {
            DistanceMode::Absolute => mm,
            DistanceMode::Incremental => self.position[axis] + mm,
        }
    }
}

/// A G or M code split into its number and optional decimal subcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code {
    pub major: u32,
    pub minor: Option<u32>,
}

impl Code {
    fn from_value(value: f64) -> Option<Self> {
        if !(0.0..10_000.0).contains(&value) {
            return None;
        }
        let tenths = (value * 10.0).round() as u32;
        if ((tenths as f64) / 10.0 - value).abs() > 1e-6 {
            return None;
        }
        let minor = tenths % 10;
        Some(Self {
            major: tenths / 10,
            minor: (minor != 0).then_some(minor),
        })
    }

    pub fn is(&self, major: u32) -> bool {
        self.major == major && self.minor.is_none()
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}.{}", self.major, minor),
            None => write!(f, "{}", self.major),
        }
    }
}

/// Words of one line, grouped by letter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub line: usize,
    pub g_codes: Vec<Code>,
    pub m_codes: Vec<Code>,
    /// X, Y, Z in program units
    pub axes: [Option<f64>; 3],
    /// I, J, K in program units
    pub offsets: [Option<f64>; 3],
    pub r: Option<f64>,
    pub f: Option<f64>,
    pub s: Option<f64>,
    pub p: Option<f64>,
    pub t: Option<f64>,
    pub n: Option<f64>,
}

impl Block {
    pub fn is_empty(&self) -> bool {
        self.g_codes.is_empty()
            && self.m_codes.is_empty()
            && self.axes.iter().all(Option::is_none)
            && self.offsets.iter().all(Option::is_none)
            && self.r.is_none()
            && self.f.is_none()
            && self.s.is_none()
            && self.p.is_none()
            && self.t.is_none()
    }

    pub fn has_axis_words(&self) -> bool {
        self.axes.iter().any(Option::is_some)
    }

    pub fn has_g(&self, major: u32) -> bool {
        self.g_codes.iter().any(|c| c.is(major))
    }
}

fn set_once(slot: &mut Option<f64>, value: f64, letter: char, line: usize, issues: &mut Vec<SimulationIssue>) {
    if slot.is_some() {
        issues.push(SimulationIssue::warning(
            line,
            IssueCode::DuplicateWord,
            format!("'{}' appears more than once, last value used", letter),
        ));
    }
    *slot = Some(value);
}

/// Groups lexed words into a block, recording issues for letters the
/// simulator does not understand.
pub fn build_block(lexed: &LexedLine, issues: &mut Vec<SimulationIssue>) -> Block {
    let line = lexed.line;
    let mut block = Block {
        line,
        ..Default::default()
    };

    for word in &lexed.words {
        match word.letter {
            'G' | 'M' => match Code::from_value(word.value) {
                Some(code) if word.letter == 'G' => block.g_codes.push(code),
                Some(code) => block.m_codes.push(code),
                None => issues.push(SimulationIssue::warning(
                    line,
                    IssueCode::MalformedWord,
                    format!("invalid code {}{}", word.letter, word.value),
                )),
            },
            'X' => set_once(&mut block.axes[0], word.value, 'X', line, issues),
            'Y' => set_once(&mut block.axes[1], word.value, 'Y', line, issues),
            'Z' => set_once(&mut block.axes[2], word.value, 'Z', line, issues),
            'I' => set_once(&mut block.offsets[0], word.value, 'I', line, issues),
            'J' => set_once(&mut block.offsets[1], word.value, 'J', line, issues),
            'K' => set_once(&mut block.offsets[2], word.value, 'K', line, issues),
            'R' => set_once(&mut block.r, word.value, 'R', line, issues),
            'F' => set_once(&mut block.f, word.value, 'F', line, issues),
            'S' => set_once(&mut block.s, word.value, 'S', line, issues),
            'P' => set_once(&mut block.p, word.value, 'P', line, issues),
            'T' => set_once(&mut block.t, word.value, 'T', line, issues),
            'N' => block.n = Some(word.value),
            other => issues.push(SimulationIssue::info(
                line,
                IssueCode::UnsupportedWord,
                format!("word '{}{}' ignored", other, word.value),
            )),
        }
    }
    block
}

/// Tokenizes and groups one source line.
pub fn parse_line(line_no: usize, raw: &str) -> (Block, Vec<SimulationIssue>) {
    let lexed = tokenize_line(line_no, raw);
    let mut issues = lexed.issues.clone();
    let block = build_block(&lexed, &mut issues);
    (block, issues)
}
