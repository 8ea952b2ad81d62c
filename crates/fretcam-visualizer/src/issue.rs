//! Non-fatal diagnostics produced while simulating G-code.
//!
//! Simulation never fails on bad input. Every problem is recorded as a
//! [`SimulationIssue`] and the best-effort statistics are still returned.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much an issue affects the computed statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; statistics are unaffected
    Info,
    /// Statistics are approximate for this line
    Warning,
    /// The line could not be interpreted and was skipped
    Error,
}

/// Machine-readable issue kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    UnclosedComment,
    MalformedWord,
    UnsupportedWord,
    DuplicateWord,
    UnknownGCode,
    UnknownMCode,
    UnsupportedFeedMode,
    MotionNotSimulated,
    ArcMissingCenter,
    ArcInvalidRadius,
    ArcRadiusMismatch,
    FeedClamped,
    FeedDefaulted,
    DwellMissingTime,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnclosedComment => "unclosed_comment",
            Self::MalformedWord => "malformed_word",
            Self::UnsupportedWord => "unsupported_word",
            Self::DuplicateWord => "duplicate_word",
            Self::UnknownGCode => "unknown_g_code",
            Self::UnknownMCode => "unknown_m_code",
            Self::UnsupportedFeedMode => "unsupported_feed_mode",
            Self::MotionNotSimulated => "motion_not_simulated",
            Self::ArcMissingCenter => "arc_missing_center",
            Self::ArcInvalidRadius => "arc_invalid_radius",
            Self::ArcRadiusMismatch => "arc_radius_mismatch",
            Self::FeedClamped => "feed_clamped",
            Self::FeedDefaulted => "feed_defaulted",
            Self::DwellMissingTime => "dwell_missing_time",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One non-fatal problem tied to a source line (1-based)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationIssue {
    pub line: usize,
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
}

impl SimulationIssue {
    pub fn new(line: usize, severity: Severity, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            line,
            severity,
            code,
            message: message.into(),
        }
    }

    pub fn info(line: usize, code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(line, Severity::Info, code, message)
    }

    pub fn warning(line: usize, code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(line, Severity::Warning, code, message)
    }

    pub fn error(line: usize, code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(line, Severity::Error, code, message)
    }
}

impl fmt::Display for SimulationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: {:?} [{}] {}",
            self.line, self.severity, self.code, self.message
        )
    }
}
