//! Shared types for cmlog
//!
//! This crate contains data structures used across multiple cmlog crates.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

// ============================================================================
// Severity
// ============================================================================

/// Entry severity, taken from the CMTrace `type` attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
    #[default]
    Unknown,
}

impl Severity {
    /// Map the numeric CMTrace `type` attribute ("1", "2", "3")
    pub fn from_type_attr(s: &str) -> Self {
        match s.trim() {
            "1" => Self::Info,
            "2" => Self::Warning,
            "3" => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Parse a user-supplied severity name
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" | "inf" | "information" | "1" => Some(Self::Info),
            "warn" | "warning" | "wrn" | "2" => Some(Self::Warning),
            "error" | "err" | "3" => Some(Self::Error),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Short display string (3 chars)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INF",
            Self::Warning => "WRN",
            Self::Error => "ERR",
            Self::Unknown => "???",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Parsed line
// ============================================================================

/// Fields extracted from a single CMTrace line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedEntry {
    /// Local timestamp, second precision, offset dropped
    pub timestamp: NaiveDateTime,

    /// Trimmed (and possibly reformatted) message text, never empty
    pub message: String,

    /// `component` attribute, when present
    pub component: Option<String>,

    pub severity: Severity,
}

// ============================================================================
// Records
// ============================================================================

/// Where a batch of raw lines came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSource {
    pub computer_name: String,

    /// Log/component name, e.g. "AppEnforce"
    pub source: String,

    /// Originating file
    pub path: PathBuf,
}

impl LogSource {
    pub fn new(
        computer_name: impl Into<String>,
        source: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            computer_name: computer_name.into(),
            source: source.into(),
            path: path.into(),
        }
    }
}

/// A single emitted log record
///
/// Built once per retained entry and never modified afterwards, so fields
/// are only reachable through accessors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogRecord {
    computer_name: String,
    source: String,
    timestamp: NaiveDateTime,
    message: String,
    path: PathBuf,
    component: Option<String>,
    severity: Severity,
}

impl LogRecord {
    /// Stamp a parsed entry with its source context
    pub fn new(entry: ParsedEntry, origin: &LogSource) -> Self {
        Self {
            computer_name: origin.computer_name.clone(),
            source: origin.source.clone(),
            timestamp: entry.timestamp,
            message: entry.message,
            path: origin.path.clone(),
            component: entry.component,
            severity: entry.severity,
        }
    }

    pub fn computer_name(&self) -> &str {
        &self.computer_name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Optional time bounds for retrieval
///
/// Both bounds are exclusive: a timestamp equal to `after` or `before` is
/// dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TimeWindow {
    pub after: Option<NaiveDateTime>,
    pub before: Option<NaiveDateTime>,
}

impl TimeWindow {
    pub fn new(after: Option<NaiveDateTime>, before: Option<NaiveDateTime>) -> Self {
        Self { after, before }
    }

    /// Window that accepts everything
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Check whether a timestamp falls inside the window
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        if self.after.is_some_and(|after| timestamp <= after) {
            return false;
        }
        if self.before.is_some_and(|before| timestamp >= before) {
            return false;
        }
        true
    }
}

/// Cap on the number of records emitted by one retrieval
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CountLimit(NonZeroUsize);

impl CountLimit {
    /// Returns `None` for zero
    pub fn new(count: usize) -> Option<Self> {
        NonZeroUsize::new(count).map(Self)
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

impl From<NonZeroUsize> for CountLimit {
    fn from(count: NonZeroUsize) -> Self {
        Self(count)
    }
}
