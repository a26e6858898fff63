use regex::Regex;
use std::collections::HashSet;

use cmlog_types::{ParsedEntry, Severity};

/// Compiled message/severity filter for parsed entries
#[derive(Clone)]
pub struct RecordFilter {
    /// Regex pattern (if any)
    regex: Option<Regex>,

    /// Original pattern string
    pattern: String,

    /// Severities to include (empty = all)
    severities: HashSet<Severity>,

    /// Whether to invert match
    invert: bool,
}

impl RecordFilter {
    /// Create a new filter from a pattern string
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Self::build(pattern, pattern)
    }

    /// Create a case-insensitive filter
    pub fn new_case_insensitive(pattern: &str) -> Result<Self, regex::Error> {
        Self::build(pattern, &format!("(?i){}", pattern))
    }

    fn build(pattern: &str, compiled: &str) -> Result<Self, regex::Error> {
        let regex = if pattern.is_empty() {
            None
        } else {
            Some(Regex::new(compiled)?)
        };

        Ok(Self {
            regex,
            pattern: pattern.to_string(),
            severities: HashSet::new(),
            invert: false,
        })
    }

    /// Set severities to filter by
    pub fn with_severities(mut self, severities: HashSet<Severity>) -> Self {
        self.severities = severities;
        self
    }

    /// Invert the match
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// Check if a parsed entry matches this filter
    pub fn matches(&self, entry: &ParsedEntry) -> bool {
        if !self.severities.is_empty() && !self.severities.contains(&entry.severity) {
            return self.invert;
        }

        let text_match = match &self.regex {
            Some(re) => re.is_match(&entry.message),
            None => true,
        };

        if self.invert { !text_match } else { text_match }
    }

    /// Get the original pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check if filter is empty (matches everything)
    ///
    /// Inverting an empty filter changes nothing.
    pub fn is_empty(&self) -> bool {
        self.regex.is_none() && self.severities.is_empty()
    }
}

impl std::fmt::Debug for RecordFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordFilter")
            .field("pattern", &self.pattern)
            .field("severities", &self.severities)
            .field("invert", &self.invert)
            .finish()
    }
}
