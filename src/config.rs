//! Config file for cmlog
//!
//! ```toml
//! tail_lines = 2000
//! computer_name = "PC01"
//! json = false
//!
//! [[reformat]]
//! source = "AppDiscovery"
//! style = "key_value"
//! ```
//!
//! Every field is optional; command-line flags take precedence.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use cmlog_logs::{ReformatRegistry, split_key_values};

/// Lines read from the end of each file when nothing else is configured
pub const DEFAULT_TAIL_LINES: usize = 1000;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Lines read from the end of each file
    pub tail_lines: Option<usize>,

    /// ComputerName stamped on records
    pub computer_name: Option<String>,

    /// Emit JSON lines instead of text
    pub json: bool,

    /// Extra source-specific message rewrites
    pub reformat: Vec<ReformatRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReformatRule {
    pub source: String,
    pub style: ReformatStyle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReformatStyle {
    /// `key:- value, key:- value` lists, one item per line
    KeyValue,
}

impl Config {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Built-in reformat rules plus the configured ones
    pub fn reformat_registry(&self) -> ReformatRegistry {
        let mut registry = ReformatRegistry::with_defaults();
        for rule in &self.reformat {
            match rule.style {
                ReformatStyle::KeyValue => registry.register(&rule.source, split_key_values),
            }
        }
        registry
    }
}
