use chrono::NaiveDateTime;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cmlog_types::{ParsedEntry, Severity};

use crate::error::ParseError;

/// Date and time stubs are joined with a single space before parsing
const TIMESTAMP_FORMAT: &str = "%m-%d-%Y %H:%M:%S";

/// Source whose messages are flat `key:- value, key:- value` lists
pub const APP_INTENT_EVAL: &str = "AppIntentEval";

type ReformatFn = dyn Fn(&str) -> String + Send + Sync;

/// Split a flat key/value list into one key or value per line
///
/// Every `":- "` and `", "` separator becomes a newline.
pub fn split_key_values(message: &str) -> String {
    message.replace(":- ", "\n").replace(", ", "\n")
}

/// Source-specific message rewrites, keyed by source name
///
/// Lookups ignore ASCII case, so "appintenteval" and "AppIntentEval" select
/// the same rule.
#[derive(Clone, Default)]
pub struct ReformatRegistry {
    rules: HashMap<String, Arc<ReformatFn>>,
}

impl ReformatRegistry {
    /// Registry with no rules
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the built-in rules
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(APP_INTENT_EVAL, split_key_values);
        registry
    }

    /// Add or replace the rule for a source
    pub fn register<F>(&mut self, source: &str, rule: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.rules.insert(source.to_ascii_lowercase(), Arc::new(rule));
    }

    /// Check whether a source has a rule
    pub fn contains(&self, source: &str) -> bool {
        self.rules.contains_key(&source.to_ascii_lowercase())
    }

    /// Apply the rule for `source`, borrowing the message when there is none
    pub fn apply<'a>(&self, source: &str, message: &'a str) -> Cow<'a, str> {
        match self.rules.get(&source.to_ascii_lowercase()) {
            Some(rule) => Cow::Owned(rule(message)),
            None => Cow::Borrowed(message),
        }
    }

    /// Registered source names (lowercased, sorted)
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        sources.sort_unstable();
        sources
    }
}

impl fmt::Debug for ReformatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReformatRegistry")
            .field("sources", &self.sources())
            .finish()
    }
}

/// Parser for CMTrace log lines
///
/// ```text
/// <![LOG[message text]LOG]!><time="09:15:30.500+060" date="03-14-2024" component="AppEnforce" ...>
/// ```
#[derive(Clone, Debug)]
pub struct LineParser {
    /// First `[LOG[...]LOG]` region, may span newlines
    message_re: Regex,

    /// `<time=... >` region
    metadata_re: Regex,

    /// `key="value"` attributes inside the metadata region
    attr_re: Regex,

    reformats: ReformatRegistry,
}

impl LineParser {
    /// Create a parser with the built-in reformat rules
    pub fn new() -> Self {
        Self::with_reformats(ReformatRegistry::with_defaults())
    }

    /// Create a parser with a custom reformat registry
    pub fn with_reformats(reformats: ReformatRegistry) -> Self {
        Self {
            message_re: Regex::new(r"(?s)\[LOG\[(.*?)\]LOG\]").expect("static regex"),
            metadata_re: Regex::new(r"<(time=[^>]*)>").expect("static regex"),
            attr_re: Regex::new(r#"(\w+)="([^"]*)""#).expect("static regex"),
            reformats,
        }
    }

    pub fn reformats(&self) -> &ReformatRegistry {
        &self.reformats
    }

    /// Parse one raw line from the log named `source`
    ///
    /// Returns `Ok(None)` when the line carries no message (continuation
    /// lines of multi-line entries) or the message is blank.
    pub fn parse(&self, line: &str, source: &str) -> Result<Option<ParsedEntry>, ParseError> {
        let Some(caps) = self.message_re.captures(line) else {
            return Ok(None);
        };
        let (Some(region), Some(inner)) = (caps.get(0), caps.get(1)) else {
            return Ok(None);
        };

        let message = self.reformats.apply(source, inner.as_str());
        let message = message.trim();
        if message.is_empty() {
            return Ok(None);
        }

        // Metadata always follows the message region
        let rest = &line[region.end()..];
        let metadata = self
            .metadata_re
            .captures(rest)
            .and_then(|c| c.get(1))
            .ok_or_else(|| ParseError::metadata("metadata region not found"))?
            .as_str();

        let timestamp = Self::extract_timestamp(metadata)?;
        let (component, severity) = self.extract_attributes(metadata);

        Ok(Some(ParsedEntry {
            timestamp,
            message: message.to_string(),
            component,
            severity,
        }))
    }

    /// Rebuild the timestamp from the `time=` and `date=` tokens
    fn extract_timestamp(metadata: &str) -> Result<NaiveDateTime, ParseError> {
        let time = Self::token_value(metadata, "time=")
            .ok_or_else(|| ParseError::metadata("missing time= token"))?;
        // Drop milliseconds and the bias suffix: "09:15:30.500+060" -> "09:15:30"
        let time = time
            .split(['.', '+', '-'])
            .next()
            .unwrap_or_default();
        if time.is_empty() {
            return Err(ParseError::metadata("empty time= token"));
        }

        let date = Self::token_value(metadata, "date=")
            .ok_or_else(|| ParseError::metadata("missing date= token"))?;
        if date.is_empty() {
            return Err(ParseError::metadata("empty date= token"));
        }

        let value = format!("{date} {time}");
        NaiveDateTime::parse_from_str(&value, TIMESTAMP_FORMAT)
            .map_err(|source| ParseError::TimestampReconstruction { value, source })
    }

    /// Value of the first whitespace-separated token starting with `prefix`, unquoted
    fn token_value<'a>(metadata: &'a str, prefix: &str) -> Option<&'a str> {
        metadata
            .split_whitespace()
            .find_map(|token| token.strip_prefix(prefix))
            .map(|value| value.trim_matches('"'))
    }

    /// Optional attributes; anything missing or unrecognized is ignored
    fn extract_attributes(&self, metadata: &str) -> (Option<String>, Severity) {
        let mut component = None;
        let mut severity = Severity::Unknown;

        for caps in self.attr_re.captures_iter(metadata) {
            match (&caps[1], &caps[2]) {
                ("component", value) if !value.is_empty() => component = Some(value.to_string()),
                ("type", value) => severity = Severity::from_type_attr(value),
                _ => {}
            }
        }

        (component, severity)
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}
