//! Error types for CMTrace parsing
//!
//! A line without message markers is not an error; the parser reports it as
//! a skip. Everything here is a grammar mismatch found after a message was
//! located, and stops processing of the file it came from.

/// Failure to extract a well-formed entry from one line
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Metadata region missing, or its `time=`/`date=` tokens missing or empty
    #[error("metadata extraction failed: {reason}")]
    MetadataExtraction { reason: String },

    /// Date and time stubs were found but do not form a calendar date-time
    #[error("cannot build timestamp from '{value}'")]
    TimestampReconstruction {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl ParseError {
    pub(crate) fn metadata(reason: impl Into<String>) -> Self {
        Self::MetadataExtraction {
            reason: reason.into(),
        }
    }
}

/// A parse failure located within a file
#[derive(Debug, thiserror::Error)]
#[error("malformed entry at line {line_number}")]
pub struct ReadError {
    /// 1-based line number within the file
    pub line_number: usize,

    #[source]
    pub source: ParseError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_metadata_error_display() {
        let err = ParseError::metadata("no time= token");
        assert_eq!(
            err.to_string(),
            "metadata extraction failed: no time= token"
        );
    }

    #[test]
    fn test_read_error_chains_parse_error() {
        let err = ReadError {
            line_number: 42,
            source: ParseError::metadata("metadata region not found"),
        };
        assert!(err.to_string().contains("42"));
        let cause = err.source().map(|e| e.to_string()).unwrap_or_default();
        assert!(cause.contains("metadata region not found"));
    }
}
