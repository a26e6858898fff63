//! CMTrace log processing for cmlog
//!
//! This crate provides line parsing, time/count/message filtering, and
//! tail-bounded line reading. Parsing and filtering perform no I/O; lines
//! are handed in by the caller.

mod error;
mod filter;
mod parser;
mod reader;
mod tail;

pub use error::{ParseError, ReadError};
pub use filter::RecordFilter;
pub use parser::{APP_INTENT_EVAL, LineParser, ReformatRegistry, split_key_values};
pub use reader::{LogReader, RecordBudget, Records};
pub use tail::{Tail, TailBuffer, tail_lines};

// Re-export types used in our public API
pub use cmlog_types::{CountLimit, LogRecord, LogSource, ParsedEntry, Severity, TimeWindow};
