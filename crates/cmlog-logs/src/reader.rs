use std::iter::FusedIterator;
use std::sync::atomic::{AtomicUsize, Ordering};

use cmlog_types::{CountLimit, LogRecord, LogSource, TimeWindow};

use crate::error::ReadError;
use crate::filter::RecordFilter;
use crate::parser::LineParser;

/// Emission counter shared by every file and host of one retrieval
///
/// Pass the same budget to each [`LogReader::records`] call so the count
/// limit caps the whole retrieval rather than each file.
#[derive(Debug, Default)]
pub struct RecordBudget {
    limit: Option<CountLimit>,
    emitted: AtomicUsize,
}

impl RecordBudget {
    pub fn new(limit: Option<CountLimit>) -> Self {
        Self {
            limit,
            emitted: AtomicUsize::new(0),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    pub fn limited(limit: CountLimit) -> Self {
        Self::new(Some(limit))
    }

    /// Reserve a slot for one record; false once the limit is reached
    pub fn try_claim(&self) -> bool {
        let Some(limit) = self.limit else {
            self.emitted.fetch_add(1, Ordering::SeqCst);
            return true;
        };
        self.emitted
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < limit.get()).then_some(n + 1)
            })
            .is_ok()
    }

    pub fn is_exhausted(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.emitted() >= limit.get())
    }

    /// Records emitted so far
    pub fn emitted(&self) -> usize {
        self.emitted.load(Ordering::SeqCst)
    }

    /// Slots left (`None` when unlimited)
    pub fn remaining(&self) -> Option<usize> {
        self.limit
            .map(|limit| limit.get().saturating_sub(self.emitted()))
    }
}

/// Turns raw CMTrace lines into filtered log records
#[derive(Clone, Debug, Default)]
pub struct LogReader {
    parser: LineParser,
    window: TimeWindow,
    filter: Option<RecordFilter>,
}

impl LogReader {
    pub fn new(parser: LineParser) -> Self {
        Self {
            parser,
            window: TimeWindow::unbounded(),
            filter: None,
        }
    }

    /// Drop entries outside `window`
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Drop entries the filter rejects
    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.filter = (!filter.is_empty()).then_some(filter);
        self
    }

    /// Lazily read records from the lines of one file, in order
    ///
    /// The iterator yields at most one error; after a malformed line no
    /// further lines of this file are examined.
    pub fn records<'a, I>(
        &'a self,
        lines: I,
        origin: &'a LogSource,
        budget: &'a RecordBudget,
    ) -> Records<'a, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Records {
            reader: self,
            origin,
            budget,
            lines: lines.into_iter(),
            line_number: 0,
            done: false,
        }
    }

    /// Eagerly read all records from the lines of one file
    pub fn read<I>(
        &self,
        lines: I,
        origin: &LogSource,
        budget: &RecordBudget,
    ) -> Result<Vec<LogRecord>, ReadError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.records(lines, origin, budget).collect()
    }
}

/// Iterator returned by [`LogReader::records`]
pub struct Records<'a, I> {
    reader: &'a LogReader,
    origin: &'a LogSource,
    budget: &'a RecordBudget,
    lines: I,

    /// Number of the last line taken from `lines`
    line_number: usize,

    done: bool,
}

impl<I> Records<'_, I> {
    /// Number lines from `first` instead of 1, e.g. for a tail of a file
    pub fn numbered_from(mut self, first: usize) -> Self {
        self.line_number = first.saturating_sub(1);
        self
    }
}

impl<I> Iterator for Records<'_, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = Result<LogRecord, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.budget.is_exhausted() {
                break;
            }
            let Some(line) = self.lines.next() else {
                break;
            };
            self.line_number += 1;

            let entry = match self.reader.parser.parse(line.as_ref(), &self.origin.source) {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(source) => {
                    self.done = true;
                    return Some(Err(ReadError {
                        line_number: self.line_number,
                        source,
                    }));
                }
            };

            if !self.reader.window.contains(entry.timestamp) {
                continue;
            }
            if let Some(filter) = &self.reader.filter {
                if !filter.matches(&entry) {
                    continue;
                }
            }
            if !self.budget.try_claim() {
                break;
            }

            return Some(Ok(LogRecord::new(entry, self.origin)));
        }

        self.done = true;
        None
    }
}

impl<I> FusedIterator for Records<'_, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
}
