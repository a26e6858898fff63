use std::collections::VecDeque;
use std::io::{self, BufRead};

/// Ring buffer keeping the last N lines pushed into it
#[derive(Clone, Debug)]
pub struct TailBuffer {
    /// Internal storage
    lines: VecDeque<String>,

    /// Maximum capacity (`None` = keep everything)
    capacity: Option<usize>,

    /// Total lines pushed, including evicted ones
    seen: usize,
}

impl TailBuffer {
    /// Create a buffer holding at most `capacity` lines
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
            seen: 0,
        }
    }

    /// Create a buffer that never evicts
    pub fn unbounded() -> Self {
        Self {
            lines: VecDeque::new(),
            capacity: None,
            seen: 0,
        }
    }

    /// Push a new line, evicting oldest if at capacity
    pub fn push(&mut self, line: String) {
        self.seen += 1;
        match self.capacity {
            Some(0) => return,
            Some(capacity) if self.lines.len() >= capacity => {
                self.lines.pop_front();
            }
            _ => {}
        }
        self.lines.push_back(line);
    }

    /// Lines currently held
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total lines pushed so far
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Consume the buffer, oldest line first
    pub fn into_tail(self) -> Tail {
        let first_line_number = self.seen - self.lines.len() + 1;
        Tail {
            first_line_number,
            lines: self.lines.into(),
        }
    }
}

/// The retained end of a file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tail {
    /// 1-based line number of `lines[0]` in the original file
    pub first_line_number: usize,

    pub lines: Vec<String>,
}

/// Read `reader` to the end, keeping the last `limit` lines (all when `None`)
///
/// Line terminators (`\n` or `\r\n`) are stripped. Invalid UTF-8 is replaced
/// rather than failing the read.
pub fn tail_lines<R: BufRead>(mut reader: R, limit: Option<usize>) -> io::Result<Tail> {
    let mut buffer = match limit {
        Some(n) => TailBuffer::new(n),
        None => TailBuffer::unbounded(),
    };
    let mut raw = Vec::new();

    loop {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        if raw.last() == Some(&b'\n') {
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
        }
        buffer.push(String::from_utf8_lossy(&raw).into_owned());
    }

    tracing::debug!(seen = buffer.seen(), kept = buffer.len(), "read log tail");
    Ok(buffer.into_tail())
}
