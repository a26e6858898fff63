use anyhow::Result;
use std::io::Write;

use cmlog_logs::LogRecord;

/// How records are written to stdout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// `2024-03-14 09:15:30 PC01 AppEnforce [INF] message`
    Text,
    /// One JSON object per line
    Json,
}

/// Streams records to a writer in the chosen format
pub struct RecordWriter<W: Write> {
    out: W,
    format: OutputFormat,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            written: 0,
        }
    }

    pub fn write(&mut self, record: &LogRecord) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                writeln!(
                    self.out,
                    "{} {} {} [{}] {}",
                    record.timestamp().format("%Y-%m-%d %H:%M:%S"),
                    record.computer_name(),
                    record.source(),
                    record.severity(),
                    record.message()
                )?;
            }
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, record)?;
                self.out.write_all(b"\n")?;
            }
        }
        self.written += 1;
        Ok(())
    }

    /// Records written so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cmlog_logs::{LogSource, ParsedEntry, Severity};

    fn record() -> LogRecord {
        let entry = ParsedEntry {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 14)
                .unwrap()
                .and_hms_opt(9, 15, 30)
                .unwrap(),
            message: "Hello World".to_string(),
            component: Some("AppEnforce".to_string()),
            severity: Severity::Warning,
        };
        LogRecord::new(entry, &LogSource::new("PC01", "AppEnforce", "AppEnforce.log"))
    }

    #[test]
    fn test_text_output() {
        let mut writer = RecordWriter::new(Vec::new(), OutputFormat::Text);
        writer.write(&record()).unwrap();
        assert_eq!(writer.written(), 1);
        let out = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(out, "2024-03-14 09:15:30 PC01 AppEnforce [WRN] Hello World\n");
    }

    #[test]
    fn test_json_output() {
        let mut writer = RecordWriter::new(Vec::new(), OutputFormat::Json);
        writer.write(&record()).unwrap();
        writer.write(&record()).unwrap();
        let out = String::from_utf8(writer.finish().unwrap()).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["Message"], "Hello World");
        assert_eq!(value["Severity"], "Warning");
        assert_eq!(value["Path"], "AppEnforce.log");
    }
}
