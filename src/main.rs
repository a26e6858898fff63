use std::io::{self, BufWriter};
use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cmlog_logs::{
    CountLimit, LineParser, LogReader, LogSource, RecordBudget, RecordFilter, Severity,
    TimeWindow,
};

mod config;
mod output;
mod source;

use config::{Config, DEFAULT_TAIL_LINES};
use output::{OutputFormat, RecordWriter};

/// cmlog - Read and filter CMTrace-format agent logs
#[derive(Parser, Debug)]
#[command(name = "cmlog")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log files to read, in order
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Only entries strictly after this time (YYYY-MM-DD[ HH:MM:SS])
    #[arg(long, value_parser = parse_datetime)]
    after: Option<NaiveDateTime>,

    /// Only entries strictly before this time (YYYY-MM-DD[ HH:MM:SS])
    #[arg(long, value_parser = parse_datetime)]
    before: Option<NaiveDateTime>,

    /// Maximum number of records across all files
    #[arg(short = 'n', long)]
    count: Option<NonZeroUsize>,

    /// Number of lines to read from the end of each file
    #[arg(long, conflicts_with = "all_lines")]
    tail: Option<usize>,

    /// Read whole files instead of their tail
    #[arg(long)]
    all_lines: bool,

    /// ComputerName stamped on every record
    #[arg(long)]
    computer_name: Option<String>,

    /// Only messages matching this regex
    #[arg(short = 'g', long)]
    grep: Option<String>,

    /// Case-insensitive --grep
    #[arg(short = 'i', long, requires = "grep")]
    ignore_case: bool,

    /// Invert --grep and --severity
    #[arg(short = 'v', long)]
    invert_match: bool,

    /// Only these severities (info, warning, error, unknown)
    #[arg(long = "severity", value_name = "LEVEL", value_parser = parse_severity)]
    severities: Vec<Severity>,

    /// Emit JSON lines
    #[arg(long)]
    json: bool,

    /// TOML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let result = run(args);

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let computer_name = args
        .computer_name
        .clone()
        .or_else(|| config.computer_name.clone())
        .unwrap_or_else(source::local_computer_name);
    let tail_limit = if args.all_lines {
        None
    } else {
        Some(args.tail.or(config.tail_lines).unwrap_or(DEFAULT_TAIL_LINES))
    };
    let format = if args.json || config.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let reader = LogReader::new(LineParser::with_reformats(config.reformat_registry()))
        .with_window(TimeWindow::new(args.after, args.before))
        .with_filter(build_filter(&args)?);
    let budget = RecordBudget::new(args.count.map(CountLimit::from));
    let mut writer = RecordWriter::new(BufWriter::new(io::stdout().lock()), format);

    let mut failed = 0;
    for path in &args.files {
        if budget.is_exhausted() {
            tracing::debug!(count = budget.emitted(), "count limit reached");
            break;
        }

        let origin = LogSource::new(&computer_name, source::source_name(path), path);
        let tail = match source::read_tail(path, tail_limit) {
            Ok(tail) => tail,
            Err(e) => {
                tracing::warn!(computer = %computer_name, "{:#}", e);
                failed += 1;
                continue;
            }
        };

        let records = reader
            .records(&tail.lines, &origin, &budget)
            .numbered_from(tail.first_line_number);
        for record in records {
            match record {
                Ok(record) => writer.write(&record)?,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        computer = %computer_name,
                        line = e.line_number,
                        "{}: {}, skipping rest of file",
                        e,
                        e.source
                    );
                    failed += 1;
                }
            }
        }
    }

    tracing::debug!(records = writer.written(), files = args.files.len(), "done");
    writer.finish()?;

    if failed > 0 {
        anyhow::bail!("{} of {} log files could not be read", failed, args.files.len());
    }
    Ok(())
}

/// `RUST_LOG` when set and valid, warnings otherwise
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

/// Message/severity filter from the command line
fn build_filter(args: &Args) -> Result<RecordFilter> {
    let pattern = args.grep.as_deref().unwrap_or_default();
    let filter = if args.ignore_case {
        RecordFilter::new_case_insensitive(pattern)?
    } else {
        RecordFilter::new(pattern)?
    };
    let filter = filter.with_severities(args.severities.iter().copied().collect());

    Ok(if args.invert_match {
        filter.inverted()
    } else {
        filter
    })
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`
fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| format!("expected YYYY-MM-DD[ HH:MM:SS], got '{}'", s))
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    Severity::from_name(s).ok_or_else(|| format!("unknown severity '{}'", s))
}
