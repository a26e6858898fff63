//! Log file access: source names, local host name and tail reads

use anyhow::{Context, Result};
use regex::Regex;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::LazyLock;

use cmlog_logs::{Tail, tail_lines};

/// Rotated logs are renamed `<Source>-YYYYMMDD-HHMMSS.log`
static ROTATION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d{8}-\d{6}$").expect("static regex"));

/// Derive the source/component name from a log file path
///
/// `AppEnforce.log`, `AppEnforce.lo_` and `AppEnforce-20240314-091530.log`
/// all map to "AppEnforce".
pub fn source_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    ROTATION_SUFFIX.replace(&stem, "").into_owned()
}

/// Name of the machine the logs are read on
pub fn local_computer_name() -> String {
    ["COMPUTERNAME", "HOSTNAME"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Read the last `limit` lines of a file (all lines when `None`)
pub fn read_tail(path: &Path, limit: Option<usize>) -> Result<Tail> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    tail_lines(BufReader::new(file), limit)
        .with_context(|| format!("Failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_name_from_plain_log() {
        assert_eq!(source_name(Path::new("C:/Windows/CCM/Logs/AppEnforce.log")), "AppEnforce");
        assert_eq!(source_name(Path::new("logs/AppIntentEval.lo_")), "AppIntentEval");
    }

    #[test]
    fn test_source_name_strips_rotation_suffix() {
        assert_eq!(
            source_name(Path::new("AppIntentEval-20240314-091530.log")),
            "AppIntentEval"
        );
        // Only a full date-time suffix counts as rotation
        assert_eq!(source_name(Path::new("Ccm-Setup.log")), "Ccm-Setup");
    }

    #[test]
    fn test_read_tail_missing_file() {
        let err = read_tail(Path::new("definitely/not/here.log"), Some(10)).unwrap_err();
        assert!(format!("{:#}", err).contains("here.log"));
    }
}
