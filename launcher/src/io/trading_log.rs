//! Append-only `trading_log.txt` shared by the launcher and the trading program.
//!
//! The launcher writes marker lines `[<date> <time>] <message>`; everything
//! between a start marker and its completion marker is raw program output.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, Timelike};
use regex::Regex;
use tracing::debug;

pub const START_MESSAGE: &str = "Start trading system...";
pub const COMPLETED_MESSAGE: &str = "Mission completed";

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{2})\] (.+)$").unwrap()
});

/// Message carried by a launcher-written line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Start,
    Completed,
    /// Only written when exit-status reporting is enabled.
    Failed(String),
}

impl Marker {
    pub fn message(&self) -> String {
        match self {
            Marker::Start => START_MESSAGE.to_string(),
            Marker::Completed => COMPLETED_MESSAGE.to_string(),
            Marker::Failed(reason) => format!("Mission failed ({reason})"),
        }
    }

    fn from_message(message: &str) -> Option<Self> {
        match message {
            START_MESSAGE => Some(Marker::Start),
            COMPLETED_MESSAGE => Some(Marker::Completed),
            _ => message
                .strip_prefix("Mission failed (")
                .and_then(|rest| rest.strip_suffix(')'))
                .map(|reason| Marker::Failed(reason.to_string())),
        }
    }

    /// True for both completion variants.
    pub fn is_end(&self) -> bool {
        !matches!(self, Marker::Start)
    }
}

/// A parsed marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerLine {
    pub at: NaiveDateTime,
    pub marker: Marker,
}

/// Format a marker line (without trailing newline).
///
/// Time is shown with centiseconds, matching the Windows `%time%` shape.
pub fn format_marker(at: NaiveDateTime, marker: &Marker) -> String {
    let centis = at.nanosecond() % 1_000_000_000 / 10_000_000;
    format!(
        "[{}.{centis:02}] {}",
        at.format(DATE_TIME_FORMAT),
        marker.message()
    )
}

/// Parse a launcher marker line. Any other line (program output) yields `None`.
pub fn parse_marker(line: &str) -> Option<MarkerLine> {
    let line = line.trim_end_matches(['\r', '\n']);
    let caps = MARKER_RE.captures(line)?;
    let at = NaiveDateTime::parse_from_str(&caps[1], "%Y-%m-%d %H:%M:%S%.f").ok()?;
    let marker = Marker::from_message(&caps[2])?;
    Some(MarkerLine { at, marker })
}

/// Handle to the log file. Every write opens the file in append mode so the
/// launcher never clobbers what the program wrote in between.
#[derive(Debug, Clone)]
pub struct TradingLog {
    path: PathBuf,
}

impl TradingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open for appending, creating the file if absent.
    pub fn open_append(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open log {}", self.path.display()))
    }

    /// Append a marker stamped with the current local time.
    pub fn append_marker(&self, marker: &Marker) -> Result<MarkerLine> {
        self.append_marker_at(Local::now().naive_local(), marker)
    }

    pub fn append_marker_at(&self, at: NaiveDateTime, marker: &Marker) -> Result<MarkerLine> {
        let line = format_marker(at, marker);
        debug!(path = %self.path.display(), %line, "appending marker");
        self.append_line(&line)?;
        Ok(MarkerLine {
            at,
            marker: marker.clone(),
        })
    }

    /// Append one raw line (newline added).
    pub fn append_line(&self, line: &str) -> Result<()> {
        let mut file = self.open_append()?;
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        file.write_all(buf.as_bytes())
            .with_context(|| format!("append to log {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32, milli: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 9)
            .expect("date")
            .and_hms_milli_opt(h, m, s, milli)
            .expect("time")
    }

    #[test]
    fn formats_start_and_completion_markers() {
        assert_eq!(
            format_marker(at(9, 5, 7, 120), &Marker::Start),
            "[2026-03-09 09:05:07.12] Start trading system..."
        );
        assert_eq!(
            format_marker(at(23, 59, 59, 999), &Marker::Completed),
            "[2026-03-09 23:59:59.99] Mission completed"
        );
        assert_eq!(
            format_marker(at(0, 0, 0, 0), &Marker::Failed("exit code 2".to_string())),
            "[2026-03-09 00:00:00.00] Mission failed (exit code 2)"
        );
    }

    #[test]
    fn parses_markers_and_ignores_program_output() {
        let line = parse_marker("[2026-03-09 09:05:07.12] Start trading system...\r\n")
            .expect("start marker");
        assert_eq!(line.marker, Marker::Start);
        assert_eq!(line.at, at(9, 5, 7, 120));

        let failed = parse_marker("[2026-03-09 09:05:07.12] Mission failed (timed out)")
            .expect("failed marker");
        assert_eq!(failed.marker, Marker::Failed("timed out".to_string()));
        assert!(failed.marker.is_end());

        assert!(parse_marker("AAPL: BUY 10 @ confidence 80%").is_none());
        assert!(parse_marker("[2026-03-09 09:05:07.12] something else").is_none());
        assert!(parse_marker("[not a date] Mission completed").is_none());
    }

    #[test]
    fn append_creates_file_and_preserves_existing_content() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("trading_log.txt");
        let log = TradingLog::new(&path);

        log.append_marker_at(at(8, 0, 0, 0), &Marker::Start)
            .expect("start");
        log.append_line("program output").expect("line");
        log.append_marker_at(at(8, 1, 0, 0), &Marker::Completed)
            .expect("end");

        let contents = std::fs::read_to_string(&path).expect("read");
        assert_eq!(
            contents,
            "[2026-03-09 08:00:00.00] Start trading system...\n\
             program output\n\
             [2026-03-09 08:01:00.00] Mission completed\n"
        );
    }

    #[test]
    fn append_marker_uses_current_time() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = TradingLog::new(temp.path().join("trading_log.txt"));

        let before = Local::now().naive_local();
        let written = log.append_marker(&Marker::Start).expect("append");
        let contents = std::fs::read_to_string(log.path()).expect("read");
        let parsed = parse_marker(contents.lines().next().expect("line")).expect("parse");

        assert_eq!(parsed.marker, Marker::Start);
        assert!(parsed.at <= written.at);
        assert!(written.at - parsed.at < chrono::TimeDelta::milliseconds(10));
        assert!(written.at >= before);
    }
}
