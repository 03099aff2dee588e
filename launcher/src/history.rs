//! Past runs reconstructed from the marker lines in the trading log.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::io::trading_log::{Marker, MarkerLine, parse_marker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Failed(String),
    /// Start marker with no completion marker (launcher killed mid-run, or still running).
    Incomplete,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed(reason) => write!(f, "failed ({reason})"),
            RunStatus::Incomplete => write!(f, "incomplete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub started: NaiveDateTime,
    pub finished: Option<NaiveDateTime>,
    pub status: RunStatus,
    /// Non-marker lines between the two markers.
    pub output_lines: usize,
}

/// Pair start markers with the next completion marker.
///
/// A completion marker without a preceding start is ignored.
pub fn collect_runs<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<RunRecord> {
    let mut runs = Vec::new();
    let mut open: Option<RunRecord> = None;

    for line in lines {
        match parse_marker(line) {
            Some(MarkerLine { at, marker }) if marker.is_end() => {
                if let Some(mut run) = open.take() {
                    run.finished = Some(at);
                    run.status = match marker {
                        Marker::Failed(reason) => RunStatus::Failed(reason),
                        _ => RunStatus::Completed,
                    };
                    runs.push(run);
                }
            }
            Some(MarkerLine { at, .. }) => {
                if let Some(unfinished) = open.take() {
                    runs.push(unfinished);
                }
                open = Some(RunRecord {
                    started: at,
                    finished: None,
                    status: RunStatus::Incomplete,
                    output_lines: 0,
                });
            }
            None => {
                if let Some(run) = open.as_mut() {
                    run.output_lines += 1;
                }
            }
        }
    }
    if let Some(unfinished) = open {
        runs.push(unfinished);
    }
    runs
}

/// Read runs from a log file. A missing file has no runs.
pub fn read_history(path: &Path) -> Result<Vec<RunRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    // Program output is not guaranteed to be UTF-8.
    let contents = String::from_utf8_lossy(&bytes);
    Ok(collect_runs(contents.lines()))
}

/// One summary line, `n` being 1-based.
pub fn format_run(n: usize, run: &RunRecord) -> String {
    let finished = run
        .finished
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "run {n}: started={} finished={finished} output_lines={} status={}",
        run.started.format("%Y-%m-%d %H:%M:%S"),
        run.output_lines,
        run.status
    )
}
