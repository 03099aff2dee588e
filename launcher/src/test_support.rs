//! Test-only helpers: scratch launcher directories and scripted program runs.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tempfile::TempDir;

use crate::io::program::{ProgramOutcome, ProgramRequest, ProgramRunner};
use crate::io::trading_log::TradingLog;

/// Temporary launcher directory with helpers for inspecting `trading_log.txt`.
pub struct TestDir {
    _temp: TempDir,
    root: PathBuf,
}

impl TestDir {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        // Canonical so comparisons with resolved launcher dirs hold on macOS (/private/var).
        let root = temp.path().canonicalize().context("canonicalize tempdir")?;
        Ok(Self { _temp: temp, root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join("trading_log.txt")
    }

    pub fn write_config(&self, contents: &str) -> Result<PathBuf> {
        let path = self.root.join("launcher.toml");
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn log_lines(&self) -> Result<Vec<String>> {
        let contents = fs::read_to_string(self.log_path()).context("read trading log")?;
        Ok(contents.lines().map(str::to_string).collect())
    }
}

/// One canned program run: output appended to the log, then an outcome.
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    pub output: String,
    pub outcome: ProgramOutcome,
}

impl ScriptedRun {
    pub fn exited(code: i32, output: &str) -> Self {
        Self {
            output: output.to_string(),
            outcome: ProgramOutcome::Exited {
                code: Some(code),
                success: code == 0,
            },
        }
    }

    pub fn timed_out() -> Self {
        Self {
            output: String::new(),
            outcome: ProgramOutcome::TimedOut,
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            output: String::new(),
            outcome: ProgramOutcome::Unavailable {
                reason: reason.to_string(),
            },
        }
    }
}

/// Runner that replays queued runs in order and records every request.
pub struct ScriptedRunner {
    runs: RefCell<VecDeque<ScriptedRun>>,
    requests: RefCell<Vec<ProgramRequest>>,
}

impl ScriptedRunner {
    pub fn new(runs: Vec<ScriptedRun>) -> Self {
        Self {
            runs: RefCell::new(runs.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProgramRequest> {
        self.requests.borrow().clone()
    }
}

impl ProgramRunner for ScriptedRunner {
    fn run(&self, request: &ProgramRequest) -> Result<ProgramOutcome> {
        self.requests.borrow_mut().push(request.clone());
        let run = self
            .runs
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("scripted runner exhausted"))?;
        if !run.output.is_empty() {
            use std::io::Write;
            let mut file = TradingLog::new(&request.log_path).open_append()?;
            file.write_all(run.output.as_bytes())
                .context("append scripted output")?;
        }
        Ok(run.outcome)
    }
}
