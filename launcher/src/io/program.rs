//! Program runner abstraction for the trading program invocation.
//!
//! The [`ProgramRunner`] trait decouples the launch sequence from the actual
//! process spawn (currently the dependency manager, e.g. `poetry run`). Tests
//! use scripted runners that append canned output without spawning processes.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{error, info, instrument, warn};

use crate::exit_codes;
use crate::io::process::spawn_redirected;
use crate::io::trading_log::TradingLog;

/// Parameters for one program invocation.
#[derive(Debug, Clone)]
pub struct ProgramRequest {
    /// Working directory for the program (the launcher directory).
    pub workdir: PathBuf,
    /// Dependency-manager command line, e.g. `["poetry", "run", "python", "src/main.py"]`.
    pub program: Vec<String>,
    /// Arguments appended after `program`.
    pub args: Vec<String>,
    /// Environment added to the inherited one.
    pub env: BTreeMap<String, String>,
    /// Log file receiving stdout and stderr (appended).
    pub log_path: PathBuf,
    /// Kill the program after this long. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl ProgramRequest {
    /// Full argv as it will be executed, for diagnostics.
    pub fn argv(&self) -> Vec<String> {
        self.program.iter().chain(&self.args).cloned().collect()
    }
}

/// How the program run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramOutcome {
    /// The program ran and exited. `code` is `None` when it was killed by a signal.
    Exited { code: Option<i32>, success: bool },
    /// The configured timeout elapsed and the program was killed.
    TimedOut,
    /// The program could not be started at all.
    Unavailable { reason: String },
}

impl ProgramOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, ProgramOutcome::Exited { success: true, .. })
    }

    /// Exit code the launcher itself should return.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProgramOutcome::Exited { code: Some(code), .. } => *code,
            ProgramOutcome::Exited { code: None, success: true } => exit_codes::OK,
            ProgramOutcome::Exited { code: None, success: false } => exit_codes::KILLED,
            ProgramOutcome::TimedOut => exit_codes::TIMED_OUT,
            ProgramOutcome::Unavailable { .. } => exit_codes::UNAVAILABLE,
        }
    }

    /// Short reason for a `Mission failed (...)` marker; `None` on success.
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            ProgramOutcome::Exited { success: true, .. } => None,
            ProgramOutcome::Exited { code: Some(code), .. } => Some(format!("exit code {code}")),
            ProgramOutcome::Exited { code: None, .. } => Some("killed by signal".to_string()),
            ProgramOutcome::TimedOut => Some("timed out".to_string()),
            ProgramOutcome::Unavailable { .. } => Some("program unavailable".to_string()),
        }
    }
}

/// Abstraction over how the trading program is started.
pub trait ProgramRunner {
    /// Run the program to completion with its output appended to `request.log_path`.
    ///
    /// Errors are reserved for launcher-side failures (the log cannot be opened,
    /// waiting on or killing a started program failed); a program that fails to
    /// start is reported as [`ProgramOutcome::Unavailable`].
    fn run(&self, request: &ProgramRequest) -> Result<ProgramOutcome>;
}

/// Runner that spawns the dependency manager directly.
pub struct DependencyManagerRunner;

impl ProgramRunner for DependencyManagerRunner {
    #[instrument(skip_all, fields(program = ?request.program.first(), timeout_secs = request.timeout.map(|t| t.as_secs())))]
    fn run(&self, request: &ProgramRequest) -> Result<ProgramOutcome> {
        let argv = request.argv();
        let (exe, args) = request
            .program
            .first()
            .map(|exe| (exe, &argv[1..]))
            .ok_or_else(|| anyhow!("program must be a non-empty array"))?;
        info!(workdir = %request.workdir.display(), ?argv, "starting trading program");

        let sink = TradingLog::new(&request.log_path).open_append()?;
        let stdout = sink.try_clone().context("clone log handle for stdout")?;
        let mut cmd = build_command(exe, args);
        cmd.envs(&request.env).current_dir(&request.workdir);

        let child = match spawn_redirected(cmd, stdout, sink, request.timeout) {
            Ok(child) => child,
            Err(err) => {
                error!(err = %err, "failed to spawn trading program");
                return Ok(ProgramOutcome::Unavailable {
                    reason: format!("failed to start {exe}: {err}"),
                });
            }
        };
        // From here on the program is running; failures are the launcher's, not "unavailable".
        let output = child.wait().context("wait for trading program")?;

        if output.timed_out {
            return Ok(ProgramOutcome::TimedOut);
        }
        let outcome = ProgramOutcome::Exited {
            code: output.status.code(),
            success: output.status.success(),
        };
        if !outcome.succeeded() {
            warn!(exit_code = ?output.status.code(), "trading program failed");
        }
        Ok(outcome)
    }
}

/// Dependency managers ship as `.cmd`/`.bat` shims on Windows, which only the
/// command interpreter resolves.
#[cfg(windows)]
fn build_command(exe: &str, args: &[String]) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(exe).args(args);
    cmd
}

#[cfg(not(windows))]
fn build_command(exe: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(exe);
    cmd.args(args);
    cmd
}
