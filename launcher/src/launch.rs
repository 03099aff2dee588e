//! Orchestration for one launcher invocation.
//!
//! The sequence is strictly linear: console setup, enter the launcher
//! directory, start marker, run the trading program with its output appended
//! to the log, completion marker. The completion marker is written whatever
//! the program did; only launcher-side failures (config, directory, log file)
//! abort the sequence.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::io::config::{CONFIG_FILE_NAME, LauncherConfig, load_config};
use crate::io::console::configure_utf8_console;
use crate::io::program::{ProgramOutcome, ProgramRequest, ProgramRunner};
use crate::io::trading_log::{Marker, MarkerLine, TradingLog};
use crate::io::workdir;

/// Where the launcher should run and which config to read.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Overrides the executable's directory.
    pub dir: Option<PathBuf>,
    /// Overrides `<dir>/launcher.toml`. Relative paths resolve against `dir`.
    pub config: Option<PathBuf>,
}

/// Outcome of one invocation.
#[derive(Debug, Clone)]
pub struct LaunchOutcome {
    pub root: PathBuf,
    pub log_path: PathBuf,
    pub started: MarkerLine,
    pub finished: MarkerLine,
    pub program: ProgramOutcome,
}

impl LaunchOutcome {
    pub fn exit_code(&self) -> i32 {
        self.program.exit_code()
    }
}

/// Full sequence as run by the binary.
///
/// Changes the process working directory, so tests drive [`run_launch`] instead.
pub fn launch<R: ProgramRunner>(options: &LaunchOptions, runner: &R) -> Result<LaunchOutcome> {
    if let Err(err) = configure_utf8_console() {
        warn!(err = %format!("{err:#}"), "could not switch console to UTF-8");
    }

    let root = workdir::launcher_dir(options.dir.as_deref())?;
    workdir::enter(&root)?;

    let config_path = resolve_config_path(&root, options.config.as_deref());
    let config = load_config(&config_path).context("load launcher config")?;
    debug!(config_path = %config_path.display(), "config loaded");

    run_launch(&root, &config, runner)
}

/// Markers and program run against an explicit `root`.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn run_launch<R: ProgramRunner>(
    root: &Path,
    config: &LauncherConfig,
    runner: &R,
) -> Result<LaunchOutcome> {
    let log_path = root.join(&config.log_file);
    let log = TradingLog::new(&log_path);

    let started = log
        .append_marker(&Marker::Start)
        .context("write start marker")?;
    info!(log = %log_path.display(), "trading system started");

    let request = ProgramRequest {
        workdir: root.to_path_buf(),
        program: config.program.clone(),
        args: config.ticker_args(),
        env: config.child_env(),
        log_path: log_path.clone(),
        timeout: config.timeout(),
    };
    let program = runner.run(&request).context("run trading program")?;

    match &program {
        ProgramOutcome::Unavailable { reason } => {
            log.append_line(&format!("[launcher] {reason}"))
                .context("record spawn failure")?;
        }
        ProgramOutcome::TimedOut => {
            let secs = config.timeout_secs.unwrap_or_default();
            log.append_line(&format!("[launcher] program timed out after {secs}s"))
                .context("record timeout")?;
        }
        ProgramOutcome::Exited { .. } => {}
    }

    let end_marker = completion_marker(config, &program);
    let finished = log
        .append_marker(&end_marker)
        .context("write completion marker")?;
    info!(outcome = ?program, "mission finished");

    Ok(LaunchOutcome {
        root: root.to_path_buf(),
        log_path,
        started,
        finished,
        program,
    })
}

/// `--config` (relative to `root`) or `<root>/launcher.toml`.
pub fn resolve_config_path(root: &Path, config: Option<&Path>) -> PathBuf {
    match config {
        Some(path) => root.join(path),
        None => root.join(CONFIG_FILE_NAME),
    }
}

/// `Mission completed` unless exit-status reporting is on and the program failed.
fn completion_marker(config: &LauncherConfig, program: &ProgramOutcome) -> Marker {
    if !config.report_exit_status {
        return Marker::Completed;
    }
    match program.failure_reason() {
        Some(reason) => Marker::Failed(reason),
        None => Marker::Completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes;
    use crate::io::trading_log::parse_marker;
    use crate::test_support::{ScriptedRun, ScriptedRunner, TestDir};

    #[test]
    fn markers_wrap_program_output() {
        let dir = TestDir::new().expect("dir");
        let runner = ScriptedRunner::new(vec![ScriptedRun::exited(0, "AAPL: hold\n")]);

        let outcome = run_launch(dir.path(), &LauncherConfig::default(), &runner).expect("launch");

        assert_eq!(outcome.exit_code(), exit_codes::OK);
        let lines = dir.log_lines().expect("log");
        assert_eq!(lines.len(), 3);
        assert_eq!(parse_marker(&lines[0]).expect("start").marker, Marker::Start);
        assert_eq!(lines[1], "AAPL: hold");
        assert_eq!(
            parse_marker(&lines[2]).expect("end").marker,
            Marker::Completed
        );
        assert!(outcome.started.at <= outcome.finished.at);
    }

    #[test]
    fn program_receives_fixed_ticker_args_in_root() {
        let dir = TestDir::new().expect("dir");
        let runner = ScriptedRunner::new(vec![ScriptedRun::exited(0, "")]);

        run_launch(dir.path(), &LauncherConfig::default(), &runner).expect("launch");

        let requests = runner.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.args, vec!["--ticker", "AAPL,MSFT,NVDA,TSLA"]);
        assert_eq!(req.workdir, dir.path());
        assert_eq!(req.log_path, dir.path().join("trading_log.txt"));
        assert_eq!(
            req.env.get("PYTHONIOENCODING").map(String::as_str),
            Some("utf-8")
        );
        assert_eq!(req.timeout, None);
    }

    #[test]
    fn failure_still_logs_mission_completed_by_default() {
        let dir = TestDir::new().expect("dir");
        let runner = ScriptedRunner::new(vec![ScriptedRun::exited(2, "Traceback: boom\n")]);

        let outcome = run_launch(dir.path(), &LauncherConfig::default(), &runner).expect("launch");

        assert_eq!(outcome.exit_code(), 2);
        assert_eq!(outcome.finished.marker, Marker::Completed);
        let last = dir.log_lines().expect("log").pop().expect("line");
        assert_eq!(parse_marker(&last).expect("end").marker, Marker::Completed);
    }

    #[test]
    fn unavailable_program_is_recorded_before_completion() {
        let dir = TestDir::new().expect("dir");
        let runner = ScriptedRunner::new(vec![ScriptedRun::unavailable(
            "failed to start poetry: spawn command: No such file or directory",
        )]);

        let outcome = run_launch(dir.path(), &LauncherConfig::default(), &runner).expect("launch");

        assert_eq!(outcome.exit_code(), exit_codes::UNAVAILABLE);
        let lines = dir.log_lines().expect("log");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("[launcher] failed to start poetry"));
        assert_eq!(
            parse_marker(&lines[2]).expect("end").marker,
            Marker::Completed
        );
    }

    #[test]
    fn reports_failure_when_enabled() {
        let dir = TestDir::new().expect("dir");
        let config = LauncherConfig {
            report_exit_status: true,
            timeout_secs: Some(5),
            ..LauncherConfig::default()
        };
        let runner = ScriptedRunner::new(vec![
            ScriptedRun::exited(3, ""),
            ScriptedRun::timed_out(),
            ScriptedRun::exited(0, ""),
        ]);

        let first = run_launch(dir.path(), &config, &runner).expect("first");
        let second = run_launch(dir.path(), &config, &runner).expect("second");
        let third = run_launch(dir.path(), &config, &runner).expect("third");

        assert_eq!(first.finished.marker, Marker::Failed("exit code 3".to_string()));
        assert_eq!(second.finished.marker, Marker::Failed("timed out".to_string()));
        assert_eq!(second.exit_code(), exit_codes::TIMED_OUT);
        assert_eq!(third.finished.marker, Marker::Completed);

        let lines = dir.log_lines().expect("log");
        assert!(lines.contains(&"[launcher] program timed out after 5s".to_string()));
    }

    #[test]
    fn two_runs_append_two_ordered_pairs() {
        let dir = TestDir::new().expect("dir");
        let runner = ScriptedRunner::new(vec![
            ScriptedRun::exited(0, "run one\n"),
            ScriptedRun::exited(0, "run two\n"),
        ]);

        let first = run_launch(dir.path(), &LauncherConfig::default(), &runner).expect("first");
        let second = run_launch(dir.path(), &LauncherConfig::default(), &runner).expect("second");

        let markers: Vec<MarkerLine> = dir
            .log_lines()
            .expect("log")
            .iter()
            .filter_map(|line| parse_marker(line))
            .collect();
        let kinds: Vec<&Marker> = markers.iter().map(|m| &m.marker).collect();
        assert_eq!(
            kinds,
            vec![
                &Marker::Start,
                &Marker::Completed,
                &Marker::Start,
                &Marker::Completed
            ]
        );
        assert!(markers.windows(2).all(|pair| pair[0].at <= pair[1].at));
        assert!(first.finished.at <= second.started.at);
    }

    #[test]
    fn custom_log_file_is_relative_to_root() {
        let dir = TestDir::new().expect("dir");
        let config = LauncherConfig {
            log_file: "bot.log".to_string(),
            ..LauncherConfig::default()
        };
        let runner = ScriptedRunner::new(vec![ScriptedRun::exited(0, "")]);

        let outcome = run_launch(dir.path(), &config, &runner).expect("launch");
        assert_eq!(outcome.log_path, dir.path().join("bot.log"));
        assert!(outcome.log_path.is_file());
    }

    #[test]
    fn config_path_defaults_to_launcher_toml() {
        let root = Path::new("/opt/bot");
        assert_eq!(
            resolve_config_path(root, None),
            Path::new("/opt/bot/launcher.toml")
        );
        assert_eq!(
            resolve_config_path(root, Some(Path::new("alt.toml"))),
            Path::new("/opt/bot/alt.toml")
        );
    }
}
