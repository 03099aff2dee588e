//! Launcher configuration stored in `launcher.toml` next to the executable.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File name looked up in the launcher directory when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "launcher.toml";

/// Variable telling the Python interpreter to use UTF-8 for its standard streams.
pub const PYTHON_IO_ENCODING_VAR: &str = "PYTHONIOENCODING";

/// Launcher configuration (TOML).
///
/// Every field is optional. A missing file reproduces the fixed invocation
/// `poetry run python src/main.py --ticker AAPL,MSFT,NVDA,TSLA`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LauncherConfig {
    /// Dependency-manager command line that runs the trading program.
    pub program: Vec<String>,

    /// Ticker symbols passed as a comma-joined `--ticker` value.
    pub tickers: Vec<String>,

    /// Log file, relative to the launcher directory.
    pub log_file: String,

    /// Kill the program after this many seconds. Unset waits forever.
    pub timeout_secs: Option<u64>,

    /// Write `Mission failed (...)` instead of `Mission completed` when the
    /// program did not succeed.
    pub report_exit_status: bool,

    /// Extra environment for the program. `PYTHONIOENCODING=utf-8` is
    /// always set unless overridden here.
    pub env: BTreeMap<String, String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            program: ["poetry", "run", "python", "src/main.py"]
                .into_iter()
                .map(String::from)
                .collect(),
            tickers: ["AAPL", "MSFT", "NVDA", "TSLA"]
                .into_iter()
                .map(String::from)
                .collect(),
            log_file: "trading_log.txt".to_string(),
            timeout_secs: None,
            report_exit_status: false,
            env: BTreeMap::new(),
        }
    }
}

impl LauncherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.program.is_empty() || self.program[0].trim().is_empty() {
            return Err(anyhow!("program must be a non-empty array"));
        }
        if self.tickers.is_empty() {
            return Err(anyhow!("tickers must not be empty"));
        }
        for ticker in &self.tickers {
            if ticker.is_empty() {
                return Err(anyhow!("ticker symbols must not be empty"));
            }
            if ticker.contains(',') || ticker.chars().any(char::is_whitespace) {
                return Err(anyhow!(
                    "ticker '{ticker}' must not contain commas or whitespace"
                ));
            }
        }
        if self.log_file.trim().is_empty() {
            return Err(anyhow!("log_file must not be empty"));
        }
        if self.timeout_secs == Some(0) {
            return Err(anyhow!("timeout_secs must be > 0"));
        }
        Ok(())
    }

    /// Arguments appended after `program`: `--ticker A,B,C`.
    pub fn ticker_args(&self) -> Vec<String> {
        vec!["--ticker".to_string(), self.tickers.join(",")]
    }

    /// Environment applied to the program (defaults merged with `env`).
    pub fn child_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(PYTHON_IO_ENCODING_VAR.to_string(), "utf-8".to_string());
        env.extend(self.env.clone());
        env
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `LauncherConfig::default()`.
pub fn load_config(path: &Path) -> Result<LauncherConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        let cfg = LauncherConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LauncherConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
