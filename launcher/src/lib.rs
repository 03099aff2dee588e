//! Launcher for the external trading program.
//!
//! Runs a fixed, linear sequence: switch the console to UTF-8, enter the
//! launcher directory, append a start marker to `trading_log.txt`, run the
//! trading program through its dependency manager with its output appended
//! to the same log, then append a completion marker.
//!
//! - **[`io`]**: Side-effecting pieces (console, working directory, log file,
//!   process spawning, config). The [`io::program::ProgramRunner`] seam keeps
//!   the sequence testable without spawning real processes.
//! - **[`launch`]**: Orchestrates the sequence.
//! - **[`history`]**: Reads the log back and pairs markers into runs.

pub mod exit_codes;
pub mod history;
pub mod io;
pub mod launch;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
