//! Stable exit codes for the launcher binary.
//!
//! When the trading program exits with a code of its own, the launcher
//! passes that code through unchanged. The constants below cover the cases
//! where no program code exists.

/// Program exited successfully.
pub const OK: i32 = 0;
/// Launcher failed before or while writing the log (bad config, directory, log file).
pub const INVALID: i32 = 1;
/// Program was stopped after the configured timeout.
pub const TIMED_OUT: i32 = 124;
/// Program could not be spawned (dependency manager missing, bad path, ...).
pub const UNAVAILABLE: i32 = 127;
/// Program was terminated by a signal and reported no exit code.
pub const KILLED: i32 = 128;
