//! I/O helpers for the launch sequence.

pub mod config;
pub mod console;
pub mod process;
pub mod program;
pub mod trading_log;
pub mod workdir;
