//! Helpers for running a child process with its output redirected into a file.
//!
//! Spawning and waiting are separate steps so callers can tell "the program
//! never started" apart from failures while it was running.

use std::fs::File;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use command_group::{CommandGroup, GroupChild};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// How a redirected child finished.
#[derive(Debug)]
pub struct RedirectOutcome {
    pub status: ExitStatus,
    pub timed_out: bool,
}

/// A spawned child whose stdout/stderr point at a file.
pub struct RedirectedChild {
    child: Spawned,
}

enum Spawned {
    /// Shares the launcher's process group so a terminal Ctrl+C still reaches it.
    Direct(Child),
    /// Own process group (Job Object on Windows) so the whole tree dies on timeout.
    Group(GroupChild, Duration),
}

/// Spawn `cmd` with stdout and stderr going to the given handles. Stdin is null.
///
/// Both handles should refer to the same append-mode file so interleaving
/// follows the order in which the child writes. With `timeout` set the child
/// leads its own process group, letting [`RedirectedChild::wait`] kill every
/// descendant, not just the direct child.
///
/// The error is the raw spawn error: the program did not start.
pub fn spawn_redirected(
    mut cmd: Command,
    stdout: File,
    stderr: File,
    timeout: Option<Duration>,
) -> std::io::Result<RedirectedChild> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr));

    debug!(grouped = timeout.is_some(), "spawning child process");
    let child = match timeout {
        None => Spawned::Direct(cmd.spawn()?),
        Some(limit) => Spawned::Group(cmd.group_spawn()?, limit),
    };
    Ok(RedirectedChild { child })
}

impl RedirectedChild {
    /// Block until the child exits, or kill its process group once the timeout elapses.
    #[instrument(skip_all)]
    pub fn wait(self) -> Result<RedirectOutcome> {
        let (status, timed_out) = match self.child {
            Spawned::Direct(mut child) => (child.wait().context("wait for command")?, false),
            Spawned::Group(mut group, limit) => {
                match group
                    .inner()
                    .wait_timeout(limit)
                    .context("wait for command")?
                {
                    Some(status) => (status, false),
                    None => {
                        warn!(timeout_secs = limit.as_secs(), "command timed out, killing group");
                        group.kill().context("kill process group")?;
                        (
                            group
                                .inner()
                                .wait()
                                .context("wait command after kill")?,
                            true,
                        )
                    }
                }
            }
        };

        debug!(exit_code = ?status.code(), timed_out, "command finished");
        Ok(RedirectOutcome { status, timed_out })
    }
}
