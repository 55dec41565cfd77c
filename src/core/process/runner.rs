// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process execution and lifecycle management.
//!
//! ```text
//! run()
//!   |
//!   v
//! build_command()  args, cwd, env, stdio
//!   |
//!   v
//! spawn() --> readers for piped streams
//!   |
//!   v
//! select! { child.wait(), KillTimer deadline --> fire() }   (loop)
//!   |
//!   v
//! timer.cancel(), join readers
//!   |
//!   v
//! exit 0            --> ProcessOutput
//! killed + TERM/KILL --> ProcessError::Timeout
//! otherwise         --> ProcessError::NonZeroExit
//! ```

use std::fmt::Write as _;
use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, error, trace};

use super::builder::{ProcessBuilder, ProcessOutput, StreamFlags};
use super::timer::KillTimer;
use super::{io as stream_io, signal};
use crate::error::{ProcessError, WatchResult};

impl ProcessBuilder {
    /// Returns the display name for this process.
    fn display_name(&self) -> String {
        self.name_override().map_or_else(
            || {
                self.program().file_stem().map_or_else(
                    || "process".to_string(),
                    |s| s.to_string_lossy().into_owned(),
                )
            },
            String::from,
        )
    }

    /// Returns the full command line as a string (for logging).
    fn command_line(&self) -> String {
        let mut cmd = format!("{}", self.program().display());
        for arg in self.args_slice() {
            if arg.contains(' ') {
                let _ = write!(cmd, " \"{arg}\"");
            } else {
                let _ = write!(cmd, " {arg}");
            }
        }
        cmd
    }

    /// Spawns the process and waits for it, enforcing the timeout.
    ///
    /// # Errors
    ///
    /// - `ProcessError::ExecutableNotFound` / `SpawnFailed` if spawning fails.
    /// - `ProcessError::Timeout` if the runner had to terminate the process.
    /// - `ProcessError::NonZeroExit` for any other unsuccessful exit.
    /// - `ProcessError::WaitFailed` if waiting on the child fails.
    pub async fn run(self) -> WatchResult<ProcessOutput> {
        let name = self.display_name();
        let cmd_line = self.command_line();

        if let Some(cwd) = self.working_dir() {
            debug!(cwd = %cwd.display(), "cd");
        }
        debug!(cmd = %cmd_line, "exec");

        let mut child = self.build_command().spawn().map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ProcessError::ExecutableNotFound {
                    name: self.program().display().to_string(),
                }
            } else {
                ProcessError::SpawnFailed {
                    command: cmd_line.clone(),
                    source,
                }
            }
        })?;
        trace!(process = %name, pid = ?child.id(), "spawned");

        let stdout = stream_io::spawn_reader(
            child.stdout.take(),
            self.stdout_config(),
            &name,
            "stdout",
        );
        let stderr = stream_io::spawn_reader(
            child.stderr.take(),
            self.stderr_config(),
            &name,
            "stderr",
        );

        let mut timer = KillTimer::start(self.timeout_duration());
        let waited = supervise(&name, &mut child, &mut timer).await;
        timer.cancel();

        let status = waited.map_err(|source| ProcessError::WaitFailed {
            command: cmd_line.clone(),
            source,
        })?;

        let output = ProcessOutput::new(
            status.code(),
            signal::exit_signal(&status),
            stream_io::join_reader(stdout).await,
            stream_io::join_reader(stderr).await,
        );

        if output.success() {
            trace!(process = %name, "completed");
            return Ok(output);
        }

        if !output.stderr().is_empty() {
            error!(process = %name, stderr = %output.stderr(), "process error output");
        }
        Err(self.classify(cmd_line, &timer, &output).into())
    }

    fn classify(&self, command: String, timer: &KillTimer, output: &ProcessOutput) -> ProcessError {
        if timer.killed() && signal::is_kill_signal(output.signal()) {
            let timeout = self.timeout_duration().unwrap_or_default();
            return ProcessError::Timeout {
                command,
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                signal: output.signal(),
            };
        }
        ProcessError::NonZeroExit {
            command,
            code: output.code(),
            signal: output.signal(),
        }
    }

    /// Builds the tokio Command from this builder's configuration.
    fn build_command(&self) -> Command {
        let mut command = Command::new(self.program());
        command.args(self.args_slice());

        if let Some(cwd) = self.working_dir() {
            command.current_dir(cwd);
        }
        command.envs(self.env_vars());

        command.stdin(Stdio::null());
        command.stdout(stdio_from_flags(self.stdout_config()));
        command.stderr(stdio_from_flags(self.stderr_config()));
        command.kill_on_drop(true);

        command
    }
}

/// Waits for the child while escalating through the kill timer's deadlines.
async fn supervise(name: &str, child: &mut Child, timer: &mut KillTimer) -> io::Result<ExitStatus> {
    loop {
        tokio::select! {
            status = child.wait() => return status,
            () = expire(timer.deadline()) => timer.fire(child, name),
        }
    }
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn stdio_from_flags(flags: StreamFlags) -> Stdio {
    if flags.contains(StreamFlags::INHERIT) {
        Stdio::inherit()
    } else if flags.contains(StreamFlags::BIT_BUCKET) {
        Stdio::null()
    } else {
        Stdio::piped()
    }
}
