// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Platform-specific termination.
//!
//! ```text
//! terminate(child)      unix: kill(pid, SIGTERM)   other: start_kill()
//! exit_signal(status)   unix: ExitStatusExt::signal()  other: None
//! is_kill_signal(sig)   SIGTERM | SIGKILL
//! ```

use std::io;
use std::process::ExitStatus;
use tokio::process::Child;

/// Asks the child to exit.
#[cfg(unix)]
pub(super) fn terminate(child: &mut Child) -> io::Result<()> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    // already reaped
    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pid = i32::try_from(pid).map_err(io::Error::other)?;
    kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(io::Error::from)
}

#[cfg(not(unix))]
pub(super) fn terminate(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}

#[cfg(unix)]
pub(super) fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
pub(super) const fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// True for the signals the kill timer sends. Without signal information
/// any runner-initiated exit counts.
#[cfg(unix)]
pub(super) fn is_kill_signal(signal: Option<i32>) -> bool {
    use nix::sys::signal::Signal;
    matches!(signal, Some(s) if s == Signal::SIGTERM as i32 || s == Signal::SIGKILL as i32)
}

#[cfg(not(unix))]
pub(super) const fn is_kill_signal(_signal: Option<i32>) -> bool {
    true
}
