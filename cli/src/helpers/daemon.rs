use std::{fs, path::PathBuf};

use anyhow::{Context, Result};

/// Name of the PID lock file written by `start -d` and read by `stop`.
const LOCK_FILE: &str = "mp.lock";

/// Re-executes the current binary detached, in `start` mode, and records its PID
/// to [`LOCK_FILE`] next to the running executable.
pub fn spawn_detached(extra_args: &[&str]) -> Result<u32> {
    let exe = std::env::current_exe().context("failed to resolve the current executable path")?;

    let mut command = std::process::Command::new(&exe);
    command.arg("start").args(extra_args);
    let child = command.spawn().with_context(|| format!("failed to re-exec {}", exe.display()))?;

    let pid = child.id();
    fs::write(lock_file_path(), pid.to_string()).context("failed to write PID lock file")?;
    Ok(pid)
}

/// Sends `SIGTERM` to the PID recorded in [`LOCK_FILE`].
#[cfg(target_family = "unix")]
pub fn stop_daemon() -> Result<u32> {
    use nix::{
        sys::signal::{kill, Signal},
        unistd::Pid,
    };

    let raw = fs::read_to_string(lock_file_path()).context("no running daemon found (missing mp.lock)")?;
    let pid: i32 = raw.trim().parse().context("mp.lock does not contain a valid PID")?;
    kill(Pid::from_raw(pid), Signal::SIGTERM).with_context(|| format!("failed to signal PID {pid}"))?;
    Ok(pid as u32)
}

#[cfg(not(target_family = "unix"))]
pub fn stop_daemon() -> Result<u32> {
    anyhow::bail!("daemon mode is only supported on unix platforms")
}

fn lock_file_path() -> PathBuf {
    PathBuf::from(LOCK_FILE)
}
