//! Fire-and-forget execution of shell commands with elevated privilege.
//!
//! Success here only ever means that a privileged shell was launched. Whether
//! the command it runs succeeds is never observed.

use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Proof that an elevated shell was started for a command.
///
/// Carries no information about the command's own outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a launch can be rejected; inspect or log the result"]
pub struct Launched;

#[derive(Debug, Error)]
pub enum ElevationError {
    #[error("failed to spawn elevation helper: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("elevation request was refused (exit status {code:?})")]
    Rejected { code: Option<i32> },
}

/// Build the helper invocation that requests elevation and detaches `command_line`.
///
/// The helper returns once the privileged shell has been created (or refused);
/// the command itself keeps running in the background.
#[cfg(windows)]
pub(crate) fn elevation_command(command_line: &str) -> Command {
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    let escaped = command_line.replace('\'', "''");
    let script = format!(
        "Start-Process -FilePath powershell.exe -Verb RunAs -WindowStyle Hidden \
         -ArgumentList '-NoProfile','-WindowStyle','Hidden','-Command','{escaped}'"
    );
    let mut cmd = Command::new("powershell.exe");
    cmd.args(["-NoProfile", "-NonInteractive", "-Command", script.as_str()])
        .creation_flags(CREATE_NO_WINDOW);
    cmd
}

#[cfg(not(windows))]
pub(crate) fn elevation_command(command_line: &str) -> Command {
    let detached = format!("nohup {command_line} >/dev/null 2>&1 &");
    let mut cmd = Command::new("sudo");
    cmd.args(["-n", "sh", "-c", detached.as_str()]);
    cmd
}

/// Ask the platform to run `command_line` elevated and hidden, without waiting for it.
pub async fn launch_elevated(command_line: &str) -> Result<Launched, ElevationError> {
    let status = elevation_command(command_line)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;

    if status.success() {
        debug!(command_line, "elevated shell launched");
        Ok(Launched)
    } else {
        warn!(command_line, code = ?status.code(), "elevation refused");
        Err(ElevationError::Rejected {
            code: status.code(),
        })
    }
}
