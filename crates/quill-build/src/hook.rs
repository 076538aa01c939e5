//! Pre-build hook.

use std::process::Command;

use crate::error::BuildError;

#[cfg(target_os = "windows")]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}

#[cfg(not(target_os = "windows"))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}

/// Run `command` through the platform shell and log its output.
///
/// # Errors
///
/// Returns [`BuildError::HookSpawn`] if the shell cannot be started and
/// [`BuildError::HookFailed`] on a non-zero exit.
pub fn run_hook(command: &str) -> Result<(), BuildError> {
    tracing::info!(command, "Running pre-build hook");
    let output = shell(command)
        .output()
        .map_err(|source| BuildError::HookSpawn {
            command: command.to_owned(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        tracing::info!(command, output = %stdout.trim_end(), "Hook output");
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        tracing::warn!(command, output = %stderr.trim_end(), "Hook error output");
    }

    if !output.status.success() {
        return Err(BuildError::HookFailed {
            command: command.to_owned(),
            status: output.status,
        });
    }
    Ok(())
}
