// menusync-aio/src/process.rs
use std::process::{Command, Output as StdOutput, Stdio};
use std::sync::Arc;

use menusync_common::error::{MenuError, Result};
use tracing::{debug, error};

/// Runs an external command and captures its output.
pub fn run_command(command: &str, args: &[String]) -> Result<StdOutput> {
    debug!("Running command: {} {:?}", command, args);
    let mut cmd = Command::new(command);
    cmd.args(args);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.stdin(Stdio::null()); // Prevent hanging on stdin

    match cmd.output() {
        Ok(output) => {
            if !output.status.success() {
                debug!("Command failed with status: {}", output.status);
                let stderr = String::from_utf8_lossy(&output.stderr);
                if !stderr.trim().is_empty() {
                    debug!("Stderr:\n{}", stderr.trim());
                }
            } else {
                debug!("Command finished successfully.");
            }
            Ok(output) // Return the full output regardless of status
        }
        Err(e) => {
            error!("Failed to execute command {}: {}", command, e);
            Err(MenuError::Io(Arc::new(e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_status() {
        let out = run_command("sh", &["-c".into(), "echo hi; exit 3".into()]).unwrap();
        assert_eq!(String::from_utf8_lossy(&out.stdout), "hi\n");
        assert_eq!(out.status.code(), Some(3));
    }

    #[test]
    fn missing_binary_is_io_error() {
        let err = run_command("/nonexistent/menusync-test-binary", &[]).unwrap_err();
        assert!(matches!(err, MenuError::Io(_)));
    }
}
