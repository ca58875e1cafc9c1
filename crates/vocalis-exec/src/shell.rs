//! Shell executor — run system commands with configurable working directory
//! and timeout.
//!
//! Wraps `tokio::process::Command` to provide async command execution.  The
//! action string is the shell command line itself; parameters may override
//! the working directory and timeout.  Stdout and stderr are each truncated
//! to [`MAX_OUTPUT_BYTES`] (100 KB) to prevent memory exhaustion from
//! runaway commands.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{ExecError, Result};
use crate::traits::{Executor, ExecutorKind};

/// Default command timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum output size in bytes (100 KB).  Stdout and stderr are each
/// independently truncated to this limit.
const MAX_OUTPUT_BYTES: usize = 100 * 1024;

/// Command executor backed by the system shell.
pub struct ShellExecutor {
    /// Unique identifier for this executor instance.
    id: String,
    /// Default working directory for commands.
    working_dir: std::path::PathBuf,
    /// Default timeout for command execution in seconds.
    default_timeout_secs: u64,
}

impl ShellExecutor {
    /// Create a new shell executor with a default working directory.
    pub fn new(id: impl Into<String>, working_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            id: id.into(),
            working_dir: working_dir.into(),
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the default timeout for command execution.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.default_timeout_secs = timeout_secs;
        self
    }

    /// Run a command line and return structured output.
    async fn run_command(&self, command: &str, params: &Value) -> Result<Value> {
        let working_dir = params
            .get("working_dir")
            .and_then(|v| v.as_str())
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|| self.working_dir.clone());

        let timeout_secs = params
            .get("timeout_secs")
            .and_then(|v| v.as_u64())
            .unwrap_or(self.default_timeout_secs);

        debug!(
            command = command,
            working_dir = %working_dir.display(),
            timeout_secs = timeout_secs,
            "executing shell command"
        );

        let child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&working_dir)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecError::ExecutionFailed {
                action: command.to_string(),
                reason: format!("failed to spawn process: {e}"),
            })?;

        // Wait with timeout.  `wait_with_output` takes ownership, so on
        // timeout the child is dropped and killed via `kill_on_drop(true)`.
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(timeout_secs),
            child.wait_with_output(),
        )
        .await;

        match result {
            Ok(Ok(output)) => {
                let exit_code = output.status.code().unwrap_or(-1);
                let (stdout, stdout_truncated) = truncate_output(&output.stdout);
                let (stderr, stderr_truncated) = truncate_output(&output.stderr);

                debug!(exit_code = exit_code, "command completed");

                Ok(json!({
                    "command": command,
                    "exit_code": exit_code,
                    "stdout": stdout,
                    "stderr": stderr,
                    "stdout_truncated": stdout_truncated,
                    "stderr_truncated": stderr_truncated,
                    "success": exit_code == 0,
                }))
            }
            Ok(Err(e)) => Err(ExecError::ExecutionFailed {
                action: command.to_string(),
                reason: format!("process error: {e}"),
            }),
            Err(_) => {
                // Timeout -- child is killed on drop via kill_on_drop(true).
                warn!(
                    command = command,
                    timeout_secs = timeout_secs,
                    "command timed out"
                );
                Err(ExecError::Timeout {
                    seconds: timeout_secs,
                    reason: format!("shell command `{command}` exceeded time limit"),
                })
            }
        }
    }
}

/// Truncate raw command output to [`MAX_OUTPUT_BYTES`], converting to a
/// lossy UTF-8 string.  Returns `(output_string, was_truncated)`.
fn truncate_output(raw: &[u8]) -> (String, bool) {
    if raw.len() <= MAX_OUTPUT_BYTES {
        (String::from_utf8_lossy(raw).into_owned(), false)
    } else {
        let truncated = &raw[..MAX_OUTPUT_BYTES];
        let mut s = String::from_utf8_lossy(truncated).into_owned();
        s.push_str("\n... [output truncated at 100 KB]");
        (s, true)
    }
}

#[async_trait]
impl Executor for ShellExecutor {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> ExecutorKind {
        ExecutorKind::Command
    }

    async fn execute(&self, action: &str, params: Value) -> Result<Value> {
        if action.trim().is_empty() {
            return Err(ExecError::InvalidParams {
                action: action.to_string(),
                reason: "empty command line".into(),
            });
        }
        self.run_command(action, &params).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_echo_captures_stdout() {
        let exec = ShellExecutor::new("shell-test", "/tmp");
        let out = exec.execute("echo hello", json!({})).await.unwrap();
        assert_eq!(out["exit_code"], 0);
        assert_eq!(out["stdout"].as_str().unwrap().trim(), "hello");
        assert_eq!(out["success"], true);
    }

    #[tokio::test]
    async fn failing_command_reports_nonzero_exit() {
        let exec = ShellExecutor::new("shell-test", "/tmp");
        let out = exec.execute("false", json!({})).await.unwrap();
        assert_ne!(out["exit_code"], 0);
        assert_eq!(out["success"], false);
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let exec = ShellExecutor::new("shell-test", "/tmp");
        let result = exec.execute("   ", json!({})).await;
        assert!(matches!(result, Err(ExecError::InvalidParams { .. })));
    }

    #[tokio::test]
    async fn timeout_kills_long_running_command() {
        let exec = ShellExecutor::new("shell-test", "/tmp");
        let result = exec
            .execute("sleep 5", json!({"timeout_secs": 1}))
            .await;
        assert!(matches!(result, Err(ExecError::Timeout { .. })));
    }

    #[test]
    fn truncate_output_short_input_not_truncated() {
        let data = b"hello world";
        let (s, truncated) = truncate_output(data);
        assert_eq!(s, "hello world");
        assert!(!truncated);
    }

    #[test]
    fn truncate_output_large_input_is_truncated() {
        let data = vec![b'x'; MAX_OUTPUT_BYTES + 1000];
        let (s, truncated) = truncate_output(&data);
        assert!(truncated);
        assert!(s.contains("[output truncated at 100 KB]"));
    }
}
