//! Shell command execution with security controls for the local transport

use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use sls_core::remote::{RemoteError, RemoteHost};

/// Executes shell commands with a sanitized environment and a hard timeout
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    default_timeout: Duration,
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            default_timeout: timeout,
        }
    }

    /// Run a command through `sh -c` and capture its output
    pub fn execute(&self, command: &str) -> Result<CommandOutput, RemoteError> {
        let start = Instant::now();

        // Build command with sanitized environment
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .env_clear()
            .env("PATH", "/usr/local/bin:/usr/bin:/bin:/usr/sbin:/sbin")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| RemoteError::Transport {
            reason: format!("failed to spawn shell: {}", e),
        })?;

        let status = wait_timeout::ChildExt::wait_timeout(&mut child, self.default_timeout)
            .map_err(|e| RemoteError::Transport {
                reason: format!("failed while waiting for command: {}", e),
            })?;

        match status {
            Some(status) => {
                let output = child
                    .wait_with_output()
                    .map_err(|e| RemoteError::Transport {
                        reason: format!("failed to collect command output: {}", e),
                    })?;

                Ok(CommandOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                    exit_code: status.code().unwrap_or(-1),
                    duration: start.elapsed(),
                })
            }
            None => {
                // Timeout - kill process
                let _ = child.kill();
                Err(RemoteError::Transport {
                    reason: format!(
                        "command timed out after {} ms",
                        self.default_timeout.as_millis()
                    ),
                })
            }
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Command execution output
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

/// The machine the leader itself runs on, seen as a managed host
#[derive(Debug, Clone)]
pub struct LocalHost {
    executor: CommandExecutor,
}

impl LocalHost {
    pub fn new(command_timeout: Duration) -> Self {
        Self {
            executor: CommandExecutor::with_timeout(command_timeout),
        }
    }
}

impl RemoteHost for LocalHost {
    fn run_fact(&self, command: &str) -> Result<String, RemoteError> {
        let output = self.executor.execute(command)?;
        if output.exit_code != 0 {
            return Err(RemoteError::CommandFailed {
                code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }

    fn run_operation(&self, command: &str) -> Result<(), RemoteError> {
        let output = self.executor.execute(command)?;
        if output.exit_code != 0 {
            return Err(RemoteError::CommandFailed {
                code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_captures_stdout_and_exit_code() {
        let executor = CommandExecutor::new();
        let output = executor.execute("printf 'hello'").unwrap();
        assert_eq!(output.stdout, "hello");
        assert_eq!(output.exit_code, 0);
    }

    #[test]
    fn test_nonzero_exit_surfaces_through_the_host_seam() {
        let host = LocalHost::new(Duration::from_secs(5));
        assert_matches!(
            host.run_fact("exit 3"),
            Err(RemoteError::CommandFailed { code: 3, .. })
        );
    }

    #[test]
    fn test_environment_is_sanitized() {
        std::env::set_var("SLS_EXECUTOR_CANARY", "visible");
        let executor = CommandExecutor::new();
        let output = executor
            .execute("printf '%s' \"${SLS_EXECUTOR_CANARY:-clean}\"")
            .unwrap();
        assert_eq!(output.stdout, "clean");
    }

    #[test]
    fn test_timeout_kills_the_command() {
        let executor = CommandExecutor::with_timeout(Duration::from_millis(100));
        assert_matches!(
            executor.execute("sleep 5"),
            Err(RemoteError::Transport { .. })
        );
    }
}
