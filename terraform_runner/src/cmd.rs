use std::collections::VecDeque;
use std::io;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::errors::CommandError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

fn join_lines(lines: &VecDeque<String>) -> String {
    lines
        .iter()
        .fold(String::new(), |acc, line| acc + line.as_str() + "\n")
}

fn push_bounded(lines: &mut VecDeque<String>, line: String, max_output_lines: usize) {
    lines.push_back(line);
    if lines.len() > max_output_lines {
        lines.pop_front(); // Keep only the last N lines
    }
}

/// Runs `exec` to completion, streaming and capturing the last
/// `max_output_lines` of stdout and stderr. A non-zero exit is not an error
/// here; callers inspect `exit_code`. The whole run is bounded by `timeout`
/// and the child is killed when it is exceeded.
pub async fn run_generic_command(
    exec: &mut tokio::process::Command,
    max_output_lines: usize,
    timeout: Duration,
) -> Result<CommandOutput, CommandError> {
    exec.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let program = format!("{:?}", exec.as_std());
    let mut child = exec.spawn().map_err(|source| CommandError::Spawn {
        program: program.clone(),
        source,
    })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "Failed to capture stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "Failed to capture stderr"))?;

    let mut stdout_reader = BufReader::new(stdout).lines();
    let mut stderr_reader = BufReader::new(stderr).lines();

    let mut last_stdout_lines = VecDeque::new();
    let mut last_stderr_lines = VecDeque::new();

    let collect = async {
        let mut stdout_done = false;
        let mut stderr_done = false;

        while !stdout_done || !stderr_done {
            tokio::select! {
                stdout_line = stdout_reader.next_line(), if !stdout_done => {
                    match stdout_line {
                        Ok(Some(line)) => {
                            debug!("{}", line);
                            push_bounded(&mut last_stdout_lines, line, max_output_lines);
                        },
                        Ok(None) => stdout_done = true,
                        Err(e) => {
                            warn!("Error reading stdout: {}", e);
                            stdout_done = true;
                        },
                    }
                },
                stderr_line = stderr_reader.next_line(), if !stderr_done => {
                    match stderr_line {
                        Ok(Some(line)) => push_bounded(&mut last_stderr_lines, line, max_output_lines),
                        Ok(None) => stderr_done = true,
                        Err(e) => {
                            warn!("Error reading stderr: {}", e);
                            stderr_done = true;
                        },
                    }
                },
            }
        }

        child.wait().await
    };

    let waited = tokio::time::timeout(timeout, collect).await;
    let exit_status = match waited {
        Ok(status) => status?,
        Err(_) => {
            warn!("Command {} exceeded {:?}, killing it", program, timeout);
            if let Err(e) = child.kill().await {
                warn!("Failed to kill timed out command: {}", e);
            }
            return Err(CommandError::Timeout {
                program,
                seconds: timeout.as_secs_f64(),
            });
        }
    };

    Ok(CommandOutput {
        exit_code: exit_status.code(),
        stdout: join_lines(&last_stdout_lines),
        stderr: join_lines(&last_stderr_lines),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sh(script: &str) -> tokio::process::Command {
        let mut exec = tokio::process::Command::new("sh");
        exec.arg("-c").arg(script);
        exec
    }

    #[tokio::test]
    async fn test_captures_stdout_stderr_and_exit_code() {
        let output = run_generic_command(
            &mut sh("echo planned; echo 'auth error' >&2; exit 3"),
            100,
            Duration::from_secs(10),
        )
        .await
        .unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout, "planned\n");
        assert_eq!(output.stderr, "auth error\n");
    }

    #[tokio::test]
    async fn test_keeps_only_last_lines() {
        let output = run_generic_command(
            &mut sh("for i in 1 2 3 4 5; do echo line$i; done"),
            2,
            Duration::from_secs(10),
        )
        .await
        .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout, "line4\nline5\n");
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let result =
            run_generic_command(&mut sh("exec sleep 5"), 100, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(CommandError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let mut exec = tokio::process::Command::new("definitely-not-a-terraform-binary");
        let result = run_generic_command(&mut exec, 100, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(CommandError::Spawn { .. })));
    }
}
