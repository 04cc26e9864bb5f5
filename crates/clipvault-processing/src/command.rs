//! External tool invocation.

use std::ffi::{OsStr, OsString};
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;

/// Max bytes of stderr kept in error messages.
const STDERR_TAIL_BYTES: usize = 2048;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {}s", timeout.as_secs_f64())]
    TimedOut { program: String, timeout: Duration },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error while waiting for {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// A single external tool invocation with a hard deadline.
///
/// stdin is closed, stdout and stderr are captured. The child is spawned with
/// `kill_on_drop`, so timing out or dropping the future (client disconnect)
/// terminates it.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    #[tracing::instrument(
        skip(self),
        fields(
            process.executable.name = %self.program,
            process.timeout_secs = self.timeout.as_secs()
        )
    )]
    pub async fn run(&self) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| ToolError::Io {
                program: self.program.clone(),
                source,
            })?,
            Err(_) => {
                tracing::warn!(
                    program = %self.program,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "External tool timed out and was killed"
                );
                return Err(ToolError::TimedOut {
                    program: self.program.clone(),
                    timeout: self.timeout,
                });
            }
        };

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        if !output.status.success() {
            let stderr = stderr_tail(&output.stderr);
            tracing::warn!(
                program = %self.program,
                status = %output.status,
                stderr = %stderr,
                duration_ms = duration_ms,
                "External tool failed"
            );
            return Err(ToolError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        tracing::debug!(
            program = %self.program,
            stdout_bytes = output.stdout.len(),
            duration_ms = duration_ms,
            "External tool finished"
        );

        Ok(ToolOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_TAIL_BYTES {
        return trimmed.to_string();
    }
    let mut cut = trimmed.len() - STDERR_TAIL_BYTES;
    while !trimmed.is_char_boundary(cut) {
        cut += 1;
    }
    format!("...{}", &trimmed[cut..])
}
