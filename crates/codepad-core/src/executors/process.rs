// src/executors/process.rs
//! Runs one interpreter process to completion or until its deadline.

use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::errors::ExecutionError;

/// Captured output of a process that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Spawns `program` with `args`, stdin closed and both output streams
    /// captured.
    ///
    /// A zero exit resolves with whatever was written, including any stderr.
    /// A non-zero exit fails with `NonZeroExit`. If the process is still
    /// running after `timeout` it is killed and reaped before `Timeout` is
    /// returned, so no child outlives the call.
    pub async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<ProcessOutput, ExecutionError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutionError::SpawnFailure {
                program: program.to_string(),
                source,
            })?;
        log::debug!("Spawned '{}' (pid {:?})", program, child.id());

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let waited = tokio::time::timeout(timeout, async {
            tokio::join!(child.wait(), drain(stdout), drain(stderr))
        })
        .await;

        let (status, stdout, stderr) = match waited {
            Ok(outcome) => outcome,
            Err(_) => {
                log::warn!(
                    "'{}' exceeded {} ms, killing pid {:?}",
                    program,
                    timeout.as_millis(),
                    child.id()
                );
                if let Err(e) = child.kill().await {
                    log::warn!("Failed to kill timed out process: {}", e);
                }
                return Err(ExecutionError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
        };

        let status = status.map_err(|source| ExecutionError::SpawnFailure {
            program: program.to_string(),
            source,
        })?;
        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        log::debug!("'{}' exited with {}", program, status);

        if status.success() {
            Ok(ProcessOutput { stdout, stderr })
        } else {
            Err(ExecutionError::NonZeroExit {
                code: status.code(),
                stderr,
            })
        }
    }
}

async fn drain<R: AsyncRead + Unpin>(stream: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        if let Err(e) = stream.read_to_end(&mut buf).await {
            log::debug!("Error reading child output: {}", e);
        }
    }
    buf
}
