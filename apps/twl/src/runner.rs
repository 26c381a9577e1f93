//! Process invocation for the cached tailwindcss binary.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::TwlError;

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
}

impl ProcessOutput {
    /// Returns whether the process exited with code 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs a program to completion and captures its output.
pub trait ProcessRunner {
    /// Runs `program` with `args`, killing it if `cancel` fires.
    ///
    /// A non-zero exit is not an error at this level.
    fn run(
        &self,
        program: &Path,
        args: &[String],
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<ProcessOutput, TwlError>> + Send;
}

/// [`ProcessRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRunner;

impl ProcessRunner for TokioRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, TwlError> {
        debug!(path = %program.display(), ?args, "Running command");

        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            () = cancel.cancelled() => return Err(TwlError::Cancelled),
            output = child => output.map_err(|source| TwlError::ProcessInvocation {
                program: program.to_path_buf(),
                source,
            })?,
        };

        let output = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        };
        debug!(out = %output.stdout, err = %output.stderr, code = ?output.code, "Command");
        Ok(output)
    }
}
