//! Error types for the twl launcher.
//!
//! This module defines the `TwlError` enum covering every failure the launcher
//! can run into. Low-level modules return `TwlError` directly so callers can
//! match on the variant (e.g. falling back to the cache on [`TwlError::Http`]),
//! while orchestration code wraps them with `anyhow` context naming the phase
//! that failed.

use std::path::PathBuf;
use thiserror::Error;

/// Consolidated error type for twl operations.
#[derive(Debug, Error)]
pub enum TwlError {
    /// The running OS/architecture pair has no upstream release artifact.
    #[error("OS '{os}' and arch '{arch}' is not supported")]
    UnsupportedPlatform {
        /// Operating system name as reported by the runtime.
        os: String,
        /// CPU architecture name as reported by the runtime.
        arch: String,
    },

    /// `-version` was passed as the last argument without a value.
    #[error("version flag passed but missing argument")]
    MissingVersionArg,

    /// The release endpoint could not be reached or answered with a
    /// non-success status. Callers treat this as "offline".
    #[error("failed to get the resource")]
    Http,

    /// The release endpoint answered, but the body was not usable.
    #[error("invalid release metadata: {message}")]
    ReleaseMetadata {
        /// Description of what was wrong with the body.
        message: String,
    },

    /// No cached tailwindcss binary exists.
    #[error("tailwindcss is not currently installed")]
    NotInstalled,

    /// The latest version could not be fetched and nothing is cached.
    #[error("failed to check for latest version of tailwindcss and no version is installed")]
    NoVersionAvailable,

    /// The per-user cache directory could not be determined or created.
    #[error("cache directory unavailable: {message}")]
    CacheDirectory {
        /// Description of the failure.
        message: String,
        /// The underlying I/O error, if any.
        #[source]
        source: Option<std::io::Error>,
    },

    /// Error reading or writing files.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A destination path escapes the cache directory.
    #[error("invalid path: {path} is outside cache directory {dir}")]
    InvalidPath {
        /// The rejected path.
        path: PathBuf,
        /// The cache directory it had to stay inside.
        dir: PathBuf,
    },

    /// The number of bytes written does not match `Content-Length`.
    #[error("incomplete download: expected {expected} bytes, got {actual} bytes")]
    IncompleteDownload {
        /// Bytes announced by the server.
        expected: u64,
        /// Bytes actually written.
        actual: u64,
    },

    /// A download request answered with a non-success status.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus {
        /// The HTTP status code.
        status: u16,
        /// The requested URL.
        url: String,
    },

    /// The request failed before a response was received.
    #[error("request to {url} failed")]
    Request {
        /// The requested URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The invocation budget ran out or the user interrupted.
    #[error("operation cancelled")]
    Cancelled,

    /// Every download attempt failed.
    #[error("failed to download after {attempts} attempts")]
    DownloadFailed {
        /// How many attempts were made.
        attempts: u32,
        /// The error of the last attempt.
        #[source]
        source: Box<TwlError>,
    },

    /// The tailwindcss process could not be started or awaited.
    #[error("failed to run {program}")]
    ProcessInvocation {
        /// The program that was run.
        program: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The tailwindcss process exited with a non-zero code.
    ///
    /// The exit code is propagated to the parent process without printing
    /// an additional error message.
    #[error("process exited with code {code}")]
    ProcessExitCode {
        /// The exit code from the subprocess.
        code: i32,
    },
}

impl TwlError {
    /// Creates a new `Io` error with context.
    #[must_use]
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new `ReleaseMetadata` error.
    #[must_use]
    pub fn release_metadata(message: impl Into<String>) -> Self {
        Self::ReleaseMetadata {
            message: message.into(),
        }
    }

    /// Creates a new `CacheDirectory` error without an underlying cause.
    #[must_use]
    pub fn cache_directory(message: impl Into<String>) -> Self {
        Self::CacheDirectory {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `InvalidPath` error.
    #[must_use]
    pub fn invalid_path(path: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            dir: dir.into(),
        }
    }

    /// Creates a new `ProcessExitCode` error.
    #[must_use]
    pub const fn process_exit_code(code: i32) -> Self {
        Self::ProcessExitCode { code }
    }

    /// Returns true when the error means the release endpoint was unreachable.
    #[must_use]
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http)
    }
}
