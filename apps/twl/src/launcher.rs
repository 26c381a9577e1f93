//! The launch sequence.
//!
//! ```text
//! resolve version -> check cache -> [download -> chmod -> evict] -> run
//! ```
//!
//! Each phase runs once. The first failure ends the sequence with context
//! naming the phase. The one recoverable failure is an unreachable release
//! endpoint while resolving `latest`: the newest cached version is used
//! instead.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::args::LaunchArgs;
use crate::cache::{self, CacheStore};
use crate::client::Client;
use crate::download::Downloader;
use crate::errors::TwlError;
use crate::platform::Platform;
use crate::resolver::{self, RequestedVersion};
use crate::retry::RetryPolicy;
use crate::runner::{ProcessOutput, ProcessRunner};

/// Everything one invocation needs, wired together.
pub struct Launcher<R> {
    platform: Platform,
    cache: CacheStore,
    client: Client,
    downloader: Downloader,
    runner: R,
    cancel: CancellationToken,
}

impl<R: ProcessRunner> Launcher<R> {
    #[must_use]
    pub fn new(
        platform: Platform,
        cache: CacheStore,
        client: Client,
        runner: R,
        cancel: CancellationToken,
    ) -> Self {
        let downloader = Downloader::new(client.clone());
        Self {
            platform,
            cache,
            client,
            downloader,
            runner,
            cancel,
        }
    }

    /// Replaces the download retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.downloader = self.downloader.with_retry_policy(policy);
        self
    }

    /// Turns the requested version into a concrete tag.
    ///
    /// # Errors
    ///
    /// - [`TwlError::NoVersionAvailable`] if `latest` cannot be fetched and
    ///   nothing is cached
    /// - any non-HTTP resolution error, with context
    pub async fn resolve_version(&self, requested: &RequestedVersion) -> Result<String> {
        let RequestedVersion::Tag(tag) = requested else {
            return self.resolve_latest().await;
        };
        Ok(tag.clone())
    }

    async fn resolve_latest(&self) -> Result<String> {
        match resolver::resolve_latest(&self.client, &self.cancel).await {
            Ok(version) => {
                debug!(version, "Retrieved latest version");
                Ok(version)
            }
            Err(e) if e.is_http() => {
                let current = self.cache.current_version().map_err(|e| {
                    debug!(error = %e, "No cached version to fall back to");
                    TwlError::NoVersionAvailable
                })?;
                println!(
                    "failed to fetch latest tailwindcss version: falling back to installed version {current}"
                );
                Ok(current)
            }
            Err(e) => Err(e).context("failed to determine latest version"),
        }
    }

    /// Makes sure `version` is in the cache and returns its path.
    ///
    /// On a miss the binary is downloaded, marked executable, and every other
    /// cached version is evicted.
    ///
    /// # Errors
    ///
    /// Returns an error naming whichever step failed.
    pub async fn ensure_installed(&self, version: &str) -> Result<PathBuf> {
        let path = self
            .cache
            .entry_path(&self.platform, version)
            .with_context(|| format!("invalid tailwindcss version '{version}'"))?;

        let installed = cache::exists(&path)
            .context("failed to check if tailwindcss is already installed")?;
        if installed {
            debug!(path = %path.display(), "Using cached binary");
            return Ok(path);
        }

        println!("Downloading tailwindcss {version}");
        self.downloader
            .download(&self.platform, version, &path, self.cache.dir(), &self.cancel)
            .await
            .context("failed to download tailwindcss")?;
        cache::make_executable(&path).context("failed to make tailwindcss executable")?;
        self.cache
            .evict_except(version)
            .context("failed to delete older versions")?;

        Ok(path)
    }

    /// Runs the full sequence and returns the captured tailwindcss output.
    ///
    /// # Errors
    ///
    /// Returns the first failing phase's error. A non-zero exit of
    /// tailwindcss is not an error here; see [`relay`].
    pub async fn launch(&self, args: &LaunchArgs) -> Result<ProcessOutput> {
        let version = self.resolve_version(&args.version).await?;
        let path = self.ensure_installed(&version).await?;

        self.runner
            .run(&path, &args.passthrough, &self.cancel)
            .await
            .context("failed to run tailwindcss")
    }
}

/// Writes the tailwindcss output to the launcher's own streams.
///
/// On success, stdout is shown when it is non-empty and arguments were
/// forwarded; otherwise stderr is shown (tailwindcss reports progress there).
/// On failure, stderr goes to `err`.
///
/// # Errors
///
/// Returns [`TwlError::ProcessExitCode`] carrying the child's exit code (1 if
/// it was killed by a signal), or [`TwlError::Io`] if writing fails.
pub fn relay(
    output: &ProcessOutput,
    has_args: bool,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<(), TwlError> {
    if !output.success() {
        if !output.stderr.is_empty() {
            write!(err, "{}", output.stderr)
                .map_err(|e| TwlError::io("failed to relay tailwindcss output", e))?;
        }
        return Err(TwlError::process_exit_code(output.code.unwrap_or(1)));
    }

    let text = if has_args && !output.stdout.is_empty() {
        &output.stdout
    } else {
        &output.stderr
    };
    writeln!(out, "{text}").map_err(|e| TwlError::io("failed to relay tailwindcss output", e))
}
