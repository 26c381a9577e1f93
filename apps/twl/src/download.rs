//! Artifact downloads for the twl launcher.
//!
//! Downloads the release artifact for a platform and version straight into
//! the cache directory, retrying with the fixed-delay [`RetryPolicy`].
//!
//! ## Attempt lifecycle
//!
//! 1. GET `<download base>/<version>/<artifact name>`
//! 2. Non-success status fails the attempt
//! 3. The body is streamed through [`cache::write`], which validates the
//!    destination and compares the byte count with `Content-Length`
//! 4. On failure the partial file is removed before the next attempt
//!
//! The whole download observes a [`CancellationToken`]. A cancelled request
//! fails its attempt like any other error; the remaining attempts then fail
//! immediately because the token stays cancelled.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use futures_util::TryStreamExt;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::cache;
use crate::client::Client;
use crate::errors::TwlError;
use crate::platform::Platform;
use crate::retry::{Exhausted, RetryPolicy, retry_with_policy};

/// Downloads tailwindcss binaries into the cache.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    policy: RetryPolicy,
}

impl Downloader {
    /// Creates a downloader using the default retry policy.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Downloads the artifact for `platform` and `version` to `dest`.
    ///
    /// `dest` must be inside `cache_dir`; this is checked again at write time.
    ///
    /// # Errors
    ///
    /// Returns [`TwlError::DownloadFailed`] wrapping the error of the last
    /// attempt once every attempt has failed.
    pub async fn download(
        &self,
        platform: &Platform,
        version: &str,
        dest: &Path,
        cache_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), TwlError> {
        let url = self.client.artifact_url(version, &platform.artifact_name());
        let max_attempts = self.policy.max_attempts;

        let result = retry_with_policy(
            &self.policy,
            |attempt: u32, delay: Duration| {
                info!(attempt, max = max_attempts, "Download failed, retrying");
                tokio::time::sleep(delay)
            },
            |attempt| {
                let url = url.as_str();
                async move {
                    let result = self.attempt(url, dest, cache_dir, cancel).await;
                    if let Err(e) = &result {
                        info!(attempt, error = %e, "Download attempt failed");
                        remove_partial(dest);
                    }
                    result
                }
            },
        )
        .await;

        result.map_err(|Exhausted { attempts, last_error }| TwlError::DownloadFailed {
            attempts,
            source: Box::new(last_error),
        })
    }

    async fn attempt(
        &self,
        url: &str,
        dest: &Path,
        cache_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), TwlError> {
        debug!(url, "Downloading file");

        let response = self.client.get(url, cancel).await?;

        let status = response.status();
        if !status.is_success() {
            error!(status_code = status.as_u16(), "failed to download file");
            return Err(TwlError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let expected_len = response
            .content_length()
            .and_then(|len| i64::try_from(len).ok())
            .unwrap_or(-1);

        let mut body = StreamReader::new(Box::pin(
            response.bytes_stream().map_err(std::io::Error::other),
        ));

        tokio::select! {
            () = cancel.cancelled() => Err(TwlError::Cancelled),
            written = cache::write(&mut body, dest, cache_dir, expected_len) => written.map(|_| ()),
        }
    }
}

/// Removes a partially written file, ignoring a file that was never created.
fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed partial download"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => error!(path = %path.display(), error = %e, "Failed to clean up partial download"),
    }
}
