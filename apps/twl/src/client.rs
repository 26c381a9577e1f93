//! HTTP client shared by version resolution and downloads.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::errors::TwlError;

/// User-Agent header for HTTP requests. The GitHub API rejects requests
/// without one.
const USER_AGENT: &str = concat!("twl/", env!("CARGO_PKG_VERSION"));

/// reqwest client plus the two release endpoints.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    download_url: String,
    latest_url: String,
}

impl Client {
    /// Creates a client for the endpoints in `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        Self::with_urls(
            &settings.download_url,
            &settings.latest_url,
            settings.request_timeout,
        )
    }

    /// Creates a client with explicit endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn with_urls(
        download_url: &str,
        latest_url: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            download_url: download_url.trim_end_matches('/').to_string(),
            latest_url: latest_url.to_string(),
        })
    }

    /// URL of the latest-release metadata.
    #[must_use]
    pub fn latest_url(&self) -> &str {
        &self.latest_url
    }

    /// URL of the artifact `name` for release `version`.
    #[must_use]
    pub fn artifact_url(&self, version: &str, name: &str) -> String {
        format!("{}/{version}/{name}", self.download_url)
    }

    /// Sends a GET request, aborting when `cancel` fires.
    ///
    /// Only transport failures are errors here; the caller decides what a
    /// non-success status means.
    pub(crate) async fn get(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<reqwest::Response, TwlError> {
        tokio::select! {
            () = cancel.cancelled() => Err(TwlError::Cancelled),
            resp = self.http.get(url).send() => resp.map_err(|source| TwlError::Request {
                url: url.to_string(),
                source,
            }),
        }
    }
}
