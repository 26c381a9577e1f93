//! Version resolution for the twl launcher.
//!
//! A requested version is either the `latest` sentinel or a concrete release
//! tag such as `v4.0.7`. `latest` is turned into a tag by asking the release
//! endpoint, which answers with:
//!
//! ```json
//! { "tag_name": "v4.0.7", ... }
//! ```
//!
//! Every way of not getting an answer (transport error, cancellation,
//! non-success status) is reported as [`TwlError::Http`], the one condition
//! the launcher recovers from by falling back to the cached version. A body
//! that cannot be understood is reported as [`TwlError::ReleaseMetadata`].

use std::fmt;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::client::Client;
use crate::errors::TwlError;

/// Token selecting the newest release.
pub const LATEST: &str = "latest";

/// Version requested on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestedVersion {
    /// Resolve the newest release at run time.
    #[default]
    Latest,
    /// A concrete release tag.
    Tag(String),
}

impl RequestedVersion {
    /// Parses a `-version` token.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        if token == LATEST {
            Self::Latest
        } else {
            Self::Tag(token.to_string())
        }
    }
}

impl fmt::Display for RequestedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str(LATEST),
            Self::Tag(tag) => f.write_str(tag),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

/// Asks the release endpoint for the newest tag.
///
/// # Errors
///
/// - [`TwlError::Http`] if the endpoint cannot be reached, the request is
///   cancelled, or the status is not a success
/// - [`TwlError::ReleaseMetadata`] if the body is not the expected JSON
pub async fn resolve_latest(client: &Client, cancel: &CancellationToken) -> Result<String, TwlError> {
    let url = client.latest_url();
    debug!(url, "Fetching latest release");

    let response = client.get(url, cancel).await.map_err(|e| {
        debug!(error = %e, "Latest release request failed");
        TwlError::Http
    })?;

    let status = response.status();
    if !status.is_success() {
        error!(status_code = status.as_u16(), "failed to get latest release");
        return Err(TwlError::Http);
    }

    let body = tokio::select! {
        () = cancel.cancelled() => return Err(TwlError::Http),
        body = response.text() => body.map_err(|e| {
            debug!(error = %e, "Failed to read latest release body");
            TwlError::Http
        })?,
    };

    let release: Release = serde_json::from_str(&body)
        .map_err(|e| TwlError::release_metadata(format!("failed to parse response from {url}: {e}")))?;

    if release.tag_name.trim().is_empty() {
        return Err(TwlError::release_metadata(format!(
            "empty tag_name in response from {url}"
        )));
    }

    Ok(release.tag_name)
}
