//! Environment-driven configuration for the twl launcher.
//!
//! Every setting has a built-in default. The following environment variables
//! override them; empty or whitespace-only values are treated as unset.
//!
//! | Variable           | Meaning                                    |
//! |--------------------|--------------------------------------------|
//! | `TWL_CACHE_DIR`    | Cache directory (default `<cache>/go-tw`)  |
//! | `TWL_DOWNLOAD_URL` | Base URL for release artifacts             |
//! | `TWL_LATEST_URL`   | URL of the latest-release metadata         |
//! | `TWL_TIMEOUT_SECS` | Overall time budget for one invocation     |
//!
//! Logging is configured separately, see [`crate::logging`].

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "TWL_CACHE_DIR";

/// Environment variable overriding the artifact download base URL.
pub const DOWNLOAD_URL_ENV: &str = "TWL_DOWNLOAD_URL";

/// Environment variable overriding the latest-release metadata URL.
pub const LATEST_URL_ENV: &str = "TWL_LATEST_URL";

/// Environment variable overriding the overall time budget in seconds.
pub const TIMEOUT_ENV: &str = "TWL_TIMEOUT_SECS";

/// Default artifact download base URL.
pub const DEFAULT_DOWNLOAD_URL: &str = "https://github.com/tailwindlabs/tailwindcss/releases/download";

/// Default latest-release metadata URL.
pub const DEFAULT_LATEST_URL: &str =
    "https://api.github.com/repos/tailwindlabs/tailwindcss/releases/latest";

/// Default overall time budget for one invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// Per-request HTTP timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolved launcher settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Explicit cache directory, replacing `<user cache dir>/go-tw`.
    pub cache_dir: Option<PathBuf>,
    /// Base URL for `<base>/<tag>/<artifact>` downloads.
    pub download_url: String,
    /// URL returning `{"tag_name": "..."}` for the latest release.
    pub latest_url: String,
    /// Budget after which downloads and the tailwindcss process are cancelled.
    pub timeout: Duration,
    /// Timeout for each individual HTTP request.
    pub request_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: None,
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            latest_url: DEFAULT_LATEST_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through an arbitrary variable lookup.
    ///
    /// An unparsable timeout falls back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            cache_dir: get(CACHE_DIR_ENV).map(PathBuf::from),
            download_url: get(DOWNLOAD_URL_ENV)
                .map_or(defaults.download_url, |url| trim_url(&url)),
            latest_url: get(LATEST_URL_ENV).map_or(defaults.latest_url, |url| trim_url(&url)),
            timeout: get(TIMEOUT_ENV)
                .and_then(|secs| secs.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map_or(defaults.timeout, Duration::from_secs),
            request_timeout: defaults.request_timeout,
        }
    }
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        assert_eq!(settings_from(&[]), Settings::default());
    }

    #[test]
    fn overrides_are_applied() {
        let settings = settings_from(&[
            (CACHE_DIR_ENV, "/tmp/twl-cache"),
            (DOWNLOAD_URL_ENV, "http://localhost:8080/download/"),
            (LATEST_URL_ENV, "http://localhost:8080/latest"),
            (TIMEOUT_ENV, "5"),
        ]);
        assert_eq!(settings.cache_dir, Some(PathBuf::from("/tmp/twl-cache")));
        assert_eq!(settings.download_url, "http://localhost:8080/download");
        assert_eq!(settings.latest_url, "http://localhost:8080/latest");
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }

    #[test]
    fn blank_values_are_ignored() {
        let settings = settings_from(&[(CACHE_DIR_ENV, "   "), (DOWNLOAD_URL_ENV, "")]);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn invalid_timeout_falls_back_to_default() {
        for value in ["soon", "0", "-3"] {
            let settings = settings_from(&[(TIMEOUT_ENV, value)]);
            assert_eq!(settings.timeout, DEFAULT_TIMEOUT, "{value}");
        }
    }
}
