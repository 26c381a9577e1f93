//! Cache directory management for the twl launcher.
//!
//! The cache holds downloaded tailwindcss binaries, one file per version,
//! directly inside a single directory:
//!
//! ```text
//! <user cache dir>/go-tw/     # or TWL_CACHE_DIR
//!   tailwindcss-v4.0.7        # resident version
//!   tailwindcss-v4.0.7.exe    # (Windows)
//! ```
//!
//! Only this module writes into the cache directory. [`write`] validates its
//! destination on its own, so a bad path coming from any caller cannot escape
//! the cache.

use std::cmp::Ordering;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::debug;

use crate::errors::TwlError;
use crate::platform::{ARTIFACT_PREFIX, Platform};

/// Namespace directory appended to the per-user cache root.
pub const CACHE_NAMESPACE: &str = "go-tw";

/// Extension stripped from cache entry names before comparing versions.
const EXE_EXTENSION: &str = ".exe";

/// Handle on the cache directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Resolves and creates the cache directory.
    ///
    /// Uses `root_override` when given, otherwise `<user cache dir>/go-tw`.
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns [`TwlError::CacheDirectory`] if the user cache directory cannot
    /// be determined or the directory cannot be created.
    pub fn download_directory(root_override: Option<&Path>) -> Result<Self, TwlError> {
        let dir = match root_override {
            Some(dir) => dir.to_path_buf(),
            None => dirs::cache_dir()
                .ok_or_else(|| {
                    TwlError::cache_directory(
                        "cannot determine the user cache directory. Set TWL_CACHE_DIR.",
                    )
                })?
                .join(CACHE_NAMESPACE),
        };

        std::fs::create_dir_all(&dir).map_err(|source| TwlError::CacheDirectory {
            message: format!("failed to create {}", dir.display()),
            source: Some(source),
        })?;

        debug!(dir = %dir.display(), "Using cache directory");
        Ok(Self { dir })
    }

    /// Wraps an existing directory without touching the filesystem.
    #[must_use = "returns new cache store without side effects"]
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the cache entry path for `version` on `platform`.
    ///
    /// # Errors
    ///
    /// Returns [`TwlError::InvalidPath`] if the version token would place the
    /// entry outside the cache directory.
    pub fn entry_path(&self, platform: &Platform, version: &str) -> Result<PathBuf, TwlError> {
        let path = self.dir.join(format!(
            "{ARTIFACT_PREFIX}{version}{}",
            platform.executable_extension()
        ));
        if is_nested_in(&path, &self.dir) && path.parent() == Some(self.dir.as_path()) {
            Ok(path)
        } else {
            Err(TwlError::invalid_path(path, &self.dir))
        }
    }

    /// See [`current_version`].
    ///
    /// # Errors
    ///
    /// Same as [`current_version`].
    pub fn current_version(&self) -> Result<String, TwlError> {
        current_version(&self.dir)
    }

    /// See [`evict_except`].
    ///
    /// # Errors
    ///
    /// Same as [`evict_except`].
    pub fn evict_except(&self, keep_version: &str) -> Result<(), TwlError> {
        evict_except(&self.dir, keep_version)
    }

    /// See [`write`].
    ///
    /// # Errors
    ///
    /// Same as [`write`].
    pub async fn write<R>(&self, source: &mut R, dest: &Path, expected_len: i64) -> Result<u64, TwlError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        write(source, dest, &self.dir, expected_len).await
    }
}

/// Returns whether `path` exists.
///
/// A missing path is `Ok(false)`; any other stat failure is an error.
///
/// # Errors
///
/// Returns the underlying I/O error for failures other than "not found".
pub fn exists(path: &Path) -> std::io::Result<bool> {
    match std::fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Returns the version of the cached tailwindcss binary.
///
/// Scans `dir` (non-recursively, ignoring subdirectories) for entries named
/// `tailwindcss-<version>[.exe]`. If several versions are resident the highest
/// one wins; semver tags rank above anything that does not parse.
///
/// # Errors
///
/// Returns [`TwlError::NotInstalled`] when no entry matches, or
/// [`TwlError::Io`] when the directory cannot be read.
pub fn current_version(dir: &Path) -> Result<String, TwlError> {
    let mut best: Option<String> = None;
    for version in cached_versions(dir)? {
        if best
            .as_deref()
            .is_none_or(|current| compare_versions(&version, current) == Ordering::Greater)
        {
            best = Some(version);
        }
    }
    best.ok_or(TwlError::NotInstalled)
}

/// Removes every cached tailwindcss binary whose version is not `keep_version`.
///
/// Subdirectories and files without the `tailwindcss-` prefix are left alone.
/// A trailing `.exe` is ignored on every OS, so `tailwindcss-v4.0.0.exe` also
/// counts as `v4.0.0`. Stops at the first removal failure; whatever is left is retried on the next
/// install.
///
/// # Errors
///
/// Returns [`TwlError::Io`] if the directory cannot be read or a file cannot
/// be removed.
pub fn evict_except(dir: &Path, keep_version: &str) -> Result<(), TwlError> {
    for (name, version) in cache_entries(dir)? {
        if version == keep_version {
            continue;
        }
        let path = dir.join(&name);
        debug!(file = %name, dir = %dir.display(), "Deleting old version");
        std::fs::remove_file(&path)
            .map_err(|e| TwlError::io(format!("failed to remove {}", path.display()), e))?;
    }
    Ok(())
}

/// Streams `source` into `dest`, which must lie inside `cache_dir`.
///
/// Both paths are normalized lexically and `dest` must be strictly nested in
/// `cache_dir`; otherwise nothing is created. When `expected_len` is positive
/// the number of bytes written must match it. Zero or negative disables the
/// check (the server sent no `Content-Length`).
///
/// The file is written in place. On error a truncated file may remain at
/// `dest` and the caller is expected to remove it.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// - [`TwlError::InvalidPath`] if `dest` escapes `cache_dir`
/// - [`TwlError::Io`] if the file cannot be created or written
/// - [`TwlError::IncompleteDownload`] on a length mismatch
pub async fn write<R>(
    source: &mut R,
    dest: &Path,
    cache_dir: &Path,
    expected_len: i64,
) -> Result<u64, TwlError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    debug!(path = %dest.display(), expected_len, "Writing file");

    if !is_nested_in(dest, cache_dir) {
        return Err(TwlError::invalid_path(dest, cache_dir));
    }
    let dest = normalize(dest);

    let mut file = tokio::fs::File::create(&dest)
        .await
        .map_err(|e| TwlError::io(format!("failed to create {}", dest.display()), e))?;

    let written = tokio::io::copy(source, &mut file)
        .await
        .map_err(|e| TwlError::io(format!("failed to write {}", dest.display()), e))?;

    file.flush()
        .await
        .map_err(|e| TwlError::io(format!("failed to flush {}", dest.display()), e))?;

    if let Ok(expected) = u64::try_from(expected_len)
        && expected > 0
        && written != expected
    {
        return Err(TwlError::IncompleteDownload {
            expected,
            actual: written,
        });
    }

    debug!(path = %dest.display(), bytes = written, "File written successfully");
    Ok(written)
}

/// Grants the owner execute permission on `path`.
///
/// # Errors
///
/// Returns [`TwlError::Io`] if the file does not exist or its permissions
/// cannot be changed.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<(), TwlError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .map_err(|e| TwlError::io(format!("failed to get metadata: {}", path.display()), e))?
        .permissions();
    perms.set_mode(0o700);
    std::fs::set_permissions(path, perms)
        .map_err(|e| TwlError::io(format!("failed to set permissions: {}", path.display()), e))
}

/// Checks that `path` exists (Windows has no execute bit).
///
/// # Errors
///
/// Returns [`TwlError::Io`] if the file does not exist.
#[cfg(windows)]
pub fn make_executable(path: &Path) -> Result<(), TwlError> {
    std::fs::metadata(path)
        .map(|_| ())
        .map_err(|e| TwlError::io(format!("failed to get metadata: {}", path.display()), e))
}

/// Lists `(file name, version)` for every prefixed regular entry in `dir`.
fn cache_entries(dir: &Path) -> Result<Vec<(String, String)>, TwlError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| TwlError::io(format!("failed to read {}", dir.display()), e))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| TwlError::io("failed to read directory entry", e))?;
        let is_dir = entry
            .file_type()
            .map_err(|e| TwlError::io("failed to read file type", e))?
            .is_dir();
        if is_dir {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if let Some(rest) = name.strip_prefix(ARTIFACT_PREFIX) {
            let version = rest.strip_suffix(EXE_EXTENSION).unwrap_or(rest).to_string();
            found.push((name, version));
        }
    }
    Ok(found)
}

fn cached_versions(dir: &Path) -> Result<Vec<String>, TwlError> {
    Ok(cache_entries(dir)?
        .into_iter()
        .map(|(_, version)| version)
        .collect())
}

/// Orders version tags, preferring semver (with an optional `v` prefix).
fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| semver::Version::parse(v.strip_prefix('v').unwrap_or(v)).ok();
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Lexically normalizes a path: drops `.` and folds `..` into its parent.
///
/// Never touches the filesystem, so symlinks are not resolved. A `..` that
/// would climb above the root of an absolute path is dropped; for relative
/// paths it is kept.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Returns whether `path` normalizes to a location strictly inside `dir`.
///
/// Relative paths are anchored at the current directory first, so a leading
/// `..` is compared against real parents instead of matching itself.
fn is_nested_in(path: &Path, dir: &Path) -> bool {
    let (Ok(path), Ok(dir)) = (std::path::absolute(path), std::path::absolute(dir)) else {
        return false;
    };
    let path = normalize(&path);
    let dir = normalize(&dir);
    path != dir && path.starts_with(&dir)
}
