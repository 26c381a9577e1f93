//! Launcher for the Tailwind CSS standalone binary.
//!
//! twl makes sure a given tailwindcss release is present in a per-user cache,
//! downloading it on demand, then runs it with the caller's arguments.
//!
//! ## Module Structure
//!
//! - [`platform`] - OS, architecture and libc detection
//! - [`cache`] - Cache directory, guarded writes and eviction
//! - [`resolver`] - `latest` to concrete release tag
//! - [`download`] - Artifact download with retries
//! - [`retry`] - Fixed-delay retry policy
//! - [`client`] - Shared HTTP client and endpoints
//! - [`runner`] - Runs the cached binary
//! - [`launcher`] - The launch sequence
//! - [`args`] - Command line splitting
//! - [`config`] - Environment-driven settings
//! - [`logging`] - Diagnostic logging setup
//! - [`errors`] - Error types

pub mod args;
pub mod cache;
pub mod client;
pub mod config;
pub mod download;
pub mod errors;
pub mod launcher;
pub mod logging;
pub mod platform;
pub mod resolver;
pub mod retry;
pub mod runner;

pub use args::LaunchArgs;
pub use cache::CacheStore;
pub use client::Client;
pub use config::Settings;
pub use errors::TwlError;
pub use launcher::{Launcher, relay};
pub use platform::{OsFileProbe, Platform};
pub use runner::TokioRunner;
