#![warn(clippy::pedantic)]

//! # twl
//!
//! Runs the Tailwind CSS standalone binary, downloading it into a per-user
//! cache first if needed. Every argument except `-version <tag>` is passed to
//! tailwindcss unchanged.
//!
//! ## Examples
//!
//! Build with the latest release:
//! ```bash
//! twl -i input.css -o output.css
//! ```
//!
//! Pin a release:
//! ```bash
//! twl -version v3.4.17 -i input.css -o output.css --minify
//! ```
//!
//! ## Exit Codes
//!
//! - `0` when tailwindcss succeeds
//! - tailwindcss's own exit code when it fails
//! - `1` for any launcher error

use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use twl::{
    CacheStore, Client, LaunchArgs, Launcher, OsFileProbe, Platform, Settings, TokioRunner,
    TwlError, logging, relay,
};

#[tokio::main]
async fn main() {
    logging::init(logging::level_from_env(), logging::output_from_env());

    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Handles an error and returns the appropriate exit code.
///
/// For `ProcessExitCode` errors, returns the embedded exit code without
/// printing anything (tailwindcss already reported the problem).
/// For all other errors, prints the error and returns exit code 1.
fn handle_error(e: &anyhow::Error) -> i32 {
    if let Some(TwlError::ProcessExitCode { code }) = e.downcast_ref::<TwlError>() {
        return *code;
    }
    eprintln!("Error: {e:?}");
    1
}

async fn run() -> Result<()> {
    let platform = Platform::detect(&OsFileProbe)?;
    debug!(%platform, "Detected platform");

    let args = LaunchArgs::parse(std::env::args().skip(1)).context("failed to parse arguments")?;
    let settings = Settings::from_env();

    let cache = CacheStore::download_directory(settings.cache_dir.as_deref())
        .context("failed to determine directory to download tailwindcss to")?;
    let client = Client::new(&settings).context("failed to create HTTP client")?;

    let cancel = CancellationToken::new();
    cancel_on_timeout_or_interrupt(cancel.clone(), settings.timeout);

    let launcher = Launcher::new(platform, cache, client, TokioRunner, cancel);
    let output = launcher.launch(&args).await?;

    relay(
        &output,
        !args.passthrough.is_empty(),
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )?;
    Ok(())
}

/// Cancels `cancel` once `budget` elapses or on Ctrl-C.
fn cancel_on_timeout_or_interrupt(cancel: CancellationToken, budget: Duration) {
    tokio::spawn(async move {
        let interrupted = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                debug!(error = %e, "Cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            () = tokio::time::sleep(budget) => debug!(?budget, "Time budget elapsed, cancelling"),
            () = interrupted => debug!("Interrupted, cancelling"),
        }
        cancel.cancel();
    });
}
