//! Logging setup for the dashboard binaries.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binaries so embedders can wire their own.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins when set; otherwise `info`, or `debug` when `debug` is true
fn env_filter(debug: bool) -> EnvFilter {
    let default_level = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Installs a compact fmt subscriber writing to stderr.
///
/// Returns `false` if a global subscriber already exists.
pub fn init_tracing(debug: bool) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}

/// Where the terminal dashboard logs when no `--log-file` is given
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("sales-dashboard.log")
}

fn file_subscriber(debug: bool, file: File) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(debug))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .finish()
}

/// Installs a subscriber appending to `path`.
///
/// Used while the terminal dashboard owns the screen, where stderr output
/// would draw over the frame.
pub fn init_file_tracing(debug: bool, path: &Path) -> io::Result<bool> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(tracing::subscriber::set_global_default(file_subscriber(debug, file)).is_ok())
}
