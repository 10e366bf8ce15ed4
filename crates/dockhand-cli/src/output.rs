//! Formatted output helpers for CLI commands.
//!
//! Provides table formatting, colored status indicators, and the mapping
//! from domain errors to operator-facing messages.

use dockhand_common::error::DockhandError;
use dockhand_common::types::ContainerStatus;
use serde::Serialize;

pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const RED: &str = "\x1b[31m";
pub const RESET: &str = "\x1b[0m";

/// Turns a domain error into the CLI's error.
///
/// Ordinary rejections become their short operator message. Local storage
/// failures keep the full cause chain, since an action may have happened
/// without being recorded.
pub fn report(err: DockhandError) -> anyhow::Error {
    if err.is_local_storage_failure() {
        tracing::error!(error = %err, "local storage failure");
        anyhow::Error::new(err).context("local storage failure")
    } else {
        anyhow::anyhow!(err.user_message())
    }
}

/// Like [`report`], but a rejected username or password reads as
/// "Invalid credentials" rather than the missing-login message.
pub fn report_login(err: DockhandError) -> anyhow::Error {
    match err {
        DockhandError::Unauthenticated => anyhow::anyhow!("Invalid credentials"),
        other => report(other),
    }
}

/// Prints `value` as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Color for a status cell.
#[must_use]
pub const fn status_color(status: ContainerStatus) -> &'static str {
    match status {
        ContainerStatus::Running => GREEN,
        ContainerStatus::Created | ContainerStatus::Paused => YELLOW,
        ContainerStatus::Stopped => DIM,
        ContainerStatus::RemovedPending => RED,
    }
}

/// Formats a megabyte figure with two decimals (e.g. "128.00 MB").
#[must_use]
pub fn format_megabytes(mb: f64) -> String {
    format!("{mb:.2} MB")
}

/// Prints a one-line confirmation of a completed action.
pub fn confirm(message: &str) {
    println!("{GREEN}✓{RESET} {message}");
}
