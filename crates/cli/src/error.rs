// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::SnapshotError;

/// All possible errors that can occur in the sentinel client.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("snapshot fetch failed: {0}\n  hint: check api_url and that the backend is running")]
    Snapshot(#[from] SnapshotError),

    #[error("live updates unavailable after {attempts} reconnect attempts\n  hint: check ws_url and rerun to retry")]
    LiveUpdatesUnavailable { attempts: u32 },

    #[error("failed to initialize logging: {0}")]
    Logging(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for sentinel client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
