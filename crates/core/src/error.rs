// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for sentinel-core operations.

use thiserror::Error;

/// All possible errors that can occur in sentinel-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid incident status: '{0}'\n  hint: valid statuses are: investigating, active, resolved")]
    InvalidStatus(String),

    #[error("invalid severity: '{0}'\n  hint: valid severities are: low, medium, high, critical")]
    InvalidSeverity(String),

    #[error("invalid hypothesis status: '{0}'\n  hint: valid statuses are: active, refined, rejected")]
    InvalidHypothesisStatus(String),

    #[error("invalid agent type: '{0}'\n  hint: valid types are: Hypothesis, Response, Critic")]
    InvalidAgentType(String),

    #[error("{kind} '{id}' has confidence {value} outside [0, 1]")]
    ConfidenceOutOfRange {
        kind: &'static str,
        id: String,
        value: f64,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for sentinel-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
