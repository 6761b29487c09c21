// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the CLI are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `SENTINEL_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    non_empty(vars::SENTINEL_CONFIG).map(PathBuf::from)
}

/// Returns the value of `SENTINEL_API_URL` if set and non-empty.
pub fn api_url() -> Option<String> {
    non_empty(vars::SENTINEL_API_URL)
}

/// Returns the value of `SENTINEL_WS_URL` if set and non-empty.
pub fn ws_url() -> Option<String> {
    non_empty(vars::SENTINEL_WS_URL)
}

/// Returns the log filter directive in `SENTINEL_LOG` if set.
pub fn log_filter() -> Option<String> {
    non_empty(vars::SENTINEL_LOG)
}

/// Returns `true` if `NO_COLOR=1`.
pub fn no_color() -> bool {
    std::env::var(vars::NO_COLOR).is_ok_and(|v| v == "1")
}

/// Returns `true` if `COLOR=1`.
pub fn force_color() -> bool {
    std::env::var(vars::COLOR).is_ok_and(|v| v == "1")
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
