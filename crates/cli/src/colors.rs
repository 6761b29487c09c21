// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal color utilities for incident output.
//!
//! Respects environment variables:
//! - `NO_COLOR=1`: Disables colors
//! - `COLOR=1`: Forces colors even without TTY

use std::io::IsTerminal;

use sentinel_core::{IncidentStatus, Severity};

use crate::env;
use crate::sync::ConnectionState;

/// ANSI 256-color codes.
pub mod codes {
    /// Section headers: pastel cyan/steel blue
    pub const HEADER: u8 = 74;
    /// Secondary detail (timestamps, ids): medium grey
    pub const CONTEXT: u8 = 245;
    pub const CRITICAL: u8 = 196;
    pub const HIGH: u8 = 208;
    pub const MEDIUM: u8 = 220;
    /// Resolved incidents and healthy connections: soft green
    pub const OK: u8 = 71;
}

/// Check if colors should be enabled based on TTY and environment variables.
pub fn should_colorize() -> bool {
    if env::no_color() {
        return false;
    }
    if env::force_color() {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Format a 256-color ANSI escape sequence for foreground color.
fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

/// ANSI reset sequence.
const RESET: &str = "\x1b[0m";

/// Paint `text` with `code`, or return it unchanged when `enabled` is false.
pub fn paint(code: u8, text: &str, enabled: bool) -> String {
    if enabled {
        format!("{}{}{}", fg256(code), text, RESET)
    } else {
        text.to_string()
    }
}

/// Apply header color (section titles) to text.
pub fn header(text: &str, enabled: bool) -> String {
    paint(codes::HEADER, text, enabled)
}

/// Apply context color (timestamps, secondary detail) to text.
pub fn context(text: &str, enabled: bool) -> String {
    paint(codes::CONTEXT, text, enabled)
}

/// Severity label, colored by urgency. `low` stays uncolored.
pub fn severity(severity: Severity, enabled: bool) -> String {
    let code = match severity {
        Severity::Critical => codes::CRITICAL,
        Severity::High => codes::HIGH,
        Severity::Medium => codes::MEDIUM,
        Severity::Low => return severity.to_string(),
    };
    paint(code, severity.as_str(), enabled)
}

/// Incident status label. Only `resolved` is colored.
pub fn status(status: IncidentStatus, enabled: bool) -> String {
    match status {
        IncidentStatus::Resolved => paint(codes::OK, status.as_str(), enabled),
        _ => status.to_string(),
    }
}

/// Connection state label: green when open, red once closed.
pub fn connection(state: ConnectionState, enabled: bool) -> String {
    match state {
        ConnectionState::Open => paint(codes::OK, state.as_str(), enabled),
        ConnectionState::Closed => paint(codes::CRITICAL, state.as_str(), enabled),
        _ => paint(codes::MEDIUM, state.as_str(), enabled),
    }
}

#[cfg(test)]
#[path = "colors_tests.rs"]
mod tests;
