// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sentinel-core: Shared data model for the incident sync client
//!
//! This crate provides the incident types produced by the analysis backend,
//! boundary validation for them, and the push-channel frame decoder. It has
//! no I/O and no async runtime dependency.

pub mod error;
pub mod incident;
pub mod protocol;

pub use error::{Error, Result};
pub use incident::{
    AgentDecision, AgentType, Hypothesis, HypothesisStatus, Incident, IncidentStatus, Severity,
};
pub use protocol::{DecodeError, PushMessage};
