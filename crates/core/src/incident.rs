// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Incident types produced by the analysis backend.
//!
//! This module contains the tracked entity ([`Incident`]) and its parts:
//! [`Hypothesis`], [`AgentDecision`], and their status enums. Field names
//! serialize in camelCase to match the backend's wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Lifecycle status of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    /// Agents are still analyzing the signal.
    Investigating,
    /// Confirmed and being responded to.
    Active,
    /// No further action required.
    Resolved,
}

impl IncidentStatus {
    /// Returns the string representation used on the wire and in display.
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Investigating => "investigating",
            IncidentStatus::Active => "active",
            IncidentStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "investigating" => Ok(IncidentStatus::Investigating),
            "active" => Ok(IncidentStatus::Active),
            "resolved" => Ok(IncidentStatus::Resolved),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Severity of an incident, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Returns the string representation used on the wire and in display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(Error::InvalidSeverity(s.to_string())),
        }
    }
}

/// Where a hypothesis stands in the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisStatus {
    Active,
    Refined,
    Rejected,
}

impl HypothesisStatus {
    /// Returns the string representation used on the wire and in display.
    pub fn as_str(&self) -> &'static str {
        match self {
            HypothesisStatus::Active => "active",
            HypothesisStatus::Refined => "refined",
            HypothesisStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for HypothesisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HypothesisStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "active" => Ok(HypothesisStatus::Active),
            "refined" => Ok(HypothesisStatus::Refined),
            "rejected" => Ok(HypothesisStatus::Rejected),
            _ => Err(Error::InvalidHypothesisStatus(s.to_string())),
        }
    }
}

/// The agent that produced a decision.
///
/// Serialized with the capitalized names the backend emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentType {
    /// Generates and refines hypotheses from raw signal.
    Hypothesis,
    /// Plans containment and remediation.
    Response,
    /// Reviews the other agents' output.
    Critic,
}

impl AgentType {
    /// Returns the string representation used on the wire and in display.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Hypothesis => "Hypothesis",
            AgentType::Response => "Response",
            AgentType::Critic => "Critic",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "hypothesis" => Ok(AgentType::Hypothesis),
            "response" => Ok(AgentType::Response),
            "critic" => Ok(AgentType::Critic),
            _ => Err(Error::InvalidAgentType(s.to_string())),
        }
    }
}

/// A candidate explanation for an incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hypothesis {
    pub id: String,
    pub description: String,
    /// Must lie in `[0, 1]`; see [`Incident::validate`].
    pub confidence: f64,
    pub status: HypothesisStatus,
    #[serde(default)]
    pub evidence: Vec<String>,
}

/// One step of agent reasoning recorded against an incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDecision {
    pub id: String,
    pub agent_type: AgentType,
    pub timestamp: DateTime<Utc>,
    /// Must lie in `[0, 1]`; see [`Incident::validate`].
    pub confidence: f64,
    pub reasoning: String,
    /// Action proposed by the agent, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// The tracked entity: one incident and everything the agents know about it.
///
/// A value received from the backend always replaces the previously held
/// value wholesale; there is no field-level merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Stable, opaque identifier (e.g. `INC-2024-001`).
    pub id: String,
    pub title: String,
    pub status: IncidentStatus,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Hypotheses in arrival order.
    #[serde(default)]
    pub hypotheses: Vec<Hypothesis>,
    /// Decisions in arrival order.
    #[serde(default)]
    pub decisions: Vec<AgentDecision>,
}

impl Incident {
    /// Creates a new incident with no hypotheses or decisions.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        severity: Severity,
        created_at: DateTime<Utc>,
    ) -> Self {
        Incident {
            id: id.into(),
            title: title.into(),
            status: IncidentStatus::Investigating,
            severity,
            created_at,
            updated_at: created_at,
            hypotheses: Vec::new(),
            decisions: Vec::new(),
        }
    }

    /// Returns true unless the incident is resolved.
    pub fn is_open(&self) -> bool {
        self.status != IncidentStatus::Resolved
    }

    /// Decisions sorted ascending by timestamp.
    ///
    /// The sort is stable, so decisions sharing a timestamp keep arrival order.
    pub fn timeline(&self) -> Vec<&AgentDecision> {
        let mut decisions: Vec<&AgentDecision> = self.decisions.iter().collect();
        decisions.sort_by_key(|d| d.timestamp);
        decisions
    }

    /// The highest-confidence hypothesis that has not been rejected.
    pub fn leading_hypothesis(&self) -> Option<&Hypothesis> {
        self.hypotheses
            .iter()
            .filter(|h| h.status != HypothesisStatus::Rejected)
            .fold(None, |best: Option<&Hypothesis>, h| match best {
                Some(b) if b.confidence >= h.confidence => Some(b),
                _ => Some(h),
            })
    }

    /// Checks the confidence invariant on every hypothesis and decision.
    ///
    /// Out-of-range values (including NaN) are a producer bug and are
    /// rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        for h in &self.hypotheses {
            check_confidence("hypothesis", &h.id, h.confidence)?;
        }
        for d in &self.decisions {
            check_confidence("decision", &d.id, d.confidence)?;
        }
        Ok(())
    }
}

fn check_confidence(kind: &'static str, id: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::ConfidenceOutOfRange {
            kind,
            id: id.to_string(),
            value,
        })
    }
}

#[cfg(test)]
#[path = "incident_tests.rs"]
mod tests;
