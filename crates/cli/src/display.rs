// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use sentinel_core::{AgentDecision, Hypothesis, Incident};

use crate::colors;
use crate::sync::{ConnectionStatus, ConnectionState};

/// Maximum line width for wrapped text content (excluding indent).
const WRAP_WIDTH: usize = 96;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Wrap text at word boundaries if it's a single line.
///
/// Multi-line content is returned unchanged to preserve its formatting.
pub fn wrap_text(content: &str, width: usize) -> String {
    if content.contains('\n') || content.len() <= width {
        return content.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in content.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

/// Indent every line of `text` by `indent` spaces.
fn indented(text: &str, indent: usize) -> Vec<String> {
    let pad = " ".repeat(indent);
    text.lines().map(|line| format!("{pad}{line}")).collect()
}

/// Confidence as a whole percentage, e.g. `0.85` → `85%`.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

/// Format a single incident line for list output
pub fn format_incident_line(incident: &Incident, color: bool) -> String {
    format!(
        "- [{}] ({}) {}: {}",
        colors::severity(incident.severity, color),
        colors::status(incident.status, color),
        incident.id,
        incident.title
    )
}

/// Summary line for list output: open versus total.
pub fn format_list_summary(incidents: &[Incident]) -> String {
    let open = incidents.iter().filter(|i| i.is_open()).count();
    let plural = if incidents.len() == 1 { "" } else { "s" };
    format!("{} incident{}, {} open", incidents.len(), plural, open)
}

/// Format one hypothesis with its evidence.
///
/// Output format:
/// ```text
///   - [active] 85% Brute force attack on admin panel
///       evidence: Multiple failed login attempts
/// ```
pub fn format_hypothesis(hypothesis: &Hypothesis, leading: bool) -> Vec<String> {
    let marker = if leading { "*" } else { "-" };
    let mut lines = vec![format!(
        "  {} [{}] {} {}",
        marker,
        hypothesis.status,
        format_confidence(hypothesis.confidence),
        hypothesis.description
    )];
    for evidence in &hypothesis.evidence {
        lines.push(format!("      evidence: {}", evidence));
    }
    lines
}

/// Format one agent decision for the timeline.
///
/// Output format:
/// ```text
///   2024-01-10 10:30:00  Critic 60%
///     Reasoning text, wrapped.
///     action: isolate host
/// ```
pub fn format_decision(decision: &AgentDecision, color: bool) -> Vec<String> {
    let timestamp = decision.timestamp.format(TIME_FORMAT).to_string();
    let mut lines = vec![format!(
        "  {}  {} {}",
        colors::context(&timestamp, color),
        decision.agent_type,
        format_confidence(decision.confidence)
    )];
    lines.extend(indented(&wrap_text(&decision.reasoning, WRAP_WIDTH), 4));
    if let Some(action) = &decision.action {
        lines.push(format!("    action: {}", action));
    }
    lines
}

/// Format incident details for the show command and live view.
pub fn format_incident_details(incident: &Incident, color: bool) -> String {
    let mut output = Vec::new();

    output.push(format!(
        "[{}] {}",
        colors::severity(incident.severity, color),
        incident.id
    ));
    output.push(format!("Title: {}", incident.title));
    output.push(format!("Status: {}", colors::status(incident.status, color)));
    output.push(format!(
        "Created: {}",
        incident.created_at.format(TIME_FORMAT)
    ));
    output.push(format!(
        "Updated: {}",
        incident.updated_at.format(TIME_FORMAT)
    ));

    if !incident.hypotheses.is_empty() {
        let leading = incident.leading_hypothesis().map(|h| h.id.as_str());
        output.push(String::new());
        output.push(colors::header("Hypotheses:", color));
        for hypothesis in &incident.hypotheses {
            output.extend(format_hypothesis(
                hypothesis,
                leading == Some(hypothesis.id.as_str()),
            ));
        }
    }

    let timeline = incident.timeline();
    if !timeline.is_empty() {
        output.push(String::new());
        output.push(colors::header("Timeline:", color));
        for (i, decision) in timeline.into_iter().enumerate() {
            if i > 0 {
                output.push(String::new());
            }
            output.extend(format_decision(decision, color));
        }
    }

    output.join("\n")
}

/// One line describing a change of the tracked incident.
///
/// Status transitions are spelled out; other changes print the new state.
pub fn format_incident_change(previous: Option<&Incident>, incident: &Incident, color: bool) -> String {
    match previous {
        Some(prev) if prev.id == incident.id && prev.status != incident.status => format!(
            "{} {} -> {}: {}",
            incident.id,
            colors::status(prev.status, color),
            colors::status(incident.status, color),
            incident.title
        ),
        _ => format!(
            "{} [{}] ({}): {}",
            incident.id,
            colors::severity(incident.severity, color),
            colors::status(incident.status, color),
            incident.title
        ),
    }
}

/// One line describing the connection state.
pub fn format_connection(status: ConnectionStatus, max_attempts: u32, color: bool) -> String {
    let state = colors::connection(status.state, color);
    match status.state {
        ConnectionState::Reconnecting => format!(
            "live: {} (attempt {}/{})",
            state, status.attempt, max_attempts
        ),
        _ => format!("live: {}", state),
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
