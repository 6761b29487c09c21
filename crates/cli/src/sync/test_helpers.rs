// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::time::Duration;

use chrono::{TimeZone, Utc};
use sentinel_core::{Hypothesis, HypothesisStatus, Incident, IncidentStatus, PushMessage, Severity};
use tokio::sync::watch;

use super::connection::{ConnectionEvent, ConnectionEvents};

/// Upper bound for any wait in tests. Virtual under `start_paused`.
pub const PATIENCE: Duration = Duration::from_secs(600);

/// Create a test incident with the given id and status.
pub fn make_incident(id: &str, status: IncidentStatus) -> Incident {
    let mut incident = Incident::new(
        id,
        format!("Incident {}", id),
        Severity::High,
        Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
    );
    incident.status = status;
    incident.hypotheses.push(Hypothesis {
        id: format!("{}-h1", id),
        description: "Brute force attack on admin panel".to_string(),
        confidence: 0.85,
        status: HypothesisStatus::Active,
        evidence: vec!["Multiple failed login attempts".to_string()],
    });
    incident
}

/// Encode an `INCIDENT_UPDATE` frame carrying `incident`.
pub fn update_frame(incident: &Incident) -> String {
    PushMessage::incident_update(incident.clone())
        .to_json()
        .unwrap()
}

/// Next event from a connection, failing the test if none arrives.
pub async fn next_event(events: &mut ConnectionEvents) -> ConnectionEvent {
    tokio::time::timeout(PATIENCE, events.recv())
        .await
        .expect("timed out waiting for connection event")
        .expect("connection event stream ended")
}

/// Wait until the watched value satisfies `pred`, returning a copy of it.
pub async fn wait_until<T: Clone>(
    rx: &mut watch::Receiver<T>,
    pred: impl FnMut(&T) -> bool,
) -> T {
    tokio::time::timeout(PATIENCE, rx.wait_for(pred))
        .await
        .expect("timed out waiting for condition")
        .expect("watch sender dropped")
        .clone()
}

/// Let spawned tasks run until they park.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
