// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the sync controller.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use sentinel_core::{AgentDecision, AgentType, IncidentStatus};

use super::connection::ConnectionState;
use super::controller::{apply, SyncConfig, SyncController, SyncFailure, SyncView};
use super::policy::ReconnectPolicy;
use super::snapshot::{SnapshotError, SnapshotScope};
use super::snapshot_tests::StaticSnapshots;
use super::test_helpers::{make_incident, settle, update_frame, wait_until};
use super::transport_tests::MockNetwork;

const TENANT: &str = "default-tenant";

fn config() -> SyncConfig {
    SyncConfig {
        ws_base_url: "ws://mock".to_string(),
        policy: ReconnectPolicy::default(),
    }
}

fn address(tenant: &str) -> String {
    format!("ws://mock/ws/incidents/{}", tenant)
}

fn controller(network: &MockNetwork, snapshots: &StaticSnapshots) -> SyncController {
    SyncController::new(config(), Arc::new(snapshots.clone()), network.factory())
}

fn incident_scope(id: &str) -> SnapshotScope {
    SnapshotScope::Incident(id.to_string())
}

fn settled_and_open(view: &SyncView) -> bool {
    !view.loading && view.connection == ConnectionState::Open
}

#[test]
fn channel_address_is_tenant_scoped() {
    let config = SyncConfig {
        ws_base_url: "ws://localhost:8000/".to_string(),
        policy: ReconnectPolicy::default(),
    };
    assert_eq!(
        config.channel_address("default-tenant"),
        "ws://localhost:8000/ws/incidents/default-tenant"
    );
}

#[test]
fn channel_address_encodes_tenant_as_one_segment() {
    let config = SyncConfig {
        ws_base_url: "wss://push.example.com/".to_string(),
        policy: ReconnectPolicy::default(),
    };
    assert_eq!(
        config.channel_address("a/b c?#"),
        "wss://push.example.com/ws/incidents/a%2Fb%20c%3F%23"
    );
}

#[test]
fn channel_address_keeps_base_path() {
    let config = SyncConfig {
        ws_base_url: "ws://gateway:9000/sentinel".to_string(),
        policy: ReconnectPolicy::default(),
    };
    assert_eq!(
        config.channel_address("t1"),
        "ws://gateway:9000/sentinel/ws/incidents/t1"
    );
}

#[test]
fn apply_notifies_only_current_generation_changes() {
    let (view, rx) = watch::channel(SyncView {
        generation: 1,
        ..SyncView::default()
    });

    assert!(!apply(&view, 1, |_| false));
    assert!(!rx.has_changed().unwrap());

    assert!(!apply(&view, 2, |view| {
        view.attempt = 3;
        true
    }));
    assert_eq!(view.borrow().attempt, 0);
    assert!(!rx.has_changed().unwrap());

    assert!(apply(&view, 1, |view| {
        view.attempt = 3;
        true
    }));
    assert!(rx.has_changed().unwrap());
}

#[test]
fn initial_view_is_empty() {
    let view = SyncView::default();
    assert_eq!(view.tenant, None);
    assert_eq!(view.incident, None);
    assert_eq!(view.connection, ConnectionState::Idle);
    assert_eq!(view.error, None);
}

#[tokio::test(start_paused = true)]
async fn snapshot_then_push_update_end_to_end() {
    let network = MockNetwork::new();
    let snapshots = StaticSnapshots::new();
    snapshots.insert(TENANT, make_incident("INC-1", IncidentStatus::Investigating));

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe(TENANT, incident_scope("INC-1"));
    assert_eq!(sync.tenant(), Some(TENANT));

    let view = wait_until(&mut rx, settled_and_open).await;
    let incident = view.incident.unwrap();
    assert_eq!(incident.id, "INC-1");
    assert_eq!(incident.status, IncidentStatus::Investigating);
    assert_eq!(view.error, None);
    assert_eq!(network.connect_log(), vec![address(TENANT)]);

    network.push(
        &address(TENANT),
        update_frame(&make_incident("INC-1", IncidentStatus::Resolved)),
    );
    let view = wait_until(&mut rx, |v| {
        v.incident
            .as_ref()
            .is_some_and(|i| i.status == IncidentStatus::Resolved)
    })
    .await;
    assert_eq!(view.incident.unwrap().id, "INC-1");
}

#[tokio::test(start_paused = true)]
async fn push_update_replaces_incident_without_merging() {
    let network = MockNetwork::new();
    let snapshots = StaticSnapshots::new();
    let mut snapshot = make_incident("INC-1", IncidentStatus::Active);
    snapshot.decisions.push(AgentDecision {
        id: "d1".to_string(),
        agent_type: AgentType::Critic,
        timestamp: snapshot.created_at,
        confidence: 0.6,
        reasoning: "Hypothesis lacks supporting evidence".to_string(),
        action: None,
    });
    snapshots.insert(TENANT, snapshot);

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe(TENANT, incident_scope("INC-1"));
    wait_until(&mut rx, settled_and_open).await;

    let mut pushed = make_incident("INC-1", IncidentStatus::Active);
    pushed.title = "Renamed".to_string();
    pushed.hypotheses.clear();
    network.push(&address(TENANT), update_frame(&pushed));

    let view = wait_until(&mut rx, |v| {
        v.incident.as_ref().is_some_and(|i| i.title == "Renamed")
    })
    .await;
    assert_eq!(view.incident, Some(pushed));
}

#[tokio::test(start_paused = true)]
async fn later_applied_snapshot_wins_over_earlier_push() {
    let network = MockNetwork::new();
    let snapshots = StaticSnapshots::new();
    snapshots.insert(TENANT, make_incident("INC-1", IncidentStatus::Investigating));
    snapshots.hold();

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe(TENANT, incident_scope("INC-1"));
    wait_until(&mut rx, |v| v.connection == ConnectionState::Open).await;
    assert!(sync.view().loading);

    network.push(
        &address(TENANT),
        update_frame(&make_incident("INC-1", IncidentStatus::Resolved)),
    );
    wait_until(&mut rx, |v| v.incident.is_some()).await;

    snapshots.release();
    let view = wait_until(&mut rx, |v| !v.loading).await;
    assert_eq!(view.incident.unwrap().status, IncidentStatus::Investigating);
}

#[tokio::test(start_paused = true)]
async fn updates_apply_in_delivery_order() {
    let network = MockNetwork::new();
    let snapshots = StaticSnapshots::new();
    snapshots.insert(TENANT, make_incident("INC-1", IncidentStatus::Investigating));

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe(TENANT, incident_scope("INC-1"));
    wait_until(&mut rx, settled_and_open).await;

    for status in [IncidentStatus::Active, IncidentStatus::Resolved] {
        network.push(&address(TENANT), update_frame(&make_incident("INC-1", status)));
    }
    settle().await;
    assert_eq!(
        sync.view().incident.unwrap().status,
        IncidentStatus::Resolved
    );
}

#[tokio::test(start_paused = true)]
async fn snapshot_failure_does_not_block_channel() {
    let network = MockNetwork::new();
    let snapshots = StaticSnapshots::new();
    let failure = SnapshotError::Status {
        status: 500,
        url: "static://incidents/INC-1".to_string(),
    };
    snapshots.fail(TENANT, "INC-1", failure.clone());

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe(TENANT, incident_scope("INC-1"));

    let view = wait_until(&mut rx, settled_and_open).await;
    assert_eq!(view.error, Some(SyncFailure::Snapshot(failure)));
    assert_eq!(view.incident, None);

    network.push(
        &address(TENANT),
        update_frame(&make_incident("INC-1", IncidentStatus::Active)),
    );
    let view = wait_until(&mut rx, |v| v.incident.is_some()).await;
    assert_eq!(view.incident.unwrap().status, IncidentStatus::Active);
}

#[tokio::test(start_paused = true)]
async fn refresh_clears_snapshot_error() {
    let network = MockNetwork::new();
    let snapshots = StaticSnapshots::new();
    snapshots.fail(TENANT, "INC-1", SnapshotError::Request("timed out".to_string()));

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe(TENANT, incident_scope("INC-1"));
    wait_until(&mut rx, |v| v.error.is_some()).await;

    snapshots.insert(TENANT, make_incident("INC-1", IncidentStatus::Active));
    assert!(sync.refresh());
    let view = wait_until(&mut rx, |v| v.incident.is_some()).await;
    assert_eq!(view.error, None);
    assert!(!view.loading);
    assert_eq!(snapshots.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn refresh_without_subscription_is_noop() {
    let mut sync = controller(&MockNetwork::new(), &StaticSnapshots::new());
    assert!(!sync.refresh());
    assert!(!sync.retry());
    assert!(!sync.send("x"));
}

#[tokio::test(start_paused = true)]
async fn reconnect_keeps_tracked_incident() {
    let network = MockNetwork::new();
    let snapshots = StaticSnapshots::new();
    snapshots.insert(TENANT, make_incident("INC-1", IncidentStatus::Active));

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe(TENANT, incident_scope("INC-1"));
    wait_until(&mut rx, settled_and_open).await;

    network.close(&address(TENANT));
    let view = wait_until(&mut rx, |v| v.connection == ConnectionState::Reconnecting).await;
    assert_eq!(view.attempt, 1);
    assert!(view.incident.is_some());

    let view = wait_until(&mut rx, |v| v.connection == ConnectionState::Open).await;
    assert_eq!(view.attempt, 0);
    assert!(view.incident.is_some());
    assert_eq!(network.connects(&address(TENANT)), 2);
}

#[tokio::test(start_paused = true)]
async fn giving_up_reports_live_updates_unavailable() {
    let network = MockNetwork::new();
    network.refuse_always(&address(TENANT));
    let snapshots = StaticSnapshots::new();
    snapshots.insert(TENANT, make_incident("INC-1", IncidentStatus::Active));

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe(TENANT, incident_scope("INC-1"));

    let view = wait_until(&mut rx, |v| v.error.is_some() && !v.loading).await;
    assert_eq!(
        view.error,
        Some(SyncFailure::LiveUpdatesUnavailable { attempts: 5 })
    );
    assert_eq!(view.connection, ConnectionState::Closed);
    assert_eq!(view.attempt, 5);
    // The snapshot is still shown.
    assert!(view.incident.is_some());

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(network.connects(&address(TENANT)), 6);
}

#[tokio::test(start_paused = true)]
async fn retry_after_giving_up_starts_fresh() {
    let network = MockNetwork::new();
    network.refuse_always(&address(TENANT));
    let snapshots = StaticSnapshots::new();

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe(TENANT, SnapshotScope::All);
    wait_until(&mut rx, |v| v.error.is_some()).await;

    network.accept(&address(TENANT));
    assert!(sync.retry());
    let view = wait_until(&mut rx, |v| v.connection == ConnectionState::Open).await;
    assert_eq!(view.attempt, 0);
    assert_eq!(view.error, None);
    assert_eq!(network.connects(&address(TENANT)), 7);
}

#[tokio::test(start_paused = true)]
async fn resubscribing_after_giving_up_starts_fresh() {
    let network = MockNetwork::new();
    network.refuse_always(&address(TENANT));
    let snapshots = StaticSnapshots::new();

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe(TENANT, SnapshotScope::All);
    wait_until(&mut rx, |v| {
        v.connection == ConnectionState::Closed && v.error.is_some()
    })
    .await;
    let generation = sync.view().generation;
    assert_eq!(network.connects(&address(TENANT)), 6);

    network.accept(&address(TENANT));
    sync.subscribe(TENANT, SnapshotScope::All);
    let view = wait_until(&mut rx, settled_and_open).await;
    assert!(view.generation > generation);
    assert_eq!(view.attempt, 0);
    assert_eq!(view.error, None);
    assert_eq!(network.connects(&address(TENANT)), 7);
}

#[tokio::test(start_paused = true)]
async fn duplicate_update_does_not_wake_watchers() {
    let network = MockNetwork::new();
    let mut sync = controller(&network, &StaticSnapshots::new());
    let mut rx = sync.watch();
    sync.subscribe(TENANT, SnapshotScope::All);
    wait_until(&mut rx, settled_and_open).await;

    let frame = update_frame(&make_incident("INC-2", IncidentStatus::Active));
    network.push(&address(TENANT), frame.clone());
    wait_until(&mut rx, |v| v.incidents.len() == 1).await;

    network.push(&address(TENANT), frame);
    settle().await;
    assert!(!rx.has_changed().unwrap());
    assert_eq!(sync.view().incidents.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_is_ignored_while_connection_is_live() {
    let network = MockNetwork::new();
    let mut sync = controller(&network, &StaticSnapshots::new());
    let mut rx = sync.watch();
    sync.subscribe(TENANT, SnapshotScope::All);
    wait_until(&mut rx, settled_and_open).await;

    assert!(!sync.retry());
    settle().await;
    assert_eq!(network.connects(&address(TENANT)), 1);
}

#[tokio::test(start_paused = true)]
async fn resubscribing_same_tenant_keeps_connection() {
    let network = MockNetwork::new();
    let mut sync = controller(&network, &StaticSnapshots::new());
    let mut rx = sync.watch();
    sync.subscribe(TENANT, SnapshotScope::All);
    wait_until(&mut rx, settled_and_open).await;
    let generation = sync.view().generation;

    sync.subscribe(TENANT, SnapshotScope::All);
    settle().await;
    assert_eq!(sync.view().generation, generation);
    assert_eq!(network.connects(&address(TENANT)), 1);
}

#[tokio::test(start_paused = true)]
async fn tenant_switch_while_reconnecting() {
    let network = MockNetwork::new();
    let mut sync = controller(&network, &StaticSnapshots::new());
    let mut rx = sync.watch();
    sync.subscribe("t1", SnapshotScope::All);
    wait_until(&mut rx, settled_and_open).await;

    network.close(&address("t1"));
    wait_until(&mut rx, |v| v.connection == ConnectionState::Reconnecting).await;

    sync.subscribe("t2", SnapshotScope::All);
    let view = wait_until(&mut rx, settled_and_open).await;
    assert_eq!(view.tenant.as_deref(), Some("t2"));

    // The pending t1 retry never fires.
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(network.connect_log(), vec![address("t1"), address("t2")]);
    assert_eq!(sync.view().connection, ConnectionState::Open);
}

#[tokio::test(start_paused = true)]
async fn tenant_switch_closes_previous_socket_once() {
    let network = MockNetwork::new();
    let mut sync = controller(&network, &StaticSnapshots::new());
    let mut rx = sync.watch();
    sync.subscribe("t1", SnapshotScope::All);
    wait_until(&mut rx, settled_and_open).await;

    sync.subscribe("t2", SnapshotScope::All);
    wait_until(&mut rx, settled_and_open).await;
    settle().await;

    assert_eq!(network.disconnects(&address("t1")), 1);
    assert!(!network.is_live(&address("t1")));
    assert_eq!(network.connects(&address("t2")), 1);
}

#[tokio::test(start_paused = true)]
async fn tenant_switch_discards_previous_state_and_late_snapshot() {
    let network = MockNetwork::new();
    let snapshots = StaticSnapshots::new();
    snapshots.insert("t1", make_incident("INC-1", IncidentStatus::Active));
    snapshots.insert("t2", make_incident("INC-2", IncidentStatus::Investigating));

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe("t1", incident_scope("INC-1"));
    wait_until(&mut rx, settled_and_open).await;
    assert_eq!(sync.view().incident.unwrap().id, "INC-1");

    snapshots.hold();
    sync.subscribe("t2", incident_scope("INC-2"));
    let view = sync.view();
    assert_eq!(view.tenant.as_deref(), Some("t2"));
    assert_eq!(view.incident, None);
    assert!(view.loading);

    // A frame racing the teardown on the old socket goes nowhere.
    network.push(
        &address("t1"),
        update_frame(&make_incident("INC-1", IncidentStatus::Resolved)),
    );
    settle().await;
    assert_eq!(sync.view().incident, None);
    assert!(!network.is_live(&address("t1")));

    snapshots.release();
    let view = wait_until(&mut rx, |v| !v.loading).await;
    assert_eq!(view.incident.unwrap().id, "INC-2");
}

#[tokio::test(start_paused = true)]
async fn stale_snapshot_from_previous_tenant_is_ignored() {
    let network = MockNetwork::new();
    let snapshots = StaticSnapshots::new();
    snapshots.insert("t1", make_incident("INC-1", IncidentStatus::Active));
    snapshots.insert("t2", make_incident("INC-2", IncidentStatus::Active));
    snapshots.hold();

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe("t1", incident_scope("INC-1"));
    settle().await;
    sync.subscribe("t2", incident_scope("INC-2"));

    // Enough permits for both fetches; only t2's may land.
    snapshots.release();
    snapshots.release();
    let view = wait_until(&mut rx, |v| !v.loading).await;
    settle().await;
    assert_eq!(view.incident.unwrap().id, "INC-2");
    assert_eq!(sync.view().incident.unwrap().id, "INC-2");
}

#[tokio::test(start_paused = true)]
async fn list_scope_upserts_pushed_incidents() {
    let network = MockNetwork::new();
    let snapshots = StaticSnapshots::new();
    snapshots.insert_list(
        TENANT,
        vec![
            make_incident("INC-1", IncidentStatus::Active),
            make_incident("INC-2", IncidentStatus::Investigating),
        ],
    );

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe(TENANT, SnapshotScope::All);
    let view = wait_until(&mut rx, settled_and_open).await;
    assert_eq!(view.incidents.len(), 2);
    assert_eq!(view.incident, None);

    network.push(
        &address(TENANT),
        update_frame(&make_incident("INC-2", IncidentStatus::Resolved)),
    );
    let view = wait_until(&mut rx, |v| v.incident.is_some()).await;
    assert_eq!(view.incidents.len(), 2);
    assert_eq!(view.incidents[1].status, IncidentStatus::Resolved);

    network.push(
        &address(TENANT),
        update_frame(&make_incident("INC-3", IncidentStatus::Active)),
    );
    let view = wait_until(&mut rx, |v| v.incidents.len() == 3).await;
    assert_eq!(view.incident.unwrap().id, "INC-3");
}

#[tokio::test(start_paused = true)]
async fn list_snapshot_failure_is_reported() {
    let network = MockNetwork::new();
    let snapshots = StaticSnapshots::new();
    snapshots.fail_list(TENANT, SnapshotError::Decode("expected a sequence".to_string()));

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe(TENANT, SnapshotScope::All);
    let view = wait_until(&mut rx, settled_and_open).await;
    assert!(matches!(
        view.error,
        Some(SyncFailure::Snapshot(SnapshotError::Decode(_)))
    ));
    assert!(view.incidents.is_empty());
}

#[tokio::test(start_paused = true)]
async fn send_forwards_while_open() {
    let network = MockNetwork::new();
    let mut sync = controller(&network, &StaticSnapshots::new());
    let mut rx = sync.watch();
    sync.subscribe(TENANT, SnapshotScope::All);
    wait_until(&mut rx, settled_and_open).await;

    assert!(sync.send(r#"{"type":"ACK"}"#));
    settle().await;
    assert_eq!(network.sent(&address(TENANT)).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_tears_everything_down() {
    let network = MockNetwork::new();
    let snapshots = StaticSnapshots::new();
    snapshots.insert(TENANT, make_incident("INC-1", IncidentStatus::Active));

    let mut sync = controller(&network, &snapshots);
    let mut rx = sync.watch();
    sync.subscribe(TENANT, incident_scope("INC-1"));
    wait_until(&mut rx, settled_and_open).await;

    sync.shutdown();
    let view = sync.view();
    assert_eq!(view.tenant, None);
    assert_eq!(view.incident, None);
    assert_eq!(view.connection, ConnectionState::Closed);
    assert_eq!(sync.tenant(), None);
    assert!(!sync.send("x"));

    settle().await;
    assert_eq!(network.disconnects(&address(TENANT)), 1);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(network.connects(&address(TENANT)), 1);
    assert_eq!(sync.view().connection, ConnectionState::Closed);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_pending_reconnect() {
    let network = MockNetwork::new();
    let mut sync = controller(&network, &StaticSnapshots::new());
    let mut rx = sync.watch();
    sync.subscribe(TENANT, SnapshotScope::All);
    wait_until(&mut rx, settled_and_open).await;

    network.close(&address(TENANT));
    wait_until(&mut rx, |v| v.connection == ConnectionState::Reconnecting).await;
    sync.shutdown();

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(network.connects(&address(TENANT)), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_controller_disconnects() {
    let network = MockNetwork::new();
    let mut sync = controller(&network, &StaticSnapshots::new());
    let mut rx = sync.watch();
    sync.subscribe(TENANT, SnapshotScope::All);
    wait_until(&mut rx, settled_and_open).await;

    drop(sync);
    settle().await;
    assert!(!network.is_live(&address(TENANT)));
    assert_eq!(network.disconnects(&address(TENANT)), 1);
}
