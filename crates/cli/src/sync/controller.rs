// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription orchestration: snapshot plus push channel per tenant.
//!
//! The controller owns the only mutable copy of the tracked state and
//! publishes it as a [`SyncView`] on a watch channel. Every write is
//! tagged with the generation of the subscription that produced it and
//! applied only while that generation is current, so work left over from
//! a previous tenant (a late snapshot, a buffered frame) has no effect.

use std::sync::Arc;

use reqwest::Url;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use sentinel_core::{Incident, PushMessage};

use super::connection::{
    ConnectionEvent, ConnectionEvents, ConnectionId, ConnectionState, TransportConnection,
};
use super::policy::ReconnectPolicy;
use super::snapshot::{SnapshotError, SnapshotScope, SnapshotSource};
use super::transport::TransportFactory;

/// Settings for the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Push-channel base address, e.g. `ws://localhost:8000`.
    pub ws_base_url: String,
    pub policy: ReconnectPolicy,
}

impl SyncConfig {
    /// Tenant-scoped push-channel address, `{ws}/ws/incidents/{tenant}`.
    ///
    /// The tenant is percent-encoded as a single path segment. A base that
    /// does not parse is joined as text and fails later at connect.
    pub fn channel_address(&self, tenant: &str) -> String {
        let base = self.ws_base_url.trim_end_matches('/');
        match Url::parse(base) {
            Ok(mut url) if !url.cannot_be_a_base() => {
                if let Ok(mut path) = url.path_segments_mut() {
                    path.pop_if_empty().extend(["ws", "incidents", tenant]);
                }
                url.to_string()
            }
            _ => format!("{}/ws/incidents/{}", base, tenant),
        }
    }
}

/// Recoverable failure exposed alongside the tracked state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncFailure {
    #[error("snapshot fetch failed: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("live updates unavailable after {attempts} reconnect attempts")]
    LiveUpdatesUnavailable { attempts: u32 },
}

/// Everything a view needs to render a subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncView {
    /// Subscribed tenant, `None` before the first subscribe and after shutdown.
    pub tenant: Option<String>,
    /// Identity of the subscription that produced this view.
    pub generation: ConnectionId,
    pub scope: Option<SnapshotScope>,
    /// Tracked incident; replaced wholesale by each update.
    pub incident: Option<Incident>,
    /// Incident list for [`SnapshotScope::All`] subscriptions.
    pub incidents: Vec<Incident>,
    pub connection: ConnectionState,
    /// Reconnect attempt counter of the live connection.
    pub attempt: u32,
    pub error: Option<SyncFailure>,
    /// True while a snapshot fetch is in flight.
    pub loading: bool,
}

impl Default for SyncView {
    fn default() -> Self {
        SyncView {
            tenant: None,
            generation: 0,
            scope: None,
            incident: None,
            incidents: Vec::new(),
            connection: ConnectionState::Idle,
            attempt: 0,
            error: None,
            loading: false,
        }
    }
}

/// Apply `f` to the view if `generation` is still current.
///
/// The check happens inside the watch lock, so a stale writer racing a
/// tenant switch can never land its write. `f` reports whether it changed
/// anything; watchers are only woken when it did.
pub(super) fn apply(
    view: &watch::Sender<SyncView>,
    generation: ConnectionId,
    f: impl FnOnce(&mut SyncView) -> bool,
) -> bool {
    view.send_if_modified(|current| current.generation == generation && f(current))
}

/// Store `value` in `slot`, returning whether it differed.
fn set<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

struct Subscription {
    generation: ConnectionId,
    tenant: String,
    scope: SnapshotScope,
    connection: TransportConnection,
    pump: JoinHandle<()>,
    snapshot: Option<JoinHandle<()>>,
}

impl Subscription {
    fn teardown(mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            snapshot.abort();
        }
        self.connection.disconnect();
        self.pump.abort();
        debug!(generation = self.generation, tenant = %self.tenant, "subscription torn down");
    }
}

/// The single entry point for views: subscribe to a tenant, observe
/// [`SyncView`] changes, tear down.
///
/// Must be used within a tokio runtime.
pub struct SyncController {
    config: SyncConfig,
    snapshots: Arc<dyn SnapshotSource>,
    factory: Arc<dyn TransportFactory>,
    view: Arc<watch::Sender<SyncView>>,
    last_generation: ConnectionId,
    active: Option<Subscription>,
}

impl SyncController {
    pub fn new(
        config: SyncConfig,
        snapshots: Arc<dyn SnapshotSource>,
        factory: Arc<dyn TransportFactory>,
    ) -> Self {
        let (view, _) = watch::channel(SyncView::default());
        SyncController {
            config,
            snapshots,
            factory,
            view: Arc::new(view),
            last_generation: 0,
            active: None,
        }
    }

    /// Receive every change to the view.
    pub fn watch(&self) -> watch::Receiver<SyncView> {
        self.view.subscribe()
    }

    /// Current view.
    pub fn view(&self) -> SyncView {
        self.view.borrow().clone()
    }

    pub fn tenant(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.tenant.as_str())
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.view.borrow().connection
    }

    /// Track `tenant`, replacing any previous subscription.
    ///
    /// The previous connection is disconnected and its state discarded
    /// before the new snapshot fetch and connection start. Subscribing to
    /// the tenant and scope already tracked is a no-op while its connection
    /// is live; once it has closed, the subscription starts over.
    pub fn subscribe(&mut self, tenant: &str, scope: SnapshotScope) {
        if let Some(active) = &self.active {
            if active.tenant == tenant
                && active.scope == scope
                && active.connection.state().is_live()
            {
                return;
            }
        }
        self.teardown();

        let generation = self.next_generation();
        self.view.send_replace(SyncView {
            tenant: Some(tenant.to_string()),
            generation,
            scope: Some(scope.clone()),
            loading: true,
            ..SyncView::default()
        });
        info!(generation, tenant, scope = %scope, "subscribing");

        let address = self.config.channel_address(tenant);
        let (mut connection, events) = TransportConnection::new(
            generation,
            address,
            self.config.policy,
            Arc::clone(&self.factory),
        );
        let snapshot = self.spawn_snapshot(generation, tenant, &scope);
        let pump = tokio::spawn(pump(Arc::clone(&self.view), generation, events));
        connection.connect();

        self.active = Some(Subscription {
            generation,
            tenant: tenant.to_string(),
            scope,
            connection,
            pump,
            snapshot: Some(snapshot),
        });
    }

    /// Fetch the snapshot again for the current subscription.
    ///
    /// Returns false when nothing is subscribed.
    pub fn refresh(&mut self) -> bool {
        let Some((generation, tenant, scope)) = self
            .active
            .as_ref()
            .map(|s| (s.generation, s.tenant.clone(), s.scope.clone()))
        else {
            return false;
        };

        apply(&self.view, generation, |view| set(&mut view.loading, true));
        let snapshot = self.spawn_snapshot(generation, &tenant, &scope);
        if let Some(active) = self.active.as_mut() {
            if let Some(previous) = active.snapshot.replace(snapshot) {
                previous.abort();
            }
        }
        true
    }

    /// Reconnect after the connection gave up.
    ///
    /// Starts a fresh cycle with the attempt counter reset. Returns false
    /// when nothing is subscribed or the connection has not given up.
    pub fn retry(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if active.connection.state() != ConnectionState::Closed {
            return false;
        }

        apply(&self.view, active.generation, |view| {
            if !matches!(view.error, Some(SyncFailure::LiveUpdatesUnavailable { .. })) {
                return false;
            }
            view.error = None;
            true
        });
        info!(generation = active.generation, tenant = %active.tenant, "retrying push channel");
        active.connection.connect();
        true
    }

    /// Send a text frame on the live connection. Best-effort.
    pub fn send(&self, text: impl Into<String>) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.connection.send(text))
    }

    /// Stop tracking: disconnect, cancel pending work, clear the view.
    pub fn shutdown(&mut self) {
        if self.active.is_none() {
            return;
        }
        self.teardown();
        let generation = self.next_generation();
        self.view.send_replace(SyncView {
            generation,
            connection: ConnectionState::Closed,
            ..SyncView::default()
        });
    }

    fn next_generation(&mut self) -> ConnectionId {
        self.last_generation += 1;
        self.last_generation
    }

    fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            active.teardown();
        }
    }

    fn spawn_snapshot(
        &self,
        generation: ConnectionId,
        tenant: &str,
        scope: &SnapshotScope,
    ) -> JoinHandle<()> {
        let snapshots = Arc::clone(&self.snapshots);
        let view = Arc::clone(&self.view);
        let tenant = tenant.to_string();
        let scope = scope.clone();

        tokio::spawn(async move {
            match scope {
                SnapshotScope::Incident(id) => {
                    let result = snapshots.incident(&tenant, &id).await;
                    apply(&view, generation, |view| {
                        let loaded = set(&mut view.loading, false);
                        let changed = match result {
                            Ok(incident) => {
                                set(&mut view.incident, Some(incident)) | clear_snapshot_error(view)
                            }
                            Err(e) => snapshot_failed(view, generation, e),
                        };
                        loaded | changed
                    });
                }
                SnapshotScope::All => {
                    let result = snapshots.incidents(&tenant).await;
                    apply(&view, generation, |view| {
                        let loaded = set(&mut view.loading, false);
                        let changed = match result {
                            Ok(incidents) => {
                                set(&mut view.incidents, incidents) | clear_snapshot_error(view)
                            }
                            Err(e) => snapshot_failed(view, generation, e),
                        };
                        loaded | changed
                    });
                }
            }
        })
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn clear_snapshot_error(view: &mut SyncView) -> bool {
    if !matches!(view.error, Some(SyncFailure::Snapshot(_))) {
        return false;
    }
    view.error = None;
    true
}

fn snapshot_failed(view: &mut SyncView, generation: ConnectionId, error: SnapshotError) -> bool {
    warn!(generation, error = %error, "snapshot fetch failed");
    // A terminal channel failure outranks a snapshot failure.
    if matches!(view.error, Some(SyncFailure::LiveUpdatesUnavailable { .. })) {
        return false;
    }
    set(&mut view.error, Some(SyncFailure::Snapshot(error)))
}

/// Fold one connection's events into the view until it is torn down.
async fn pump(view: Arc<watch::Sender<SyncView>>, generation: ConnectionId, mut events: ConnectionEvents) {
    while let Some(event) = events.recv().await {
        match event {
            ConnectionEvent::Status(status) => {
                apply(&view, generation, |view| {
                    set(&mut view.connection, status.state) | set(&mut view.attempt, status.attempt)
                });
            }
            ConnectionEvent::Message(PushMessage::IncidentUpdate(incident)) => {
                debug!(generation, incident = %incident.id, status = %incident.status, "incident update");
                apply(&view, generation, |view| {
                    let listed =
                        view.scope == Some(SnapshotScope::All) && upsert(&mut view.incidents, &incident);
                    set(&mut view.incident, Some(incident)) | listed
                });
            }
            ConnectionEvent::GaveUp { attempts } => {
                apply(&view, generation, |view| {
                    set(&mut view.error, Some(SyncFailure::LiveUpdatesUnavailable { attempts }))
                });
            }
        }
    }
    debug!(generation, connection = events.connection(), "event stream ended");
}

/// Replace the list entry with the same id, or append. Returns whether
/// the list changed.
fn upsert(incidents: &mut Vec<Incident>, incident: &Incident) -> bool {
    match incidents.iter_mut().find(|i| i.id == incident.id) {
        Some(existing) if *existing == *incident => false,
        Some(existing) => {
            *existing = incident.clone();
            true
        }
        None => {
            incidents.push(incident.clone());
            true
        }
    }
}
