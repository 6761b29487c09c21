// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One logical push-channel connection with automatic recovery.
//!
//! A [`TransportConnection`] owns a background driver task that connects,
//! reads frames, and reconnects according to a [`ReconnectPolicy`]. The
//! owner consumes decoded messages and state changes from the paired
//! [`ConnectionEvents`] stream.
//!
//! # Teardown
//!
//! [`TransportConnection::disconnect`] cancels the connection's lifetime
//! token. That one step:
//! - cancels a pending reconnect timer (the driver is parked on it)
//! - makes the driver close an open socket and exit
//! - freezes the published status at `Closed`
//! - ends the event stream, so nothing is delivered to the owner afterwards
//!
//! Status writes from the driver are gated on the token inside the watch
//! channel's lock, so a driver racing with `disconnect` can never
//! overwrite the final `Closed`.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sentinel_core::PushMessage;

use super::policy::{ReconnectAction, ReconnectPolicy};
use super::transport::{Transport, TransportFactory};

/// Identity of one connection instance, unique per controller.
pub type ConnectionId = u64;

/// Lifecycle of a push-channel connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, never connected.
    Idle,
    /// A connect attempt is in flight.
    Connecting,
    /// The socket is open and frames are flowing.
    Open,
    /// The socket was lost; waiting out the backoff delay.
    Reconnecting,
    /// Manually disconnected or out of retries. Terminal for this attempt cycle.
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Closed => "closed",
        }
    }

    /// True while a driver task is running for the connection.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Open | ConnectionState::Reconnecting
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Published connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Reconnect attempt in progress; 0 while open or before any failure.
    pub attempt: u32,
}

impl ConnectionStatus {
    fn new(state: ConnectionState, attempt: u32) -> Self {
        ConnectionStatus { state, attempt }
    }
}

/// Events delivered from the driver to the connection's owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// The published status changed.
    Status(ConnectionStatus),
    /// A successfully decoded push message.
    Message(PushMessage),
    /// Reconnect attempts are exhausted; a fresh `connect` is required.
    GaveUp { attempts: u32 },
}

/// Receiving half of a connection's event stream.
///
/// Yields nothing once the connection has been disconnected or dropped,
/// including events that were already buffered.
pub struct ConnectionEvents {
    connection: ConnectionId,
    rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    alive: CancellationToken,
}

impl ConnectionEvents {
    /// The connection these events originate from.
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    /// Next event, or `None` once the connection is torn down.
    pub async fn recv(&mut self) -> Option<ConnectionEvent> {
        if self.alive.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.alive.cancelled() => None,
            event = self.rx.recv() => event.filter(|_| !self.alive.is_cancelled()),
        }
    }
}

/// Manages exactly one logical connection to a push-channel address.
pub struct TransportConnection {
    id: ConnectionId,
    address: String,
    policy: ReconnectPolicy,
    factory: Arc<dyn TransportFactory>,
    status: Arc<watch::Sender<ConnectionStatus>>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    /// Cancelled by `disconnect`; parent of every driver's token.
    alive: CancellationToken,
    outbound: Option<mpsc::UnboundedSender<String>>,
    driver: Option<JoinHandle<()>>,
}

impl TransportConnection {
    /// Create an idle connection and the stream its events arrive on.
    pub fn new(
        id: ConnectionId,
        address: impl Into<String>,
        policy: ReconnectPolicy,
        factory: Arc<dyn TransportFactory>,
    ) -> (Self, ConnectionEvents) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(ConnectionStatus::new(ConnectionState::Idle, 0));
        let alive = CancellationToken::new();

        let connection = TransportConnection {
            id,
            address: address.into(),
            policy,
            factory,
            status: Arc::new(status),
            events: events_tx,
            alive: alive.clone(),
            outbound: None,
            driver: None,
        };
        let events = ConnectionEvents {
            connection: id,
            rx: events_rx,
            alive,
        };

        (connection, events)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn state(&self) -> ConnectionState {
        self.status().state
    }

    /// Reconnect attempt counter.
    pub fn attempt(&self) -> u32 {
        self.status().attempt
    }

    /// Watch status changes without consuming the event stream.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// True once `disconnect` has been called.
    pub fn is_disconnected(&self) -> bool {
        self.alive.is_cancelled()
    }

    /// Start connecting.
    ///
    /// No-op while a driver is already connecting, open, or waiting to
    /// reconnect, and after `disconnect`. From `Idle` or a terminal
    /// `Closed` it starts a fresh cycle with the attempt counter at zero.
    /// Must be called within a tokio runtime.
    pub fn connect(&mut self) {
        if self.alive.is_cancelled() {
            debug!(connection = self.id, "connect ignored after disconnect");
            return;
        }
        if self.state().is_live() {
            return;
        }

        let run = self.alive.child_token();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let driver = Driver {
            id: self.id,
            address: self.address.clone(),
            policy: self.policy,
            factory: Arc::clone(&self.factory),
            status: Arc::clone(&self.status),
            events: self.events.clone(),
            cancel: run,
            outbound: outbound_rx,
        };

        // Published before spawning so a second connect() sees a live state.
        driver.publish(ConnectionState::Connecting, 0);
        self.outbound = Some(outbound_tx);
        self.driver = Some(tokio::spawn(driver.run()));
    }

    /// Close the connection for good.
    ///
    /// Marks the connection dead and cancels any pending reconnect timer
    /// before returning; no event is delivered after this returns. An open
    /// socket is closed by the driver task as it observes the cancellation,
    /// so the close frame goes out shortly after, not before, this returns.
    pub fn disconnect(&mut self) {
        if self.alive.is_cancelled() {
            return;
        }
        self.alive.cancel();
        self.outbound = None;
        self.status
            .send_modify(|status| status.state = ConnectionState::Closed);
        debug!(connection = self.id, address = %self.address, "disconnected");
    }

    /// Queue a text frame for sending. Best-effort.
    ///
    /// Only accepted while `Open`; otherwise the frame is dropped and
    /// `false` is returned.
    pub fn send(&self, text: impl Into<String>) -> bool {
        if self.state() != ConnectionState::Open {
            debug!(connection = self.id, state = %self.state(), "dropping outbound frame");
            return false;
        }
        self.outbound
            .as_ref()
            .is_some_and(|tx| tx.send(text.into()).is_ok())
    }

    /// Wait for the current driver task to finish.
    ///
    /// After `disconnect`, this resolves once the socket has been closed.
    pub async fn join(&mut self) {
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.await {
                warn!(connection = self.id, error = %e, "connection driver failed");
            }
        }
    }
}

impl Drop for TransportConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

enum Step {
    Send(String),
    Frame(super::transport::TransportResult<Option<String>>),
}

enum ReadExit {
    Cancelled,
    Lost(String),
}

/// Background task state for one connect/retry cycle.
struct Driver {
    id: ConnectionId,
    address: String,
    policy: ReconnectPolicy,
    factory: Arc<dyn TransportFactory>,
    status: Arc<watch::Sender<ConnectionStatus>>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    cancel: CancellationToken,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl Driver {
    async fn run(mut self) {
        let mut attempt = 0u32;

        loop {
            self.publish(ConnectionState::Connecting, attempt);
            let mut transport = self.factory.create();

            let connected = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                result = transport.connect(&self.address) => result,
            };

            match connected {
                Ok(()) => {
                    attempt = 0;
                    if self.cancel.is_cancelled() {
                        let _ = transport.disconnect().await;
                        return;
                    }
                    self.publish(ConnectionState::Open, 0);
                    info!(connection = self.id, address = %self.address, "push channel open");

                    match self.read(transport.as_mut()).await {
                        ReadExit::Cancelled => {
                            if let Err(e) = transport.disconnect().await {
                                debug!(connection = self.id, error = %e, "close failed");
                            }
                            return;
                        }
                        ReadExit::Lost(reason) => {
                            warn!(connection = self.id, address = %self.address, %reason, "push channel lost");
                        }
                    }
                }
                Err(e) => {
                    warn!(connection = self.id, address = %self.address, attempt, error = %e, "connect failed");
                }
            }

            attempt = attempt.saturating_add(1);
            match self.policy.next_action(attempt) {
                ReconnectAction::Retry { attempt, delay } => {
                    self.publish(ConnectionState::Reconnecting, attempt);
                    debug!(connection = self.id, attempt, ?delay, "reconnect scheduled");
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                ReconnectAction::GiveUp { attempts } => {
                    if self.publish(ConnectionState::Closed, attempts) {
                        let _ = self.events.send(ConnectionEvent::GaveUp { attempts });
                    }
                    warn!(connection = self.id, address = %self.address, attempts, "giving up on push channel");
                    return;
                }
            }
        }
    }

    /// Pump frames until the socket is lost or the connection is cancelled.
    async fn read(&mut self, transport: &mut dyn Transport) -> ReadExit {
        loop {
            let step = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return ReadExit::Cancelled,
                Some(text) = self.outbound.recv() => Step::Send(text),
                frame = transport.recv() => Step::Frame(frame),
            };

            match step {
                Step::Send(text) => {
                    if let Err(e) = transport.send(text).await {
                        debug!(connection = self.id, error = %e, "outbound frame dropped");
                    }
                }
                Step::Frame(Ok(Some(text))) => self.deliver(&text),
                Step::Frame(Ok(None)) => return ReadExit::Lost("closed by peer".to_string()),
                Step::Frame(Err(e)) => return ReadExit::Lost(e.to_string()),
            }
        }
    }

    /// Decode one frame and hand it to the owner; undecodable frames are dropped.
    fn deliver(&self, raw: &str) {
        match PushMessage::decode(raw) {
            Ok(message) => {
                if !self.cancel.is_cancelled() {
                    let _ = self.events.send(ConnectionEvent::Message(message));
                }
            }
            Err(e) if e.is_unknown_type() => {
                debug!(connection = self.id, error = %e, "ignoring frame");
            }
            Err(e) => {
                warn!(connection = self.id, error = %e, "dropping undecodable frame");
            }
        }
    }

    /// Publish a status unless the connection has been cancelled.
    ///
    /// Returns true if the status changed.
    fn publish(&self, state: ConnectionState, attempt: u32) -> bool {
        let next = ConnectionStatus::new(state, attempt);
        let cancel = &self.cancel;
        let changed = self.status.send_if_modified(|current| {
            if cancel.is_cancelled() || *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            debug!(connection = self.id, state = %state, attempt, "status");
            let _ = self.events.send(ConnectionEvent::Status(next));
        }
        changed
    }
}
