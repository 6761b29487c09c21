// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Real-time incident synchronization.
//!
//! Keeps a tenant's incident state current by combining a REST snapshot
//! with updates pushed over a WebSocket channel.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  Controller  │────►│  Connection  │────►│  Transport  │──► push server
//! │(SyncControl.)│◄────│ (reconnects) │◄────│   (trait)   │◄── /ws/incidents/{tenant}
//! └──────────────┘     └──────────────┘     └─────────────┘
//!        │    ▲
//!        ▼    │
//! ┌──────────────┐
//! │   Snapshot   │──► REST API (GET /incidents, GET /incidents/{id})
//! │   (trait)    │
//! └──────────────┘
//! ```
//!
//! # Features
//!
//! - One live connection per subscribed tenant
//! - Linear backoff reconnect with a hard attempt cap
//! - Last-write-wins replacement of the tracked incident
//! - Unrecognized push frames are dropped, never fatal
//! - Tenant switch and teardown cancel all pending work at once
//! - Injectable transport and snapshot traits for testing
//!
//! There is no heartbeat. A socket the network drops without a close
//! frame stays [`ConnectionState::Open`] until the OS reports an error.

mod connection;
mod controller;
mod policy;
mod snapshot;
mod transport;

pub use connection::{
    ConnectionEvent, ConnectionEvents, ConnectionId, ConnectionState, ConnectionStatus,
    TransportConnection,
};
pub use controller::{SyncConfig, SyncController, SyncFailure, SyncView};
pub use policy::{ReconnectAction, ReconnectPolicy};
pub use snapshot::{HttpSnapshotSource, SnapshotError, SnapshotFuture, SnapshotScope, SnapshotSource};
pub use transport::{
    websocket_factory, Transport, TransportError, TransportFactory, TransportFuture, TransportResult,
    WebSocketTransport,
};

#[cfg(test)]
mod test_helpers;


#[cfg(test)]
mod controller_tests;
