// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sentinel - live incident tracking for the security operations backend.
//!
//! This crate provides the `sentinel` CLI and the synchronization core it
//! is built on: a tenant-scoped subscription that seeds incident state
//! from the REST API and keeps it current over a WebSocket push channel.
//!
//! # Main Components
//!
//! - [`sync::SyncController`] - Subscribes to a tenant and publishes [`sync::SyncView`] changes
//! - [`sync::TransportConnection`] - One push-channel connection with linear-backoff reconnect
//! - [`sync::HttpSnapshotSource`] - REST snapshot fetches
//! - [`Config`] - Endpoints and reconnect tuning
//! - [`Error`] - Error types for all operations
//!
//! # Following a tenant
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sentinel::sync::{websocket_factory, HttpSnapshotSource, SnapshotScope, SyncController};
//!
//! let config = Config::resolve(None)?;
//! let snapshots = Arc::new(HttpSnapshotSource::new(config.api_base(), config.request_timeout())?);
//! let mut controller = SyncController::new(config.sync_config(), snapshots, websocket_factory());
//! let mut views = controller.watch();
//! controller.subscribe("default-tenant", SnapshotScope::All);
//! while views.changed().await.is_ok() {
//!     println!("{:?}", views.borrow().incident);
//! }
//! ```

mod cli;
pub mod colors;
mod commands;
mod display;
mod env;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, OutputFormat, DEFAULT_TENANT};
pub use config::Config;
pub use error::{Error, Result};

use tracing_subscriber::EnvFilter;

/// Filter used when `SENTINEL_LOG` is unset.
///
/// Verbose mode opens up this crate's own targets only, so HTTP and
/// WebSocket internals stay quiet.
pub fn default_log_directive(verbose: bool) -> &'static str {
    if verbose {
        "warn,sentinel=debug,sentinel_core=debug"
    } else {
        "warn"
    }
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `SENTINEL_LOG` takes a full filter directive and overrides `verbose`.
pub fn init_tracing(verbose: bool) -> Result<()> {
    let filter = match env::log_filter() {
        Some(directive) => EnvFilter::try_new(&directive).map_err(|e| {
            Error::Logging(format!("invalid {} '{}': {}", env::vars::SENTINEL_LOG, directive, e))
        })?,
        None => EnvFilter::new(default_log_directive(verbose)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!env::no_color())
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}

/// Execute a CLI invocation. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.config.as_deref())?;
    match cli.command {
        Command::Watch {
            tenant,
            incident,
            format,
        } => commands::watch::run(&config, &tenant, incident, format).await,
        Command::List { tenant, format } => commands::list::run(&config, &tenant, format).await,
        Command::Show { id, tenant, format } => {
            commands::show::run(&config, &tenant, &id, format).await
        }
    }
}
