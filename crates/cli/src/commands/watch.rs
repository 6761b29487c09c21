// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use sentinel_core::Incident;

use crate::cli::OutputFormat;
use crate::colors;
use crate::config::Config;
use crate::display::{
    format_connection, format_incident_change, format_incident_line, format_list_summary,
};
use crate::error::{Error, Result};
use crate::sync::{
    websocket_factory, ConnectionState, ConnectionStatus, SnapshotScope, SyncController,
    SyncFailure, SyncView,
};

use super::snapshot_source;

pub async fn run(
    config: &Config,
    tenant: &str,
    incident: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let snapshots = Arc::new(snapshot_source(config)?);
    let mut controller = SyncController::new(config.sync_config(), snapshots, websocket_factory());
    let scope = match incident {
        Some(id) => SnapshotScope::Incident(id),
        None => SnapshotScope::All,
    };

    let mut views = controller.watch();
    controller.subscribe(tenant, scope);

    let mut printer = WatchPrinter::new(
        format,
        config.reconnect.max_attempts,
        colors::should_colorize(),
    );
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        let view = views.borrow_and_update().clone();
        if let Some(attempts) = printer.render(&mut stdout, &mut stderr, &view)? {
            break Err(Error::LiveUpdatesUnavailable { attempts });
        }

        tokio::select! {
            _ = &mut ctrl_c => {
                info!(tenant, "interrupted");
                break Ok(());
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
            }
        }
    };

    controller.shutdown();
    outcome
}

/// One line of `--format json` output.
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum WatchRecord<'a> {
    Connection { state: &'static str, attempt: u32 },
    Incidents { incidents: &'a [Incident] },
    Incident { incident: &'a Incident },
    Error { message: String },
}

/// Renders successive views, printing only what changed.
pub(crate) struct WatchPrinter {
    format: OutputFormat,
    max_attempts: u32,
    color: bool,
    connection: Option<ConnectionStatus>,
    incident: Option<Incident>,
    list_shown: bool,
    error: Option<SyncFailure>,
}

impl WatchPrinter {
    pub(crate) fn new(format: OutputFormat, max_attempts: u32, color: bool) -> Self {
        WatchPrinter {
            format,
            max_attempts,
            color,
            connection: None,
            incident: None,
            list_shown: false,
            error: None,
        }
    }

    /// Print the differences between `view` and the last rendered view.
    ///
    /// Returns the attempt count once live updates are unavailable.
    pub(crate) fn render(
        &mut self,
        out: &mut impl Write,
        err: &mut impl Write,
        view: &SyncView,
    ) -> Result<Option<u32>> {
        let status = ConnectionStatus {
            state: view.connection,
            attempt: view.attempt,
        };
        if view.connection != ConnectionState::Idle && self.connection != Some(status) {
            self.connection = Some(status);
            match self.format {
                OutputFormat::Json => self.record(
                    out,
                    &WatchRecord::Connection {
                        state: status.state.as_str(),
                        attempt: status.attempt,
                    },
                )?,
                OutputFormat::Text => writeln!(
                    err,
                    "{}",
                    format_connection(status, self.max_attempts, self.color)
                )?,
            }
        }

        if view.scope == Some(SnapshotScope::All) && !view.loading && !self.list_shown {
            self.list_shown = true;
            if !matches!(view.error, Some(SyncFailure::Snapshot(_))) {
                match self.format {
                    OutputFormat::Json => self.record(
                        out,
                        &WatchRecord::Incidents {
                            incidents: view.incidents.as_slice(),
                        },
                    )?,
                    OutputFormat::Text => {
                        writeln!(out, "{}", format_list_summary(&view.incidents))?;
                        for incident in &view.incidents {
                            writeln!(out, "{}", format_incident_line(incident, self.color))?;
                        }
                    }
                }
            }
        }

        if let Some(incident) = &view.incident {
            if self.incident.as_ref() != Some(incident) {
                match self.format {
                    OutputFormat::Json => self.record(out, &WatchRecord::Incident { incident })?,
                    OutputFormat::Text => writeln!(
                        out,
                        "{}",
                        format_incident_change(self.incident.as_ref(), incident, self.color)
                    )?,
                }
                self.incident = Some(incident.clone());
            }
        }

        if view.error != self.error {
            self.error = view.error.clone();
            match &view.error {
                Some(SyncFailure::LiveUpdatesUnavailable { attempts }) => {
                    return Ok(Some(*attempts));
                }
                Some(failure) => match self.format {
                    OutputFormat::Json => self.record(
                        out,
                        &WatchRecord::Error {
                            message: failure.to_string(),
                        },
                    )?,
                    OutputFormat::Text => writeln!(err, "warning: {}", failure)?,
                },
                None => {}
            }
        }

        out.flush()?;
        Ok(None)
    }

    fn record(&self, out: &mut impl Write, record: &WatchRecord<'_>) -> Result<()> {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
