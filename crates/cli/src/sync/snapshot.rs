// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot collaborator: authoritative incident state over REST.
//!
//! The push channel only carries changes. A subscription starts from a
//! snapshot fetched here, scoped to the same tenant as the channel.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::debug;

use sentinel_core::Incident;

/// Error type for snapshot fetches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// The request could not be sent or the response not read.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    /// The body was not the expected JSON shape.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The body decoded but breaks an incident invariant.
    #[error("invalid incident: {0}")]
    Invalid(String),
}

/// Boxed future returned by [`SnapshotSource`] methods.
pub type SnapshotFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, SnapshotError>> + Send + 'a>>;

/// What a subscription seeds itself with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotScope {
    /// A single incident; the tracked incident starts from it.
    Incident(String),
    /// The tenant's incident list; the tracked incident starts empty.
    All,
}

impl fmt::Display for SnapshotScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotScope::Incident(id) => write!(f, "incident {}", id),
            SnapshotScope::All => write!(f, "all incidents"),
        }
    }
}

/// Source of incident snapshots.
///
/// Object-safe so the controller can hold any implementation behind an
/// `Arc`; tests use an in-memory source.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Fetch one incident belonging to `tenant`.
    fn incident(&self, tenant: &str, id: &str) -> SnapshotFuture<'_, Incident>;

    /// Fetch every incident belonging to `tenant`, in server order.
    fn incidents(&self, tenant: &str) -> SnapshotFuture<'_, Vec<Incident>>;
}

/// Snapshot source backed by the incident REST API.
pub struct HttpSnapshotSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSnapshotSource {
    /// Create a source for `base_url` (for example `http://localhost:8000/api`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SnapshotError> {
        let base = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| SnapshotError::Request(format!("invalid api url '{}': {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(SnapshotError::Request(format!(
                "invalid api url '{}'",
                base_url
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SnapshotError::Request(e.to_string()))?;
        Ok(HttpSnapshotSource { client, base })
    }

    /// `GET` address of the incident list.
    pub fn incidents_url(&self) -> Url {
        self.endpoint(&["incidents"])
    }

    /// `GET` address of one incident. `id` is percent-encoded as a path segment.
    pub fn incident_url(&self, id: &str) -> Url {
        self.endpoint(&["incidents", id])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new` rejects cannot-be-a-base URLs, so segments are always available.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, tenant: &str) -> Result<T, SnapshotError> {
        debug!(%url, tenant, "fetching snapshot");
        let response = self
            .client
            .get(url.clone())
            .query(&[("tenant_id", tenant)])
            .send()
            .await
            .map_err(|e| SnapshotError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SnapshotError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SnapshotError::Request(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| SnapshotError::Decode(e.to_string()))
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn incident(&self, tenant: &str, id: &str) -> SnapshotFuture<'_, Incident> {
        let url = self.incident_url(id);
        let tenant = tenant.to_string();
        Box::pin(async move {
            let incident: Incident = self.get_json(url, &tenant).await?;
            check(&incident)?;
            Ok(incident)
        })
    }

    fn incidents(&self, tenant: &str) -> SnapshotFuture<'_, Vec<Incident>> {
        let url = self.incidents_url();
        let tenant = tenant.to_string();
        Box::pin(async move {
            let incidents: Vec<Incident> = self.get_json(url, &tenant).await?;
            for incident in &incidents {
                check(incident)?;
            }
            Ok(incidents)
        })
    }
}

/// Reject snapshots that break incident invariants.
pub fn check(incident: &Incident) -> Result<(), SnapshotError> {
    incident
        .validate()
        .map_err(|e| SnapshotError::Invalid(e.to_string()))
}
