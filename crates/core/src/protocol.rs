// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push-channel frames sent by the backend to subscribed clients.
//!
//! Every frame is a JSON text message of the form:
//!
//! ```text
//! { "type": "<KIND>", "payload": <depends on KIND> }
//! ```
//!
//! Only `INCIDENT_UPDATE` is understood. Anything else decodes to
//! [`DecodeError::UnknownType`] so a newer backend can introduce message
//! kinds without breaking older clients; callers drop such frames.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Error;
use crate::incident::Incident;

/// Wire discriminator for [`PushMessage::IncidentUpdate`].
pub const INCIDENT_UPDATE: &str = "INCIDENT_UPDATE";

/// Messages pushed from the backend over the incident channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum PushMessage {
    /// The complete current state of an incident.
    ///
    /// Replaces any previously tracked value outright.
    #[serde(rename = "INCIDENT_UPDATE")]
    IncidentUpdate(Incident),
}

/// Why a frame could not be turned into a [`PushMessage`].
///
/// None of these are fatal: the frame is dropped and tracked state is left
/// untouched.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not JSON, or JSON without a string `type` field.
    #[error("malformed frame: {0}")]
    Malformed(serde_json::Error),

    /// Well-formed envelope with a discriminator this client does not know.
    #[error("unknown frame type: {0}")]
    UnknownType(String),

    /// Known discriminator but the payload does not have the expected shape.
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        source: serde_json::Error,
    },

    /// Payload decoded but violates an invariant (e.g. confidence range).
    #[error("rejected {kind} payload: {source}")]
    Rejected { kind: &'static str, source: Error },
}

impl DecodeError {
    /// True for frames that are simply newer than this client.
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, DecodeError::UnknownType(_))
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

impl PushMessage {
    /// Creates an IncidentUpdate message.
    pub fn incident_update(incident: Incident) -> Self {
        PushMessage::IncidentUpdate(incident)
    }

    /// Returns the wire discriminator of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            PushMessage::IncidentUpdate(_) => INCIDENT_UPDATE,
        }
    }

    /// Decodes and validates one raw text frame.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let envelope: Envelope = serde_json::from_str(raw).map_err(DecodeError::Malformed)?;

        match envelope.kind.as_str() {
            INCIDENT_UPDATE => {
                let incident: Incident =
                    serde_json::from_value(envelope.payload).map_err(|source| {
                        DecodeError::InvalidPayload {
                            kind: INCIDENT_UPDATE,
                            source,
                        }
                    })?;
                incident.validate().map_err(|source| DecodeError::Rejected {
                    kind: INCIDENT_UPDATE,
                    source,
                })?;
                Ok(PushMessage::IncidentUpdate(incident))
            }
            _ => Err(DecodeError::UnknownType(envelope.kind)),
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
