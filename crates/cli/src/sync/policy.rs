// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnection schedule for the push channel.
//!
//! Backoff is linear: retry attempt `k` waits `k * base_delay`. Once the
//! attempt number exceeds `max_attempts` the policy gives up for good and
//! the connection stays closed until its owner explicitly reconnects.

use std::time::Duration;

/// What a connection should do after losing its socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectAction {
    /// Wait `delay`, then make retry attempt number `attempt`.
    Retry { attempt: u32, delay: Duration },
    /// Attempts are exhausted; no further timers may be scheduled.
    GiveUp { attempts: u32 },
}

/// Deterministic mapping from attempt number to backoff delay, plus a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    base_delay: Duration,
    max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy {
            base_delay: Duration::from_millis(2000),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// Create a policy with the given base delay and attempt cap.
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        ReconnectPolicy {
            base_delay,
            max_attempts,
        }
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry attempt `attempt` (1-based).
    pub fn next_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Whether retry attempt `attempt` (1-based) may be made at all.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_attempts
    }

    /// Decide what follows a lost socket, given the attempt about to be made.
    pub fn next_action(&self, attempt: u32) -> ReconnectAction {
        if self.should_retry(attempt) {
            ReconnectAction::Retry {
                attempt,
                delay: self.next_delay(attempt),
            }
        } else {
            ReconnectAction::GiveUp {
                attempts: attempt.saturating_sub(1),
            }
        }
    }
}
