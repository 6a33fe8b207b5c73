// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retry logic for optimistic-concurrency conflicts.
//!
//! Only write conflicts are retried here: the read-modify-write is restarted from
//! a fresh read after a short, jittered, exponentially growing delay. Every other
//! error is returned immediately so the controller's own backoff handles it.

use crate::constants::MAX_CONFLICT_RETRIES;
use crate::errors::{RelocationError, Result};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

/// Initial retry interval (50ms)
const INITIAL_INTERVAL_MILLIS: u64 = 50;

/// Maximum interval between retries (2 seconds)
const MAX_INTERVAL_MILLIS: u64 = 2_000;

/// Backoff multiplier (exponential growth factor)
const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Randomization factor to prevent thundering herd (±10%)
const RANDOMIZATION_FACTOR: f64 = 0.1;

/// Simple exponential backoff implementation.
///
/// Provides exponential backoff with randomization (jitter) to prevent thundering herd.
pub struct ExponentialBackoff {
    /// Current interval duration
    pub current_interval: Duration,
    /// Initial interval duration
    pub initial_interval: Duration,
    /// Maximum interval duration
    pub max_interval: Duration,
    /// Backoff multiplier (typically 2.0 for doubling)
    pub multiplier: f64,
    /// Randomization factor (e.g., 0.1 for ±10%)
    pub randomization_factor: f64,
}

impl ExponentialBackoff {
    fn new(
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
        randomization_factor: f64,
    ) -> Self {
        Self {
            current_interval: initial_interval,
            initial_interval,
            max_interval,
            multiplier,
            randomization_factor,
        }
    }

    /// Get the next backoff interval and grow the following one.
    pub fn next_backoff(&mut self) -> Duration {
        let interval = self.current_interval;
        let jittered = self.apply_jitter(interval);

        let next = interval.as_secs_f64() * self.multiplier;
        self.current_interval = Duration::from_secs_f64(next).min(self.max_interval);

        jittered
    }

    fn apply_jitter(&self, interval: Duration) -> Duration {
        if self.randomization_factor == 0.0 {
            return interval;
        }

        let secs = interval.as_secs_f64();
        let delta = secs * self.randomization_factor;
        let jittered = rand::rng().random_range((secs - delta)..=(secs + delta));

        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Backoff used between conflicting read-modify-write attempts.
///
/// 50ms, 100ms, 200ms, 400ms, ... capped at 2s, ±10% jitter.
#[must_use]
pub fn conflict_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(
        Duration::from_millis(INITIAL_INTERVAL_MILLIS),
        Duration::from_millis(MAX_INTERVAL_MILLIS),
        BACKOFF_MULTIPLIER,
        RANDOMIZATION_FACTOR,
    )
}

/// Bookkeeping for one read-modify-write loop.
pub struct ConflictRetry {
    backoff: ExponentialBackoff,
    attempts: u32,
    max_attempts: u32,
}

impl Default for ConflictRetry {
    fn default() -> Self {
        Self::new(MAX_CONFLICT_RETRIES)
    }
}

impl ConflictRetry {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            backoff: conflict_backoff(),
            attempts: 0,
            max_attempts,
        }
    }

    /// Number of failed attempts recorded so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record a failed attempt on `kind` `name`.
    ///
    /// Returns the delay to wait before restarting from a fresh read.
    ///
    /// # Errors
    ///
    /// Returns `err` unchanged if it is not a write conflict, or
    /// [`RelocationError::ConflictRetriesExhausted`] once the attempt budget is spent.
    pub fn on_error(&mut self, err: RelocationError, kind: &str, name: &str) -> Result<Duration> {
        let is_conflict = matches!(&err, RelocationError::Store(e) if e.is_conflict());
        if !is_conflict {
            debug!(kind = kind, name = name, error = %err, "Non-conflict error, not retrying");
            return Err(err);
        }

        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            return Err(RelocationError::ConflictRetriesExhausted {
                kind: kind.to_string(),
                name: name.to_string(),
                attempts: self.attempts,
            });
        }

        let delay = self.backoff.next_backoff();
        warn!(
            kind = kind,
            name = name,
            attempt = self.attempts,
            retry_after = ?delay,
            "Write conflict, restarting read-modify-write"
        );
        Ok(delay)
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
