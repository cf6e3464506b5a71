//! Exponential backoff with reset, for retrying remote calls.
//!
//! A [`BackoffPolicy`] is immutable configuration. Each retry loop takes its own
//! [`Attempt`] so that concurrent loops never share delay state.

use std::time::Duration;

use anyhow::{ensure, Result};
use backoff::{backoff::Backoff, ExponentialBackoff};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::Cancelled;

/// Delay configuration of a retry loop.
///
/// There is no limit on the number of retries. Callers bound a loop by
/// cancelling its token.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    pub initial_delay_ms: u64,
    /// Ceiling of the un-jittered delay.
    pub max_delay_ms: u64,
    /// Growth factor applied after every failure.
    pub multiplier: f64,
    /// Relative randomization of each delay, in `[0, 1]`.
    #[serde(default)]
    pub jitter: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            max_delay_ms: 120_000,
            multiplier: 1.6,
            jitter: 0.2,
        }
    }
}

impl BackoffPolicy {
    /// Short initial delay and a low ceiling, for polling a local or trusted node.
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            initial_delay_ms: 100,
            max_delay_ms: 5_000,
            multiplier: 1.6,
            jitter: 0.2,
        }
    }

    /// Validates the policy.
    ///
    /// # Errors
    /// Returns an error if any delay parameter is out of range.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.initial_delay_ms > 0,
            "Initial backoff delay must be positive"
        );
        ensure!(
            self.max_delay_ms >= self.initial_delay_ms,
            "Max backoff delay ({}ms) cannot be below the initial delay ({}ms)",
            self.max_delay_ms,
            self.initial_delay_ms
        );
        ensure!(
            self.multiplier.is_finite() && self.multiplier >= 1.0,
            "Backoff multiplier must be at least 1, got {}",
            self.multiplier
        );
        ensure!(
            (0.0..=1.0).contains(&self.jitter),
            "Backoff jitter must be between 0 and 1, got {}",
            self.jitter
        );
        Ok(())
    }

    /// Starts a retry loop governed by `cancel`.
    #[must_use]
    pub fn new_attempt(&self, cancel: CancellationToken) -> Attempt {
        let initial = Duration::from_millis(self.initial_delay_ms);
        let max_delay = Duration::from_millis(self.max_delay_ms);

        Attempt {
            backoff: ExponentialBackoff {
                current_interval: initial,
                initial_interval: initial,
                randomization_factor: self.jitter,
                multiplier: self.multiplier,
                max_interval: max_delay,
                max_elapsed_time: None,
                ..ExponentialBackoff::default()
            },
            max_delay,
            cancel,
            failures: 0,
        }
    }
}

/// Delay state of one retry loop.
pub struct Attempt {
    backoff: ExponentialBackoff,
    max_delay: Duration,
    cancel: CancellationToken,
    failures: u32,
}

impl Attempt {
    /// Records a failure and waits out the next delay.
    ///
    /// Returns the delay waited.
    ///
    /// # Errors
    /// Returns [`Cancelled`] as soon as the token fires, without waiting out the delay.
    pub async fn failure(&mut self) -> Result<Duration, Cancelled> {
        self.failures = self.failures.saturating_add(1);
        // Never `None` without an elapsed-time limit.
        let delay = self.backoff.next_backoff().unwrap_or(self.max_delay);

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Cancelled),
            () = tokio::time::sleep(delay) => Ok(delay),
        }
    }

    /// Records a success, resetting the delay to its initial value.
    pub fn success(&mut self) {
        self.backoff.reset();
        self.failures = 0;
    }

    /// Consecutive failures since the last success.
    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.failures
    }
}
