//! Drives a run to a terminal status by polling on a fixed interval.
//!
//! Status transitions come exclusively from the runner; nothing is inferred
//! locally. A fixed interval (no backoff) is deliberate: runs are externally
//! bounded and short, and a fixed tick keeps the loop predictable. The clock
//! is injectable so tests run without real delays, and the loop is bounded and
//! cancellable so a runaway run cannot hold the caller forever.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::assistants::RunStatus;
use crate::error::SpendchartError;
use crate::runner::{JobHandle, JobRunner};

/// Sleep abstraction. Tests substitute a fake that returns instantly.
pub trait Clock {
    async fn sleep(&self, duration: Duration);
}

/// The real clock, backed by the tokio timer.
pub struct TokioClock;

impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Polls a run until it reaches a terminal status.
pub struct Poller<C = TokioClock> {
    interval: Duration,
    max_attempts: u32,
    retry_limit: u32,
    clock: C,
}

impl Poller<TokioClock> {
    pub fn new(interval: Duration, max_attempts: u32, retry_limit: u32) -> Self {
        Self::with_clock(interval, max_attempts, retry_limit, TokioClock)
    }
}

impl<C: Clock> Poller<C> {
    pub fn with_clock(interval: Duration, max_attempts: u32, retry_limit: u32, clock: C) -> Self {
        Self {
            interval,
            max_attempts,
            retry_limit,
            clock,
        }
    }

    /// Loop: sleep one interval, fetch the status, stop on the first terminal
    /// status observed (returned as-is; the caller decides what a failure
    /// terminal means).
    ///
    /// - Cancellation aborts the wait within one interval with
    ///   [`Cancelled`](SpendchartError::Cancelled) and issues no further fetches.
    /// - More than `retry_limit` consecutive fetch errors fail with
    ///   [`PollingFailed`](SpendchartError::PollingFailed); a successful fetch
    ///   resets the count.
    /// - `max_attempts` fetches without a terminal status fail with
    ///   [`PollTimeout`](SpendchartError::PollTimeout).
    pub async fn wait_until_terminal(
        &self,
        runner: &impl JobRunner,
        job: &JobHandle,
        cancel: &CancellationToken,
    ) -> Result<RunStatus, SpendchartError> {
        let mut consecutive_errors = 0u32;

        for _ in 0..self.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SpendchartError::Cancelled),
                _ = self.clock.sleep(self.interval) => {}
            }

            match runner.run_status(job).await {
                Ok(status) => {
                    consecutive_errors = 0;
                    if status.is_terminal() {
                        return Ok(status);
                    }
                }
                Err(source) => {
                    consecutive_errors += 1;
                    if consecutive_errors > self.retry_limit {
                        return Err(SpendchartError::PollingFailed {
                            attempts: consecutive_errors,
                            source,
                        });
                    }
                }
            }
        }

        Err(SpendchartError::PollTimeout(self.max_attempts))
    }
}
