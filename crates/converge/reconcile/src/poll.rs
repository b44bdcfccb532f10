//! The generic wait primitive.
//!
//! Evaluates a predicate once right away, then again on every tick until it
//! settles or the timeout expires.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::clock::{Tick, Ticker};
use crate::config::PollConfig;
use crate::error::{ReconcileError, Result};
use crate::predicate::Predicate;

/// How a wait ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The predicate was satisfied.
    Converged { attempts: u32, elapsed: Duration },

    /// The timeout expired first. Not an error: callers decide whether
    /// giving up counts as a failure.
    TimedOut { attempts: u32, elapsed: Duration },
}

impl WaitOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, WaitOutcome::Converged { .. })
    }

    /// Number of predicate evaluations performed.
    pub fn attempts(&self) -> u32 {
        match self {
            WaitOutcome::Converged { attempts, .. } | WaitOutcome::TimedOut { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            WaitOutcome::Converged { elapsed, .. } | WaitOutcome::TimedOut { elapsed, .. } => {
                *elapsed
            }
        }
    }
}

/// Wait until `predicate` is satisfied.
///
/// The predicate is evaluated before the first tick, so an already
/// converged remote state returns without waiting. Predicate errors are
/// returned immediately and never retried. Cancellation is observed both
/// while evaluating and while waiting for the next tick.
pub async fn wait<P>(
    predicate: &mut P,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<WaitOutcome>
where
    P: Predicate + ?Sized,
{
    config.validate()?;

    let mut ticker = Ticker::start(config.tick_interval(), config.timeout());
    let mut attempts = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(ReconcileError::Cancelled);
        }

        attempts += 1;
        trace!(attempt = attempts, "Evaluating predicate");

        let satisfied = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ReconcileError::Cancelled),
            result = predicate.evaluate() => result?,
        };

        if satisfied {
            return Ok(WaitOutcome::Converged {
                attempts,
                elapsed: ticker.elapsed(),
            });
        }

        let tick = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ReconcileError::Cancelled),
            tick = ticker.next() => tick,
        };

        if tick == Tick::Expired {
            debug!(
                attempts,
                timeout_secs = config.timeout_secs,
                "Wait timed out before predicate was satisfied"
            );
            return Ok(WaitOutcome::TimedOut {
                attempts,
                elapsed: ticker.elapsed(),
            });
        }
    }
}
