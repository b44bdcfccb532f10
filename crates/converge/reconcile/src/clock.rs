//! Tick and timeout timers for polling.
//!
//! Built on tokio's clock, so tests drive it with a paused runtime
//! (`#[tokio::test(start_paused = true)]`) instead of a hand-rolled fake.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior, Sleep};

/// Longest span the ticker schedules ahead. Longer tick intervals and
/// timeouts are clamped to it so the deadline arithmetic cannot overflow.
pub const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// What woke the ticker up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Time to check again.
    Check,

    /// The overall timeout expired.
    Expired,
}

/// Periodic "check now" signal paired with a single deadline.
///
/// Both timers are owned by the ticker and released when it is dropped.
pub struct Ticker {
    interval: Interval,
    deadline: Pin<Box<Sleep>>,
    started_at: Instant,
}

impl Ticker {
    /// Start a ticker. The first tick fires one full `tick_interval` from now.
    ///
    /// `tick_interval` must be non-zero. Both durations are clamped to
    /// [`FAR_FUTURE`].
    pub fn start(tick_interval: Duration, timeout: Duration) -> Self {
        let tick_interval = tick_interval.min(FAR_FUTURE);
        let timeout = timeout.min(FAR_FUTURE);

        let started_at = Instant::now();
        let mut interval = interval_at(started_at + tick_interval, tick_interval);
        // A slow status fetch delays the next check rather than bunching them up.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            interval,
            deadline: Box::pin(sleep_until(started_at + timeout)),
            started_at,
        }
    }

    /// Wait for the next tick or the deadline, whichever comes first.
    ///
    /// The deadline wins when both are due at the same instant.
    pub async fn next(&mut self) -> Tick {
        tokio::select! {
            biased;
            _ = &mut self.deadline => Tick::Expired,
            _ = self.interval.tick() => Tick::Check,
        }
    }

    /// Time since the ticker was started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_until_deadline() {
        let mut ticker = Ticker::start(Duration::from_secs(10), Duration::from_secs(35));

        assert_eq!(ticker.next().await, Tick::Check);
        assert_eq!(ticker.elapsed(), Duration::from_secs(10));
        assert_eq!(ticker.next().await, Tick::Check);
        assert_eq!(ticker.next().await, Tick::Check);
        assert_eq!(ticker.next().await, Tick::Expired);
        assert_eq!(ticker.elapsed(), Duration::from_secs(35));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_wins_tie() {
        let mut ticker = Ticker::start(Duration::from_secs(10), Duration::from_secs(20));

        assert_eq!(ticker.next().await, Tick::Check);
        assert_eq!(ticker.next().await, Tick::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_check_delays_next_tick() {
        let mut ticker = Ticker::start(Duration::from_secs(10), Duration::from_secs(3600));

        assert_eq!(ticker.next().await, Tick::Check);
        tokio::time::sleep(Duration::from_secs(25)).await;

        // Overdue tick fires at once, the following one a full period later.
        assert_eq!(ticker.next().await, Tick::Check);
        assert_eq!(ticker.elapsed(), Duration::from_secs(35));
        assert_eq!(ticker.next().await, Tick::Check);
        assert_eq!(ticker.elapsed(), Duration::from_secs(45));
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_durations_are_clamped() {
        let mut ticker = Ticker::start(Duration::from_secs(u64::MAX), Duration::from_secs(60));
        assert_eq!(ticker.next().await, Tick::Expired);
        assert_eq!(ticker.elapsed(), Duration::from_secs(60));

        let mut ticker = Ticker::start(Duration::from_secs(10), Duration::from_secs(u64::MAX));
        assert_eq!(ticker.next().await, Tick::Check);
        assert_eq!(ticker.elapsed(), Duration::from_secs(10));
    }
}
