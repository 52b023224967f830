//! Clock and timing utilities for export jobs.
//!
//! Every pipeline suspension point goes through this module so that it can
//! be interrupted by a [`CancellationToken`]:
//! - [`dwell`] holds a static frame for a fixed time
//! - [`FrameClock`] drives live frame redraws at a fixed cadence
//! - [`JobClock`] measures how long a job has been running

use std::time::{Duration, Instant};

use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::{TagreelError, TagreelResult};

/// A job clock that provides elapsed time relative to the moment an
/// export job started.
#[derive(Debug, Clone)]
pub struct JobClock {
    /// The instant the job started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl JobClock {
    /// Create a new job clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Seconds elapsed since the job started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at job start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }
}

/// Wait for `duration` unless the job is cancelled first.
pub async fn dwell(duration: Duration, cancel: &CancellationToken) -> TagreelResult<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TagreelError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

/// Fail with [`TagreelError::Cancelled`] if the token has fired.
pub fn ensure_not_cancelled(cancel: &CancellationToken) -> TagreelResult<()> {
    if cancel.is_cancelled() {
        return Err(TagreelError::Cancelled);
    }
    Ok(())
}

/// Fixed-cadence tick source.
///
/// The clock starts ticking on construction and stops when [`FrameClock::stop`]
/// consumes it or when it is dropped, so a clock can never be stopped twice
/// and never outlives the phase that started it.
#[derive(Debug)]
pub struct FrameClock {
    interval: Interval,
    period: Duration,
    ticks: u64,
}

impl FrameClock {
    /// Start a clock ticking every `period`. The first tick fires immediately.
    pub fn start(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            period,
            ticks: 0,
        }
    }

    /// Start a clock targeting the given rate in Hz.
    pub fn from_hz(hz: u32) -> Self {
        Self::start(Duration::from_nanos(1_000_000_000 / hz.max(1) as u64))
    }

    /// Wait for the next tick and return its sequence number (0-based).
    pub async fn tick(&mut self) -> u64 {
        self.interval.tick().await;
        let tick = self.ticks;
        self.ticks += 1;
        tick
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks delivered so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Stop the clock, returning the number of ticks delivered.
    pub fn stop(self) -> u64 {
        tracing::trace!(ticks = self.ticks, "Frame clock stopped");
        self.ticks
    }

    /// Invoke `on_tick` on every tick for `duration`, then stop the clock.
    ///
    /// Returns the number of ticks delivered. An error from `on_tick` or a
    /// cancellation stops the clock and is returned.
    pub async fn drive_for<F>(
        mut self,
        duration: Duration,
        cancel: &CancellationToken,
        mut on_tick: F,
    ) -> TagreelResult<u64>
    where
        F: FnMut(u64) -> TagreelResult<()>,
    {
        let deadline = tokio::time::sleep(duration);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TagreelError::Cancelled),
                _ = &mut deadline => break,
                tick = self.tick() => on_tick(tick)?,
            }
        }

        Ok(self.stop())
    }
}
