//! Time-throttled progress reporting for long-running passes.
//!
//! The clock is injected so tests can advance time without sleeping.

use std::time::{Duration, Instant};

use tracing::info;

/// Default minimum gap between two progress ticks.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(60);

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

// ── ProgressEvent / ProgressReporter ─────────────────────────────────────────

/// What a long-running pass tells its observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Started { total: usize },
    /// Emitted at most once per throttle interval.
    Tick {
        completed: usize,
        total: usize,
        percent: u8,
    },
    Finished { total: usize },
}

impl ProgressEvent {
    /// Build a tick, computing the whole-number percentage (rounded down).
    pub fn tick(completed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            (completed.saturating_mul(100) / total).min(100) as u8
        };
        ProgressEvent::Tick {
            completed,
            total,
            percent,
        }
    }
}

/// Receives progress events.
pub trait ProgressReporter {
    fn report(&mut self, event: ProgressEvent);
}

/// Logs progress through `tracing` at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Started { total } => {
                info!(
                    "Compiling song data for {} songs. Progress updates every minute.",
                    total
                );
            }
            ProgressEvent::Tick { percent, .. } => {
                info!("{}% of the way through", percent);
            }
            ProgressEvent::Finished { .. } => info!("...done!"),
        }
    }
}

/// Collects every event, for assertions.
impl ProgressReporter for Vec<ProgressEvent> {
    fn report(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}

// ── ProgressThrottle ──────────────────────────────────────────────────────────

/// Decides whether enough time has passed since the last report.
pub struct ProgressThrottle<C: Clock> {
    clock: C,
    interval: Duration,
    last: Instant,
}

impl<C: Clock> ProgressThrottle<C> {
    /// Start the throttle; the first tick is due one `interval` from now.
    pub fn new(clock: C, interval: Duration) -> Self {
        let last = clock.now();
        Self {
            clock,
            interval,
            last,
        }
    }

    /// Returns `true` (and restarts the interval) when a tick is due.
    pub fn should_report(&mut self) -> bool {
        let now = self.clock.now();
        if now.saturating_duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
