//! Fixed-rate poll scheduler for the Hostlink client loop.
//!
//! The connection core is tick-driven: something has to call its poll
//! operation at a steady rate. This crate provides that cadence as a
//! future usable inside a `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         tick_info = scheduler.wait_for_tick() => {
//!             endpoint.poll(clock.now_ms());
//!         }
//!     }
//! }
//! ```
//!
//! When the loop falls behind, missed ticks are skipped and the schedule
//! resumes from now. A poll pass is idempotent over elapsed time, so
//! catching up on missed ticks would only waste work.

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the poll scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Tick rate in Hz, clamped to `1..=128`.
    pub tick_rate_hz: u32,
    /// Random jitter (0–max µs) added before the first tick so several
    /// clients started at the same instant do not poll in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 30,
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    /// Maximum supported tick rate.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    /// Create a config for a specific tick rate with default jitter.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamp any out-of-range values so the config is safe to use.
    /// Called automatically by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz == 0 || self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick_rate_hz out of range; clamping"
            );
            self.tick_rate_hz = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
        }
        self
    }

    /// Duration of a single tick.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64)
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Information about a tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// Fixed delta time for this tick (always `1 / tick_rate`).
    pub dt: Duration,
    /// `true` if this tick fired late.
    pub overrun: bool,
    /// How many ticks were skipped due to overrun (0 normally).
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-rate scheduler. One per client loop.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Duration,
    tick_count: u64,
    /// When the next tick should fire.
    next_tick: TokioInstant,
    paused: bool,
}

impl TickScheduler {
    /// Create a new scheduler from config. The first tick is scheduled
    /// with optional jitter.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };
        let next_tick = TokioInstant::now() + tick_duration + jitter;

        debug!(
            rate_hz = config.tick_rate_hz,
            budget_ms = tick_duration.as_secs_f64() * 1000.0,
            "poll scheduler created"
        );

        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick,
            paused: false,
        }
    }

    /// Create a scheduler for a specific tick rate with default settings.
    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Wait until the next tick is due.
    ///
    /// When paused this future pends forever; `tokio::select!` still
    /// processes its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.paused {
            std::future::pending::<()>().await;
            unreachable!()
        }

        let next = self.next_tick;
        let tick_dur = self.tick_duration;
        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;

        // Overrun: woke up significantly (>10%) late.
        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > tick_dur / 10;
        let mut ticks_skipped = 0u64;
        if overrun {
            ticks_skipped = late_by.as_nanos() as u64 / tick_dur.as_nanos() as u64;
            if ticks_skipped > 0 {
                warn!(
                    tick = self.tick_count,
                    skipped = ticks_skipped,
                    late_ms = late_by.as_secs_f64() * 1000.0,
                    "tick overrun; skipping ahead"
                );
            }
        }

        // Always schedule from now, not from the missed deadline, so a
        // stall never produces a burst of catch-up polls.
        self.next_tick = now + tick_dur;

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: tick_dur,
            overrun,
            ticks_skipped,
        }
    }

    /// Pause the tick loop. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "poll scheduler paused");
        }
    }

    /// Resume after a pause. The next tick fires one tick duration from
    /// now, so time spent paused never produces catch-up polls.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = TokioInstant::now() + self.tick_duration;
            debug!(tick = self.tick_count, "poll scheduler resumed");
        }
    }

    /// Whether the scheduler is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The configured tick rate in Hz.
    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    /// The fixed tick duration.
    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }
}
