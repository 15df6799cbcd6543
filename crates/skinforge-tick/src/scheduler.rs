//! Fixed-rate tick pacing for the game loop.
//!
//! Paces the loop the way a vanilla server paces itself:
//!
//! - A tick that wakes up a little late still runs, and the next one is
//!   planned from where this one *should* have fired. Short hiccups are
//!   caught up with back-to-back ticks.
//! - Once the loop is more than [`TickConfig::max_catch_up`] behind, it
//!   gives up on the missed ticks, plans the next one from now and logs a
//!   "can't keep up" warning (rate limited).
//!
//! Sits inside the game loop's `tokio::select!`:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(task) = task_rx.recv() => pending.push(task),
//!         _ = scheduler.wait_for_tick() => {
//!             for task in pending.drain(..) { task(&mut world); }
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

/// How many recent ticks [`TickScheduler::average_tick_time`] averages.
const TICK_TIME_WINDOW: usize = 100;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Game-loop pacing.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Ticks per second. 0 disables ticking: the loop runs tasks on arrival.
    pub tick_rate_hz: u32,
    /// How far behind the loop may fall before missed ticks are dropped
    /// instead of caught up.
    pub max_catch_up: Duration,
    /// Minimum gap between two "can't keep up" warnings.
    pub overload_warn_interval: Duration,
    /// Random delay (0..max µs) added to the first tick only, so backends
    /// started together don't tick in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: Self::VANILLA_TICK_RATE_HZ,
            max_catch_up: Duration::from_secs(2),
            overload_warn_interval: Duration::from_secs(15),
            initial_jitter_us: 2_000,
        }
    }
}

impl TickConfig {
    /// The rate a vanilla Minecraft server ticks at.
    pub const VANILLA_TICK_RATE_HZ: u32 = 20;

    /// Highest accepted rate.
    pub const MAX_TICK_RATE_HZ: u32 = 100;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// No ticks; tasks run on arrival.
    pub fn event_driven() -> Self {
        Self::with_rate(0)
    }

    /// Clamps out-of-range values. Called by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick_rate_hz too high, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        if let Some(tick) = self.tick_duration() {
            self.max_catch_up = self.max_catch_up.max(tick);
        }
        self
    }

    /// Length of one tick. `None` when event-driven.
    pub fn tick_duration(&self) -> Option<Duration> {
        (self.tick_rate_hz > 0).then(|| Duration::from_secs(1) / self.tick_rate_hz)
    }
}

/// Returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Fixed tick length.
    pub dt: Duration,
    /// How late this tick fired relative to its plan.
    pub behind: Duration,
    /// Ticks dropped because the loop fell too far behind.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Paces one game loop.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Option<Duration>,
    tick_count: u64,
    next_tick: Option<TokioInstant>,
    /// Set by `wait_for_tick`, consumed by `record_tick_end`.
    tick_start: Option<Instant>,
    tick_times: VecDeque<Duration>,
    ticks_skipped: u64,
    last_overload_warning: Option<TokioInstant>,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();

        let next_tick = tick_duration.map(|d| {
            let jitter = match config.initial_jitter_us {
                0 => Duration::ZERO,
                max => Duration::from_micros(rand::rng().random_range(0..max)),
            };
            TokioInstant::now() + d + jitter
        });

        match tick_duration {
            None => debug!("tick scheduler is event-driven"),
            Some(d) => debug!(
                rate_hz = config.tick_rate_hz,
                tick_ms = d.as_millis() as u64,
                "tick scheduler created"
            ),
        }

        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick,
            tick_start: None,
            tick_times: VecDeque::with_capacity(TICK_TIME_WINDOW),
            ticks_skipped: 0,
            last_overload_warning: None,
        }
    }

    /// Waits until the next tick is due.
    ///
    /// Never resolves when event-driven, which leaves the other `select!`
    /// branches to do the work.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (planned, tick) = match (self.next_tick, self.tick_duration) {
            (Some(planned), Some(tick)) => (planned, tick),
            _ => std::future::pending().await,
        };

        time::sleep_until(planned).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let behind = now.saturating_duration_since(planned);
        let mut ticks_skipped = 0;
        self.next_tick = Some(if behind > self.config.max_catch_up {
            ticks_skipped = (behind.as_nanos() / tick.as_nanos()) as u64;
            self.ticks_skipped += ticks_skipped;
            self.warn_overloaded(now, behind, ticks_skipped);
            now + tick
        } else {
            planned + tick
        });

        trace!(tick = self.tick_count, behind_us = behind.as_micros() as u64, "tick");

        TickInfo {
            tick: self.tick_count,
            dt: tick,
            behind,
            ticks_skipped,
        }
    }

    fn warn_overloaded(&mut self, now: TokioInstant, behind: Duration, ticks: u64) {
        let due = self
            .last_overload_warning
            .is_none_or(|last| now.duration_since(last) >= self.config.overload_warn_interval);
        if due {
            warn!(
                behind_ms = behind.as_millis() as u64,
                ticks,
                "can't keep up, is the server overloaded? skipping ticks"
            );
            self.last_overload_warning = Some(now);
        }
    }

    /// Records that the work for the current tick is done. A no-op if no
    /// tick is in progress.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        if self.tick_times.len() == TICK_TIME_WINDOW {
            self.tick_times.pop_front();
        }
        self.tick_times.push_back(start.elapsed());
    }

    pub fn is_event_driven(&self) -> bool {
        self.tick_duration.is_none()
    }

    /// Configured rate (0 when event-driven).
    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    /// Ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_duration(&self) -> Option<Duration> {
        self.tick_duration
    }

    /// Ticks dropped so far because the loop fell too far behind.
    pub fn ticks_skipped(&self) -> u64 {
        self.ticks_skipped
    }

    /// Mean work time over the last 100 ticks ("mspt").
    pub fn average_tick_time(&self) -> Duration {
        match self.tick_times.len() {
            0 => Duration::ZERO,
            n => self.tick_times.iter().sum::<Duration>() / n as u32,
        }
    }
}
