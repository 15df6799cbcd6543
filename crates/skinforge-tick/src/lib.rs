//! Timing primitives for Skinforge.
//!
//! - [`TickScheduler`] paces the backend's game loop at a fixed rate
//!   (20 Hz by default, the vanilla server rate). Work queued for the main
//!   thread is drained once per tick.
//! - [`RepeatingTask`] runs background housekeeping (cache sweeps) at a
//!   fixed interval, independent of the game loop.
//!
//! # Event-driven mode
//!
//! With `tick_rate_hz == 0`, [`TickScheduler::wait_for_tick`] pends forever
//! and the game loop runs each task as soon as it arrives. Tests use this
//! to avoid waiting on wall-clock ticks.

mod scheduler;
mod timer;

pub use scheduler::{TickConfig, TickInfo, TickScheduler};
pub use timer::RepeatingTask;
