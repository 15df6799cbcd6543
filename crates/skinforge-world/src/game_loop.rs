//! The game-loop actor: the only code that ever holds `&mut World`.
//!
//! The loop runs in its own Tokio task and communicates through an mpsc
//! channel, the same actor shape as any other single-owner state in the
//! stack. Outside code gets a cloneable [`MainThread`] handle and submits
//! closures to it.
//!
//! ```text
//!  async task ──run_task(f)──►┐
//!  async task ──call(f)──────►├─ mpsc ─► GameLoop ─ tick ─► f(&mut World)
//!  listener   ──run_task(f)──►┘
//! ```
//!
//! With a tick rate, tasks queue up and run at the start of the next tick,
//! in submission order. In event-driven mode (`tick_rate_hz == 0`) each
//! task runs as soon as the loop receives it.

use std::panic::{AssertUnwindSafe, catch_unwind};

use skinforge_tick::{TickConfig, TickScheduler};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::{World, WorldError};

type Task = Box<dyn FnOnce(&mut World) + Send + 'static>;

enum Command {
    Run(Task),
    Shutdown { reply: oneshot::Sender<()> },
}

/// Game-loop settings.
#[derive(Debug, Clone, Default)]
pub struct GameLoopConfig {
    pub tick: TickConfig,
}

impl GameLoopConfig {
    /// Tasks run on arrival; no tick timer.
    pub fn event_driven() -> Self {
        Self {
            tick: TickConfig::event_driven(),
        }
    }
}

/// Handle to the running game loop. Cheap to clone.
#[derive(Clone)]
pub struct MainThread {
    sender: mpsc::UnboundedSender<Command>,
}

impl MainThread {
    /// Schedules `f` on the main thread without waiting for it.
    ///
    /// # Errors
    /// [`WorldError::Unavailable`] if the loop has stopped.
    pub fn run_task<F>(&self, f: F) -> Result<(), WorldError>
    where
        F: FnOnce(&mut World) + Send + 'static,
    {
        self.sender
            .send(Command::Run(Box::new(f)))
            .map_err(|_| WorldError::Unavailable)
    }

    /// Runs `f` on the main thread and waits for its result.
    ///
    /// # Errors
    /// [`WorldError::Unavailable`] if the loop has stopped or `f` panicked.
    pub async fn call<F, R>(&self, f: F) -> Result<R, WorldError>
    where
        F: FnOnce(&mut World) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.run_task(move |world| {
            let _ = reply_tx.send(f(world));
        })?;
        reply_rx.await.map_err(|_| WorldError::Unavailable)
    }

    /// Asks the loop to finish queued tasks and stop.
    pub async fn shutdown(&self) -> Result<(), WorldError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(Command::Shutdown { reply: reply_tx })
            .map_err(|_| WorldError::Unavailable)?;
        reply_rx.await.map_err(|_| WorldError::Unavailable)
    }

    /// Whether the loop is still accepting tasks.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// The game-loop actor.
pub struct GameLoop {
    world: World,
    scheduler: TickScheduler,
    pending: Vec<Task>,
    receiver: mpsc::UnboundedReceiver<Command>,
}

impl GameLoop {
    /// Moves `world` into a new loop task.
    ///
    /// The join handle resolves to the world once the loop stops, which
    /// lets a shutdown path (or a test) inspect the final state.
    pub fn spawn(world: World, config: GameLoopConfig) -> (MainThread, JoinHandle<World>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = GameLoop {
            world,
            scheduler: TickScheduler::new(config.tick),
            pending: Vec::new(),
            receiver: rx,
        };
        let handle = tokio::spawn(actor.run());
        (MainThread { sender: tx }, handle)
    }

    async fn run(mut self) -> World {
        tracing::info!(
            server = self.world.server_package(),
            tick_rate_hz = self.scheduler.tick_rate_hz(),
            "game loop started"
        );

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(Command::Run(task)) => {
                        if self.scheduler.is_event_driven() {
                            self.execute(task);
                        } else {
                            self.pending.push(task);
                        }
                    }
                    Some(Command::Shutdown { reply }) => {
                        self.drain();
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        self.drain();
                        break;
                    }
                },
                _ = self.scheduler.wait_for_tick() => {
                    self.drain();
                    self.scheduler.record_tick_end();
                }
            }
        }

        tracing::info!(ticks = self.scheduler.tick_count(), "game loop stopped");
        self.world
    }

    fn drain(&mut self) {
        for task in std::mem::take(&mut self.pending) {
            self.execute(task);
        }
    }

    /// Runs one task. A panicking task is logged and the loop carries on.
    fn execute(&mut self, task: Task) {
        let world = &mut self.world;
        if catch_unwind(AssertUnwindSafe(|| task(world))).is_err() {
            tracing::error!("main-thread task panicked");
        }
    }
}
