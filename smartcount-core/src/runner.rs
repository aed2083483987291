//! The single control loop that owns the controller.

use crate::controller::{ClockEvent, Command, CountdownController};
use crate::source::TimeSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default tick period in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Sending half of the runner's command channel
pub type CommandSender = mpsc::Sender<Command>;

/// Drives a [`CountdownController`] from a periodic tick and a command channel.
///
/// Commands and ticks are handled one at a time by the same task, so the
/// program and run state are never observed mid-update.
pub struct ClockRunner {
    controller: CountdownController,
    commands: mpsc::Receiver<Command>,
    time_source: Arc<dyn TimeSource>,
    tick_interval: Duration,
    cancel_token: CancellationToken,
}

impl ClockRunner {
    /// Create a new runner and the sender used to feed it commands
    ///
    /// # Arguments
    /// * `controller` - Controller to drive; returned again when the runner stops
    /// * `time_source` - Wall clock sampled on every tick and command
    /// * `tick_interval_ms` - Tick period in milliseconds (0 is treated as 1)
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    pub fn new(
        controller: CountdownController,
        time_source: Arc<dyn TimeSource>,
        tick_interval_ms: u64,
        cancel_token: Option<CancellationToken>,
    ) -> (Self, CommandSender) {
        let (tx, rx) = mpsc::channel(32);
        let runner = Self {
            controller,
            commands: rx,
            time_source,
            tick_interval: Duration::from_millis(tick_interval_ms.max(1)),
            cancel_token: cancel_token.unwrap_or_default(),
        };
        (runner, tx)
    }

    /// Subscribe to the controller's events
    pub fn subscribe(&self) -> broadcast::Receiver<ClockEvent> {
        self.controller.subscribe()
    }

    /// Get a clone of the cancellation token
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Start the loop in a background task
    #[must_use]
    pub fn start(self) -> tokio::task::JoinHandle<CountdownController> {
        tokio::spawn(self.run())
    }

    /// Run until cancelled or until every command sender is dropped.
    ///
    /// Returns the controller so callers can inspect the final state.
    pub async fn run(mut self) -> CountdownController {
        info!(
            "Starting clock runner (tick: {}ms, time source: {})",
            self.tick_interval.as_millis(),
            self.time_source.name()
        );

        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!("Clock runner shutting down gracefully");
                    break;
                }
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        info!("Command channel closed, stopping clock runner");
                        break;
                    };
                    self.handle(command);
                }
                _ = interval.tick() => {
                    self.controller.tick(self.time_source.now());
                }
            }
        }

        self.controller
    }

    fn handle(&mut self, command: Command) {
        let now = self.time_source.now();
        if let Err(e) = self.controller.apply(command.clone(), now) {
            warn!("Rejected {:?}: {}", command, e);
            self.controller.emit_error(e.to_string());
        }
    }
}
