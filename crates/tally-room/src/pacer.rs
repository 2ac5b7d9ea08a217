//! Timing for the synthetic opponent.
//!
//! The pacer sits inside the room actor's `tokio::select!` loop next to
//! the command channel, so the bot's "sleep, then add a point" cycle
//! never blocks commands for this room or any other:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = receiver.recv() => { /* bind, add, disconnect */ }
//!         () = wait_for_pacer(pacer.as_ref()) => { /* bot's turn */ }
//!     }
//! }
//! ```

use tokio::time::{self, Instant};

use crate::BotConfig;

/// Schedules the synthetic opponent's increments.
pub(crate) struct BotPacer {
    config: BotConfig,
    next_tick: Instant,
}

impl BotPacer {
    /// Creates a pacer whose first tick is one random interval away.
    pub(crate) fn new(config: BotConfig) -> Self {
        let next_tick = Instant::now() + config.sample_interval();
        Self { config, next_tick }
    }

    pub(crate) fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Schedules the next tick one fresh random interval from now.
    pub(crate) fn reschedule(&mut self) {
        self.next_tick = Instant::now() + self.config.sample_interval();
        tracing::trace!(next_tick = ?self.next_tick, "bot tick scheduled");
    }
}

/// Resolves when the pacer's next tick is due.
///
/// Rooms without a synthetic opponent have no pacer; for them this
/// future pends forever and `select!` only ever sees commands.
pub(crate) async fn wait_for_pacer(pacer: Option<&BotPacer>) {
    match pacer {
        Some(pacer) => time::sleep_until(pacer.next_tick).await,
        None => std::future::pending::<()>().await,
    }
}
