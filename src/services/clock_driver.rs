//! Background task feeding one-second ticks to a running round clock.

use std::{future::Future, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

/// Owns the ticking task of one clock epoch; dropping it aborts the task.
pub struct ClockDriver {
    epoch: u64,
    task: Option<JoinHandle<()>>,
}

impl ClockDriver {
    /// Tick every second, starting one second from now, until `on_tick` returns `false`.
    pub fn spawn<F, Fut>(epoch: u64, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send,
    {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !on_tick().await {
                    break;
                }
            }
            debug!(epoch, "clock driver finished");
        });

        Self {
            epoch,
            task: Some(task),
        }
    }

    /// Clock epoch this driver ticks for.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Release the task without aborting it, letting it wind down on its own.
    ///
    /// Used from inside the task itself, which must not abort its own
    /// remaining work.
    pub fn detach(mut self) {
        self.task.take();
    }
}

impl Drop for ClockDriver {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
