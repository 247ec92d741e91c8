//! Periodic auto-save timer.

use log::{debug, warn};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// A single repeating timer.
///
/// Starting an already running timer is a no-op, stopping a stopped one is
/// safe, and dropping the timer stops it.
#[derive(Debug, Default)]
pub struct AutoSaveTimer {
    handle: Option<JoinHandle<()>>,
    interval: Option<Duration>,
}

impl AutoSaveTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `tick` every `interval`, first one `interval` from now.
    ///
    /// Returns `false` (and changes nothing) if the timer is already running.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, interval: Duration, tick: impl Fn() + Send + 'static) -> bool {
        if self.is_running() {
            debug!("Auto-save timer already running");
            return false;
        }
        if interval.is_zero() {
            warn!("Refusing to start auto-save with a zero interval");
            return false;
        }

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tick();
            }
        }));
        self.interval = Some(interval);
        debug!("Auto-save timer started ({:?})", interval);
        true
    }

    /// Stop the timer. Returns whether one was running.
    pub fn stop(&mut self) -> bool {
        self.interval = None;
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                debug!("Auto-save timer stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }
}

impl Drop for AutoSaveTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
