//! Trailing-edge debouncing for persistence writes.
//!
//! Rapid successive save requests on the same channel collapse into one
//! write that fires `delay` after the last request. Channels are independent,
//! so a burst of window-resize events never delays a session save.

use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Logical persistence channels, each with its own timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersistChannel {
    /// Workspace session snapshot (tabs, folders)
    AppState,
    /// User preferences (config file)
    Preferences,
    /// Window geometry and chrome
    WindowState,
}

type Write = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Pending {
    generation: u64,
    write: Option<Write>,
}

/// Per-channel trailing-edge debouncer.
///
/// Scheduling spawns a tokio timer, so it must be called from within a
/// runtime.
#[derive(Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Arc<Mutex<HashMap<PersistChannel, Pending>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `write` on `channel`, replacing any write still pending there.
    pub fn schedule(&self, channel: PersistChannel, write: impl FnOnce() + Send + 'static) {
        let generation = {
            let mut pending = self.pending.lock();
            let slot = pending.entry(channel).or_default();
            slot.generation += 1;
            slot.write = Some(Box::new(write));
            slot.generation
        };

        let pending = Arc::clone(&self.pending);
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let write = {
                let mut pending = pending.lock();
                match pending.get_mut(&channel) {
                    Some(slot) if slot.generation == generation => slot.write.take(),
                    _ => None,
                }
            };
            if let Some(write) = write {
                debug!("Debounced {:?} write firing", channel);
                write();
            }
        });
    }

    /// Run the pending write on `channel` now. Returns whether one ran.
    pub fn flush(&self, channel: PersistChannel) -> bool {
        let write = {
            let mut pending = self.pending.lock();
            pending.get_mut(&channel).and_then(|slot| {
                slot.generation += 1;
                slot.write.take()
            })
        };
        match write {
            Some(write) => {
                write();
                true
            }
            None => false,
        }
    }

    /// Run every pending write now (used on shutdown).
    pub fn flush_all(&self) {
        for channel in [
            PersistChannel::AppState,
            PersistChannel::Preferences,
            PersistChannel::WindowState,
        ] {
            self.flush(channel);
        }
    }

    /// Drop the pending write on `channel` without running it.
    pub fn cancel(&self, channel: PersistChannel) {
        if let Some(slot) = self.pending.lock().get_mut(&channel) {
            slot.generation += 1;
            slot.write = None;
        }
    }

    pub fn has_pending(&self, channel: PersistChannel) -> bool {
        self.pending
            .lock()
            .get(&channel)
            .map(|slot| slot.write.is_some())
            .unwrap_or(false)
    }
}
