//! Last-request-wins cancellation for multi-step async operations.
//!
//! Each operation class (opening a folder, loading a session, ...) has a
//! generation counter. Starting an operation bumps the counter and hands out
//! a [`CancellationToken`] for the new generation; every older token of that
//! class becomes stale at that moment. After each await the operation checks
//! its token before committing anything, so a slow, superseded request can
//! never overwrite the result of a newer one. Stale results are dropped,
//! never queued or merged.

use log::debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Operation Classes
// ─────────────────────────────────────────────────────────────────────────────

/// Families of operations that supersede each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    /// Pick a folder, list it, set it as the workspace root
    OpenFolder,
    /// Load, migrate and recover a persisted session
    LoadSession,
}

impl OperationClass {
    const ALL: [OperationClass; 2] = [OperationClass::OpenFolder, OperationClass::LoadSession];

    fn index(self) -> usize {
        match self {
            OperationClass::OpenFolder => 0,
            OperationClass::LoadSession => 1,
        }
    }
}

/// Shared per-class state.
#[derive(Debug, Default)]
struct Slot {
    generation: AtomicU64,
    in_flight: AtomicBool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Cancellation Token
// ─────────────────────────────────────────────────────────────────────────────

/// Identifies one generation of an operation class.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    class: OperationClass,
    generation: u64,
    slot: Arc<Slot>,
}

impl CancellationToken {
    /// Whether this token still names the latest operation of its class.
    pub fn is_current(&self) -> bool {
        self.slot.generation.load(Ordering::SeqCst) == self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        !self.is_current()
    }

    pub fn class(&self) -> OperationClass {
        self.class
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Run `commit` only if this token is still current.
    ///
    /// Returns `None` (and does nothing) for a superseded operation.
    pub fn commit<T>(&self, commit: impl FnOnce() -> T) -> Option<T> {
        if self.is_current() {
            Some(commit())
        } else {
            debug!(
                "Dropping stale {:?} result (generation {})",
                self.class, self.generation
            );
            None
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Running Operation
// ─────────────────────────────────────────────────────────────────────────────

/// A started operation.
///
/// Dropping it (normally, early return, or because the future itself was
/// dropped) clears the class's in-flight flag, but only while its token is
/// still current: a superseded operation must not clear the flag its
/// successor raised.
#[derive(Debug)]
pub struct Operation {
    token: CancellationToken,
}

impl Operation {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_current(&self) -> bool {
        self.token.is_current()
    }
}

impl Drop for Operation {
    fn drop(&mut self) {
        if self.token.is_current() {
            self.token.slot.in_flight.store(false, Ordering::SeqCst);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Guard
// ─────────────────────────────────────────────────────────────────────────────

/// Hands out cancellation tokens per [`OperationClass`].
///
/// Cloning is cheap and clones share state.
#[derive(Debug, Clone)]
pub struct ConcurrencyGuard {
    slots: Arc<[Arc<Slot>; 2]>,
}

impl ConcurrencyGuard {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Default::default()),
        }
    }

    fn slot(&self, class: OperationClass) -> &Arc<Slot> {
        &self.slots[class.index()]
    }

    /// Start a new operation of `class`, cancelling any still-running one.
    pub fn begin(&self, class: OperationClass) -> Operation {
        let slot = self.slot(class);
        let generation = slot.generation.fetch_add(1, Ordering::SeqCst) + 1;
        slot.in_flight.store(true, Ordering::SeqCst);
        debug!("Started {:?} generation {}", class, generation);
        Operation {
            token: CancellationToken {
                class,
                generation,
                slot: Arc::clone(slot),
            },
        }
    }

    /// Token for the latest generation of `class`, without starting an
    /// operation.
    ///
    /// Work that depends on the result of an operation (e.g. expanding a
    /// directory of the tree a folder-open produced) commits through this
    /// token so it is dropped once a newer operation of `class` begins.
    pub fn snapshot(&self, class: OperationClass) -> CancellationToken {
        let slot = self.slot(class);
        CancellationToken {
            class,
            generation: slot.generation.load(Ordering::SeqCst),
            slot: Arc::clone(slot),
        }
    }

    /// Invalidate the running operation of `class` without starting a new one.
    pub fn cancel(&self, class: OperationClass) {
        let slot = self.slot(class);
        slot.generation.fetch_add(1, Ordering::SeqCst);
        slot.in_flight.store(false, Ordering::SeqCst);
    }

    /// Invalidate every running operation (e.g. on shutdown).
    pub fn cancel_all(&self) {
        for class in OperationClass::ALL {
            self.cancel(class);
        }
    }

    /// Whether an operation of `class` is still running.
    pub fn is_in_flight(&self, class: OperationClass) -> bool {
        self.slot(class).in_flight.load(Ordering::SeqCst)
    }
}

impl Default for ConcurrencyGuard {
    fn default() -> Self {
        Self::new()
    }
}
