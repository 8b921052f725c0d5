use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter giving each concern latest-wins load semantics: a new
/// load begins a new generation, and a completing load may only touch
/// visible state while its generation is still the latest. Superseded
/// results arrive and are discarded.
#[derive(Default)]
pub struct Generation(AtomicU64);

impl Generation {
    pub fn begin(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.0.load(Ordering::SeqCst) == token
    }

    /// Supersedes any in-flight load without starting a new one.
    pub fn invalidate(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}
