use std::sync::{Mutex, MutexGuard, PoisonError};

/// Mutex-guarded integer tally.
///
/// Each operation is atomic on its own; a check followed by an update is not.
/// Callers that need compound atomicity must hold their own lock.
#[derive(Debug, Default)]
pub struct SharedCounter {
    value: Mutex<i64>,
}

impl SharedCounter {
    #[must_use]
    pub fn new(initial: i64) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }

    fn lock(&self) -> MutexGuard<'_, i64> {
        // an i64 cannot be left half-written, so a poisoned lock is still usable
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn get(&self) -> i64 {
        *self.lock()
    }

    pub fn increment_and_get(&self) -> i64 {
        let mut value = self.lock();
        *value += 1;
        *value
    }

    pub fn decrement_and_get(&self) -> i64 {
        let mut value = self.lock();
        *value -= 1;
        *value
    }
}
