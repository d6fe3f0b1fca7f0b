//! Process-lifetime memo cells.
//!
//! Terminal identity and capabilities do not change while a process runs,
//! so a detector computes its answer once and keeps it until [`ProcessCache::reset`]
//! is called. There is no expiry and no size bound.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A single memoized value.
///
/// The lock is held while the value is computed, so two threads racing on
/// the first call produce exactly one computation and observe the same
/// value. A poisoned lock is recovered rather than propagated: the worst a
/// panicking initializer can leave behind is an empty cell.
#[derive(Debug)]
pub struct ProcessCache<T> {
    cell: Mutex<Option<T>>,
}

impl<T> Default for ProcessCache<T> {
    fn default() -> Self {
        Self {
            cell: Mutex::new(None),
        }
    }
}

impl<T: Clone> ProcessCache<T> {
    pub const fn new() -> Self {
        Self {
            cell: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached value, if any.
    pub fn get(&self) -> Option<T> {
        self.lock().clone()
    }

    /// Returns the cached value, computing and storing it on first use.
    pub fn get_or_insert_with(&self, init: impl FnOnce() -> T) -> T {
        let mut guard = self.lock();
        if let Some(value) = guard.as_ref() {
            return value.clone();
        }
        let value = init();
        *guard = Some(value.clone());
        value
    }

    /// Like [`get_or_insert_with`](Self::get_or_insert_with), but only a
    /// `Some` result is stored. A `None` leaves the cell empty so the next
    /// call tries again.
    pub fn get_or_try_insert_with(&self, init: impl FnOnce() -> Option<T>) -> Option<T> {
        let mut guard = self.lock();
        if let Some(value) = guard.as_ref() {
            return Some(value.clone());
        }
        let value = init()?;
        *guard = Some(value.clone());
        Some(value)
    }

    /// Clears the cell; the next call recomputes.
    pub fn reset(&self) {
        *self.lock() = None;
    }

    pub fn is_set(&self) -> bool {
        self.lock().is_some()
    }
}
