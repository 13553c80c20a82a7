//! Shared test helpers.

use std::sync::{Mutex, MutexGuard, PoisonError};

static PROCESS_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests that touch process-global state: descriptor slots, the
/// descriptor table, the environment table, and the working directory.
///
/// Every test in a binary that uses this helper must take the lock, otherwise
/// the parallel runner can interleave descriptor allocation between them.
pub fn process_lock() -> MutexGuard<'static, ()> {
    PROCESS_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}
