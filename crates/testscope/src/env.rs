//! Scoped environment-variable isolation.

use std::env;
use std::ffi::OsString;

/// Snapshots the whole process environment and restores it on drop.
///
/// The drop handler performs a set-difference restoration: variables added
/// inside the scope are removed, removed variables are restored, and mutated
/// variables are reverted, leaving the environment byte-for-byte identical to
/// the one observed at construction.
///
/// Nested guards restore in reverse construction order, since each guard
/// restores to the environment it observed at its own construction.
///
/// # Single-threaded contract
///
/// The environment table is process-global state. The guard takes no lock;
/// mutating or reading the environment from another thread while a guard is
/// alive (in particular, during its drop) is the caller's responsibility to
/// prevent, matching the safety contract of [`std::env::set_var`].
#[derive(Debug)]
pub struct EnvGuard {
    snapshot: Vec<(OsString, OsString)>,
}

impl EnvGuard {
    /// Snapshot the current environment.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: env::vars_os().collect(),
        }
    }

    /// The number of variables in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }
}

impl Default for EnvGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        let added: Vec<OsString> = env::vars_os()
            .map(|(key, _)| key)
            .filter(|key| !self.snapshot.iter().any(|(k, _)| k == key))
            .collect();
        for key in added {
            // SAFETY: single-threaded use is the documented contract of this
            // guard; no other thread touches the environment during drop.
            unsafe { env::remove_var(&key) };
        }
        for (key, value) in &self.snapshot {
            // SAFETY: as above.
            unsafe { env::set_var(key, value) };
        }
    }
}
