//! Scoped working-directory changes.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{FixtureError, Result};
use crate::temp::{Scope, TempDir};

/// Changes the process working directory to a fresh temporary directory and
/// restores the prior one on drop.
///
/// The owned [`TempDir`] is created with [`Scope::DeleteOnDrop`]; its removal
/// proceeds independently of the directory restore, which happens
/// unconditionally even if the temporary directory is already gone.
///
/// # Single-threaded contract
///
/// The working directory is process-global state; this guard takes no lock.
#[derive(Debug)]
pub struct TempWorkingDir {
    previous: PathBuf,
    dir: TempDir,
}

impl TempWorkingDir {
    /// Create a temporary directory and change into it.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be read, the
    /// temporary directory cannot be created, or the chdir fails. On failure
    /// the working directory is left unchanged.
    pub fn new() -> Result<Self> {
        let previous = env::current_dir().map_err(FixtureError::CurrentDir)?;
        let dir = TempDir::with_prefix("cwd", Scope::DeleteOnDrop)?;
        env::set_current_dir(dir.path()).map_err(|source| FixtureError::ChangeDir {
            path: dir.path().to_path_buf(),
            source,
        })?;
        Ok(Self { previous, dir })
    }

    /// The temporary directory the process changed into.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The working directory that will be restored on drop.
    #[must_use]
    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for TempWorkingDir {
    fn drop(&mut self) {
        if let Err(err) = env::set_current_dir(&self.previous) {
            tracing::warn!(
                path = %self.previous.display(),
                error = %err,
                "failed to restore working directory"
            );
        }
    }
}
