//! Scoped temporary files and directories.
//!
//! [`TempFile`] and [`TempDir`] own a uniquely-named filesystem object and
//! remove it when they go out of scope. Uniqueness comes from a random
//! alphanumeric suffix combined with create-new semantics, retried a bounded
//! number of times.

use std::fs::{self, File, OpenOptions};
use std::io;
#[cfg(unix)]
use std::os::unix::io::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::path::{Path, PathBuf};

use rand::Rng;
use rand::distr::Alphanumeric;

use crate::error::{FixtureError, Result};

/// Length of the random suffix appended to generated names.
const SUFFIX_LEN: usize = 12;

/// How many candidate names to try before giving up.
const MAX_ATTEMPTS: u32 = 16;

/// Generate a candidate path under `parent`.
///
/// The file name is `prefix.SUFFIX` (or just `SUFFIX` for an empty prefix),
/// where SUFFIX is [`SUFFIX_LEN`] random alphanumeric characters.
fn candidate_path(prefix: &str, parent: &Path) -> PathBuf {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();
    if prefix.is_empty() {
        parent.join(suffix)
    } else {
        parent.join(format!("{prefix}.{suffix}"))
    }
}

/// A uniquely-named file that is unlinked when dropped.
///
/// The file is created eagerly in the constructor and stays open for the
/// lifetime of the value. Dropping a `TempFile` closes the descriptor and
/// unlinks the path; unlink failures are logged, never propagated.
pub struct TempFile {
    path: PathBuf,
    file: Option<File>,
}

impl std::fmt::Debug for TempFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempFile")
            .field("path", &self.path)
            .field("open", &self.file.is_some())
            .finish()
    }
}

impl TempFile {
    /// Create a temporary file under the system temp root.
    pub fn new() -> Result<Self> {
        Self::with_prefix_in("", std::env::temp_dir())
    }

    /// Create a temporary file under the system temp root whose name starts
    /// with `prefix`.
    pub fn with_prefix(prefix: &str) -> Result<Self> {
        Self::with_prefix_in(prefix, std::env::temp_dir())
    }

    /// Create a temporary file under `parent` whose name starts with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` does not exist, is not a directory, or is
    /// not writable, or if every generated candidate name already existed.
    pub fn with_prefix_in(prefix: &str, parent: impl AsRef<Path>) -> Result<Self> {
        let parent = parent.as_ref();
        for _ in 0..MAX_ATTEMPTS {
            let path = candidate_path(prefix, parent);
            match OpenOptions::new()
                .read(true)
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(file) => {
                    return Ok(Self {
                        path,
                        file: Some(file),
                    });
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(source) => return Err(FixtureError::CreateTempFile { path, source }),
            }
        }
        Err(FixtureError::UniqueNameExhausted {
            parent: parent.to_path_buf(),
        })
    }

    /// The path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the descriptor is still open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// The open file handle.
    ///
    /// # Panics
    ///
    /// Panics if the descriptor was closed with [`TempFile::close`].
    #[must_use]
    pub fn as_file(&self) -> &File {
        self.file.as_ref().expect("temporary file already closed")
    }

    /// Close the descriptor without unlinking the file.
    ///
    /// Idempotent: calling this more than once is a no-op.
    pub fn close(&mut self) {
        self.file = None;
    }
}

#[cfg(unix)]
impl AsFd for TempFile {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.as_file().as_fd()
    }
}

#[cfg(unix)]
impl AsRawFd for TempFile {
    fn as_raw_fd(&self) -> RawFd {
        self.as_file().as_raw_fd()
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        self.close();
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to unlink temporary file"
                );
            }
        }
    }
}

/// Retention policy for a [`TempDir`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Leave the directory on disk after the scope ends, for inspection.
    Permanent,
    /// Recursively remove the directory and its contents on drop.
    DeleteOnDrop,
}

/// A uniquely-named directory with a configurable retention policy.
///
/// The directory exists immediately after construction. With
/// [`Scope::DeleteOnDrop`] the whole tree is removed on drop; removal
/// failures are logged, never propagated.
#[derive(Debug)]
pub struct TempDir {
    path: PathBuf,
    scope: Scope,
}

impl TempDir {
    /// Create a temporary directory under the system temp root.
    pub fn new(scope: Scope) -> Result<Self> {
        Self::with_prefix_in("", std::env::temp_dir(), scope)
    }

    /// Create a temporary directory under the system temp root whose name
    /// starts with `prefix`.
    pub fn with_prefix(prefix: &str, scope: Scope) -> Result<Self> {
        Self::with_prefix_in(prefix, std::env::temp_dir(), scope)
    }

    /// Create a temporary directory under `parent` whose name starts with
    /// `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` does not exist, is not a directory, or is
    /// not writable, or if every generated candidate name already existed.
    pub fn with_prefix_in(prefix: &str, parent: impl AsRef<Path>, scope: Scope) -> Result<Self> {
        let parent = parent.as_ref();
        for _ in 0..MAX_ATTEMPTS {
            let path = candidate_path(prefix, parent);
            match fs::create_dir(&path) {
                Ok(()) => return Ok(Self { path, scope }),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(source) => return Err(FixtureError::CreateTempDir { path, source }),
            }
        }
        Err(FixtureError::UniqueNameExhausted {
            parent: parent.to_path_buf(),
        })
    }

    /// The path of the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The retention policy.
    #[must_use]
    pub const fn scope(&self) -> Scope {
        self.scope
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        if self.scope == Scope::DeleteOnDrop {
            if let Err(err) = fs::remove_dir_all(&self.path) {
                if err.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %err,
                        "failed to remove temporary directory"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek, SeekFrom, Write};

    use super::*;

    #[test]
    fn file_is_created_open_and_unlinked() {
        let path;
        {
            let mut f = TempFile::new().unwrap();
            path = f.path().to_path_buf();
            assert!(path.is_absolute());
            assert!(path.exists());
            assert!(f.is_open());

            f.as_file().write_all(b"x").unwrap();
            let mut file = f.as_file();
            file.seek(SeekFrom::Start(0)).unwrap();
            let mut buf = String::new();
            file.read_to_string(&mut buf).unwrap();
            assert_eq!(buf, "x");
        }
        assert!(!path.exists());
    }

    #[test]
    fn file_prefix() {
        let f = TempFile::with_prefix("Foo").unwrap();
        let name = f.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("Foo"), "unexpected name: {name}");
    }

    #[test]
    fn file_in_given_parent() {
        let d = TempDir::new(Scope::DeleteOnDrop).unwrap();
        let f = TempFile::with_prefix_in("Foo", d.path()).unwrap();
        assert_eq!(f.path().parent().unwrap(), d.path());
    }

    #[test]
    fn file_no_such_parent() {
        let err = TempFile::with_prefix_in("", "/no/such/path").unwrap_err();
        assert!(matches!(err, FixtureError::CreateTempFile { .. }));
    }

    #[test]
    fn file_close_is_idempotent() {
        let mut f = TempFile::new().unwrap();
        f.close();
        f.close();
        assert!(!f.is_open());
    }

    #[test]
    fn files_never_collide() {
        let a = TempFile::with_prefix("same").unwrap();
        let b = TempFile::with_prefix("same").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn dir_delete_on_drop() {
        let path;
        {
            let d = TempDir::new(Scope::DeleteOnDrop).unwrap();
            path = d.path().to_path_buf();
            assert!(path.is_dir());
            // Contents are removed too.
            std::fs::write(path.join("bar"), b"contents").unwrap();
        }
        assert!(!path.exists());
    }

    #[test]
    fn dir_permanent_survives_drop() {
        let path;
        {
            let d = TempDir::new(Scope::Permanent).unwrap();
            path = d.path().to_path_buf();
        }
        assert!(path.is_dir());
        std::fs::remove_dir_all(&path).unwrap();
    }

    #[test]
    fn dir_no_such_parent() {
        let err = TempDir::with_prefix_in("", "/no/such/path", Scope::DeleteOnDrop).unwrap_err();
        assert!(matches!(err, FixtureError::CreateTempDir { .. }));
    }
}
