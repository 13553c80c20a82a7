//! Error types for the testscope crate.
//!
//! This module provides a unified error type [`FixtureError`] that covers all
//! possible failure modes when setting up scoped test fixtures.

use std::io;
use std::path::PathBuf;

/// The error type for fixture operations.
///
/// This enum represents all possible errors that can occur when creating
/// temporary filesystem objects, capturing descriptors, or scoping the
/// process environment.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// Failed to create a temporary file.
    #[error("failed to create temporary file at {path}: {source}")]
    CreateTempFile {
        /// The path that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// Failed to create a temporary directory.
    #[error("failed to create temporary directory at {path}: {source}")]
    CreateTempDir {
        /// The path that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// Every generated candidate name already existed.
    #[error("exhausted unique name attempts under {parent}")]
    UniqueNameExhausted {
        /// The parent directory in which name generation was attempted.
        parent: PathBuf,
    },

    /// Failed to duplicate a descriptor's current binding.
    #[error("failed to duplicate descriptor {fd}: {source}")]
    Dup {
        /// The descriptor number being duplicated.
        fd: i32,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// Failed to rebind a descriptor onto a different open file.
    #[error("failed to rebind descriptor {fd}: {source}")]
    Rebind {
        /// The descriptor number being rebound.
        fd: i32,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// Failed to query the current working directory.
    #[error("failed to read current working directory: {0}")]
    CurrentDir(#[source] io::Error),

    /// Failed to change the working directory.
    #[error("failed to change working directory to {path}: {source}")]
    ChangeDir {
        /// The directory that could not be entered.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// An I/O error occurred during fixture operations.
    #[error("fixture I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A specialized Result type for fixture operations.
pub type Result<T> = std::result::Result<T, FixtureError>;

#[cfg(unix)]
impl From<rustix::io::Errno> for FixtureError {
    fn from(errno: rustix::io::Errno) -> Self {
        Self::Io(io::Error::from_raw_os_error(errno.raw_os_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FixtureError::UniqueNameExhausted {
            parent: PathBuf::from("/tmp"),
        };
        assert_eq!(err.to_string(), "exhausted unique name attempts under /tmp");
    }

    #[test]
    fn error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "not found");
        let fix_err: FixtureError = io_err.into();
        assert!(matches!(fix_err, FixtureError::Io(_)));
    }

    #[cfg(unix)]
    #[test]
    fn rebind_error_carries_fd() {
        let err = FixtureError::Rebind {
            fd: 2,
            source: io::Error::from_raw_os_error(libc::EBADF),
        };
        assert!(err.to_string().starts_with("failed to rebind descriptor 2"));
    }
}
