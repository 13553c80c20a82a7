//! File-descriptor output capture.
//!
//! [`CaptureFd`] transparently redirects a descriptor (typically fd 2, the
//! process-wide stderr stream) to a private backing file for the duration of
//! a scope, and restores the original binding on drop.
//!
//! # Single-threaded contract
//!
//! A descriptor slot is process-global state. Capturing a descriptor that
//! other threads write to or rebind concurrently gives unspecified results;
//! callers must serialize access for the lifetime of the capture.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::os::unix::io::{AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::path::Path;

use crate::error::{FixtureError, Result};
use crate::temp::TempFile;

/// Callback invoked with each nonempty chunk returned by
/// [`CaptureFd::read_incremental`].
pub type ChunkCallback = Box<dyn FnMut(&[u8])>;

/// Rebind `target` to refer to the same open file as `source`.
///
/// The descriptor number stays the same; only the underlying file changes.
fn rebind(source: RawFd, target: RawFd) -> Result<()> {
    // SAFETY: dup2 operates on raw descriptor numbers and does not take
    // ownership of either; both are open at every call site.
    let rc = unsafe { libc::dup2(source, target) };
    if rc == -1 {
        return Err(FixtureError::Rebind {
            fd: target,
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}

/// Duplicate the current binding of `fd`.
fn duplicate(fd: RawFd) -> Result<OwnedFd> {
    // SAFETY: we only borrow the caller's descriptor for the dup call; the
    // returned duplicate is a fresh descriptor we own.
    let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
    rustix::io::dup(borrowed).map_err(|errno| FixtureError::Dup {
        fd,
        source: io::Error::from_raw_os_error(errno.raw_os_error()),
    })
}

/// Captures everything written to a descriptor for the duration of a scope.
///
/// Construction duplicates the descriptor's current binding aside, then
/// rebinds the descriptor onto a fresh [`TempFile`]; from that point every
/// write to the descriptor lands in the backing file. Dropping the capture
/// (or calling [`CaptureFd::release`]) restores the original binding.
///
/// Nested captures of the same descriptor compose: each instance restores to
/// the binding it observed at its own construction, so dropping them in LIFO
/// order unwinds the stack exactly.
pub struct CaptureFd {
    /// The descriptor number being captured.
    target: RawFd,
    /// Duplicate of the original binding; `None` once released.
    saved: Option<OwnedFd>,
    /// Backing file the target descriptor is redirected to.
    backing: TempFile,
    /// Byte offset already consumed by incremental reads.
    read_offset: u64,
    /// Optional per-chunk callback, fired on incremental reads.
    chunk_callback: Option<ChunkCallback>,
}

impl std::fmt::Debug for CaptureFd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureFd")
            .field("target", &self.target)
            .field("backing", &self.backing.path())
            .field("read_offset", &self.read_offset)
            .field("released", &self.saved.is_none())
            .finish()
    }
}

impl CaptureFd {
    /// Start capturing `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor cannot be duplicated, the backing
    /// file cannot be created, or the rebind fails. On failure nothing is
    /// left half-initialized: resources acquired by earlier steps are
    /// released before the error propagates.
    pub fn new(target: RawFd) -> Result<Self> {
        Self::build(target, None)
    }

    /// Start capturing `target` with a chunk callback.
    ///
    /// The callback is invoked synchronously by [`CaptureFd::read_incremental`]
    /// with exactly the bytes that call returns, at most once per call. It is
    /// never invoked on writes themselves; chunk boundaries are driven by the
    /// caller's explicit reads. A final incremental read runs on release, so
    /// trailing bytes still reach the callback.
    pub fn with_chunk_callback(
        target: RawFd,
        callback: impl FnMut(&[u8]) + 'static,
    ) -> Result<Self> {
        Self::build(target, Some(Box::new(callback)))
    }

    fn build(target: RawFd, chunk_callback: Option<ChunkCallback>) -> Result<Self> {
        let saved = duplicate(target)?;
        let backing = TempFile::with_prefix("captured")?;
        rebind(backing.as_raw_fd(), target)?;
        Ok(Self {
            target,
            saved: Some(saved),
            backing,
            read_offset: 0,
            chunk_callback,
        })
    }

    /// The descriptor number being captured.
    #[must_use]
    pub const fn fd(&self) -> RawFd {
        self.target
    }

    /// The path of the backing file.
    #[must_use]
    pub fn backing_path(&self) -> &Path {
        self.backing.path()
    }

    /// The full content captured so far.
    ///
    /// Reads the backing file from the start to its current end. Does not
    /// move the incremental-read cursor; repeatable, and always reflects the
    /// latest state. Returns an empty buffer when nothing has been written.
    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.backing.path())?)
    }

    /// The bytes appended since the previous incremental read (or since
    /// construction, if never called).
    ///
    /// Advances the cursor to the new end of the backing file, so successive
    /// calls partition the captured stream: concatenating every result in
    /// call order equals a final [`CaptureFd::read`]. Returns an empty buffer
    /// when nothing new has been written.
    ///
    /// If a chunk callback was supplied at construction it is invoked with
    /// the returned bytes before this method returns, for nonempty results.
    pub fn read_incremental(&mut self) -> Result<Vec<u8>> {
        // The backing file is opened by path so the shared write offset of
        // the captured descriptor is left untouched.
        let mut file = File::open(self.backing.path())?;
        file.seek(SeekFrom::Start(self.read_offset))?;
        let mut chunk = Vec::new();
        file.read_to_end(&mut chunk)?;
        self.read_offset += chunk.len() as u64;
        if !chunk.is_empty() {
            if let Some(callback) = self.chunk_callback.as_mut() {
                callback(&chunk);
            }
        }
        Ok(chunk)
    }

    /// Whether the original binding has already been restored.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.saved.is_none()
    }

    /// Restore the target descriptor to its original binding.
    ///
    /// Runs a final incremental read first when a chunk callback is
    /// installed, then rebinds the saved duplicate back onto the target and
    /// closes the duplicate. Idempotent: later calls (including the one from
    /// `Drop`) are no-ops.
    pub fn release(&mut self) -> Result<()> {
        let Some(saved) = self.saved.take() else {
            return Ok(());
        };
        let flushed = if self.chunk_callback.is_some() {
            self.read_incremental().map(drop)
        } else {
            Ok(())
        };
        // Restore even if the final flush failed.
        let restored = rebind(saved.as_raw_fd(), self.target);
        flushed.and(restored)
        // `saved` drops here, closing the duplicate.
    }
}

impl Drop for CaptureFd {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::warn!(
                fd = self.target,
                error = %err,
                "failed to restore captured descriptor"
            );
        }
    }
}
