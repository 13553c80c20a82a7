//! testscope: Scoped test fixtures for Unix
//!
//! This crate provides deterministic, side-effect-isolating primitives for
//! test code: temporary files and directories that clean up after
//! themselves, capture of a file descriptor's output (notably the
//! process-wide stderr stream), and scoped isolation of the environment
//! table and working directory.
//!
//! # Quick Start
//!
//! ```
//! use testscope::CaptureFd;
//!
//! # fn main() -> testscope::Result<()> {
//! let mut capture = CaptureFd::new(2)?;
//! // Anything written to fd 2 now lands in the capture.
//! eprint!("foo");
//! eprint!("bar");
//! assert_eq!(capture.read()?, b"foobar");
//! assert_eq!(capture.read_incremental()?, b"foobar");
//!
//! eprint!("baz");
//! assert_eq!(capture.read_incremental()?, b"baz");
//!
//! drop(capture); // fd 2 writes to its original destination again
//! # Ok(())
//! # }
//! ```
//!
//! # Scope-bound ownership
//!
//! Every fixture releases its resource on every exit path, normal return or
//! panic unwinding, through its `Drop` impl. Cleanup is best-effort: a
//! failure to remove a temporary object or restore a binding during drop is
//! logged via `tracing` and never propagated.
//!
//! # Single-threaded contract
//!
//! [`CaptureFd`], [`EnvGuard`], and [`TempWorkingDir`] manipulate
//! process-global resources (a descriptor slot, the environment table, the
//! working directory) and take no internal locks. Sharing those resources
//! across threads while a fixture is alive is undefined by design; tests
//! using them must run serially.

pub mod cwd;
pub mod env;
pub mod error;
pub mod pattern;
pub mod temp;

#[cfg(unix)]
pub mod capture;

// Re-export primary types
pub use cwd::TempWorkingDir;
pub use env::EnvGuard;
pub use error::{FixtureError, Result};
pub use pattern::is_full_match;
pub use temp::{Scope, TempDir, TempFile};

#[cfg(unix)]
pub use capture::{CaptureFd, ChunkCallback};
