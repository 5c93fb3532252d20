//! Version-control object port.
//!
//! The verifier asks one question of version control: what did `path`
//! contain at `commit`? [`ObjectStore`] is that question; [`GitObjectStore`]
//! answers it by shelling out to `git` with a per-call timeout, and
//! [`CachedObjectStore`] remembers answers per (commit, path).
//!
//! [`WorkingTree`] is the other side of the comparison: the file as it is on
//! disk now.

mod cache;
mod git;
mod tree;

pub use cache::CachedObjectStore;
pub use git::GitObjectStore;
pub use tree::{FsWorkingTree, WorkingTree};

/// Errors from looking up historical file content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectStoreError {
    #[error("git executable is not available in PATH")]
    NotInstalled,

    #[error("git command timed out after {timeout_ms}ms: git {args}")]
    Timeout { args: String, timeout_ms: u64 },

    #[error("git command failed: git {args} ({message})")]
    CommandFailed { args: String, message: String },

    #[error("unable to parse git output: {0}")]
    Parse(String),
}

/// Historical file content by commit.
pub trait ObjectStore: Send + Sync {
    /// `Ok(None)` when the path did not exist at `commit`.
    fn file_at(&self, commit: &str, path: &str) -> Result<Option<String>, ObjectStoreError>;
}

impl<S: ObjectStore + ?Sized> ObjectStore for &S {
    fn file_at(&self, commit: &str, path: &str) -> Result<Option<String>, ObjectStoreError> {
        (**self).file_at(commit, path)
    }
}

impl<S: ObjectStore + ?Sized> ObjectStore for Box<S> {
    fn file_at(&self, commit: &str, path: &str) -> Result<Option<String>, ObjectStoreError> {
        (**self).file_at(commit, path)
    }
}
