//! Per-project operation locks
//!
//! Apply and restore mutate the working tree and take the project lock
//! exclusively. Checkpoint creation and diffing only read it and take the
//! lock shared. Locks live in a process-wide registry keyed by the
//! canonical project root, so two handles on the same project always
//! contend on the same lock.
//!
//! There is no queueing beyond tokio's fair `RwLock`; callers that must not
//! wait use [`ProjectLock::try_exclusive`] and apply their own policy.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};
use tracing::trace;

static REGISTRY: LazyLock<DashMap<PathBuf, Arc<RwLock<()>>>> = LazyLock::new(DashMap::new);

/// Guard held while reading the working tree
pub type SharedGuard = OwnedRwLockReadGuard<()>;

/// Guard held while mutating the working tree
pub type ExclusiveGuard = OwnedRwLockWriteGuard<()>;

/// Handle on the lock for one project root
#[derive(Debug, Clone)]
pub struct ProjectLock {
    root: PathBuf,
    lock: Arc<RwLock<()>>,
}

impl ProjectLock {
    /// Get the lock for `root`.
    ///
    /// Roots that cannot be canonicalized (not yet created) are keyed by
    /// the path as given.
    pub fn for_root(root: &Path) -> Self {
        let key = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let lock = REGISTRY.entry(key.clone()).or_default().value().clone();
        Self { root: key, lock }
    }

    /// The canonical root this lock guards
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wait for shared (read) access
    pub async fn shared(&self) -> SharedGuard {
        trace!(root = %self.root.display(), "Acquiring shared project lock");
        self.lock.clone().read_owned().await
    }

    /// Wait for exclusive (write) access
    pub async fn exclusive(&self) -> ExclusiveGuard {
        trace!(root = %self.root.display(), "Acquiring exclusive project lock");
        self.lock.clone().write_owned().await
    }

    /// Exclusive access without waiting; `None` if any operation is in flight
    pub fn try_exclusive(&self) -> Option<ExclusiveGuard> {
        self.lock.clone().try_write_owned().ok()
    }

    /// Shared access without waiting; `None` while a mutation is in flight
    pub fn try_shared(&self) -> Option<SharedGuard> {
        self.lock.clone().try_read_owned().ok()
    }
}
