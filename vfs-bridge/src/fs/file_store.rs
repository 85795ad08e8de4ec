//! FileStore - directory-scoped handle shared by the UI side and the core.
//!
//! Every call takes the lock exactly once, so a single write replaces an
//! entry's bytes in one step. Nothing spans more than one call: a
//! read-then-remove performed by one side can interleave with a write from the
//! other side.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;

use super::memory_store::MemoryStore;
use super::store::{join, validate_name, EntryKind, VirtualStore};
use crate::error::{BridgeError, BridgeResult};
use crate::layout::Directory;

/// Shared virtual filesystem.
///
/// Clone is cheap (just clones the Arc); all clones see the same entries.
#[derive(Clone)]
pub struct FileStore {
    inner: Arc<RwLock<Box<dyn VirtualStore>>>,
}

impl Default for FileStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl FileStore {
    /// Wrap an existing store implementation.
    pub fn new(store: impl VirtualStore + 'static) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Box::new(store))),
        }
    }

    /// In-memory store seeded like a fresh browser sandbox.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::with_sandbox_defaults())
    }

    fn read_lock(&self) -> BridgeResult<RwLockReadGuard<'_, Box<dyn VirtualStore>>> {
        self.inner.read().map_err(|_| BridgeError::LockPoisoned)
    }

    fn write_lock(&self) -> BridgeResult<RwLockWriteGuard<'_, Box<dyn VirtualStore>>> {
        self.inner.write().map_err(|_| BridgeError::LockPoisoned)
    }

    /// Create or overwrite an entry.
    pub fn write(&self, directory: Directory, name: &str, data: &[u8]) -> BridgeResult<()> {
        validate_name(name)?;
        let path = join(directory.as_str(), name);
        debug!("write {} ({} bytes)", path, data.len());
        self.write_lock()?.write_file(&path, data)
    }

    /// Read an entry's bytes.
    pub fn read(&self, directory: Directory, name: &str) -> BridgeResult<Vec<u8>> {
        validate_name(name)?;
        self.read_lock()?.read_file(&join(directory.as_str(), name))
    }

    /// Remove an entry.
    pub fn remove(&self, directory: Directory, name: &str) -> BridgeResult<()> {
        validate_name(name)?;
        let path = join(directory.as_str(), name);
        debug!("remove {}", path);
        self.write_lock()?.remove_file(&path)
    }

    /// List every name in a directory in creation order, including `.`,
    /// `..`, sentinels and subdirectories.
    pub fn list(&self, directory: Directory) -> BridgeResult<Vec<String>> {
        self.read_lock()?.list_dir(directory.as_str())
    }

    /// Check if an entry exists.
    pub fn exists(&self, directory: Directory, name: &str) -> bool {
        self.kind(&join(directory.as_str(), name)).is_some()
    }

    /// Check if an entry is a regular file (as opposed to a directory).
    pub fn is_file(&self, directory: Directory, name: &str) -> bool {
        self.kind(&join(directory.as_str(), name)) == Some(EntryKind::File)
    }

    /// Create a top-level directory. No-op if it already exists.
    pub fn make_directory(&self, name: &str) -> BridgeResult<()> {
        self.write_lock()?.make_dir(name)
    }

    /// Remove an empty directory at `path`.
    pub fn remove_directory(&self, path: &str) -> BridgeResult<()> {
        self.write_lock()?.remove_dir(path)
    }

    /// Kind of whatever is at a raw store path. A poisoned lock reads as
    /// absent; use `try_kind` where that must be told apart.
    pub fn kind(&self, path: &str) -> Option<EntryKind> {
        self.try_kind(path).ok().flatten()
    }

    /// Like `kind`, but a poisoned lock is an error.
    pub fn try_kind(&self, path: &str) -> BridgeResult<Option<EntryKind>> {
        Ok(self.read_lock()?.kind(path))
    }

    /// Read a raw store path (used to inspect sentinels).
    pub fn read_path(&self, path: &str) -> BridgeResult<Vec<u8>> {
        self.read_lock()?.read_file(path)
    }
}

#[cfg(test)]
impl FileStore {
    /// Poison the lock by panicking while holding it.
    pub(crate) fn poison(&self) {
        let inner = self.inner.clone();
        let _ = std::thread::spawn(move || {
            let _guard = inner.write().unwrap();
            panic!("poisoning store lock");
        })
        .join();
    }
}
