//! VirtualStore trait - path-level interface to the shared hierarchical store.

use crate::error::{BridgeError, BridgeResult};

/// Kind of a node in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Hierarchical byte store addressed by `/`-separated paths.
///
/// Paths are relative to the store root; a leading `/` is accepted and
/// ignored. Every mutating call replaces state in one step, so a reader never
/// observes a partially written file.
pub trait VirtualStore: Send + Sync {
    /// Read file content.
    fn read_file(&self, path: &str) -> BridgeResult<Vec<u8>>;

    /// Create or overwrite a file. The parent directory must exist.
    fn write_file(&mut self, path: &str, data: &[u8]) -> BridgeResult<()>;

    /// Remove a file.
    fn remove_file(&mut self, path: &str) -> BridgeResult<()>;

    /// List a directory the way `readdir` does: `.` and `..` first, then
    /// every child in creation order.
    fn list_dir(&self, path: &str) -> BridgeResult<Vec<String>>;

    /// Kind of the node at `path`, or None if nothing is there.
    fn kind(&self, path: &str) -> Option<EntryKind>;

    /// Create a directory. Creating one that already exists is a no-op.
    fn make_dir(&mut self, path: &str) -> BridgeResult<()>;

    /// Remove an empty directory.
    fn remove_dir(&mut self, path: &str) -> BridgeResult<()>;

    /// Check if anything exists at `path`.
    fn exists(&self, path: &str) -> bool {
        self.kind(path).is_some()
    }
}

/// Check that `name` can be used as a single path component.
///
/// # Examples
/// ```
/// use vfs_bridge::fs::validate_name;
/// assert!(validate_name("mario.nes").is_ok());
/// assert!(validate_name(".load_request").is_ok());
/// assert!(validate_name("..").is_err());
/// assert!(validate_name("roms/mario.nes").is_err());
/// ```
pub fn validate_name(name: &str) -> BridgeResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
        return Err(BridgeError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Split a path into validated components.
pub(crate) fn split_path(path: &str) -> BridgeResult<Vec<&str>> {
    path.split('/')
        .filter(|c| !c.is_empty())
        .map(|c| validate_name(c).map(|_| c))
        .collect()
}

/// Join a directory and an entry name.
pub fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), name)
    }
}
