//! Directory listings as the UI shows them, plus refresh notifications.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::debug;

use crate::error::{BridgeError, BridgeResult};
use crate::fs::FileStore;
use crate::layout::Directory;

/// True for names the UI never shows: `.`, `..` and sentinels.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Enumerates the visible entries of a directory.
#[derive(Clone)]
pub struct DirectoryListing {
    store: FileStore,
}

impl DirectoryListing {
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }

    /// Regular, non-hidden files of `directory` in store order.
    ///
    /// Re-reads the store on every call. The order is creation order, not
    /// alphabetical.
    pub fn list_visible(&self, directory: Directory) -> BridgeResult<Vec<String>> {
        let visible: Vec<String> = self
            .store
            .list(directory)?
            .into_iter()
            .filter(|name| !is_hidden(name))
            .filter(|name| self.store.is_file(directory, name))
            .collect();
        debug!("{}: {} visible entries", directory, visible.len());
        Ok(visible)
    }
}

/// Callback invoked with a freshly computed view of a directory.
pub type RefreshCallback = Arc<dyn Fn(Directory, &[String]) + Send + Sync>;

/// Per-directory refresh callbacks registered by the UI.
///
/// Clone is cheap; clones share the same registrations.
#[derive(Clone)]
pub struct RefreshRegistry {
    listing: DirectoryListing,
    callbacks: Arc<RwLock<HashMap<Directory, Vec<RefreshCallback>>>>,
}

impl RefreshRegistry {
    pub fn new(listing: DirectoryListing) -> Self {
        Self {
            listing,
            callbacks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a callback for `directory`.
    pub fn register<F>(&self, directory: Directory, callback: F) -> BridgeResult<()>
    where
        F: Fn(Directory, &[String]) + Send + Sync + 'static,
    {
        let mut callbacks = self.callbacks.write().map_err(|_| BridgeError::LockPoisoned)?;
        callbacks
            .entry(directory)
            .or_default()
            .push(Arc::new(callback));
        Ok(())
    }

    /// Recompute the view of `directory` and hand it to every callback.
    pub fn notify(&self, directory: Directory) -> BridgeResult<Vec<String>> {
        let view = self.listing.list_visible(directory)?;
        // Callbacks run outside the lock so they may register more.
        let targets: Vec<RefreshCallback> = {
            let callbacks = self.callbacks.read().map_err(|_| BridgeError::LockPoisoned)?;
            callbacks.get(&directory).cloned().unwrap_or_default()
        };
        for callback in targets {
            callback(directory, &view);
        }
        Ok(view)
    }

    pub fn listing(&self) -> &DirectoryListing {
        &self.listing
    }
}
