//! Confirmed deletion of ROMs and save states.

use log::{info, warn};

use crate::error::BridgeResult;
use crate::fs::FileStore;
use crate::ingest::validate_upload_name;
use crate::layout::Directory;
use crate::listing::RefreshRegistry;

/// What a delete request amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user did not confirm; nothing happened.
    Declined,
    /// The entry was removed; carries the refreshed view.
    Deleted(Vec<String>),
    /// The entry did not exist. Logged only; no refresh was issued.
    Missing,
}

#[derive(Clone)]
pub struct DeletionService {
    store: FileStore,
    refresh: RefreshRegistry,
}

impl DeletionService {
    pub fn new(store: FileStore, refresh: RefreshRegistry) -> Self {
        Self { store, refresh }
    }

    /// Remove `directory/name` if `confirmed`.
    ///
    /// A missing entry is not an error for the caller: it is logged and
    /// reported as `Missing`, and the listing is not refreshed so nothing
    /// suggests a deletion happened. Any other store failure propagates.
    ///
    /// Hidden names are rejected with `InvalidName`, so a pending request
    /// sentinel can only be cleared by the core.
    pub fn request_delete(
        &self,
        directory: Directory,
        name: &str,
        confirmed: bool,
    ) -> BridgeResult<DeleteOutcome> {
        validate_upload_name(name)?;
        if !confirmed {
            return Ok(DeleteOutcome::Declined);
        }
        match self.store.remove(directory, name) {
            Ok(()) => {
                info!("deleted {}/{}", directory, name);
                let view = self.refresh.notify(directory)?;
                Ok(DeleteOutcome::Deleted(view))
            }
            Err(e) if e.is_not_found() => {
                warn!("delete of {}/{} failed: {}", directory, name, e);
                Ok(DeleteOutcome::Missing)
            }
            Err(e) => Err(e),
        }
    }
}
