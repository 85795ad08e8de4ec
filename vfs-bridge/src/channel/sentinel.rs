//! Sentinel-file transport.
//!
//! Each slot is a single hidden file holding the pending target name. A
//! submit overwrites whatever is there: if the core has not consumed the
//! previous request yet, that request is gone and nobody is told. The core
//! reads the file and clears it in two separate store calls, so a submit
//! landing between them is lost as well. Use `QueueChannel` when either loss
//! matters.

use log::{info, warn};

use super::{Request, RequestChannel, Slot};
use crate::error::BridgeResult;
use crate::fs::FileStore;

/// Writes requests into `roms/.load_request`, `saves/.load_request` and
/// `saves/.save_request`.
#[derive(Clone)]
pub struct SentinelChannel {
    store: FileStore,
}

impl SentinelChannel {
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }

    /// Target name currently waiting in `slot`, if any.
    pub fn pending(&self, slot: Slot) -> BridgeResult<Option<String>> {
        if self.store.try_kind(&slot.sentinel_path())?.is_none() {
            return Ok(None);
        }
        let payload = self.store.read(slot.directory(), slot.sentinel_name())?;
        Ok(Some(String::from_utf8_lossy(&payload).into_owned()))
    }
}

impl RequestChannel for SentinelChannel {
    fn submit(&self, request: &Request) -> BridgeResult<()> {
        let slot = request.slot()?;
        if let Some(previous) = self.pending(slot)? {
            if !previous.is_empty() {
                warn!(
                    "{} still holds {:?}; overwriting with {:?}",
                    slot.sentinel_path(),
                    previous,
                    request.target_name
                );
            }
        }
        self.store
            .write(slot.directory(), slot.sentinel_name(), &request.encode())?;
        info!("{} <- {:?}", slot.sentinel_path(), request.target_name);
        Ok(())
    }
}

/// Consume the request waiting in `slot`: read the sentinel, then remove it.
///
/// Returns `Ok(None)` when the slot is empty (absent or zero-length). A
/// sentinel that does not decode is still removed and the decode error is
/// returned.
pub fn take_sentinel(store: &FileStore, slot: Slot) -> BridgeResult<Option<Request>> {
    let (directory, name) = (slot.directory(), slot.sentinel_name());
    if store.try_kind(&slot.sentinel_path())?.is_none() {
        return Ok(None);
    }
    let payload = match store.read(directory, name) {
        Ok(payload) => payload,
        // Removed by someone else between the check and the read.
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e),
    };
    match store.remove(directory, name) {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }
    if payload.is_empty() {
        return Ok(None);
    }
    Request::decode(slot, &payload).map(Some)
}
