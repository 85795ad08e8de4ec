//! Queue transport: one single-producer/single-consumer queue per slot.
//!
//! Unlike sentinel files, a second request never replaces the first. When
//! mirroring is on, every request is also written to its sentinel file so a
//! core that only polls sentinels keeps working; a core should consume one
//! side or the other, not both.

use std::collections::HashMap;

use log::debug;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{Request, RequestChannel, SentinelChannel, Slot};
use crate::error::{BridgeError, BridgeResult};

/// Producer half, owned by the UI side.
pub struct QueueChannel {
    senders: HashMap<Slot, UnboundedSender<Request>>,
    mirror: Option<SentinelChannel>,
}

/// Consumer half, owned by the core side.
pub struct QueueReceivers {
    receivers: HashMap<Slot, UnboundedReceiver<Request>>,
}

/// Create a connected queue pair, optionally mirrored into sentinel files.
pub fn queue_channel(mirror: Option<SentinelChannel>) -> (QueueChannel, QueueReceivers) {
    let mut senders = HashMap::new();
    let mut receivers = HashMap::new();
    for slot in Slot::ALL {
        let (tx, rx) = mpsc::unbounded_channel();
        senders.insert(slot, tx);
        receivers.insert(slot, rx);
    }
    (QueueChannel { senders, mirror }, QueueReceivers { receivers })
}

impl RequestChannel for QueueChannel {
    fn submit(&self, request: &Request) -> BridgeResult<()> {
        let slot = request.slot()?;
        let sender = self.senders.get(&slot).ok_or(BridgeError::ChannelClosed)?;
        sender
            .send(request.clone())
            .map_err(|_| BridgeError::ChannelClosed)?;
        debug!("queued {:?} -> {:?}", slot, request.target_name);
        if let Some(ref mirror) = self.mirror {
            mirror.submit(request)?;
        }
        Ok(())
    }
}

impl QueueReceivers {
    /// Next request for `slot` without waiting.
    pub fn try_recv(&mut self, slot: Slot) -> Option<Request> {
        self.receivers.get_mut(&slot)?.try_recv().ok()
    }

    /// Wait for the next request for `slot`. None once the producer is gone.
    pub async fn recv(&mut self, slot: Slot) -> Option<Request> {
        self.receivers.get_mut(&slot)?.recv().await
    }

    /// Everything currently waiting for `slot`, oldest first.
    pub fn drain(&mut self, slot: Slot) -> Vec<Request> {
        let mut pending = Vec::new();
        while let Some(request) = self.try_recv(slot) {
            pending.push(request);
        }
        pending
    }

    /// Detach the receiver for `slot`, e.g. to hand it to a dedicated task.
    pub fn take(&mut self, slot: Slot) -> Option<UnboundedReceiver<Request>> {
        self.receivers.remove(&slot)
    }
}
