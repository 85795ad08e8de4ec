//! Core-side consumer of load/save requests.
//!
//! The emulation core is opaque to the bridge. This module is what a core
//! embedding (or a test standing in for one) uses to honor requests: check
//! each slot, clear it, and perform the load or save against `roms/` and
//! `saves/`. Slots are serviced ROM load first, then state save, then state
//! load, so "load ROM, then restore a state" submitted together works.

use std::time::Duration;

use log::{info, warn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::channel::{take_sentinel, QueueReceivers, Request, Slot};
use crate::error::{BridgeError, BridgeResult};
use crate::fs::FileStore;
use crate::layout::Directory;

/// The operations the bridge can ask of an emulation core.
pub trait EmulatorCore: Send {
    /// Load a cartridge image.
    fn load_rom(&mut self, name: &str, rom: &[u8]) -> BridgeResult<()>;

    /// Snapshot the running state.
    fn save_state(&mut self) -> BridgeResult<Vec<u8>>;

    /// Restore a snapshot produced by `save_state`.
    fn load_state(&mut self, state: &[u8]) -> BridgeResult<()>;
}

/// Perform one request against the store and the core.
pub fn dispatch<C: EmulatorCore + ?Sized>(
    store: &FileStore,
    core: &mut C,
    request: &Request,
) -> BridgeResult<()> {
    let name = request.target_name.as_str();
    match request.slot()? {
        Slot::RomLoad => {
            let rom = store.read(Directory::Roms, name)?;
            core.load_rom(name, &rom)?;
        }
        Slot::StateSave => {
            let state = core.save_state()?;
            store.write(Directory::Saves, name, &state)?;
        }
        Slot::StateLoad => {
            let state = store.read(Directory::Saves, name)?;
            core.load_state(&state)?;
        }
    }
    info!("core handled {:?} {}/{}", request.direction, request.directory, name);
    Ok(())
}

/// Outcome of one polling pass.
#[derive(Debug, Default)]
pub struct PollReport {
    pub handled: Vec<Request>,
    pub failed: Vec<(Slot, BridgeError)>,
}

impl PollReport {
    pub fn is_empty(&self) -> bool {
        self.handled.is_empty() && self.failed.is_empty()
    }

    fn record(&mut self, slot: Slot, request: Request, result: BridgeResult<()>) {
        match result {
            Ok(()) => self.handled.push(request),
            Err(e) => {
                warn!("{:?} request for {:?} failed: {}", slot, request.target_name, e);
                self.failed.push((slot, e));
            }
        }
    }
}

/// Services pending requests on behalf of a core.
#[derive(Clone)]
pub struct CorePoller {
    store: FileStore,
}

impl CorePoller {
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }

    /// Consume and perform every sentinel request currently present.
    ///
    /// A failing slot is reported and does not stop the others. Nothing is
    /// retried: the sentinel is already cleared when the action runs.
    pub fn poll_sentinels<C: EmulatorCore + ?Sized>(&self, core: &mut C) -> PollReport {
        let mut report = PollReport::default();
        for slot in Slot::ALL {
            match take_sentinel(&self.store, slot) {
                Ok(None) => {}
                Ok(Some(request)) => {
                    let result = dispatch(&self.store, core, &request);
                    report.record(slot, request, result);
                }
                Err(e) => {
                    warn!("{}: {}", slot.sentinel_path(), e);
                    report.failed.push((slot, e));
                }
            }
        }
        report
    }

    /// Perform every request waiting in the queue transport, slot by slot,
    /// oldest first within a slot.
    pub fn poll_queue<C: EmulatorCore + ?Sized>(
        &self,
        receivers: &mut QueueReceivers,
        core: &mut C,
    ) -> PollReport {
        let mut report = PollReport::default();
        for slot in Slot::ALL {
            for request in receivers.drain(slot) {
                let result = dispatch(&self.store, core, &request);
                report.record(slot, request, result);
            }
        }
        report
    }
}

/// Run `poll_sentinels` on a fixed cadence until `shutdown` fires (or its
/// sender is dropped). The task hands the core back when it stops.
pub fn spawn_poller<C>(
    store: FileStore,
    mut core: C,
    interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
) -> JoinHandle<C>
where
    C: EmulatorCore + 'static,
{
    tokio::spawn(async move {
        let poller = CorePoller::new(store);
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    poller.poll_sentinels(&mut core);
                }
            }
        }
        core
    })
}
