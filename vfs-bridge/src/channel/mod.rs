//! Load/save requests from the UI to the emulation core.
//!
//! A request is `{directory, direction, targetName}`. The core only
//! understands three of the four combinations, one slot each:
//!
//! | Slot | Sentinel path |
//! |---|---|
//! | `RomLoad` | `roms/.load_request` |
//! | `StateSave` | `saves/.save_request` |
//! | `StateLoad` | `saves/.load_request` |
//!
//! `RequestChannel` is the transport-neutral interface. `SentinelChannel`
//! writes the sentinel files an unmodified core polls; `QueueChannel` keeps a
//! queue per slot so nothing is overwritten.

mod queue;
mod sentinel;

pub use queue::{queue_channel, QueueChannel, QueueReceivers};
pub use sentinel::{take_sentinel, SentinelChannel};

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::fs::{join, validate_name};
use crate::layout::Directory;
use crate::listing::is_hidden;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Load,
    Save,
}

/// One request slot the core watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    RomLoad,
    StateSave,
    StateLoad,
}

impl Slot {
    /// All slots, in the order the core services them.
    pub const ALL: [Slot; 3] = [Slot::RomLoad, Slot::StateSave, Slot::StateLoad];

    pub fn for_request(directory: Directory, direction: Direction) -> BridgeResult<Slot> {
        match (directory, direction) {
            (Directory::Roms, Direction::Load) => Ok(Slot::RomLoad),
            (Directory::Saves, Direction::Save) => Ok(Slot::StateSave),
            (Directory::Saves, Direction::Load) => Ok(Slot::StateLoad),
            (Directory::Roms, Direction::Save) => Err(BridgeError::UnsupportedRequest {
                directory,
                direction,
            }),
        }
    }

    pub fn directory(self) -> Directory {
        match self {
            Slot::RomLoad => Directory::Roms,
            Slot::StateSave | Slot::StateLoad => Directory::Saves,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Slot::RomLoad | Slot::StateLoad => Direction::Load,
            Slot::StateSave => Direction::Save,
        }
    }

    /// Sentinel file name inside `directory()`.
    pub fn sentinel_name(self) -> &'static str {
        match self.direction() {
            Direction::Load => ".load_request",
            Direction::Save => ".save_request",
        }
    }

    /// Full store path of the sentinel file.
    pub fn sentinel_path(self) -> String {
        join(self.directory().as_str(), self.sentinel_name())
    }
}

/// A load or save request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub direction: Direction,
    pub directory: Directory,
    pub target_name: String,
}

impl Request {
    /// Build a request, rejecting combinations the core has no slot for and
    /// target names that could not name a visible entry.
    pub fn new(
        directory: Directory,
        direction: Direction,
        target_name: impl Into<String>,
    ) -> BridgeResult<Self> {
        let target_name = target_name.into();
        Slot::for_request(directory, direction)?;
        validate_name(&target_name)?;
        if is_hidden(&target_name) {
            return Err(BridgeError::InvalidName(target_name));
        }
        Ok(Self {
            direction,
            directory,
            target_name,
        })
    }

    /// Ask the core to load a ROM from `roms/`.
    pub fn load_rom(name: impl Into<String>) -> BridgeResult<Self> {
        Self::new(Directory::Roms, Direction::Load, name)
    }

    /// Ask the core to load a save state from `saves/`.
    pub fn load_state(name: impl Into<String>) -> BridgeResult<Self> {
        Self::new(Directory::Saves, Direction::Load, name)
    }

    /// Ask the core to write its current state to `saves/`.
    pub fn save_state(name: impl Into<String>) -> BridgeResult<Self> {
        Self::new(Directory::Saves, Direction::Save, name)
    }

    /// Slot this request travels in. Fails only for a hand-built
    /// `roms`/`Save` request.
    pub fn slot(&self) -> BridgeResult<Slot> {
        Slot::for_request(self.directory, self.direction)
    }

    /// Sentinel payload: the target name as plain UTF-8.
    pub fn encode(&self) -> Vec<u8> {
        self.target_name.as_bytes().to_vec()
    }

    /// Rebuild a request from a sentinel payload.
    pub fn decode(slot: Slot, payload: &[u8]) -> BridgeResult<Self> {
        let text = std::str::from_utf8(payload).map_err(|e| {
            BridgeError::InvalidRequest(format!("{} is not UTF-8: {}", slot.sentinel_path(), e))
        })?;
        if text.is_empty() {
            return Err(BridgeError::InvalidRequest(format!(
                "{} is empty",
                slot.sentinel_path()
            )));
        }
        Self::new(slot.directory(), slot.direction(), text)
            .map_err(|e| BridgeError::InvalidRequest(format!("{}: {}", slot.sentinel_path(), e)))
    }
}

/// Transport carrying requests to the core.
///
/// Delivery is fire-and-forget: `submit` returns once the request is
/// recorded and says nothing about whether the core has seen it.
pub trait RequestChannel: Send + Sync {
    fn submit(&self, request: &Request) -> BridgeResult<()>;
}
