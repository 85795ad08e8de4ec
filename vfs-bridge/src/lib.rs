//! UI/Core Bridge over a Shared Virtual Filesystem
//!
//! This crate sits between a browser-hosted UI and an emulation core that
//! share one in-process virtual filesystem:
//! - `roms/` holds cartridge images, `saves/` holds save states
//! - Load/save requests travel as hidden sentinel files the core polls
//! - Listings hide sentinels and anything that is not a regular file
//!
//! # Architecture
//!
//! - `VirtualStore` trait: path-level hierarchical store (`MemoryStore`)
//! - `FileStore`: shared, directory-scoped handle both sides hold
//! - `LayoutBootstrap`: creates `roms/` and `saves/`, prunes sandbox dirs
//! - `DirectoryListing` + `RefreshRegistry`: what the UI shows and when
//! - `RequestChannel` trait: `SentinelChannel` or `QueueChannel` transport
//! - `UploadIngestor`, `DeletionService`, `Exporter`: UI-side operations
//! - `CorePoller`: the consuming side, for an embedded or simulated core
//! - `BridgeController`: owns everything and runs UI commands in order

pub mod channel;
pub mod config;
pub mod consumer;
pub mod controller;
pub mod delete;
pub mod error;
pub mod export;
pub mod fs;
pub mod ingest;
pub mod layout;
pub mod listing;

pub use channel::{
    queue_channel, take_sentinel, Direction, QueueChannel, QueueReceivers, Request,
    RequestChannel, SentinelChannel, Slot,
};
pub use config::{BridgeConfig, TransportKind};
pub use consumer::{dispatch, spawn_poller, CorePoller, EmulatorCore, PollReport};
pub use controller::{BridgeController, Command, Effect};
pub use delete::{DeleteOutcome, DeletionService};
pub use error::{BridgeError, BridgeResult};
pub use export::Exporter;
pub use fs::{EntryKind, FileStore, MemoryStore, VirtualStore};
pub use ingest::{upload_slot, ArchiveImport, PendingUpload, Upload, UploadIngestor, UploadSender};
pub use layout::{Directory, LayoutBootstrap};
pub use listing::{is_hidden, DirectoryListing, RefreshRegistry};
