//! Virtual filesystem shared between the UI bridge and the emulation core.
//!
//! This module provides the layered filesystem architecture:
//! - `VirtualStore`: path-level hierarchical store interface
//! - `MemoryStore`: in-memory implementation
//! - `FileStore`: shared, directory-scoped handle used by every component

mod file_store;
mod memory_store;
mod store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use store::{join, validate_name, EntryKind, VirtualStore};
