//! Fixed directory layout and startup bootstrap.

use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::fs::{EntryKind, FileStore};

/// Top-level directories shared with the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directory {
    /// Cartridge images
    Roms,
    /// Save-state snapshots
    Saves,
}

impl Directory {
    pub const ALL: [Directory; 2] = [Directory::Roms, Directory::Saves];

    pub fn as_str(self) -> &'static str {
        match self {
            Directory::Roms => "roms",
            Directory::Saves => "saves",
        }
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Establishes `roms/` and `saves/` and clears unused sandbox directories.
#[derive(Debug, Clone)]
pub struct LayoutBootstrap {
    prune_dirs: Vec<String>,
}

impl LayoutBootstrap {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            prune_dirs: config.prune_dirs.clone(),
        }
    }

    /// Run the bootstrap. Safe to call any number of times.
    ///
    /// `roms/` and `saves/` are created before anything is pruned, so they
    /// exist even when pruning fails with `NotEmpty`. A prune path that is
    /// `roms`, `saves` or lies under either fails with `InvalidName` before
    /// the store is touched.
    pub fn run(&self, store: &FileStore) -> BridgeResult<()> {
        if let Some(path) = self.prune_dirs.iter().find(|p| is_layout_path(p)) {
            return Err(BridgeError::InvalidName(path.clone()));
        }

        for dir in Directory::ALL {
            store.make_directory(dir.as_str())?;
        }

        for path in &self.prune_dirs {
            match store.kind(path) {
                None => debug!("{} already absent", path),
                Some(EntryKind::File) => warn!("{} is a file, leaving it in place", path),
                Some(EntryKind::Directory) => {
                    store.remove_directory(path)?;
                    debug!("removed sandbox directory {}", path);
                }
            }
        }

        info!("layout ready: roms/, saves/");
        Ok(())
    }
}

/// Whether `path` names a layout directory or something inside one.
fn is_layout_path(path: &str) -> bool {
    path.split('/')
        .find(|c| !c.is_empty() && *c != ".")
        .is_some_and(|first| Directory::ALL.iter().any(|d| d.as_str() == first))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_fresh_sandbox() {
        let store = FileStore::in_memory();
        LayoutBootstrap::new(&BridgeConfig::default())
            .run(&store)
            .unwrap();

        assert_eq!(store.kind("roms"), Some(EntryKind::Directory));
        assert_eq!(store.kind("saves"), Some(EntryKind::Directory));
        assert_eq!(store.kind("home"), None);
        assert_eq!(store.kind("tmp"), None);
    }

    #[test]
    fn test_bootstrap_twice() {
        let store = FileStore::in_memory();
        let bootstrap = LayoutBootstrap::new(&BridgeConfig::default());

        bootstrap.run(&store).unwrap();
        store.write(Directory::Roms, "mario.nes", b"rom").unwrap();
        bootstrap.run(&store).unwrap();

        assert_eq!(store.kind("roms"), Some(EntryKind::Directory));
        assert_eq!(store.kind("saves"), Some(EntryKind::Directory));
        assert!(store.exists(Directory::Roms, "mario.nes"));
    }

    #[test]
    fn test_bootstrap_non_empty_sandbox_dir() {
        let store = FileStore::in_memory();
        store.make_directory("tmp/cache").unwrap();

        let result = LayoutBootstrap::new(&BridgeConfig::default()).run(&store);
        assert!(matches!(result, Err(BridgeError::NotEmpty(ref p)) if p == "tmp"));

        // Layout directories survive the failed prune.
        assert_eq!(store.kind("roms"), Some(EntryKind::Directory));
        assert_eq!(store.kind("saves"), Some(EntryKind::Directory));
        assert_eq!(store.kind("tmp/cache"), Some(EntryKind::Directory));
    }

    #[test]
    fn test_prune_of_layout_dir_rejected() {
        for prune in ["roms", "saves/", "./roms", "saves/auto"] {
            let store = FileStore::in_memory();
            let config = BridgeConfig {
                prune_dirs: vec!["tmp".to_string(), prune.to_string()],
                ..BridgeConfig::default()
            };

            let result = LayoutBootstrap::new(&config).run(&store);

            assert!(matches!(result, Err(BridgeError::InvalidName(ref p)) if p == prune));
            // Rejected up front: nothing was pruned.
            assert_eq!(store.kind("tmp"), Some(EntryKind::Directory));
        }
    }

    #[test]
    fn test_prune_similar_name_allowed() {
        let store = FileStore::in_memory();
        store.make_directory("roms_old").unwrap();
        let config = BridgeConfig {
            prune_dirs: vec!["roms_old".to_string()],
            ..BridgeConfig::default()
        };

        LayoutBootstrap::new(&config).run(&store).unwrap();

        assert_eq!(store.kind("roms_old"), None);
        assert_eq!(store.kind("roms"), Some(EntryKind::Directory));
    }

    #[test]
    fn test_directory_serde() {
        assert_eq!(serde_json::to_string(&Directory::Saves).unwrap(), "\"saves\"");
        assert_eq!(
            serde_json::from_str::<Directory>("\"roms\"").unwrap(),
            Directory::Roms
        );
    }
}
