//! Bridge configuration.
//!
//! Configuration is a JSON object with camelCase keys; every key is optional.
//!
//! ```json
//! {
//!     "pruneDirs": ["home/web_user", "home", "tmp"],
//!     "transport": "queue",
//!     "mirrorSentinels": true,
//!     "romExtensions": ["nes"],
//!     "saveExtensions": ["nesrs", "sav"],
//!     "pollIntervalMs": 16
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BridgeResult;
use crate::layout::Directory;

/// Which transport carries load/save requests to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransportKind {
    /// Sentinel files under `roms/` and `saves/`.
    #[default]
    Sentinel,
    /// In-process queue per request slot.
    Queue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// Sandbox directories removed at startup when empty, in order.
    pub prune_dirs: Vec<String>,
    pub transport: TransportKind,
    /// Queue transport also writes sentinel files for a core that only
    /// understands those.
    pub mirror_sentinels: bool,
    /// Extensions accepted into `roms/` by archive import.
    pub rom_extensions: Vec<String>,
    /// Extensions accepted into `saves/` by archive import.
    pub save_extensions: Vec<String>,
    /// Cadence of the bundled sentinel poller.
    pub poll_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            prune_dirs: vec!["home/web_user".into(), "home".into(), "tmp".into()],
            transport: TransportKind::Sentinel,
            mirror_sentinels: true,
            rom_extensions: vec!["nes".into()],
            save_extensions: vec!["nesrs".into(), "sav".into()],
            poll_interval_ms: 16,
        }
    }
}

impl BridgeConfig {
    /// Parse configuration from JSON text.
    pub fn from_json(text: &str) -> BridgeResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load configuration from a JSON file.
    pub fn from_path(path: &Path) -> BridgeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Extensions accepted into `directory` by archive import.
    pub fn extensions_for(&self, directory: Directory) -> &[String] {
        match directory {
            Directory::Roms => &self.rom_extensions,
            Directory::Saves => &self.save_extensions,
        }
    }

    /// Check a file name against the import filter for `directory`.
    /// Comparison ignores case; an empty filter accepts everything.
    pub fn accepts(&self, directory: Directory, name: &str) -> bool {
        let allowed = self.extensions_for(directory);
        if allowed.is_empty() {
            return true;
        }
        match name.rsplit_once('.') {
            Some((_, ext)) => allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}
