//! Upload ingestion: user-supplied files into `roms/` or `saves/`.

use std::io::{Cursor, Read};

use log::{info, warn};
use tokio::sync::oneshot;
use zip::ZipArchive;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::fs::{validate_name, FileStore};
use crate::layout::Directory;
use crate::listing::{is_hidden, RefreshRegistry};

/// A file handed over by the upload collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Sending half of a one-shot upload delivery.
pub struct UploadSender(oneshot::Sender<Upload>);

/// Receiving half of a one-shot upload delivery. There is no timeout and no
/// way to cancel besides dropping the sender.
pub struct PendingUpload(oneshot::Receiver<Upload>);

/// Create a one-shot upload delivery pair.
pub fn upload_slot() -> (UploadSender, PendingUpload) {
    let (tx, rx) = oneshot::channel();
    (UploadSender(tx), PendingUpload(rx))
}

impl UploadSender {
    /// Deliver the file. Fails if the waiting side is gone.
    pub fn deliver(self, name: impl Into<String>, bytes: Vec<u8>) -> BridgeResult<()> {
        self.0
            .send(Upload {
                name: name.into(),
                bytes,
            })
            .map_err(|_| BridgeError::ChannelClosed)
    }
}

impl PendingUpload {
    /// Wait for the delivery. Fails with `ChannelClosed` if the sender was
    /// dropped without delivering.
    pub async fn recv(self) -> BridgeResult<Upload> {
        self.0.await.map_err(|_| BridgeError::ChannelClosed)
    }
}

/// Result of an archive import.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArchiveImport {
    /// Names written, in archive order.
    pub imported: Vec<String>,
    /// Archive entries left out (hidden or filtered by extension).
    pub skipped: Vec<String>,
}

/// Check that a user-supplied name may be stored: a valid name that is not
/// hidden, so uploads can never land in a sentinel slot.
pub fn validate_upload_name(name: &str) -> BridgeResult<()> {
    validate_name(name)?;
    if is_hidden(name) {
        return Err(BridgeError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Writes uploads into the store and refreshes the affected listing.
#[derive(Clone)]
pub struct UploadIngestor {
    store: FileStore,
    refresh: RefreshRegistry,
    config: BridgeConfig,
}

impl UploadIngestor {
    pub fn new(store: FileStore, refresh: RefreshRegistry, config: BridgeConfig) -> Self {
        Self {
            store,
            refresh,
            config,
        }
    }

    /// Store `bytes` as `directory/name`, silently replacing any entry of the
    /// same name, then refresh. Returns the refreshed view.
    pub fn ingest(
        &self,
        directory: Directory,
        name: &str,
        bytes: &[u8],
    ) -> BridgeResult<Vec<String>> {
        validate_upload_name(name)?;
        if self.store.exists(directory, name) {
            info!("{}/{} replaced by upload", directory, name);
        }
        self.store.write(directory, name, bytes)?;
        info!("uploaded {}/{} ({} bytes)", directory, name, bytes.len());
        self.refresh.notify(directory)
    }

    /// Wait for the upload collaborator to deliver, then ingest.
    ///
    /// Two uploads awaited at once finish in whatever order their bytes
    /// arrive; callers that need a fixed order await them one at a time.
    pub async fn ingest_pending(
        &self,
        directory: Directory,
        pending: PendingUpload,
    ) -> BridgeResult<Vec<String>> {
        let upload = pending.recv().await?;
        self.ingest(directory, &upload.name, &upload.bytes)
    }

    /// Expand a ZIP upload into `directory`.
    ///
    /// Only the file name of nested entries is kept. Entries that are hidden
    /// or whose extension is not accepted for `directory` are skipped. The
    /// archive is fully read before anything is written, so a corrupt archive
    /// leaves the store untouched. One refresh is issued for the batch.
    ///
    /// When two entries flatten to the same name, the later one wins and the
    /// earlier one is reported as skipped.
    pub fn ingest_archive(
        &self,
        directory: Directory,
        archive: &[u8],
    ) -> BridgeResult<ArchiveImport> {
        let mut zip = ZipArchive::new(Cursor::new(archive))?;
        let mut result = ArchiveImport::default();
        let mut files: Vec<(String, String, Vec<u8>)> = Vec::new();

        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let path = file.name().to_string();
            let name = path.rsplit('/').next().unwrap_or(&path).to_string();

            if validate_upload_name(&name).is_err() || !self.config.accepts(directory, &name) {
                warn!("skipping archive entry {} for {}/", path, directory);
                result.skipped.push(path);
                continue;
            }

            let mut content = Vec::new();
            file.read_to_end(&mut content)?;
            if let Some(pos) = files.iter().position(|(_, n, _)| *n == name) {
                let (shadowed, _, _) = files.remove(pos);
                warn!("archive entry {} replaces {} as {}/{}", path, shadowed, directory, name);
                result.skipped.push(shadowed);
            }
            files.push((path, name, content));
        }

        for (_, name, content) in files {
            self.store.write(directory, &name, &content)?;
            result.imported.push(name);
        }
        info!(
            "archive import into {}/: {} imported, {} skipped",
            directory,
            result.imported.len(),
            result.skipped.len()
        );
        self.refresh.notify(directory)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryStore;
    use crate::listing::DirectoryListing;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn setup() -> (FileStore, RefreshRegistry, UploadIngestor) {
        let store = FileStore::new(MemoryStore::new());
        store.make_directory("roms").unwrap();
        store.make_directory("saves").unwrap();
        let refresh = RefreshRegistry::new(DirectoryListing::new(store.clone()));
        let ingestor = UploadIngestor::new(store.clone(), refresh.clone(), BridgeConfig::default());
        (store, refresh, ingestor)
    }

    fn create_test_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            for (name, data) in entries {
                zip.start_file::<_, ()>(*name, Default::default()).unwrap();
                zip.write_all(data).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_ingest_refreshes_listing() {
        let (_, refresh, ingestor) = setup();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        refresh
            .register(Directory::Roms, move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        let view = ingestor.ingest(Directory::Roms, "mario.nes", b"rom").unwrap();

        assert_eq!(view, vec!["mario.nes"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ingest_same_name_overwrites() {
        let (store, _, ingestor) = setup();
        ingestor.ingest(Directory::Saves, "slot1.sav", b"one").unwrap();
        let view = ingestor.ingest(Directory::Saves, "slot1.sav", b"two").unwrap();

        assert_eq!(view, vec!["slot1.sav"]);
        assert_eq!(store.read(Directory::Saves, "slot1.sav").unwrap(), b"two");
    }

    #[test]
    fn test_ingest_rejects_sentinel_names() {
        let (store, _, ingestor) = setup();
        assert!(matches!(
            ingestor.ingest(Directory::Saves, ".save_request", b"x"),
            Err(BridgeError::InvalidName(_))
        ));
        assert!(!store.exists(Directory::Saves, ".save_request"));
    }

    #[tokio::test]
    async fn test_ingest_pending() {
        let (_, _, ingestor) = setup();
        let (sender, pending) = upload_slot();

        let waiter = {
            let ingestor = ingestor.clone();
            tokio::spawn(async move { ingestor.ingest_pending(Directory::Roms, pending).await })
        };
        sender.deliver("zelda.nes", b"rom".to_vec()).unwrap();

        assert_eq!(waiter.await.unwrap().unwrap(), vec!["zelda.nes"]);
    }

    #[tokio::test]
    async fn test_ingest_pending_sender_dropped() {
        let (_, _, ingestor) = setup();
        let (sender, pending) = upload_slot();
        drop(sender);

        assert!(matches!(
            ingestor.ingest_pending(Directory::Roms, pending).await,
            Err(BridgeError::ChannelClosed)
        ));
    }

    #[test]
    fn test_ingest_archive_filters_entries() {
        let (store, _, ingestor) = setup();
        let zip = create_test_zip(&[
            ("games/mario.nes", &b"rom1"[..]),
            ("README.txt", &b"hello"[..]),
            ("zelda.NES", &b"rom2"[..]),
            (".load_request", &b"mario.nes"[..]),
        ]);

        let result = ingestor.ingest_archive(Directory::Roms, &zip).unwrap();

        assert_eq!(result.imported, vec!["mario.nes", "zelda.NES"]);
        assert_eq!(result.skipped, vec!["README.txt", ".load_request"]);
        assert_eq!(store.read(Directory::Roms, "mario.nes").unwrap(), b"rom1");
        assert!(!store.exists(Directory::Roms, ".load_request"));
    }

    #[test]
    fn test_ingest_archive_same_file_name_twice() {
        let (store, _, ingestor) = setup();
        let zip = create_test_zip(&[
            ("a/x.nes", &b"first"[..]),
            ("y.nes", &b"other"[..]),
            ("b/x.nes", &b"second"[..]),
        ]);

        let result = ingestor.ingest_archive(Directory::Roms, &zip).unwrap();

        assert_eq!(result.imported, vec!["y.nes", "x.nes"]);
        assert_eq!(result.skipped, vec!["a/x.nes"]);
        assert_eq!(store.read(Directory::Roms, "x.nes").unwrap(), b"second");
    }

    #[test]
    fn test_ingest_corrupt_archive() {
        let (store, _, ingestor) = setup();
        assert!(matches!(
            ingestor.ingest_archive(Directory::Roms, b"not a zip"),
            Err(BridgeError::Zip(_))
        ));
        assert_eq!(store.list(Directory::Roms).unwrap(), vec![".", ".."]);
    }
}
