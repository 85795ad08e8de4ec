//! Downloads: single entries and whole-directory archives.

use std::io::{Cursor, Write};

use log::info;
use zip::ZipWriter;

use crate::error::BridgeResult;
use crate::fs::FileStore;
use crate::ingest::validate_upload_name;
use crate::layout::Directory;
use crate::listing::DirectoryListing;

#[derive(Clone)]
pub struct Exporter {
    store: FileStore,
    listing: DirectoryListing,
}

impl Exporter {
    pub fn new(store: FileStore, listing: DirectoryListing) -> Self {
        Self { store, listing }
    }

    /// Bytes of a visible entry for download. `NotFound` is returned to the
    /// caller, never swallowed.
    pub fn read_for_download(&self, directory: Directory, name: &str) -> BridgeResult<Vec<u8>> {
        validate_upload_name(name)?;
        self.store.read(directory, name)
    }

    /// ZIP archive of every visible entry of `directory`, in listing order.
    pub fn export_archive(&self, directory: Directory) -> BridgeResult<Vec<u8>> {
        let names = self.listing.list_visible(directory)?;
        let mut buf = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buf));
            for name in &names {
                let data = self.store.read(directory, name)?;
                zip.start_file::<_, ()>(name.as_str(), Default::default())?;
                zip.write_all(&data)?;
            }
            zip.finish()?;
        }
        info!("exported {} entries from {}/", names.len(), directory);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::error::BridgeError;
    use crate::fs::MemoryStore;
    use crate::ingest::UploadIngestor;
    use crate::listing::RefreshRegistry;

    fn setup() -> (FileStore, Exporter) {
        let store = FileStore::new(MemoryStore::new());
        store.make_directory("roms").unwrap();
        store.make_directory("saves").unwrap();
        let exporter = Exporter::new(store.clone(), DirectoryListing::new(store.clone()));
        (store, exporter)
    }

    #[test]
    fn test_read_for_download() {
        let (store, exporter) = setup();
        store.write(Directory::Saves, "slot1.sav", b"state").unwrap();

        assert_eq!(
            exporter.read_for_download(Directory::Saves, "slot1.sav").unwrap(),
            b"state"
        );
        assert!(exporter
            .read_for_download(Directory::Saves, "ghost.sav")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_sentinels_are_not_downloadable() {
        let (store, exporter) = setup();
        store.write(Directory::Saves, ".save_request", b"slot1.sav").unwrap();

        assert!(matches!(
            exporter.read_for_download(Directory::Saves, ".save_request"),
            Err(BridgeError::InvalidName(_))
        ));
    }

    #[test]
    fn test_export_then_import_into_fresh_store() {
        let (store, exporter) = setup();
        store.write(Directory::Saves, "a.sav", b"A").unwrap();
        store.write(Directory::Saves, ".save_request", b"a.sav").unwrap();
        store.write(Directory::Saves, "b.sav", b"B").unwrap();

        let archive = exporter.export_archive(Directory::Saves).unwrap();

        let (fresh, _) = setup();
        let refresh = RefreshRegistry::new(DirectoryListing::new(fresh.clone()));
        let ingestor = UploadIngestor::new(fresh.clone(), refresh, BridgeConfig::default());
        let result = ingestor.ingest_archive(Directory::Saves, &archive).unwrap();

        assert_eq!(result.imported, vec!["a.sav", "b.sav"]);
        assert!(result.skipped.is_empty());
        assert_eq!(fresh.read(Directory::Saves, "b.sav").unwrap(), b"B");
    }
}
