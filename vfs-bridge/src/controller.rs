//! BridgeController - owns every bridge component and runs UI commands.
//!
//! UI events become typed `Command`s. Commands run one at a time, in the
//! order they were enqueued, each to completion before the next starts.

use std::collections::VecDeque;

use log::{debug, error};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::channel::{queue_channel, QueueReceivers, Request, RequestChannel, SentinelChannel};
use crate::config::{BridgeConfig, TransportKind};
use crate::delete::{DeleteOutcome, DeletionService};
use crate::error::BridgeResult;
use crate::export::Exporter;
use crate::fs::FileStore;
use crate::ingest::{ArchiveImport, PendingUpload, UploadIngestor};
use crate::layout::{Directory, LayoutBootstrap};
use crate::listing::{DirectoryListing, RefreshRegistry};

/// A user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Upload {
        directory: Directory,
        name: String,
        bytes: Vec<u8>,
    },
    UploadArchive {
        directory: Directory,
        archive: Vec<u8>,
    },
    Delete {
        directory: Directory,
        name: String,
        confirmed: bool,
    },
    RequestLoad {
        directory: Directory,
        name: String,
    },
    RequestSave {
        name: String,
    },
}

/// What running a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Uploaded {
        directory: Directory,
        view: Vec<String>,
    },
    Imported {
        directory: Directory,
        import: ArchiveImport,
    },
    Deleted {
        directory: Directory,
        outcome: DeleteOutcome,
    },
    Submitted(Request),
}

pub struct BridgeController {
    store: FileStore,
    refresh: RefreshRegistry,
    channel: Box<dyn RequestChannel>,
    ingestor: UploadIngestor,
    deleter: DeletionService,
    exporter: Exporter,
    queue_receivers: Option<QueueReceivers>,
    pending: VecDeque<Command>,
}

impl BridgeController {
    /// Bootstrap the layout in `store` and wire up every component.
    pub fn start(store: FileStore, config: BridgeConfig) -> BridgeResult<Self> {
        LayoutBootstrap::new(&config).run(&store)?;

        let listing = DirectoryListing::new(store.clone());
        let refresh = RefreshRegistry::new(listing.clone());
        let sentinels = SentinelChannel::new(store.clone());

        let (channel, queue_receivers) = match config.transport {
            TransportKind::Sentinel => (Box::new(sentinels) as Box<dyn RequestChannel>, None),
            TransportKind::Queue => {
                let mirror = config.mirror_sentinels.then_some(sentinels);
                let (channel, receivers) = queue_channel(mirror);
                (Box::new(channel) as Box<dyn RequestChannel>, Some(receivers))
            }
        };

        Ok(Self {
            ingestor: UploadIngestor::new(store.clone(), refresh.clone(), config),
            deleter: DeletionService::new(store.clone(), refresh.clone()),
            exporter: Exporter::new(store.clone(), listing),
            store,
            refresh,
            channel,
            queue_receivers,
            pending: VecDeque::new(),
        })
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Register listing callbacks here.
    pub fn refresh(&self) -> &RefreshRegistry {
        &self.refresh
    }

    pub fn listing(&self) -> &DirectoryListing {
        self.refresh.listing()
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Consumer half of the queue transport, for the core side. None with
    /// the sentinel transport or once taken.
    pub fn take_queue_receivers(&mut self) -> Option<QueueReceivers> {
        self.queue_receivers.take()
    }

    /// Visible entries of `directory`.
    pub fn list_visible(&self, directory: Directory) -> BridgeResult<Vec<String>> {
        self.listing().list_visible(directory)
    }

    /// Run a single command now.
    pub fn handle(&self, command: Command) -> BridgeResult<Effect> {
        debug!("handling {:?}", CommandKind(&command));
        match command {
            Command::Upload {
                directory,
                name,
                bytes,
            } => {
                let view = self.ingestor.ingest(directory, &name, &bytes)?;
                Ok(Effect::Uploaded { directory, view })
            }
            Command::UploadArchive { directory, archive } => {
                let import = self.ingestor.ingest_archive(directory, &archive)?;
                Ok(Effect::Imported { directory, import })
            }
            Command::Delete {
                directory,
                name,
                confirmed,
            } => {
                let outcome = self.deleter.request_delete(directory, &name, confirmed)?;
                Ok(Effect::Deleted { directory, outcome })
            }
            Command::RequestLoad { directory, name } => {
                let request = match directory {
                    Directory::Roms => Request::load_rom(name)?,
                    Directory::Saves => Request::load_state(name)?,
                };
                self.channel.submit(&request)?;
                Ok(Effect::Submitted(request))
            }
            Command::RequestSave { name } => {
                let request = Request::save_state(name)?;
                self.channel.submit(&request)?;
                Ok(Effect::Submitted(request))
            }
        }
    }

    /// Queue a command for `process_pending`.
    pub fn enqueue(&mut self, command: Command) {
        self.pending.push_back(command);
    }

    /// Run every queued command in FIFO order. A failing command does not
    /// stop the ones after it and is not retried.
    pub fn process_pending(&mut self) -> Vec<BridgeResult<Effect>> {
        let mut results = Vec::with_capacity(self.pending.len());
        while let Some(command) = self.pending.pop_front() {
            let result = self.handle(command);
            if let Err(ref e) = result {
                error!("command failed: {}", e);
            }
            results.push(result);
        }
        results
    }

    /// Wait for an upload and queue it.
    pub async fn enqueue_upload(
        &mut self,
        directory: Directory,
        pending: PendingUpload,
    ) -> BridgeResult<()> {
        let upload = pending.recv().await?;
        self.enqueue(Command::Upload {
            directory,
            name: upload.name,
            bytes: upload.bytes,
        });
        Ok(())
    }

    /// Run commands from `commands` until every sender is dropped.
    pub async fn run(
        &mut self,
        mut commands: UnboundedReceiver<Command>,
    ) -> Vec<BridgeResult<Effect>> {
        let mut results = Vec::new();
        while let Some(command) = commands.recv().await {
            self.enqueue(command);
            results.extend(self.process_pending());
        }
        results
    }
}

/// Command name for logs without the payload bytes.
struct CommandKind<'a>(&'a Command);

impl std::fmt::Debug for CommandKind<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Command::Upload { directory, name, bytes } => {
                write!(f, "Upload {}/{} ({} bytes)", directory, name, bytes.len())
            }
            Command::UploadArchive { directory, archive } => {
                write!(f, "UploadArchive {}/ ({} bytes)", directory, archive.len())
            }
            Command::Delete { directory, name, confirmed } => {
                write!(f, "Delete {}/{} confirmed={}", directory, name, confirmed)
            }
            Command::RequestLoad { directory, name } => {
                write!(f, "RequestLoad {}/{}", directory, name)
            }
            Command::RequestSave { name } => write!(f, "RequestSave saves/{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Slot;
    use crate::error::BridgeError;
    use crate::ingest::upload_slot;
    use tokio::sync::mpsc;

    fn controller(config: BridgeConfig) -> BridgeController {
        BridgeController::start(FileStore::in_memory(), config).unwrap()
    }

    fn upload(directory: Directory, name: &str) -> Command {
        Command::Upload {
            directory,
            name: name.to_string(),
            bytes: name.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_commands_run_in_order() {
        let mut bridge = controller(BridgeConfig::default());
        bridge.enqueue(upload(Directory::Saves, "slot1.sav"));
        bridge.enqueue(Command::Delete {
            directory: Directory::Saves,
            name: "slot1.sav".into(),
            confirmed: true,
        });
        bridge.enqueue(upload(Directory::Saves, "slot2.sav"));

        let results = bridge.process_pending();

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[1].as_ref().unwrap(),
            &Effect::Deleted {
                directory: Directory::Saves,
                outcome: DeleteOutcome::Deleted(vec![]),
            }
        );
        assert_eq!(bridge.list_visible(Directory::Saves).unwrap(), vec!["slot2.sav"]);
    }

    #[test]
    fn test_failure_does_not_stop_queue() {
        let mut bridge = controller(BridgeConfig::default());
        bridge.enqueue(Command::RequestSave { name: ".hidden".into() });
        bridge.enqueue(Command::RequestSave { name: "slot1.sav".into() });

        let results = bridge.process_pending();

        assert!(matches!(results[0], Err(BridgeError::InvalidName(_))));
        assert!(results[1].is_ok());
        assert_eq!(
            bridge.store().read_path("saves/.save_request").unwrap(),
            b"slot1.sav"
        );
    }

    #[test]
    fn test_request_load_picks_slot_by_directory() {
        let bridge = controller(BridgeConfig::default());
        bridge
            .handle(Command::RequestLoad {
                directory: Directory::Roms,
                name: "mario.nes".into(),
            })
            .unwrap();
        bridge
            .handle(Command::RequestLoad {
                directory: Directory::Saves,
                name: "slot1.sav".into(),
            })
            .unwrap();

        assert_eq!(bridge.store().read_path("roms/.load_request").unwrap(), b"mario.nes");
        assert_eq!(bridge.store().read_path("saves/.load_request").unwrap(), b"slot1.sav");
    }

    #[test]
    fn test_queue_transport() {
        let config = BridgeConfig {
            transport: TransportKind::Queue,
            mirror_sentinels: false,
            ..BridgeConfig::default()
        };
        let mut bridge = controller(config);
        let mut receivers = bridge.take_queue_receivers().unwrap();
        assert!(bridge.take_queue_receivers().is_none());

        bridge
            .handle(Command::RequestSave { name: "a.sav".into() })
            .unwrap();
        bridge
            .handle(Command::RequestSave { name: "b.sav".into() })
            .unwrap();

        assert_eq!(receivers.drain(Slot::StateSave).len(), 2);
        assert!(bridge.store().read_path("saves/.save_request").is_err());
    }

    #[tokio::test]
    async fn test_run_until_senders_dropped() {
        let mut bridge = controller(BridgeConfig::default());
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(upload(Directory::Roms, "mario.nes")).unwrap();
        tx.send(Command::RequestLoad {
            directory: Directory::Roms,
            name: "mario.nes".into(),
        })
        .unwrap();
        drop(tx);

        let results = bridge.run(rx).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(bridge.list_visible(Directory::Roms).unwrap(), vec!["mario.nes"]);
    }

    #[tokio::test]
    async fn test_enqueue_upload() {
        let mut bridge = controller(BridgeConfig::default());
        let (sender, pending) = upload_slot();
        sender.deliver("zelda.nes", b"rom".to_vec()).unwrap();

        bridge.enqueue_upload(Directory::Roms, pending).await.unwrap();
        let results = bridge.process_pending();

        assert_eq!(
            results[0].as_ref().unwrap(),
            &Effect::Uploaded {
                directory: Directory::Roms,
                view: vec!["zelda.nes".to_string()],
            }
        );
    }
}
