//! Import dispatch
//!
//! Configurators hand finalized [`ImportRequest`]s to an [`ImportDispatcher`],
//! which runs them on a tokio runtime through an [`ImportJobRunner`] and
//! reports progress back as [`ImportEvent`]s on a channel. Dispatch never
//! blocks the caller; failures are logged and reported as events only.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tokio::runtime::{Handle, Runtime};

use crate::error::{ImportError, ImportResult, StagingError, StagingResult};
use crate::kind::AssetKind;
use crate::settings::AssetImportSettings;

/// Identifier of one dispatched batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchId(u64);

impl BatchId {
    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch#{}", self.0)
    }
}

/// A finalized proxy, ready for an import job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub kind: AssetKind,
    /// Canonical source path of the staged proxy
    pub source: PathBuf,
    /// Destination folder, ending with a separator
    pub destination_folder: String,
    pub settings: AssetImportSettings,
}

impl ImportRequest {
    /// Every source file the job reads, in order.
    ///
    /// For textures this is the flattened group; otherwise the proxy source.
    pub fn sources(&self) -> Vec<PathBuf> {
        match &self.settings {
            AssetImportSettings::Texture(t) if !t.sources.is_empty() => t.sources.clone(),
            _ => vec![self.source.clone()],
        }
    }

    /// Name of the produced asset, taken from the source file stem
    pub fn asset_name(&self) -> String {
        self.source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "asset".to_string())
    }
}

/// Result of a successful import job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedAsset {
    /// Files written to the destination folder
    pub outputs: Vec<PathBuf>,
}

/// Performs format-specific conversion for one request
#[async_trait]
pub trait ImportJobRunner: Send + Sync {
    async fn import(&self, request: &ImportRequest) -> ImportResult<ImportedAsset>;
}

/// Progress reported by dispatched batches
#[derive(Debug, Clone, PartialEq)]
pub enum ImportEvent {
    /// Item accepted for import (sent synchronously by `dispatch`)
    Queued {
        batch: BatchId,
        kind: AssetKind,
        source: PathBuf,
    },
    /// Job for the item started
    Started { batch: BatchId, source: PathBuf },
    /// Job for the item finished
    Succeeded {
        batch: BatchId,
        source: PathBuf,
        outputs: Vec<PathBuf>,
    },
    /// Job for the item failed
    Failed {
        batch: BatchId,
        source: PathBuf,
        message: String,
    },
    /// Every item of the batch has been processed
    BatchFinished {
        batch: BatchId,
        kind: AssetKind,
        succeeded: usize,
        failed: usize,
    },
}

/// Fire-and-forget dispatcher for import batches
pub struct ImportDispatcher {
    runner: Arc<dyn ImportJobRunner>,
    runtime: Option<Runtime>,
    handle: Handle,
    event_tx: Sender<ImportEvent>,
    event_rx: Receiver<ImportEvent>,
    next_batch: AtomicU64,
    in_flight: Arc<AtomicUsize>,
}

impl ImportDispatcher {
    /// Create a dispatcher with its own multi-threaded runtime
    pub fn new(runner: Arc<dyn ImportJobRunner>, worker_threads: usize) -> StagingResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("quarry-import")
            .enable_all()
            .build()
            .map_err(|e| StagingError::Runtime(e.to_string()))?;
        let handle = runtime.handle().clone();

        let mut dispatcher = Self::with_handle(runner, handle);
        dispatcher.runtime = Some(runtime);
        Ok(dispatcher)
    }

    /// Create a dispatcher spawning onto an existing runtime
    pub fn with_handle(runner: Arc<dyn ImportJobRunner>, handle: Handle) -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            runner,
            runtime: None,
            handle,
            event_tx,
            event_rx,
            next_batch: AtomicU64::new(1),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start importing a batch. Returns immediately.
    pub fn dispatch(&self, kind: AssetKind, requests: Vec<ImportRequest>) -> BatchId {
        let batch = BatchId(self.next_batch.fetch_add(1, Ordering::Relaxed));

        for request in &requests {
            let _ = self.event_tx.send(ImportEvent::Queued {
                batch,
                kind,
                source: request.source.clone(),
            });
        }
        log::info!("Dispatching {} {} import(s) as {}", requests.len(), kind, batch);

        let runner = self.runner.clone();
        let tx = self.event_tx.clone();
        let in_flight = self.in_flight.clone();
        in_flight.fetch_add(1, Ordering::SeqCst);

        self.handle.spawn(async move {
            run_batch(batch, kind, requests, runner, &tx).await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
        });

        batch
    }

    /// Drain pending events
    pub fn poll(&self) -> Vec<ImportEvent> {
        self.event_rx.try_iter().collect()
    }

    /// Receiver for blocking consumers
    pub fn events(&self) -> Receiver<ImportEvent> {
        self.event_rx.clone()
    }

    /// Number of batches still running
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl Drop for ImportDispatcher {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn run_batch(
    batch: BatchId,
    kind: AssetKind,
    requests: Vec<ImportRequest>,
    runner: Arc<dyn ImportJobRunner>,
    tx: &Sender<ImportEvent>,
) {
    let mut succeeded = 0;
    let mut failed = 0;

    for request in requests {
        let source = request.source.clone();
        let _ = tx.send(ImportEvent::Started {
            batch,
            source: source.clone(),
        });

        match runner.import(&request).await {
            Ok(asset) => {
                log::debug!("{}: imported {:?} ({} outputs)", batch, source, asset.outputs.len());
                succeeded += 1;
                let _ = tx.send(ImportEvent::Succeeded {
                    batch,
                    source,
                    outputs: asset.outputs,
                });
            }
            Err(e) => {
                log::error!("{}: import of {:?} failed: {}", batch, source, e);
                failed += 1;
                let _ = tx.send(ImportEvent::Failed {
                    batch,
                    source,
                    message: e.to_string(),
                });
            }
        }
    }

    log::info!("{} finished: {} succeeded, {} failed", batch, succeeded, failed);
    let _ = tx.send(ImportEvent::BatchFinished {
        batch,
        kind,
        succeeded,
        failed,
    });
}

/// Runner that copies sources verbatim into the destination folder
#[derive(Debug, Clone)]
pub struct RawCopyRunner {
    write_manifest: bool,
}

impl RawCopyRunner {
    /// Create a runner; with `write_manifest` each request is also written
    /// as `<name>.import.json` next to the copied files.
    pub fn new(write_manifest: bool) -> Self {
        Self { write_manifest }
    }
}

impl Default for RawCopyRunner {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ImportJobRunner for RawCopyRunner {
    async fn import(&self, request: &ImportRequest) -> ImportResult<ImportedAsset> {
        let destination = PathBuf::from(&request.destination_folder);
        check_destination(&destination, &request.destination_folder).await?;

        let sources = request.sources();
        if sources.is_empty() {
            return Err(ImportError::NoSources(request.source.clone()));
        }

        let mut outputs = Vec::with_capacity(sources.len() + 1);
        for source in &sources {
            let file_name = source
                .file_name()
                .ok_or_else(|| ImportError::failed(source, "source has no file name"))?;
            let target = destination.join(file_name);
            // Sources already in place are left untouched.
            if target != *source {
                tokio::fs::copy(source, &target)
                    .await
                    .map_err(|e| ImportError::failed(source, e.to_string()))?;
            }
            outputs.push(target);
        }

        if self.write_manifest {
            let manifest = destination.join(format!("{}.import.json", request.asset_name()));
            let json = serde_json::to_string_pretty(request)?;
            tokio::fs::write(&manifest, json).await?;
            outputs.push(manifest);
        }

        Ok(ImportedAsset { outputs })
    }
}

async fn check_destination(path: &Path, folder: &str) -> ImportResult<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ImportError::Destination {
            folder: folder.to_string(),
            message: "not a directory".to_string(),
        }),
        Err(e) => Err(ImportError::Destination {
            folder: folder.to_string(),
            message: e.to_string(),
        }),
    }
}
