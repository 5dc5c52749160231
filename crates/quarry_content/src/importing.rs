//! Tracker for items handed to import jobs

use std::path::{Path, PathBuf};

use crate::import::{BatchId, ImportEvent};
use crate::kind::AssetKind;

/// Progress of one dispatched item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatus {
    Queued,
    Importing,
    Succeeded,
    Failed(String),
}

impl ImportStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, ImportStatus::Succeeded | ImportStatus::Failed(_))
    }
}

/// One dispatched item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportingItem {
    pub batch: BatchId,
    pub kind: AssetKind,
    pub source: PathBuf,
    pub status: ImportStatus,
}

/// Items dispatched by a staging area, updated from [`ImportEvent`]s
#[derive(Debug, Default)]
pub struct ImportingItems {
    items: Vec<ImportingItem>,
    filter: Option<AssetKind>,
}

impl ImportingItems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event
    pub fn apply(&mut self, event: &ImportEvent) {
        match event {
            ImportEvent::Queued { batch, kind, source } => {
                self.items.push(ImportingItem {
                    batch: *batch,
                    kind: *kind,
                    source: source.clone(),
                    status: ImportStatus::Queued,
                });
            }
            ImportEvent::Started { batch, source } => {
                self.set_status(*batch, source, ImportStatus::Importing);
            }
            ImportEvent::Succeeded { batch, source, .. } => {
                self.set_status(*batch, source, ImportStatus::Succeeded);
            }
            ImportEvent::Failed { batch, source, message } => {
                self.set_status(*batch, source, ImportStatus::Failed(message.clone()));
            }
            ImportEvent::BatchFinished { .. } => {}
        }
    }

    fn set_status(&mut self, batch: BatchId, source: &Path, status: ImportStatus) {
        match self
            .items
            .iter_mut()
            .find(|item| item.batch == batch && item.source == source)
        {
            Some(item) => item.status = status,
            None => log::warn!("{}: no tracked item for {:?}", batch, source),
        }
    }

    /// Restrict [`visible`](Self::visible) to one kind, or show all with `None`
    pub fn set_filter(&mut self, kind: Option<AssetKind>) {
        self.filter = kind;
    }

    pub fn filter(&self) -> Option<AssetKind> {
        self.filter
    }

    /// Items passing the current filter, in dispatch order
    pub fn visible(&self) -> impl Iterator<Item = &ImportingItem> + '_ {
        self.items
            .iter()
            .filter(move |item| self.filter.map_or(true, |kind| item.kind == kind))
    }

    pub fn items(&self) -> &[ImportingItem] {
        &self.items
    }

    /// Whether any item is still queued or importing
    pub fn has_pending(&self) -> bool {
        self.items.iter().any(|item| !item.status.is_finished())
    }

    /// Drop finished items of a kind, or of every kind with `None`.
    ///
    /// Returns the number of items removed.
    pub fn clear(&mut self, kind: Option<AssetKind>) -> usize {
        let before = self.items.len();
        self.items.retain(|item| {
            let matches = kind.map_or(true, |k| item.kind == k);
            !(matches && item.status.is_finished())
        });
        before - self.items.len()
    }
}
