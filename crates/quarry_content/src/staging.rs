//! Staging area - routes dropped files to the per-kind configurators

use std::path::{Path, MAIN_SEPARATOR};

use crate::configurator::KindConfigurator;
use crate::error::{StagingError, StagingResult};
use crate::import::{BatchId, ImportDispatcher, ImportEvent};
use crate::importing::ImportingItems;
use crate::kind::{AssetKind, ExtensionSets};
use crate::project::ProjectContext;
use crate::proxy::{normalize_destination, AudioProxy, GeometryProxy, ProxyId, TextureProxy};

/// Top-level router owning the three kind configurators
pub struct StagingArea {
    project: ProjectContext,
    extensions: ExtensionSets,
    last_destination_folder: Option<String>,
    geometry: KindConfigurator<GeometryProxy>,
    textures: KindConfigurator<TextureProxy>,
    audio: KindConfigurator<AudioProxy>,
    importing: ImportingItems,
}

impl StagingArea {
    /// Create a staging area with the default extension sets
    pub fn new(project: ProjectContext) -> Self {
        Self::with_extensions(project, ExtensionSets::default())
    }

    pub fn with_extensions(project: ProjectContext, extensions: ExtensionSets) -> Self {
        Self {
            project,
            extensions: extensions.normalized(),
            last_destination_folder: None,
            geometry: KindConfigurator::new(),
            textures: KindConfigurator::new(),
            audio: KindConfigurator::new(),
            importing: ImportingItems::new(),
        }
    }

    pub fn project(&self) -> &ProjectContext {
        &self.project
    }

    pub fn extensions(&self) -> &ExtensionSets {
        &self.extensions
    }

    /// Last destination used by [`add_files`](Self::add_files)
    pub fn last_destination_folder(&self) -> Option<&str> {
        self.last_destination_folder.as_deref()
    }

    /// Validate a destination folder and return its normalized canonical form
    pub fn validate_destination(&self, folder: &str) -> StagingResult<String> {
        if folder.trim().is_empty() {
            return Err(StagingError::invalid_destination(folder, "empty path"));
        }
        let path = Path::new(folder);
        if !path.exists() {
            return Err(StagingError::invalid_destination(folder, "does not exist"));
        }
        if !path.is_dir() {
            return Err(StagingError::invalid_destination(folder, "not a directory"));
        }
        if !self.project.contains(path) {
            return Err(StagingError::invalid_destination(
                folder,
                format!("outside content root {:?}", self.project.content_root()),
            ));
        }
        let canonical = path.canonicalize()?;
        Ok(normalize_destination(&canonical.to_string_lossy()))
    }

    /// Classify `paths` by extension and stage them under `destination_folder`.
    ///
    /// Paths with an unsupported extension are dropped.
    pub fn add_files<P: AsRef<Path>>(&mut self, paths: &[P], destination_folder: &str) -> StagingResult<()> {
        let destination = self.validate_destination(destination_folder)?;
        self.last_destination_folder = Some(destination.clone());

        let mut geometry = Vec::new();
        let mut textures = Vec::new();
        let mut audio = Vec::new();
        for path in paths {
            let path = path.as_ref();
            match self.extensions.classify(path) {
                Some(AssetKind::Geometry) => geometry.push(path),
                Some(AssetKind::Texture) => textures.push(path),
                Some(AssetKind::Audio) => audio.push(path),
                None => log::debug!("Ignoring unsupported file {:?}", path),
            }
        }

        let added = self.geometry.add_files(geometry, &destination)
            + self.textures.add_files(textures, &destination)
            + self.audio.add_files(audio, &destination);
        log::info!("Staged {} file(s) into {}", added, destination);
        Ok(())
    }

    /// Destination a drop of `kind` lands in when none is given.
    ///
    /// The last staged proxy of that kind wins, then the last destination.
    pub fn default_destination(&self, kind: AssetKind) -> Option<String> {
        let from_kind = match kind {
            AssetKind::Geometry => self.geometry.last_destination_folder(),
            AssetKind::Texture => self.textures.last_destination_folder(),
            AssetKind::Audio => self.audio.last_destination_folder(),
        };
        from_kind
            .or(self.last_destination_folder.as_deref())
            .map(str::to_string)
    }

    /// Stage paths dropped without an explicit destination.
    ///
    /// Each kind goes to its [`default_destination`](Self::default_destination);
    /// fails if a kind has none.
    pub fn add_dropped_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> StagingResult<()> {
        for &kind in AssetKind::all() {
            let subset: Vec<&Path> = paths
                .iter()
                .map(AsRef::as_ref)
                .filter(|p| self.extensions.classify(p) == Some(kind))
                .collect();
            if subset.is_empty() {
                continue;
            }
            let destination = self
                .default_destination(kind)
                .ok_or_else(|| StagingError::invalid_destination("", "no destination folder chosen yet"))?;
            self.add_files(&subset, &destination)?;
        }
        Ok(())
    }

    /// Move a staged proxy to another destination folder.
    ///
    /// Returns false if no staged proxy of `kind` has this id.
    pub fn change_destination(&mut self, kind: AssetKind, id: ProxyId, folder: &str) -> StagingResult<bool> {
        let destination = self.validate_destination(folder)?;
        let changed = match kind {
            AssetKind::Geometry => self.geometry.set_destination_folder(id, &destination),
            AssetKind::Texture => self.textures.set_destination_folder(id, &destination),
            AssetKind::Audio => self.audio.set_destination_folder(id, &destination),
        };
        Ok(changed)
    }

    /// Destination shown relative to the content root
    pub fn content_subfolder(&self, folder: &str) -> String {
        self.project
            .content_subfolder(folder)
            .unwrap_or_else(|| MAIN_SEPARATOR.to_string())
    }

    /// Staged proxies across all kinds
    pub fn file_count(&self) -> usize {
        self.geometry.len() + self.textures.len() + self.audio.len()
    }

    pub fn count(&self, kind: AssetKind) -> usize {
        match kind {
            AssetKind::Geometry => self.geometry.len(),
            AssetKind::Texture => self.textures.len(),
            AssetKind::Audio => self.audio.len(),
        }
    }

    /// Dispatch every non-empty configurator and clear it.
    ///
    /// Returns the batches started, at most one per kind.
    pub fn import(&mut self, dispatcher: &ImportDispatcher) -> Vec<BatchId> {
        let batches: Vec<BatchId> = [
            self.geometry.import(dispatcher),
            self.textures.import(dispatcher),
            self.audio.import(dispatcher),
        ]
        .into_iter()
        .flatten()
        .collect();
        self.pump_import_events(dispatcher);
        batches
    }

    /// Apply pending dispatcher events to the importing tracker.
    ///
    /// Returns the events applied.
    pub fn pump_import_events(&mut self, dispatcher: &ImportDispatcher) -> Vec<ImportEvent> {
        let events = dispatcher.poll();
        for event in &events {
            self.importing.apply(event);
        }
        events
    }

    pub fn geometry(&self) -> &KindConfigurator<GeometryProxy> {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut KindConfigurator<GeometryProxy> {
        &mut self.geometry
    }

    pub fn textures(&self) -> &KindConfigurator<TextureProxy> {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut KindConfigurator<TextureProxy> {
        &mut self.textures
    }

    pub fn audio(&self) -> &KindConfigurator<AudioProxy> {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut KindConfigurator<AudioProxy> {
        &mut self.audio
    }

    pub fn importing(&self) -> &ImportingItems {
        &self.importing
    }

    pub fn importing_mut(&mut self) -> &mut ImportingItems {
        &mut self.importing
    }
}
