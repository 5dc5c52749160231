//! Asset proxies - staged source files awaiting import

use std::fmt;
use std::path::{is_separator, Path, PathBuf, MAIN_SEPARATOR};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{StagingError, StagingResult};
use crate::import::ImportRequest;
use crate::kind::AssetKind;
use crate::settings::{AudioImportSettings, GeometryImportSettings, ImportSettings, TextureImportSettings};
use crate::texture_group::TextureSourceGroup;

static NEXT_PROXY_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique proxy identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(u64);

impl ProxyId {
    /// Allocate the next identifier
    pub fn next() -> Self {
        Self(NEXT_PROXY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Proxy({})", self.0)
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize a destination folder so it ends with exactly one separator
pub fn normalize_destination(folder: &str) -> String {
    let mut normalized = folder.trim_end_matches(is_separator).to_string();
    normalized.push(MAIN_SEPARATOR);
    normalized
}

/// State shared by every proxy kind
#[derive(Debug, Clone)]
pub struct ProxyBase {
    id: ProxyId,
    source: PathBuf,
    destination_folder: String,
}

impl ProxyBase {
    /// Create the base for an existing source file.
    ///
    /// The source is stored canonicalized; the destination is normalized.
    pub fn new(source: &Path, destination_folder: &str) -> StagingResult<Self> {
        if !source.is_file() {
            return Err(StagingError::MissingSource(source.to_path_buf()));
        }
        let source = source
            .canonicalize()
            .map_err(|_| StagingError::MissingSource(source.to_path_buf()))?;

        Ok(Self {
            id: ProxyId::next(),
            source,
            destination_folder: normalize_destination(destination_folder),
        })
    }

    pub fn id(&self) -> ProxyId {
        self.id
    }

    /// Canonical source path
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Destination folder, always ending with a separator
    pub fn destination_folder(&self) -> &str {
        &self.destination_folder
    }

    pub(crate) fn set_destination_folder(&mut self, folder: &str) {
        let folder = normalize_destination(folder);
        if self.destination_folder != folder {
            log::debug!("{:?}: destination {} -> {}", self.id, self.destination_folder, folder);
            self.destination_folder = folder;
        }
    }
}

/// Capability interface implemented by every staged proxy kind
pub trait AssetProxy: Send + 'static {
    type Settings: ImportSettings;

    /// Construct a proxy with default settings
    fn create(base: ProxyBase) -> Self
    where
        Self: Sized;

    fn base(&self) -> &ProxyBase;

    fn base_mut(&mut self) -> &mut ProxyBase;

    fn settings(&self) -> &Self::Settings;

    fn settings_mut(&mut self) -> &mut Self::Settings;

    /// Copy another proxy's settings into this one
    fn copy_settings(&mut self, settings: &Self::Settings) {
        self.settings_mut().copy_from(settings);
    }

    /// Whether the proxy has its own entry in the staged set
    fn is_staged(&self) -> bool {
        true
    }

    /// Proxies owned through this one (absorbed texture sources)
    fn group_members(&self) -> Vec<ProxyId> {
        Vec::new()
    }

    /// Hook run right before the proxy is turned into a request
    fn prepare_for_import(&mut self) {}

    fn kind(&self) -> AssetKind {
        <Self::Settings as ImportSettings>::KIND
    }

    fn id(&self) -> ProxyId {
        self.base().id()
    }

    fn source(&self) -> &Path {
        self.base().source()
    }

    fn destination_folder(&self) -> &str {
        self.base().destination_folder()
    }

    /// Turn the proxy into a finalized import request
    fn into_request(self) -> ImportRequest
    where
        Self: Sized,
    {
        ImportRequest {
            kind: self.kind(),
            source: self.source().to_path_buf(),
            destination_folder: self.destination_folder().to_string(),
            settings: self.settings().clone().into_tagged(),
        }
    }
}

/// Staged mesh source
#[derive(Debug, Clone)]
pub struct GeometryProxy {
    base: ProxyBase,
    settings: GeometryImportSettings,
}

impl AssetProxy for GeometryProxy {
    type Settings = GeometryImportSettings;

    fn create(base: ProxyBase) -> Self {
        Self {
            base,
            settings: GeometryImportSettings::default(),
        }
    }

    fn base(&self) -> &ProxyBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ProxyBase {
        &mut self.base
    }

    fn settings(&self) -> &GeometryImportSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut GeometryImportSettings {
        &mut self.settings
    }
}

/// Staged image source, optionally owning a group of further image sources
#[derive(Debug, Clone)]
pub struct TextureProxy {
    base: ProxyBase,
    settings: TextureImportSettings,
    group: TextureSourceGroup,
    staged: bool,
}

impl TextureProxy {
    /// Ordered source group; member 0 is always this proxy
    pub fn group(&self) -> &TextureSourceGroup {
        &self.group
    }

    pub(crate) fn group_mut(&mut self) -> &mut TextureSourceGroup {
        &mut self.group
    }

    pub(crate) fn set_staged(&mut self, staged: bool) {
        self.staged = staged;
    }
}

impl AssetProxy for TextureProxy {
    type Settings = TextureImportSettings;

    fn create(base: ProxyBase) -> Self {
        let group = TextureSourceGroup::new(base.id(), base.source().to_path_buf());
        Self {
            base,
            settings: TextureImportSettings::default(),
            group,
            staged: true,
        }
    }

    fn base(&self) -> &ProxyBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ProxyBase {
        &mut self.base
    }

    fn settings(&self) -> &TextureImportSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut TextureImportSettings {
        &mut self.settings
    }

    fn is_staged(&self) -> bool {
        self.staged
    }

    fn group_members(&self) -> Vec<ProxyId> {
        self.group.ids().skip(1).collect()
    }

    fn prepare_for_import(&mut self) {
        self.settings.sources = self.group.sources().map(Path::to_path_buf).collect();
    }
}

/// Staged audio source
#[derive(Debug, Clone)]
pub struct AudioProxy {
    base: ProxyBase,
    settings: AudioImportSettings,
}

impl AssetProxy for AudioProxy {
    type Settings = AudioImportSettings;

    fn create(base: ProxyBase) -> Self {
        Self {
            base,
            settings: AudioImportSettings::default(),
        }
    }

    fn base(&self) -> &ProxyBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ProxyBase {
        &mut self.base
    }

    fn settings(&self) -> &AudioImportSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut AudioImportSettings {
        &mut self.settings
    }
}
