//! # quarry_content - Import Staging
//!
//! Staging layer between dropped source files and the asset import jobs:
//! - Extension based classification into geometry, texture and audio
//! - Per-kind proxy collections with canonical-path deduplication
//! - Texture source groups with order-preserving batch moves
//! - Fire-and-forget import dispatch on a tokio runtime
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use quarry_content::prelude::*;
//!
//! let project = ProjectContext::new("/proj/Content")?;
//! let mut staging = StagingArea::new(project);
//! staging.add_files(&["/drops/a.png", "/drops/ship.fbx"], "/proj/Content/Imported")?;
//!
//! let dispatcher = ImportDispatcher::new(Arc::new(RawCopyRunner::default()), 2)?;
//! staging.import(&dispatcher);
//!
//! // Later, on the owning thread:
//! staging.pump_import_events(&dispatcher);
//! for item in staging.importing().visible() {
//!     println!("{:?}: {:?}", item.source, item.status);
//! }
//! ```

pub mod config;
pub mod configurator;
pub mod error;
pub mod import;
pub mod importing;
pub mod kind;
pub mod project;
pub mod proxy;
pub mod settings;
pub mod staging;
pub mod texture_group;

pub use config::{ImportConfig, StagingConfig};
pub use configurator::KindConfigurator;
pub use error::{ImportError, ImportResult, StagingError, StagingResult};
pub use import::{BatchId, ImportDispatcher, ImportEvent, ImportJobRunner, ImportRequest, ImportedAsset, RawCopyRunner};
pub use importing::{ImportStatus, ImportingItem, ImportingItems};
pub use kind::{AssetKind, ExtensionSets};
pub use project::ProjectContext;
pub use proxy::{normalize_destination, AssetProxy, AudioProxy, GeometryProxy, ProxyBase, ProxyId, TextureProxy};
pub use settings::{
    AssetImportSettings, AudioImportSettings, GeometryImportSettings, ImportSettings, TextureDimension,
    TextureFormat, TextureImportSettings,
};
pub use staging::StagingArea;
pub use texture_group::{GroupMember, TextureSourceGroup};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::configurator::KindConfigurator;
    pub use crate::import::{ImportDispatcher, ImportEvent, ImportJobRunner, RawCopyRunner};
    pub use crate::kind::AssetKind;
    pub use crate::project::ProjectContext;
    pub use crate::proxy::{AssetProxy, ProxyId};
    pub use crate::settings::ImportSettings;
    pub use crate::staging::StagingArea;
}
