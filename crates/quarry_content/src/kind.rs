//! Asset kinds and extension based classification

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Kind of asset a staged source file becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Geometry,
    Texture,
    Audio,
}

impl AssetKind {
    pub fn all() -> &'static [AssetKind] {
        &[AssetKind::Geometry, AssetKind::Texture, AssetKind::Audio]
    }

    pub fn name(&self) -> &'static str {
        match self {
            AssetKind::Geometry => "geometry",
            AssetKind::Texture => "texture",
            AssetKind::Audio => "audio",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Default mesh source extensions
pub const MESH_EXTENSIONS: &[&str] = &["fbx", "obj"];

/// Default image source extensions
pub const IMAGE_EXTENSIONS: &[&str] = &["bmp", "png", "jpg", "jpeg", "tiff", "tif", "tga", "dds", "hdr"];

/// Default audio source extensions
pub const AUDIO_EXTENSIONS: &[&str] = &["ogg", "wav", "mp3"];

/// The three fixed extension sets used to route dropped files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionSets {
    pub mesh: BTreeSet<String>,
    pub image: BTreeSet<String>,
    pub audio: BTreeSet<String>,
}

impl Default for ExtensionSets {
    fn default() -> Self {
        Self {
            mesh: collect(MESH_EXTENSIONS.iter().copied()),
            image: collect(IMAGE_EXTENSIONS.iter().copied()),
            audio: collect(AUDIO_EXTENSIONS.iter().copied()),
        }
    }
}

impl ExtensionSets {
    /// Build sets from arbitrary spellings (".PNG", "png", ...)
    pub fn new<'a>(
        mesh: impl IntoIterator<Item = &'a str>,
        image: impl IntoIterator<Item = &'a str>,
        audio: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            mesh: collect(mesh),
            image: collect(image),
            audio: collect(audio),
        }
    }

    /// Lowercase every entry and strip leading dots
    pub fn normalized(self) -> Self {
        Self {
            mesh: collect(self.mesh.iter().map(String::as_str)),
            image: collect(self.image.iter().map(String::as_str)),
            audio: collect(self.audio.iter().map(String::as_str)),
        }
    }

    /// Determine the asset kind of a path from its extension.
    ///
    /// Returns `None` for extensions in none of the sets.
    pub fn classify(&self, path: &Path) -> Option<AssetKind> {
        let ext = path.extension().and_then(|e| e.to_str())?.to_lowercase();
        AssetKind::all()
            .iter()
            .copied()
            .find(|&kind| self.for_kind(kind).contains(&ext))
    }

    /// Extensions routed to a kind
    pub fn for_kind(&self, kind: AssetKind) -> &BTreeSet<String> {
        match kind {
            AssetKind::Geometry => &self.mesh,
            AssetKind::Texture => &self.image,
            AssetKind::Audio => &self.audio,
        }
    }
}

fn collect<'a>(exts: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    exts.into_iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
