//! Per-kind import settings
//!
//! Every staged proxy carries one settings object for its kind. Settings are
//! plain serde data so they can travel with an [`ImportRequest`](crate::ImportRequest)
//! and be written next to imported assets.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::kind::AssetKind;

/// Capability shared by all import settings
pub trait ImportSettings: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Asset kind these settings configure
    const KIND: AssetKind;

    /// Copy the user-editable parameters of `other` into `self`
    fn copy_from(&mut self, other: &Self) {
        *self = other.clone();
    }

    /// Wrap into the kind-tagged form
    fn into_tagged(self) -> AssetImportSettings;
}

/// Geometry (mesh) import parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryImportSettings {
    /// Angle in degrees under which adjacent faces share normals
    pub smoothing_angle: f32,
    pub calculate_normals: bool,
    pub calculate_tangents: bool,
    pub reverse_handedness: bool,
    pub import_embedded_textures: bool,
    pub import_animations: bool,
}

impl Default for GeometryImportSettings {
    fn default() -> Self {
        Self {
            smoothing_angle: 178.0,
            calculate_normals: false,
            calculate_tangents: true,
            reverse_handedness: false,
            import_embedded_textures: true,
            import_animations: true,
        }
    }
}

impl ImportSettings for GeometryImportSettings {
    const KIND: AssetKind = AssetKind::Geometry;

    fn into_tagged(self) -> AssetImportSettings {
        AssetImportSettings::Geometry(self)
    }
}

/// Texture dimension produced by an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextureDimension {
    Texture1D,
    #[default]
    Texture2D,
    Texture3D,
    TextureCube,
}

/// Output pixel format of an imported texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFormat {
    /// Pick a block format from the image content
    #[default]
    Auto,
    Bc1,
    Bc3,
    Bc4,
    Bc5,
    Bc6h,
    Bc7,
    Uncompressed,
}

/// Texture import parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureImportSettings {
    /// Ordered source images, group owner first. Filled right before dispatch.
    pub sources: Vec<PathBuf>,
    pub dimension: TextureDimension,
    /// Number of mip levels to generate, 0 for a full chain
    pub mip_levels: u32,
    /// Alpha coverage threshold used when generating mips
    pub alpha_threshold: f32,
    pub format: TextureFormat,
    pub compress: bool,
    pub prefer_bc7: bool,
    pub is_normal_map: bool,
}

impl Default for TextureImportSettings {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            dimension: TextureDimension::Texture2D,
            mip_levels: 0,
            alpha_threshold: 0.5,
            format: TextureFormat::Auto,
            compress: true,
            prefer_bc7: true,
            is_normal_map: false,
        }
    }
}

impl ImportSettings for TextureImportSettings {
    const KIND: AssetKind = AssetKind::Texture;

    // Source lists belong to the proxy's group and are never copied.
    fn copy_from(&mut self, other: &Self) {
        self.dimension = other.dimension;
        self.mip_levels = other.mip_levels;
        self.alpha_threshold = other.alpha_threshold;
        self.format = other.format;
        self.compress = other.compress;
        self.prefer_bc7 = other.prefer_bc7;
        self.is_normal_map = other.is_normal_map;
    }

    fn into_tagged(self) -> AssetImportSettings {
        AssetImportSettings::Texture(self)
    }
}

/// Audio import parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioImportSettings {
    /// Stream from disk instead of decoding up front
    pub stream: bool,
    pub normalize: bool,
    /// Resample to this rate; keep the source rate when `None`
    pub sample_rate: Option<u32>,
}

impl ImportSettings for AudioImportSettings {
    const KIND: AssetKind = AssetKind::Audio;

    fn into_tagged(self) -> AssetImportSettings {
        AssetImportSettings::Audio(self)
    }
}

/// Settings tagged with their asset kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AssetImportSettings {
    Geometry(GeometryImportSettings),
    Texture(TextureImportSettings),
    Audio(AudioImportSettings),
}

impl AssetImportSettings {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetImportSettings::Geometry(_) => AssetKind::Geometry,
            AssetImportSettings::Texture(_) => AssetKind::Texture,
            AssetImportSettings::Audio(_) => AssetKind::Audio,
        }
    }
}
