//! Texture tools collaborator
//!
//! The editor session never touches files itself. Loading, re-importing,
//! decompressing and saving all go through a [`TextureTools`] implementation,
//! called from blocking worker tasks.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::RgbaImage;
use quarry_content::{TextureDimension, TextureImportSettings};
use thiserror::Error;

use crate::slice::{data_size, Slice, SliceArray, SliceFormat};

/// Errors reported by texture tools
#[derive(Debug, Error)]
pub enum ToolsError {
    #[error("Failed to load {path:?}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("Import failed: {0}")]
    Import(String),

    #[error("Decompression failed: {0}")]
    Decompress(String),

    #[error("Failed to save {path:?}: {message}")]
    Save { path: PathBuf, message: String },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A texture asset as seen by the editor
#[derive(Debug, Clone, PartialEq)]
pub struct TextureAsset {
    /// Asset file the texture was loaded from
    pub path: PathBuf,
    pub import_settings: TextureImportSettings,
    /// Raw slices `[array][mip][depth]`, possibly block-compressed
    pub slices: SliceArray,
}

impl TextureAsset {
    pub fn is_normal_map(&self) -> bool {
        self.import_settings.is_normal_map
    }

    /// Total raw bytes
    pub fn data_size(&self) -> usize {
        data_size(&self.slices)
    }
}

/// Load/import/decompress/save routines used by an editor session
pub trait TextureTools: Send + Sync {
    fn load(&self, path: &Path) -> Result<TextureAsset, ToolsError>;

    /// Re-import the asset's sources using its current settings
    fn import(&self, asset: &mut TextureAsset) -> Result<(), ToolsError>;

    /// Produce displayable raw slices
    fn decompress(&self, asset: &TextureAsset) -> Result<SliceArray, ToolsError>;

    fn save(&self, asset: &TextureAsset, path: &Path) -> Result<(), ToolsError>;
}

/// Tools backed by the `image` crate.
///
/// Produces uncompressed RGBA8 slices. Sources become array elements (2D,
/// cube) or depth slices (3D), and mips are generated by downsampling.
/// Saving writes the first slice in the format implied by the file extension.
#[derive(Debug, Clone, Default)]
pub struct ImageTools;

impl ImageTools {
    pub fn new() -> Self {
        Self
    }

    fn open(path: &Path) -> Result<RgbaImage, ToolsError> {
        image::open(path)
            .map(|img| img.to_rgba8())
            .map_err(|e| ToolsError::Load {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn build(settings: &TextureImportSettings, sources: &[PathBuf]) -> Result<SliceArray, ToolsError> {
        let images = sources
            .iter()
            .map(|p| Self::open(p))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(first) = images.first() else {
            return Err(ToolsError::Import("no source images".to_string()));
        };
        let (width, height) = first.dimensions();
        if images.iter().any(|img| img.dimensions() != (width, height)) {
            return Err(ToolsError::Import("source images differ in size".to_string()));
        }

        let levels = mip_count(width, height, settings.mip_levels);
        let slices = match settings.dimension {
            TextureDimension::Texture3D => vec![volume_chain(&images, levels)],
            _ => images.iter().map(|img| mip_chain(img, levels)).collect(),
        };
        Ok(slices)
    }
}

impl TextureTools for ImageTools {
    fn load(&self, path: &Path) -> Result<TextureAsset, ToolsError> {
        let settings = TextureImportSettings {
            sources: vec![path.to_path_buf()],
            mip_levels: 1,
            compress: false,
            ..Default::default()
        };
        let slices = Self::build(&settings, &settings.sources)?;
        log::debug!("Loaded {:?} ({} bytes)", path, data_size(&slices));
        Ok(TextureAsset {
            path: path.to_path_buf(),
            import_settings: settings,
            slices,
        })
    }

    fn import(&self, asset: &mut TextureAsset) -> Result<(), ToolsError> {
        let sources = if asset.import_settings.sources.is_empty() {
            vec![asset.path.clone()]
        } else {
            asset.import_settings.sources.clone()
        };
        asset.slices = Self::build(&asset.import_settings, &sources)?;
        Ok(())
    }

    fn decompress(&self, asset: &TextureAsset) -> Result<SliceArray, ToolsError> {
        if let Some(slice) = asset.slices.iter().flatten().flatten().find(|s| s.format.is_compressed()) {
            return Err(ToolsError::Decompress(format!("{:?} is not supported", slice.format)));
        }
        Ok(asset.slices.clone())
    }

    fn save(&self, asset: &TextureAsset, path: &Path) -> Result<(), ToolsError> {
        let slice = asset
            .slices
            .first()
            .and_then(|mips| mips.first())
            .and_then(|depths| depths.first())
            .ok_or_else(|| ToolsError::Save {
                path: path.to_path_buf(),
                message: "texture has no slices".to_string(),
            })?;
        let raster = crate::slice::rasterize(slice, false).map_err(|message| ToolsError::Save {
            path: path.to_path_buf(),
            message,
        })?;
        raster.save(path)?;
        Ok(())
    }
}

/// Number of mip levels, 0 requesting the full chain
fn mip_count(width: u32, height: u32, requested: u32) -> u32 {
    let full = 32 - width.max(height).max(1).leading_zeros();
    if requested == 0 {
        full
    } else {
        requested.min(full)
    }
}

fn mip_chain(image: &RgbaImage, levels: u32) -> Vec<Vec<Slice>> {
    (0..levels).map(|level| vec![to_slice(&downsample(image, level))]).collect()
}

/// Depth halves with each mip, keeping every 2^level-th slice
fn volume_chain(images: &[RgbaImage], levels: u32) -> Vec<Vec<Slice>> {
    (0..levels)
        .map(|level| {
            images
                .iter()
                .step_by(1 << level.min(31))
                .map(|img| to_slice(&downsample(img, level)))
                .collect()
        })
        .collect()
}

fn downsample(image: &RgbaImage, level: u32) -> RgbaImage {
    if level == 0 {
        return image.clone();
    }
    let width = (image.width() >> level).max(1);
    let height = (image.height() >> level).max(1);
    image::imageops::resize(image, width, height, FilterType::Triangle)
}

fn to_slice(image: &RgbaImage) -> Slice {
    Slice::new(image.width(), image.height(), SliceFormat::Rgba8, image.as_raw().clone())
}
