//! Raw texture slices and their conversion to display rasters

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Pixel layout of a raw slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SliceFormat {
    R8,
    Rg8,
    Rgba8,
    Bgra8,
    R32Float,
    Rgba32Float,
    Bc1,
    Bc3,
    Bc4,
    Bc5,
    Bc6h,
    Bc7,
}

impl SliceFormat {
    /// Bytes per pixel, `None` for block-compressed formats
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            SliceFormat::R8 => Some(1),
            SliceFormat::Rg8 => Some(2),
            SliceFormat::Rgba8 | SliceFormat::Bgra8 | SliceFormat::R32Float => Some(4),
            SliceFormat::Rgba32Float => Some(16),
            _ => None,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.bytes_per_pixel().is_none()
    }
}

/// One raw slice at an (array, mip, depth) coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, at least `width * bytes_per_pixel`
    pub row_pitch: usize,
    pub format: SliceFormat,
    pub raw_content: Vec<u8>,
}

impl Slice {
    /// Tightly packed slice
    pub fn new(width: u32, height: u32, format: SliceFormat, raw_content: Vec<u8>) -> Self {
        let row_pitch = width as usize * format.bytes_per_pixel().unwrap_or(0);
        Self {
            width,
            height,
            row_pitch,
            format,
            raw_content,
        }
    }

    pub fn data_size(&self) -> usize {
        self.raw_content.len()
    }
}

/// Raw slices indexed `[array][mip][depth]`
pub type SliceArray = Vec<Vec<Vec<Slice>>>;

/// Total raw bytes of a slice array
pub fn data_size(slices: &SliceArray) -> usize {
    slices
        .iter()
        .flatten()
        .flatten()
        .map(Slice::data_size)
        .sum()
}

/// Convert a raw slice into an RGBA8 raster.
///
/// With `is_normal_map` red and green are read as the X/Y of a unit vector and
/// blue is replaced by the reconstructed Z.
pub fn rasterize(slice: &Slice, is_normal_map: bool) -> Result<RgbaImage, String> {
    let bpp = slice
        .format
        .bytes_per_pixel()
        .ok_or_else(|| format!("{:?} must be decompressed before display", slice.format))?;

    let row_bytes = slice.width as usize * bpp;
    if slice.row_pitch < row_bytes {
        return Err(format!("row pitch {} below row size {}", slice.row_pitch, row_bytes));
    }
    let needed = match slice.height as usize {
        0 => 0,
        h => slice.row_pitch * (h - 1) + row_bytes,
    };
    if slice.raw_content.len() < needed {
        return Err(format!("{} bytes of data, {} required", slice.raw_content.len(), needed));
    }

    let mut raster = RgbaImage::new(slice.width, slice.height);
    for y in 0..slice.height {
        let row = &slice.raw_content[y as usize * slice.row_pitch..][..row_bytes];
        for (x, px) in row.chunks_exact(bpp).enumerate() {
            let mut rgba = match slice.format {
                SliceFormat::R8 => [px[0], px[0], px[0], 255],
                SliceFormat::Rg8 => [px[0], px[1], 0, 255],
                SliceFormat::Rgba8 => [px[0], px[1], px[2], px[3]],
                SliceFormat::Bgra8 => [px[2], px[1], px[0], px[3]],
                SliceFormat::R32Float => {
                    let v = unorm(f32_at(px, 0));
                    [v, v, v, 255]
                }
                SliceFormat::Rgba32Float => [
                    unorm(f32_at(px, 0)),
                    unorm(f32_at(px, 1)),
                    unorm(f32_at(px, 2)),
                    unorm(f32_at(px, 3)),
                ],
                other => return Err(format!("{:?} cannot be rasterized", other)),
            };
            if is_normal_map {
                rgba[2] = reconstruct_z(rgba[0], rgba[1]);
            }
            raster.put_pixel(x as u32, y, Rgba(rgba));
        }
    }
    Ok(raster)
}

fn f32_at(px: &[u8], index: usize) -> f32 {
    let b = &px[index * 4..index * 4 + 4];
    f32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn unorm(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn reconstruct_z(r: u8, g: u8) -> u8 {
    let x = r as f32 / 255.0 * 2.0 - 1.0;
    let y = g as f32 / 255.0 * 2.0 - 1.0;
    let z = (1.0 - x * x - y * y).max(0.0).sqrt();
    unorm(z * 0.5 + 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_r8_is_grayscale() {
        let slice = Slice::new(2, 1, SliceFormat::R8, vec![0, 200]);
        let raster = rasterize(&slice, false).unwrap();
        assert_eq!(raster.get_pixel(1, 0), &Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn test_bgra_is_swizzled() {
        let slice = Slice::new(1, 1, SliceFormat::Bgra8, vec![1, 2, 3, 4]);
        let raster = rasterize(&slice, false).unwrap();
        assert_eq!(raster.get_pixel(0, 0), &Rgba([3, 2, 1, 4]));
    }

    #[test]
    fn test_row_pitch_padding_is_skipped() {
        let slice = Slice {
            width: 1,
            height: 2,
            row_pitch: 8,
            format: SliceFormat::Rgba8,
            raw_content: vec![10, 10, 10, 255, 0, 0, 0, 0, 20, 20, 20, 255],
        };
        let raster = rasterize(&slice, false).unwrap();
        assert_eq!(raster.get_pixel(0, 1), &Rgba([20, 20, 20, 255]));
    }

    #[test]
    fn test_float_is_clamped() {
        let mut raw = Vec::new();
        for v in [2.0f32, -1.0, 0.5, 1.0] {
            raw.extend_from_slice(&v.to_le_bytes());
        }
        let slice = Slice::new(1, 1, SliceFormat::Rgba32Float, raw);
        let raster = rasterize(&slice, false).unwrap();
        assert_eq!(raster.get_pixel(0, 0), &Rgba([255, 0, 128, 255]));
    }

    #[test]
    fn test_normal_map_reconstructs_blue() {
        // Flat normal (0, 0, 1)
        let slice = Slice::new(1, 1, SliceFormat::Rg8, vec![128, 128]);
        let raster = rasterize(&slice, true).unwrap();
        let px = raster.get_pixel(0, 0);
        assert!(px[2] >= 254, "blue was {}", px[2]);

        let plain = rasterize(&slice, false).unwrap();
        assert_eq!(plain.get_pixel(0, 0)[2], 0);
    }

    #[test]
    fn test_compressed_and_short_slices_fail() {
        let bc7 = Slice::new(4, 4, SliceFormat::Bc7, vec![0; 16]);
        assert!(rasterize(&bc7, false).is_err());

        let short = Slice::new(2, 2, SliceFormat::Rgba8, vec![0; 12]);
        assert!(rasterize(&short, false).is_err());
    }
}
