//! Decoded rasters of one texture, navigable by array, mip and depth

use image::RgbaImage;

use crate::error::{EditorError, EditorResult};
use crate::slice::{rasterize, SliceArray};

/// Display rasters indexed `[array][mip][depth]`
pub type RasterArray = Vec<Vec<Vec<RgbaImage>>>;

/// Three-level raster cache with clamped navigation indices.
///
/// Indices are stored as written and clamped on read, so a selection survives
/// a rebuild that temporarily shrinks the cache.
#[derive(Debug, Default, Clone)]
pub struct SliceCache {
    rasters: RasterArray,
    array_index: usize,
    mip_index: usize,
    depth_index: usize,
}

impl SliceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode raw slices into rasters without touching any cache
    pub fn decode(slices: &SliceArray, is_normal_map: bool) -> EditorResult<RasterArray> {
        let mut rasters = Vec::with_capacity(slices.len());
        for (array, mips) in slices.iter().enumerate() {
            let mut mip_rasters = Vec::with_capacity(mips.len());
            for (mip, depths) in mips.iter().enumerate() {
                let mut depth_rasters = Vec::with_capacity(depths.len());
                for (depth, slice) in depths.iter().enumerate() {
                    let raster = rasterize(slice, is_normal_map).map_err(|reason| {
                        log::error!("Slice [{}][{}][{}] failed to decode: {}", array, mip, depth, reason);
                        EditorError::Decode {
                            array,
                            mip,
                            depth,
                            reason,
                        }
                    })?;
                    depth_rasters.push(raster);
                }
                mip_rasters.push(depth_rasters);
            }
            rasters.push(mip_rasters);
        }
        Ok(rasters)
    }

    /// Rebuild every raster from raw slices.
    ///
    /// On error the cache keeps its previous content.
    pub fn rebuild(&mut self, slices: &SliceArray, is_normal_map: bool) -> EditorResult<()> {
        let rasters = Self::decode(slices, is_normal_map)?;
        self.replace(rasters);
        Ok(())
    }

    /// Swap in already decoded rasters
    pub fn replace(&mut self, rasters: RasterArray) {
        self.rasters = rasters;
        log::debug!("Slice cache rebuilt: {:?}", self.shape());
    }

    pub fn is_empty(&self) -> bool {
        self.selected_raster().is_none()
    }

    /// Array, mip and depth counts at the current selection
    pub fn shape(&self) -> (usize, usize, usize) {
        let arrays = self.rasters.len();
        let mips = self.rasters.get(self.array_index()).map_or(0, Vec::len);
        (arrays, mips, self.depth_count())
    }

    pub fn max_array_index(&self) -> usize {
        self.rasters.len().saturating_sub(1)
    }

    pub fn max_mip_index(&self) -> usize {
        self.rasters
            .get(self.array_index())
            .map_or(0, |mips| mips.len().saturating_sub(1))
    }

    /// Depth maximum for the effective array and mip
    pub fn max_depth_index(&self) -> usize {
        self.depth_count().saturating_sub(1)
    }

    fn depth_count(&self) -> usize {
        self.rasters
            .get(self.array_index())
            .and_then(|mips| mips.get(self.mip_index()))
            .map_or(0, Vec::len)
    }

    pub fn array_index(&self) -> usize {
        self.array_index.min(self.max_array_index())
    }

    pub fn mip_index(&self) -> usize {
        self.mip_index.min(self.max_mip_index())
    }

    pub fn depth_index(&self) -> usize {
        self.depth_index.min(self.max_depth_index())
    }

    pub fn set_array_index(&mut self, index: usize) {
        self.array_index = index;
    }

    /// Select a mip; the stored depth is re-clamped against the new mip.
    ///
    /// Without rasters there is nothing to clamp against and the depth is kept.
    pub fn set_mip_index(&mut self, index: usize) {
        self.mip_index = index;
        if self.depth_count() > 0 {
            self.depth_index = self.depth_index.min(self.max_depth_index());
        }
    }

    pub fn set_depth_index(&mut self, index: usize) {
        self.depth_index = index;
    }

    /// Raster at the effective indices, `None` before the first build
    pub fn selected_raster(&self) -> Option<&RgbaImage> {
        self.rasters
            .get(self.array_index())?
            .get(self.mip_index())?
            .get(self.depth_index())
    }

    pub fn rasters(&self) -> &RasterArray {
        &self.rasters
    }
}
