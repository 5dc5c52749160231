//! Texture editor session
//!
//! Owns one loaded texture, its editable import settings and the slice cache
//! used to display it. Worker work (tools calls and decoding) runs through
//! `spawn_blocking`; results are applied on the session afterwards, and no
//! lock is held across an await.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use image::{Pixel, Rgba, RgbaImage};
use parking_lot::Mutex;
use quarry_content::TextureImportSettings;
use tokio::task::JoinError;

use crate::error::{EditorError, EditorResult};
use crate::slice::{data_size, Slice, SliceArray};
use crate::slice_cache::{RasterArray, SliceCache};
use crate::state::{EditorState, EditorStateMachine, StateTransition};
use crate::tools::{TextureAsset, TextureTools};

/// Color channel of the display raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

/// Channels shown in the display raster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMask {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
    pub alpha: bool,
}

impl Default for ChannelMask {
    fn default() -> Self {
        Self::all()
    }
}

impl ChannelMask {
    pub fn all() -> Self {
        Self {
            red: true,
            green: true,
            blue: true,
            alpha: true,
        }
    }

    pub fn none() -> Self {
        Self {
            red: false,
            green: false,
            blue: false,
            alpha: false,
        }
    }

    pub fn is_set(&self, channel: Channel) -> bool {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
            Channel::Alpha => self.alpha,
        }
    }

    fn flag_mut(&mut self, channel: Channel) -> &mut bool {
        match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
            Channel::Alpha => &mut self.alpha,
        }
    }

    /// Show only `channel`, or toggle it when `additive`
    pub fn select(&mut self, channel: Channel, additive: bool) {
        if additive {
            let flag = self.flag_mut(channel);
            *flag = !*flag;
        } else {
            *self = Self::none();
            *self.flag_mut(channel) = true;
        }
    }

    fn single(&self) -> Option<Channel> {
        let set: Vec<Channel> = [Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha]
            .into_iter()
            .filter(|&c| self.is_set(c))
            .collect();
        match set.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Apply the mask to a raster.
    ///
    /// A single selected channel is shown as grayscale. Otherwise unselected
    /// color channels are zeroed and alpha is opaque unless selected.
    pub fn apply(&self, raster: &RgbaImage) -> RgbaImage {
        if *self == Self::all() {
            return raster.clone();
        }
        let single = self.single();
        let mut out = raster.clone();
        for px in out.pixels_mut() {
            let Rgba([r, g, b, a]) = *px;
            *px = match single {
                Some(Channel::Red) => Rgba([r, r, r, 255]),
                Some(Channel::Green) => Rgba([g, g, g, 255]),
                Some(Channel::Blue) => Rgba([b, b, b, 255]),
                Some(Channel::Alpha) => Rgba([a, a, a, 255]),
                None => Rgba([
                    if self.red { r } else { 0 },
                    if self.green { g } else { 0 },
                    if self.blue { b } else { 0 },
                    if self.alpha { a } else { 255 },
                ]),
            };
        }
        out
    }
}

/// One open texture editor
pub struct TextureEditorSession {
    tools: Arc<dyn TextureTools>,
    state: EditorStateMachine,
    asset: Mutex<Option<Arc<TextureAsset>>>,
    /// Settings being edited, applied by `reimport`
    settings: Mutex<TextureImportSettings>,
    slices: Mutex<Arc<SliceArray>>,
    cache: Mutex<SliceCache>,
    channels: Mutex<ChannelMask>,
    /// Whether rasters are decoded as a normal map; display only
    normal_map_view: AtomicBool,
    can_save: AtomicBool,
}

impl TextureEditorSession {
    pub fn new(tools: Arc<dyn TextureTools>) -> Self {
        Self {
            tools,
            state: EditorStateMachine::new(),
            asset: Mutex::new(None),
            settings: Mutex::new(TextureImportSettings::default()),
            slices: Mutex::new(Arc::new(Vec::new())),
            cache: Mutex::new(SliceCache::new()),
            channels: Mutex::new(ChannelMask::default()),
            normal_map_view: AtomicBool::new(false),
            can_save: AtomicBool::new(false),
        }
    }

    /// Load an asset and build its slice cache
    pub async fn load(&self, path: impl AsRef<Path>) -> EditorResult<()> {
        let _guard = self.state.try_begin(EditorState::Loading)?;
        let path = path.as_ref().to_path_buf();
        log::info!("Loading texture {:?}", path);

        let tools = self.tools.clone();
        let loaded = tokio::task::spawn_blocking(move || {
            let asset = tools.load(&path)?;
            let slices = tools.decompress(&asset)?;
            let rasters = SliceCache::decode(&slices, asset.is_normal_map())?;
            Ok::<_, EditorError>((asset, slices, rasters))
        })
        .await
        .map_err(worker_error)?;

        let (asset, slices, rasters) = loaded.map_err(|e| {
            log::error!("Loading texture failed: {}", e);
            e
        })?;
        *self.settings.lock() = asset.import_settings.clone();
        self.apply(asset, slices, rasters);
        self.can_save.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Re-import with the edited settings.
    ///
    /// Returns false when the import fails or its worker panics; the edited
    /// settings are then rolled back to the asset's settings.
    pub async fn reimport(&self) -> EditorResult<bool> {
        let guard = self.state.try_begin(EditorState::Importing)?;
        let current = self.asset.lock().clone().ok_or(EditorError::NoAsset)?;
        let previous = current.import_settings.clone();

        let mut asset = (*current).clone();
        asset.import_settings = self.settings.lock().clone();

        let tools = self.tools.clone();
        let imported = tokio::task::spawn_blocking(move || tools.import(&mut asset).map(|_| asset)).await;

        let asset = match imported {
            Ok(Ok(asset)) => asset,
            Ok(Err(e)) => {
                self.rollback(previous, &EditorError::ImportFailure(e.to_string()));
                return Ok(false);
            }
            Err(e) => {
                self.rollback(previous, &worker_error(e));
                return Ok(false);
            }
        };

        guard.advance(EditorState::Loading);
        let tools = self.tools.clone();
        let decoded = tokio::task::spawn_blocking(move || {
            let slices = tools.decompress(&asset)?;
            let rasters = SliceCache::decode(&slices, asset.is_normal_map())?;
            Ok::<_, EditorError>((asset, slices, rasters))
        })
        .await;

        match decoded {
            Ok(Ok((asset, slices, rasters))) => {
                self.apply(asset, slices, rasters);
                self.can_save.store(true, Ordering::SeqCst);
                log::info!("Reimport finished");
                Ok(true)
            }
            Ok(Err(e)) => {
                self.rollback(previous, &e);
                Ok(false)
            }
            Err(e) => {
                self.rollback(previous, &worker_error(e));
                Ok(false)
            }
        }
    }

    /// Rebuild the display rasters, e.g. after toggling normal-map display.
    ///
    /// The import settings are left alone.
    pub async fn regenerate(&self, is_normal_map: bool) -> EditorResult<()> {
        let _guard = self.state.try_begin(EditorState::Processing)?;
        if self.asset.lock().is_none() {
            return Err(EditorError::NoAsset);
        }

        let slices = self.slices.lock().clone();
        let rasters = tokio::task::spawn_blocking(move || SliceCache::decode(&slices, is_normal_map))
            .await
            .map_err(worker_error)??;

        self.cache.lock().replace(rasters);
        self.normal_map_view.store(is_normal_map, Ordering::SeqCst);
        Ok(())
    }

    /// Save the asset back to its file.
    ///
    /// Returns false when the tools report a failure or their worker panics;
    /// pending changes stay saveable.
    pub async fn save(&self) -> EditorResult<bool> {
        let _guard = self.state.try_begin(EditorState::Saving)?;
        let asset = self.asset.lock().clone().ok_or(EditorError::NoAsset)?;
        let had_changes = self.can_save.swap(false, Ordering::SeqCst);

        let tools = self.tools.clone();
        let saved = tokio::task::spawn_blocking(move || {
            let path = asset.path.clone();
            tools.save(&asset, &path).map(|_| path)
        })
        .await;

        let error = match saved {
            Ok(Ok(path)) => {
                log::info!("Saved texture {:?}", path);
                return Ok(true);
            }
            Ok(Err(e)) => EditorError::SaveFailure(e.to_string()),
            Err(e) => worker_error(e),
        };
        log::error!("{}", error);
        self.can_save.store(had_changes, Ordering::SeqCst);
        Ok(false)
    }

    fn apply(&self, asset: TextureAsset, slices: SliceArray, rasters: RasterArray) {
        self.normal_map_view.store(asset.is_normal_map(), Ordering::SeqCst);
        *self.asset.lock() = Some(Arc::new(asset));
        *self.slices.lock() = Arc::new(slices);
        self.cache.lock().replace(rasters);
    }

    fn rollback(&self, previous: TextureImportSettings, error: &EditorError) {
        log::error!("{}; restoring previous settings", error);
        *self.settings.lock() = previous;
    }

    pub fn state(&self) -> EditorState {
        self.state.state()
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn subscribe(&self) -> Receiver<StateTransition> {
        self.state.subscribe()
    }

    pub fn has_asset(&self) -> bool {
        self.asset.lock().is_some()
    }

    pub fn asset_path(&self) -> Option<PathBuf> {
        self.asset.lock().as_ref().map(|a| a.path.clone())
    }

    /// Edited import settings
    pub fn settings(&self) -> TextureImportSettings {
        self.settings.lock().clone()
    }

    /// Edit the import settings; takes effect on the next `reimport`
    pub fn update_settings(&self, edit: impl FnOnce(&mut TextureImportSettings)) {
        edit(&mut self.settings.lock());
    }

    /// Whether the rasters currently show normal-map reconstruction
    pub fn is_normal_map_view(&self) -> bool {
        self.normal_map_view.load(Ordering::SeqCst)
    }

    /// Set after a successful reimport, cleared while saving
    pub fn can_save_changes(&self) -> bool {
        self.can_save.load(Ordering::SeqCst)
    }

    pub fn array_index(&self) -> usize {
        self.cache.lock().array_index()
    }

    pub fn mip_index(&self) -> usize {
        self.cache.lock().mip_index()
    }

    pub fn depth_index(&self) -> usize {
        self.cache.lock().depth_index()
    }

    pub fn set_array_index(&self, index: usize) {
        self.cache.lock().set_array_index(index);
    }

    pub fn set_mip_index(&self, index: usize) {
        self.cache.lock().set_mip_index(index);
    }

    pub fn set_depth_index(&self, index: usize) {
        self.cache.lock().set_depth_index(index);
    }

    /// Maximum array, mip and depth indices at the current selection
    pub fn max_indices(&self) -> (usize, usize, usize) {
        let cache = self.cache.lock();
        (cache.max_array_index(), cache.max_mip_index(), cache.max_depth_index())
    }

    /// Selected raster with the channel mask applied
    pub fn selected_raster(&self) -> Option<RgbaImage> {
        let mask = *self.channels.lock();
        self.cache.lock().selected_raster().map(|r| mask.apply(r))
    }

    /// Raw slice at the selected indices
    pub fn selected_slice(&self) -> Option<Slice> {
        let (array, mip, depth) = {
            let cache = self.cache.lock();
            (cache.array_index(), cache.mip_index(), cache.depth_index())
        };
        self.slices.lock().get(array)?.get(mip)?.get(depth).cloned()
    }

    /// Bytes per pixel of the selected raster, 1 when nothing is selected
    pub fn stride(&self) -> usize {
        self.cache
            .lock()
            .selected_raster()
            .map_or(1, |_| usize::from(Rgba::<u8>::CHANNEL_COUNT))
    }

    /// Total bytes of the raw slices
    pub fn data_size(&self) -> usize {
        data_size(&self.slices.lock())
    }

    pub fn channels(&self) -> ChannelMask {
        *self.channels.lock()
    }

    pub fn set_channel(&self, channel: Channel, additive: bool) {
        self.channels.lock().select(channel, additive);
    }

    pub fn set_all_channels(&self) {
        *self.channels.lock() = ChannelMask::all();
    }
}

fn worker_error(e: JoinError) -> EditorError {
    log::error!("Editor worker failed: {}", e);
    EditorError::Worker(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_select() {
        let mut mask = ChannelMask::all();
        mask.select(Channel::Green, false);
        assert_eq!(mask.single(), Some(Channel::Green));

        mask.select(Channel::Alpha, true);
        assert!(mask.green && mask.alpha && !mask.red);
        assert_eq!(mask.single(), None);

        mask.select(Channel::Alpha, true);
        assert_eq!(mask.single(), Some(Channel::Green));
    }

    #[test]
    fn test_channel_apply() {
        let raster = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 40]));

        let mut mask = ChannelMask::all();
        assert_eq!(mask.apply(&raster), raster);

        mask.select(Channel::Blue, false);
        assert_eq!(mask.apply(&raster).get_pixel(0, 0), &Rgba([30, 30, 30, 255]));

        mask.select(Channel::Red, true);
        assert_eq!(mask.apply(&raster).get_pixel(0, 0), &Rgba([10, 0, 30, 255]));
    }
}
