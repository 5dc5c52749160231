//! # quarry_texture_editor - Texture Inspection
//!
//! Editor session for one imported texture:
//! - Raw slice rasterization (8-bit, float, normal-map reconstruction)
//! - Slice cache indexed by array, mip and depth with clamped navigation
//! - State machine gating load, reimport, regenerate and save
//! - Pluggable texture tools behind a blocking trait
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use quarry_texture_editor::{ImageTools, TextureEditorSession};
//!
//! let session = TextureEditorSession::new(Arc::new(ImageTools::new()));
//! session.load("Content/Tex/rock.png").await?;
//!
//! session.update_settings(|s| s.mip_levels = 0);
//! if session.reimport().await? {
//!     session.set_mip_index(2);
//!     let preview = session.selected_raster();
//! }
//! ```

pub mod error;
pub mod session;
pub mod slice;
pub mod slice_cache;
pub mod state;
pub mod tools;

pub use error::{EditorError, EditorResult};
pub use session::{Channel, ChannelMask, TextureEditorSession};
pub use slice::{rasterize, Slice, SliceArray, SliceFormat};
pub use slice_cache::{RasterArray, SliceCache};
pub use state::{EditorState, EditorStateMachine, StateGuard, StateTransition};
pub use tools::{ImageTools, TextureAsset, TextureTools, ToolsError};
