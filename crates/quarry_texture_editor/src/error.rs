//! Error types for the texture editor

use thiserror::Error;

use crate::state::EditorState;
use crate::tools::ToolsError;

/// Result type for editor operations
pub type EditorResult<T> = std::result::Result<T, EditorError>;

/// Texture editor errors
#[derive(Debug, Error)]
pub enum EditorError {
    /// Another operation is in flight for this session
    #[error("Session busy: {requested} requested while {current}")]
    SessionBusy {
        current: EditorState,
        requested: EditorState,
    },

    /// A raw slice could not be rasterized
    #[error("Failed to decode slice [array {array}, mip {mip}, depth {depth}]: {reason}")]
    Decode {
        array: usize,
        mip: usize,
        depth: usize,
        reason: String,
    },

    /// Import reported by the tools collaborator
    #[error("Import failed: {0}")]
    ImportFailure(String),

    /// Save reported by the tools collaborator
    #[error("Save failed: {0}")]
    SaveFailure(String),

    /// No asset is loaded in the session
    #[error("No texture asset loaded")]
    NoAsset,

    /// Worker task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Worker(String),

    /// Tools collaborator error
    #[error(transparent)]
    Tools(#[from] ToolsError),
}
