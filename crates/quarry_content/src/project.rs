//! Project context used to validate destination folders

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use crate::error::{StagingError, StagingResult};

/// The active project's content root.
///
/// Passed explicitly into [`StagingArea`](crate::StagingArea) instead of being
/// looked up globally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    content_root: PathBuf,
}

impl ProjectContext {
    /// Create a context for an existing content root directory
    pub fn new(content_root: impl AsRef<Path>) -> StagingResult<Self> {
        let root = content_root.as_ref();
        if !root.is_dir() {
            return Err(StagingError::InvalidContentRoot(root.to_path_buf()));
        }
        let content_root = root
            .canonicalize()
            .map_err(|_| StagingError::InvalidContentRoot(root.to_path_buf()))?;
        Ok(Self { content_root })
    }

    /// Canonical content root
    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// Check whether a path lies inside the content root (the root itself included)
    pub fn contains(&self, path: &Path) -> bool {
        match path.canonicalize() {
            Ok(path) => path.starts_with(&self.content_root),
            Err(_) => false,
        }
    }

    /// Render a folder relative to the content root, e.g. `/Textures/Rock/`.
    ///
    /// Returns `None` for folders outside the root.
    pub fn content_subfolder(&self, folder: &str) -> Option<String> {
        let folder = Path::new(folder).canonicalize().ok()?;
        let relative = folder.strip_prefix(&self.content_root).ok()?;
        let mut display = String::from(MAIN_SEPARATOR);
        let relative = relative.to_string_lossy();
        if !relative.is_empty() {
            display.push_str(&relative);
            display.push(MAIN_SEPARATOR);
        }
        Some(display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            ProjectContext::new(&missing),
            Err(StagingError::InvalidContentRoot(_))
        ));
    }

    #[test]
    fn test_contains() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("Content");
        std::fs::create_dir_all(content.join("Tex")).unwrap();

        let project = ProjectContext::new(&content).unwrap();
        assert!(project.contains(&content));
        assert!(project.contains(&content.join("Tex")));
        assert!(!project.contains(dir.path()));
        assert!(!project.contains(&content.join("does_not_exist")));
    }

    #[test]
    fn test_content_subfolder() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("Content");
        std::fs::create_dir_all(content.join("Tex")).unwrap();
        let project = ProjectContext::new(&content).unwrap();

        let tex = content.join("Tex");
        let sub = project.content_subfolder(&tex.to_string_lossy()).unwrap();
        assert_eq!(sub, format!("{sep}Tex{sep}", sep = MAIN_SEPARATOR));

        let root = project.content_subfolder(&content.to_string_lossy()).unwrap();
        assert_eq!(root, MAIN_SEPARATOR.to_string());

        assert!(project.content_subfolder(&dir.path().to_string_lossy()).is_none());
    }
}
