//! Temp-storage ownership for decoded documents.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use dmi_host::Codec;
use tracing::debug;

use crate::error::EditorError;

/// Owned temp directory backing one decoded document.
///
/// Invariant: the directory is handed to [`Codec::release_temp`] exactly once,
/// either through [`ResourceHandle::release`] or on drop.
pub struct ResourceHandle {
    path: PathBuf,
    codec: Rc<dyn Codec>,
    released: bool,
}

impl ResourceHandle {
    pub fn new(path: impl Into<PathBuf>, codec: Rc<dyn Codec>) -> Self {
        Self {
            path: path.into(),
            codec,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Releases the directory. Returns false if it was already released.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }

        self.released = true;
        self.codec.release_temp(&self.path, true);
        debug!(path = %self.path.display(), "released temp materialization");
        true
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("path", &self.path)
            .field("released", &self.released)
            .finish()
    }
}

/// Creates a fresh, uniquely named directory under `root` for one decode.
///
/// The directory outlives this call; ownership passes to the [`ResourceHandle`]
/// built around the decoded document.
pub fn allocate_temp_dir(root: &Path) -> Result<PathBuf, EditorError> {
    fs::create_dir_all(root).map_err(|source| EditorError::temp_dir(root, source))?;
    tempfile::Builder::new()
        .prefix("dmi-")
        .tempdir_in(root)
        .map(tempfile::TempDir::keep)
        .map_err(|source| EditorError::temp_dir(root, source))
}
