//! Per-state surface bindings.

use std::path::{Path, PathBuf};

use dmi_host::{Codec, HostBridge, HostError, IconDocument, SurfaceId};

use crate::error::EditorError;

/// Binds one icon state to the host surface editing it.
///
/// The surface is fixed for the binding's lifetime; only the state name can
/// change, through a rename of the state itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSprite {
    state: String,
    file_stem: String,
    surface: SurfaceId,
    file: PathBuf,
}

impl StateSprite {
    pub fn new(
        state: impl Into<String>,
        file_stem: impl Into<String>,
        surface: SurfaceId,
        file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            state: state.into(),
            file_stem: file_stem.into(),
            surface,
            file: file.into(),
        }
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Stem the state was exported under. Kept across renames, since the
    /// surface stays open on the exported file.
    pub fn file_stem(&self) -> &str {
        &self.file_stem
    }

    /// Temp file the surface was opened from and is snapshotted into.
    pub fn file(&self) -> &Path {
        &self.file
    }

    pub(crate) fn rename(&mut self, state: impl Into<String>) {
        self.state = state.into();
    }

    pub fn is_modified(&self, host: &dyn HostBridge) -> bool {
        host.surface_is_modified(self.surface)
    }

    pub fn is_live(&self, live: &[SurfaceId]) -> bool {
        live.contains(&self.surface)
    }

    pub fn filename(&self, host: &dyn HostBridge) -> Option<String> {
        host.surface_filename(self.surface)
    }

    /// Writes the surface's current pixels back into its state.
    pub fn save(
        &self,
        host: &dyn HostBridge,
        codec: &dyn Codec,
        icon: &mut IconDocument,
    ) -> Result<(), EditorError> {
        if icon.state(&self.state).is_none() {
            return Err(EditorError::unknown_state(&self.state));
        }

        host.snapshot_surface(self.surface, &self.file)?;
        codec.import_state(icon, &self.state, &self.file)?;
        Ok(())
    }

    pub fn close(&self, host: &dyn HostBridge) -> Result<(), HostError> {
        host.close_surface(self.surface)
    }
}
