use std::path::{Path, PathBuf};

use dmi_host::SaveTargetResponse;
use tracing::{error, info};

use crate::core::save_dialog::save_request;
use crate::error::EditorError;

use super::EditorSession;

impl EditorSession {
    /// Asks for a save target and writes the document there.
    pub(super) fn save(&mut self) -> bool {
        match self.pick_save_target() {
            Some(target) => self.write_document(&target),
            None => false,
        }
    }

    /// Runs the picker until the user confirms a target or cancels.
    ///
    /// Browsing to a new file stores it as the save target and re-shows the
    /// picker at the same spot, resized to fit the new path.
    pub(super) fn pick_save_target(&mut self) -> Option<PathBuf> {
        if self.closed || self.document.is_none() {
            return None;
        }

        let canvas = self.ctx.config.canvas;
        let mut path = self.path();
        let mut center = None;
        loop {
            let request = save_request(&self.title, &path, center, &canvas);
            let shell = self.shell.as_mut()?;

            match shell.pick_save_target(&request) {
                SaveTargetResponse::Cancel => return None,
                SaveTargetResponse::Browse {
                    path: picked,
                    bounds,
                } => {
                    self.save_path = Some(picked.clone());
                    path = picked;
                    center = Some(bounds.center());
                }
                SaveTargetResponse::Confirm(target) => {
                    self.save_path = Some(target.clone());
                    return Some(target);
                }
            }
        }
    }

    pub(super) fn write_document(&mut self, target: &Path) -> bool {
        let Some(document) = self.document.as_ref() else {
            return false;
        };

        match self.ctx.codec.encode(document.icon(), target) {
            Ok(()) => {
                self.modified = false;
                info!(session = %self.id, path = %target.display(), "document saved");
                true
            }
            Err(source) => {
                let error = EditorError::encode(target, source);
                error!(session = %self.id, %error, "failed to save document");
                self.alert("Error", &format!("Error saving file: {error}"));
                false
            }
        }
    }
}
