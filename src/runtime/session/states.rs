//! Per-state operations: binding states to host surfaces and editing the
//! document's state list.

use std::rc::Rc;

use dmi_host::SurfaceId;
use tracing::{debug, info, warn};

use crate::core::binding::StateSprite;
use crate::core::document::Document;
use crate::error::EditorError;

use super::EditorSession;

impl EditorSession {
    fn document_mut(&mut self) -> Result<&mut Document, EditorError> {
        if self.closed {
            return Err(EditorError::Closed);
        }
        self.document.as_mut().ok_or(EditorError::NoDocument)
    }

    fn require_state(&mut self, name: &str) -> Result<&mut Document, EditorError> {
        let document = self.document_mut()?;
        if document.icon().state(name).is_none() {
            return Err(EditorError::unknown_state(name));
        }
        Ok(document)
    }

    /// Writes a bound surface back into its state.
    pub(super) fn save_sprite(&mut self, sprite: &StateSprite) -> Result<(), EditorError> {
        let host = Rc::clone(&self.ctx.host);
        let codec = Rc::clone(&self.ctx.codec);
        let document = self.document_mut()?;
        sprite.save(host.as_ref(), codec.as_ref(), document.icon_mut())?;

        self.modified = true;
        if let Some(document) = self.document.as_ref() {
            self.previews.refresh_state(document.icon(), sprite.state());
        }
        self.request_repaint();
        debug!(session = %self.id, state = sprite.state(), "state surface saved");
        Ok(())
    }

    /// Opens `name` as a host surface, or brings its existing surface forward.
    pub(super) fn open_state(&mut self, name: &str) -> Result<SurfaceId, EditorError> {
        self.require_state(name)?;
        self.gc_open_sprites();

        if let Some(sprite) = self.sprites.iter().find(|sprite| sprite.state() == name) {
            let surface = sprite.surface();
            self.switch_tab(surface);
            return Ok(surface);
        }

        let codec = Rc::clone(&self.ctx.codec);
        let file_stem = self.unused_file_stem(name);
        let file = {
            let document = self.require_state(name)?;
            codec.export_state(document.icon(), name, &file_stem)?
        };
        let surface = self.ctx.host.open_surface(&file)?;
        if let Some(index) = self.sprite_index(surface) {
            warn!(
                session = %self.id,
                %surface,
                bound = self.sprites[index].state(),
                "surface already bound to another state"
            );
            return Err(EditorError::SurfaceClaimed { surface });
        }
        if let Some(owner) = self.ctx.registry.claimed_by(surface, self.id) {
            warn!(session = %self.id, %owner, %surface, "surface already bound elsewhere");
            return Err(EditorError::SurfaceClaimed { surface });
        }

        self.sprites.push(StateSprite::new(name, file_stem, surface, file));
        info!(session = %self.id, state = name, %surface, "state opened");
        Ok(surface)
    }

    /// A renamed binding keeps its exported file, so the state's own name
    /// may already be taken by another binding's stem.
    fn unused_file_stem(&self, name: &str) -> String {
        let taken = |stem: &str| self.sprites.iter().any(|sprite| sprite.file_stem() == stem);
        if !taken(name) {
            return name.to_string();
        }
        (2..)
            .map(|n| format!("{name} {n}"))
            .find(|stem| !taken(stem.as_str()))
            .unwrap_or_else(|| name.to_string())
    }

    pub(super) fn new_state(&mut self) -> Result<String, EditorError> {
        let codec = Rc::clone(&self.ctx.codec);
        let document = self.document_mut()?;
        let name = document.icon().unique_state_name("state");
        codec.create_state(document.icon_mut(), &name)?;

        self.document_changed();
        info!(session = %self.id, state = %name, "state created");
        Ok(name)
    }

    pub(super) fn remove_state(&mut self, name: &str) -> Result<(), EditorError> {
        let codec = Rc::clone(&self.ctx.codec);
        let document = self.require_state(name)?;
        codec.remove_state(document.icon_mut(), name)?;

        let host = Rc::clone(&self.ctx.host);
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .sprites
            .drain(..)
            .partition(|sprite| sprite.state() == name);
        self.sprites = kept;
        for sprite in removed {
            if let Err(error) = sprite.close(host.as_ref()) {
                warn!(session = %self.id, state = name, %error, "failed to close state surface");
            }
        }

        self.document_changed();
        info!(session = %self.id, state = name, "state removed");
        Ok(())
    }

    pub(super) fn rename_state(&mut self, from: &str, to: &str) -> Result<(), EditorError> {
        let codec = Rc::clone(&self.ctx.codec);
        let document = self.require_state(from)?;
        if from == to {
            return Ok(());
        }
        if document.icon().state(to).is_some() {
            return Err(EditorError::DuplicateState {
                name: to.to_string(),
            });
        }
        codec.rename_state(document.icon_mut(), from, to)?;

        for sprite in self
            .sprites
            .iter_mut()
            .filter(|sprite| sprite.state() == from)
        {
            sprite.rename(to);
        }

        self.document_changed();
        info!(session = %self.id, from, to, "state renamed");
        Ok(())
    }

    pub(super) fn duplicate_state(&mut self, name: &str) -> Result<String, EditorError> {
        let codec = Rc::clone(&self.ctx.codec);
        let document = self.require_state(name)?;
        let copy = document.icon().unique_state_name(&format!("{name} copy"));
        codec.copy_state(document.icon_mut(), name, &copy)?;

        self.document_changed();
        info!(session = %self.id, state = name, copy = %copy, "state duplicated");
        Ok(copy)
    }

    fn document_changed(&mut self) {
        self.modified = true;
        if let Some(document) = self.document.as_ref() {
            self.previews.load_previews(document.icon());
        }
        self.relayout();
        self.request_repaint();
    }
}
