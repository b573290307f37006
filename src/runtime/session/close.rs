use std::rc::Rc;

use dmi_host::{PromptResponse, SavePrompt};
use tracing::{info, warn};

use crate::core::layout::StateGrid;

use super::EditorSession;

impl EditorSession {
    /// Runs the close flow. Returns true once the session is closed.
    ///
    /// `from_user_event` means the shell window is already going away; if the
    /// close then has to prompt or is refused, a replacement window is shown at
    /// the same bounds.
    pub(super) fn close(&mut self, from_user_event: bool, force: bool) -> bool {
        if self.closed {
            return true;
        }

        if !force && self.loading {
            if from_user_event {
                self.recreate_shell();
            }
            self.alert("Warning", "The file is still loading. Try again once it is open.");
            return false;
        }

        if !force && self.is_modified() {
            if from_user_event {
                self.recreate_shell();
            }
            if !self.confirm_close() {
                info!(session = %self.id, "close cancelled");
                return false;
            }
        }

        self.finish_close();
        true
    }

    /// Prompts once per modified bound surface, then once for the document.
    /// Returns false as soon as the user cancels.
    fn confirm_close(&mut self) -> bool {
        self.gc_open_sprites();

        let host = Rc::clone(&self.ctx.host);
        let modified: Vec<_> = self
            .sprites
            .iter()
            .filter(|sprite| sprite.is_modified(host.as_ref()))
            .cloned()
            .collect();

        for sprite in modified {
            let prompt = SavePrompt {
                title: "Warning".to_string(),
                message: format!(
                    "Save changes to state '{}' of {}?",
                    sprite.state(),
                    self.title
                ),
            };
            match self.prompt(&prompt) {
                PromptResponse::Save => {
                    if let Err(error) = self.save_sprite(&sprite) {
                        warn!(
                            session = %self.id,
                            state = sprite.state(),
                            %error,
                            "state save failed"
                        );
                        let message =
                            format!("Could not save state '{}': {error}", sprite.state());
                        self.alert("Error", &message);
                        return false;
                    }
                }
                PromptResponse::Discard => {}
                PromptResponse::Cancel => return false,
            }
        }

        if self.modified {
            let prompt = SavePrompt {
                title: "Warning".to_string(),
                message: format!("Save changes to {}?", self.title),
            };
            match self.prompt(&prompt) {
                PromptResponse::Save => {
                    if !self.save() {
                        return false;
                    }
                }
                PromptResponse::Discard => {}
                PromptResponse::Cancel => return false,
            }
        }

        true
    }

    fn prompt(&mut self, prompt: &SavePrompt) -> PromptResponse {
        self.shell
            .as_mut()
            .map_or(PromptResponse::Cancel, |shell| shell.prompt(prompt))
    }

    fn recreate_shell(&mut self) {
        let bounds = self.shell.as_ref().map(|shell| shell.bounds());
        let mut shell = Self::create_shell(self.id, &self.this, &self.ctx, &self.title);
        shell.show(bounds);
        self.shell = Some(shell);
        self.request_repaint();
    }

    fn finish_close(&mut self) {
        self.closed = true;
        self.loading = false;

        if let Some(mut shell) = self.shell.take() {
            shell.close();
        }

        self.ctx.registry.remove(self.id);

        if let Some(mut document) = self.document.take() {
            document.release();
        }

        let host = Rc::clone(&self.ctx.host);
        for sprite in self.sprites.drain(..) {
            if let Err(error) = sprite.close(host.as_ref()) {
                warn!(
                    session = %self.id,
                    state = sprite.state(),
                    %error,
                    "failed to close state surface"
                );
            }
        }

        for listener in self.listeners.drain(..) {
            host.unsubscribe(listener);
        }

        self.previews.clear();
        self.view.reset();
        self.grid = StateGrid::default();
        self.save_as_origin = None;
        info!(session = %self.id, "editor closed");
    }
}
