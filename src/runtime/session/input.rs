use dmi_host::{PointerEvent, ShellAction};
use tracing::warn;

use crate::core::layout::Activation;
use crate::error::EditorError;

use super::EditorSession;

impl EditorSession {
    pub(super) fn handle_pointer(&mut self, event: PointerEvent) {
        if self.closed {
            return;
        }

        let outcome = self.view.apply(&self.grid, event);
        if outcome.repaint {
            self.request_repaint();
        }

        let result = match outcome.activation {
            Some(Activation::OpenState(index)) => {
                let name = self
                    .document
                    .as_ref()
                    .and_then(|document| document.icon().states.get(index))
                    .map(|state| state.name.clone());
                match name {
                    Some(name) => self.open_state(&name).map(drop),
                    None => Ok(()),
                }
            }
            Some(Activation::NewState) => self.new_state().map(drop),
            None => Ok(()),
        };

        if let Err(error) = result {
            self.report(&error);
        }
    }

    pub(super) fn handle_action(&mut self, action: ShellAction) -> bool {
        match action {
            ShellAction::Save => self.save(),
            ShellAction::Close => self.close(false, false),
        }
    }

    fn report(&mut self, error: &EditorError) {
        warn!(session = %self.id, %error, "canvas action failed");
        self.alert("Error", &error.to_string());
    }
}
