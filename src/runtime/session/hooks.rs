//! Host command interception.

use std::cell::RefCell;
use std::rc::Weak;

use dmi_host::{CommandPhase, HostBridge, HostCommand, HostCommandEvent, ListenerId};
use tracing::{debug, info, warn};

use super::EditorSession;

pub(super) fn subscribe(
    this: &Weak<RefCell<EditorSession>>,
    host: &dyn HostBridge,
) -> Vec<ListenerId> {
    let before = this.clone();
    let after = this.clone();
    vec![
        host.subscribe(
            CommandPhase::Before,
            Box::new(move |event: &mut HostCommandEvent| {
                with_open_session(&before, |session| session.before_command(event))
            }),
        ),
        host.subscribe(
            CommandPhase::After,
            Box::new(move |event: &mut HostCommandEvent| {
                with_open_session(&after, |session| session.after_command(event))
            }),
        ),
    ]
}

fn with_open_session(
    this: &Weak<RefCell<EditorSession>>,
    handle: impl FnOnce(&mut EditorSession),
) {
    let Some(inner) = this.upgrade() else {
        return;
    };
    let Ok(mut session) = inner.try_borrow_mut() else {
        return;
    };
    if !session.closed {
        handle(&mut session);
    }
}

impl EditorSession {
    fn before_command(&mut self, event: &mut HostCommandEvent) {
        let command = event.command().clone();
        match command {
            HostCommand::SaveFile => {
                let Some(active) = self.ctx.host.active_surface() else {
                    return;
                };
                let Some(sprite) = self
                    .sprite_index(active)
                    .map(|index| self.sprites[index].clone())
                else {
                    return;
                };

                if let Err(error) = self.save_sprite(&sprite) {
                    warn!(
                        session = %self.id,
                        state = sprite.state(),
                        %error,
                        "state save declined"
                    );
                    self.alert(
                        "Error",
                        &format!("Could not save state '{}': {error}", sprite.state()),
                    );
                    event.stop_propagation();
                }
            }
            HostCommand::SaveFileAs => {
                if self.save_as_origin.is_some() {
                    return;
                }
                let Some(active) = self.ctx.host.active_surface() else {
                    return;
                };
                if let Some(index) = self.sprite_index(active) {
                    let host = self.ctx.host.as_ref();
                    self.save_as_origin = self.sprites[index].filename(host);
                    debug!(
                        session = %self.id,
                        surface = %active,
                        "recorded filename before save-as"
                    );
                }
            }
            _ => {}
        }
    }

    fn after_command(&mut self, event: &HostCommandEvent) {
        match event.command() {
            HostCommand::SaveFileAs => {
                let origin = self.save_as_origin.take();
                let (Some(origin), Some(active)) = (origin, self.ctx.host.active_surface()) else {
                    return;
                };
                let Some(index) = self.sprite_index(active) else {
                    return;
                };

                let current = self.sprites[index].filename(self.ctx.host.as_ref());
                if current.as_deref() != Some(origin.as_str()) {
                    let sprite = self.sprites.remove(index);
                    info!(
                        session = %self.id,
                        state = sprite.state(),
                        filename = current.as_deref().unwrap_or_default(),
                        "state surface saved elsewhere; binding dropped"
                    );
                    self.request_repaint();
                }
            }
            command if command.closes_surfaces() => {
                if self.gc_open_sprites() > 0 {
                    self.request_repaint();
                }
            }
            _ => {}
        }
    }
}
