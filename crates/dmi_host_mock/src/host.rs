use std::cell::{Ref, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use dmi_host::{
    CommandListener, CommandPhase, HostBridge, HostCommand, HostCommandEvent, HostError,
    ListenerId, SurfaceId,
};

/// One open surface in the mock host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSurface {
    pub id: SurfaceId,
    pub filename: String,
    pub path: PathBuf,
    pub modified: bool,
    /// Number of frame images drawn on the surface; reported by snapshots.
    pub images: u64,
}

#[derive(Debug, Default)]
struct HostState {
    surfaces: Vec<MockSurface>,
    active: Option<usize>,
    next_surface: u64,
    next_listener: u64,
    advance_calls: usize,
    closed: Vec<SurfaceId>,
    snapshots: Vec<(SurfaceId, PathBuf)>,
    fail_snapshots: bool,
    fail_close: Vec<SurfaceId>,
}

struct ListenerEntry {
    id: ListenerId,
    phase: CommandPhase,
    listener: Rc<RefCell<CommandListener>>,
}

/// Host bridge with tab-ordered surfaces and only "advance to next" focusing.
#[derive(Default)]
pub struct MockHost {
    state: RefCell<HostState>,
    listeners: RefCell<Vec<ListenerEntry>>,
}

impl MockHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a surface that no editor session knows about and makes it active.
    pub fn open_external(&self, filename: &str) -> SurfaceId {
        self.push_surface(PathBuf::from(filename), 1)
    }

    #[must_use]
    pub fn surface(&self, surface: SurfaceId) -> Option<MockSurface> {
        self.state
            .borrow()
            .surfaces
            .iter()
            .find(|entry| entry.id == surface)
            .cloned()
    }

    pub fn set_modified(&self, surface: SurfaceId, modified: bool) {
        self.with_surface(surface, |entry| entry.modified = modified);
    }

    pub fn set_images(&self, surface: SurfaceId, images: u64) {
        self.with_surface(surface, |entry| entry.images = images);
    }

    pub fn set_active(&self, surface: SurfaceId) {
        let mut state = self.state.borrow_mut();
        state.active = state.surfaces.iter().position(|entry| entry.id == surface);
    }

    /// Closes a surface out-of-band, the way a user closing a tab would, without
    /// notifying any listener.
    pub fn remove_surface(&self, surface: SurfaceId) -> bool {
        let mut state = self.state.borrow_mut();
        remove_from(&mut state, surface)
    }

    #[must_use]
    pub fn advance_calls(&self) -> usize {
        self.state.borrow().advance_calls
    }

    pub fn reset_advance_calls(&self) {
        self.state.borrow_mut().advance_calls = 0;
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Surfaces closed through [`HostBridge::close_surface`], in call order.
    #[must_use]
    pub fn closed_surfaces(&self) -> Ref<'_, [SurfaceId]> {
        Ref::map(self.state.borrow(), |state| state.closed.as_slice())
    }

    #[must_use]
    pub fn snapshots(&self) -> Vec<(SurfaceId, PathBuf)> {
        self.state.borrow().snapshots.clone()
    }

    pub fn fail_snapshots(&self, fail: bool) {
        self.state.borrow_mut().fail_snapshots = fail;
    }

    pub fn fail_close_for(&self, surface: SurfaceId) {
        self.state.borrow_mut().fail_close.push(surface);
    }

    /// Runs a host command through the before/after listener cycle.
    ///
    /// Returns false when a before-listener vetoed the command.
    pub fn run_command(&self, name: &str) -> bool {
        self.dispatch(HostCommand::from_name(name), None)
    }

    /// Runs `SaveFileAs` on the active surface, renaming it to `filename`.
    pub fn run_save_as(&self, filename: &str) -> bool {
        self.dispatch(HostCommand::SaveFileAs, Some(filename))
    }

    fn dispatch(&self, command: HostCommand, new_filename: Option<&str>) -> bool {
        let mut before = HostCommandEvent::new(command.clone());
        self.notify(CommandPhase::Before, &mut before);
        if before.is_propagation_stopped() {
            return false;
        }

        self.apply_native(&command, new_filename);

        let mut after = HostCommandEvent::new(command);
        self.notify(CommandPhase::After, &mut after);
        true
    }

    fn apply_native(&self, command: &HostCommand, new_filename: Option<&str>) {
        let mut state = self.state.borrow_mut();
        let Some(active) = state.active else {
            return;
        };

        match command {
            HostCommand::SaveFile => state.surfaces[active].modified = false,
            HostCommand::SaveFileAs => {
                let entry = &mut state.surfaces[active];
                if let Some(filename) = new_filename {
                    entry.filename = filename.to_string();
                    entry.path = PathBuf::from(filename);
                }
                entry.modified = false;
            }
            HostCommand::CloseFile => {
                let surface = state.surfaces[active].id;
                remove_from(&mut state, surface);
            }
            HostCommand::CloseAllFiles => {
                state.surfaces.clear();
                state.active = None;
            }
            HostCommand::SaveFileCopyAs | HostCommand::Other(_) => {}
        }
    }

    fn notify(&self, phase: CommandPhase, event: &mut HostCommandEvent) {
        let snapshot: Vec<(ListenerId, Rc<RefCell<CommandListener>>)> = self
            .listeners
            .borrow()
            .iter()
            .filter(|entry| entry.phase == phase)
            .map(|entry| (entry.id, Rc::clone(&entry.listener)))
            .collect();

        for (id, listener) in snapshot {
            if event.is_propagation_stopped() {
                break;
            }

            let still_subscribed = self.listeners.borrow().iter().any(|entry| entry.id == id);
            if !still_subscribed {
                continue;
            }

            let listener = &mut *listener.borrow_mut();
            listener(event);
        }
    }

    fn push_surface(&self, path: PathBuf, images: u64) -> SurfaceId {
        let mut state = self.state.borrow_mut();
        state.next_surface += 1;
        let id = SurfaceId(state.next_surface);
        state.surfaces.push(MockSurface {
            id,
            filename: path.display().to_string(),
            path,
            modified: false,
            images,
        });
        state.active = Some(state.surfaces.len() - 1);
        id
    }

    fn with_surface(&self, surface: SurfaceId, apply: impl FnOnce(&mut MockSurface)) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.surfaces.iter_mut().find(|entry| entry.id == surface) {
            apply(entry);
        }
    }
}

fn remove_from(state: &mut HostState, surface: SurfaceId) -> bool {
    let Some(index) = state.surfaces.iter().position(|entry| entry.id == surface) else {
        return false;
    };

    state.surfaces.remove(index);
    state.active = match state.active {
        _ if state.surfaces.is_empty() => None,
        Some(active) if active > index => Some(active - 1),
        Some(active) => Some(active.min(state.surfaces.len() - 1)),
        None => None,
    };
    true
}

fn images_in(path: &Path) -> u64 {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok())
        .and_then(|value| value.get("images").and_then(serde_json::Value::as_u64))
        .unwrap_or(1)
}

impl HostBridge for MockHost {
    fn subscribe(&self, phase: CommandPhase, listener: CommandListener) -> ListenerId {
        let id = {
            let mut state = self.state.borrow_mut();
            state.next_listener += 1;
            ListenerId(state.next_listener)
        };
        self.listeners.borrow_mut().push(ListenerEntry {
            id,
            phase,
            listener: Rc::new(RefCell::new(listener)),
        });
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|entry| entry.id != id);
    }

    fn active_surface(&self) -> Option<SurfaceId> {
        let state = self.state.borrow();
        state.active.map(|index| state.surfaces[index].id)
    }

    fn surfaces(&self) -> Vec<SurfaceId> {
        self.state
            .borrow()
            .surfaces
            .iter()
            .map(|entry| entry.id)
            .collect()
    }

    fn advance_surface(&self) {
        let mut state = self.state.borrow_mut();
        state.advance_calls += 1;
        let count = state.surfaces.len();
        if count == 0 {
            return;
        }
        state.active = Some(state.active.map_or(0, |active| (active + 1) % count));
    }

    fn open_surface(&self, path: &Path) -> Result<SurfaceId, HostError> {
        {
            let mut state = self.state.borrow_mut();
            if let Some(index) = state.surfaces.iter().position(|entry| entry.path == path) {
                state.active = Some(index);
                return Ok(state.surfaces[index].id);
            }
        }

        if !path.exists() {
            return Err(HostError::OpenFailed {
                path: path.to_path_buf(),
                message: "file does not exist".to_string(),
            });
        }

        Ok(self.push_surface(path.to_path_buf(), images_in(path)))
    }

    fn close_surface(&self, surface: SurfaceId) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if state.fail_close.contains(&surface) {
            return Err(HostError::Failed(format!("{surface} refused to close")));
        }
        if !remove_from(&mut state, surface) {
            return Err(HostError::SurfaceNotFound(surface));
        }
        state.closed.push(surface);
        Ok(())
    }

    fn surface_filename(&self, surface: SurfaceId) -> Option<String> {
        self.surface(surface).map(|entry| entry.filename)
    }

    fn surface_is_modified(&self, surface: SurfaceId) -> bool {
        self.surface(surface).is_some_and(|entry| entry.modified)
    }

    fn snapshot_surface(&self, surface: SurfaceId, target: &Path) -> Result<(), HostError> {
        let images = {
            let state = self.state.borrow();
            if state.fail_snapshots {
                return Err(HostError::Failed("snapshot disabled".to_string()));
            }
            state
                .surfaces
                .iter()
                .find(|entry| entry.id == surface)
                .map(|entry| entry.images)
                .ok_or(HostError::SurfaceNotFound(surface))?
        };

        let body = serde_json::json!({ "images": images }).to_string();
        std::fs::write(target, body).map_err(|error| HostError::Failed(error.to_string()))?;
        self.state
            .borrow_mut()
            .snapshots
            .push((surface, target.to_path_buf()));
        Ok(())
    }
}
