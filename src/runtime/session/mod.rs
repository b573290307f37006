//! Editor sessions.
//!
//! One [`Editor`] owns one icon document, the host surfaces bound to its
//! states, and the shell window presenting them. Everything runs on the host's
//! UI thread; the session lives in an `Rc<RefCell<_>>` and every callback the
//! host or shell holds is a `Weak` that upgrades and borrows on demand. A
//! callback arriving while the session is already borrowed is a re-entrant
//! notification from the session's own work and is ignored.

mod close;
mod hooks;
mod input;
mod open;
mod save;
mod states;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use dmi_host::{
    IconDocument, ListenerId, PointerEvent, PreviewCache, Shell, ShellAction, ShellCallbacks,
    ShellSpec, Size, SurfaceId,
};
use tracing::{debug, info, warn};

use crate::core::binding::StateSprite;
use crate::core::document::Document;
use crate::core::layout::{StateGrid, ViewState};
use crate::core::save_dialog::resolve_save_path;
use crate::error::EditorError;
use crate::runtime::context::EditorContext;
use crate::runtime::registry::SessionId;

use self::open::OpenSource;

/// What a new editor starts from: a file to decode, an already decoded
/// document, or both (the path is then only remembered as the open path).
#[derive(Debug, Clone, Default)]
pub struct OpenRequest {
    pub title: String,
    pub path: Option<PathBuf>,
    pub document: Option<IconDocument>,
}

impl OpenRequest {
    pub fn path(title: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            path: Some(path.into()),
            document: None,
        }
    }

    pub fn document(title: impl Into<String>, document: IconDocument) -> Self {
        Self {
            title: title.into(),
            path: None,
            document: Some(document),
        }
    }
}

pub(crate) struct EditorSession {
    id: SessionId,
    title: String,
    ctx: EditorContext,
    this: Weak<RefCell<EditorSession>>,
    document: Option<Document>,
    sprites: Vec<StateSprite>,
    previews: Box<dyn PreviewCache>,
    shell: Option<Box<dyn Shell>>,
    view: ViewState,
    grid: StateGrid,
    open_path: Option<PathBuf>,
    save_path: Option<PathBuf>,
    /// Filename of the active bound surface, recorded before a host save-as.
    save_as_origin: Option<String>,
    listeners: Vec<ListenerId>,
    loading: bool,
    decoding: bool,
    modified: bool,
    closed: bool,
}

impl EditorSession {
    fn is_modified(&self) -> bool {
        let host = self.ctx.host.as_ref();
        self.modified || self.sprites.iter().any(|sprite| sprite.is_modified(host))
    }

    fn path(&self) -> PathBuf {
        resolve_save_path(
            self.save_path.as_deref(),
            self.open_path.as_deref(),
            || self.ctx.config.default_save_path(),
        )
    }

    fn sprite_index(&self, surface: SurfaceId) -> Option<usize> {
        self.sprites
            .iter()
            .position(|sprite| sprite.surface() == surface)
    }

    /// Drops bindings whose surface the host no longer has open.
    fn gc_open_sprites(&mut self) -> usize {
        let live = self.ctx.host.surfaces();
        let before = self.sprites.len();
        self.sprites.retain(|sprite| sprite.is_live(&live));

        let removed = before - self.sprites.len();
        if removed > 0 {
            debug!(session = %self.id, removed, "dropped stale state surfaces");
        }
        removed
    }

    /// Steps the host's active surface forward until `target` is active.
    ///
    /// The host can only advance to the next surface, so this takes at most
    /// one more step than there are open surfaces, whether or not `target`
    /// is among them.
    fn switch_tab(&self, target: SurfaceId) -> bool {
        let host = self.ctx.host.as_ref();
        let attempts = host.surfaces().len() + 1;
        for _ in 0..attempts {
            if host.active_surface() == Some(target) {
                return true;
            }
            host.advance_surface();
        }

        let found = host.active_surface() == Some(target);
        if !found {
            debug!(session = %self.id, surface = %target, attempts, "surface not reached");
        }
        found
    }

    fn canvas_size(&self) -> Size {
        self.shell.as_ref().map_or_else(
            || Size::new(self.ctx.config.canvas.width, self.ctx.config.canvas.height),
            |shell| shell.canvas_size(),
        )
    }

    fn relayout(&mut self) {
        let canvas = self.canvas_size();
        self.grid = match &self.document {
            Some(document) => {
                let icon = document.icon();
                StateGrid::layout(
                    canvas,
                    Size::new(icon.width, icon.height),
                    icon.states.len(),
                    &self.ctx.config.canvas,
                )
            }
            None => StateGrid::empty(canvas),
        };
        self.view.fit_to(&self.grid);
    }

    fn request_repaint(&mut self) {
        if let Some(shell) = self.shell.as_mut() {
            shell.request_repaint();
        }
    }

    fn alert(&mut self, title: &str, message: &str) {
        match self.shell.as_mut() {
            Some(shell) => shell.alert(title, message),
            None => warn!(session = %self.id, title, message, "alert without a window"),
        }
    }

    fn create_shell(
        id: SessionId,
        this: &Weak<RefCell<EditorSession>>,
        ctx: &EditorContext,
        title: &str,
    ) -> Box<dyn Shell> {
        let spec = ShellSpec {
            title: title.to_string(),
            canvas: Size::new(ctx.config.canvas.width, ctx.config.canvas.height),
            actions: vec![ShellAction::Save, ShellAction::Close],
        };

        let on_close = {
            let this = this.clone();
            Box::new(move || {
                if let Some(editor) = Editor::upgrade(id, &this) {
                    editor.close(true, false);
                }
            })
        };
        let on_pointer = {
            let this = this.clone();
            Box::new(move |event: PointerEvent| {
                if let Some(editor) = Editor::upgrade(id, &this) {
                    editor.handle_pointer(event);
                }
            })
        };
        let on_action = {
            let this = this.clone();
            Box::new(move |action: ShellAction| {
                if let Some(editor) = Editor::upgrade(id, &this) {
                    editor.handle_action(action);
                }
            })
        };

        ctx.shells.create(
            spec,
            ShellCallbacks {
                on_close,
                on_pointer,
                on_action,
            },
        )
    }
}

/// Handle to one editor session. Clones share the session.
#[derive(Clone)]
pub struct Editor {
    id: SessionId,
    inner: Rc<RefCell<EditorSession>>,
}

impl Editor {
    /// Creates a session, shows its window and starts loading its document.
    ///
    /// Only a request with neither a path nor a document is rejected; decode
    /// problems are reported to the user and leave the editor empty.
    pub fn open(ctx: &EditorContext, request: OpenRequest) -> Result<Self, EditorError> {
        let OpenRequest {
            title,
            path,
            document,
        } = request;
        let source = match (path, document) {
            (None, None) => return Err(EditorError::MissingSource),
            (path, Some(document)) => OpenSource::Document { document, path },
            (Some(path), None) => OpenSource::Path(path),
        };

        let id = ctx.registry.allocate_id();
        let inner = Rc::new_cyclic(|this: &Weak<RefCell<EditorSession>>| {
            let listeners = hooks::subscribe(this, ctx.host.as_ref());
            let shell = EditorSession::create_shell(id, this, ctx, &title);
            let canvas = shell.canvas_size();

            RefCell::new(EditorSession {
                id,
                title: title.clone(),
                ctx: ctx.clone(),
                this: this.clone(),
                document: None,
                sprites: Vec::new(),
                previews: ctx.previews.create(),
                shell: Some(shell),
                view: ViewState::default(),
                grid: StateGrid::empty(canvas),
                open_path: None,
                save_path: None,
                save_as_origin: None,
                listeners,
                loading: true,
                decoding: false,
                modified: false,
                closed: false,
            })
        });
        let editor = Self { id, inner };

        {
            let mut session = editor.inner.borrow_mut();
            if let Some(shell) = session.shell.as_mut() {
                shell.show(None);
            }
            if let Err(error) = session.begin_open(source) {
                warn!(session = %id, %error, "initial open failed");
            }
        }

        ctx.registry.add(editor.clone());
        info!(session = %id, title = %title, "editor opened");
        Ok(editor)
    }

    fn upgrade(id: SessionId, this: &Weak<RefCell<EditorSession>>) -> Option<Self> {
        this.upgrade().map(|inner| Self { id, inner })
    }

    fn read<R>(&self, default: R, read: impl FnOnce(&EditorSession) -> R) -> R {
        match self.inner.try_borrow() {
            Ok(session) => read(&session),
            Err(_) => default,
        }
    }

    fn write<R>(
        &self,
        operation: &'static str,
        busy: R,
        write: impl FnOnce(&mut EditorSession) -> R,
    ) -> R {
        match self.inner.try_borrow_mut() {
            Ok(mut session) => write(&mut session),
            Err(_) => {
                debug!(session = %self.id, operation, "re-entrant call ignored");
                busy
            }
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn title(&self) -> String {
        self.read(String::new(), |session| session.title.clone())
    }

    /// True if any bound surface has unsaved changes or the document itself does.
    pub fn is_modified(&self) -> bool {
        self.read(false, EditorSession::is_modified)
    }

    /// Marks the document as changed outside any bound surface.
    pub fn mark_modified(&self) {
        self.write("mark_modified", (), |session| {
            if !session.closed {
                session.modified = true;
            }
        });
    }

    pub fn is_loading(&self) -> bool {
        self.read(false, |session| session.loading)
    }

    pub fn is_closed(&self) -> bool {
        self.read(false, |session| session.closed)
    }

    pub fn has_document(&self) -> bool {
        self.read(false, |session| session.document.is_some())
    }

    /// Where the next save goes: explicit save target, open path, then the default.
    pub fn path(&self) -> PathBuf {
        self.read(PathBuf::new(), EditorSession::path)
    }

    pub fn open_path(&self) -> Option<PathBuf> {
        self.read(None, |session| session.open_path.clone())
    }

    pub fn save_path(&self) -> Option<PathBuf> {
        self.read(None, |session| session.save_path.clone())
    }

    /// Temp directory of the current document, if one is loaded.
    pub fn temp_dir(&self) -> Option<PathBuf> {
        self.read(None, |session| {
            session
                .document
                .as_ref()
                .map(|document| document.resource().path().to_path_buf())
        })
    }

    pub fn state_names(&self) -> Vec<String> {
        self.read(Vec::new(), |session| {
            session
                .document
                .as_ref()
                .map(Document::state_names)
                .unwrap_or_default()
        })
    }

    /// Current bindings as (state, surface) pairs, in binding order.
    pub fn bindings(&self) -> Vec<(String, SurfaceId)> {
        self.read(Vec::new(), |session| {
            session
                .sprites
                .iter()
                .map(|sprite| (sprite.state().to_string(), sprite.surface()))
                .collect()
        })
    }

    /// Whether one of this session's states is bound to `surface`.
    pub fn owns_surface(&self, surface: SurfaceId) -> bool {
        self.read(false, |session| session.sprite_index(surface).is_some())
    }

    pub fn view(&self) -> ViewState {
        self.read(ViewState::default(), |session| session.view.clone())
    }

    pub fn grid(&self) -> StateGrid {
        self.read(StateGrid::default(), |session| session.grid)
    }

    /// Drops bindings whose surface was closed behind the session's back.
    /// Returns how many were dropped.
    pub fn gc_open_sprites(&self) -> usize {
        self.write("gc_open_sprites", 0, EditorSession::gc_open_sprites)
    }

    /// Makes `surface` the host's active surface. Returns false if it was never reached.
    pub fn switch_tab(&self, surface: SurfaceId) -> bool {
        self.write("switch_tab", false, |session| session.switch_tab(surface))
    }

    /// Replaces the document with the one decoded from `path`.
    ///
    /// Decoding is queued on the context's task queue; the editor stays
    /// loading until the queue runs it.
    pub fn open_file(&self, path: impl Into<PathBuf>) -> Result<(), EditorError> {
        let path = path.into();
        self.write("open_file", Err(EditorError::Busy), |session| {
            session.begin_open(OpenSource::Path(path))
        })
    }

    /// Replaces the document with an already decoded one.
    pub fn open_document(&self, document: IconDocument) -> Result<(), EditorError> {
        self.write("open_document", Err(EditorError::Busy), |session| {
            session.begin_open(OpenSource::Document {
                document,
                path: None,
            })
        })
    }

    /// Runs the save dialog flow. `on_saved` runs right before the document is
    /// written, whatever the outcome of the write.
    ///
    /// The session is not borrowed while `on_saved` runs, so it may call back
    /// into this editor. If it closes the editor, nothing is written.
    pub fn save(&self, on_saved: Option<Box<dyn FnOnce()>>) -> bool {
        let Some(target) = self.write("save", None, EditorSession::pick_save_target) else {
            return false;
        };
        if let Some(on_saved) = on_saved {
            on_saved();
        }
        self.write("save", false, |session| session.write_document(&target))
    }

    /// Closes the editor, prompting for unsaved changes unless `force` is set.
    /// Returns true once the editor is closed.
    pub fn close(&self, from_user_event: bool, force: bool) -> bool {
        self.write("close", false, |session| {
            session.close(from_user_event, force)
        })
    }

    pub fn open_state(&self, name: &str) -> Result<SurfaceId, EditorError> {
        self.write("open_state", Err(EditorError::Busy), |session| {
            session.open_state(name)
        })
    }

    pub fn new_state(&self) -> Result<String, EditorError> {
        self.write("new_state", Err(EditorError::Busy), EditorSession::new_state)
    }

    pub fn remove_state(&self, name: &str) -> Result<(), EditorError> {
        self.write("remove_state", Err(EditorError::Busy), |session| {
            session.remove_state(name)
        })
    }

    pub fn rename_state(&self, from: &str, to: &str) -> Result<(), EditorError> {
        self.write("rename_state", Err(EditorError::Busy), |session| {
            session.rename_state(from, to)
        })
    }

    pub fn duplicate_state(&self, name: &str) -> Result<String, EditorError> {
        self.write("duplicate_state", Err(EditorError::Busy), |session| {
            session.duplicate_state(name)
        })
    }

    pub fn handle_pointer(&self, event: PointerEvent) {
        self.write("handle_pointer", (), |session| session.handle_pointer(event));
    }

    pub fn handle_action(&self, action: ShellAction) -> bool {
        self.write("handle_action", false, |session| {
            session.handle_action(action)
        })
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor").field("id", &self.id).finish()
    }
}

