//! Collaborator contracts consumed by the DMI editor session controller.
//!
//! This crate defines only the narrow interfaces the controller talks to: the
//! icon codec, the preview cache, the host command bridge and the window/dialog
//! shell. It excludes the binary codec itself, pixel rendering and widget
//! drawing.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of one host-managed drawing surface.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Identifier returned by [`HostBridge::subscribe`].
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ListenerId(pub u64);

/// One named animation unit of an icon document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconState {
    pub name: String,
    /// Direction count: 1, 4 or 8.
    pub dirs: u8,
    pub frames: u32,
    /// Per-frame delays in ticks; empty for single-frame states.
    #[serde(default)]
    pub delays: Vec<f32>,
    #[serde(default, rename = "loop")]
    pub loop_count: u32,
    #[serde(default)]
    pub rewind: bool,
    #[serde(default)]
    pub movement: bool,
}

impl IconState {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dirs: 1,
            frames: 1,
            delays: Vec::new(),
            loop_count: 0,
            rewind: false,
            movement: false,
        }
    }

    /// Number of frame images backing this state.
    #[must_use]
    pub fn image_count(&self) -> u32 {
        u32::from(self.dirs) * self.frames
    }
}

/// Canonical decoded representation of an icon file.
///
/// `temp_dir` is the on-disk materialization the codec produced while
/// decoding; whoever owns the document owns that directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconDocument {
    pub width: u32,
    pub height: u32,
    pub states: Vec<IconState>,
    #[serde(skip)]
    pub temp_dir: PathBuf,
}

impl IconDocument {
    #[must_use]
    pub fn new(width: u32, height: u32, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            width,
            height,
            states: Vec::new(),
            temp_dir: temp_dir.into(),
        }
    }

    #[must_use]
    pub fn state(&self, name: &str) -> Option<&IconState> {
        self.states.iter().find(|state| state.name == name)
    }

    #[must_use]
    pub fn state_mut(&mut self, name: &str) -> Option<&mut IconState> {
        self.states.iter_mut().find(|state| state.name == name)
    }

    #[must_use]
    pub fn state_index(&self, name: &str) -> Option<usize> {
        self.states.iter().position(|state| state.name == name)
    }

    pub fn remove_state(&mut self, name: &str) -> Option<IconState> {
        let index = self.state_index(name)?;
        Some(self.states.remove(index))
    }

    /// Returns `base` if unused, otherwise the first free `"{base} {n}"` for n >= 2.
    #[must_use]
    pub fn unique_state_name(&self, base: &str) -> String {
        if self.state(base).is_none() {
            return base.to_string();
        }

        (2..)
            .map(|n| format!("{base} {n}"))
            .find(|candidate| self.state(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid icon data in {path}: {message}")]
    Format { path: PathBuf, message: String },

    #[error("state '{name}' does not exist")]
    UnknownState { name: String },

    #[error("state '{state}' surface has {found} images, expected {expected}")]
    LayoutMismatch {
        state: String,
        expected: u32,
        found: u32,
    },
}

impl CodecError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unknown_state(name: impl Into<String>) -> Self {
        Self::UnknownState { name: name.into() }
    }
}

/// Binary icon codec.
///
/// Calls are synchronous; the controller decides which of them run deferred on
/// its task queue.
pub trait Codec {
    /// Decodes `source`, materializing frame images under `temp_dir`.
    fn decode(&self, source: &Path, temp_dir: &Path) -> Result<IconDocument, CodecError>;

    /// Persists `document` to `target`.
    fn encode(&self, document: &IconDocument, target: &Path) -> Result<(), CodecError>;

    /// Removes a temp materialization. Best-effort; failures are not reported.
    fn release_temp(&self, path: &Path, recursive: bool);

    /// Writes a host-openable file for one state into the document's temp
    /// directory and returns its path. Distinct `file_stem`s give distinct
    /// files.
    fn export_state(
        &self,
        document: &IconDocument,
        state: &str,
        file_stem: &str,
    ) -> Result<PathBuf, CodecError>;

    /// Reads a file previously written by the host back into one state.
    fn import_state(
        &self,
        document: &mut IconDocument,
        state: &str,
        source: &Path,
    ) -> Result<(), CodecError>;

    /// Appends a blank state named `name`.
    fn create_state(&self, document: &mut IconDocument, name: &str) -> Result<(), CodecError>;

    /// Appends a copy of state `from` named `to`, frame images included.
    fn copy_state(&self, document: &mut IconDocument, from: &str, to: &str)
        -> Result<(), CodecError>;

    fn rename_state(
        &self,
        document: &mut IconDocument,
        from: &str,
        to: &str,
    ) -> Result<(), CodecError> {
        let state = document
            .state_mut(from)
            .ok_or_else(|| CodecError::unknown_state(from))?;
        state.name = to.to_string();
        Ok(())
    }

    fn remove_state(&self, document: &mut IconDocument, name: &str) -> Result<(), CodecError> {
        document
            .remove_state(name)
            .map(drop)
            .ok_or_else(|| CodecError::unknown_state(name))
    }
}

/// Rendered thumbnails for the states of one document.
pub trait PreviewCache {
    fn load_previews(&mut self, document: &IconDocument);

    /// Re-renders one state. Defaults to reloading everything.
    fn refresh_state(&mut self, document: &IconDocument, _state: &str) {
        self.load_previews(document);
    }

    fn clear(&mut self);
}

/// Creates one preview cache per editor session.
pub trait PreviewCacheFactory {
    fn create(&self) -> Box<dyn PreviewCache>;
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("{0} is not open in the host")]
    SurfaceNotFound(SurfaceId),

    #[error("host could not open {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },

    #[error("host operation failed: {0}")]
    Failed(String),
}

/// Host command names the controller cares about, converted once at the bridge edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostCommand {
    SaveFile,
    SaveFileAs,
    SaveFileCopyAs,
    CloseFile,
    CloseAllFiles,
    Other(String),
}

impl HostCommand {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "SaveFile" => Self::SaveFile,
            "SaveFileAs" => Self::SaveFileAs,
            "SaveFileCopyAs" => Self::SaveFileCopyAs,
            "CloseFile" => Self::CloseFile,
            "CloseAllFiles" => Self::CloseAllFiles,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::SaveFile => "SaveFile",
            Self::SaveFileAs => "SaveFileAs",
            Self::SaveFileCopyAs => "SaveFileCopyAs",
            Self::CloseFile => "CloseFile",
            Self::CloseAllFiles => "CloseAllFiles",
            Self::Other(name) => name,
        }
    }

    /// Returns true when the command can close surfaces without notifying bindings.
    #[must_use]
    pub fn closes_surfaces(&self) -> bool {
        matches!(self, Self::CloseFile | Self::CloseAllFiles)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandPhase {
    Before,
    After,
}

/// One host command notification as seen by a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCommandEvent {
    command: HostCommand,
    propagation_stopped: bool,
}

impl HostCommandEvent {
    #[must_use]
    pub fn new(command: HostCommand) -> Self {
        Self {
            command,
            propagation_stopped: false,
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::new(HostCommand::from_name(name))
    }

    #[must_use]
    pub fn command(&self) -> &HostCommand {
        &self.command
    }

    /// Vetoes the command. Only meaningful during [`CommandPhase::Before`].
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    #[must_use]
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

pub type CommandListener = Box<dyn FnMut(&mut HostCommandEvent)>;

/// Host application bridge.
///
/// Surfaces can only be focused by stepping with [`HostBridge::advance_surface`];
/// there is no direct activation primitive.
pub trait HostBridge {
    fn subscribe(&self, phase: CommandPhase, listener: CommandListener) -> ListenerId;

    fn unsubscribe(&self, id: ListenerId);

    fn active_surface(&self) -> Option<SurfaceId>;

    /// Every surface currently open in the host, in tab order.
    fn surfaces(&self) -> Vec<SurfaceId>;

    /// Activates the next surface in tab order, wrapping around.
    fn advance_surface(&self);

    fn open_surface(&self, path: &Path) -> Result<SurfaceId, HostError>;

    /// Closes a surface without prompting, discarding unsaved changes.
    fn close_surface(&self, surface: SurfaceId) -> Result<(), HostError>;

    fn surface_filename(&self, surface: SurfaceId) -> Option<String>;

    fn surface_is_modified(&self, surface: SurfaceId) -> bool;

    /// Writes the surface's current contents to `target` without changing its filename.
    fn snapshot_surface(&self, surface: SurfaceId, target: &Path) -> Result<(), HostError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Screen rectangle of a shell window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            self.x.saturating_add((self.width / 2) as i32),
            self.y.saturating_add((self.height / 2) as i32),
        )
    }

    /// Returns bounds of the given size centered on `center`.
    #[must_use]
    pub fn centered_at(center: Point, size: Size) -> Self {
        Self::new(
            center.x.saturating_sub((size.width / 2) as i32),
            center.y.saturating_sub((size.height / 2) as i32),
            size.width,
            size.height,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// Canvas input delivered by the shell, in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: PointerButton,
        double_click: bool,
    },
    Up {
        position: Point,
        button: PointerButton,
    },
    Move {
        position: Point,
    },
    /// Positive `delta` scrolls down.
    Wheel {
        position: Point,
        delta: i32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellAction {
    Save,
    Close,
}

impl ShellAction {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Save => "Save",
            Self::Close => "Close",
        }
    }
}

/// Static description of a shell window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSpec {
    pub title: String,
    pub canvas: Size,
    pub actions: Vec<ShellAction>,
}

/// Callbacks a shell invokes from the host's event loop.
pub struct ShellCallbacks {
    pub on_close: Box<dyn FnMut()>,
    pub on_pointer: Box<dyn FnMut(PointerEvent)>,
    pub on_action: Box<dyn FnMut(ShellAction)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePrompt {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptResponse {
    Save,
    Discard,
    Cancel,
}

/// Parameters for one showing of the save-target picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTargetRequest {
    pub title: String,
    pub path: PathBuf,
    /// Dialog width in pixels, wide enough for `path` to render untruncated.
    pub width: u32,
    /// Screen point the dialog is centered on; `None` lets the shell choose.
    pub center: Option<Point>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTargetResponse {
    /// The user picked a new file; the picker closed at `bounds` and must be re-shown.
    Browse { path: PathBuf, bounds: Bounds },
    Confirm(PathBuf),
    Cancel,
}

/// Window/dialog shell owned by one editor session.
pub trait Shell {
    /// Shows the window without blocking, optionally at explicit bounds.
    fn show(&mut self, bounds: Option<Bounds>);

    fn request_repaint(&mut self);

    fn bounds(&self) -> Bounds;

    fn canvas_size(&self) -> Size;

    fn close(&mut self);

    fn alert(&mut self, title: &str, message: &str);

    /// Modal save / discard / cancel prompt.
    fn prompt(&mut self, prompt: &SavePrompt) -> PromptResponse;

    /// Modal file-target picker.
    fn pick_save_target(&mut self, request: &SaveTargetRequest) -> SaveTargetResponse;
}

pub trait ShellFactory {
    fn create(&self, spec: ShellSpec, callbacks: ShellCallbacks) -> Box<dyn Shell>;
}
