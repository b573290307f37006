//! Editor sessions for multi-state DMI icons.
//!
//! An [`Editor`] owns one decoded icon document and lets the user edit each of
//! its states as an independent surface in a host image editor. The session
//! tracks which surfaces belong to which states, writes them back into the
//! document, and keeps save-before-close semantics across the document and all
//! of its surfaces.
//!
//! # Public API Overview
//! - Wire collaborators (codec, host bridge, shell factory, preview caches)
//!   into an [`EditorContext`].
//! - Start sessions with [`Editor::open`] and drive queued decodes through
//!   [`EditorContext::tasks`].
//! - Find live sessions through the context's [`SessionRegistry`].
//!
//! Invariant: everything runs on one thread; no session state is shared across
//! threads.

pub mod config;
pub mod logging;

pub mod core;
pub mod error;
pub mod runtime;

pub use crate::config::{CanvasConfig, EditorConfig};
pub use crate::core::binding::StateSprite;
pub use crate::core::layout::{Activation, GridCell, StateGrid, ViewState};
pub use crate::error::EditorError;
pub use crate::runtime::{
    Editor, EditorContext, FnTask, OpenRequest, SessionId, SessionRegistry, Task, TaskQueue,
};

pub use dmi_host;
