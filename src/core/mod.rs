//! Document-side building blocks owned by a session.

pub mod binding;
pub mod document;
pub mod layout;
pub mod resource;
pub mod save_dialog;
