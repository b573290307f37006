//! Registry of live editor sessions.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use dmi_host::SurfaceId;

use crate::runtime::session::Editor;

/// Identifier of one editor session.
///
/// Semantics:
/// - IDs are unique within one [`SessionRegistry`].
/// - IDs are never reused, even after the session closes.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SessionId(u64);

impl SessionId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

#[derive(Default)]
struct RegistryState {
    entries: Vec<(SessionId, Editor)>,
    next_id: u64,
}

/// Insertion-ordered list of live sessions shared by one editor context.
///
/// Lookups iterate over a snapshot, so a session may add or remove entries
/// while another lookup is in progress.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    state: Rc<RefCell<RegistryState>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_id(&self) -> SessionId {
        let mut state = self.state.borrow_mut();
        let id = SessionId(state.next_id);
        state.next_id += 1;
        id
    }

    pub(crate) fn add(&self, editor: Editor) {
        let mut state = self.state.borrow_mut();
        let id = editor.id();
        if state.entries.iter().any(|(entry, _)| *entry == id) {
            return;
        }
        state.entries.push((id, editor));
    }

    /// Removes `id`. Returns false if it was not registered.
    pub(crate) fn remove(&self, id: SessionId) -> bool {
        // Take the entry out before dropping it so no borrow is held during drop.
        let removed = {
            let mut state = self.state.borrow_mut();
            let position = state.entries.iter().position(|(entry, _)| *entry == id);
            position.map(|index| state.entries.remove(index))
        };
        removed.is_some()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.state
            .borrow()
            .entries
            .iter()
            .any(|(entry, _)| *entry == id)
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Editor> {
        self.state
            .borrow()
            .entries
            .iter()
            .map(|(_, editor)| editor.clone())
            .collect()
    }

    /// Finds a session other than `except` that has `surface` bound to one of its states.
    pub fn claimed_by(&self, surface: SurfaceId, except: SessionId) -> Option<SessionId> {
        self.snapshot()
            .into_iter()
            .filter(|editor| editor.id() != except)
            .find(|editor| editor.owns_surface(surface))
            .map(|editor| editor.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let registry = SessionRegistry::new();
        let first = registry.allocate_id();
        let second = registry.allocate_id();

        assert!(second > first);
        assert_eq!(second.raw(), first.raw() + 1);
        assert_eq!(first.to_string(), "session#0");
        assert!(!registry.remove(first));
        assert!(registry.is_empty());
    }
}
