use std::cell::{Ref, RefCell};
use std::rc::Rc;

use dmi_host::{IconDocument, PreviewCache, PreviewCacheFactory};

/// Calls observed by every cache a [`MockPreviewCaches`] factory created.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PreviewTrace {
    pub created: usize,
    pub loads: usize,
    pub clears: usize,
    pub refreshed: Vec<String>,
    /// State names currently holding a preview, across all caches.
    pub cached: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MockPreviewCaches {
    trace: Rc<RefCell<PreviewTrace>>,
}

impl MockPreviewCaches {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn trace(&self) -> Ref<'_, PreviewTrace> {
        self.trace.borrow()
    }
}

struct MockPreviewCache {
    trace: Rc<RefCell<PreviewTrace>>,
}

impl PreviewCache for MockPreviewCache {
    fn load_previews(&mut self, document: &IconDocument) {
        let mut trace = self.trace.borrow_mut();
        trace.loads += 1;
        trace.cached = document
            .states
            .iter()
            .map(|state| state.name.clone())
            .collect();
    }

    fn refresh_state(&mut self, _document: &IconDocument, state: &str) {
        self.trace.borrow_mut().refreshed.push(state.to_string());
    }

    fn clear(&mut self) {
        let mut trace = self.trace.borrow_mut();
        trace.clears += 1;
        trace.cached.clear();
    }
}

impl PreviewCacheFactory for MockPreviewCaches {
    fn create(&self) -> Box<dyn PreviewCache> {
        self.trace.borrow_mut().created += 1;
        Box::new(MockPreviewCache {
            trace: Rc::clone(&self.trace),
        })
    }
}
