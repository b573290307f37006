use std::cell::{Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::rc::Rc;

use dmi_host::{
    Bounds, PointerEvent, PromptResponse, SavePrompt, SaveTargetRequest, SaveTargetResponse,
    Shell, ShellAction, ShellCallbacks, ShellFactory, ShellSpec, Size,
};

const DEFAULT_BOUNDS: Bounds = Bounds::new(100, 100, 420, 320);

/// Everything every shell created by one [`MockShellFactory`] was asked to do.
///
/// Prompt and picker answers are scripted through the response queues; an empty
/// queue answers `Cancel`.
#[derive(Debug, Default)]
pub struct ShellTrace {
    pub created: Vec<ShellSpec>,
    pub shows: Vec<Option<Bounds>>,
    pub repaints: usize,
    pub closes: usize,
    pub alerts: Vec<(String, String)>,
    pub prompts: Vec<SavePrompt>,
    pub save_requests: Vec<SaveTargetRequest>,
    pub prompt_responses: VecDeque<PromptResponse>,
    pub save_responses: VecDeque<SaveTargetResponse>,
}

type CallbackSlot = Rc<RefCell<Option<ShellCallbacks>>>;

#[derive(Clone, Default)]
pub struct MockShellFactory {
    trace: Rc<RefCell<ShellTrace>>,
    latest: Rc<RefCell<Option<CallbackSlot>>>,
}

impl MockShellFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn trace(&self) -> Ref<'_, ShellTrace> {
        self.trace.borrow()
    }

    #[must_use]
    pub fn trace_mut(&self) -> RefMut<'_, ShellTrace> {
        self.trace.borrow_mut()
    }

    pub fn push_prompt_response(&self, response: PromptResponse) {
        self.trace.borrow_mut().prompt_responses.push_back(response);
    }

    pub fn push_save_response(&self, response: SaveTargetResponse) {
        self.trace.borrow_mut().save_responses.push_back(response);
    }

    /// Simulates the user closing the most recently created shell window.
    pub fn fire_close(&self) {
        self.with_latest(|callbacks| (callbacks.on_close)());
    }

    pub fn fire_pointer(&self, event: PointerEvent) {
        self.with_latest(|callbacks| (callbacks.on_pointer)(event));
    }

    pub fn fire_action(&self, action: ShellAction) {
        self.with_latest(|callbacks| (callbacks.on_action)(action));
    }

    fn with_latest(&self, invoke: impl FnOnce(&mut ShellCallbacks)) {
        let Some(slot) = self.latest.borrow().clone() else {
            return;
        };
        fire(&slot, invoke);
    }
}

/// Runs a callback with the slot emptied so re-entrant shell creation or
/// closing never observes a held borrow.
fn fire(slot: &CallbackSlot, invoke: impl FnOnce(&mut ShellCallbacks)) {
    let Some(mut callbacks) = slot.borrow_mut().take() else {
        return;
    };
    invoke(&mut callbacks);
    let mut slot = slot.borrow_mut();
    if slot.is_none() {
        *slot = Some(callbacks);
    }
}

struct MockShell {
    trace: Rc<RefCell<ShellTrace>>,
    callbacks: CallbackSlot,
    bounds: Bounds,
    canvas: Size,
    closed: bool,
}

impl Shell for MockShell {
    fn show(&mut self, bounds: Option<Bounds>) {
        if let Some(bounds) = bounds {
            self.bounds = bounds;
        }
        self.trace.borrow_mut().shows.push(bounds);
    }

    fn request_repaint(&mut self) {
        self.trace.borrow_mut().repaints += 1;
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn canvas_size(&self) -> Size {
        self.canvas
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.trace.borrow_mut().closes += 1;
        fire(&self.callbacks, |callbacks| (callbacks.on_close)());
    }

    fn alert(&mut self, title: &str, message: &str) {
        self.trace
            .borrow_mut()
            .alerts
            .push((title.to_string(), message.to_string()));
    }

    fn prompt(&mut self, prompt: &SavePrompt) -> PromptResponse {
        let mut trace = self.trace.borrow_mut();
        trace.prompts.push(prompt.clone());
        trace
            .prompt_responses
            .pop_front()
            .unwrap_or(PromptResponse::Cancel)
    }

    fn pick_save_target(&mut self, request: &SaveTargetRequest) -> SaveTargetResponse {
        let mut trace = self.trace.borrow_mut();
        trace.save_requests.push(request.clone());
        trace
            .save_responses
            .pop_front()
            .unwrap_or(SaveTargetResponse::Cancel)
    }
}

impl ShellFactory for MockShellFactory {
    fn create(&self, spec: ShellSpec, callbacks: ShellCallbacks) -> Box<dyn Shell> {
        let canvas = spec.canvas;
        self.trace.borrow_mut().created.push(spec);

        let slot: CallbackSlot = Rc::new(RefCell::new(Some(callbacks)));
        *self.latest.borrow_mut() = Some(Rc::clone(&slot));

        Box::new(MockShell {
            trace: Rc::clone(&self.trace),
            callbacks: slot,
            bounds: DEFAULT_BOUNDS,
            canvas,
            closed: false,
        })
    }
}
