//! Cooperative task queue.
//!
//! Work that would block the host loop (decoding a file) is queued here and
//! run later on the same thread; each task owns its single completion
//! continuation.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::trace;

pub trait Task {
    fn name(&self) -> &'static str;

    fn run(self: Box<Self>);
}

/// Adapts a one-shot closure into a [`Task`].
pub struct FnTask<F> {
    name: &'static str,
    body: F,
}

impl<F: FnOnce()> FnTask<F> {
    pub fn new(name: &'static str, body: F) -> Self {
        Self { name, body }
    }
}

impl<F: FnOnce()> Task for FnTask<F> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(self: Box<Self>) {
        (self.body)()
    }
}

/// FIFO of pending tasks shared by every session of one editor context.
#[derive(Clone, Default)]
pub struct TaskQueue {
    pending: Rc<RefCell<VecDeque<Box<dyn Task>>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self, task: Box<dyn Task>) {
        trace!(task = task.name(), "task queued");
        self.pending.borrow_mut().push_back(task);
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Runs the oldest pending task. Returns false if the queue was empty.
    pub fn run_once(&self) -> bool {
        // The borrow ends before the task runs; tasks may dispatch more work.
        let task = self.pending.borrow_mut().pop_front();
        let Some(task) = task else {
            return false;
        };

        trace!(task = task.name(), "task running");
        task.run();
        true
    }

    /// Runs tasks until none remain, including ones queued while draining.
    /// Returns how many ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_once() {
            ran += 1;
        }
        ran
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_run_in_dispatch_order() {
        let queue = TaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for label in ["first", "second"] {
            let log = Rc::clone(&log);
            queue.dispatch(Box::new(FnTask::new("log", move || {
                log.borrow_mut().push(label)
            })));
        }

        assert_eq!(queue.len(), 2);
        assert!(queue.run_once());
        assert_eq!(*log.borrow(), vec!["first"]);
        assert_eq!(queue.run_until_idle(), 1);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert!(!queue.run_once());
    }

    #[test]
    fn tasks_may_dispatch_follow_up_work() {
        let queue = TaskQueue::new();
        let ran = Rc::new(RefCell::new(0));

        let inner_queue = queue.clone();
        let inner_ran = Rc::clone(&ran);
        queue.dispatch(Box::new(FnTask::new("outer", move || {
            *inner_ran.borrow_mut() += 1;
            let ran = Rc::clone(&inner_ran);
            inner_queue.dispatch(Box::new(FnTask::new("inner", move || {
                *ran.borrow_mut() += 1
            })));
        })));

        assert_eq!(queue.run_until_idle(), 2);
        assert_eq!(*ran.borrow(), 2);
        assert!(queue.is_empty());
    }
}
