use std::cell::Cell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::RuntimeScheduler;

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    needs_slice: Cell<bool>,
    render_requested: Cell<bool>,
    requests: Cell<u64>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            needs_slice: Cell::new(false),
            render_requested: Cell::new(false),
            requests: Cell::new(0),
        }
    }

    fn schedule(&self) {
        self.needs_slice.set(true);
        self.scheduler.schedule_slice();
    }

    fn request_render(&self) {
        self.requests.set(self.requests.get() + 1);
        self.render_requested.set(true);
        self.schedule();
    }

    fn take_render_request(&self) -> bool {
        self.render_requested.replace(false)
    }
}

/// Shared signal between state setters and the [`crate::FiberRoot`] that
/// owns the fiber trees.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn has_render_request(&self) -> bool {
        self.inner.render_requested.get()
    }

    /// Number of render requests posted over the runtime's lifetime.
    pub fn render_requests(&self) -> u64 {
        self.inner.requests.get()
    }

    pub fn needs_slice(&self) -> bool {
        self.inner.needs_slice.get()
    }

    pub fn set_needs_slice(&self, value: bool) {
        self.inner.needs_slice.set(value);
    }

    pub(crate) fn schedule(&self) {
        self.inner.schedule();
    }

    pub(crate) fn take_render_request(&self) -> bool {
        self.inner.take_render_request()
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_slice(&self) {}
}

/// Counts slice requests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct TestScheduler {
    pub(crate) slices: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl TestScheduler {
    pub(crate) fn slices(&self) -> usize {
        self.slices.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl RuntimeScheduler for TestScheduler {
    fn schedule_slice(&self) {
        self.slices
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Weak handle given to state setters. Requests made after the runtime is
/// gone are dropped.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    pub fn request_render(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.request_render();
        } else {
            log::debug!("render requested after runtime was dropped");
        }
    }

    pub fn schedule(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.schedule();
        }
    }

    pub fn has_render_request(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.render_requested.get())
            .unwrap_or(false)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}
