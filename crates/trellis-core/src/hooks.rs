//! Per-component local state.
//!
//! Every component fiber owns an ordered list of [`HookCell`]s. On each
//! render the cells are rebuilt in call order from the previous render's
//! cells (found through the fiber's alternate), folding queued updates into
//! the carried-over state.
//!
//! A cell's update queue is shared by every generation of that cell. A
//! render only reads the queue; the updates it folded in are removed when
//! that render commits. An abandoned render therefore loses nothing, and an
//! update that arrives between render and commit waits for the next pass.

use std::any::{type_name, Any};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::ReconcileError;
use crate::runtime::RuntimeHandle;

type Update<T> = Rc<dyn Fn(&T) -> T>;

struct UpdateQueue<T> {
    updates: RefCell<Vec<Update<T>>>,
}

impl<T> UpdateQueue<T> {
    fn new() -> Self {
        Self {
            updates: RefCell::new(Vec::new()),
        }
    }

    fn fold(&self, base: T) -> (T, usize) {
        let updates: Vec<Update<T>> = self.updates.borrow().clone();
        let count = updates.len();
        (updates.iter().fold(base, |state, update| update(&state)), count)
    }
}

trait PendingUpdates {
    fn consume(&self, count: usize);
    fn len(&self) -> usize;
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: 'static> PendingUpdates for UpdateQueue<T> {
    fn consume(&self, count: usize) {
        let mut updates = self.updates.borrow_mut();
        let count = count.min(updates.len());
        updates.drain(..count);
    }

    fn len(&self) -> usize {
        self.updates.borrow().len()
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// One local-state slot. State and queue are type-erased; the typed view is
/// recovered by [`Hooks::use_state`].
#[derive(Clone)]
pub(crate) struct HookCell {
    state: Rc<dyn Any>,
    queue: Rc<dyn PendingUpdates>,
    consumed: usize,
    type_name: &'static str,
}

impl HookCell {
    fn resolve<T: Clone + 'static>(&self) -> Option<(T, Rc<UpdateQueue<T>>, usize)> {
        let base = self.state.downcast_ref::<T>()?.clone();
        let queue = Rc::clone(&self.queue).into_any().downcast::<UpdateQueue<T>>().ok()?;
        let (state, consumed) = queue.fold(base);
        Some((state, queue, consumed))
    }

    /// Drops the updates this cell folded in. Runs once, at commit.
    pub(crate) fn commit(&mut self) {
        if self.consumed > 0 {
            self.queue.consume(self.consumed);
            self.consumed = 0;
        }
    }
}

impl fmt::Debug for HookCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookCell")
            .field("type", &self.type_name)
            .field("consumed", &self.consumed)
            .field("pending", &self.queue.len())
            .finish()
    }
}

/// Local-state context handed to a component while its fiber is visited.
///
/// Calls must happen in the same order on every render. A call sequence that
/// does not line up with the previous render fails the whole render pass.
pub struct Hooks<'a> {
    component: &'static str,
    previous: &'a [HookCell],
    cells: Vec<HookCell>,
    runtime: RuntimeHandle,
    violation: Option<ReconcileError>,
}

impl<'a> Hooks<'a> {
    pub(crate) fn new(
        component: &'static str,
        previous: &'a [HookCell],
        runtime: RuntimeHandle,
    ) -> Self {
        Self {
            component,
            previous,
            cells: Vec::with_capacity(previous.len()),
            runtime,
            violation: None,
        }
    }

    /// Returns the current value of the next state cell and a setter for it.
    ///
    /// On the first render the cell starts at `initial`; afterwards it
    /// carries the previous value with every queued update applied in the
    /// order the setter received them.
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, StateSetter<T>) {
        let index = self.cells.len();
        let previous = self.previous;
        let resolved = match previous.get(index) {
            Some(cell) => {
                let resolved = cell.resolve::<T>();
                if resolved.is_none() {
                    self.record_violation(
                        index,
                        format!(
                            "expected state of type `{}`, previous render stored `{}`",
                            type_name::<T>(),
                            cell.type_name
                        ),
                    );
                }
                resolved
            }
            None => None,
        };
        let (state, queue, consumed) =
            resolved.unwrap_or_else(|| (initial, Rc::new(UpdateQueue::new()), 0));

        self.cells.push(HookCell {
            state: Rc::new(state.clone()),
            queue: Rc::clone(&queue) as Rc<dyn PendingUpdates>,
            consumed,
            type_name: type_name::<T>(),
        });
        let setter = StateSetter {
            queue,
            runtime: self.runtime.clone(),
        };
        (state, setter)
    }

    /// Number of state cells claimed so far in this render.
    pub fn index(&self) -> usize {
        self.cells.len()
    }

    pub fn component(&self) -> &'static str {
        self.component
    }

    fn record_violation(&mut self, index: usize, detail: String) {
        if self.violation.is_none() {
            self.violation = Some(ReconcileError::HookOrder {
                component: self.component.to_owned(),
                index,
                detail,
            });
        }
    }

    pub(crate) fn finish(mut self) -> Result<Vec<HookCell>, ReconcileError> {
        if !self.previous.is_empty() && self.cells.len() != self.previous.len() {
            let detail = format!(
                "rendered {} state cells, previous render had {}",
                self.cells.len(),
                self.previous.len()
            );
            self.record_violation(self.cells.len().min(self.previous.len()), detail);
        }
        match self.violation {
            Some(err) => Err(err),
            None => Ok(self.cells),
        }
    }
}

/// Queues updates for one state cell and asks for a new render pass.
///
/// Updates may be replayed if a render pass is abandoned and restarted, so
/// they should be pure functions of the previous state.
pub struct StateSetter<T> {
    queue: Rc<UpdateQueue<T>>,
    runtime: RuntimeHandle,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T: 'static> StateSetter<T> {
    /// Enqueues `update` and requests a render. Updates run in call order
    /// during the next render of the owning component.
    pub fn update(&self, update: impl Fn(&T) -> T + 'static) {
        self.queue.updates.borrow_mut().push(Rc::new(update));
        self.runtime.request_render();
    }

    /// Updates waiting for a committed render.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl<T: Clone + 'static> StateSetter<T> {
    pub fn set(&self, value: T) {
        self.update(move |_| value.clone());
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("pending", &self.queue.updates.borrow().len())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/hooks_tests.rs"]
mod tests;
