//! Cooperative work loop.

use crate::commit::CommitReport;
use crate::deadline::{Deadline, Unbounded};
use crate::element::{Component, Element, ElementType, Props};
use crate::error::ReconcileError;
use crate::fiber::FiberId;
use crate::hooks::{HookCell, Hooks};
use crate::host::HostAdapter;
use crate::reconcile::reconcile_children;
use crate::root::FiberRoot;

/// Result of one [`FiberRoot::run_slice`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceOutcome {
    /// Nothing to do.
    Idle,
    /// The deadline ran out (or a new render was requested) with work left;
    /// call again.
    Yielded,
    /// The pass finished and was committed to the host surface.
    Committed(CommitReport),
}

impl SliceOutcome {
    /// Whether no work remains after this slice.
    pub fn is_done(&self) -> bool {
        !matches!(self, SliceOutcome::Yielded)
    }
}

impl<H: HostAdapter> FiberRoot<H> {
    /// Runs fiber visits until the work is done or `deadline` asks to
    /// yield, then commits if the pass is complete.
    ///
    /// Pending render requests from state setters are picked up before every
    /// visit; they restart the pass from the last committed tree.
    pub fn run_slice(
        &mut self,
        deadline: &mut dyn Deadline,
    ) -> Result<SliceOutcome, ReconcileError> {
        let mut visited = 0usize;
        loop {
            if self.runtime.take_render_request() {
                self.restart_from_current();
            }
            let Some(unit) = self.next_unit else {
                break;
            };
            match self.perform_unit_of_work(unit) {
                Ok(next) => self.next_unit = next,
                Err(err) => {
                    log::error!("render pass failed: {err}");
                    self.discard_work();
                    return Err(err);
                }
            }
            visited += 1;
            if deadline.should_yield() {
                break;
            }
        }
        log::trace!("slice visited {visited} fibers");

        if self.runtime.has_render_request() || self.next_unit.is_some() {
            self.runtime.schedule();
            return Ok(SliceOutcome::Yielded);
        }
        if self.wip_root.is_some() {
            let report = self.commit_root()?;
            self.runtime.set_needs_slice(false);
            return Ok(SliceOutcome::Committed(report));
        }
        self.runtime.set_needs_slice(false);
        Ok(SliceOutcome::Idle)
    }

    /// Runs slices without a deadline until no work remains. Returns the
    /// report of the last commit, if any happened.
    pub fn flush(&mut self) -> Result<Option<CommitReport>, ReconcileError> {
        let mut last = None;
        loop {
            match self.run_slice(&mut Unbounded)? {
                SliceOutcome::Idle => return Ok(last),
                SliceOutcome::Yielded => {}
                SliceOutcome::Committed(report) => last = Some(report),
            }
        }
    }

    /// Visits one fiber and returns the next one in depth-first order.
    fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>, ReconcileError> {
        let element = self.tree.fiber(id)?.element.clone();
        log::trace!("visiting {:?}", element.element_type());
        let children = match element.element_type() {
            ElementType::Component(component) => {
                vec![self.render_component(id, component, element.props())?]
            }
            ElementType::Host(_) | ElementType::Text => {
                self.ensure_host_node(id, &element)?;
                element.children().to_vec()
            }
        };
        reconcile_children(&mut self.tree, &mut self.deletions, id, children)?;
        Ok(self.tree.next_in_preorder(id, None))
    }

    fn render_component(
        &mut self,
        id: FiberId,
        component: &Component,
        props: &Props,
    ) -> Result<Element, ReconcileError> {
        let previous: Vec<HookCell> = self
            .tree
            .fiber(id)?
            .alternate
            .and_then(|alternate| self.tree.get(alternate))
            .map(|fiber| fiber.hooks.clone())
            .unwrap_or_default();
        let mut hooks = Hooks::new(component.name(), &previous, self.runtime.handle());
        let rendered = component.render(&mut hooks, props);
        let cells = hooks.finish()?;
        self.tree.fiber_mut(id)?.hooks = cells;
        Ok(rendered)
    }

    fn ensure_host_node(&mut self, id: FiberId, element: &Element) -> Result<(), ReconcileError> {
        if self.tree.fiber(id)?.host.is_some() {
            return Ok(());
        }
        let node = match element.element_type() {
            ElementType::Host(tag) => self.host.create_node(tag)?,
            ElementType::Text => self.host.create_text_node()?,
            ElementType::Component(_) => return Ok(()),
        };
        if let Err(err) = self.host.sync_props(&node, &Props::default(), element.props()) {
            self.host.dispose_node(&node);
            return Err(err.into());
        }
        self.tree.fiber_mut(id)?.host = Some(node);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
