//! Commit phase: applies the effects of a finished render pass to the host.

use crate::error::ReconcileError;
use crate::fiber::{EffectTag, FiberId};
use crate::host::HostAdapter;
use crate::root::FiberRoot;

/// What one commit did to the host surface. Only fibers that own a host node
/// are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Nodes appended under their host parent.
    pub placements: usize,
    /// Reused nodes whose properties differed from the previous pass.
    pub updates: usize,
    /// Reused nodes with identical properties.
    pub unchanged: usize,
    /// Subtrees removed from the surface.
    pub deletions: usize,
}

impl CommitReport {
    /// Whether the commit left the surface untouched.
    pub fn is_noop(&self) -> bool {
        self.placements == 0 && self.updates == 0 && self.deletions == 0
    }
}

impl<H: HostAdapter> FiberRoot<H> {
    /// Applies deletions, then every effect of the work-in-progress tree in
    /// pre-order, then swaps it in as the current tree.
    ///
    /// A host failure aborts the commit and unmounts the root, leaving the
    /// container empty. Local state of the unmounted components is lost.
    pub(crate) fn commit_root(&mut self) -> Result<CommitReport, ReconcileError> {
        let Some(root) = self.wip_root else {
            return Ok(CommitReport::default());
        };
        let mut report = CommitReport::default();
        if let Err(err) = self.apply_effects(root, &mut report) {
            log::error!("commit aborted: {err}");
            self.unmount_after_failed_commit();
            return Err(err);
        }

        for id in self.tree.subtree(root) {
            if let Ok(fiber) = self.tree.fiber_mut(id) {
                fiber.hooks.iter_mut().for_each(|cell| cell.commit());
            }
        }

        let previous = self.current_root.replace(root);
        self.wip_root = None;
        self.next_unit = None;
        if let Some(previous) = previous {
            let stale = self.tree.subtree(previous);
            log::trace!("releasing {} fibers of the previous tree", stale.len());
            for id in stale {
                self.tree.remove(id);
            }
        }
        if let Ok(fiber) = self.tree.fiber_mut(root) {
            fiber.alternate = None;
        }
        log::debug!("committed {report:?}");
        Ok(report)
    }

    fn apply_effects(
        &mut self,
        root: FiberId,
        report: &mut CommitReport,
    ) -> Result<(), ReconcileError> {
        for id in std::mem::take(&mut self.deletions) {
            self.tree.fiber_mut(id)?.effect = None;
            self.commit_deletion(id)?;
            report.deletions += 1;
        }

        let mut cursor = self.tree.fiber(root)?.child;
        while let Some(id) = cursor {
            self.commit_work(id, report)?;
            cursor = self.tree.next_in_preorder(id, Some(root));
        }
        Ok(())
    }

    fn commit_work(&mut self, id: FiberId, report: &mut CommitReport) -> Result<(), ReconcileError> {
        let fiber = self.tree.fiber_mut(id)?;
        let effect = fiber.effect.take();
        let Some(node) = fiber.host.clone() else {
            return Ok(());
        };
        match effect {
            Some(EffectTag::Placement) => {
                let parent = self.tree.host_parent(id)?;
                self.host.append_child(&parent, &node)?;
                report.placements += 1;
            }
            Some(EffectTag::Update) => {
                let fiber = self.tree.fiber(id)?;
                let previous = fiber
                    .alternate
                    .and_then(|alternate| self.tree.get(alternate))
                    .map(|old| old.element.clone());
                let next = fiber.element.clone();
                match previous {
                    Some(previous) if previous.props().attributes_eq(next.props()) => {
                        report.unchanged += 1;
                    }
                    Some(previous) => {
                        self.host.sync_props(&node, previous.props(), next.props())?;
                        report.updates += 1;
                    }
                    None => {
                        log::warn!("update for {id:?} has no previous fiber; skipping");
                    }
                }
            }
            Some(EffectTag::Deletion) | None => {}
        }
        Ok(())
    }

    /// Removes the nearest host nodes under `id` from their host parent.
    /// Component fibers own no node, so their children are removed instead.
    fn commit_deletion(&mut self, id: FiberId) -> Result<(), ReconcileError> {
        let fiber = self.tree.fiber(id)?;
        if let Some(node) = fiber.host.clone() {
            let parent = self.tree.host_parent(id)?;
            self.host.remove_child(&parent, &node)?;
            return Ok(());
        }
        for child in self.tree.children(id) {
            self.commit_deletion(child)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/commit_tests.rs"]
mod tests;
