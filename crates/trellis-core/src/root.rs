use std::sync::Arc;

use crate::element::Element;
use crate::error::ReconcileError;
use crate::fiber::{EffectTag, Fiber, FiberId, FiberTree};
use crate::host::HostAdapter;
use crate::runtime::{DefaultScheduler, Runtime, RuntimeHandle};

/// Owner of one rendered tree: the host surface, both fiber trees and the
/// cursor of the work loop.
///
/// Everything needed to resume an unfinished render lives here, which is
/// what lets [`FiberRoot::run_slice`] stop after any fiber and pick up again
/// on the next call.
pub struct FiberRoot<H: HostAdapter> {
    pub(crate) host: H,
    pub(crate) runtime: Runtime,
    pub(crate) tree: FiberTree<H::Node>,
    pub(crate) current_root: Option<FiberId>,
    pub(crate) wip_root: Option<FiberId>,
    pub(crate) next_unit: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,
}

impl<H: HostAdapter> FiberRoot<H> {
    pub fn new(host: H) -> Self {
        Self::with_runtime(host, Runtime::new(Arc::new(DefaultScheduler)))
    }

    pub fn with_runtime(host: H, runtime: Runtime) -> Self {
        Self {
            host,
            runtime,
            tree: FiberTree::new(),
            current_root: None,
            wip_root: None,
            next_unit: None,
            deletions: Vec::new(),
        }
    }

    /// Schedules `element` to be rendered into `container`.
    ///
    /// Any unfinished render pass is discarded. Nothing touches the surface
    /// until a later [`FiberRoot::run_slice`] reaches the commit.
    pub fn render(&mut self, element: Element, container: H::Node) {
        if self.wip_root.is_some() {
            log::debug!("render() replaces an unfinished render pass");
        }
        self.discard_work();
        self.seed(Element::root(element), container, self.current_root);
        self.runtime.schedule();
    }

    /// Like [`FiberRoot::render`], resolving the container by id first.
    pub fn render_into(
        &mut self,
        element: Element,
        container_id: &str,
    ) -> Result<(), ReconcileError> {
        let container = self
            .host
            .find_container(container_id)
            .ok_or_else(|| ReconcileError::MissingContainer(container_id.to_owned()))?;
        self.render(element, container);
        Ok(())
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn tree(&self) -> &FiberTree<H::Node> {
        &self.tree
    }

    /// Root fiber of the last committed tree.
    pub fn current_root(&self) -> Option<FiberId> {
        self.current_root
    }

    /// Root fiber of the tree being built, if a render pass is in flight.
    pub fn wip_root(&self) -> Option<FiberId> {
        self.wip_root
    }

    /// Whether a render pass is in flight or a state update asked for one.
    pub fn has_pending_work(&self) -> bool {
        self.wip_root.is_some() || self.runtime.has_render_request()
    }

    /// Effect tags currently recorded on the tree being built plus the
    /// pending deletions, in visit order.
    pub fn pending_effects(&self) -> Vec<(FiberId, EffectTag)> {
        let mut effects: Vec<(FiberId, EffectTag)> = self
            .deletions
            .iter()
            .filter_map(|&id| Some((id, self.tree.get(id)?.effect?)))
            .collect();
        if let Some(root) = self.wip_root {
            effects.extend(
                self.tree
                    .subtree(root)
                    .into_iter()
                    .filter_map(|id| Some((id, self.tree.get(id)?.effect?))),
            );
        }
        effects
    }

    pub(crate) fn seed(
        &mut self,
        element: Element,
        container: H::Node,
        alternate: Option<FiberId>,
    ) {
        let mut root = Fiber::new(element, None);
        root.host = Some(container);
        root.alternate = alternate;
        let id = self.tree.insert(root);
        self.wip_root = Some(id);
        self.next_unit = Some(id);
    }

    /// Restarts the in-flight pass from its root element, or starts a fresh
    /// pass from the last committed root when none is in flight. Either way
    /// the new pass diffs against the committed tree.
    pub(crate) fn restart_from_current(&mut self) {
        let Some(base) = self.wip_root.or(self.current_root) else {
            return;
        };
        let Some((element, container)) = self
            .tree
            .get(base)
            .and_then(|fiber| Some((fiber.element.clone(), fiber.host.clone()?)))
        else {
            return;
        };
        self.discard_work();
        self.seed(element, container, self.current_root);
    }

    /// Drops the in-flight pass. Nodes created for placement fibers are
    /// handed back to the host; none of them is attached yet.
    pub(crate) fn discard_work(&mut self) {
        for id in std::mem::take(&mut self.deletions) {
            if let Ok(fiber) = self.tree.fiber_mut(id) {
                fiber.effect = None;
            }
        }
        self.next_unit = None;
        let Some(root) = self.wip_root.take() else {
            return;
        };
        let abandoned = self.tree.subtree(root);
        log::debug!(
            "discarding {} fibers of an unfinished render pass",
            abandoned.len()
        );
        for id in abandoned {
            let Some(fiber) = self.tree.remove(id) else {
                continue;
            };
            if fiber.effect != Some(EffectTag::Placement) {
                continue;
            }
            if let Some(node) = &fiber.host {
                self.host.dispose_node(node);
            }
        }
    }

    /// Takes down everything this root mounted after a commit stopped part
    /// way, when the surface may mix nodes of both trees. Both trees are
    /// released and the next render mounts from scratch.
    pub(crate) fn unmount_after_failed_commit(&mut self) {
        self.next_unit = None;
        self.deletions.clear();
        let Some(root) = self.wip_root.take() else {
            return;
        };
        let roots: Vec<FiberId> = self.current_root.take().into_iter().chain([root]).collect();
        let container = self.tree.get(root).and_then(|fiber| fiber.host.clone());

        let mut mounted = Vec::new();
        for &tree_root in &roots {
            self.tree.outermost_hosts(tree_root, &mut mounted);
        }
        if let Some(container) = &container {
            for node in &mounted {
                if let Err(err) = self.host.remove_child(container, node) {
                    log::trace!("{node:?} was already off the surface: {err}");
                }
            }
        }

        let fresh: Vec<H::Node> = self
            .tree
            .subtree(root)
            .into_iter()
            .filter(|&id| id != root)
            .filter_map(|id| {
                let fiber = self.tree.get(id)?;
                match fiber.alternate {
                    Some(_) => None,
                    None => fiber.host.clone(),
                }
            })
            .collect();
        for node in &fresh {
            self.host.dispose_node(node);
        }

        for tree_root in roots {
            for id in self.tree.subtree(tree_root) {
                self.tree.remove(id);
            }
        }
        log::warn!(
            "failed commit unmounted {} top-level nodes; the next render remounts",
            mounted.len()
        );
    }
}
