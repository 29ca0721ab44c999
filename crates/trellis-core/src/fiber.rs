//! Fiber arena.
//!
//! Fibers live in a generational arena and refer to each other by
//! [`FiberId`]. `child` and `sibling` give the tree its shape; `parent` and
//! `alternate` are back-references. An `alternate` that outlives the tree it
//! pointed into simply fails to resolve.

use std::fmt::{self, Write as _};

use slotmap::SlotMap;

use crate::element::{Element, ElementType, Props};
use crate::error::ReconcileError;
use crate::hooks::HookCell;

slotmap::new_key_type! {
    /// Generation-checked handle to a fiber.
    pub struct FiberId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTag {
    Placement,
    Update,
    Deletion,
}

pub struct Fiber<N> {
    pub(crate) element: Element,
    pub(crate) host: Option<N>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect: Option<EffectTag>,
    pub(crate) hooks: Vec<HookCell>,
}

impl<N> Fiber<N> {
    pub(crate) fn new(element: Element, parent: Option<FiberId>) -> Self {
        Self {
            element,
            host: None,
            parent,
            child: None,
            sibling: None,
            alternate: None,
            effect: None,
            hooks: Vec::new(),
        }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn element_type(&self) -> &ElementType {
        self.element.element_type()
    }

    pub fn props(&self) -> &Props {
        self.element.props()
    }

    pub fn host(&self) -> Option<&N> {
        self.host.as_ref()
    }

    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    pub fn effect(&self) -> Option<EffectTag> {
        self.effect
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }
}

impl<N: fmt::Debug> fmt::Debug for Fiber<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fiber")
            .field("type", self.element_type())
            .field("host", &self.host)
            .field("effect", &self.effect)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

pub struct FiberTree<N> {
    fibers: SlotMap<FiberId, Fiber<N>>,
}

impl<N> Default for FiberTree<N> {
    fn default() -> Self {
        Self {
            fibers: SlotMap::with_key(),
        }
    }
}

impl<N> FiberTree<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub(crate) fn remove(&mut self, id: FiberId) -> Option<Fiber<N>> {
        self.fibers.remove(id)
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        self.fibers.get(id)
    }

    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    pub(crate) fn fiber(&self, id: FiberId) -> Result<&Fiber<N>, ReconcileError> {
        self.fibers.get(id).ok_or(ReconcileError::MissingFiber(id))
    }

    pub(crate) fn fiber_mut(&mut self, id: FiberId) -> Result<&mut Fiber<N>, ReconcileError> {
        self.fibers.get_mut(id).ok_or(ReconcileError::MissingFiber(id))
    }

    /// Child fibers of `id`, following the sibling chain.
    pub fn children(&self, id: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut cursor = self.get(id).and_then(|fiber| fiber.child);
        while let Some(child) = cursor {
            out.push(child);
            cursor = self.get(child).and_then(|fiber| fiber.sibling);
        }
        out
    }

    /// Next fiber in depth-first pre-order: the child, else the nearest
    /// sibling found walking up. The walk never leaves `bound`.
    pub fn next_in_preorder(&self, id: FiberId, bound: Option<FiberId>) -> Option<FiberId> {
        let fiber = self.get(id)?;
        if let Some(child) = fiber.child {
            return Some(child);
        }
        let mut cursor = id;
        loop {
            if Some(cursor) == bound {
                return None;
            }
            let fiber = self.get(cursor)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent?;
        }
    }

    /// `root` and every fiber below it, in pre-order.
    pub fn subtree(&self, root: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut cursor = Some(root);
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.next_in_preorder(id, Some(root));
        }
        out
    }
}

impl<N: Clone> FiberTree<N> {
    /// Host node of the nearest ancestor that owns one. Component fibers
    /// never own a node and are skipped.
    pub(crate) fn host_parent(&self, id: FiberId) -> Result<N, ReconcileError> {
        let mut cursor = self.fiber(id)?.parent;
        while let Some(ancestor) = cursor {
            let fiber = self.fiber(ancestor)?;
            if let Some(node) = &fiber.host {
                return Ok(node.clone());
            }
            cursor = fiber.parent;
        }
        Err(ReconcileError::DetachedFiber(id))
    }
}

impl<N: Clone + PartialEq> FiberTree<N> {
    /// Host nodes directly below `root` on the surface: for each branch,
    /// the first node found going down. Pushed once each onto `out`.
    pub(crate) fn outermost_hosts(&self, root: FiberId, out: &mut Vec<N>) {
        for child in self.children(root) {
            match self.get(child).and_then(|fiber| fiber.host.clone()) {
                Some(node) if !out.contains(&node) => out.push(node),
                Some(_) => {}
                None => self.outermost_hosts(child, out),
            }
        }
    }
}

impl<N: fmt::Debug> FiberTree<N> {
    /// Indented outline of the subtree under `root`, one fiber per line.
    pub fn dump(&self, root: FiberId) -> String {
        let mut output = String::new();
        self.dump_fiber(&mut output, root, 0);
        output
    }

    fn dump_fiber(&self, output: &mut String, id: FiberId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Some(fiber) = self.get(id) else {
            let _ = writeln!(output, "{indent}(missing)");
            return;
        };
        let label = match fiber.element_type() {
            ElementType::Host(tag) => tag.to_string(),
            ElementType::Text => format!("{:?}", fiber.props().node_value().unwrap_or_default()),
            ElementType::Component(component) => format!("<{}>", component.name()),
        };
        let _ = write!(output, "{indent}{label}");
        if let Some(node) = &fiber.host {
            let _ = write!(output, " host={node:?}");
        }
        if let Some(effect) = fiber.effect {
            let _ = write!(output, " {effect:?}");
        }
        output.push('\n');
        for child in self.children(id) {
            self.dump_fiber(output, child, depth + 1);
        }
    }
}
