//! DOM-like host surface kept entirely in memory.
//!
//! Used by the tests and the demo. Every mutation that actually changes the
//! surface is appended to an operation log, so a pass that touches nothing
//! leaves the log empty.

use std::fmt::Write as _;

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;

use crate::element::{Event, Listener, PropValue, Props, NODE_VALUE};
use crate::error::HostError;
use crate::host::{prop_changes, HostAdapter, PropChange};

pub type NodeId = usize;

/// One recorded surface mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    CreateNode { id: NodeId, tag: String },
    CreateText { id: NodeId },
    SetAttribute { id: NodeId, key: String, value: String },
    RemoveAttribute { id: NodeId, key: String },
    SetText { id: NodeId, text: String },
    AddListener { id: NodeId, event: String },
    RemoveListener { id: NodeId, event: String },
    AppendChild { parent: NodeId, child: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
    Dispose { id: NodeId },
}

enum NodeKind {
    Element(String),
    Text(String),
}

struct MemoryNode {
    kind: NodeKind,
    attributes: IndexMap<String, String>,
    listeners: Vec<(String, Listener)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl MemoryNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attributes: IndexMap::new(),
            listeners: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct MemoryHost {
    nodes: Vec<Option<MemoryNode>>,
    containers: HashMap<String, NodeId>,
    ops: Vec<SurfaceOp>,
    rejected: HashSet<String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mount point reachable through
    /// [`HostAdapter::find_container`]. Not recorded in the op log.
    pub fn create_container(&mut self, id: &str) -> NodeId {
        if let Some(&existing) = self.containers.get(id) {
            return existing;
        }
        let mut node = MemoryNode::new(NodeKind::Element("#container".to_owned()));
        node.attributes.insert("id".to_owned(), id.to_owned());
        let node_id = self.alloc(node);
        self.containers.insert(id.to_owned(), node_id);
        node_id
    }

    pub fn ops(&self) -> &[SurfaceOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<SurfaceOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Makes every later attempt to set `key` fail with
    /// [`HostError::Rejected`].
    pub fn reject_attribute(&mut self, key: &str) {
        self.rejected.insert(key.to_owned());
    }

    pub fn accept_attribute(&mut self, key: &str) {
        self.rejected.remove(key);
    }

    /// Number of live nodes, containers included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id), Some(Some(_)))
    }

    /// Tag of an element node; `None` for text nodes and missing ids.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).ok()?.kind {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self.node(id).ok()?.attributes.get(key).map(String::as_str)
    }

    /// Value of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).ok()?.kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok()?.parent
    }

    /// Concatenated text of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Ok(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(_) => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// First element under `root`, in document order, whose own text
    /// content equals `text`. Deepest match wins, so a button is found
    /// rather than the div wrapping it.
    pub fn find_by_text(&self, root: NodeId, text: &str) -> Option<NodeId> {
        let node = self.node(root).ok()?;
        if let NodeKind::Text(_) = node.kind {
            return None;
        }
        for &child in &node.children {
            if let Some(found) = self.find_by_text(child, text) {
                return Some(found);
            }
        }
        (self.text_content(root) == text).then_some(root)
    }

    /// Invokes the listeners registered on `id` for `event`. Returns how many
    /// ran. Events do not bubble.
    pub fn dispatch(&self, id: NodeId, event: &str) -> Result<usize, HostError> {
        let listeners: Vec<Listener> = self
            .node(id)?
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, listener)| Listener::clone(listener))
            .collect();
        let payload = Event::new(event);
        for listener in &listeners {
            listener(&payload);
        }
        log::trace!("dispatched `{event}` to node {id}: {} listeners", listeners.len());
        Ok(listeners.len())
    }

    /// Indented outline of the surface under `root`, e.g.
    ///
    /// ```text
    /// <div id="foo">
    ///   <a>
    ///     "bar"
    /// ```
    pub fn dump_tree(&self, root: NodeId) -> String {
        let mut output = String::new();
        self.dump_node(&mut output, root, 0);
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Ok(node) = self.node(id) else {
            let _ = writeln!(output, "{indent}[{id}] (missing)");
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => {
                let _ = writeln!(output, "{indent}{text:?}");
            }
            NodeKind::Element(tag) => {
                let _ = write!(output, "{indent}<{tag}");
                for (key, value) in &node.attributes {
                    let _ = write!(output, " {key}={value:?}");
                }
                for (event, _) in &node.listeners {
                    let _ = write!(output, " on:{event}");
                }
                output.push_str(">\n");
                for &child in &node.children {
                    self.dump_node(output, child, depth + 1);
                }
            }
        }
    }

    fn alloc(&mut self, node: MemoryNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Some(node));
        id
    }

    fn node(&self, id: NodeId) -> Result<&MemoryNode, HostError> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or_else(|| missing(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, HostError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or_else(|| missing(id))
    }

    fn free(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id).and_then(Option::take) else {
            return;
        };
        for child in node.children {
            self.free(child);
        }
    }

    fn detach(&mut self, child: NodeId) -> Result<(), HostError> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(());
        };
        if let Ok(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|&id| id != child);
        }
        self.node_mut(child)?.parent = None;
        Ok(())
    }

    fn set_attribute(&mut self, id: NodeId, key: &str, value: &PropValue) -> Result<(), HostError> {
        if self.rejected.contains(key) {
            return Err(HostError::Rejected {
                node: id.to_string(),
                key: key.to_owned(),
            });
        }
        let rendered = value.to_string();
        let node = self.node_mut(id)?;
        let op = match &mut node.kind {
            NodeKind::Text(text) if key == NODE_VALUE => {
                if *text == rendered {
                    return Ok(());
                }
                text.clone_from(&rendered);
                SurfaceOp::SetText { id, text: rendered }
            }
            _ => {
                if node.attributes.get(key) == Some(&rendered) {
                    return Ok(());
                }
                node.attributes.insert(key.to_owned(), rendered.clone());
                SurfaceOp::SetAttribute {
                    id,
                    key: key.to_owned(),
                    value: rendered,
                }
            }
        };
        self.ops.push(op);
        Ok(())
    }
}

fn missing(id: NodeId) -> HostError {
    HostError::MissingNode {
        node: id.to_string(),
    }
}

impl HostAdapter for MemoryHost {
    type Node = NodeId;

    fn create_node(&mut self, tag: &str) -> Result<NodeId, HostError> {
        let id = self.alloc(MemoryNode::new(NodeKind::Element(tag.to_owned())));
        self.ops.push(SurfaceOp::CreateNode {
            id,
            tag: tag.to_owned(),
        });
        Ok(id)
    }

    fn create_text_node(&mut self) -> Result<NodeId, HostError> {
        let id = self.alloc(MemoryNode::new(NodeKind::Text(String::new())));
        self.ops.push(SurfaceOp::CreateText { id });
        Ok(id)
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        let (parent, child) = (*parent, *child);
        self.node(parent)?;
        self.detach(child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.ops.push(SurfaceOp::AppendChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        let (parent, child) = (*parent, *child);
        if self.node(child)?.parent != Some(parent) {
            return Err(HostError::NotAChild {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        self.detach(child)?;
        self.free(child);
        self.ops.push(SurfaceOp::RemoveChild { parent, child });
        Ok(())
    }

    fn sync_props(&mut self, node: &NodeId, prev: &Props, next: &Props) -> Result<(), HostError> {
        let id = *node;
        for change in prop_changes(prev, next) {
            match change {
                PropChange::RemoveListener { event, listener } => {
                    let target = self.node_mut(id)?;
                    let before = target.listeners.len();
                    target.listeners.retain(|(name, existing)| {
                        !(*name == event && Listener::ptr_eq(existing, listener))
                    });
                    if target.listeners.len() != before {
                        self.ops.push(SurfaceOp::RemoveListener { id, event });
                    }
                }
                PropChange::RemoveAttribute { key } => {
                    let target = self.node_mut(id)?;
                    if key == NODE_VALUE {
                        if let NodeKind::Text(text) = &mut target.kind {
                            if !text.is_empty() {
                                text.clear();
                                self.ops.push(SurfaceOp::SetText {
                                    id,
                                    text: String::new(),
                                });
                            }
                            continue;
                        }
                    }
                    if target.attributes.shift_remove(key).is_some() {
                        self.ops.push(SurfaceOp::RemoveAttribute {
                            id,
                            key: key.to_owned(),
                        });
                    }
                }
                PropChange::SetAttribute { key, value } => self.set_attribute(id, key, value)?,
                PropChange::AddListener { event, listener } => {
                    self.node_mut(id)?
                        .listeners
                        .push((event.clone(), Listener::clone(listener)));
                    self.ops.push(SurfaceOp::AddListener { id, event });
                }
            }
        }
        Ok(())
    }

    fn dispose_node(&mut self, node: &NodeId) {
        match self.node(*node) {
            Ok(found) if found.parent.is_some() => {
                log::warn!("refusing to dispose attached node {node}");
            }
            Ok(_) => {
                self.free(*node);
                self.ops.push(SurfaceOp::Dispose { id: *node });
            }
            Err(_) => {}
        }
    }

    fn find_container(&self, id: &str) -> Option<NodeId> {
        self.containers.get(id).copied()
    }
}

#[cfg(test)]
#[path = "tests/memory_host_tests.rs"]
mod tests;
