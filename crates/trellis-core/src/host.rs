//! Host adapter contract.
//!
//! The reconciler never touches a surface directly. Everything it needs is
//! behind [`HostAdapter`], and [`prop_changes`] gives adapters one shared
//! reading of how a property bag maps to attributes and listeners.

use std::fmt::{self, Debug};

use crate::element::{Listener, PropValue, Props, CHILDREN};
use crate::error::HostError;

pub trait HostAdapter {
    /// Handle to one node on the surface.
    type Node: Clone + PartialEq + Debug;

    fn create_node(&mut self, tag: &str) -> Result<Self::Node, HostError>;

    fn create_text_node(&mut self) -> Result<Self::Node, HostError>;

    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    /// Detaches `child` from `parent`. The surface owns the removed subtree
    /// from here on and disposes it.
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    /// Brings `node` from `prev` to `next`: text nodes take a changed
    /// `nodeValue`; element nodes drop stale attributes and listeners and
    /// apply new or changed ones.
    fn sync_props(&mut self, node: &Self::Node, prev: &Props, next: &Props)
        -> Result<(), HostError>;

    /// Releases a node that was created but never attached, e.g. when an
    /// unfinished render pass is thrown away.
    fn dispose_node(&mut self, _node: &Self::Node) {}

    /// Looks up a mount point by id.
    fn find_container(&self, id: &str) -> Option<Self::Node>;
}

const LISTENER_PREFIX: &str = "on";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropKind {
    /// The reserved child list; never reaches the surface.
    Children,
    /// `on<Event>` keys; carries the lowercased event name.
    Listener(String),
    Attribute,
}

/// Classifies a property key by naming convention: `children` is reserved,
/// `onClick` is a listener for `click`, anything else is an attribute.
pub fn classify(key: &str) -> PropKind {
    if key == CHILDREN {
        return PropKind::Children;
    }
    match key.strip_prefix(LISTENER_PREFIX) {
        Some(event) if event.starts_with(|c: char| c.is_ascii_uppercase()) => {
            PropKind::Listener(event.to_ascii_lowercase())
        }
        _ => PropKind::Attribute,
    }
}

/// One surface operation needed to move a node between two property bags.
#[derive(Clone)]
pub enum PropChange<'a> {
    RemoveListener {
        event: String,
        listener: &'a Listener,
    },
    RemoveAttribute {
        key: &'a str,
    },
    SetAttribute {
        key: &'a str,
        value: &'a PropValue,
    },
    AddListener {
        event: String,
        listener: &'a Listener,
    },
}

impl Debug for PropChange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropChange::RemoveListener { event, .. } => write!(f, "-on:{event}"),
            PropChange::RemoveAttribute { key } => write!(f, "-{key}"),
            PropChange::SetAttribute { key, value } => write!(f, "{key}={value:?}"),
            PropChange::AddListener { event, .. } => write!(f, "+on:{event}"),
        }
    }
}

/// Changes needed to go from `prev` to `next`, in the order a surface should
/// apply them: stale listeners, stale attributes, new attributes, new
/// listeners. Keys whose values are equal produce nothing.
pub fn prop_changes<'a>(prev: &'a Props, next: &'a Props) -> Vec<PropChange<'a>> {
    let mut removed_listeners = Vec::new();
    let mut removed_attributes = Vec::new();
    let mut set_attributes = Vec::new();
    let mut added_listeners = Vec::new();

    for (key, value) in prev.iter() {
        let changed = next.get(key) != Some(value);
        match classify(key) {
            PropKind::Children => {}
            PropKind::Listener(event) => {
                if let (true, Some(listener)) = (changed, value.as_listener()) {
                    removed_listeners.push(PropChange::RemoveListener { event, listener });
                }
            }
            PropKind::Attribute => {
                if next.get(key).is_none() {
                    removed_attributes.push(PropChange::RemoveAttribute { key });
                }
            }
        }
    }

    for (key, value) in next.iter() {
        if prev.get(key) == Some(value) {
            continue;
        }
        match classify(key) {
            PropKind::Children => {}
            PropKind::Listener(event) => match value.as_listener() {
                Some(listener) => added_listeners.push(PropChange::AddListener { event, listener }),
                None => log::warn!("`{key}` looks like a listener but holds {value:?}"),
            },
            PropKind::Attribute => set_attributes.push(PropChange::SetAttribute { key, value }),
        }
    }

    let mut changes = removed_listeners;
    changes.append(&mut removed_attributes);
    changes.append(&mut set_attributes);
    changes.append(&mut added_listeners);
    changes
}

#[cfg(test)]
#[path = "tests/host_tests.rs"]
mod tests;
