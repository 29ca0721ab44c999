//! Immutable element descriptors.
//!
//! An [`Element`] describes one node of the tree the caller wants to see on
//! the host surface. Elements are rebuilt on every render pass and never
//! change once built; the reconciler compares them against the fibers of the
//! previous pass.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::hooks::Hooks;

/// Reserved key carrying the text payload of text elements.
pub const NODE_VALUE: &str = "nodeValue";

/// Reserved key naming the ordered child list. It never appears in the
/// attribute map; [`Props::children`] holds the children instead.
pub const CHILDREN: &str = "children";

pub(crate) const ROOT_TAG: &str = "#root";

/// Event delivered to listeners by a host surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    name: String,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

pub type Listener = Rc<dyn Fn(&Event)>;

/// A single property value.
///
/// Listeners compare by pointer identity, so a closure recreated on every
/// render counts as a changed listener.
#[derive(Clone)]
pub enum PropValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Listener(Listener),
}

impl PropValue {
    pub fn listener(f: impl Fn(&Event) + 'static) -> Self {
        PropValue::Listener(Rc::new(f))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            PropValue::Listener(listener) => Some(listener),
            _ => None,
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Int(a), PropValue::Int(b)) => a == b,
            (PropValue::Float(a), PropValue::Float(b)) => a == b,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Listener(a), PropValue::Listener(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => write!(f, "{value:?}"),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Listener(_) => f.write_str("<listener>"),
        }
    }
}

/// Attribute rendering of a value, as a DOM-like surface would store it.
impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Str(value) => f.write_str(value),
            PropValue::Int(value) => write!(f, "{value}"),
            PropValue::Float(value) => write!(f, "{value}"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Listener(_) => f.write_str("<listener>"),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Int(i64::from(value))
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<Listener> for PropValue {
    fn from(value: Listener) -> Self {
        PropValue::Listener(value)
    }
}

/// Property bag of an element: insertion-ordered attributes plus the
/// ordered child list.
#[derive(Clone, Default, Debug)]
pub struct Props {
    values: IndexMap<String, PropValue>,
    children: Vec<Element>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts or replaces a value. The reserved `children` key is ignored;
    /// use [`Props::push_child`] instead.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
        let key = key.into();
        if key == CHILDREN {
            log::warn!("ignoring `{CHILDREN}` passed as a plain property");
            return;
        }
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.values.get(key)
    }

    /// Iterates attributes and listeners in insertion order. Children are not
    /// included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn push_child(&mut self, child: impl Into<Child>) {
        self.children.push(child.into().into_element());
    }

    pub fn node_value(&self) -> Option<&str> {
        self.get(NODE_VALUE).and_then(PropValue::as_str)
    }

    /// Compares everything except children.
    pub fn attributes_eq(&self, other: &Props) -> bool {
        self.values == other.values
    }
}

type RenderFn = dyn Fn(&mut Hooks<'_>, &Props) -> Element;

/// Plain function pointer a render function can be coerced to.
pub type RenderFnPtr = fn(&mut Hooks<'_>, &Props) -> Element;

/// A component: a render function producing one element from props and
/// local state.
///
/// Two components are the same type when they wrap the same function or
/// closure type, so building `Component::new("Counter", counter)` afresh on
/// every pass still lines up with the previous fiber. Functions coerced to
/// [`RenderFnPtr`] all share one type and are told apart by address.
#[derive(Clone)]
pub struct Component {
    name: &'static str,
    type_id: TypeId,
    fn_addr: Option<usize>,
    render: Rc<RenderFn>,
}

impl Component {
    pub fn new<F>(name: &'static str, render: F) -> Self
    where
        F: Fn(&mut Hooks<'_>, &Props) -> Element + 'static,
    {
        let fn_addr = (&render as &dyn Any)
            .downcast_ref::<RenderFnPtr>()
            .map(|f| *f as usize);
        Self {
            name,
            type_id: TypeId::of::<F>(),
            fn_addr,
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render(&self, hooks: &mut Hooks<'_>, props: &Props) -> Element {
        (self.render)(hooks, props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.fn_addr == other.fn_addr
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

/// What an element stands for on the host side.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementType {
    Host(Rc<str>),
    Text,
    Component(Component),
}

impl ElementType {
    pub fn host(tag: &str) -> Self {
        ElementType::Host(Rc::from(tag))
    }

    pub fn is_component(&self) -> bool {
        matches!(self, ElementType::Component(_))
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            ElementType::Host(tag) => Some(tag),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
struct ElementInner {
    element_type: ElementType,
    props: Props,
}

/// Immutable element descriptor. Cloning is cheap.
#[derive(Clone)]
pub struct Element {
    inner: Rc<ElementInner>,
}

impl Element {
    fn from_parts(element_type: ElementType, props: Props) -> Self {
        Self {
            inner: Rc::new(ElementInner {
                element_type,
                props,
            }),
        }
    }

    /// Starts a host element, e.g. `Element::host("div")`.
    pub fn host(tag: &str) -> Self {
        Self::from_parts(ElementType::host(tag), Props::new())
    }

    pub fn component<F>(name: &'static str, render: F) -> Self
    where
        F: Fn(&mut Hooks<'_>, &Props) -> Element + 'static,
    {
        Self::from_parts(
            ElementType::Component(Component::new(name, render)),
            Props::new(),
        )
    }

    pub(crate) fn root(child: Element) -> Self {
        let mut props = Props::new();
        props.children.push(child);
        Self::from_parts(ElementType::host(ROOT_TAG), props)
    }

    pub fn element_type(&self) -> &ElementType {
        &self.inner.element_type
    }

    pub fn props(&self) -> &Props {
        &self.inner.props
    }

    pub fn children(&self) -> &[Element] {
        &self.inner.props.children
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.inner).props.insert(key, value);
        self
    }

    /// Attaches a listener under the `on<Event>` key convention, so
    /// `.on("Click", ..)` registers `onClick`.
    pub fn on(self, event: &str, listener: impl Fn(&Event) + 'static) -> Self {
        self.attr(format!("on{event}"), PropValue::listener(listener))
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        Rc::make_mut(&mut self.inner).props.push_child(child);
        self
    }

    pub fn children_from<C: Into<Child>>(mut self, children: impl IntoIterator<Item = C>) -> Self {
        let props = &mut Rc::make_mut(&mut self.inner).props;
        for child in children {
            props.push_child(child);
        }
        self
    }

    pub fn is_text(&self) -> bool {
        matches!(self.inner.element_type, ElementType::Text)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("type", &self.inner.element_type)
            .field("props", &self.inner.props)
            .finish()
    }
}

/// A child as written by the caller, before normalization.
#[derive(Clone, Debug)]
pub enum Child {
    Element(Element),
    Text(String),
}

impl Child {
    fn into_element(self) -> Element {
        match self {
            Child::Element(element) => element,
            Child::Text(text) => build_text(text),
        }
    }
}

impl From<Element> for Child {
    fn from(value: Element) -> Self {
        Child::Element(value)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Text(value.to_owned())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::Text(value)
    }
}

macro_rules! text_child_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Child {
                fn from(value: $ty) -> Self {
                    Child::Text(value.to_string())
                }
            }
        )*
    };
}

text_child_from!(i32, i64, u32, u64, usize, f32, f64, bool);

/// Builds an element, wrapping every child that is not already an element
/// into a text element.
pub fn build(
    element_type: ElementType,
    props: Props,
    children: impl IntoIterator<Item = Child>,
) -> Element {
    let mut props = props;
    props.children.clear();
    props
        .children
        .extend(children.into_iter().map(Child::into_element));
    Element::from_parts(element_type, props)
}

/// Builds a text element carrying `value` as its `nodeValue`.
pub fn build_text(value: impl Into<String>) -> Element {
    let props = Props::new().with(NODE_VALUE, PropValue::Str(value.into()));
    Element::from_parts(ElementType::Text, props)
}

/// Collects mixed children for [`build`]: `children!["a", 1, some_element]`.
#[macro_export]
macro_rules! children {
    ($($child:expr),* $(,)?) => {
        ::std::vec![$($crate::Child::from($child)),*]
    };
}

#[cfg(test)]
#[path = "tests/element_tests.rs"]
mod tests;
