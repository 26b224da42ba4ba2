//! The virtual tree: raw descriptions and canonical nodes.
//!
//! Both sides of normalization share one [`Node`] type. A *canonical* tree is simply a
//! `Node` that [`normalize`](`crate::normalize::normalize`) maps to itself: it carries
//! no [`Tag::Component`] anywhere, and element children contain no blank entries, so
//! positional indices stay stable and meaningful to the differ.

use crate::{
	error::ComponentError,
	events::{EventHandler, HandlerResult},
	host::Event,
};
use core::fmt;
use std::rc::Rc;

/// One capability: produce a description from props and children.
///
/// Components are pure: they are re-invoked on every normalization pass and must not
/// retain state between passes.
pub trait Component {
	/// # Errors
	///
	/// A failure here aborts the render pass it occurs in; see
	/// [`RenderError::Component`](`crate::error::RenderError::Component`).
	fn render(&self, props: &Props, children: &[Node]) -> Result<Node, ComponentError>;

	/// Name used in error messages and logging.
	fn name(&self) -> &str {
		"component"
	}
}

/// An element's tag: a host tag name, or a component awaiting expansion.
#[derive(Clone)]
pub enum Tag {
	Host(String),
	Component(Rc<dyn Component>),
}

impl PartialEq for Tag {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Host(a), Self::Host(b)) => a == b,
			#[allow(clippy::vtable_address_comparisons)]
			(Self::Component(a), Self::Component(b)) => Rc::ptr_eq(a, b),
			_ => false,
		}
	}
}

impl fmt::Debug for Tag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Host(tag) => write!(f, "Tag::Host({:?})", tag),
			Self::Component(component) => write!(f, "Tag::Component({:?})", component.name()),
		}
	}
}

/// An attribute or event value. A closed set decided at the description-construction
/// boundary, so attribute application switches on tags instead of runtime type tests.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	/// An event handler; the category derives from the lower-cased key minus its `on`
	/// prefix (`onClick` → `click`).
	Handler(EventHandler),
	/// A style mapping, merged into the host's live style map.
	Style(Vec<(String, String)>),
	/// A boolean flag; see the attribute-application policy for reflected keys.
	Flag(bool),
	/// A plain attribute value.
	Text(String),
	/// Explicit absence: removes the attribute when diffed, skipped when materializing.
	Null,
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}
impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Self::Flag(value)
	}
}
impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Self::Text(value.to_string())
	}
}
impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Self::Text(value.to_string())
	}
}
impl From<EventHandler> for Value {
	fn from(value: EventHandler) -> Self {
		Self::Handler(value)
	}
}
impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

/// An ordered attribute/event mapping. Key order is preserved; lookups are by key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props(Vec<(String, Value)>);

impl Props {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style insert.
	#[must_use]
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.insert(key, value);
		self
	}

	/// Builder-style handler attachment under an `on*` key.
	#[must_use]
	pub fn on(self, key: impl Into<String>, handler: impl Fn(&Event) -> HandlerResult + 'static) -> Self {
		self.with(key, EventHandler::new(handler))
	}

	/// Inserts or replaces the value under `key`.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
		let key = key.into();
		let value = value.into();
		match self.0.iter_mut().find(|(k, _)| *k == key) {
			Some((_, v)) => *v = value,
			None => self.0.push((key, value)),
		}
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
	}

	#[must_use]
	pub fn contains(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}
}

/// An element record: tag, props and ordered children.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
	pub tag: Tag,
	pub props: Props,
	pub children: Vec<Node>,
}

/// A virtual node.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
	/// Nothing rendered. Carries no host presence of its own; materializes as an empty
	/// text node so it composes uniformly with text in sequences.
	Empty,
	Text(String),
	/// An ordered sequence with no wrapping host node; members occupy contiguous
	/// positional slots in the parent's own child list.
	List(Vec<Node>),
	Element(Element),
}

impl Node {
	/// Whether this node renders nothing: [`Node::Empty`], an empty text node, or an
	/// empty sequence. Blank children are filtered out of elements during
	/// normalization.
	#[must_use]
	pub fn is_blank(&self) -> bool {
		match self {
			Self::Empty => true,
			Self::Text(text) => text.is_empty(),
			Self::List(members) => members.is_empty(),
			Self::Element(_) => false,
		}
	}

	/// Number of host child slots this node occupies when materialized into a parent:
	/// sequences splice their members into the parent's own child list, everything else
	/// is exactly one host node.
	#[must_use]
	pub fn dom_len(&self) -> usize {
		match self {
			Self::List(members) => members.iter().map(Self::dom_len).sum(),
			_ => 1,
		}
	}
}

impl From<&str> for Node {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}
impl From<String> for Node {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<i32> for Node {
	fn from(value: i32) -> Self {
		Self::Text(value.to_string())
	}
}
impl From<i64> for Node {
	fn from(value: i64) -> Self {
		Self::Text(value.to_string())
	}
}
/// Booleans render nothing, matching conditional-rendering idioms like
/// `cond && el(..)`.
impl From<bool> for Node {
	fn from(_: bool) -> Self {
		Self::Empty
	}
}
impl<T: Into<Node>> From<Option<T>> for Node {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Empty, Into::into)
	}
}
impl From<Vec<Node>> for Node {
	fn from(value: Vec<Node>) -> Self {
		Self::List(value)
	}
}

/// Flattens arbitrarily nested lists into one child list and drops blank leaves, the
/// way the description factory filters falsy children. `Text("0")` is kept.
fn flatten_into(children: &mut Vec<Node>, node: Node) {
	match node {
		Node::List(members) => {
			for member in members {
				flatten_into(children, member);
			}
		}
		node if node.is_blank() => {}
		node => children.push(node),
	}
}

fn collect_children<C, N>(raw: C) -> Vec<Node>
where
	C: IntoIterator<Item = N>,
	N: Into<Node>,
{
	let mut children = Vec::new();
	for child in raw {
		flatten_into(&mut children, child.into());
	}
	children
}

/// Builds a host element description.
pub fn el<C, N>(tag: impl Into<String>, props: Props, children: C) -> Node
where
	C: IntoIterator<Item = N>,
	N: Into<Node>,
{
	Node::Element(Element {
		tag: Tag::Host(tag.into()),
		props,
		children: collect_children(children),
	})
}

/// Builds a component description; the component expands during normalization.
pub fn component<C, N>(component: impl Component + 'static, props: Props, children: C) -> Node
where
	C: IntoIterator<Item = N>,
	N: Into<Node>,
{
	Node::Element(Element {
		tag: Tag::Component(Rc::new(component)),
		props,
		children: collect_children(children),
	})
}

/// Builds a text description.
pub fn text(value: impl Into<Node>) -> Node {
	value.into()
}

/// Builds a sequence description. Not flattened here; nesting collapses positionally
/// during diffing and normalization keeps members index-stable.
pub fn list<C, N>(members: C) -> Node
where
	C: IntoIterator<Item = N>,
	N: Into<Node>,
{
	Node::List(members.into_iter().map(Into::into).collect())
}
