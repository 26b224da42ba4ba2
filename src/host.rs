//! The host display tree: the live, mutable tree that rendering materializes into and
//! patching mutates in place.
//!
//! This is deliberately a small surface: create element/text nodes, read/write text
//! content, get/set/remove markup attributes, reflected boolean properties, a live style
//! map, positional child splicing, and bubbling-phase event listeners. Everything the
//! differ does goes through these primitives.
//!
//! Nodes are identity-keyed handles ([`HostNode`] is a cheap clone). Every mutating call
//! bumps the owning node's write counter, which tests use to assert that unchanged
//! content produces zero host writes.

use core::fmt;
use std::{
	cell::{Cell, RefCell},
	rc::{Rc, Weak},
};

/// Boolean properties the host reflects onto live element state (`key in element`
/// in DOM terms). Flags outside this set only ever exist as markup attributes.
const REFLECTED_FLAGS: &[&str] = &["autofocus", "checked", "disabled", "hidden", "multiple", "readonly", "required", "selected"];

/// A live event delivered to bubbling-phase listeners.
pub struct Event {
	pub category: String,
	/// The node the event originated on, before any bubbling.
	pub target: HostNode,
	stopped: Cell<bool>,
}

impl Event {
	/// Stops bubbling after the current node. Listeners already collected for the
	/// current node still run; no ancestor sees the event.
	pub fn stop_propagation(&self) {
		self.stopped.set(true);
	}

	#[must_use]
	pub fn propagation_stopped(&self) -> bool {
		self.stopped.get()
	}
}

type Listener = Rc<dyn Fn(&Event)>;

/// Identity of a host node, stable for the node's lifetime.
///
/// Handler bookkeeping is keyed by this rather than by virtual nodes: host nodes are
/// reused across updates whenever tag identity matches.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostId(usize);

impl fmt::Debug for HostId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "HostId({:#x})", self.0)
	}
}

enum Kind {
	Element {
		tag: String,
		attributes: RefCell<Vec<(String, String)>>,
		/// Reflected boolean properties, live state only (never serialized as markup).
		flags: RefCell<Vec<(String, bool)>>,
		/// The live style map. Entries are merged in; only an explicit `style` attribute
		/// removal clears it.
		style: RefCell<Vec<(String, String)>>,
		listeners: RefCell<Vec<(String, Listener)>>,
	},
	Text {
		data: RefCell<String>,
	},
	/// A detached container whose children splice into the real parent on insertion,
	/// leaving no trace of the fragment itself.
	Fragment,
}

struct Inner {
	kind: Kind,
	parent: RefCell<Weak<Inner>>,
	children: RefCell<Vec<HostNode>>,
	writes: Cell<u64>,
}

/// A reference-counted handle to one node of the host tree.
#[derive(Clone)]
pub struct HostNode(Rc<Inner>);

/// A non-owning [`HostNode`] handle, used where a listener must not keep its own root alive.
#[derive(Clone)]
pub struct WeakHostNode(Weak<Inner>);

impl WeakHostNode {
	#[must_use]
	pub fn upgrade(&self) -> Option<HostNode> {
		self.0.upgrade().map(HostNode)
	}
}

impl fmt::Debug for WeakHostNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.upgrade() {
			Some(node) => write!(f, "Weak({:?})", node),
			None => write!(f, "Weak(dead)"),
		}
	}
}

impl PartialEq for HostNode {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}
impl Eq for HostNode {}

impl fmt::Debug for HostNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.0.kind {
			Kind::Element { tag, .. } => write!(f, "HostNode(<{}>)", tag),
			Kind::Text { data } => write!(f, "HostNode({:?})", &*data.borrow()),
			Kind::Fragment => write!(f, "HostNode(fragment)"),
		}
	}
}

impl HostNode {
	#[must_use]
	pub fn new_element(tag: &str) -> Self {
		Self(Rc::new(Inner {
			kind: Kind::Element {
				tag: tag.to_owned(),
				attributes: RefCell::new(Vec::new()),
				flags: RefCell::new(Vec::new()),
				style: RefCell::new(Vec::new()),
				listeners: RefCell::new(Vec::new()),
			},
			parent: RefCell::new(Weak::new()),
			children: RefCell::new(Vec::new()),
			writes: Cell::new(0),
		}))
	}

	#[must_use]
	pub fn new_text(data: &str) -> Self {
		Self(Rc::new(Inner {
			kind: Kind::Text { data: RefCell::new(data.to_owned()) },
			parent: RefCell::new(Weak::new()),
			children: RefCell::new(Vec::new()),
			writes: Cell::new(0),
		}))
	}

	#[must_use]
	pub fn new_fragment() -> Self {
		Self(Rc::new(Inner {
			kind: Kind::Fragment,
			parent: RefCell::new(Weak::new()),
			children: RefCell::new(Vec::new()),
			writes: Cell::new(0),
		}))
	}

	#[must_use]
	pub fn id(&self) -> HostId {
		HostId(Rc::as_ptr(&self.0) as usize)
	}

	#[must_use]
	pub fn downgrade(&self) -> WeakHostNode {
		WeakHostNode(Rc::downgrade(&self.0))
	}

	#[must_use]
	pub fn same_node(&self, other: &Self) -> bool {
		self == other
	}

	#[must_use]
	pub fn is_element(&self) -> bool {
		matches!(self.0.kind, Kind::Element { .. })
	}

	#[must_use]
	pub fn is_text(&self) -> bool {
		matches!(self.0.kind, Kind::Text { .. })
	}

	#[must_use]
	pub fn is_fragment(&self) -> bool {
		matches!(self.0.kind, Kind::Fragment)
	}

	#[must_use]
	pub fn tag(&self) -> Option<String> {
		match &self.0.kind {
			Kind::Element { tag, .. } => Some(tag.clone()),
			_ => None,
		}
	}

	/// Mutations recorded against this node: text, attribute, flag, style and
	/// child-list writes. Reads never count.
	#[must_use]
	pub fn writes(&self) -> u64 {
		self.0.writes.get()
	}

	/// [`writes`](`Self::writes`) summed over this node and all descendants.
	#[must_use]
	pub fn subtree_writes(&self) -> u64 {
		self.writes() + self.0.children.borrow().iter().map(Self::subtree_writes).sum::<u64>()
	}

	fn record_write(&self) {
		self.0.writes.set(self.0.writes.get() + 1);
	}

	// --- text content ---

	#[must_use]
	pub fn text(&self) -> Option<String> {
		match &self.0.kind {
			Kind::Text { data } => Some(data.borrow().clone()),
			_ => None,
		}
	}

	pub fn set_text(&self, text: &str) {
		if let Kind::Text { data } = &self.0.kind {
			*data.borrow_mut() = text.to_owned();
			self.record_write();
		}
	}

	// --- markup attributes ---

	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<String> {
		match &self.0.kind {
			Kind::Element { attributes, .. } => attributes.borrow().iter().find(|(n, _)| n == name).map(|(_, v)| v.clone()),
			_ => None,
		}
	}

	#[must_use]
	pub fn attribute_names(&self) -> Vec<String> {
		match &self.0.kind {
			Kind::Element { attributes, .. } => attributes.borrow().iter().map(|(n, _)| n.clone()).collect(),
			_ => Vec::new(),
		}
	}

	pub fn set_attribute(&self, name: &str, value: &str) {
		if let Kind::Element { attributes, .. } = &self.0.kind {
			let mut attributes = attributes.borrow_mut();
			match attributes.iter_mut().find(|(n, _)| n == name) {
				Some((_, v)) => *v = value.to_owned(),
				None => attributes.push((name.to_owned(), value.to_owned())),
			}
			self.record_write();
		}
	}

	/// Removes a markup attribute. Removing `style` also clears the live style map.
	pub fn remove_attribute(&self, name: &str) {
		if let Kind::Element { attributes, style, .. } = &self.0.kind {
			let mut attributes = attributes.borrow_mut();
			let before = attributes.len();
			attributes.retain(|(n, _)| n != name);
			let mut removed = attributes.len() != before;
			if name == "style" && !style.borrow().is_empty() {
				style.borrow_mut().clear();
				removed = true;
			}
			if removed {
				self.record_write();
			}
		}
	}

	// --- reflected boolean properties ---

	/// Whether this element reflects `name` as a live boolean property.
	#[must_use]
	pub fn reflects_flag(&self, name: &str) -> bool {
		self.is_element() && REFLECTED_FLAGS.contains(&name)
	}

	#[must_use]
	pub fn flag(&self, name: &str) -> bool {
		match &self.0.kind {
			Kind::Element { flags, .. } => flags.borrow().iter().find(|(n, _)| n == name).is_some_and(|(_, v)| *v),
			_ => false,
		}
	}

	pub fn set_flag(&self, name: &str, value: bool) {
		if let Kind::Element { flags, .. } = &self.0.kind {
			let mut flags = flags.borrow_mut();
			match flags.iter_mut().find(|(n, _)| n == name) {
				Some((_, v)) => *v = value,
				None => flags.push((name.to_owned(), value)),
			}
			self.record_write();
		}
	}

	// --- live style map ---

	#[must_use]
	pub fn style(&self, name: &str) -> Option<String> {
		match &self.0.kind {
			Kind::Element { style, .. } => style.borrow().iter().find(|(n, _)| n == name).map(|(_, v)| v.clone()),
			_ => None,
		}
	}

	#[must_use]
	pub fn style_entries(&self) -> Vec<(String, String)> {
		match &self.0.kind {
			Kind::Element { style, .. } => style.borrow().clone(),
			_ => Vec::new(),
		}
	}

	pub fn set_style(&self, name: &str, value: &str) {
		if let Kind::Element { style, .. } = &self.0.kind {
			let mut style = style.borrow_mut();
			match style.iter_mut().find(|(n, _)| n == name) {
				Some((_, v)) => *v = value.to_owned(),
				None => style.push((name.to_owned(), value.to_owned())),
			}
			self.record_write();
		}
	}

	// --- child list ---

	#[must_use]
	pub fn parent(&self) -> Option<HostNode> {
		self.0.parent.borrow().upgrade().map(HostNode)
	}

	#[must_use]
	pub fn child_count(&self) -> usize {
		self.0.children.borrow().len()
	}

	#[must_use]
	pub fn child(&self, index: usize) -> Option<HostNode> {
		self.0.children.borrow().get(index).cloned()
	}

	#[must_use]
	pub fn last_child(&self) -> Option<HostNode> {
		self.0.children.borrow().last().cloned()
	}

	#[must_use]
	pub fn children(&self) -> Vec<HostNode> {
		self.0.children.borrow().clone()
	}

	fn index_of(&self, child: &HostNode) -> Option<usize> {
		self.0.children.borrow().iter().position(|c| c == child)
	}

	fn adopt(&self, child: &HostNode) {
		*child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
	}

	/// Drains a fragment into its member nodes; any other node passes through whole.
	fn splice(node: &HostNode) -> Vec<HostNode> {
		if node.is_fragment() {
			node.0.children.borrow_mut().drain(..).collect()
		} else {
			vec![node.clone()]
		}
	}

	pub fn append_child(&self, child: &HostNode) {
		for node in Self::splice(child) {
			self.adopt(&node);
			self.0.children.borrow_mut().push(node);
		}
		self.record_write();
	}

	/// Inserts `child` before `reference`. Appends when `reference` is not a child of
	/// this node.
	pub fn insert_before(&self, child: &HostNode, reference: &HostNode) {
		match self.index_of(reference) {
			None => self.append_child(child),
			Some(mut index) => {
				for node in Self::splice(child) {
					self.adopt(&node);
					self.0.children.borrow_mut().insert(index, node);
					index += 1;
				}
				self.record_write();
			}
		}
	}

	/// Replaces `old` with `new` in place. Appends when `old` is not a child of this node.
	pub fn replace_child(&self, new: &HostNode, old: &HostNode) {
		match self.index_of(old) {
			None => self.append_child(new),
			Some(index) => {
				*old.0.parent.borrow_mut() = Weak::new();
				self.0.children.borrow_mut().remove(index);
				let mut at = index;
				for node in Self::splice(new) {
					self.adopt(&node);
					self.0.children.borrow_mut().insert(at, node);
					at += 1;
				}
				self.record_write();
			}
		}
	}

	/// Detaches `child`. Returns whether it was present.
	pub fn remove_child(&self, child: &HostNode) -> bool {
		match self.index_of(child) {
			None => false,
			Some(index) => {
				*child.0.parent.borrow_mut() = Weak::new();
				self.0.children.borrow_mut().remove(index);
				self.record_write();
				true
			}
		}
	}

	// --- events ---

	/// Attaches a low-level listener for bubbling-phase delivery of `category` events
	/// reaching this node.
	pub fn add_listener(&self, category: &str, listener: Rc<dyn Fn(&Event)>) {
		if let Kind::Element { listeners, .. } = &self.0.kind {
			listeners.borrow_mut().push((category.to_owned(), listener));
		}
	}

	/// Fires a synthetic `category` event on this node and bubbles it through the
	/// ancestor chain, invoking each node's low-level listeners in turn. Bubbling
	/// ends early when a listener calls [`Event::stop_propagation`].
	pub fn emit(&self, category: &str) {
		let event = Event {
			category: category.to_owned(),
			target: self.clone(),
			stopped: Cell::new(false),
		};
		let mut current = Some(self.clone());
		while let Some(node) = current {
			let matching: Vec<Listener> = match &node.0.kind {
				Kind::Element { listeners, .. } => listeners.borrow().iter().filter(|(c, _)| c == category).map(|(_, l)| l.clone()).collect(),
				_ => Vec::new(),
			};
			for listener in matching {
				listener(&event);
			}
			if event.propagation_stopped() {
				return;
			}
			current = node.parent();
		}
	}

	// --- inspection ---

	/// Serializes this subtree as markup, for assertions and debugging. Reflected flag
	/// properties are live state only and do not appear.
	#[must_use]
	pub fn markup(&self) -> String {
		let mut out = String::new();
		self.write_markup(&mut out);
		out
	}

	fn write_markup(&self, out: &mut String) {
		match &self.0.kind {
			Kind::Text { data } => out.push_str(&data.borrow()),
			Kind::Fragment => {
				for child in &*self.0.children.borrow() {
					child.write_markup(out);
				}
			}
			Kind::Element { tag, attributes, style, .. } => {
				out.push('<');
				out.push_str(tag);
				for (name, value) in &*attributes.borrow() {
					out.push(' ');
					out.push_str(name);
					out.push_str("=\"");
					out.push_str(value);
					out.push('"');
				}
				let style = style.borrow();
				if !style.is_empty() {
					out.push_str(" style=\"");
					for (i, (name, value)) in style.iter().enumerate() {
						if i > 0 {
							out.push_str("; ");
						}
						out.push_str(name);
						out.push_str(": ");
						out.push_str(value);
					}
					out.push('"');
				}
				out.push('>');
				for child in &*self.0.children.borrow() {
					child.write_markup(out);
				}
				out.push_str("</");
				out.push_str(tag);
				out.push('>');
			}
		}
	}
}
