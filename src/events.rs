//! Delegated event handling.
//!
//! Handlers attached to virtual nodes are never installed on the host nodes themselves.
//! Instead, one low-level listener per (root, category) pair delegates to a registry
//! keyed by host-node identity, so handlers survive host-node reuse across updates
//! without per-node listener churn.

use crate::host::{Event, HostId, HostNode, WeakHostNode};
use core::fmt;
use hashbrown::HashMap;
use std::{cell::RefCell, error::Error, rc::Rc};
use tracing::{error, trace, trace_span};

/// Failure returned by an event handler. Caught and logged at the dispatch site; never
/// propagated to the triggering host event.
pub type HandlerError = Box<dyn Error>;

pub type HandlerResult = Result<(), HandlerError>;

/// Event categories for which a delegated listener is installed on each root.
pub const DELEGATED_CATEGORIES: &[&str] = &["click", "focus", "blur", "keydown", "keyup", "mouseover", "mouseout", "change", "input"];

/// A shared handler callable. Compared by identity: replacing a handler in a virtual
/// node's props is detected by pointer inequality, not by signature.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event) -> HandlerResult>);

impl EventHandler {
	pub fn new(handler: impl Fn(&Event) -> HandlerResult + 'static) -> Self {
		Self(Rc::new(handler))
	}

	/// # Errors
	///
	/// Whatever the wrapped callable returns.
	pub fn call(&self, event: &Event) -> HandlerResult {
		(self.0)(event)
	}
}

impl PartialEq for EventHandler {
	#[allow(clippy::vtable_address_comparisons)]
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for EventHandler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0))
	}
}

/// Registrations for one host node. A [`HostId`] is a raw address, which a later
/// allocation can reuse after the node drops; the weak handle is the liveness witness
/// that keeps a reused address from inheriting a dropped node's handlers.
struct NodeEntry {
	node: WeakHostNode,
	/// category → handlers in insertion order.
	categories: HashMap<String, Vec<EventHandler>>,
}

impl NodeEntry {
	fn new(node: &HostNode) -> Self {
		Self {
			node: node.downgrade(),
			categories: HashMap::new(),
		}
	}

	/// Whether this entry belongs to `node` itself, not to a dropped node whose
	/// address `node` reuses.
	fn is_for(&self, node: &HostNode) -> bool {
		self.node.upgrade().is_some_and(|live| live.same_node(node))
	}

	fn is_live(&self) -> bool {
		self.node.upgrade().is_some()
	}

	fn handler_count(&self) -> usize {
		self.categories.values().map(Vec::len).sum()
	}
}

#[derive(Default)]
struct Inner {
	/// Per-node registrations. Entries are pruned the moment a handler list or a
	/// node's category map drains, so replaced host nodes leave no residue; entries
	/// for dropped nodes are invisible to lookups and swept on each render pass.
	handlers: HashMap<HostId, NodeEntry>,
	/// Roots that already carry delegated listeners. Installation is once per live
	/// root, however many render passes touch it.
	installed_roots: HashMap<HostId, WeakHostNode>,
}

/// The handler registry for one application root set.
///
/// Explicitly owned rather than process-global: hold one per [`Renderer`](`crate::render::Renderer`)
/// (or share one between cooperating renderers via `clone`, which aliases the same
/// registry).
#[derive(Clone, Default)]
pub struct EventRegistry {
	inner: Rc<RefCell<Inner>>,
}

impl fmt::Debug for EventRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inner = self.inner.borrow();
		f.debug_struct("EventRegistry")
			.field("nodes", &inner.handlers.len())
			.field("roots", &inner.installed_roots.len())
			.finish()
	}
}

impl EventRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `handler` for `category` events delegated to `node`. Re-registering
	/// the same handler identity is a no-op; distinct handlers accumulate in insertion
	/// order.
	pub fn register(&self, node: &HostNode, category: &str, handler: EventHandler) {
		let mut inner = self.inner.borrow_mut();
		let entry = inner
			.handlers
			.entry(node.id())
			.and_modify(|entry| {
				// A stale entry here means the address was reused after its node
				// dropped; it does not belong to `node`.
				if !entry.is_for(node) {
					*entry = NodeEntry::new(node);
				}
			})
			.or_insert_with(|| NodeEntry::new(node));
		let handlers = entry.categories.entry(category.to_owned()).or_default();
		if handlers.contains(&handler) {
			trace!(?node, category, "Handler already registered; skipping.");
		} else {
			handlers.push(handler);
		}
	}

	/// Removes one handler registration, pruning the category entry and then the node
	/// entry as they drain.
	pub fn unregister(&self, node: &HostNode, category: &str, handler: &EventHandler) {
		let mut inner = self.inner.borrow_mut();
		let Some(entry) = inner.handlers.get_mut(&node.id()) else {
			return;
		};
		if !entry.is_for(node) {
			inner.handlers.remove(&node.id());
			return;
		}
		if let Some(handlers) = entry.categories.get_mut(category) {
			handlers.retain(|h| h != handler);
			if handlers.is_empty() {
				entry.categories.remove(category);
			}
		}
		if entry.categories.is_empty() {
			inner.handlers.remove(&node.id());
		}
	}

	/// Drops every registration for `node` and its host descendants. Called by the
	/// differ's removal and replacement paths before a subtree is discarded.
	pub fn forget_subtree(&self, node: &HostNode) {
		{
			let mut inner = self.inner.borrow_mut();
			if inner.handlers.remove(&node.id()).is_some() {
				trace!(?node, "Dropped handler registrations for discarded node.");
			}
			inner.installed_roots.remove(&node.id());
		}
		for child in node.children() {
			self.forget_subtree(&child);
		}
	}

	/// Installs one delegated listener per category on `root`, exactly once per root
	/// identity. Repeated render passes never double-install.
	pub fn install_delegated_listeners(&self, root: &HostNode) {
		{
			let mut inner = self.inner.borrow_mut();
			// Sweep entries whose nodes have dropped; a dropped node can never
			// receive an event, and its address may be reused by a live one.
			inner.handlers.retain(|_, entry| entry.is_live());
			inner.installed_roots.retain(|_, weak| weak.upgrade().is_some());
			// After the sweep, a surviving entry at this address can only be this
			// root: two live nodes cannot share an allocation.
			if inner.installed_roots.insert(root.id(), root.downgrade()).is_some() {
				trace!(?root, "Delegated listeners already installed.");
				return;
			}
		}
		let span = trace_span!("Installing delegated listeners", ?root);
		let _enter = span.enter();
		for &category in DELEGATED_CATEGORIES {
			let inner = Rc::downgrade(&self.inner);
			let weak_root = root.downgrade();
			// Weak captures on both sides; a listener must not keep its root or the
			// registry alive on its own.
			let listener: Rc<dyn Fn(&Event)> = Rc::new(move |event| {
				if let (Some(inner), Some(root)) = (inner.upgrade(), weak_root.upgrade()) {
					dispatch(&inner, &root, event);
				}
			});
			root.add_listener(category, listener);
		}
	}

	/// Total handler registrations held for live nodes, across all categories.
	#[must_use]
	pub fn handler_count(&self) -> usize {
		self.inner.borrow().handlers.values().filter(|entry| entry.is_live()).map(NodeEntry::handler_count).sum()
	}

	/// Number of live host nodes with at least one registration.
	#[must_use]
	pub fn node_count(&self) -> usize {
		self.inner.borrow().handlers.values().filter(|entry| entry.is_live()).count()
	}
}

/// Resolves a live event against the registry: walk from the actual target upward,
/// stopping short of `root`; the nearest node with handlers for this category receives
/// all of them, in insertion order, and delegation stops there. A resolved event also
/// stops bubbling, so a delegated listener on an enclosing root never re-delivers it.
fn dispatch(inner: &Rc<RefCell<Inner>>, root: &HostNode, event: &Event) {
	let span = trace_span!("Dispatching", category = %event.category, target = ?event.target);
	let _enter = span.enter();

	let mut current = Some(event.target.clone());
	while let Some(node) = current {
		if node.same_node(root) {
			trace!("Reached root without a matching handler.");
			return;
		}
		// Handlers are cloned out so a handler may register or unregister freely.
		let handlers: Option<Vec<EventHandler>> = inner
			.borrow()
			.handlers
			.get(&node.id())
			.filter(|entry| entry.is_for(&node))
			.and_then(|entry| entry.categories.get(&event.category))
			.cloned();
		if let Some(handlers) = handlers {
			for handler in &handlers {
				if let Err(source) = handler.call(event) {
					// One faulty handler must not suppress its siblings or crash dispatch.
					error!(category = %event.category, ?node, "Event handler failed: {}", source);
				}
			}
			event.stop_propagation();
			return;
		}
		current = node.parent();
	}
}
