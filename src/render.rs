//! The render entry point: normalize, then first-paint or patch, and persist the
//! canonical tree per container for the next update.

use crate::{
	create::create_node,
	diff::TreeDiffer,
	error::RenderError,
	events::EventRegistry,
	host::{HostId, HostNode, WeakHostNode},
	normalize::{normalize, DEFAULT_DEPTH_LIMIT},
	vdom::Node,
};
use hashbrown::HashMap;
use tracing::{trace, trace_span};

/// Renders descriptions into containers and keeps their host subtrees synchronized
/// across updates without rebuilding them wholesale.
///
/// Exactly one canonical tree is live per container at any time; it is replaced, never
/// merged, at the end of each successful render pass. Containers are independent: any
/// number may be rendered, in any order.
/// One mounted container: the weak handle witnesses that the [`HostId`] key still
/// names this container and not a later allocation reusing its address.
#[derive(Debug)]
struct Mounted {
	container: WeakHostNode,
	/// The most recently applied canonical tree.
	tree: Node,
}

#[derive(Debug)]
pub struct Renderer {
	differ: TreeDiffer,
	roots: HashMap<HostId, Mounted>,
	depth_limit: usize,
}

impl Default for Renderer {
	fn default() -> Self {
		Self::new()
	}
}

impl Renderer {
	#[must_use]
	pub fn new() -> Self {
		Self::with_registry(EventRegistry::new())
	}

	/// A renderer sharing `registry` with other renderers or with direct registry
	/// users.
	#[must_use]
	pub fn with_registry(registry: EventRegistry) -> Self {
		Self {
			differ: TreeDiffer::new(registry),
			roots: HashMap::new(),
			depth_limit: DEFAULT_DEPTH_LIMIT,
		}
	}

	#[must_use]
	pub fn registry(&self) -> &EventRegistry {
		self.differ.registry()
	}

	/// Renders `description` into `container`: first paint materializes a fresh
	/// subtree, every later call patches the existing one in place. The container must
	/// be empty before first paint; updates address its child list from position 0.
	///
	/// # Errors
	///
	/// Component failures and depth-limit exhaustion propagate from normalization,
	/// before any host mutation of this pass; the container keeps its last-applied
	/// state and stays renderable.
	pub fn render(&mut self, description: impl Into<Node>, container: &HostNode) -> Result<(), RenderError> {
		let span = trace_span!("Render pass", container = ?container);
		let _enter = span.enter();

		// Sweep containers that were dropped without an unmount. After the sweep a
		// surviving entry at this address can only be this container, so a reused
		// address never inherits a dropped container's tree.
		self.roots.retain(|_, mounted| mounted.container.upgrade().is_some());

		let canonical = normalize(description.into(), self.depth_limit)?;
		match self.roots.get(&container.id()) {
			None => {
				trace!("First paint.");
				let host = create_node(self.registry(), &canonical)?;
				container.append_child(&host);
			}
			Some(mounted) => {
				trace!("Updating.");
				self.differ.patch(container, Some(&canonical), Some(&mounted.tree), 0)?;
			}
		}
		self.roots.insert(
			container.id(),
			Mounted {
				container: container.downgrade(),
				tree: canonical,
			},
		);
		self.registry().install_delegated_listeners(container);
		Ok(())
	}

	/// Number of live containers with a persisted tree.
	#[must_use]
	pub fn container_count(&self) -> usize {
		self.roots.values().filter(|mounted| mounted.container.upgrade().is_some()).count()
	}

	/// Removes `container`'s rendered subtree, releases its handler registrations, and
	/// forgets its persisted tree. A later [`render`](`Self::render`) is a fresh first
	/// paint.
	pub fn unmount(&mut self, container: &HostNode) {
		let span = trace_span!("Unmount", container = ?container);
		let _enter = span.enter();
		match self.roots.remove(&container.id()) {
			Some(mounted) if mounted.container.upgrade().is_some_and(|live| live.same_node(container)) => {
				let count = mounted.tree.dom_len().min(container.child_count());
				for _ in 0..count {
					if let Some(child) = container.child(0) {
						self.registry().forget_subtree(&child);
						container.remove_child(&child);
					}
				}
			}
			// A stale entry at this address belonged to a dropped container; removing
			// it was the whole job.
			Some(_) | None => trace!("Nothing rendered here; ignoring."),
		}
	}
}
