//! The diff/patch algorithm: mutates a host parent's child list in place so the child
//! at a position matches a new canonical node, given the canonical node previously
//! applied there.
//!
//! Diffing is strictly positional. A reordered sequence is seen as N positional
//! rewrites rather than N moves; that trades correctness under reordering for O(1)
//! per-slot decisions and a much simpler algorithm, and callers must not rely on host
//! identity surviving a reorder. Within that contract, host nodes ARE reused whenever
//! tag identity matches at a position, so attached handlers survive updates.

use crate::{
	attrs,
	create::create_node,
	error::RenderError,
	events::EventRegistry,
	host::HostNode,
	vdom::{Element, Node},
};
use core::slice;
use tracing::{error, trace, trace_span};

const EMPTY: Node = Node::Empty;

/// Patches host subtrees against a shared [`EventRegistry`], which receives handler
/// registrations for created nodes and releases them for discarded ones.
#[derive(Clone, Debug)]
pub struct TreeDiffer {
	registry: EventRegistry,
}

impl TreeDiffer {
	#[must_use]
	pub fn new(registry: EventRegistry) -> Self {
		Self { registry }
	}

	#[must_use]
	pub fn registry(&self) -> &EventRegistry {
		&self.registry
	}

	/// Mutates `parent`'s child list so the child at `index` matches `new`, recursing
	/// over children. `old` is the canonical node previously applied at that position;
	/// pass `None` on first paint for the subtree.
	///
	/// Children are always processed in ascending index order; trailing removal happens
	/// only after all index-aligned work completes, so indices stay valid mid-pass.
	///
	/// # Errors
	///
	/// Only [`RenderError::Unnormalized`], via materialization of an unnormalized
	/// subtree. A failure aborts the pass at that point; earlier sibling mutations
	/// remain committed.
	pub fn patch(&self, parent: &HostNode, new: Option<&Node>, old: Option<&Node>, index: usize) -> Result<(), RenderError> {
		let new = new.unwrap_or(&EMPTY);
		let old = old.unwrap_or(&EMPTY);

		// 1: nothing was here before. Insert positionally so subtree growth does not
		// shift siblings incorrectly.
		if old.is_blank() {
			if !new.is_blank() {
				let span = trace_span!("Inserting", index);
				let _enter = span.enter();
				let host = create_node(&self.registry, new)?;
				self.insert_at(parent, &host, index);
			}
			return Ok(());
		}

		// 2: rendered before, nothing now.
		if new.is_blank() {
			let span = trace_span!("Removing", index);
			let _enter = span.enter();
			match parent.child(index) {
				Some(child) => self.discard(parent, &child),
				None => error!(index, "Expected to remove a host child beyond the end of the child list. Skipping."),
			}
			return Ok(());
		}

		// 3: text against text.
		if let (Node::Text(t_new), Node::Text(t_old)) = (new, old) {
			let span = trace_span!("Diffing text", %t_old, %t_new);
			let _enter = span.enter();
			if t_new != t_old {
				match parent.child(index) {
					// In-place content update when the slot actually holds a text node.
					Some(child) if child.is_text() => child.set_text(t_new),
					// The slot held a different node kind; replace it outright.
					Some(child) => {
						error!(index, ?child, "Expected a host text node. Recreating.");
						let host = create_node(&self.registry, new)?;
						self.discard_replace(parent, &host, &child);
					}
					None => {
						error!(index, "Expected a host text node beyond the end of the child list. Appending.");
						parent.append_child(&create_node(&self.registry, new)?);
					}
				}
			}
			return Ok(());
		}

		// 4: sequences occupy the parent's own positional space, so recursion
		// addresses position `i` directly rather than adding a layer of indexing.
		if matches!(new, Node::List(_)) || matches!(old, Node::List(_)) {
			let new_members = members(new);
			let old_members = members(old);
			let span = trace_span!("Diffing sequence", new_len = new_members.len(), old_len = old_members.len());
			let _enter = span.enter();
			for i in 0..new_members.len().max(old_members.len()) {
				self.patch(parent, new_members.get(i), old_members.get(i), i)?;
			}
			return Ok(());
		}

		if let (Node::Element(e_new), Node::Element(e_old)) = (new, old) {
			// 5: incompatible shapes are unrepairable; replace wholesale.
			if e_new.tag != e_old.tag {
				let span = trace_span!("Replacing mismatched tags", old = ?e_old.tag, new = ?e_new.tag);
				let _enter = span.enter();
				let host = create_node(&self.registry, new)?;
				match parent.child(index) {
					Some(child) => self.discard_replace(parent, &host, &child),
					None => parent.append_child(&host),
				}
				return Ok(());
			}
			// 6: tags match, reuse the host element.
			return self.update_element(parent, e_new, e_old, index);
		}

		// Remaining kind mismatches (text vs element in either direction): destroy and
		// rebuild.
		let span = trace_span!("Replacing mismatched kinds", index);
		let _enter = span.enter();
		let host = create_node(&self.registry, new)?;
		match parent.child(index) {
			Some(child) => self.discard_replace(parent, &host, &child),
			None => parent.append_child(&host),
		}
		Ok(())
	}

	fn update_element(&self, parent: &HostNode, e_new: &Element, e_old: &Element, index: usize) -> Result<(), RenderError> {
		let span = trace_span!("Diffing element", tag = ?e_new.tag, index);
		let _enter = span.enter();
		let target = match parent.child(index) {
			Some(target) if target.is_element() => target,
			Some(other) => {
				error!(index, ?other, "Expected a host element. Recreating.");
				let host = create_node(&self.registry, &Node::Element(e_new.clone()))?;
				self.discard_replace(parent, &host, &other);
				return Ok(());
			}
			None => {
				error!(index, "Expected a host element beyond the end of the child list. Switching to insertion.");
				let host = create_node(&self.registry, &Node::Element(e_new.clone()))?;
				parent.append_child(&host);
				return Ok(());
			}
		};

		attrs::patch(&self.registry, &target, &e_new.props, &e_old.props);

		for i in 0..e_new.children.len().max(e_old.children.len()) {
			self.patch(&target, e_new.children.get(i), e_old.children.get(i), i)?;
		}

		// Recursion only overwrites and inserts; shrinkage leaves trailing host
		// children behind. Trim them now that index-aligned work is done.
		while target.child_count() > e_new.children.len() {
			match target.last_child() {
				Some(last) => {
					trace!(?last, "Trimming trailing host child.");
					self.discard(&target, &last);
				}
				None => break,
			}
		}
		Ok(())
	}

	fn insert_at(&self, parent: &HostNode, host: &HostNode, index: usize) {
		match parent.child(index) {
			Some(reference) => parent.insert_before(host, &reference),
			None => parent.append_child(host),
		}
	}

	/// Removes `child`, releasing its subtree's handler registrations first so the
	/// registry holds no residue for discarded nodes.
	fn discard(&self, parent: &HostNode, child: &HostNode) {
		self.registry.forget_subtree(child);
		parent.remove_child(child);
	}

	fn discard_replace(&self, parent: &HostNode, new: &HostNode, old: &HostNode) {
		self.registry.forget_subtree(old);
		parent.replace_child(new, old);
	}
}

/// Coerces a non-sequence node to a one-element sequence for positional recursion.
fn members(node: &Node) -> &[Node] {
	match node {
		Node::List(members) => members,
		other => slice::from_ref(other),
	}
}
