//! Materialization: building a fresh host subtree from a canonical node, with no
//! diffing against prior state. Used for first paint and for whole-subtree replacement
//! during patching.

use crate::{
	attrs,
	error::RenderError,
	events::EventRegistry,
	host::HostNode,
	vdom::{Node, Tag},
};
use tracing::trace_span;

/// Converts one canonical node into a newly created, detached host subtree. Handlers in
/// element props are registered against the new host nodes as they are created.
///
/// # Errors
///
/// [`RenderError::Unnormalized`] when a component tag is encountered: only
/// [`normalize`](`crate::normalize::normalize`) expands components, so reaching one here
/// means the caller skipped normalization. This fails loudly rather than silently
/// rendering nothing.
pub fn create_node(registry: &EventRegistry, node: &Node) -> Result<HostNode, RenderError> {
	match node {
		Node::Empty => Ok(HostNode::new_text("")),
		Node::Text(text) => Ok(HostNode::new_text(text)),
		Node::List(members) => {
			let span = trace_span!("Creating sequence", len = members.len());
			let _enter = span.enter();
			// A fragment's children splice into the real parent on insertion; the
			// fragment itself leaves no trace in the tree.
			let fragment = HostNode::new_fragment();
			for member in members {
				let child = create_node(registry, member)?;
				fragment.append_child(&child);
			}
			Ok(fragment)
		}
		Node::Element(element) => match &element.tag {
			Tag::Component(component) => Err(RenderError::Unnormalized(component.name().to_owned())),
			Tag::Host(tag) => {
				let span = trace_span!("Creating element", tag = %tag);
				let _enter = span.enter();
				let host = HostNode::new_element(tag);
				attrs::apply(registry, &host, &element.props);
				for child in &element.children {
					let child = create_node(registry, child)?;
					host.append_child(&child);
				}
				Ok(host)
			}
		},
	}
}
