//! Normalization: collapses an arbitrary nested description into canonical form.
//!
//! Canonical trees are what the differ compares: no component tags remain (each is
//! expanded by invoking its [`render`](`crate::vdom::Component::render`) and normalizing
//! the result), and element children carry no blank entries, keeping positional indices
//! stable. Normalization is idempotent: a canonical tree normalizes to itself.

use crate::{
	error::RenderError,
	vdom::{Element, Node, Tag},
};
use tracing::{trace, trace_span};

/// Component nesting depth allowed by [`Renderer`](`crate::render::Renderer`). Bounded
/// by the application's component nesting, not by input size; anything deeper is
/// near-certainly runaway recursion.
pub const DEFAULT_DEPTH_LIMIT: usize = 256;

/// Normalizes `node`, expanding components through at most `depth_limit` nested
/// expansions.
///
/// # Errors
///
/// [`RenderError::Component`] when a component's `render` fails — the failure
/// propagates to the render caller with no partial commit — and
/// [`RenderError::DepthLimit`] when expansion recurses past `depth_limit`.
pub fn normalize(node: Node, depth_limit: usize) -> Result<Node, RenderError> {
	normalize_inner(node, depth_limit, depth_limit)
}

fn normalize_inner(node: Node, budget: usize, depth_limit: usize) -> Result<Node, RenderError> {
	Ok(match node {
		Node::Empty => Node::Empty,
		Node::Text(text) => Node::Text(text),
		Node::List(members) => {
			if members.is_empty() {
				Node::Empty
			} else {
				// Members are normalized but not filtered: filtering is an
				// element-children concern, where it keeps child indices stable.
				Node::List(members.into_iter().map(|member| normalize_inner(member, budget, depth_limit)).collect::<Result<_, _>>()?)
			}
		}
		Node::Element(element) => match element.tag {
			Tag::Component(component) => {
				let span = trace_span!("Expanding component", name = component.name());
				let _enter = span.enter();
				if budget == 0 {
					return Err(RenderError::DepthLimit(depth_limit));
				}
				let rendered = component.render(&element.props, &element.children).map_err(|source| RenderError::Component {
					tag: component.name().to_owned(),
					source,
				})?;
				normalize_inner(rendered, budget - 1, depth_limit)?
			}
			Tag::Host(tag) => {
				let children = element
					.children
					.into_iter()
					.map(|child| normalize_inner(child, budget, depth_limit))
					.collect::<Result<Vec<_>, _>>()?
					.into_iter()
					.filter(|child| {
						if child.is_blank() {
							trace!(tag = %tag, "Dropping blank child.");
							false
						} else {
							true
						}
					})
					.collect();
				Node::Element(Element {
					tag: Tag::Host(tag),
					props: element.props,
					children,
				})
			}
		},
	})
}
