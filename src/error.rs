use thiserror::Error;

/// Failure raised by a [`Component`](`crate::vdom::Component`)'s `render` implementation.
pub type ComponentError = Box<dyn std::error::Error>;

/// Errors surfaced by a render pass.
///
/// A render pass either applies fully or aborts at the failure point; mutations already
/// committed to earlier sibling subtrees are not rolled back.
#[derive(Debug, Error)]
pub enum RenderError {
	/// A component failed while producing its description. Propagates synchronously to
	/// the render caller; nothing is retried.
	#[error("component `{tag}` failed to render")]
	Component {
		tag: String,
		#[source]
		source: ComponentError,
	},

	/// Component expansion recursed past the configured depth limit.
	#[error("component expansion exceeded the depth limit ({0})")]
	DepthLimit(usize),

	/// A component tag reached materialization. This is a programming error: the caller
	/// skipped normalization, which is the only step that expands components.
	#[error("component `{0}` reached materialization without normalization")]
	Unnormalized(String),
}
