//! A positional virtual-tree renderer and differ with delegated event handling.
//!
//! Applications describe their UI declaratively as a [`vdom::Node`] tree;
//! [`render::Renderer`] normalizes the description into canonical form, materializes it
//! on first paint, and on every later pass computes and applies the minimal set of
//! in-place mutations to the live host tree rather than rebuilding it.
//!
//! - [`normalize`] collapses nested descriptions and expands components.
//! - [`create`] builds fresh host subtrees from canonical nodes.
//! - [`diff`] patches an existing host subtree positionally (no keyed reordering).
//! - [`events`] delegates handlers through one listener per root and category, so
//!   handlers survive host-node reuse without per-node listener churn.
//! - [`host`] is the live display tree the above render into.

#![doc(html_root_url = "https://docs.rs/sapling-dom/0.1.0")]
#![warn(clippy::pedantic)]

pub mod attrs;
pub mod create;
pub mod diff;
pub mod error;
pub mod events;
pub mod host;
pub mod normalize;
pub mod render;
pub mod vdom;

pub use error::RenderError;
pub use events::{EventHandler, EventRegistry};
pub use host::HostNode;
pub use render::Renderer;
pub use vdom::{component, el, list, text, Component, Node, Props, Value};
