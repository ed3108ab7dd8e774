//! Graph backend: an acyclic tree of immutable, shared nodes.

/// The [`GraphBuilder`](builder::GraphBuilder) backend.
pub mod builder;
/// Identity maps and the reusable [`NodeCache`](dagger::NodeCache).
pub mod dagger;
/// The [`GraphImage`](image::GraphImage) representation.
pub mod image;
/// Node types.
pub mod node;

pub use builder::{GraphBuildOpts, GraphBuilder};
pub use dagger::NodeCache;
pub use image::GraphImage;
pub use node::{ClipNode, GroupNode, LeafNode, MaskedNode, Node, UseNode};
