//! Viewport derivation and the structure-preserving pruning transform.

/// Bounding boxes of leaves, primitives, and documents.
pub mod bounds;
/// Dropping subtrees outside a viewport.
pub mod prune;

pub use bounds::{BoundsSink, primitive_bounds};
pub use prune::{PruneOpts, prune_graph};
