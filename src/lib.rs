//! vgc converts vector graphics into two immutable runtime representations and caches them.
//!
//! - Markup front ends ([`frontend::svg`]) drive the [`ImageBuilder`] protocol.
//! - [`Encoder`] produces a [`CompactImage`]: a versioned byte format addressed by
//!   canonical-table indices, traversed lazily without re-parsing.
//! - [`GraphBuilder`] produces a [`GraphImage`]: shared immutable nodes, optionally seeded from
//!   a previous build's [`NodeCache`].
//! - [`ScalableImage::with_new_viewport`] derives a re-viewported, optionally pruned image that
//!   shares unaffected structure with its source.
//! - [`ImageCache`] is a refcounted LRU cache over asynchronously produced images with
//!   single-flight loading.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Builder protocol shared by every front end and backend.
pub mod builder;
/// Refcounted LRU image cache.
pub mod cache;
pub(crate) mod canon;
/// Compact binary representation.
pub mod compact;
/// Markup front ends.
pub mod frontend;
/// Shared-node graph representation.
pub mod graph;
/// Representation-independent image.
pub mod image;
/// Value types shared by both representations.
pub mod model;
/// Viewport derivation and pruning.
pub mod viewport;

pub use crate::foundation::config::VgcConfig;
pub use crate::foundation::core::{Affine, BezPath, Point, Rect, Vec2, Viewport, affine_approx_eq};
pub use crate::foundation::error::{VgcError, VgcResult};

pub use crate::builder::{BuilderCall, ImageBuilder, InitTables, Recorder, replay_calls};
pub use crate::cache::{
    ImageCache, ImageCacheOpts, ImageHandle, ImageSource, LoadResult, Source, SourceFormat,
};
pub use crate::compact::{CompactImage, EncodeOpts, Encoder, FloatWidth, Header};
pub use crate::graph::{GraphBuildOpts, GraphBuilder, GraphImage, NodeCache};
pub use crate::image::{Representation, ScalableImage};
pub use crate::model::{DrawPrimitive, PrimitiveSink};
pub use crate::viewport::PruneOpts;
