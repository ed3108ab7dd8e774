use crate::compact::encode::EncodeOpts;
use crate::compact::format::FloatWidth;
use crate::compact::image::CompactImage;
use crate::foundation::core::{Rect, Viewport};
use crate::foundation::error::VgcResult;
use crate::graph::builder::GraphBuildOpts;
use crate::graph::image::GraphImage;
use crate::model::primitive::{DrawPrimitive, PrimitiveSink};
use crate::model::shape::DocumentAttrs;
use crate::viewport::bounds::{BoundsSink, derive_viewport};
use crate::viewport::prune::{PruneOpts, compact_with_viewport, graph_with_viewport};

/// Which in-memory form to materialize.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    /// Table-indexed opcode stream, traversed lazily.
    #[default]
    Compact,
    /// Shared-node graph.
    Graph,
}

/// An immutable vector image in either representation.
#[derive(Clone, Debug)]
pub enum ScalableImage {
    /// Compact representation.
    Compact(CompactImage),
    /// Graph representation.
    Graph(GraphImage),
}

impl From<CompactImage> for ScalableImage {
    fn from(v: CompactImage) -> Self {
        Self::Compact(v)
    }
}

impl From<GraphImage> for ScalableImage {
    fn from(v: GraphImage) -> Self {
        Self::Graph(v)
    }
}

impl ScalableImage {
    /// Decode compact bytes into the requested representation.
    pub fn from_bytes(bytes: &[u8], repr: Representation) -> VgcResult<Self> {
        let compact = CompactImage::from_bytes(bytes)?;
        Ok(match repr {
            Representation::Compact => Self::Compact(compact),
            Representation::Graph => Self::Graph(compact.to_graph(GraphBuildOpts::default())?),
        })
    }

    /// Representation of this value.
    pub fn representation(&self) -> Representation {
        match self {
            Self::Compact(_) => Representation::Compact,
            Self::Graph(_) => Representation::Graph,
        }
    }

    /// Document attributes.
    pub fn document(&self) -> &DocumentAttrs {
        match self {
            Self::Compact(c) => c.document(),
            Self::Graph(g) => g.document(),
        }
    }

    /// Emit drawing primitives in paint order.
    pub fn traverse<S: PrimitiveSink + ?Sized>(&self, sink: &mut S) -> VgcResult<()> {
        match self {
            Self::Compact(c) => c.traverse(sink),
            Self::Graph(g) => g.traverse(sink),
        }
    }

    /// Collect the full traversal.
    pub fn primitives(&self) -> VgcResult<Vec<DrawPrimitive>> {
        let mut out = Vec::new();
        self.traverse(&mut out)?;
        Ok(out)
    }

    /// Union of the painted bounds of every primitive.
    pub fn bounds(&self) -> VgcResult<Option<Rect>> {
        let mut sink = BoundsSink::default();
        self.traverse(&mut sink)?;
        Ok(sink.bounds)
    }

    /// Declared viewport, or one derived from the declared size or the tree bounds.
    pub fn viewport(&self) -> VgcResult<Viewport> {
        derive_viewport(self.document(), || self.bounds())
    }

    /// New image whose viewport is `rect`, sharing unaffected structure with `self`.
    pub fn with_new_viewport(&self, rect: Rect, prune: bool, tolerance: f64) -> VgcResult<Self> {
        self.with_viewport_opts(rect, PruneOpts { prune, tolerance })
    }

    /// [`with_new_viewport`](Self::with_new_viewport) taking [`PruneOpts`].
    #[tracing::instrument(skip(self))]
    pub fn with_viewport_opts(&self, rect: Rect, opts: PruneOpts) -> VgcResult<Self> {
        Ok(match self {
            Self::Compact(c) => Self::Compact(compact_with_viewport(c, rect, opts)?),
            Self::Graph(g) => Self::Graph(graph_with_viewport(g, rect, opts)?),
        })
    }

    /// Compact form; graphs are encoded with `opts`.
    pub fn to_compact(&self, opts: EncodeOpts) -> VgcResult<CompactImage> {
        match self {
            Self::Compact(c) => Ok(c.clone()),
            Self::Graph(g) => g.to_compact(opts),
        }
    }

    /// Graph form; compact images are decoded with `opts`.
    pub fn to_graph(&self, opts: GraphBuildOpts) -> VgcResult<GraphImage> {
        match self {
            Self::Compact(c) => c.to_graph(opts),
            Self::Graph(g) => Ok(g.clone()),
        }
    }

    /// Persisted bytes. Graphs are encoded with 64-bit floats so nothing is rounded.
    pub fn to_bytes(&self) -> VgcResult<Vec<u8>> {
        let opts = EncodeOpts {
            float_width: FloatWidth::F64,
        };
        self.to_compact(opts)?.to_bytes()
    }
}

#[cfg(test)]
#[path = "../tests/unit/image.rs"]
mod tests;
