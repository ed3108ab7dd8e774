//! Value types shared by the builder protocol and both image representations.

/// Table index newtypes.
pub mod ids;
/// Encoded raster blobs.
pub mod image;
/// Colors, fills, strokes, gradients.
pub mod paint;
pub(crate) mod painter;
/// Path geometry and the generic path builder interface.
pub mod path;
/// Traversal output consumed by a rendering surface.
pub mod primitive;
/// Leaf geometry and group/document attributes.
pub mod shape;

pub use ids::{FloatListId, GradientId, ImageId, StringId};
pub use image::ImageData;
pub use paint::{
    Color, Fill, FillRule, Gradient, GradientKind, LineCap, LineJoin, PaintAttrs, PaintSource,
    SpreadMethod, Stroke,
};
pub use path::{Coord, PathData, PathSink, PathVerb};
pub use primitive::{
    DrawPrimitive, PrimitiveSink, ResolvedFill, ResolvedGradient, ResolvedPaint, ResolvedStroke,
    ResolvedStyle,
};
pub use shape::{
    ClipPath, DocumentAttrs, EllipseGeom, GroupAttrs, ImageLeaf, PolyGeom, RectGeom, Shape,
    TextAnchor, TextLeaf, UseRef,
};
