use std::sync::Arc;

use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::error::{VgcError, VgcResult};
use crate::model::ids::{FloatListId, GradientId, ImageId, StringId};
use crate::model::image::ImageData;
use crate::model::paint::{
    Color, Gradient, GradientKind, LineCap, LineJoin, FillRule, PaintAttrs, PaintSource,
    SpreadMethod,
};
use crate::model::path::PathData;
use crate::model::shape::{EllipseGeom, PolyGeom, RectGeom, TextAnchor};

/// Gradient with its stop offsets resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedGradient {
    /// Linear or radial geometry.
    pub kind: GradientKind,
    /// Stop offsets.
    pub offsets: Arc<[f64]>,
    /// Stop colors.
    pub colors: Vec<Color>,
    /// Extension mode.
    pub spread: SpreadMethod,
    /// Gradient-space transform.
    pub transform: Option<Affine>,
}

/// Paint with table references resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolvedPaint {
    /// Flat color.
    Solid(Color),
    /// Gradient ramp.
    Gradient(Arc<ResolvedGradient>),
}

/// Resolved fill.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedFill {
    /// Paint.
    pub paint: ResolvedPaint,
    /// Winding rule.
    pub rule: FillRule,
}

/// Resolved stroke.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStroke {
    /// Paint.
    pub paint: ResolvedPaint,
    /// Stroke width.
    pub width: f64,
    /// End-cap style.
    pub cap: LineCap,
    /// Corner style.
    pub join: LineJoin,
    /// Miter limit.
    pub miter_limit: f64,
    /// Dash pattern.
    pub dash: Option<Arc<[f64]>>,
    /// Dash phase.
    pub dash_offset: f64,
}

/// Resolved fill and stroke of one primitive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedStyle {
    /// Fill, if any.
    pub fill: Option<ResolvedFill>,
    /// Stroke, if any.
    pub stroke: Option<ResolvedStroke>,
}

/// One drawing primitive produced by traversing an image.
///
/// Transforms are absolute (user space of the document). `Push*` primitives are balanced by
/// their `Pop*` counterparts.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawPrimitive {
    /// Start an opacity layer.
    PushLayer {
        /// Layer opacity, 255 is opaque.
        alpha: u8,
    },
    /// End the innermost opacity layer.
    PopLayer,
    /// Intersect the clip with a path.
    PushClip {
        /// Clip geometry.
        path: Arc<PathData>,
        /// Winding rule.
        rule: FillRule,
        /// Absolute transform of the clip geometry.
        transform: Affine,
    },
    /// Drop the innermost clip.
    PopClip,
    /// Start drawing a mask.
    BeginMask,
    /// Mask finished; start drawing the masked content.
    BeginMaskedContent,
    /// Masked content finished.
    EndMask,
    /// Draw a path.
    Path {
        /// Geometry.
        path: Arc<PathData>,
        /// Fill and stroke.
        style: ResolvedStyle,
        /// Absolute transform.
        transform: Affine,
    },
    /// Draw a rectangle.
    Rect {
        /// Geometry.
        geom: RectGeom,
        /// Fill and stroke.
        style: ResolvedStyle,
        /// Absolute transform.
        transform: Affine,
    },
    /// Draw an ellipse.
    Ellipse {
        /// Geometry.
        geom: EllipseGeom,
        /// Fill and stroke.
        style: ResolvedStyle,
        /// Absolute transform.
        transform: Affine,
    },
    /// Draw a polyline or polygon.
    Poly {
        /// Geometry.
        geom: Arc<PolyGeom>,
        /// Fill and stroke.
        style: ResolvedStyle,
        /// Absolute transform.
        transform: Affine,
    },
    /// Draw a raster image.
    Image {
        /// Encoded image.
        image: Arc<ImageData>,
        /// Destination rectangle.
        dest: Rect,
        /// Absolute transform.
        transform: Affine,
    },
    /// Draw a text run.
    Text {
        /// Content.
        text: Arc<str>,
        /// Font family name.
        font_family: Option<Arc<str>>,
        /// Font size.
        font_size: f64,
        /// Baseline origin.
        origin: Point,
        /// Alignment.
        anchor: TextAnchor,
        /// Fill and stroke.
        style: ResolvedStyle,
        /// Absolute transform.
        transform: Affine,
    },
}

/// Consumer of a primitive traversal (the rendering surface side).
pub trait PrimitiveSink {
    /// Receive the next primitive.
    fn primitive(&mut self, p: DrawPrimitive);
}

impl PrimitiveSink for Vec<DrawPrimitive> {
    fn primitive(&mut self, p: DrawPrimitive) {
        self.push(p);
    }
}

/// Table lookups needed to resolve leaf references during traversal.
pub(crate) trait Resolver {
    fn image(&self, id: ImageId) -> VgcResult<Arc<ImageData>>;
    fn string(&self, id: StringId) -> VgcResult<Arc<str>>;
    fn float_list(&self, id: FloatListId) -> VgcResult<Arc<[f64]>>;
    fn gradient(&self, id: GradientId) -> VgcResult<Arc<Gradient>>;

    fn resolve_paint(&self, source: PaintSource) -> VgcResult<ResolvedPaint> {
        Ok(match source {
            PaintSource::Solid(c) => ResolvedPaint::Solid(c),
            PaintSource::Gradient(id) => {
                let g = self.gradient(id)?;
                ResolvedPaint::Gradient(Arc::new(ResolvedGradient {
                    kind: g.kind,
                    offsets: self.float_list(g.offsets)?,
                    colors: g.colors.clone(),
                    spread: g.spread,
                    transform: g.transform,
                }))
            }
        })
    }

    fn resolve_style(&self, paint: &PaintAttrs) -> VgcResult<ResolvedStyle> {
        let fill = match paint.fill {
            Some(f) => Some(ResolvedFill {
                paint: self.resolve_paint(f.source)?,
                rule: f.rule,
            }),
            None => None,
        };
        let stroke = match paint.stroke {
            Some(s) => Some(ResolvedStroke {
                paint: self.resolve_paint(s.source)?,
                width: s.width,
                cap: s.cap,
                join: s.join,
                miter_limit: s.miter_limit,
                dash: s.dash.map(|id| self.float_list(id)).transpose()?,
                dash_offset: s.dash_offset,
            }),
            None => None,
        };
        Ok(ResolvedStyle { fill, stroke })
    }
}

pub(crate) fn missing_index(kind: &str, index: u32) -> VgcError {
    VgcError::structural(format!("missing {kind} index {index}"))
}
