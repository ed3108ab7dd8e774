use crate::foundation::core::{Affine, Point, Rect, Viewport};
use crate::foundation::error::VgcResult;
use crate::model::primitive::{DrawPrimitive, PrimitiveSink, ResolvedStyle};
use crate::model::shape::{DocumentAttrs, EllipseGeom, PolyGeom, RectGeom, TextAnchor};

/// Local bounds of a rectangle leaf.
pub fn rect_bounds(g: &RectGeom) -> Rect {
    g.rect.abs()
}

/// Local bounds of an ellipse leaf.
pub fn ellipse_bounds(g: &EllipseGeom) -> Rect {
    let (rx, ry) = (g.rx.abs(), g.ry.abs());
    Rect::new(
        g.center.x - rx,
        g.center.y - ry,
        g.center.x + rx,
        g.center.y + ry,
    )
}

/// Local bounds of a polyline, `None` without points.
pub fn poly_bounds(g: &PolyGeom) -> Option<Rect> {
    let mut pts = g.points.iter().copied();
    let first = pts.next()?;
    Some(pts.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
}

/// Conservative local bounds of an unshaped text run: one em per character, one em above
/// the baseline and half an em below it.
pub fn text_bounds(text: &str, font_size: f64, origin: Point, anchor: TextAnchor) -> Rect {
    let size = font_size.abs();
    let w = text.chars().count() as f64 * size;
    let x0 = match anchor {
        TextAnchor::Start => origin.x,
        TextAnchor::Middle => origin.x - w / 2.0,
        TextAnchor::End => origin.x - w,
    };
    Rect::new(x0, origin.y - size, x0 + w, origin.y + size * 0.5)
}

/// Device bounds of painted geometry: local bounds inflated by the full stroke width, then
/// mapped through `t`.
///
/// Assumes the rendered extent lies within the control-point hull plus the stroke width.
/// Long miter joins can exceed this slightly; the result errs on the side of retaining.
pub fn painted_bounds(local: Rect, stroke_width: f64, t: Affine) -> Rect {
    let sw = stroke_width.max(0.0);
    t.transform_rect_bbox(local.inflate(sw, sw))
}

fn style_stroke(style: &ResolvedStyle) -> f64 {
    style.stroke.as_ref().map_or(0.0, |s| s.width.max(0.0))
}

/// Absolute bounds of one drawing primitive, `None` for structural primitives and empty
/// geometry.
pub fn primitive_bounds(p: &DrawPrimitive) -> Option<Rect> {
    match p {
        DrawPrimitive::Path {
            path,
            style,
            transform,
        } => Some(painted_bounds(
            path.control_bounds()?,
            style_stroke(style),
            *transform,
        )),
        DrawPrimitive::Rect {
            geom,
            style,
            transform,
        } => Some(painted_bounds(rect_bounds(geom), style_stroke(style), *transform)),
        DrawPrimitive::Ellipse {
            geom,
            style,
            transform,
        } => Some(painted_bounds(
            ellipse_bounds(geom),
            style_stroke(style),
            *transform,
        )),
        DrawPrimitive::Poly {
            geom,
            style,
            transform,
        } => Some(painted_bounds(
            poly_bounds(geom)?,
            style_stroke(style),
            *transform,
        )),
        DrawPrimitive::Image {
            dest, transform, ..
        } => Some(transform.transform_rect_bbox(dest.abs())),
        DrawPrimitive::Text {
            text,
            font_size,
            origin,
            anchor,
            style,
            transform,
            ..
        } => Some(painted_bounds(
            text_bounds(text, *font_size, *origin, *anchor),
            style_stroke(style),
            *transform,
        )),
        _ => None,
    }
}

/// Sink accumulating the union of primitive bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundsSink {
    /// Union so far, `None` until something with extent was drawn.
    pub bounds: Option<Rect>,
}

impl PrimitiveSink for BoundsSink {
    fn primitive(&mut self, p: DrawPrimitive) {
        if let Some(b) = primitive_bounds(&p) {
            self.bounds = Some(union(self.bounds, b));
        }
    }
}

pub(crate) fn union(acc: Option<Rect>, r: Rect) -> Rect {
    acc.map_or(r, |a| a.union(r))
}

/// Viewport of a document: the view box, else the declared size, else the tree bounds.
pub(crate) fn derive_viewport(
    doc: &DocumentAttrs,
    tree_bounds: impl FnOnce() -> VgcResult<Option<Rect>>,
) -> VgcResult<Viewport> {
    if let Some(vb) = doc.view_box {
        let w = doc.width.unwrap_or(vb.width());
        let h = doc.height.unwrap_or(vb.height());
        return Ok(Viewport::with_output_size(vb, w, h));
    }
    if let (Some(w), Some(h)) = (doc.width, doc.height) {
        return Ok(Viewport::new(Rect::new(0.0, 0.0, w, h)));
    }
    let rect = tree_bounds()?.unwrap_or(Rect::ZERO);
    Ok(Viewport::new(rect))
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/bounds.rs"]
mod tests;
