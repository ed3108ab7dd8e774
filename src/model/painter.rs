use std::sync::Arc;

use crate::foundation::core::{Affine, Rect};
use crate::foundation::error::VgcResult;
use crate::model::ids::ImageId;
use crate::model::paint::{FillRule, PaintAttrs};
use crate::model::path::PathData;
use crate::model::primitive::{DrawPrimitive, PrimitiveSink, Resolver};
use crate::model::shape::{EllipseGeom, PolyGeom, RectGeom, TextLeaf};

#[derive(Clone, Copy, Debug)]
struct Frame {
    ctm: Affine,
    layer: bool,
    clips: u32,
}

/// Turns a tree walk into balanced [`DrawPrimitive`]s with absolute transforms.
///
/// Both image representations drive the same painter, so they emit identical traversals.
pub(crate) struct Painter<'s, S: PrimitiveSink + ?Sized> {
    sink: &'s mut S,
    frames: Vec<Frame>,
}

impl<'s, S: PrimitiveSink + ?Sized> Painter<'s, S> {
    pub(crate) fn new(sink: &'s mut S) -> Self {
        Self {
            sink,
            frames: vec![Frame {
                ctm: Affine::IDENTITY,
                layer: false,
                clips: 0,
            }],
        }
    }

    fn ctm(&self) -> Affine {
        self.frames.last().map_or(Affine::IDENTITY, |f| f.ctm)
    }

    fn local(&self, t: Option<Affine>) -> Affine {
        match t {
            Some(t) => self.ctm() * t,
            None => self.ctm(),
        }
    }

    fn push_frame(&mut self, ctm: Affine, layer: bool) {
        self.frames.push(Frame {
            ctm,
            layer,
            clips: 0,
        });
    }

    fn pop_frame(&mut self) {
        if let Some(f) = self.frames.pop() {
            for _ in 0..f.clips {
                self.sink.primitive(DrawPrimitive::PopClip);
            }
            if f.layer {
                self.sink.primitive(DrawPrimitive::PopLayer);
            }
        }
    }

    pub(crate) fn begin_group(&mut self, transform: Option<Affine>, alpha: u8) {
        let layer = alpha != 255;
        if layer {
            self.sink.primitive(DrawPrimitive::PushLayer { alpha });
        }
        let ctm = self.local(transform);
        self.push_frame(ctm, layer);
    }

    pub(crate) fn end_group(&mut self) {
        self.pop_frame();
    }

    pub(crate) fn begin_use(&mut self, transform: Option<Affine>) {
        let ctm = self.local(transform);
        self.push_frame(ctm, false);
    }

    pub(crate) fn end_use(&mut self) {
        self.pop_frame();
    }

    pub(crate) fn clip(&mut self, path: Arc<PathData>, rule: FillRule, transform: Option<Affine>) {
        let transform = self.local(transform);
        self.sink.primitive(DrawPrimitive::PushClip {
            path,
            rule,
            transform,
        });
        if let Some(f) = self.frames.last_mut() {
            f.clips += 1;
        }
    }

    pub(crate) fn begin_mask(&mut self) {
        self.sink.primitive(DrawPrimitive::BeginMask);
        self.push_frame(self.ctm(), false);
    }

    pub(crate) fn mask_content(&mut self) {
        self.pop_frame();
        self.sink.primitive(DrawPrimitive::BeginMaskedContent);
        self.push_frame(self.ctm(), false);
    }

    pub(crate) fn end_mask(&mut self) {
        self.pop_frame();
        self.sink.primitive(DrawPrimitive::EndMask);
    }

    pub(crate) fn path(
        &mut self,
        r: &(impl Resolver + ?Sized),
        path: Arc<PathData>,
        paint: &PaintAttrs,
        transform: Option<Affine>,
    ) -> VgcResult<()> {
        let p = DrawPrimitive::Path {
            path,
            style: r.resolve_style(paint)?,
            transform: self.local(transform),
        };
        self.sink.primitive(p);
        Ok(())
    }

    pub(crate) fn rect(
        &mut self,
        r: &(impl Resolver + ?Sized),
        geom: RectGeom,
        paint: &PaintAttrs,
        transform: Option<Affine>,
    ) -> VgcResult<()> {
        let p = DrawPrimitive::Rect {
            geom,
            style: r.resolve_style(paint)?,
            transform: self.local(transform),
        };
        self.sink.primitive(p);
        Ok(())
    }

    pub(crate) fn ellipse(
        &mut self,
        r: &(impl Resolver + ?Sized),
        geom: EllipseGeom,
        paint: &PaintAttrs,
        transform: Option<Affine>,
    ) -> VgcResult<()> {
        let p = DrawPrimitive::Ellipse {
            geom,
            style: r.resolve_style(paint)?,
            transform: self.local(transform),
        };
        self.sink.primitive(p);
        Ok(())
    }

    pub(crate) fn poly(
        &mut self,
        r: &(impl Resolver + ?Sized),
        geom: Arc<PolyGeom>,
        paint: &PaintAttrs,
        transform: Option<Affine>,
    ) -> VgcResult<()> {
        let p = DrawPrimitive::Poly {
            geom,
            style: r.resolve_style(paint)?,
            transform: self.local(transform),
        };
        self.sink.primitive(p);
        Ok(())
    }

    pub(crate) fn image(
        &mut self,
        r: &(impl Resolver + ?Sized),
        image: ImageId,
        dest: Rect,
        transform: Option<Affine>,
    ) -> VgcResult<()> {
        let p = DrawPrimitive::Image {
            image: r.image(image)?,
            dest,
            transform: self.local(transform),
        };
        self.sink.primitive(p);
        Ok(())
    }

    pub(crate) fn text(&mut self, r: &(impl Resolver + ?Sized), leaf: &TextLeaf) -> VgcResult<()> {
        let p = DrawPrimitive::Text {
            text: r.string(leaf.text)?,
            font_family: leaf.font_family.map(|f| r.string(f)).transpose()?,
            font_size: leaf.font_size,
            origin: leaf.origin,
            anchor: leaf.anchor,
            style: r.resolve_style(&leaf.paint)?,
            transform: self.local(leaf.transform),
        };
        self.sink.primitive(p);
        Ok(())
    }

    /// Close the implicit root scope.
    pub(crate) fn finish(mut self) {
        while !self.frames.is_empty() {
            self.pop_frame();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/painter.rs"]
mod tests;
