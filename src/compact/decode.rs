use std::sync::Arc;

use crate::canon::table::KeyScratch;
use crate::canon::tables::TableSet;
use crate::compact::format::{
    GROUP_ALPHA, GROUP_EXPORT, GROUP_TRANSFORM, Opcode, PAINT_FILL, PAINT_STROKE,
    SOURCE_GRADIENT, SOURCE_SOLID,
};
use crate::compact::reader::ByteReader;
use crate::compact::writer::ByteWriter;
use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::error::{VgcError, VgcResult};
use crate::model::ids::{FloatListId, GradientId, ImageId, StringId};
use crate::model::image::ImageData;
use crate::model::paint::{
    Color, Fill, FillRule, Gradient, GradientKind, LineCap, LineJoin, PaintAttrs, PaintSource,
    SpreadMethod, Stroke,
};
use crate::model::path::{PathData, PathVerb};
use crate::model::shape::{
    DocumentAttrs, EllipseGeom, GroupAttrs, ImageLeaf, PolyGeom, RectGeom, Shape, TextAnchor,
    TextLeaf, UseRef,
};

const DOC_WIDTH: u8 = 0x01;
const DOC_HEIGHT: u8 = 0x02;
const DOC_VIEW_BOX: u8 = 0x04;
const DOC_TINT: u8 = 0x08;

pub(crate) fn write_tables(w: &mut ByteWriter, t: &TableSet) -> VgcResult<()> {
    let images = t.images.entries();
    w.len_prefix(images.len())?;
    for img in images {
        w.u32(img.width);
        w.u32(img.height);
        w.len_prefix(img.bytes.len())?;
        w.bytes(&img.bytes);
    }
    let strings = t.strings.entries();
    w.len_prefix(strings.len())?;
    for s in strings {
        w.len_prefix(s.len())?;
        w.bytes(s.as_bytes());
    }
    let lists = t.float_lists.entries();
    w.len_prefix(lists.len())?;
    for l in lists {
        w.len_prefix(l.len())?;
        for &v in l.iter() {
            w.float(v);
        }
    }
    let transforms = t.transforms.entries();
    w.len_prefix(transforms.len())?;
    for a in transforms {
        for v in a.as_coeffs() {
            w.float(v);
        }
    }
    let paths = t.paths.entries();
    w.len_prefix(paths.len())?;
    for p in paths {
        w.len_prefix(p.verbs().len())?;
        for v in p.verbs() {
            w.u8(v.code());
        }
        for &c in p.coords() {
            w.float(c);
        }
    }
    Ok(())
}

pub(crate) fn read_tables(r: &mut ByteReader<'_>) -> VgcResult<TableSet> {
    let mut t = TableSet::default();
    let mut scratch = KeyScratch::default();

    for _ in 0..r.count()? {
        let width = r.u32()?;
        let height = r.u32()?;
        let len = r.count()?;
        let bytes = r.take(len)?;
        t.images
            .push_loaded(Arc::new(ImageData::new(width, height, bytes)), &mut scratch)?;
    }
    for _ in 0..r.count()? {
        let len = r.count()?;
        let s = std::str::from_utf8(r.take(len)?)
            .map_err(|e| VgcError::format(format!("string table entry: {e}")))?;
        t.strings.push_loaded(Arc::from(s), &mut scratch)?;
    }
    for _ in 0..r.count()? {
        let len = r.count()?;
        let v = (0..len).map(|_| r.float()).collect::<VgcResult<Vec<f64>>>()?;
        t.float_lists.push_loaded(Arc::from(v), &mut scratch)?;
    }
    for _ in 0..r.count()? {
        let mut c = [0.0; 6];
        for v in &mut c {
            *v = r.float()?;
        }
        t.transforms.push_loaded(Arc::new(Affine::new(c)), &mut scratch)?;
    }
    for _ in 0..r.count()? {
        let n = r.count()?;
        let verbs = (0..n)
            .map(|_| PathVerb::from_code(r.u8()?))
            .collect::<VgcResult<Vec<_>>>()?;
        let coords_len: usize = verbs.iter().map(|v| v.coord_count()).sum();
        let coords = (0..coords_len)
            .map(|_| r.float())
            .collect::<VgcResult<Vec<f64>>>()?;
        t.paths
            .push_loaded(Arc::new(PathData::from_parts(verbs, coords)?), &mut scratch)?;
    }
    Ok(t)
}

pub(crate) fn write_document(w: &mut ByteWriter, d: &DocumentAttrs) {
    let mut flags = 0;
    if d.width.is_some() {
        flags |= DOC_WIDTH;
    }
    if d.height.is_some() {
        flags |= DOC_HEIGHT;
    }
    if d.view_box.is_some() {
        flags |= DOC_VIEW_BOX;
    }
    if d.tint.is_some() {
        flags |= DOC_TINT;
    }
    w.u8(flags);
    if let Some(v) = d.width {
        w.f64(v);
    }
    if let Some(v) = d.height {
        w.f64(v);
    }
    if let Some(r) = d.view_box {
        for v in [r.x0, r.y0, r.x1, r.y1] {
            w.f64(v);
        }
    }
    if let Some(c) = d.tint {
        w.u32(c.to_argb());
    }
}

pub(crate) fn read_document(r: &mut ByteReader<'_>) -> VgcResult<DocumentAttrs> {
    let flags = r.u8()?;
    let width = (flags & DOC_WIDTH != 0).then(|| r.f64()).transpose()?;
    let height = (flags & DOC_HEIGHT != 0).then(|| r.f64()).transpose()?;
    let view_box = if flags & DOC_VIEW_BOX != 0 {
        Some(Rect::new(r.f64()?, r.f64()?, r.f64()?, r.f64()?))
    } else {
        None
    };
    let tint = (flags & DOC_TINT != 0)
        .then(|| r.u32().map(Color::from_argb))
        .transpose()?;
    Ok(DocumentAttrs {
        width,
        height,
        view_box,
        tint,
    })
}

/// One decoded opcode with its table references checked and geometry resolved.
///
/// Ids still point into the canonical tables of the image the op was read from.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Op {
    BeginGroup(GroupAttrs),
    EndGroup,
    Gradient(Gradient),
    ClipPath {
        path: Arc<PathData>,
        rule: FillRule,
        transform: Option<Affine>,
    },
    BeginMask,
    MaskContent,
    EndMask,
    Path {
        path: Arc<PathData>,
        paint: PaintAttrs,
        transform: Option<Affine>,
    },
    Rect(Shape<RectGeom>),
    Ellipse(Shape<EllipseGeom>),
    Poly(Shape<PolyGeom>),
    Image(ImageLeaf),
    Text(TextLeaf),
    Use(UseRef),
}

/// Opcode-dispatch decoder over the OPS section; no text is lexed.
#[derive(Clone, Debug)]
pub(crate) struct OpReader<'a> {
    r: ByteReader<'a>,
    tables: &'a TableSet,
}

impl<'a> OpReader<'a> {
    pub(crate) fn new(r: ByteReader<'a>, tables: &'a TableSet) -> Self {
        Self { r, tables }
    }

    pub(crate) fn pos(&self) -> usize {
        self.r.pos()
    }

    pub(crate) fn seek(&mut self, pos: usize) -> VgcResult<()> {
        self.r.seek(pos)
    }

    /// Decode the op at the cursor, or `None` at the end of the stream.
    pub(crate) fn next_op(&mut self) -> VgcResult<Option<Op>> {
        if self.r.is_empty() {
            return Ok(None);
        }
        let op = match Opcode::from_u8(self.r.u8()?)? {
            Opcode::BeginGroup => {
                let flags = self.r.u8()?;
                let transform = if flags & GROUP_TRANSFORM != 0 {
                    Some(self.read_transform()?)
                } else {
                    None
                };
                let alpha = if flags & GROUP_ALPHA != 0 {
                    self.r.u8()?
                } else {
                    255
                };
                let export_id = if flags & GROUP_EXPORT != 0 {
                    Some(self.read_string_id()?)
                } else {
                    None
                };
                Op::BeginGroup(GroupAttrs {
                    transform,
                    alpha,
                    export_id,
                })
            }
            Opcode::EndGroup => Op::EndGroup,
            Opcode::Gradient => {
                let code = self.r.u8()?;
                let geom = self.read_floats()?;
                let kind = GradientKind::from_floats(code, &geom)?;
                let offsets = self.read_float_list_id()?;
                let n = self.r.count()?;
                let colors = (0..n)
                    .map(|_| self.r.u32().map(Color::from_argb))
                    .collect::<VgcResult<Vec<_>>>()?;
                let spread = SpreadMethod::from_code(self.r.u8()?)?;
                let transform = self.opt_transform()?;
                Op::Gradient(Gradient {
                    kind,
                    offsets,
                    colors,
                    spread,
                    transform,
                })
            }
            Opcode::ClipPath => {
                let path = self.read_path()?;
                let rule = FillRule::from_code(self.r.u8()?)?;
                let transform = self.opt_transform()?;
                Op::ClipPath {
                    path,
                    rule,
                    transform,
                }
            }
            Opcode::BeginMask => Op::BeginMask,
            Opcode::MaskContent => Op::MaskContent,
            Opcode::EndMask => Op::EndMask,
            Opcode::Path => {
                let path = self.read_path()?;
                let paint = self.paint()?;
                let transform = self.opt_transform()?;
                Op::Path {
                    path,
                    paint,
                    transform,
                }
            }
            Opcode::Rect => {
                let geometry = RectGeom::from_floats(&self.read_floats()?)?;
                Op::Rect(self.shape_tail(geometry)?)
            }
            Opcode::Ellipse => {
                let geometry = EllipseGeom::from_floats(&self.read_floats()?)?;
                Op::Ellipse(self.shape_tail(geometry)?)
            }
            Opcode::Poly => {
                let v = self.read_floats()?;
                let closed = self.r.u8()? != 0;
                Op::Poly(self.shape_tail(PolyGeom::from_floats(&v, closed)?)?)
            }
            Opcode::Image => {
                let image = self.read_image_id()?;
                let dest = match *self.read_floats()? {
                    [x0, y0, x1, y1] => Rect::new(x0, y0, x1, y1),
                    ref v => return Err(crate::model::shape::operand_count("image", 4, v.len())),
                };
                let transform = self.opt_transform()?;
                Op::Image(ImageLeaf {
                    image,
                    dest,
                    transform,
                })
            }
            Opcode::Text => {
                let text = self.read_string_id()?;
                let font_family = self
                    .r
                    .opt_index()?
                    .map(|i| self.string_id(i))
                    .transpose()?;
                let (font_size, origin) = match *self.read_floats()? {
                    [size, x, y] => (size, Point::new(x, y)),
                    ref v => return Err(crate::model::shape::operand_count("text", 3, v.len())),
                };
                let anchor = TextAnchor::from_code(self.r.u8()?)?;
                let paint = self.paint()?;
                let transform = self.opt_transform()?;
                Op::Text(TextLeaf {
                    text,
                    font_family,
                    font_size,
                    origin,
                    anchor,
                    paint,
                    transform,
                })
            }
            Opcode::Use => {
                let target = self.read_string_id()?;
                let transform = self.opt_transform()?;
                Op::Use(UseRef { target, transform })
            }
        };
        Ok(Some(op))
    }

    fn shape_tail<G>(&mut self, geometry: G) -> VgcResult<Shape<G>> {
        let paint = self.paint()?;
        let transform = self.opt_transform()?;
        Ok(Shape {
            geometry,
            paint,
            transform,
        })
    }

    fn source(&mut self) -> VgcResult<PaintSource> {
        match self.r.u8()? {
            SOURCE_SOLID => Ok(PaintSource::Solid(Color::from_argb(self.r.u32()?))),
            SOURCE_GRADIENT => Ok(PaintSource::Gradient(GradientId(self.r.varint()?))),
            tag => Err(VgcError::format(format!("unknown paint source {tag}"))),
        }
    }

    fn paint(&mut self) -> VgcResult<PaintAttrs> {
        let flags = self.r.u8()?;
        let fill = if flags & PAINT_FILL != 0 {
            let source = self.source()?;
            let rule = FillRule::from_code(self.r.u8()?)?;
            Some(Fill { source, rule })
        } else {
            None
        };
        let stroke = if flags & PAINT_STROKE != 0 {
            let source = self.source()?;
            let (width, miter_limit, dash_offset) = match *self.read_floats()? {
                [w, m, o] => (w, m, o),
                ref v => return Err(crate::model::shape::operand_count("stroke", 3, v.len())),
            };
            let cap = LineCap::from_code(self.r.u8()?)?;
            let join = LineJoin::from_code(self.r.u8()?)?;
            let dash = self
                .r
                .opt_index()?
                .map(|i| self.float_list_id(i))
                .transpose()?;
            Some(Stroke {
                source,
                width,
                cap,
                join,
                miter_limit,
                dash,
                dash_offset,
            })
        } else {
            None
        };
        Ok(PaintAttrs { fill, stroke })
    }

    fn read_floats(&mut self) -> VgcResult<Arc<[f64]>> {
        let i = self.r.varint()?;
        self.tables.float_list(i)
    }

    fn read_path(&mut self) -> VgcResult<Arc<PathData>> {
        let i = self.r.varint()?;
        self.tables.path(i)
    }

    fn read_transform(&mut self) -> VgcResult<Affine> {
        let i = self.r.varint()?;
        self.tables.transform(i)
    }

    fn opt_transform(&mut self) -> VgcResult<Option<Affine>> {
        self.r
            .opt_index()?
            .map(|i| self.tables.transform(i))
            .transpose()
    }

    fn read_string_id(&mut self) -> VgcResult<StringId> {
        let i = self.r.varint()?;
        self.string_id(i)
    }

    fn read_image_id(&mut self) -> VgcResult<ImageId> {
        let i = self.r.varint()?;
        self.tables.image(i).map(|_| ImageId(i))
    }

    fn read_float_list_id(&mut self) -> VgcResult<FloatListId> {
        let i = self.r.varint()?;
        self.float_list_id(i)
    }

    fn string_id(&self, index: u32) -> VgcResult<StringId> {
        self.tables.string(index).map(|_| StringId(index))
    }

    fn float_list_id(&self, index: u32) -> VgcResult<FloatListId> {
        self.tables.float_list(index).map(|_| FloatListId(index))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compact/decode.rs"]
mod tests;
