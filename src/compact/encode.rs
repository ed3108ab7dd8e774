use std::sync::Arc;

use crate::builder::check::NestingTracker;
use crate::builder::protocol::{ImageBuilder, InitTables};
use crate::canon::table::{CanonicalTable, KeyScratch};
use crate::canon::tables::{TableInterner, TableSet};
use crate::compact::format::{
    FloatWidth, GROUP_ALPHA, GROUP_EXPORT, GROUP_TRANSFORM, Header, Opcode, PAINT_FILL,
    PAINT_STROKE, SOURCE_GRADIENT, SOURCE_SOLID,
};
use crate::compact::image::CompactImage;
use crate::compact::writer::ByteWriter;
use crate::foundation::core::Affine;
use crate::foundation::error::VgcResult;
use crate::model::ids::{FloatListId, GradientId, ImageId, StringId};
use crate::model::paint::{Gradient, GradientKind, PaintAttrs, PaintSource};
use crate::model::path::PathData;
use crate::model::primitive::missing_index;
use crate::model::shape::{
    ClipPath, DocumentAttrs, EllipseGeom, GroupAttrs, ImageLeaf, PolyGeom, RectGeom, Shape,
    TextLeaf, UseRef,
};

/// Options for [`Encoder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncodeOpts {
    /// Float width of the canonical tables.
    pub float_width: FloatWidth,
}

/// Init-table index to canonical-table index.
#[derive(Debug, Default)]
struct InitRemap {
    images: Vec<u32>,
    strings: Vec<u32>,
    float_lists: Vec<u32>,
}

fn remap(table: &[u32], kind: &str, index: u32) -> VgcResult<u32> {
    table
        .get(index as usize)
        .copied()
        .ok_or_else(|| missing_index(kind, index))
}

/// [`ImageBuilder`] backend producing a [`CompactImage`].
///
/// Every float that is not part of the document header goes through a canonical table, so
/// the chosen [`FloatWidth`] only changes the table layout. In `F32` mode values are rounded
/// before they are interned.
#[derive(Debug)]
pub struct Encoder {
    opts: EncodeOpts,
    tracker: NestingTracker,
    tables: TableInterner,
    init: InitRemap,
    gradients: CanonicalTable<Gradient>,
    gradient_scratch: KeyScratch,
    doc: DocumentAttrs,
    ops: ByteWriter,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(EncodeOpts::default())
    }
}

impl Encoder {
    /// Encoder with fresh tables.
    pub fn new(opts: EncodeOpts) -> Self {
        Self::with_tables(opts, TableInterner::new())
    }

    /// Encoder whose tables start as (and stay shared with) `tables` until a new value is
    /// interned.
    pub(crate) fn seeded(opts: EncodeOpts, tables: Arc<TableSet>) -> Self {
        Self::with_tables(opts, TableInterner::seeded(tables))
    }

    fn with_tables(opts: EncodeOpts, tables: TableInterner) -> Self {
        Self {
            opts,
            tracker: NestingTracker::new(),
            tables,
            init: InitRemap::default(),
            gradients: CanonicalTable::new(),
            gradient_scratch: KeyScratch::default(),
            doc: DocumentAttrs::default(),
            ops: ByteWriter::new(opts.float_width),
        }
    }

    fn floats(&mut self, v: &[f64]) -> VgcResult<u32> {
        match self.opts.float_width {
            FloatWidth::F64 => self.tables.float_list(v),
            FloatWidth::F32 => {
                let fw = self.opts.float_width;
                let rounded: Vec<f64> = v.iter().map(|&x| fw.round(x)).collect();
                self.tables.float_list(&rounded)
            }
        }
    }

    fn transform(&mut self, t: Option<Affine>) -> VgcResult<Option<u32>> {
        let fw = self.opts.float_width;
        t.map(|a| self.tables.transform(&round_affine(fw, a)))
            .transpose()
    }

    fn path_index(&mut self, p: &PathData) -> VgcResult<u32> {
        match self.opts.float_width {
            FloatWidth::F64 => self.tables.path(p),
            FloatWidth::F32 => {
                let fw = self.opts.float_width;
                self.tables.path(&p.map_coords(|v| fw.round(v)))
            }
        }
    }

    fn image_index(&self, id: ImageId) -> VgcResult<u32> {
        remap(&self.init.images, "image", id.0)
    }

    fn string_index(&self, id: StringId) -> VgcResult<u32> {
        remap(&self.init.strings, "string", id.0)
    }

    fn float_list_index(&self, id: FloatListId) -> VgcResult<u32> {
        remap(&self.init.float_lists, "float list", id.0)
    }

    fn write_source(&mut self, s: PaintSource) {
        match s {
            PaintSource::Solid(c) => {
                self.ops.u8(SOURCE_SOLID);
                self.ops.u32(c.to_argb());
            }
            PaintSource::Gradient(id) => {
                self.ops.u8(SOURCE_GRADIENT);
                self.ops.varint(id.0);
            }
        }
    }

    /// Intern every table value of `paint` before the opcode is written.
    fn prepare_paint(&mut self, paint: &PaintAttrs) -> VgcResult<PreparedStroke> {
        let Some(s) = paint.stroke else {
            return Ok(PreparedStroke::default());
        };
        Ok(PreparedStroke {
            params: Some(self.floats(&[s.width, s.miter_limit, s.dash_offset])?),
            dash: s.dash.map(|d| self.float_list_index(d)).transpose()?,
        })
    }

    fn write_paint(&mut self, paint: &PaintAttrs, prepared: PreparedStroke) {
        let mut flags = 0;
        if paint.fill.is_some() {
            flags |= PAINT_FILL;
        }
        if paint.stroke.is_some() {
            flags |= PAINT_STROKE;
        }
        self.ops.u8(flags);
        if let Some(f) = paint.fill {
            self.write_source(f.source);
            self.ops.u8(f.rule.code());
        }
        if let (Some(s), Some(params)) = (paint.stroke, prepared.params) {
            self.write_source(s.source);
            self.ops.varint(params);
            self.ops.u8(s.cap.code());
            self.ops.u8(s.join.code());
            self.ops.opt_index(prepared.dash);
        }
    }

    fn shape_op(
        &mut self,
        op: Opcode,
        geom: u32,
        extra: Option<u8>,
        paint: &PaintAttrs,
        transform: Option<Affine>,
    ) -> VgcResult<()> {
        let prepared = self.prepare_paint(paint)?;
        let t = self.transform(transform)?;
        self.ops.u8(op as u8);
        self.ops.varint(geom);
        if let Some(b) = extra {
            self.ops.u8(b);
        }
        self.write_paint(paint, prepared);
        self.ops.opt_index(t);
        Ok(())
    }
}

fn round_affine(fw: FloatWidth, a: Affine) -> Affine {
    Affine::new(a.as_coeffs().map(|v| fw.round(v)))
}

#[derive(Clone, Copy, Debug, Default)]
struct PreparedStroke {
    params: Option<u32>,
    dash: Option<u32>,
}

impl ImageBuilder for Encoder {
    type Output = CompactImage;

    fn init(&mut self, tables: &InitTables) -> VgcResult<()> {
        self.tracker.on_init(tables)?;
        for img in &tables.images {
            let i = self.tables.image(img)?;
            self.init.images.push(i);
        }
        for s in &tables.strings {
            let i = self.tables.string(s)?;
            self.init.strings.push(i);
        }
        for fl in &tables.float_lists {
            let i = self.floats(fl)?;
            self.init.float_lists.push(i);
        }
        Ok(())
    }

    fn document(&mut self, doc: &DocumentAttrs) -> VgcResult<()> {
        self.tracker.on_document()?;
        self.doc = *doc;
        Ok(())
    }

    fn gradient(&mut self, gradient: &Gradient) -> VgcResult<GradientId> {
        self.tracker.on_gradient(gradient)?;
        let geom_floats = gradient.kind.to_floats();
        let geom = self.floats(&geom_floats)?;
        let offsets = FloatListId(self.float_list_index(gradient.offsets)?);
        let transform = self.transform(gradient.transform)?;
        let fw = self.opts.float_width;
        let kind_floats: Vec<f64> = geom_floats.iter().map(|&v| fw.round(v)).collect();
        let canonical = Gradient {
            kind: GradientKind::from_floats(gradient.kind.code(), &kind_floats)?,
            offsets,
            colors: gradient.colors.clone(),
            spread: gradient.spread,
            transform: gradient.transform.map(|a| round_affine(fw, a)),
        };
        let found = self.gradients.find(&canonical, &mut self.gradient_scratch);
        if let Some(i) = found.hit {
            return Ok(GradientId(i));
        }
        self.ops.u8(Opcode::Gradient as u8);
        self.ops.u8(canonical.kind.code());
        self.ops.varint(geom);
        self.ops.varint(offsets.0);
        self.ops.len_prefix(canonical.colors.len())?;
        for c in &canonical.colors {
            self.ops.u32(c.to_argb());
        }
        self.ops.u8(canonical.spread.code());
        self.ops.opt_index(transform);
        let id = self.gradients.push(found.hash, Arc::new(canonical))?;
        Ok(GradientId(id))
    }

    fn begin_group(&mut self, attrs: &GroupAttrs) -> VgcResult<()> {
        self.tracker.on_begin_group(attrs.export_id)?;
        let t = self.transform(attrs.transform)?;
        let export = attrs.export_id.map(|e| self.string_index(e)).transpose()?;
        let mut flags = 0;
        if t.is_some() {
            flags |= GROUP_TRANSFORM;
        }
        if attrs.alpha != 255 {
            flags |= GROUP_ALPHA;
        }
        if export.is_some() {
            flags |= GROUP_EXPORT;
        }
        self.ops.u8(Opcode::BeginGroup as u8);
        self.ops.u8(flags);
        if let Some(t) = t {
            self.ops.varint(t);
        }
        if attrs.alpha != 255 {
            self.ops.u8(attrs.alpha);
        }
        if let Some(e) = export {
            self.ops.varint(e);
        }
        Ok(())
    }

    fn end_group(&mut self) -> VgcResult<()> {
        self.tracker.on_end_group()?;
        self.ops.u8(Opcode::EndGroup as u8);
        Ok(())
    }

    fn clip_path(&mut self, clip: &ClipPath) -> VgcResult<()> {
        self.tracker.on_clip()?;
        let path = self.path_index(&clip.path)?;
        let t = self.transform(clip.transform)?;
        self.ops.u8(Opcode::ClipPath as u8);
        self.ops.varint(path);
        self.ops.u8(clip.rule.code());
        self.ops.opt_index(t);
        Ok(())
    }

    fn begin_mask(&mut self) -> VgcResult<()> {
        self.tracker.on_begin_mask()?;
        self.ops.u8(Opcode::BeginMask as u8);
        Ok(())
    }

    fn mask_content(&mut self) -> VgcResult<()> {
        self.tracker.on_mask_content()?;
        self.ops.u8(Opcode::MaskContent as u8);
        Ok(())
    }

    fn end_mask(&mut self) -> VgcResult<()> {
        self.tracker.on_end_mask()?;
        self.ops.u8(Opcode::EndMask as u8);
        Ok(())
    }

    fn path(&mut self, shape: &Shape<PathData>) -> VgcResult<()> {
        self.tracker
            .on_leaf("path", &shape.paint, self.gradients.len())?;
        let geom = self.path_index(&shape.geometry)?;
        self.shape_op(Opcode::Path, geom, None, &shape.paint, shape.transform)
    }

    fn rect(&mut self, shape: &Shape<RectGeom>) -> VgcResult<()> {
        self.tracker
            .on_leaf("rect", &shape.paint, self.gradients.len())?;
        let geom = self.floats(&shape.geometry.to_floats())?;
        self.shape_op(Opcode::Rect, geom, None, &shape.paint, shape.transform)
    }

    fn ellipse(&mut self, shape: &Shape<EllipseGeom>) -> VgcResult<()> {
        self.tracker
            .on_leaf("ellipse", &shape.paint, self.gradients.len())?;
        let geom = self.floats(&shape.geometry.to_floats())?;
        self.shape_op(Opcode::Ellipse, geom, None, &shape.paint, shape.transform)
    }

    fn poly(&mut self, shape: &Shape<PolyGeom>) -> VgcResult<()> {
        self.tracker
            .on_leaf("poly", &shape.paint, self.gradients.len())?;
        let geom = self.floats(&shape.geometry.to_floats())?;
        let closed = u8::from(shape.geometry.closed);
        self.shape_op(Opcode::Poly, geom, Some(closed), &shape.paint, shape.transform)
    }

    fn image(&mut self, leaf: &ImageLeaf) -> VgcResult<()> {
        self.tracker.on_image(leaf.image)?;
        let image = self.image_index(leaf.image)?;
        let d = leaf.dest;
        let dest = self.floats(&[d.x0, d.y0, d.x1, d.y1])?;
        let t = self.transform(leaf.transform)?;
        self.ops.u8(Opcode::Image as u8);
        self.ops.varint(image);
        self.ops.varint(dest);
        self.ops.opt_index(t);
        Ok(())
    }

    fn text(&mut self, leaf: &TextLeaf) -> VgcResult<()> {
        self.tracker.on_text(
            leaf.text,
            leaf.font_family,
            &leaf.paint,
            self.gradients.len(),
        )?;
        let text = self.string_index(leaf.text)?;
        let family = leaf
            .font_family
            .map(|f| self.string_index(f))
            .transpose()?;
        let params = self.floats(&[leaf.font_size, leaf.origin.x, leaf.origin.y])?;
        let prepared = self.prepare_paint(&leaf.paint)?;
        let t = self.transform(leaf.transform)?;
        self.ops.u8(Opcode::Text as u8);
        self.ops.varint(text);
        self.ops.opt_index(family);
        self.ops.varint(params);
        self.ops.u8(leaf.anchor.code());
        self.write_paint(&leaf.paint, prepared);
        self.ops.opt_index(t);
        Ok(())
    }

    fn use_ref(&mut self, use_ref: &UseRef) -> VgcResult<()> {
        self.tracker.on_use(use_ref.target)?;
        let target = self.string_index(use_ref.target)?;
        let t = self.transform(use_ref.transform)?;
        self.ops.u8(Opcode::Use as u8);
        self.ops.varint(target);
        self.ops.opt_index(t);
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    fn finish(self) -> VgcResult<CompactImage> {
        self.tracker.on_finish()?;
        CompactImage::from_parts(
            Header::current(self.opts.float_width),
            self.doc,
            self.tables.snapshot(),
            self.ops.into_bytes().into(),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compact/encode.rs"]
mod tests;
