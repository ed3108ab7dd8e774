use std::collections::HashMap;
use std::sync::Arc;

use crate::builder::call::GradientRemap;
use crate::builder::check::NestingTracker;
use crate::builder::protocol::{ImageBuilder, InitTables};
use crate::canon::tables::TableSet;
use crate::compact::decode::{Op, OpReader, read_document, read_tables, write_document, write_tables};
use crate::compact::format::{FloatWidth, Header};
use crate::compact::reader::ByteReader;
use crate::compact::writer::ByteWriter;
use crate::foundation::error::{VgcError, VgcResult};
use crate::graph::builder::{GraphBuildOpts, GraphBuilder};
use crate::graph::image::GraphImage;
use crate::model::ids::{FloatListId, GradientId, ImageId, StringId};
use crate::model::image::ImageData;
use crate::model::paint::Gradient;
use crate::model::painter::Painter;
use crate::model::primitive::{PrimitiveSink, Resolver, missing_index};
use crate::model::shape::{ClipPath, DocumentAttrs, Shape, TextLeaf};

/// Immutable compact image: canonical tables plus an opcode stream.
///
/// Cloning is cheap; tables and ops are shared. The stream is validated once on construction,
/// so replay and traversal never see a malformed stream.
#[derive(Clone, Debug)]
pub struct CompactImage {
    header: Header,
    doc: DocumentAttrs,
    tables: Arc<TableSet>,
    ops: Arc<[u8]>,
    gradients: Arc<[Arc<Gradient>]>,
    exports: Arc<HashMap<StringId, usize>>,
}

struct CompactResolver<'a> {
    tables: &'a TableSet,
    gradients: &'a [Arc<Gradient>],
}

impl Resolver for CompactResolver<'_> {
    fn image(&self, id: ImageId) -> VgcResult<Arc<ImageData>> {
        self.tables.image(id.0)
    }

    fn string(&self, id: StringId) -> VgcResult<Arc<str>> {
        self.tables.string(id.0)
    }

    fn float_list(&self, id: FloatListId) -> VgcResult<Arc<[f64]>> {
        self.tables.float_list(id.0)
    }

    fn gradient(&self, id: GradientId) -> VgcResult<Arc<Gradient>> {
        self.gradients
            .get(id.index())
            .cloned()
            .ok_or_else(|| missing_index("gradient", id.0))
    }
}

impl CompactImage {
    pub(crate) fn from_parts(
        header: Header,
        doc: DocumentAttrs,
        tables: Arc<TableSet>,
        ops: Arc<[u8]>,
    ) -> VgcResult<Self> {
        let (gradients, exports) = scan(&tables, &ops, header.float_width)?;
        Ok(Self {
            header,
            doc,
            tables,
            ops,
            gradients: gradients.into(),
            exports: Arc::new(exports),
        })
    }

    /// Load from the persisted byte format.
    ///
    /// Fails with [`VgcError::Format`] on a bad header, a different major version or a
    /// truncated stream, and with [`VgcError::Structural`] on dangling references.
    #[tracing::instrument(skip_all, fields(len = bytes.len()))]
    pub fn from_bytes(bytes: &[u8]) -> VgcResult<Self> {
        let mut r = ByteReader::new(bytes, FloatWidth::F32);
        let header = r.header()?;

        let mut sec = r.section("tables")?;
        let tables = read_tables(&mut sec)?;
        sec.skip_rest("tables");

        let mut sec = r.section("document")?;
        let doc = read_document(&mut sec)?;
        sec.skip_rest("document");

        let mut sec = r.section("ops")?;
        let ops: Arc<[u8]> = sec.take(sec.remaining())?.into();

        while !r.is_empty() {
            r.section("extension")?.skip_rest("extension");
        }
        Self::from_parts(header, doc, Arc::new(tables), ops)
    }

    /// Serialize to the persisted byte format.
    ///
    /// Fails with [`VgcError::Format`] only when a table entry or section is too long for a
    /// `u32` length prefix.
    pub fn to_bytes(&self) -> VgcResult<Vec<u8>> {
        let mut w = ByteWriter::new(self.header.float_width);
        w.header(Header::current(self.header.float_width));
        w.section(|w| write_tables(w, &self.tables))?;
        w.section(|w| {
            write_document(w, &self.doc);
            Ok(())
        })?;
        w.section(|w| {
            w.bytes(&self.ops);
            Ok(())
        })?;
        Ok(w.into_bytes())
    }

    /// Header this image was written or read with.
    pub fn header(&self) -> Header {
        self.header
    }

    /// Document attributes.
    pub fn document(&self) -> &DocumentAttrs {
        &self.doc
    }

    /// Entry counts of the canonical tables: images, strings, float lists, transforms, paths.
    pub fn table_counts(&self) -> [usize; 5] {
        self.tables.counts()
    }

    /// Number of registered gradients.
    pub fn gradient_count(&self) -> usize {
        self.gradients.len()
    }

    pub(crate) fn tables(&self) -> &Arc<TableSet> {
        &self.tables
    }

    pub(crate) fn with_document(&self, doc: DocumentAttrs) -> Self {
        Self {
            doc,
            ..self.clone()
        }
    }

    /// Return `true` when `other` shares this image's canonical tables.
    pub fn shares_tables_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tables, &other.tables)
    }

    fn ops_reader(&self) -> OpReader<'_> {
        OpReader::new(
            ByteReader::new(&self.ops, self.header.float_width),
            &self.tables,
        )
    }

    fn init_tables(&self) -> InitTables {
        InitTables {
            images: self.tables.images.entries().to_vec(),
            strings: self.tables.strings.entries().to_vec(),
            float_lists: self.tables.float_lists.entries().to_vec(),
        }
    }

    /// Re-issue the recorded builder calls on `builder` and finish it.
    pub fn replay<B: ImageBuilder>(&self, mut builder: B) -> VgcResult<B::Output> {
        builder.init(&self.init_tables())?;
        builder.document(&self.doc)?;
        let mut remap = GradientRemap::default();
        let mut ops = self.ops_reader();
        while let Some(op) = ops.next_op()? {
            match op {
                Op::BeginGroup(g) => builder.begin_group(&g)?,
                Op::EndGroup => builder.end_group()?,
                Op::Gradient(g) => remap.push(builder.gradient(&g)?),
                Op::ClipPath {
                    path,
                    rule,
                    transform,
                } => builder.clip_path(&ClipPath {
                    path: (*path).clone(),
                    rule,
                    transform,
                })?,
                Op::BeginMask => builder.begin_mask()?,
                Op::MaskContent => builder.mask_content()?,
                Op::EndMask => builder.end_mask()?,
                Op::Path {
                    path,
                    paint,
                    transform,
                } => builder.path(&Shape {
                    geometry: (*path).clone(),
                    paint: remap.paint(&paint)?,
                    transform,
                })?,
                Op::Rect(s) => builder.rect(&remap.shape(&s)?)?,
                Op::Ellipse(s) => builder.ellipse(&remap.shape(&s)?)?,
                Op::Poly(s) => builder.poly(&remap.shape(&s)?)?,
                Op::Image(i) => builder.image(&i)?,
                Op::Text(t) => builder.text(&TextLeaf {
                    paint: remap.paint(&t.paint)?,
                    ..t
                })?,
                Op::Use(u) => builder.use_ref(&u)?,
            }
        }
        builder.finish()
    }

    /// Emit drawing primitives without materializing a graph.
    pub fn traverse<S: PrimitiveSink + ?Sized>(&self, sink: &mut S) -> VgcResult<()> {
        let resolver = CompactResolver {
            tables: &self.tables,
            gradients: &self.gradients,
        };
        let mut painter = Painter::new(sink);
        let mut ops = self.ops_reader();
        self.walk(&mut ops, &mut painter, &resolver, false)?;
        painter.finish();
        Ok(())
    }

    fn walk<S: PrimitiveSink + ?Sized>(
        &self,
        ops: &mut OpReader<'_>,
        painter: &mut Painter<'_, S>,
        resolver: &CompactResolver<'_>,
        single_group: bool,
    ) -> VgcResult<()> {
        let mut depth = 0usize;
        while let Some(op) = ops.next_op()? {
            match op {
                Op::BeginGroup(g) => {
                    depth += 1;
                    painter.begin_group(g.transform, g.alpha);
                }
                Op::EndGroup => {
                    painter.end_group();
                    depth = depth.saturating_sub(1);
                    if single_group && depth == 0 {
                        return Ok(());
                    }
                }
                Op::Gradient(_) => {}
                Op::ClipPath {
                    path,
                    rule,
                    transform,
                } => painter.clip(path, rule, transform),
                Op::BeginMask => painter.begin_mask(),
                Op::MaskContent => painter.mask_content(),
                Op::EndMask => painter.end_mask(),
                Op::Path {
                    path,
                    paint,
                    transform,
                } => painter.path(resolver, path, &paint, transform)?,
                Op::Rect(s) => painter.rect(resolver, s.geometry, &s.paint, s.transform)?,
                Op::Ellipse(s) => painter.ellipse(resolver, s.geometry, &s.paint, s.transform)?,
                Op::Poly(s) => {
                    painter.poly(resolver, Arc::new(s.geometry), &s.paint, s.transform)?
                }
                Op::Image(i) => painter.image(resolver, i.image, i.dest, i.transform)?,
                Op::Text(t) => painter.text(resolver, &t)?,
                Op::Use(u) => {
                    let at = *self.exports.get(&u.target).ok_or_else(|| {
                        VgcError::structural(format!("use of unresolved export id {}", u.target.0))
                    })?;
                    let mut target = ops.clone();
                    target.seek(at)?;
                    painter.begin_use(u.transform);
                    self.walk(&mut target, painter, resolver, true)?;
                    painter.end_use();
                }
            }
        }
        Ok(())
    }

    /// Build the shared-node graph form of this image.
    pub fn to_graph(&self, opts: GraphBuildOpts) -> VgcResult<GraphImage> {
        self.replay(GraphBuilder::new(opts))
    }
}

/// Validate the whole op stream once: nesting, references, and table indices.
fn scan(
    tables: &TableSet,
    ops: &[u8],
    float_width: FloatWidth,
) -> VgcResult<(Vec<Arc<Gradient>>, HashMap<StringId, usize>)> {
    let [images, strings, float_lists, _, _] = tables.counts();
    let mut tracker = NestingTracker::new();
    tracker.on_init_counts(images, strings, float_lists)?;
    let mut gradients = Vec::new();
    let mut exports = HashMap::new();
    let mut reader = OpReader::new(ByteReader::new(ops, float_width), tables);
    loop {
        let at = reader.pos();
        let Some(op) = reader.next_op()? else {
            break;
        };
        match op {
            Op::BeginGroup(g) => {
                tracker.on_begin_group(g.export_id)?;
                if let Some(id) = g.export_id {
                    exports.insert(id, at);
                }
            }
            Op::EndGroup => {
                tracker.on_end_group()?;
            }
            Op::Gradient(g) => {
                tracker.on_gradient(&g)?;
                gradients.push(Arc::new(g));
            }
            Op::ClipPath { .. } => tracker.on_clip()?,
            Op::BeginMask => tracker.on_begin_mask()?,
            Op::MaskContent => tracker.on_mask_content()?,
            Op::EndMask => tracker.on_end_mask()?,
            Op::Path { paint, .. } => tracker.on_leaf("path", &paint, gradients.len())?,
            Op::Rect(s) => tracker.on_leaf("rect", &s.paint, gradients.len())?,
            Op::Ellipse(s) => tracker.on_leaf("ellipse", &s.paint, gradients.len())?,
            Op::Poly(s) => tracker.on_leaf("poly", &s.paint, gradients.len())?,
            Op::Image(i) => tracker.on_image(i.image)?,
            Op::Text(t) => tracker.on_text(t.text, t.font_family, &t.paint, gradients.len())?,
            Op::Use(u) => tracker.on_use(u.target)?,
        }
    }
    tracker.on_finish()?;
    Ok((gradients, exports))
}

#[cfg(test)]
#[path = "../../tests/unit/compact/image.rs"]
mod tests;
