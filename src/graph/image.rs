use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::builder::protocol::{ImageBuilder, InitTables};
use crate::compact::encode::{EncodeOpts, Encoder};
use crate::compact::image::CompactImage;
use crate::foundation::error::VgcResult;
use crate::graph::dagger::NodeCache;
use crate::graph::node::Node;
use crate::model::ids::{FloatListId, GradientId, ImageId, StringId};
use crate::model::image::ImageData;
use crate::model::paint::{Gradient, PaintAttrs};
use crate::model::painter::Painter;
use crate::model::primitive::{PrimitiveSink, Resolver, missing_index};
use crate::model::shape::{ClipPath, DocumentAttrs, GroupAttrs, Shape, TextLeaf, UseRef};

/// Immutable shared-node image.
///
/// Cloning is cheap. The root is an implicit group holding the top-level nodes.
#[derive(Clone, Debug)]
pub struct GraphImage {
    doc: DocumentAttrs,
    root: Arc<Node>,
    tables: Arc<InitTables>,
    gradients: Arc<[Arc<Gradient>]>,
    cache: NodeCache,
}

impl Resolver for GraphImage {
    fn image(&self, id: ImageId) -> VgcResult<Arc<ImageData>> {
        lookup(&self.tables.images, "image", id.0)
    }

    fn string(&self, id: StringId) -> VgcResult<Arc<str>> {
        lookup(&self.tables.strings, "string", id.0)
    }

    fn float_list(&self, id: FloatListId) -> VgcResult<Arc<[f64]>> {
        lookup(&self.tables.float_lists, "float list", id.0)
    }

    fn gradient(&self, id: GradientId) -> VgcResult<Arc<Gradient>> {
        lookup(&self.gradients, "gradient", id.0)
    }
}

fn lookup<T: ?Sized>(v: &[Arc<T>], kind: &str, index: u32) -> VgcResult<Arc<T>> {
    v.get(index as usize)
        .cloned()
        .ok_or_else(|| missing_index(kind, index))
}

impl GraphImage {
    pub(crate) fn new(
        doc: DocumentAttrs,
        root: Arc<Node>,
        tables: Arc<InitTables>,
        gradients: Arc<[Arc<Gradient>]>,
        cache: NodeCache,
    ) -> Self {
        Self {
            doc,
            root,
            tables,
            gradients,
            cache,
        }
    }

    /// Document attributes.
    pub fn document(&self) -> &DocumentAttrs {
        &self.doc
    }

    /// Implicit root group.
    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// Identity maps of the build that produced this image; pass to
    /// [`crate::graph::GraphBuilder::with_seed`] to reuse nodes in a rebuild.
    pub fn node_cache(&self) -> &NodeCache {
        &self.cache
    }

    /// Init tables the image was built with.
    pub fn tables(&self) -> &InitTables {
        &self.tables
    }

    /// Registered gradients.
    pub fn gradients(&self) -> &[Arc<Gradient>] {
        &self.gradients
    }

    pub(crate) fn with_parts(&self, doc: DocumentAttrs, root: Arc<Node>) -> Self {
        Self {
            doc,
            root,
            ..self.clone()
        }
    }

    fn top_level(&self) -> &[Arc<Node>] {
        self.root.children().unwrap_or(&[])
    }

    /// Emit drawing primitives in paint order.
    pub fn traverse<S: PrimitiveSink + ?Sized>(&self, sink: &mut S) -> VgcResult<()> {
        let mut painter = Painter::new(sink);
        for node in self.top_level() {
            self.paint_node(node, &mut painter)?;
        }
        painter.finish();
        Ok(())
    }

    fn paint_node<S: PrimitiveSink + ?Sized>(
        &self,
        node: &Node,
        painter: &mut Painter<'_, S>,
    ) -> VgcResult<()> {
        match node {
            Node::Group(g) => {
                painter.begin_group(g.transform.as_deref().copied(), g.alpha);
                for c in g.children.iter() {
                    self.paint_node(c, painter)?;
                }
                painter.end_group();
            }
            Node::Clip(c) => {
                painter.clip(Arc::clone(&c.path), c.rule, c.transform.as_deref().copied())
            }
            Node::Masked(m) => {
                painter.begin_mask();
                for c in m.mask.iter() {
                    self.paint_node(c, painter)?;
                }
                painter.mask_content();
                for c in m.content.iter() {
                    self.paint_node(c, painter)?;
                }
                painter.end_mask();
            }
            Node::Path(l) => painter.path(
                self,
                Arc::clone(&l.geometry),
                &l.paint,
                l.transform.as_deref().copied(),
            )?,
            Node::Rect(l) => {
                painter.rect(self, l.geometry, &l.paint, l.transform.as_deref().copied())?
            }
            Node::Ellipse(l) => {
                painter.ellipse(self, l.geometry, &l.paint, l.transform.as_deref().copied())?
            }
            Node::Poly(l) => painter.poly(
                self,
                Arc::clone(&l.geometry),
                &l.paint,
                l.transform.as_deref().copied(),
            )?,
            Node::Image(i) => painter.image(self, i.image, i.dest, i.transform)?,
            Node::Text(t) => painter.text(self, t)?,
            Node::Use(u) => {
                painter.begin_use(u.transform.as_deref().copied());
                self.paint_node(&u.target, painter)?;
                painter.end_use();
            }
        }
        Ok(())
    }

    /// Re-issue builder calls for this image and finish `builder`.
    ///
    /// Only gradients still referenced by a node are registered, in their original order.
    pub fn replay<B: ImageBuilder>(&self, mut builder: B) -> VgcResult<B::Output> {
        builder.init(&self.tables)?;
        builder.document(&self.doc)?;
        let mut live = BTreeSet::new();
        self.root.for_each(&mut |n| {
            if let Some(p) = node_paint(n) {
                live.extend(p.gradients());
            }
        });
        let mut remap = HashMap::with_capacity(live.len());
        for id in live {
            let g = self.gradient(id)?;
            remap.insert(id, builder.gradient(&g)?);
        }
        let map = |id: GradientId| {
            remap
                .get(&id)
                .copied()
                .ok_or_else(|| missing_index("gradient", id.0))
        };
        for node in self.top_level() {
            replay_node(node, &mut builder, &map)?;
        }
        builder.finish()
    }

    /// Encode into the compact representation.
    pub fn to_compact(&self, opts: EncodeOpts) -> VgcResult<CompactImage> {
        self.replay(Encoder::new(opts))
    }
}

fn node_paint(n: &Node) -> Option<&PaintAttrs> {
    match n {
        Node::Path(l) => Some(&l.paint),
        Node::Rect(l) => Some(&l.paint),
        Node::Ellipse(l) => Some(&l.paint),
        Node::Poly(l) => Some(&l.paint),
        Node::Text(t) => Some(&t.paint),
        _ => None,
    }
}

fn replay_node<B: ImageBuilder>(
    node: &Node,
    b: &mut B,
    map: &impl Fn(GradientId) -> VgcResult<GradientId>,
) -> VgcResult<()> {
    let paint = |p: &PaintAttrs| p.remap_gradients(map);
    match node {
        Node::Group(g) => {
            b.begin_group(&GroupAttrs {
                transform: g.transform.as_deref().copied(),
                alpha: g.alpha,
                export_id: g.export_id,
            })?;
            for c in g.children.iter() {
                replay_node(c, b, map)?;
            }
            b.end_group()
        }
        Node::Clip(c) => b.clip_path(&ClipPath {
            path: (*c.path).clone(),
            rule: c.rule,
            transform: c.transform.as_deref().copied(),
        }),
        Node::Masked(m) => {
            b.begin_mask()?;
            for c in m.mask.iter() {
                replay_node(c, b, map)?;
            }
            b.mask_content()?;
            for c in m.content.iter() {
                replay_node(c, b, map)?;
            }
            b.end_mask()
        }
        Node::Path(l) => b.path(&Shape {
            geometry: (*l.geometry).clone(),
            paint: paint(&l.paint)?,
            transform: l.transform.as_deref().copied(),
        }),
        Node::Rect(l) => b.rect(&Shape {
            geometry: l.geometry,
            paint: paint(&l.paint)?,
            transform: l.transform.as_deref().copied(),
        }),
        Node::Ellipse(l) => b.ellipse(&Shape {
            geometry: l.geometry,
            paint: paint(&l.paint)?,
            transform: l.transform.as_deref().copied(),
        }),
        Node::Poly(l) => b.poly(&Shape {
            geometry: (*l.geometry).clone(),
            paint: paint(&l.paint)?,
            transform: l.transform.as_deref().copied(),
        }),
        Node::Image(i) => b.image(i),
        Node::Text(t) => b.text(&TextLeaf {
            paint: paint(&t.paint)?,
            ..*t
        }),
        Node::Use(u) => b.use_ref(&UseRef {
            target: u.target_id,
            transform: u.transform.as_deref().copied(),
        }),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/image.rs"]
mod tests;
