use std::collections::HashMap;
use std::sync::Arc;

use crate::builder::check::NestingTracker;
use crate::builder::protocol::{ImageBuilder, InitTables};
use crate::canon::table::{CanonicalTable, KeyScratch};
use crate::foundation::error::{VgcError, VgcResult};
use crate::graph::dagger::{Daggers, NodeCache};
use crate::graph::image::GraphImage;
use crate::graph::node::{ClipNode, GroupNode, LeafNode, MaskedNode, Node, UseNode};
use crate::model::ids::{GradientId, StringId};
use crate::model::paint::Gradient;
use crate::model::path::PathData;
use crate::model::shape::{
    ClipPath, DocumentAttrs, EllipseGeom, GroupAttrs, ImageLeaf, PolyGeom, RectGeom, Shape,
    TextLeaf, UseRef,
};

/// Options for [`GraphBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GraphBuildOpts {
    /// Hash-cons leaf and group nodes so equal subtrees become one shared instance.
    /// Geometry, paint, transforms, and table values are always shared.
    pub share_leaves: bool,
}

impl Default for GraphBuildOpts {
    fn default() -> Self {
        Self { share_leaves: true }
    }
}

enum FrameKind {
    Root,
    Group(GroupAttrs),
    Mask,
    MaskContent(Arc<[Arc<Node>]>),
}

struct Frame {
    kind: FrameKind,
    children: Vec<Arc<Node>>,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }
}

/// [`ImageBuilder`] backend producing a shared-node [`GraphImage`].
pub struct GraphBuilder {
    opts: GraphBuildOpts,
    tracker: NestingTracker,
    daggers: Daggers,
    tables: InitTables,
    gradients: CanonicalTable<Gradient>,
    gradient_scratch: KeyScratch,
    doc: DocumentAttrs,
    stack: Vec<Frame>,
    exports: HashMap<StringId, Arc<Node>>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(GraphBuildOpts::default())
    }
}

impl GraphBuilder {
    /// Builder with empty identity maps.
    pub fn new(opts: GraphBuildOpts) -> Self {
        Self::with_seed(opts, &NodeCache::default())
    }

    /// Builder that reuses the values and nodes of a previous build.
    pub fn with_seed(opts: GraphBuildOpts, seed: &NodeCache) -> Self {
        Self {
            opts,
            tracker: NestingTracker::new(),
            daggers: Daggers::seeded(seed),
            tables: InitTables::default(),
            gradients: CanonicalTable::new(),
            gradient_scratch: KeyScratch::default(),
            doc: DocumentAttrs::default(),
            stack: vec![Frame::new(FrameKind::Root)],
            exports: HashMap::new(),
        }
    }

    fn add(&mut self, node: Node) -> VgcResult<Arc<Node>> {
        let node = if self.opts.share_leaves {
            self.daggers.node(node)
        } else {
            Arc::new(node)
        };
        let frame = self
            .stack
            .last_mut()
            .ok_or_else(|| VgcError::format("tree call after the root scope closed"))?;
        frame.children.push(Arc::clone(&node));
        Ok(node)
    }

    fn pop(&mut self) -> VgcResult<Frame> {
        if self.stack.len() <= 1 {
            return Err(VgcError::format("scope end without matching begin"));
        }
        self.stack
            .pop()
            .ok_or_else(|| VgcError::format("scope end without matching begin"))
    }

    fn leaf<G>(&mut self, geometry: G, shape: &Shape<impl Sized>) -> LeafNode<G> {
        LeafNode {
            geometry,
            paint: self.daggers.paint(&shape.paint),
            transform: self.daggers.transform(shape.transform),
        }
    }
}

impl ImageBuilder for GraphBuilder {
    type Output = GraphImage;

    fn init(&mut self, tables: &InitTables) -> VgcResult<()> {
        self.tracker.on_init(tables)?;
        self.tables = InitTables {
            images: tables.images.iter().map(|v| self.daggers.image(v)).collect(),
            strings: tables.strings.iter().map(|v| self.daggers.string(v)).collect(),
            float_lists: tables
                .float_lists
                .iter()
                .map(|v| self.daggers.float_list(v))
                .collect(),
        };
        Ok(())
    }

    fn document(&mut self, doc: &DocumentAttrs) -> VgcResult<()> {
        self.tracker.on_document()?;
        self.doc = *doc;
        Ok(())
    }

    fn gradient(&mut self, gradient: &Gradient) -> VgcResult<GradientId> {
        self.tracker.on_gradient(gradient)?;
        let id = self
            .gradients
            .intern_with(gradient, &mut self.gradient_scratch, || {
                Arc::new(gradient.clone())
            })?;
        Ok(GradientId(id))
    }

    fn begin_group(&mut self, attrs: &GroupAttrs) -> VgcResult<()> {
        self.tracker.on_begin_group(attrs.export_id)?;
        self.stack.push(Frame::new(FrameKind::Group(*attrs)));
        Ok(())
    }

    fn end_group(&mut self) -> VgcResult<()> {
        self.tracker.on_end_group()?;
        let frame = self.pop()?;
        let FrameKind::Group(attrs) = frame.kind else {
            return Err(VgcError::format("end_group does not close a group"));
        };
        let node = Node::Group(GroupNode {
            transform: self.daggers.transform(attrs.transform),
            alpha: attrs.alpha,
            export_id: attrs.export_id,
            children: frame.children.into(),
        });
        let node = self.add(node)?;
        if let Some(id) = attrs.export_id {
            self.exports.insert(id, node);
        }
        Ok(())
    }

    fn clip_path(&mut self, clip: &ClipPath) -> VgcResult<()> {
        self.tracker.on_clip()?;
        let node = Node::Clip(ClipNode {
            path: self.daggers.path(&clip.path),
            rule: clip.rule,
            transform: self.daggers.transform(clip.transform),
        });
        self.add(node).map(drop)
    }

    fn begin_mask(&mut self) -> VgcResult<()> {
        self.tracker.on_begin_mask()?;
        self.stack.push(Frame::new(FrameKind::Mask));
        Ok(())
    }

    fn mask_content(&mut self) -> VgcResult<()> {
        self.tracker.on_mask_content()?;
        let frame = self.pop()?;
        let FrameKind::Mask = frame.kind else {
            return Err(VgcError::format("mask_content without begin_mask"));
        };
        self.stack
            .push(Frame::new(FrameKind::MaskContent(frame.children.into())));
        Ok(())
    }

    fn end_mask(&mut self) -> VgcResult<()> {
        self.tracker.on_end_mask()?;
        let frame = self.pop()?;
        let FrameKind::MaskContent(mask) = frame.kind else {
            return Err(VgcError::format("end_mask without mask_content"));
        };
        self.add(Node::Masked(MaskedNode {
            mask,
            content: frame.children.into(),
        }))
        .map(drop)
    }

    fn path(&mut self, shape: &Shape<PathData>) -> VgcResult<()> {
        self.tracker
            .on_leaf("path", &shape.paint, self.gradients.len())?;
        let geometry = self.daggers.path(&shape.geometry);
        let leaf = self.leaf(geometry, shape);
        self.add(Node::Path(leaf)).map(drop)
    }

    fn rect(&mut self, shape: &Shape<RectGeom>) -> VgcResult<()> {
        self.tracker
            .on_leaf("rect", &shape.paint, self.gradients.len())?;
        let leaf = self.leaf(shape.geometry, shape);
        self.add(Node::Rect(leaf)).map(drop)
    }

    fn ellipse(&mut self, shape: &Shape<EllipseGeom>) -> VgcResult<()> {
        self.tracker
            .on_leaf("ellipse", &shape.paint, self.gradients.len())?;
        let leaf = self.leaf(shape.geometry, shape);
        self.add(Node::Ellipse(leaf)).map(drop)
    }

    fn poly(&mut self, shape: &Shape<PolyGeom>) -> VgcResult<()> {
        self.tracker
            .on_leaf("poly", &shape.paint, self.gradients.len())?;
        let geometry = self.daggers.poly(&shape.geometry);
        let leaf = self.leaf(geometry, shape);
        self.add(Node::Poly(leaf)).map(drop)
    }

    fn image(&mut self, leaf: &ImageLeaf) -> VgcResult<()> {
        self.tracker.on_image(leaf.image)?;
        self.add(Node::Image(*leaf)).map(drop)
    }

    fn text(&mut self, leaf: &TextLeaf) -> VgcResult<()> {
        self.tracker.on_text(
            leaf.text,
            leaf.font_family,
            &leaf.paint,
            self.gradients.len(),
        )?;
        self.add(Node::Text(*leaf)).map(drop)
    }

    fn use_ref(&mut self, use_ref: &UseRef) -> VgcResult<()> {
        self.tracker.on_use(use_ref.target)?;
        let target = self.exports.get(&use_ref.target).cloned().ok_or_else(|| {
            VgcError::structural(format!(
                "use of unresolved export id {}",
                use_ref.target.0
            ))
        })?;
        let node = Node::Use(UseNode {
            target_id: use_ref.target,
            target,
            transform: self.daggers.transform(use_ref.transform),
        });
        self.add(node).map(drop)
    }

    #[tracing::instrument(skip_all)]
    fn finish(mut self) -> VgcResult<GraphImage> {
        self.tracker.on_finish()?;
        let root = match self.stack.pop() {
            Some(Frame {
                kind: FrameKind::Root,
                children,
            }) if self.stack.is_empty() => children,
            _ => return Err(VgcError::format("unclosed scope at finish")),
        };
        let root = Arc::new(Node::Group(GroupNode {
            transform: None,
            alpha: 255,
            export_id: None,
            children: root.into(),
        }));
        let cache = self.daggers.freeze();
        tracing::debug!(
            nodes = cache.node_count(),
            paths = cache.path_count(),
            gradients = self.gradients.len(),
            "graph built"
        );
        Ok(GraphImage::new(
            self.doc,
            root,
            Arc::new(self.tables),
            self.gradients.entries().to_vec().into(),
            cache,
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/builder.rs"]
mod tests;
