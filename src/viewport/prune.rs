use std::collections::HashSet;
use std::sync::Arc;

use crate::compact::encode::{EncodeOpts, Encoder};
use crate::compact::image::CompactImage;
use crate::foundation::core::{Affine, Rect, rects_overlap};
use crate::foundation::error::VgcResult;
use crate::graph::builder::GraphBuildOpts;
use crate::graph::image::GraphImage;
use crate::graph::node::{GroupNode, MaskedNode, Node};
use crate::model::ids::StringId;
use crate::model::primitive::Resolver;
use crate::model::shape::DocumentAttrs;
use crate::viewport::bounds::{
    ellipse_bounds, painted_bounds, poly_bounds, rect_bounds, text_bounds, union,
};

/// Options for the viewport transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PruneOpts {
    /// Drop subtrees that cannot intersect the new viewport.
    pub prune: bool,
    /// Margin added around the viewport before testing intersection.
    pub tolerance: f64,
}

/// Document attributes declaring `rect` as both view box and output size.
pub(crate) fn viewport_document(doc: &DocumentAttrs, rect: Rect) -> DocumentAttrs {
    DocumentAttrs {
        width: Some(rect.width()),
        height: Some(rect.height()),
        view_box: Some(rect),
        tint: doc.tint,
    }
}

enum Pruned {
    Keep,
    Drop,
    Replace(Arc<Node>),
}

struct Pruner<'a> {
    image: &'a GraphImage,
    area: Rect,
    pinned: HashSet<StringId>,
}

impl Pruner<'_> {
    fn node(&self, node: &Arc<Node>, ctm: Affine) -> VgcResult<Pruned> {
        let keep = match &**node {
            Node::Group(g) => {
                if g.export_id.is_some_and(|id| self.pinned.contains(&id)) {
                    return Ok(Pruned::Keep);
                }
                let ctm = apply(ctm, g.transform.as_deref());
                let Some((children, changed)) = self.list(&g.children, ctm)? else {
                    return Ok(Pruned::Drop);
                };
                if !changed {
                    return Ok(Pruned::Keep);
                }
                return Ok(Pruned::Replace(Arc::new(Node::Group(GroupNode {
                    children,
                    ..g.clone()
                }))));
            }
            Node::Masked(m) => {
                let Some((content, changed)) = self.list(&m.content, ctm)? else {
                    return Ok(Pruned::Drop);
                };
                if !changed {
                    return Ok(Pruned::Keep);
                }
                return Ok(Pruned::Replace(Arc::new(Node::Masked(MaskedNode {
                    mask: Arc::clone(&m.mask),
                    content,
                }))));
            }
            Node::Clip(_) => true,
            _ => node_bounds(self.image, node, ctm)?.is_some_and(|b| rects_overlap(b, self.area)),
        };
        Ok(if keep { Pruned::Keep } else { Pruned::Drop })
    }

    /// Prune a child list. `None` when no drawable child survives; otherwise the surviving
    /// list (the original `Arc` when nothing changed) and whether anything changed.
    fn list(
        &self,
        children: &Arc<[Arc<Node>]>,
        ctm: Affine,
    ) -> VgcResult<Option<(Arc<[Arc<Node>]>, bool)>> {
        let mut out = Vec::with_capacity(children.len());
        let mut changed = false;
        let mut drawable = false;
        for c in children.iter() {
            match self.node(c, ctm)? {
                Pruned::Keep => {
                    drawable |= c.is_drawable();
                    out.push(Arc::clone(c));
                }
                Pruned::Drop => changed = true,
                Pruned::Replace(n) => {
                    drawable = true;
                    changed = true;
                    out.push(n);
                }
            }
        }
        if !drawable {
            return Ok(None);
        }
        let list = if changed {
            out.into()
        } else {
            Arc::clone(children)
        };
        Ok(Some((list, changed)))
    }
}

fn apply(ctm: Affine, t: Option<&Affine>) -> Affine {
    t.map_or(ctm, |t| ctm * *t)
}

/// Absolute bounds of a subtree under `ctm`; clips are ignored, which only enlarges the result.
pub(crate) fn node_bounds(image: &GraphImage, node: &Node, ctm: Affine) -> VgcResult<Option<Rect>> {
    let children_bounds = |list: &[Arc<Node>], ctm: Affine| -> VgcResult<Option<Rect>> {
        let mut acc = None;
        for c in list {
            if let Some(b) = node_bounds(image, c, ctm)? {
                acc = Some(union(acc, b));
            }
        }
        Ok(acc)
    };
    Ok(match node {
        Node::Group(g) => children_bounds(&g.children[..], apply(ctm, g.transform.as_deref()))?,
        Node::Masked(m) => children_bounds(&m.content[..], ctm)?,
        Node::Clip(_) => None,
        Node::Path(l) => l.geometry.control_bounds().map(|r| {
            painted_bounds(r, l.paint.stroke_width(), apply(ctm, l.transform.as_deref()))
        }),
        Node::Rect(l) => Some(painted_bounds(
            rect_bounds(&l.geometry),
            l.paint.stroke_width(),
            apply(ctm, l.transform.as_deref()),
        )),
        Node::Ellipse(l) => Some(painted_bounds(
            ellipse_bounds(&l.geometry),
            l.paint.stroke_width(),
            apply(ctm, l.transform.as_deref()),
        )),
        Node::Poly(l) => poly_bounds(&l.geometry).map(|r| {
            painted_bounds(r, l.paint.stroke_width(), apply(ctm, l.transform.as_deref()))
        }),
        Node::Image(i) => {
            Some(apply(ctm, i.transform.as_ref()).transform_rect_bbox(i.dest.abs()))
        }
        Node::Text(t) => {
            let text = image.string(t.text)?;
            Some(painted_bounds(
                text_bounds(&text, t.font_size, t.origin, t.anchor),
                t.paint.stroke_width(),
                apply(ctm, t.transform.as_ref()),
            ))
        }
        Node::Use(u) => node_bounds(image, &u.target, apply(ctm, u.transform.as_deref()))?,
    })
}

/// Prune a graph image to `viewport` inflated by `tolerance`.
///
/// Returns the new root; it is the source root itself when nothing was dropped. An exported
/// group is kept whole while a surviving use node references it, clips survive with their
/// group, and a masked node keeps its mask whole while its content survives.
#[tracing::instrument(skip(image))]
pub fn prune_graph(image: &GraphImage, viewport: Rect, tolerance: f64) -> VgcResult<Arc<Node>> {
    let mut pruner = Pruner {
        image,
        area: viewport.abs().inflate(tolerance, tolerance),
        pinned: HashSet::new(),
    };
    // Pinning a target can revive uses nested inside it, so iterate until the live set is stable.
    loop {
        let root = pruner.root()?;
        let mut live = HashSet::new();
        root.for_each(&mut |n| {
            if let Node::Use(u) = n {
                live.insert(u.target_id);
            }
        });
        if live.is_subset(&pruner.pinned) {
            return Ok(root);
        }
        pruner.pinned.extend(live);
    }
}

impl Pruner<'_> {
    fn root(&self) -> VgcResult<Arc<Node>> {
        let root = self.image.root();
        let Node::Group(top) = &**root else {
            return Ok(Arc::clone(root));
        };
        Ok(match self.list(&top.children, Affine::IDENTITY)? {
            Some((_, false)) => Arc::clone(root),
            Some((kept, true)) => Arc::new(Node::Group(GroupNode {
                transform: None,
                alpha: 255,
                export_id: None,
                children: kept,
            })),
            None => Arc::new(Node::Group(GroupNode {
                transform: None,
                alpha: 255,
                export_id: None,
                children: Arc::from(Vec::new()),
            })),
        })
    }
}

/// Graph image for a new viewport; shares every node that survives.
pub(crate) fn graph_with_viewport(
    image: &GraphImage,
    rect: Rect,
    opts: PruneOpts,
) -> VgcResult<GraphImage> {
    let doc = viewport_document(image.document(), rect);
    let root = if opts.prune {
        prune_graph(image, rect, opts.tolerance)?
    } else {
        Arc::clone(image.root())
    };
    Ok(image.with_parts(doc, root))
}

/// Compact image for a new viewport.
///
/// Without pruning only the document changes. With pruning the surviving tree is re-encoded
/// into an encoder seeded with the source tables, so the tables stay shared and only gradients
/// still in use are registered.
pub(crate) fn compact_with_viewport(
    image: &CompactImage,
    rect: Rect,
    opts: PruneOpts,
) -> VgcResult<CompactImage> {
    let doc = viewport_document(image.document(), rect);
    if !opts.prune {
        return Ok(image.with_document(doc));
    }
    let graph = image.to_graph(GraphBuildOpts::default())?;
    let pruned = graph_with_viewport(&graph, rect, opts)?;
    let encoder = Encoder::seeded(
        EncodeOpts {
            float_width: image.header().float_width,
        },
        Arc::clone(image.tables()),
    );
    pruned.replay(encoder)
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/prune.rs"]
mod tests;
