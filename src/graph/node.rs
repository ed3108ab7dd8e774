use std::sync::Arc;

use crate::foundation::core::Affine;
use crate::foundation::hash::{KeyWriter, StructuralKey};
use crate::model::ids::StringId;
use crate::model::paint::{FillRule, PaintAttrs};
use crate::model::path::PathData;
use crate::model::shape::{EllipseGeom, ImageLeaf, PolyGeom, RectGeom, TextLeaf};

/// Group node.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupNode {
    /// Group transform.
    pub transform: Option<Arc<Affine>>,
    /// Opacity, 255 is opaque.
    pub alpha: u8,
    /// Export id for use references.
    pub export_id: Option<StringId>,
    /// Children in paint order.
    pub children: Arc<[Arc<Node>]>,
}

/// Clip applied to the following siblings.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipNode {
    /// Clip geometry.
    pub path: Arc<PathData>,
    /// Winding rule.
    pub rule: FillRule,
    /// Local transform.
    pub transform: Option<Arc<Affine>>,
}

/// Masked content.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskedNode {
    /// Nodes drawing the mask.
    pub mask: Arc<[Arc<Node>]>,
    /// Nodes drawn through the mask.
    pub content: Arc<[Arc<Node>]>,
}

/// Shape leaf.
#[derive(Clone, Debug, PartialEq)]
pub struct LeafNode<G> {
    /// Geometry.
    pub geometry: G,
    /// Fill and stroke.
    pub paint: Arc<PaintAttrs>,
    /// Local transform.
    pub transform: Option<Arc<Affine>>,
}

/// Reference to an exported group.
#[derive(Clone, Debug, PartialEq)]
pub struct UseNode {
    /// Export id of the target.
    pub target_id: StringId,
    /// The target group node itself.
    pub target: Arc<Node>,
    /// Transform applied on top of the target's own.
    pub transform: Option<Arc<Affine>>,
}

/// One immutable node of a graph image. Equal subtrees may be one shared instance.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Node {
    Group(GroupNode),
    Clip(ClipNode),
    Masked(MaskedNode),
    Path(LeafNode<Arc<PathData>>),
    Rect(LeafNode<RectGeom>),
    Ellipse(LeafNode<EllipseGeom>),
    Poly(LeafNode<Arc<PolyGeom>>),
    Image(ImageLeaf),
    Text(TextLeaf),
    Use(UseNode),
}

impl Node {
    /// Children of a group, or `None` for every other node.
    pub fn children(&self) -> Option<&[Arc<Node>]> {
        match self {
            Self::Group(g) => Some(&g.children),
            _ => None,
        }
    }

    /// Return `true` for nodes that draw something themselves or through a reference.
    pub fn is_drawable(&self) -> bool {
        !matches!(self, Self::Clip(_))
    }

    /// Visit this node and all descendants (use targets are not entered).
    pub fn for_each(&self, f: &mut impl FnMut(&Node)) {
        f(self);
        match self {
            Self::Group(g) => g.children.iter().for_each(|c| c.for_each(f)),
            Self::Masked(m) => m.mask.iter().chain(m.content.iter()).for_each(|c| c.for_each(f)),
            _ => {}
        }
    }
}

// Sub-values are interned before a node is built, so pointer identity stands in for
// structural equality of geometry, paint, transforms, and children.
fn write_ptr<T: ?Sized>(w: &mut KeyWriter, v: &Arc<T>) {
    w.write_u64(Arc::as_ptr(v).cast::<()>() as usize as u64);
}

fn write_opt_ptr<T: ?Sized>(w: &mut KeyWriter, v: &Option<Arc<T>>) {
    match v {
        Some(v) => {
            w.write_u8(1);
            write_ptr(w, v);
        }
        None => w.write_u8(0),
    }
}

fn write_children(w: &mut KeyWriter, children: &[Arc<Node>]) {
    w.write_len(children.len());
    for c in children {
        write_ptr(w, c);
    }
}

impl StructuralKey for Node {
    fn write_key(&self, w: &mut KeyWriter) {
        match self {
            Self::Group(g) => {
                w.write_u8(0);
                write_opt_ptr(w, &g.transform);
                w.write_u8(g.alpha);
                g.export_id.map(|e| e.0 as u64).write_key(w);
                write_children(w, &g.children);
            }
            Self::Clip(c) => {
                w.write_u8(1);
                write_ptr(w, &c.path);
                w.write_u8(c.rule.code());
                write_opt_ptr(w, &c.transform);
            }
            Self::Masked(m) => {
                w.write_u8(2);
                write_children(w, &m.mask);
                write_children(w, &m.content);
            }
            Self::Path(l) => {
                w.write_u8(3);
                write_ptr(w, &l.geometry);
                write_ptr(w, &l.paint);
                write_opt_ptr(w, &l.transform);
            }
            Self::Rect(l) => {
                w.write_u8(4);
                l.geometry.write_key(w);
                write_ptr(w, &l.paint);
                write_opt_ptr(w, &l.transform);
            }
            Self::Ellipse(l) => {
                w.write_u8(5);
                l.geometry.write_key(w);
                write_ptr(w, &l.paint);
                write_opt_ptr(w, &l.transform);
            }
            Self::Poly(l) => {
                w.write_u8(6);
                write_ptr(w, &l.geometry);
                write_ptr(w, &l.paint);
                write_opt_ptr(w, &l.transform);
            }
            Self::Image(i) => {
                w.write_u8(7);
                w.write_u32(i.image.0);
                w.write_f64s(&[i.dest.x0, i.dest.y0, i.dest.x1, i.dest.y1]);
                i.transform.write_key(w);
            }
            Self::Text(t) => {
                w.write_u8(8);
                w.write_u32(t.text.0);
                t.font_family.map(|f| f.0 as u64).write_key(w);
                w.write_f64s(&[t.font_size, t.origin.x, t.origin.y]);
                w.write_u8(t.anchor.code());
                t.paint.write_key(w);
                t.transform.write_key(w);
            }
            Self::Use(u) => {
                w.write_u8(9);
                w.write_u32(u.target_id.0);
                write_ptr(w, &u.target);
                write_opt_ptr(w, &u.transform);
            }
        }
    }
}
