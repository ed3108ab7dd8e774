use super::*;
use crate::builder::protocol::{ImageBuilder, InitTables};
use crate::graph::builder::GraphBuilder;
use crate::model::paint::{Color, FillRule, PaintAttrs};
use crate::model::path::PathData;
use crate::model::primitive::DrawPrimitive;
use crate::model::shape::{ClipPath, GroupAttrs, RectGeom, Shape, UseRef};

fn square(x: f64, y: f64) -> Shape<RectGeom> {
    Shape::new(
        RectGeom {
            rect: Rect::new(x, y, x + 10.0, y + 10.0),
            rx: 0.0,
            ry: 0.0,
        },
        PaintAttrs::fill(Color::rgb(0, 160, 0)),
    )
}

fn start(tables: &InitTables) -> GraphBuilder {
    let mut b = GraphBuilder::default();
    b.init(tables).unwrap();
    b.document(&DocumentAttrs::sized(100.0, 100.0)).unwrap();
    b
}

fn top(root: &Arc<Node>) -> Vec<Arc<Node>> {
    root.children().unwrap_or(&[]).to_vec()
}

fn rect_count(img: &GraphImage) -> usize {
    let mut prims = Vec::new();
    img.traverse(&mut prims).unwrap();
    prims
        .iter()
        .filter(|p| matches!(p, DrawPrimitive::Rect { .. }))
        .count()
}

/// Left square at the top level, right square inside a group.
fn two_squares() -> GraphImage {
    let mut b = start(&InitTables::new());
    b.rect(&square(0.0, 0.0)).unwrap();
    b.begin_group(&GroupAttrs::default()).unwrap();
    b.rect(&square(90.0, 0.0)).unwrap();
    b.end_group().unwrap();
    b.finish().unwrap()
}

#[test]
fn unchanged_trees_keep_their_root() {
    let img = two_squares();
    let root = prune_graph(&img, Rect::new(0.0, 0.0, 100.0, 100.0), 0.0).unwrap();
    assert!(Arc::ptr_eq(&root, img.root()));

    let moved = graph_with_viewport(&img, Rect::new(0.0, 0.0, 5.0, 5.0), PruneOpts::default())
        .unwrap();
    assert!(Arc::ptr_eq(moved.root(), img.root()));
    assert_eq!(moved.document().view_box, Some(Rect::new(0.0, 0.0, 5.0, 5.0)));
    assert_eq!(moved.document().width, Some(5.0));
}

#[test]
fn subtrees_outside_the_viewport_are_dropped() {
    let img = two_squares();
    let root = prune_graph(&img, Rect::new(0.0, 0.0, 50.0, 100.0), 0.0).unwrap();
    let kept = top(&root);
    assert_eq!(kept.len(), 1);
    assert!(Arc::ptr_eq(&kept[0], &top(img.root())[0]));
}

#[test]
fn tolerance_widens_the_test_area() {
    let img = two_squares();
    let near = Rect::new(0.0, 0.0, 85.0, 100.0);
    assert_eq!(top(&prune_graph(&img, near, 0.0).unwrap()).len(), 1);
    assert!(Arc::ptr_eq(
        &prune_graph(&img, near, 5.0).unwrap(),
        img.root()
    ));
}

#[test]
fn clips_survive_only_with_a_drawable_sibling() {
    let clip = PathData::from_svg_d("M0,0 L200,0 L200,200 Z").unwrap();
    let mut b = start(&InitTables::new());
    for x in [0.0, 90.0] {
        b.begin_group(&GroupAttrs::default()).unwrap();
        b.clip_path(&ClipPath {
            path: clip.clone(),
            rule: FillRule::NonZero,
            transform: None,
        })
        .unwrap();
        b.rect(&square(x, 0.0)).unwrap();
        b.end_group().unwrap();
    }
    let img = b.finish().unwrap();
    let root = prune_graph(&img, Rect::new(0.0, 0.0, 20.0, 20.0), 0.0).unwrap();
    let kept = top(&root);
    assert_eq!(kept.len(), 1);
    let children = kept[0].children().unwrap();
    assert!(matches!(&*children[0], Node::Clip(_)));
    assert!(matches!(&*children[1], Node::Rect(_)));
}

/// Exported group `far` at (90,90) drawn in place and once more through a use at the origin.
fn used_far_square() -> GraphImage {
    let mut tables = InitTables::new();
    let id = tables.push_string("far").unwrap();
    let mut b = start(&tables);
    b.begin_group(&GroupAttrs {
        export_id: Some(id),
        ..GroupAttrs::default()
    })
    .unwrap();
    b.rect(&square(90.0, 90.0)).unwrap();
    b.end_group().unwrap();
    b.use_ref(&UseRef {
        target: id,
        transform: Some(Affine::translate((-90.0, -90.0))),
    })
    .unwrap();
    b.finish().unwrap()
}

#[test]
fn surviving_uses_keep_their_target_whole() {
    let img = used_far_square();
    let root = prune_graph(&img, Rect::new(0.0, 0.0, 20.0, 20.0), 0.0).unwrap();
    assert!(Arc::ptr_eq(&root, img.root()));
}

#[test]
fn targets_of_dropped_uses_are_pruned() {
    let img = used_far_square();
    let root = prune_graph(&img, Rect::new(50.0, 0.0, 60.0, 10.0), 0.0).unwrap();
    assert!(top(&root).is_empty());
}

#[test]
fn uses_inside_live_targets_keep_their_own_targets() {
    let mut tables = InitTables::new();
    let inner = tables.push_string("inner").unwrap();
    let outer = tables.push_string("outer").unwrap();
    let mut b = start(&tables);
    b.begin_group(&GroupAttrs {
        export_id: Some(inner),
        ..GroupAttrs::default()
    })
    .unwrap();
    b.rect(&square(80.0, 80.0)).unwrap();
    b.end_group().unwrap();
    b.begin_group(&GroupAttrs {
        export_id: Some(outer),
        ..GroupAttrs::default()
    })
    .unwrap();
    b.rect(&square(80.0, 0.0)).unwrap();
    b.use_ref(&UseRef {
        target: inner,
        transform: Some(Affine::translate((0.0, -80.0))),
    })
    .unwrap();
    b.end_group().unwrap();
    b.use_ref(&UseRef {
        target: outer,
        transform: Some(Affine::translate((-80.0, 0.0))),
    })
    .unwrap();
    let img = b.finish().unwrap();

    // Only the outer use lands in the viewport; it draws the inner use, which draws `inner`.
    let root = prune_graph(&img, Rect::new(0.0, 0.0, 20.0, 20.0), 0.0).unwrap();
    let kept = top(&root);
    let exports: Vec<_> = kept
        .iter()
        .filter_map(|n| match &**n {
            Node::Group(g) => g.export_id,
            _ => None,
        })
        .collect();
    assert_eq!(exports, vec![inner, outer]);
    assert!(matches!(&*kept[2], Node::Use(u) if u.target_id == outer));

    let root = prune_graph(&img, Rect::new(40.0, 40.0, 50.0, 50.0), 0.0).unwrap();
    assert!(top(&root).is_empty());
}

#[test]
fn masks_keep_the_whole_mask() {
    let mut b = start(&InitTables::new());
    b.begin_mask().unwrap();
    b.rect(&square(50.0, 50.0)).unwrap();
    b.mask_content().unwrap();
    b.rect(&square(0.0, 0.0)).unwrap();
    b.rect(&square(90.0, 90.0)).unwrap();
    b.end_mask().unwrap();
    let img = b.finish().unwrap();

    let root = prune_graph(&img, Rect::new(0.0, 0.0, 20.0, 20.0), 0.0).unwrap();
    let kept = top(&root);
    let Node::Masked(m) = &*kept[0] else {
        panic!("expected the masked node to survive");
    };
    let Node::Masked(orig) = &*top(img.root())[0] else {
        unreachable!()
    };
    assert!(Arc::ptr_eq(&m.mask, &orig.mask));
    assert_eq!(m.content.len(), 1);

    let root = prune_graph(&img, Rect::new(40.0, 40.0, 60.0, 60.0), 0.0).unwrap();
    assert!(top(&root).is_empty());
}

#[test]
fn pruned_traversal_is_a_subset() {
    let img = two_squares();
    let opts = PruneOpts {
        prune: true,
        tolerance: 0.0,
    };
    let pruned = graph_with_viewport(&img, Rect::new(0.0, 0.0, 50.0, 100.0), opts).unwrap();
    assert_eq!((rect_count(&img), rect_count(&pruned)), (2, 1));
}

#[test]
fn compact_viewport_reuses_source_tables() {
    let compact = two_squares()
        .to_compact(EncodeOpts::default())
        .unwrap();
    let area = Rect::new(0.0, 0.0, 50.0, 100.0);

    let moved = compact_with_viewport(&compact, area, PruneOpts::default()).unwrap();
    assert!(moved.shares_tables_with(&compact));
    assert_eq!(moved.document().view_box, Some(area));

    let opts = PruneOpts {
        prune: true,
        tolerance: 0.0,
    };
    let pruned = compact_with_viewport(&compact, area, opts).unwrap();
    assert!(pruned.shares_tables_with(&compact));
    let mut prims = Vec::new();
    pruned.traverse(&mut prims).unwrap();
    let rects = prims
        .iter()
        .filter(|p| matches!(p, DrawPrimitive::Rect { .. }))
        .count();
    assert_eq!(rects, 1);
    assert_eq!(pruned.header().float_width, compact.header().float_width);
}
