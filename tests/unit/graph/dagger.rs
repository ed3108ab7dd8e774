use super::*;
use crate::foundation::core::Rect;
use crate::graph::node::LeafNode;
use crate::model::paint::Color;
use crate::model::path::PathSink;
use crate::model::shape::RectGeom;

fn tri(x: f64) -> PathData {
    let mut p = PathData::new();
    p.move_to(x, 0.0);
    p.line_to(x + 1.0, 0.0);
    p.line_to(x, 1.0);
    p.close();
    p
}

fn rect_node(d: &mut Daggers, color: Color) -> Node {
    Node::Rect(LeafNode {
        geometry: RectGeom {
            rect: Rect::new(0.0, 0.0, 2.0, 2.0),
            rx: 0.0,
            ry: 0.0,
        },
        paint: d.paint(&PaintAttrs::fill(color)),
        transform: d.transform(Some(Affine::scale(2.0))),
    })
}

#[test]
fn equal_values_share_one_instance() {
    let mut d = Daggers::seeded(&NodeCache::default());
    let a = d.path(&tri(0.0));
    let b = d.path(&tri(0.0));
    let c = d.path(&tri(5.0));
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));

    let s1: Arc<str> = Arc::from("label");
    let s2: Arc<str> = Arc::from("label");
    assert!(Arc::ptr_eq(&d.string(&s1), &d.string(&s2)));

    assert!(d.transform(None).is_none());
}

#[test]
fn nodes_over_shared_parts_are_hash_consed() {
    let mut d = Daggers::seeded(&NodeCache::default());
    let a = rect_node(&mut d, Color::BLACK);
    let b = rect_node(&mut d, Color::BLACK);
    let c = rect_node(&mut d, Color::rgb(255, 0, 0));
    let (a, b, c) = (d.node(a), d.node(b), d.node(c));
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));

    let cache = d.freeze();
    assert_eq!(cache.node_count(), 2);
    assert_eq!(cache.transform_count(), 1);
}

#[test]
fn seed_hits_return_the_previous_instance() {
    let mut first = Daggers::seeded(&NodeCache::default());
    let p = first.path(&tri(0.0));
    let n = rect_node(&mut first, Color::BLACK);
    let n = first.node(n);
    let seed = first.freeze();

    let mut second = Daggers::seeded(&seed);
    assert!(Arc::ptr_eq(&p, &second.path(&tri(0.0))));
    let again = rect_node(&mut second, Color::BLACK);
    assert!(Arc::ptr_eq(&n, &second.node(again)));
}

#[test]
fn snapshot_holds_only_values_touched_by_the_latest_build() {
    let mut first = Daggers::seeded(&NodeCache::default());
    first.path(&tri(0.0));
    first.path(&tri(1.0));
    let seed = first.freeze();
    assert_eq!(seed.path_count(), 2);

    let mut second = Daggers::seeded(&seed);
    second.path(&tri(1.0));
    second.path(&tri(2.0));
    let next = second.freeze();
    assert_eq!(next.path_count(), 2);
    assert!(!next.is_empty());
    assert!(NodeCache::default().is_empty());
}
