use super::*;
use crate::model::path::{PathData, PathSink};

fn triangle(tip_y: f64) -> PathData {
    let mut p = PathData::new();
    PathSink::<f64>::move_to(&mut p, 0.0, 0.0);
    PathSink::<f64>::line_to(&mut p, 10.0, 0.0);
    PathSink::<f64>::line_to(&mut p, 5.0, tip_y);
    PathSink::<f64>::close(&mut p);
    p
}

#[test]
fn equal_values_share_one_index() {
    let mut table = CanonicalTable::<PathData>::new();
    let mut scratch = KeyScratch::default();
    let a = triangle(8.0);
    let b = triangle(8.0);

    let ia = table.intern_with(&a, &mut scratch, || Arc::new(a.clone())).unwrap();
    let ib = table.intern_with(&b, &mut scratch, || Arc::new(b.clone())).unwrap();
    assert_eq!(ia, ib);
    assert_eq!(table.len(), 1);
}

#[test]
fn one_differing_control_point_yields_two_entries() {
    let mut table = CanonicalTable::<PathData>::new();
    let mut scratch = KeyScratch::default();
    let a = triangle(8.0);
    let b = triangle(8.5);

    let ia = table.intern_with(&a, &mut scratch, || Arc::new(a.clone())).unwrap();
    let ib = table.intern_with(&b, &mut scratch, || Arc::new(b.clone())).unwrap();
    assert_eq!((ia, ib), (0, 1));
    assert_eq!(table.get(1).map(|p| p.coords()[5]), Some(8.5));
}

#[test]
fn colliding_hashes_are_told_apart_by_key_bytes() {
    let mut table = CanonicalTable::<str>::new();
    let mut scratch = KeyScratch::default();
    let hash = scratch.hash_of("right");

    // File "left" under the hash of "right" to force a shared bucket.
    let left = table.push(hash, Arc::from("left")).unwrap();
    let right = table
        .intern_with("right", &mut scratch, || Arc::from("right"))
        .unwrap();
    assert_eq!((left, right), (0, 1));
    assert_eq!(table.buckets[&hash].len(), 2);
    assert_eq!(table.find("right", &mut scratch).hit, Some(1));
}

#[test]
fn indices_are_monotonic_and_loaded_entries_keep_position() {
    let mut table = CanonicalTable::<[f64]>::new();
    let mut scratch = KeyScratch::default();
    for (i, v) in [[1.0, 2.0], [3.0, 4.0], [1.0, 2.0]].iter().enumerate() {
        let idx = table.push_loaded(Arc::from(&v[..]), &mut scratch).unwrap();
        assert_eq!(idx as usize, i);
    }
    // A persisted table may contain duplicates; interning resolves to the first.
    let v: &[f64] = &[1.0, 2.0];
    assert_eq!(table.find(v, &mut scratch).hit, Some(0));
    assert_eq!(table.entries().len(), 3);
}

#[test]
fn signed_zero_is_a_distinct_value() {
    let mut table = CanonicalTable::<[f64]>::new();
    let mut scratch = KeyScratch::default();
    let pos: &[f64] = &[0.0];
    let neg: &[f64] = &[-0.0];
    let a = table.intern_with(pos, &mut scratch, || Arc::from(pos)).unwrap();
    let b = table.intern_with(neg, &mut scratch, || Arc::from(neg)).unwrap();
    assert_ne!(a, b);
}
