use super::*;
use crate::builder::call::{BuilderCall, Recorder};
use crate::compact::encode::{EncodeOpts, Encoder};
use crate::foundation::core::{Affine, Rect};
use crate::model::paint::{Color, PaintAttrs};
use crate::model::primitive::DrawPrimitive;
use crate::model::shape::{GroupAttrs, RectGeom, UseRef};

fn unit_rect() -> Shape<RectGeom> {
    Shape::new(
        RectGeom {
            rect: Rect::new(0.0, 0.0, 1.0, 1.0),
            rx: 0.0,
            ry: 0.0,
        },
        PaintAttrs::fill(Color::rgb(0, 128, 0)),
    )
}

fn with_use() -> CompactImage {
    let mut tables = InitTables::new();
    let id = tables.push_string("tile").unwrap();
    let mut e = Encoder::new(EncodeOpts::default());
    e.init(&tables).unwrap();
    e.document(&DocumentAttrs::sized(10.0, 10.0)).unwrap();
    e.begin_group(&GroupAttrs {
        export_id: Some(id),
        alpha: 128,
        ..GroupAttrs::default()
    })
    .unwrap();
    e.rect(&unit_rect()).unwrap();
    e.end_group().unwrap();
    e.use_ref(&UseRef {
        target: id,
        transform: Some(Affine::translate((5.0, 0.0))),
    })
    .unwrap();
    e.finish().unwrap()
}

fn rect_transforms(prims: &[DrawPrimitive]) -> Vec<Affine> {
    prims
        .iter()
        .filter_map(|p| match p {
            DrawPrimitive::Rect { transform, .. } => Some(*transform),
            _ => None,
        })
        .collect()
}

#[test]
fn use_expands_the_exported_group_in_place() {
    let img = with_use();
    let mut prims = Vec::new();
    img.traverse(&mut prims).unwrap();
    assert_eq!(
        rect_transforms(&prims),
        vec![Affine::IDENTITY, Affine::translate((5.0, 0.0))]
    );
    let layers = prims
        .iter()
        .filter(|p| matches!(p, DrawPrimitive::PushLayer { alpha: 128 }))
        .count();
    assert_eq!(layers, 2);
}

#[test]
fn bytes_round_trip_preserves_traversal() {
    let img = with_use();
    let back = CompactImage::from_bytes(&img.to_bytes().unwrap()).unwrap();
    assert_eq!(back.header(), img.header());
    assert_eq!(back.document(), img.document());
    assert_eq!(back.table_counts(), img.table_counts());

    let (mut a, mut b) = (Vec::new(), Vec::new());
    img.traverse(&mut a).unwrap();
    back.traverse(&mut b).unwrap();
    assert_eq!(a, b);
}

#[test]
fn replay_reissues_an_equivalent_stream() {
    let calls = with_use().replay(Recorder::new()).unwrap();
    assert!(matches!(calls[0], BuilderCall::Init(_)));
    assert!(matches!(calls[1], BuilderCall::Document(_)));
    let uses = calls
        .iter()
        .filter(|c| matches!(c, BuilderCall::Use(_)))
        .count();
    assert_eq!(uses, 1);
    assert!(matches!(calls.last(), Some(BuilderCall::Use(_))));
}

#[test]
fn truncated_and_foreign_bytes_are_format_errors() {
    let bytes = with_use().to_bytes().unwrap();
    for cut in [0, 3, 10, bytes.len() / 2, bytes.len() - 1] {
        let err = CompactImage::from_bytes(&bytes[..cut]).unwrap_err();
        assert!(err.is_format(), "cut at {cut}: {err}");
    }

    let mut other_major = bytes.clone();
    other_major[4] = other_major[4].wrapping_add(1);
    assert!(CompactImage::from_bytes(&other_major).unwrap_err().is_format());
}

#[test]
fn trailing_sections_and_section_tails_are_skipped() {
    let mut bytes = with_use().to_bytes().unwrap();
    bytes.extend_from_slice(&3u32.to_le_bytes());
    bytes.extend_from_slice(&[1, 2, 3]);
    let img = CompactImage::from_bytes(&bytes).unwrap();
    assert_eq!(img.gradient_count(), 0);
}

#[test]
fn use_of_an_unknown_export_fails_at_load() {
    let img = with_use();
    // Drop the exported group's opcodes, keeping only the trailing Use.
    let ops = img.ops.clone();
    let use_at = ops
        .iter()
        .rposition(|&b| b == crate::compact::format::Opcode::Use as u8)
        .unwrap();
    let err = CompactImage::from_parts(
        img.header,
        img.doc,
        Arc::clone(&img.tables),
        ops[use_at..].into(),
    )
    .unwrap_err();
    assert!(err.is_structural());
}

#[test]
fn unbalanced_streams_fail_at_load() {
    let img = with_use();
    let ops: Arc<[u8]> = vec![crate::compact::format::Opcode::EndGroup as u8].into();
    let err =
        CompactImage::from_parts(img.header, img.doc, Arc::clone(&img.tables), ops).unwrap_err();
    assert!(err.is_format());
}

#[test]
fn to_graph_traverses_identically() {
    let img = with_use();
    let graph = img.to_graph(GraphBuildOpts::default()).unwrap();
    let (mut a, mut b) = (Vec::new(), Vec::new());
    img.traverse(&mut a).unwrap();
    graph.traverse(&mut b).unwrap();
    assert_eq!(a, b);
}
