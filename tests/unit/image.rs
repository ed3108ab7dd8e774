use super::*;
use crate::builder::protocol::{ImageBuilder, InitTables};
use crate::compact::encode::Encoder;
use crate::model::paint::{Color, PaintAttrs};
use crate::model::shape::{EllipseGeom, RectGeom, Shape};
use crate::foundation::core::Point;

fn encoded(doc: DocumentAttrs) -> Vec<u8> {
    let mut e = Encoder::new(EncodeOpts {
        float_width: FloatWidth::F64,
    });
    e.init(&InitTables::new()).unwrap();
    e.document(&doc).unwrap();
    e.rect(&Shape::new(
        RectGeom {
            rect: Rect::new(0.0, 0.0, 40.0, 40.0),
            rx: 0.0,
            ry: 0.0,
        },
        PaintAttrs::fill(Color::rgb(200, 0, 0)),
    ))
    .unwrap();
    e.ellipse(&Shape::new(
        EllipseGeom::circle(Point::new(80.0, 20.0), 10.0),
        PaintAttrs::fill(Color::rgb(0, 0, 200)),
    ))
    .unwrap();
    e.finish().unwrap().to_bytes().unwrap()
}

#[test]
fn both_representations_traverse_identically() {
    let bytes = encoded(DocumentAttrs::sized(100.0, 50.0));
    let compact = ScalableImage::from_bytes(&bytes, Representation::Compact).unwrap();
    let graph = ScalableImage::from_bytes(&bytes, Representation::Graph).unwrap();
    assert_eq!(compact.representation(), Representation::Compact);
    assert_eq!(graph.representation(), Representation::Graph);
    assert_eq!(compact.primitives().unwrap(), graph.primitives().unwrap());
    assert_eq!(compact.document(), graph.document());
}

#[test]
fn bounds_cover_all_leaves() {
    let img = ScalableImage::from_bytes(
        &encoded(DocumentAttrs::default()),
        Representation::Graph,
    )
    .unwrap();
    assert_eq!(img.bounds().unwrap(), Some(Rect::new(0.0, 0.0, 90.0, 40.0)));
    assert_eq!(
        img.viewport().unwrap(),
        Viewport::new(Rect::new(0.0, 0.0, 90.0, 40.0))
    );
}

#[test]
fn declared_size_wins_over_tree_bounds() {
    let img = ScalableImage::from_bytes(
        &encoded(DocumentAttrs::sized(100.0, 50.0)),
        Representation::Compact,
    )
    .unwrap();
    assert_eq!(
        img.viewport().unwrap().rect,
        Rect::new(0.0, 0.0, 100.0, 50.0)
    );
}

#[test]
fn new_viewport_keeps_the_representation() {
    let bytes = encoded(DocumentAttrs::sized(100.0, 50.0));
    let left = Rect::new(0.0, 0.0, 50.0, 50.0);
    for repr in [Representation::Compact, Representation::Graph] {
        let img = ScalableImage::from_bytes(&bytes, repr).unwrap();

        let moved = img.with_new_viewport(left, false, 0.0).unwrap();
        assert_eq!(moved.representation(), repr);
        assert_eq!(moved.viewport().unwrap().rect, left);
        assert_eq!(moved.primitives().unwrap().len(), 2);

        let pruned = img.with_new_viewport(left, true, 0.0).unwrap();
        assert_eq!(pruned.primitives().unwrap().len(), 1);
        let wide = img.with_new_viewport(left, true, 30.0).unwrap();
        assert_eq!(wide.primitives().unwrap().len(), 2);
    }
}

#[test]
fn conversions_round_trip_through_bytes() {
    let bytes = encoded(DocumentAttrs::sized(100.0, 50.0));
    let graph = ScalableImage::from_bytes(&bytes, Representation::Graph).unwrap();
    let again = ScalableImage::from_bytes(&graph.to_bytes().unwrap(), Representation::Compact)
        .unwrap();
    assert_eq!(graph.primitives().unwrap(), again.primitives().unwrap());

    let compact = graph.to_compact(EncodeOpts::default()).unwrap();
    assert_eq!(compact.header().float_width, FloatWidth::F32);
    let as_graph = ScalableImage::from(compact).to_graph(GraphBuildOpts::default());
    assert!(as_graph.is_ok());
}

#[test]
fn representation_names_are_lowercase() {
    assert_eq!(
        serde_json::to_string(&Representation::Graph).unwrap(),
        "\"graph\""
    );
    let r: Representation = serde_json::from_str("\"compact\"").unwrap();
    assert_eq!(r, Representation::Compact);
}
