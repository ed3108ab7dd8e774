use super::*;

#[test]
fn svg_d_parses_into_verbs_and_coords() {
    let p = PathData::from_svg_d("M0,0 L10,0 L10,10 Z").unwrap();
    assert_eq!(
        p.verbs(),
        &[
            PathVerb::MoveTo,
            PathVerb::LineTo,
            PathVerb::LineTo,
            PathVerb::Close
        ]
    );
    assert_eq!(p.coords(), &[0.0, 0.0, 10.0, 0.0, 10.0, 10.0]);
}

#[test]
fn invalid_svg_d_is_a_parse_error() {
    let err = PathData::from_svg_d("M0,0 X5,5").unwrap_err();
    assert!(matches!(err, VgcError::Parse(_)));
}

#[test]
fn from_parts_rejects_mismatched_coordinates() {
    assert!(PathData::from_parts(vec![PathVerb::LineTo], vec![1.0]).is_err());
    assert!(PathData::from_parts(vec![PathVerb::LineTo], vec![1.0, 2.0]).is_ok());
}

#[test]
fn generic_shape_helpers_agree_across_scalar_types() {
    let mut wide = PathData::new();
    PathSink::<f64>::rect(&mut wide, 1.0, 2.0, 3.0, 4.0);
    let mut narrow = PathData::new();
    PathSink::<f32>::rect(&mut narrow, 1.0, 2.0, 3.0, 4.0);
    assert_eq!(wide, narrow);

    let mut bez = BezPath::new();
    PathSink::<f64>::ellipse(&mut bez, 25.0, 25.0, 20.0, 20.0);
    let mut data = PathData::new();
    PathSink::<f64>::ellipse(&mut data, 25.0, 25.0, 20.0, 20.0);
    assert_eq!(PathData::from_bez_path(&bez), data);
}

#[test]
fn control_bounds_cover_all_points() {
    let mut p = PathData::new();
    PathSink::<f64>::move_to(&mut p, 0.0, 0.0);
    PathSink::<f64>::quad_to(&mut p, 50.0, -20.0, 10.0, 10.0);
    assert_eq!(p.control_bounds(), Some(Rect::new(0.0, -20.0, 50.0, 10.0)));
    assert_eq!(PathData::new().control_bounds(), None);
}

#[test]
fn close_is_callable_without_naming_the_scalar() {
    let mut p = PathData::new();
    p.move_to(0.0_f64, 0.0);
    p.line_to(4.0_f64, 0.0);
    p.close();
    assert_eq!(p.verbs().last(), Some(&PathVerb::Close));

    let mut narrow = PathData::new();
    PathSink::<f32>::polyline(&mut narrow, &[(0.0, 0.0), (4.0, 0.0)], true);
    assert_eq!(narrow, p);
}
