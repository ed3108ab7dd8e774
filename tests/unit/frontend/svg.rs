use super::*;
use crate::builder::call::{BuilderCall, Recorder};

fn record(svg: &str) -> Vec<BuilderCall> {
    build_svg(svg.as_bytes(), Recorder::new()).unwrap()
}

fn paths(calls: &[BuilderCall]) -> Vec<&Shape<PathData>> {
    calls
        .iter()
        .filter_map(|c| match c {
            BuilderCall::Path(s) => Some(s),
            _ => None,
        })
        .collect()
}

#[test]
fn green_circle_becomes_one_filled_path() {
    let calls = record(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="30">
             <circle cx="20" cy="15" r="10" fill="green"/>
           </svg>"#,
    );
    let BuilderCall::Document(doc) = &calls[1] else {
        panic!("document must follow init");
    };
    assert_eq!((doc.width, doc.height), (Some(40.0), Some(30.0)));
    assert_eq!(doc.view_box, Some(Rect::new(0.0, 0.0, 40.0, 30.0)));

    let p = paths(&calls);
    assert_eq!(p.len(), 1);
    assert_eq!(
        p[0].paint.fill.map(|f| f.source),
        Some(PaintSource::Solid(Color::rgb(0, 128, 0)))
    );
    assert!(p[0].paint.stroke.is_none());
    let bounds = p[0].geometry.control_bounds().unwrap();
    assert!((bounds.x0 - 10.0).abs() < 1e-3 && (bounds.x1 - 30.0).abs() < 1e-3);
}

#[test]
fn shared_gradient_is_registered_once() {
    let calls = record(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
             <defs>
               <linearGradient id="g" x1="0" y1="0" x2="10" y2="0" gradientUnits="userSpaceOnUse">
                 <stop offset="0" stop-color="red"/>
                 <stop offset="1" stop-color="blue"/>
               </linearGradient>
             </defs>
             <rect width="5" height="5" fill="url(#g)"/>
             <rect x="5" width="5" height="5" fill="url(#g)"/>
           </svg>"##,
    );
    let BuilderCall::Init(tables) = &calls[0] else {
        panic!("init must come first");
    };
    assert_eq!(tables.float_lists.len(), 1);
    assert_eq!(&*tables.float_lists[0], &[0.0, 1.0]);

    let gradients: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            BuilderCall::Gradient(g) => Some(g),
            _ => None,
        })
        .collect();
    assert_eq!(gradients.len(), 1);
    assert_eq!(
        gradients[0].colors,
        vec![Color::rgb(255, 0, 0), Color::rgb(0, 0, 255)]
    );
    for p in paths(&calls) {
        assert_eq!(
            p.paint.fill.map(|f| f.source),
            Some(PaintSource::Gradient(GradientId(0)))
        );
    }
}

#[test]
fn fill_opacity_folds_into_gradient_stops() {
    let calls = record(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
             <linearGradient id="g" x2="10" gradientUnits="userSpaceOnUse">
               <stop offset="0" stop-color="white"/><stop offset="1" stop-color="black"/>
             </linearGradient>
             <rect width="5" height="5" fill="url(#g)"/>
             <rect x="5" width="5" height="5" fill="url(#g)" fill-opacity="0.5"/>
           </svg>"##,
    );
    let alphas: Vec<u8> = calls
        .iter()
        .filter_map(|c| match c {
            BuilderCall::Gradient(g) => Some(g.colors[0].a),
            _ => None,
        })
        .collect();
    assert_eq!(alphas, [255, 128]);
}

#[test]
fn group_opacity_and_dashes_are_carried() {
    let calls = record(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
             <g opacity="0.5" transform="translate(2 3)">
               <line x1="0" y1="0" x2="8" y2="0" stroke="black" stroke-dasharray="2 1"/>
             </g>
           </svg>"#,
    );
    let inner = calls
        .iter()
        .filter_map(|c| match c {
            BuilderCall::BeginGroup(g) => Some(*g),
            _ => None,
        })
        .find(|g| g.alpha != 255)
        .unwrap();
    assert_eq!(inner.alpha, 128);
    assert_eq!(inner.transform, Some(Affine::translate((2.0, 3.0))));

    let BuilderCall::Init(tables) = &calls[0] else {
        unreachable!()
    };
    let stroke = paths(&calls)[0].paint.stroke.unwrap();
    let dash = stroke.dash.unwrap();
    assert_eq!(&*tables.float_lists[dash.0 as usize], &[2.0, 1.0]);
    assert_eq!(stroke.width, 1.0);
}

#[test]
fn clips_and_masks_are_bracketed() {
    let calls = record(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
             <clipPath id="c"><rect width="4" height="4"/><rect x="6" width="4" height="4"/></clipPath>
             <mask id="m"><rect width="10" height="10" fill="white"/></mask>
             <g clip-path="url(#c)"><rect width="10" height="10"/></g>
             <g mask="url(#m)"><rect width="10" height="10" fill="red"/></g>
           </svg>"##,
    );
    let clips: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            BuilderCall::ClipPath(c) => Some(c),
            _ => None,
        })
        .collect();
    assert_eq!(clips.len(), 1);
    let moves = clips[0]
        .path
        .verbs()
        .iter()
        .filter(|v| **v == crate::model::path::PathVerb::MoveTo)
        .count();
    assert_eq!(moves, 2);

    let begin = calls
        .iter()
        .position(|c| matches!(c, BuilderCall::BeginMask))
        .unwrap();
    let content = calls
        .iter()
        .position(|c| matches!(c, BuilderCall::MaskContent))
        .unwrap();
    let end = calls
        .iter()
        .position(|c| matches!(c, BuilderCall::EndMask))
        .unwrap();
    assert!(begin < content && content < end);
    assert!(
        calls[content + 1..end]
            .iter()
            .any(|c| matches!(c, BuilderCall::Path(_)))
    );
}

#[test]
fn pattern_only_paint_drops_the_path() {
    let calls = record(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
             <pattern id="p" width="2" height="2" patternUnits="userSpaceOnUse">
               <rect width="1" height="1"/>
             </pattern>
             <rect width="10" height="10" fill="url(#p)"/>
           </svg>"##,
    );
    assert!(paths(&calls).is_empty());
}

#[test]
fn malformed_markup_is_a_parse_error() {
    let err = build_svg(b"<svg", Recorder::new()).unwrap_err();
    assert!(matches!(err, VgcError::Parse(_)));
    assert!(matches!(
        svg_to_image(b"not svg at all", Representation::Graph),
        Err(VgcError::Parse(_))
    ));
}

#[test]
fn both_representations_agree() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20">
        <radialGradient id="r"><stop offset="0.25" stop-color="#f00"/><stop offset="1" stop-color="#00f"/></radialGradient>
        <g opacity="0.25"><circle cx="10" cy="10" r="8" fill="url(#r)" stroke="black"/></g>
        <rect x="2" y="2" width="4" height="4" fill="#0f0"/>
      </svg>"##;
    let compact = svg_to_image(svg, Representation::Compact).unwrap();
    let graph = svg_to_image(svg, Representation::Graph).unwrap();
    assert_eq!(compact.primitives().unwrap(), graph.primitives().unwrap());
    assert_eq!(compact.viewport().unwrap().rect, Rect::new(0.0, 0.0, 20.0, 20.0));
}

#[test]
fn alpha_rounds_and_clamps() {
    assert_eq!(alpha_u8(0.5), 128);
    assert_eq!(alpha_u8(-1.0), 0);
    assert_eq!(alpha_u8(3.0), 255);
    assert_eq!(affine_opt(usvg::Transform::identity()), None);
    assert_eq!(
        affine_opt(usvg::Transform::from_translate(1.0, 2.0)),
        Some(Affine::translate((1.0, 2.0)))
    );
}
