use super::*;
use crate::foundation::error::VgcError;
use crate::model::ids::{FloatListId, GradientId, StringId};
use crate::model::image::ImageData;
use crate::model::paint::{Color, Gradient};
use crate::model::primitive::{ResolvedFill, ResolvedPaint, ResolvedStyle};
use crate::model::shape::TextAnchor;

struct Strings;

impl Resolver for Strings {
    fn image(&self, id: ImageId) -> VgcResult<Arc<ImageData>> {
        Err(VgcError::structural(format!("no image {}", id.0)))
    }

    fn string(&self, id: StringId) -> VgcResult<Arc<str>> {
        Ok(Arc::from(format!("s{}", id.0)))
    }

    fn float_list(&self, id: FloatListId) -> VgcResult<Arc<[f64]>> {
        Err(VgcError::structural(format!("no float list {}", id.0)))
    }

    fn gradient(&self, id: GradientId) -> VgcResult<Arc<Gradient>> {
        Err(VgcError::structural(format!("no gradient {}", id.0)))
    }
}

fn unit() -> RectGeom {
    RectGeom {
        rect: Rect::new(0.0, 0.0, 1.0, 1.0),
        rx: 0.0,
        ry: 0.0,
    }
}

fn rect_at(prims: &[DrawPrimitive], i: usize) -> Affine {
    match &prims[i] {
        DrawPrimitive::Rect { transform, .. } => *transform,
        other => panic!("expected a rect, got {other:?}"),
    }
}

#[test]
fn group_transforms_compose_and_unwind() {
    let mut out = Vec::new();
    let mut p = Painter::new(&mut out);
    let paint = PaintAttrs::fill(Color::BLACK);
    p.begin_group(Some(Affine::translate((10.0, 0.0))), 255);
    p.rect(&Strings, unit(), &paint, Some(Affine::scale(2.0)))
        .unwrap();
    p.end_group();
    p.rect(&Strings, unit(), &paint, None).unwrap();
    p.finish();

    assert_eq!(out.len(), 2);
    assert_eq!(
        rect_at(&out, 0),
        Affine::translate((10.0, 0.0)) * Affine::scale(2.0)
    );
    assert_eq!(rect_at(&out, 1), Affine::IDENTITY);
    let DrawPrimitive::Rect { style, .. } = &out[1] else {
        unreachable!()
    };
    assert_eq!(
        *style,
        ResolvedStyle {
            fill: Some(ResolvedFill {
                paint: ResolvedPaint::Solid(Color::BLACK),
                rule: FillRule::NonZero,
            }),
            stroke: None,
        }
    );
}

#[test]
fn translucent_groups_push_a_layer() {
    let mut out = Vec::new();
    let mut p = Painter::new(&mut out);
    p.begin_group(None, 100);
    p.end_group();
    p.finish();
    assert_eq!(
        out,
        vec![DrawPrimitive::PushLayer { alpha: 100 }, DrawPrimitive::PopLayer]
    );
}

#[test]
fn clips_pop_when_their_scope_ends() {
    let path = Arc::new(PathData::new());
    let mut out = Vec::new();
    let mut p = Painter::new(&mut out);
    p.begin_group(None, 50);
    p.clip(Arc::clone(&path), FillRule::EvenOdd, None);
    p.clip(Arc::clone(&path), FillRule::NonZero, None);
    p.end_group();
    p.clip(path, FillRule::NonZero, Some(Affine::scale(3.0)));
    p.finish();

    let kinds: Vec<&str> = out
        .iter()
        .map(|d| match d {
            DrawPrimitive::PushLayer { .. } => "push-layer",
            DrawPrimitive::PopLayer => "pop-layer",
            DrawPrimitive::PushClip { .. } => "push-clip",
            DrawPrimitive::PopClip => "pop-clip",
            _ => "other",
        })
        .collect();
    assert_eq!(
        kinds,
        [
            "push-layer",
            "push-clip",
            "push-clip",
            "pop-clip",
            "pop-clip",
            "pop-layer",
            "push-clip",
            "pop-clip"
        ]
    );
    let DrawPrimitive::PushClip { transform, .. } = &out[6] else {
        unreachable!()
    };
    assert_eq!(*transform, Affine::scale(3.0));
}

#[test]
fn masks_bracket_both_halves() {
    let mut out = Vec::new();
    let mut p = Painter::new(&mut out);
    let paint = PaintAttrs::fill(Color::BLACK);
    p.begin_mask();
    p.clip(Arc::new(PathData::new()), FillRule::NonZero, None);
    p.mask_content();
    p.rect(&Strings, unit(), &paint, None).unwrap();
    p.end_mask();
    p.finish();
    assert!(matches!(out[0], DrawPrimitive::BeginMask));
    assert!(matches!(out[2], DrawPrimitive::PopClip));
    assert!(matches!(out[3], DrawPrimitive::BeginMaskedContent));
    assert!(matches!(out[5], DrawPrimitive::EndMask));
    assert_eq!(out.len(), 6);
}

#[test]
fn use_scopes_apply_their_transform() {
    let mut out = Vec::new();
    let mut p = Painter::new(&mut out);
    let paint = PaintAttrs::fill(Color::BLACK);
    p.begin_group(Some(Affine::scale(2.0)), 255);
    p.begin_use(Some(Affine::translate((1.0, 1.0))));
    p.rect(&Strings, unit(), &paint, None).unwrap();
    p.end_use();
    p.end_group();
    p.finish();
    assert_eq!(
        rect_at(&out, 0),
        Affine::scale(2.0) * Affine::translate((1.0, 1.0))
    );
}

#[test]
fn text_resolves_strings_and_propagates_lookup_errors() {
    let mut out = Vec::new();
    let mut p = Painter::new(&mut out);
    let leaf = TextLeaf {
        text: StringId(4),
        font_family: Some(StringId(1)),
        font_size: 12.0,
        origin: (0.0, 10.0).into(),
        anchor: TextAnchor::Middle,
        paint: PaintAttrs::fill(Color::BLACK),
        transform: None,
    };
    p.text(&Strings, &leaf).unwrap();
    assert!(
        p.image(&Strings, ImageId(0), Rect::ZERO, None)
            .unwrap_err()
            .is_structural()
    );
    p.finish();
    let DrawPrimitive::Text {
        text, font_family, ..
    } = &out[0]
    else {
        panic!("expected text");
    };
    assert_eq!(&**text, "s4");
    assert_eq!(font_family.as_deref(), Some("s1"));
    assert_eq!(out.len(), 1);
}
