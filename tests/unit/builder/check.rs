use super::*;
use crate::model::paint::{Color, PaintSource, Stroke};

fn ready(strings: usize) -> NestingTracker {
    let mut t = NestingTracker::new();
    t.on_init_counts(1, strings, 1).unwrap();
    t
}

#[test]
fn tree_calls_before_init_are_format_errors() {
    let mut t = NestingTracker::new();
    assert!(t.on_begin_group(None).unwrap_err().is_format());
    assert!(t.on_document().unwrap_err().is_format());
    assert!(t.on_finish().unwrap_err().is_format());
}

#[test]
fn init_twice_and_late_document_are_rejected() {
    let mut t = ready(0);
    assert!(t.on_init_counts(0, 0, 0).unwrap_err().is_format());
    t.on_begin_group(None).unwrap();
    assert!(t.on_document().unwrap_err().is_format());
}

#[test]
fn groups_and_masks_must_nest() {
    let mut t = ready(0);
    assert!(t.on_end_group().unwrap_err().is_format());

    t.on_begin_group(None).unwrap();
    t.on_begin_mask().unwrap();
    assert!(t.on_end_group().unwrap_err().is_format());
    assert!(t.on_end_mask().unwrap_err().is_format());
    t.on_mask_content().unwrap();
    assert!(t.on_mask_content().unwrap_err().is_format());
    assert_eq!(t.depth(), 2);
    t.on_end_mask().unwrap();
    assert!(t.on_finish().unwrap_err().is_format());
    assert_eq!(t.on_end_group().unwrap(), None);
    t.on_finish().unwrap();
}

#[test]
fn use_resolves_only_closed_exports() {
    let mut t = ready(2);
    let id = StringId(1);

    assert!(t.on_use(id).unwrap_err().is_structural());

    t.on_begin_group(Some(id)).unwrap();
    t.on_begin_group(None).unwrap();
    assert!(t.on_use(id).unwrap_err().is_structural());
    t.on_end_group().unwrap();
    assert_eq!(t.on_end_group().unwrap(), Some(id));

    t.on_use(id).unwrap();
    assert!(t.on_begin_group(Some(id)).unwrap_err().is_structural());
}

#[test]
fn out_of_range_indices_are_structural() {
    let mut t = ready(1);
    assert!(t.on_image(ImageId(1)).unwrap_err().is_structural());
    assert!(t.on_use(StringId(5)).unwrap_err().is_structural());
    assert!(
        t.on_text(StringId(0), Some(StringId(3)), &PaintAttrs::default(), 0)
            .unwrap_err()
            .is_structural()
    );

    let gradient_fill = PaintAttrs {
        fill: Some(crate::model::paint::Fill {
            source: PaintSource::Gradient(GradientId(0)),
            rule: Default::default(),
        }),
        stroke: None,
    };
    assert!(t.on_leaf("path", &gradient_fill, 0).unwrap_err().is_structural());
    t.on_leaf("path", &gradient_fill, 1).unwrap();

    let mut dashed = Stroke::solid(Color::BLACK, 1.0);
    dashed.dash = Some(FloatListId(1));
    assert!(
        t.on_leaf("path", &PaintAttrs::stroke(dashed), 0)
            .unwrap_err()
            .is_structural()
    );
}
