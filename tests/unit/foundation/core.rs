use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;

#[test]
fn affine_times_inverse_is_identity() {
    let mut rng = StdRng::seed_from_u64(0x9e37_79b9_7f4a_7c15);
    let mut checked = 0;
    while checked < 500 {
        let m = Affine::new([
            rng.random_range(-10.0..10.0),
            rng.random_range(-10.0..10.0),
            rng.random_range(-10.0..10.0),
            rng.random_range(-10.0..10.0),
            rng.random_range(-1000.0..1000.0),
            rng.random_range(-1000.0..1000.0),
        ]);
        if m.determinant().abs() < 0.1 {
            continue;
        }
        assert!(
            affine_approx_eq(m * m.inverse(), Affine::IDENTITY, 1e-6),
            "M * inverse(M) drifted for {m:?}"
        );
        checked += 1;
    }
}

#[test]
fn viewport_output_transform_maps_corners() {
    let vp = Viewport::with_output_size(Rect::new(10.0, 20.0, 60.0, 70.0), 100.0, 100.0);
    assert_eq!(vp.scale, Vec2::new(2.0, 2.0));
    let t = vp.to_output();
    assert_eq!(t * Point::new(10.0, 20.0), Point::new(0.0, 0.0));
    assert_eq!(t * Point::new(60.0, 70.0), Point::new(100.0, 100.0));
}

#[test]
fn degenerate_rects_still_overlap() {
    let line = Rect::new(0.0, 5.0, 10.0, 5.0);
    assert!(rects_overlap(line, Rect::new(2.0, 0.0, 3.0, 10.0)));
    assert!(!rects_overlap(line, Rect::new(20.0, 0.0, 30.0, 10.0)));
}
