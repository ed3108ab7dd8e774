pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Visible rectangle of an image plus the scale from viewport units to declared output units.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Visible rectangle in user space.
    pub rect: Rect,
    /// Declared output size divided by `rect` size, per axis.
    pub scale: Vec2,
}

impl Viewport {
    /// Viewport with unit scale.
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            scale: Vec2::new(1.0, 1.0),
        }
    }

    /// Viewport whose scale maps `rect` onto an output of `width` x `height`.
    pub fn with_output_size(rect: Rect, width: f64, height: f64) -> Self {
        let sx = if rect.width() > 0.0 {
            width / rect.width()
        } else {
            1.0
        };
        let sy = if rect.height() > 0.0 {
            height / rect.height()
        } else {
            1.0
        };
        Self {
            rect,
            scale: Vec2::new(sx, sy),
        }
    }

    /// Transform mapping user space to output space.
    pub fn to_output(self) -> Affine {
        Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * Affine::translate((-self.rect.x0, -self.rect.y0))
    }
}

/// Return `true` when every coefficient of `a` and `b` differs by at most `eps`.
pub fn affine_approx_eq(a: Affine, b: Affine, eps: f64) -> bool {
    a.as_coeffs()
        .iter()
        .zip(b.as_coeffs().iter())
        .all(|(x, y)| (x - y).abs() <= eps)
}

/// Closed-interval overlap test; degenerate (zero-area) rectangles still overlap when touched.
pub(crate) fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
