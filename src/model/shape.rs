use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::error::{VgcError, VgcResult};
use crate::foundation::hash::{KeyWriter, StructuralKey};
use crate::model::ids::{ImageId, StringId};
use crate::model::paint::{Color, FillRule, PaintAttrs};
use crate::model::path::PathData;

/// Rectangle geometry with optional corner radii.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RectGeom {
    /// Outer rectangle.
    pub rect: Rect,
    /// Horizontal corner radius.
    pub rx: f64,
    /// Vertical corner radius.
    pub ry: f64,
}

/// Axis-aligned ellipse geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EllipseGeom {
    /// Center point.
    pub center: Point,
    /// Horizontal radius.
    pub rx: f64,
    /// Vertical radius.
    pub ry: f64,
}

/// Polyline (open) or polygon (closed) geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct PolyGeom {
    /// Vertices in order.
    pub points: Vec<Point>,
    /// Close back to the first vertex.
    pub closed: bool,
}

/// Leaf shape: geometry plus paint and an optional local transform.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape<G> {
    /// Geometry in local coordinates.
    pub geometry: G,
    /// Fill and stroke.
    pub paint: PaintAttrs,
    /// Local transform applied before the enclosing group's.
    pub transform: Option<Affine>,
}

impl<G> Shape<G> {
    /// Shape with no local transform.
    pub fn new(geometry: G, paint: PaintAttrs) -> Self {
        Self {
            geometry,
            paint,
            transform: None,
        }
    }
}

/// Raster image leaf.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageLeaf {
    /// Image table entry.
    pub image: ImageId,
    /// Destination rectangle in local coordinates.
    pub dest: Rect,
    /// Local transform.
    pub transform: Option<Affine>,
}

/// Horizontal text alignment relative to the origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextAnchor {
    /// Origin is the start of the run.
    #[default]
    Start,
    /// Origin is the middle of the run.
    Middle,
    /// Origin is the end of the run.
    End,
}

impl TextAnchor {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Start => 0,
            Self::Middle => 1,
            Self::End => 2,
        }
    }

    pub(crate) fn from_code(code: u8) -> VgcResult<Self> {
        match code {
            0 => Ok(Self::Start),
            1 => Ok(Self::Middle),
            2 => Ok(Self::End),
            _ => Err(VgcError::format(format!("unknown text anchor {code}"))),
        }
    }
}

/// Text run leaf. Shaping is left to the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextLeaf {
    /// Text content.
    pub text: StringId,
    /// Font family name.
    pub font_family: Option<StringId>,
    /// Font size in user units.
    pub font_size: f64,
    /// Baseline origin.
    pub origin: Point,
    /// Alignment relative to `origin`.
    pub anchor: TextAnchor,
    /// Fill and stroke.
    pub paint: PaintAttrs,
    /// Local transform.
    pub transform: Option<Affine>,
}

/// Attributes of a group.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupAttrs {
    /// Group transform.
    pub transform: Option<Affine>,
    /// Group opacity, 255 is opaque.
    pub alpha: u8,
    /// Id under which `use_ref` can reference the finished group.
    pub export_id: Option<StringId>,
}

impl Default for GroupAttrs {
    fn default() -> Self {
        Self {
            transform: None,
            alpha: 255,
            export_id: None,
        }
    }
}

/// Clip applied to the following siblings inside the enclosing group.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipPath {
    /// Clip geometry.
    pub path: PathData,
    /// Winding rule.
    pub rule: FillRule,
    /// Local transform of the clip geometry.
    pub transform: Option<Affine>,
}

/// Reference to a previously completed, exported group.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UseRef {
    /// Export id of the referenced group.
    pub target: StringId,
    /// Transform applied on top of the referenced group's own.
    pub transform: Option<Affine>,
}

/// Document-level attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentAttrs {
    /// Declared output width.
    pub width: Option<f64>,
    /// Declared output height.
    pub height: Option<f64>,
    /// Explicit viewport rectangle.
    pub view_box: Option<Rect>,
    /// Tint color applied by the renderer.
    pub tint: Option<Color>,
}

impl DocumentAttrs {
    /// Attributes for a `width` x `height` canvas at the origin.
    pub fn sized(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            view_box: None,
            tint: None,
        }
    }
}

impl RectGeom {
    pub(crate) fn to_floats(self) -> [f64; 6] {
        let r = self.rect;
        [r.x0, r.y0, r.x1, r.y1, self.rx, self.ry]
    }

    pub(crate) fn from_floats(v: &[f64]) -> VgcResult<Self> {
        match *v {
            [x0, y0, x1, y1, rx, ry] => Ok(Self {
                rect: Rect::new(x0, y0, x1, y1),
                rx,
                ry,
            }),
            _ => Err(operand_count("rect", 6, v.len())),
        }
    }
}

impl EllipseGeom {
    /// Circle geometry.
    pub fn circle(center: Point, r: f64) -> Self {
        Self {
            center,
            rx: r,
            ry: r,
        }
    }

    pub(crate) fn to_floats(self) -> [f64; 4] {
        [self.center.x, self.center.y, self.rx, self.ry]
    }

    pub(crate) fn from_floats(v: &[f64]) -> VgcResult<Self> {
        match *v {
            [cx, cy, rx, ry] => Ok(Self {
                center: Point::new(cx, cy),
                rx,
                ry,
            }),
            _ => Err(operand_count("ellipse", 4, v.len())),
        }
    }
}

impl PolyGeom {
    pub(crate) fn to_floats(&self) -> Vec<f64> {
        self.points.iter().flat_map(|p| [p.x, p.y]).collect()
    }

    pub(crate) fn from_floats(v: &[f64], closed: bool) -> VgcResult<Self> {
        if v.len() % 2 != 0 {
            return Err(VgcError::format("poly operands must come in x,y pairs"));
        }
        Ok(Self {
            points: v.chunks_exact(2).map(|p| Point::new(p[0], p[1])).collect(),
            closed,
        })
    }
}

pub(crate) fn operand_count(op: &str, want: usize, got: usize) -> VgcError {
    VgcError::format(format!("{op} expects {want} operands, got {got}"))
}

impl StructuralKey for RectGeom {
    fn write_key(&self, w: &mut KeyWriter) {
        w.write_f64s(&self.to_floats());
    }
}

impl StructuralKey for EllipseGeom {
    fn write_key(&self, w: &mut KeyWriter) {
        w.write_f64s(&self.to_floats());
    }
}

impl StructuralKey for PolyGeom {
    fn write_key(&self, w: &mut KeyWriter) {
        w.write_bool(self.closed);
        w.write_f64s(&self.to_floats());
    }
}
