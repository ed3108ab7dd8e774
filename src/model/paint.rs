use crate::foundation::core::{Affine, Point};
use crate::foundation::error::{VgcError, VgcResult};
use crate::foundation::hash::{KeyWriter, StructuralKey};
use crate::model::ids::{FloatListId, GradientId};

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Opaque color from RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Pack as `0xAARRGGBB`.
    pub fn to_argb(self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }

    /// Unpack from `0xAARRGGBB`.
    pub fn from_argb(v: u32) -> Self {
        let [a, r, g, b] = v.to_be_bytes();
        Self { r, g, b, a }
    }
}

/// What a fill or stroke paints with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaintSource {
    /// Flat color.
    Solid(Color),
    /// Previously registered gradient.
    Gradient(GradientId),
}

/// Winding rule for fills and clips.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FillRule {
    /// Non-zero winding.
    #[default]
    NonZero,
    /// Even-odd parity.
    EvenOdd,
}

/// Stroke end-cap style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineCap {
    /// Flat cap at the endpoint.
    #[default]
    Butt,
    /// Semicircular cap.
    Round,
    /// Square cap extending half the stroke width.
    Square,
}

/// Stroke corner style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineJoin {
    /// Sharp corner, limited by the miter limit.
    #[default]
    Miter,
    /// Rounded corner.
    Round,
    /// Beveled corner.
    Bevel,
}

/// Gradient extension outside `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpreadMethod {
    /// Clamp to the end colors.
    #[default]
    Pad,
    /// Mirror every other period.
    Reflect,
    /// Repeat the ramp.
    Repeat,
}

/// Fill attributes of one leaf.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fill {
    /// Paint source.
    pub source: PaintSource,
    /// Winding rule.
    pub rule: FillRule,
}

/// Stroke attributes of one leaf.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    /// Paint source.
    pub source: PaintSource,
    /// Stroke width in user units.
    pub width: f64,
    /// End-cap style.
    pub cap: LineCap,
    /// Corner style.
    pub join: LineJoin,
    /// Miter limit (ratio).
    pub miter_limit: f64,
    /// Dash pattern from the float-list table.
    pub dash: Option<FloatListId>,
    /// Dash phase.
    pub dash_offset: f64,
}

impl Stroke {
    /// Solid stroke with default cap/join.
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            source: PaintSource::Solid(color),
            width,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 4.0,
            dash: None,
            dash_offset: 0.0,
        }
    }
}

/// Paint attached to a leaf: optional fill plus optional stroke.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PaintAttrs {
    /// Fill, if any.
    pub fill: Option<Fill>,
    /// Stroke, if any.
    pub stroke: Option<Stroke>,
}

impl PaintAttrs {
    /// Non-zero solid fill with no stroke.
    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(Fill {
                source: PaintSource::Solid(color),
                rule: FillRule::NonZero,
            }),
            stroke: None,
        }
    }

    /// Stroke-only paint.
    pub fn stroke(stroke: Stroke) -> Self {
        Self {
            fill: None,
            stroke: Some(stroke),
        }
    }

    /// Stroke width contributing to the painted extent (0 when unstroked).
    pub fn stroke_width(&self) -> f64 {
        self.stroke.map_or(0.0, |s| s.width.max(0.0))
    }

    /// Gradients referenced by this paint.
    pub fn gradients(&self) -> impl Iterator<Item = GradientId> + '_ {
        let fill = self.fill.map(|f| f.source);
        let stroke = self.stroke.map(|s| s.source);
        [fill, stroke].into_iter().flatten().filter_map(|s| match s {
            PaintSource::Gradient(id) => Some(id),
            PaintSource::Solid(_) => None,
        })
    }

    /// Copy with gradient ids rewritten through `map`.
    pub(crate) fn remap_gradients(
        &self,
        mut map: impl FnMut(GradientId) -> VgcResult<GradientId>,
    ) -> VgcResult<Self> {
        let mut out = *self;
        if let Some(f) = out.fill.as_mut()
            && let PaintSource::Gradient(id) = f.source
        {
            f.source = PaintSource::Gradient(map(id)?);
        }
        if let Some(s) = out.stroke.as_mut()
            && let PaintSource::Gradient(id) = s.source
        {
            s.source = PaintSource::Gradient(map(id)?);
        }
        Ok(out)
    }
}

/// Gradient geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GradientKind {
    /// Linear ramp from `start` to `end`.
    Linear {
        /// Ramp start (offset 0).
        start: Point,
        /// Ramp end (offset 1).
        end: Point,
    },
    /// Radial ramp.
    Radial {
        /// Outer circle center.
        center: Point,
        /// Outer circle radius.
        radius: f64,
        /// Focal point (offset 0).
        focal: Point,
    },
}

/// Gradient definition, registered once and referenced by [`GradientId`].
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    /// Linear or radial geometry.
    pub kind: GradientKind,
    /// Stop offsets in the float-list table.
    pub offsets: FloatListId,
    /// Stop colors, one per offset.
    pub colors: Vec<Color>,
    /// Extension mode.
    pub spread: SpreadMethod,
    /// Gradient-space transform.
    pub transform: Option<Affine>,
}

impl GradientKind {
    pub(crate) fn to_floats(self) -> Vec<f64> {
        match self {
            Self::Linear { start, end } => vec![start.x, start.y, end.x, end.y],
            Self::Radial {
                center,
                radius,
                focal,
            } => vec![center.x, center.y, radius, focal.x, focal.y],
        }
    }

    pub(crate) fn from_floats(code: u8, v: &[f64]) -> VgcResult<Self> {
        match (code, v) {
            (0, &[x0, y0, x1, y1]) => Ok(Self::Linear {
                start: Point::new(x0, y0),
                end: Point::new(x1, y1),
            }),
            (1, &[cx, cy, r, fx, fy]) => Ok(Self::Radial {
                center: Point::new(cx, cy),
                radius: r,
                focal: Point::new(fx, fy),
            }),
            _ => Err(VgcError::format(format!(
                "gradient kind {code} with {} operands",
                v.len()
            ))),
        }
    }

    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Linear { .. } => 0,
            Self::Radial { .. } => 1,
        }
    }
}

macro_rules! enum_codes {
    ($ty:ident { $($variant:ident = $code:literal),+ $(,)? }) => {
        impl $ty {
            pub(crate) fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            pub(crate) fn from_code(code: u8) -> VgcResult<Self> {
                match code {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(VgcError::format(format!(
                        concat!("unknown ", stringify!($ty), " code {}"),
                        code
                    ))),
                }
            }
        }
    };
}

enum_codes!(FillRule { NonZero = 0, EvenOdd = 1 });
enum_codes!(LineCap { Butt = 0, Round = 1, Square = 2 });
enum_codes!(LineJoin { Miter = 0, Round = 1, Bevel = 2 });
enum_codes!(SpreadMethod { Pad = 0, Reflect = 1, Repeat = 2 });

impl StructuralKey for PaintSource {
    fn write_key(&self, w: &mut KeyWriter) {
        match *self {
            Self::Solid(c) => {
                w.write_u8(0);
                w.write_u32(c.to_argb());
            }
            Self::Gradient(id) => {
                w.write_u8(1);
                w.write_u32(id.0);
            }
        }
    }
}

impl StructuralKey for Fill {
    fn write_key(&self, w: &mut KeyWriter) {
        self.source.write_key(w);
        w.write_u8(self.rule.code());
    }
}

impl StructuralKey for Stroke {
    fn write_key(&self, w: &mut KeyWriter) {
        self.source.write_key(w);
        w.write_f64(self.width);
        w.write_u8(self.cap.code());
        w.write_u8(self.join.code());
        w.write_f64(self.miter_limit);
        match self.dash {
            Some(id) => {
                w.write_u8(1);
                w.write_u32(id.0);
            }
            None => w.write_u8(0),
        }
        w.write_f64(self.dash_offset);
    }
}

impl StructuralKey for PaintAttrs {
    fn write_key(&self, w: &mut KeyWriter) {
        self.fill.write_key(w);
        self.stroke.write_key(w);
    }
}

impl StructuralKey for Gradient {
    fn write_key(&self, w: &mut KeyWriter) {
        w.write_u8(self.kind.code());
        w.write_f64s(&self.kind.to_floats());
        w.write_u32(self.offsets.0);
        w.write_len(self.colors.len());
        for c in &self.colors {
            w.write_u32(c.to_argb());
        }
        w.write_u8(self.spread.code());
        self.transform.write_key(w);
    }
}
