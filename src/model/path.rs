use crate::foundation::core::{BezPath, Point, Rect};
use crate::foundation::error::{VgcError, VgcResult};
use crate::foundation::hash::{KeyWriter, StructuralKey};

/// One path command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathVerb {
    /// Start a subpath (1 point).
    MoveTo,
    /// Straight segment (1 point).
    LineTo,
    /// Quadratic Bézier (2 points).
    QuadTo,
    /// Cubic Bézier (3 points).
    CubicTo,
    /// Close the current subpath (no points).
    Close,
}

impl PathVerb {
    /// Number of coordinates (not points) consumed by this verb.
    pub fn coord_count(self) -> usize {
        match self {
            Self::MoveTo | Self::LineTo => 2,
            Self::QuadTo => 4,
            Self::CubicTo => 6,
            Self::Close => 0,
        }
    }

    pub(crate) fn code(self) -> u8 {
        match self {
            Self::MoveTo => 0,
            Self::LineTo => 1,
            Self::QuadTo => 2,
            Self::CubicTo => 3,
            Self::Close => 4,
        }
    }

    pub(crate) fn from_code(code: u8) -> VgcResult<Self> {
        Ok(match code {
            0 => Self::MoveTo,
            1 => Self::LineTo,
            2 => Self::QuadTo,
            3 => Self::CubicTo,
            4 => Self::Close,
            _ => return Err(VgcError::format(format!("unknown path verb {code}"))),
        })
    }
}

/// Scalar type a path sink is parameterized over.
pub trait Coord: Copy {
    /// Widen to `f64`.
    fn to_f64(self) -> f64;
    /// Narrow from `f64`.
    fn from_f64(v: f64) -> Self;
}

impl Coord for f32 {
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Coord for f64 {
    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(v: f64) -> Self {
        v
    }
}

/// Path construction interface shared by persisted and renderer-native geometry.
///
/// Shape helpers are written once against `C` and work for every implementor.
pub trait PathSink<C: Coord> {
    /// Start a subpath.
    fn move_to(&mut self, x: C, y: C);
    /// Straight segment.
    fn line_to(&mut self, x: C, y: C);
    /// Quadratic Bézier.
    fn quad_to(&mut self, x1: C, y1: C, x: C, y: C);
    /// Cubic Bézier.
    fn cubic_to(&mut self, x1: C, y1: C, x2: C, y2: C, x: C, y: C);
    /// Close the current subpath.
    fn close(&mut self);

    /// Axis-aligned ellipse approximated by four cubic arcs.
    fn ellipse(&mut self, cx: C, cy: C, rx: C, ry: C) {
        const KAPPA: f64 = 0.552_284_749_830_793_4;
        let (cx, cy, rx, ry) = (cx.to_f64(), cy.to_f64(), rx.to_f64(), ry.to_f64());
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);
        let c = C::from_f64;
        self.move_to(c(cx + rx), c(cy));
        self.cubic_to(c(cx + rx), c(cy + ky), c(cx + kx), c(cy + ry), c(cx), c(cy + ry));
        self.cubic_to(c(cx - kx), c(cy + ry), c(cx - rx), c(cy + ky), c(cx - rx), c(cy));
        self.cubic_to(c(cx - rx), c(cy - ky), c(cx - kx), c(cy - ry), c(cx), c(cy - ry));
        self.cubic_to(c(cx + kx), c(cy - ry), c(cx + rx), c(cy - ky), c(cx + rx), c(cy));
        self.close();
    }

    /// Axis-aligned rectangle.
    fn rect(&mut self, x: C, y: C, w: C, h: C) {
        let (x, y, w, h) = (x.to_f64(), y.to_f64(), w.to_f64(), h.to_f64());
        let c = C::from_f64;
        self.move_to(c(x), c(y));
        self.line_to(c(x + w), c(y));
        self.line_to(c(x + w), c(y + h));
        self.line_to(c(x), c(y + h));
        self.close();
    }

    /// Polyline or polygon through `points`.
    fn polyline(&mut self, points: &[(C, C)], closed: bool) {
        let mut it = points.iter();
        if let Some(&(x, y)) = it.next() {
            self.move_to(x, y);
            for &(x, y) in it {
                self.line_to(x, y);
            }
            if closed {
                self.close();
            }
        }
    }
}

/// Persisted path geometry: verbs plus a flat coordinate array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathData {
    verbs: Vec<PathVerb>,
    coords: Vec<f64>,
}

impl PathData {
    /// Empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble from raw parts, checking that `coords` matches `verbs`.
    pub fn from_parts(verbs: Vec<PathVerb>, coords: Vec<f64>) -> VgcResult<Self> {
        let want: usize = verbs.iter().map(|v| v.coord_count()).sum();
        if want != coords.len() {
            return Err(VgcError::format(format!(
                "path expects {want} coordinates, got {}",
                coords.len()
            )));
        }
        Ok(Self { verbs, coords })
    }

    /// Parse SVG path syntax (`d` attribute).
    pub fn from_svg_d(d: &str) -> VgcResult<Self> {
        let bez = BezPath::from_svg(d).map_err(|e| VgcError::parse(e.to_string()))?;
        Ok(Self::from_bez_path(&bez))
    }

    /// Convert renderer-native geometry.
    pub fn from_bez_path(bez: &BezPath) -> Self {
        let mut out = Self::new();
        for el in bez.elements() {
            match *el {
                kurbo::PathEl::MoveTo(p) => out.move_to(p.x, p.y),
                kurbo::PathEl::LineTo(p) => out.line_to(p.x, p.y),
                kurbo::PathEl::QuadTo(p1, p) => out.quad_to(p1.x, p1.y, p.x, p.y),
                kurbo::PathEl::CurveTo(p1, p2, p) => {
                    out.cubic_to(p1.x, p1.y, p2.x, p2.y, p.x, p.y)
                }
                kurbo::PathEl::ClosePath => out.close(),
            }
        }
        out
    }

    /// Replay into any sink, converting coordinates to the sink's scalar type.
    pub fn replay<C: Coord, S: PathSink<C>>(&self, sink: &mut S) {
        let c = C::from_f64;
        let mut i = 0;
        for &verb in &self.verbs {
            let v = &self.coords[i..i + verb.coord_count()];
            match verb {
                PathVerb::MoveTo => sink.move_to(c(v[0]), c(v[1])),
                PathVerb::LineTo => sink.line_to(c(v[0]), c(v[1])),
                PathVerb::QuadTo => sink.quad_to(c(v[0]), c(v[1]), c(v[2]), c(v[3])),
                PathVerb::CubicTo => {
                    sink.cubic_to(c(v[0]), c(v[1]), c(v[2]), c(v[3]), c(v[4]), c(v[5]))
                }
                PathVerb::Close => sink.close(),
            }
            i += verb.coord_count();
        }
    }

    /// Renderer-native copy.
    pub fn to_bez_path(&self) -> BezPath {
        let mut bez = BezPath::new();
        self.replay::<f64, _>(&mut bez);
        bez
    }

    /// Path verbs.
    pub fn verbs(&self) -> &[PathVerb] {
        &self.verbs
    }

    /// Flat coordinate array.
    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    /// Return `true` when the path has no verbs.
    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    /// Bounding box of all control points, or `None` for an empty path.
    pub fn control_bounds(&self) -> Option<Rect> {
        let mut pts = self.coords.chunks_exact(2).map(|p| Point::new(p[0], p[1]));
        let first = pts.next()?;
        Some(pts.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
    }

    /// Copy with every coordinate passed through `f`.
    pub(crate) fn map_coords(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            verbs: self.verbs.clone(),
            coords: self.coords.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Close the current subpath.
    pub fn close(&mut self) {
        self.push(PathVerb::Close, &[]);
    }

    fn push(&mut self, verb: PathVerb, coords: &[f64]) {
        self.verbs.push(verb);
        self.coords.extend_from_slice(coords);
    }
}

impl PathSink<f64> for PathData {
    fn move_to(&mut self, x: f64, y: f64) {
        self.push(PathVerb::MoveTo, &[x, y]);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push(PathVerb::LineTo, &[x, y]);
    }

    fn quad_to(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        self.push(PathVerb::QuadTo, &[x1, y1, x, y]);
    }

    fn cubic_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.push(PathVerb::CubicTo, &[x1, y1, x2, y2, x, y]);
    }

    fn close(&mut self) {
        PathData::close(self);
    }
}

impl PathSink<f32> for PathData {
    fn move_to(&mut self, x: f32, y: f32) {
        PathSink::<f64>::move_to(self, x.into(), y.into());
    }

    fn line_to(&mut self, x: f32, y: f32) {
        PathSink::<f64>::line_to(self, x.into(), y.into());
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        PathSink::<f64>::quad_to(self, x1.into(), y1.into(), x.into(), y.into());
    }

    fn cubic_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        PathSink::<f64>::cubic_to(
            self,
            x1.into(),
            y1.into(),
            x2.into(),
            y2.into(),
            x.into(),
            y.into(),
        );
    }

    fn close(&mut self) {
        PathData::close(self);
    }
}

impl PathSink<f64> for BezPath {
    fn move_to(&mut self, x: f64, y: f64) {
        BezPath::move_to(self, (x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        BezPath::line_to(self, (x, y));
    }

    fn quad_to(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        BezPath::quad_to(self, (x1, y1), (x, y));
    }

    fn cubic_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        BezPath::curve_to(self, (x1, y1), (x2, y2), (x, y));
    }

    fn close(&mut self) {
        BezPath::close_path(self);
    }
}

impl StructuralKey for PathData {
    fn write_key(&self, w: &mut KeyWriter) {
        w.write_len(self.verbs.len());
        for v in &self.verbs {
            w.write_u8(v.code());
        }
        w.write_f64s(&self.coords);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/path.rs"]
mod tests;
