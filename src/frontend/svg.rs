//! SVG front end.
//!
//! `usvg` resolves the markup (CSS, `<use>`, units, text layout); this module pre-scans the
//! resolved tree for table entries and then drives an [`ImageBuilder`] over it.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use usvg::tiny_skia_path::PathSegment;

use crate::builder::protocol::{ImageBuilder, InitTables};
use crate::compact::encode::{EncodeOpts, Encoder};
use crate::foundation::core::{Affine, BezPath, Point, Rect};
use crate::foundation::error::{VgcError, VgcResult};
use crate::graph::builder::{GraphBuildOpts, GraphBuilder};
use crate::image::{Representation, ScalableImage};
use crate::model::ids::{FloatListId, GradientId, ImageId};
use crate::model::image::ImageData;
use crate::model::paint::{
    Color, Fill, FillRule, Gradient, GradientKind, LineCap, LineJoin, PaintAttrs, PaintSource,
    SpreadMethod, Stroke,
};
use crate::model::path::{PathData, PathSink};
use crate::model::shape::{ClipPath, DocumentAttrs, GroupAttrs, ImageLeaf, Shape};

fn fontdb() -> Arc<usvg::fontdb::Database> {
    static DB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Arc::new(db)
    })
    .clone()
}

/// Parse SVG markup. Parser errors are surfaced verbatim as [`VgcError::Parse`].
pub fn parse_tree(data: &[u8]) -> VgcResult<usvg::Tree> {
    let opts = usvg::Options {
        fontdb: fontdb(),
        ..Default::default()
    };
    usvg::Tree::from_data(data, &opts).map_err(|e| VgcError::parse(e.to_string()))
}

/// Parse SVG markup and drive `builder` with the resulting call stream.
#[tracing::instrument(skip(data, builder), fields(bytes = data.len()))]
pub fn build_svg<B: ImageBuilder>(data: &[u8], builder: B) -> VgcResult<B::Output> {
    let tree = parse_tree(data)?;
    build_tree(&tree, builder)
}

/// Drive `builder` over an already parsed tree.
pub fn build_tree<B: ImageBuilder>(tree: &usvg::Tree, mut builder: B) -> VgcResult<B::Output> {
    let mut scan = Prescan::default();
    scan.group(tree.root())?;
    builder.init(&scan.tables)?;

    let size = tree.size();
    let (w, h) = (f64::from(size.width()), f64::from(size.height()));
    builder.document(&DocumentAttrs {
        view_box: Some(Rect::new(0.0, 0.0, w, h)),
        ..DocumentAttrs::sized(w, h)
    })?;

    let mut emit = Emitter {
        builder,
        scan,
        gradients: HashMap::new(),
    };
    emit.group(tree.root())?;
    emit.builder.finish()
}

/// Parse SVG markup straight into the requested representation with default options.
pub fn svg_to_image(data: &[u8], repr: Representation) -> VgcResult<ScalableImage> {
    Ok(match repr {
        Representation::Compact => {
            ScalableImage::Compact(build_svg(data, Encoder::new(EncodeOpts::default()))?)
        }
        Representation::Graph => {
            ScalableImage::Graph(build_svg(data, GraphBuilder::new(GraphBuildOpts::default()))?)
        }
    })
}

/// Table entries collected before the first tree call.
#[derive(Default)]
struct Prescan {
    tables: InitTables,
    images: HashMap<usize, ImageId>,
    float_lists: HashMap<Vec<u64>, FloatListId>,
}

impl Prescan {
    fn group(&mut self, g: &usvg::Group) -> VgcResult<()> {
        if let Some(clip) = g.clip_path() {
            self.group(clip.root())?;
        }
        if let Some(mask) = g.mask() {
            self.group(mask.root())?;
        }
        for node in g.children() {
            match node {
                usvg::Node::Group(c) => self.group(c)?,
                usvg::Node::Path(p) => {
                    if let Some(f) = p.fill() {
                        self.paint(f.paint())?;
                    }
                    if let Some(s) = p.stroke() {
                        self.paint(s.paint())?;
                        if let Some(dash) = s.dasharray() {
                            self.float_list(dash)?;
                        }
                    }
                }
                usvg::Node::Image(img) => self.image(img)?,
                usvg::Node::Text(t) => self.group(t.flattened())?,
            }
        }
        Ok(())
    }

    fn paint(&mut self, paint: &usvg::Paint) -> VgcResult<()> {
        let stops = match paint {
            usvg::Paint::LinearGradient(g) => g.stops(),
            usvg::Paint::RadialGradient(g) => g.stops(),
            usvg::Paint::Color(_) | usvg::Paint::Pattern(_) => return Ok(()),
        };
        let offsets: Vec<f32> = stops.iter().map(|s| s.offset().get()).collect();
        self.float_list(&offsets)?;
        Ok(())
    }

    fn float_list(&mut self, v: &[f32]) -> VgcResult<FloatListId> {
        let v: Vec<f64> = v.iter().map(|&x| f64::from(x)).collect();
        let key: Vec<u64> = v.iter().map(|x| x.to_bits()).collect();
        if let Some(&id) = self.float_lists.get(&key) {
            return Ok(id);
        }
        let id = self.tables.push_float_list(&v)?;
        self.float_lists.insert(key, id);
        Ok(id)
    }

    fn image(&mut self, img: &usvg::Image) -> VgcResult<()> {
        let bytes = match img.kind() {
            usvg::ImageKind::JPEG(b)
            | usvg::ImageKind::PNG(b)
            | usvg::ImageKind::GIF(b)
            | usvg::ImageKind::WEBP(b) => b,
            usvg::ImageKind::SVG(_) => return Ok(()),
        };
        let key = Arc::as_ptr(bytes) as usize;
        if self.images.contains_key(&key) {
            return Ok(());
        }
        let data = match ImageData::from_encoded(bytes.as_slice()) {
            Ok(data) => data,
            Err(err) => {
                let size = img.size();
                tracing::debug!(%err, "reading image size failed, using layout size");
                ImageData::new(
                    size.width().round() as u32,
                    size.height().round() as u32,
                    bytes.as_slice(),
                )
            }
        };
        let id = self.tables.push_image(data)?;
        self.images.insert(key, id);
        Ok(())
    }

    fn image_id(&self, img: &usvg::Image) -> Option<ImageId> {
        match img.kind() {
            usvg::ImageKind::JPEG(b)
            | usvg::ImageKind::PNG(b)
            | usvg::ImageKind::GIF(b)
            | usvg::ImageKind::WEBP(b) => self.images.get(&(Arc::as_ptr(b) as usize)).copied(),
            usvg::ImageKind::SVG(_) => None,
        }
    }

    fn float_list_id(&self, v: &[f32]) -> VgcResult<FloatListId> {
        let key: Vec<u64> = v.iter().map(|&x| f64::from(x).to_bits()).collect();
        self.float_lists
            .get(&key)
            .copied()
            .ok_or_else(|| VgcError::structural("float list missed by the svg pre-scan"))
    }
}

struct Emitter<B> {
    builder: B,
    scan: Prescan,
    /// Registered gradients keyed by usvg definition and folded opacity.
    gradients: HashMap<(usize, u32), GradientId>,
}

impl<B: ImageBuilder> Emitter<B> {
    fn group(&mut self, g: &usvg::Group) -> VgcResult<()> {
        self.builder.begin_group(&GroupAttrs {
            transform: affine_opt(g.transform()),
            alpha: alpha_u8(g.opacity().get()),
            export_id: None,
        })?;
        if let Some(clip) = g.clip_path() {
            self.builder.clip_path(&clip_geometry(clip))?;
        }
        match g.mask() {
            Some(mask) => {
                self.builder.begin_mask()?;
                self.group(mask.root())?;
                self.builder.mask_content()?;
                self.children(g)?;
                self.builder.end_mask()?;
            }
            None => self.children(g)?,
        }
        self.builder.end_group()
    }

    fn children(&mut self, g: &usvg::Group) -> VgcResult<()> {
        for node in g.children() {
            match node {
                usvg::Node::Group(c) => self.group(c)?,
                usvg::Node::Path(p) => self.path(p)?,
                usvg::Node::Image(img) => self.image(img)?,
                usvg::Node::Text(t) => self.group(t.flattened())?,
            }
        }
        Ok(())
    }

    fn path(&mut self, p: &usvg::Path) -> VgcResult<()> {
        if !p.is_visible() {
            return Ok(());
        }
        let paint = PaintAttrs {
            fill: match p.fill() {
                Some(f) => self.paint(f.paint(), f.opacity().get())?.map(|source| Fill {
                    source,
                    rule: fill_rule(f.rule()),
                }),
                None => None,
            },
            stroke: match p.stroke() {
                Some(s) => self.stroke(s)?,
                None => None,
            },
        };
        if paint.fill.is_none() && paint.stroke.is_none() {
            return Ok(());
        }
        self.builder.path(&Shape::new(path_data(p.data()), paint))
    }

    fn stroke(&mut self, s: &usvg::Stroke) -> VgcResult<Option<Stroke>> {
        let Some(source) = self.paint(s.paint(), s.opacity().get())? else {
            return Ok(None);
        };
        Ok(Some(Stroke {
            source,
            width: f64::from(s.width().get()),
            cap: match s.linecap() {
                usvg::LineCap::Butt => LineCap::Butt,
                usvg::LineCap::Round => LineCap::Round,
                usvg::LineCap::Square => LineCap::Square,
            },
            join: match s.linejoin() {
                usvg::LineJoin::Miter | usvg::LineJoin::MiterClip => LineJoin::Miter,
                usvg::LineJoin::Round => LineJoin::Round,
                usvg::LineJoin::Bevel => LineJoin::Bevel,
            },
            miter_limit: f64::from(s.miterlimit().get()),
            dash: s
                .dasharray()
                .map(|d| self.scan.float_list_id(d))
                .transpose()?,
            dash_offset: f64::from(s.dashoffset()),
        }))
    }

    fn paint(&mut self, paint: &usvg::Paint, opacity: f32) -> VgcResult<Option<PaintSource>> {
        let (key, kind, base): (usize, GradientKind, &usvg::BaseGradient) = match paint {
            usvg::Paint::Color(c) => {
                return Ok(Some(PaintSource::Solid(Color::rgba(
                    c.red,
                    c.green,
                    c.blue,
                    alpha_u8(opacity),
                ))));
            }
            usvg::Paint::LinearGradient(g) => (
                Arc::as_ptr(g) as usize,
                GradientKind::Linear {
                    start: point(g.x1(), g.y1()),
                    end: point(g.x2(), g.y2()),
                },
                g,
            ),
            usvg::Paint::RadialGradient(g) => (
                Arc::as_ptr(g) as usize,
                GradientKind::Radial {
                    center: point(g.cx(), g.cy()),
                    radius: f64::from(g.r().get()),
                    focal: point(g.fx(), g.fy()),
                },
                g,
            ),
            usvg::Paint::Pattern(_) => {
                tracing::debug!("pattern paint is not supported, dropping it");
                return Ok(None);
            }
        };

        let cache_key = (key, opacity.to_bits());
        if let Some(&id) = self.gradients.get(&cache_key) {
            return Ok(Some(PaintSource::Gradient(id)));
        }
        let offsets: Vec<f32> = base.stops().iter().map(|s| s.offset().get()).collect();
        let gradient = Gradient {
            kind,
            offsets: self.scan.float_list_id(&offsets)?,
            colors: base
                .stops()
                .iter()
                .map(|s| {
                    let c = s.color();
                    Color::rgba(c.red, c.green, c.blue, alpha_u8(s.opacity().get() * opacity))
                })
                .collect(),
            spread: match base.spread_method() {
                usvg::SpreadMethod::Pad => SpreadMethod::Pad,
                usvg::SpreadMethod::Reflect => SpreadMethod::Reflect,
                usvg::SpreadMethod::Repeat => SpreadMethod::Repeat,
            },
            transform: affine_opt(base.transform()),
        };
        let id = self.builder.gradient(&gradient)?;
        self.gradients.insert(cache_key, id);
        Ok(Some(PaintSource::Gradient(id)))
    }

    fn image(&mut self, img: &usvg::Image) -> VgcResult<()> {
        if !img.is_visible() {
            return Ok(());
        }
        let Some(image) = self.scan.image_id(img) else {
            tracing::debug!("nested svg image is not supported, dropping it");
            return Ok(());
        };
        let size = img.size();
        self.builder.image(&ImageLeaf {
            image,
            dest: Rect::new(0.0, 0.0, f64::from(size.width()), f64::from(size.height())),
            transform: None,
        })
    }
}

/// Merge every path under a clip definition into one geometry in the clip's space.
fn clip_geometry(clip: &usvg::ClipPath) -> ClipPath {
    fn collect(g: &usvg::Group, t: Affine, out: &mut BezPath, rule: &mut Option<FillRule>) {
        for node in g.children() {
            match node {
                usvg::Node::Group(c) => collect(c, t * to_affine(c.transform()), out, rule),
                usvg::Node::Path(p) => {
                    let mut bez = path_data(p.data()).to_bez_path();
                    bez.apply_affine(t);
                    for el in bez.elements() {
                        out.push(*el);
                    }
                    if rule.is_none() {
                        *rule = p.fill().map(|f| fill_rule(f.rule()));
                    }
                }
                usvg::Node::Text(text) => {
                    let flat = text.flattened();
                    collect(flat, t * to_affine(flat.transform()), out, rule);
                }
                usvg::Node::Image(_) => {}
            }
        }
    }

    let mut bez = BezPath::new();
    let mut rule = None;
    collect(clip.root(), Affine::IDENTITY, &mut bez, &mut rule);
    if clip.clip_path().is_some() {
        tracing::debug!("nested clip paths are flattened to the outer clip");
    }
    ClipPath {
        path: PathData::from_bez_path(&bez),
        rule: rule.unwrap_or_default(),
        transform: affine_opt(clip.transform()),
    }
}

fn path_data(p: &usvg::tiny_skia_path::Path) -> PathData {
    let mut out = PathData::new();
    let sink: &mut dyn PathSink<f32> = &mut out;
    for seg in p.segments() {
        match seg {
            PathSegment::MoveTo(a) => sink.move_to(a.x, a.y),
            PathSegment::LineTo(a) => sink.line_to(a.x, a.y),
            PathSegment::QuadTo(a, b) => sink.quad_to(a.x, a.y, b.x, b.y),
            PathSegment::CubicTo(a, b, c) => sink.cubic_to(a.x, a.y, b.x, b.y, c.x, c.y),
            PathSegment::Close => sink.close(),
        }
    }
    out
}

fn fill_rule(rule: usvg::FillRule) -> FillRule {
    match rule {
        usvg::FillRule::NonZero => FillRule::NonZero,
        usvg::FillRule::EvenOdd => FillRule::EvenOdd,
    }
}

fn point(x: f32, y: f32) -> Point {
    Point::new(f64::from(x), f64::from(y))
}

fn to_affine(t: usvg::Transform) -> Affine {
    Affine::new([t.sx, t.ky, t.kx, t.sy, t.tx, t.ty].map(f64::from))
}

fn affine_opt(t: usvg::Transform) -> Option<Affine> {
    (!t.is_identity()).then(|| to_affine(t))
}

fn alpha_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/frontend/svg.rs"]
mod tests;
