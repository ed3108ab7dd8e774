use crate::builder::check::NestingTracker;
use crate::builder::protocol::{ImageBuilder, InitTables};
use crate::foundation::error::VgcResult;
use crate::model::ids::GradientId;
use crate::model::paint::{Gradient, PaintAttrs};
use crate::model::path::PathData;
use crate::model::shape::{
    ClipPath, DocumentAttrs, EllipseGeom, GroupAttrs, ImageLeaf, PolyGeom, RectGeom, Shape,
    TextLeaf, UseRef,
};

/// Owned form of one [`ImageBuilder`] call.
///
/// Gradient ids inside a recorded stream are the ids returned while recording, i.e. the
/// position of the `Gradient` call among all recorded gradient calls.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum BuilderCall {
    Init(InitTables),
    Document(DocumentAttrs),
    Gradient(Gradient),
    BeginGroup(GroupAttrs),
    EndGroup,
    ClipPath(ClipPath),
    BeginMask,
    MaskContent,
    EndMask,
    Path(Shape<PathData>),
    Rect(Shape<RectGeom>),
    Ellipse(Shape<EllipseGeom>),
    Poly(Shape<PolyGeom>),
    Image(ImageLeaf),
    Text(TextLeaf),
    Use(UseRef),
}

/// Maps gradient ids of a source stream to the ids a target builder returned for them.
#[derive(Debug, Default)]
pub(crate) struct GradientRemap {
    ids: Vec<GradientId>,
}

impl GradientRemap {
    pub(crate) fn push(&mut self, target: GradientId) {
        self.ids.push(target);
    }

    pub(crate) fn map(&self, id: GradientId) -> VgcResult<GradientId> {
        self.ids
            .get(id.index())
            .copied()
            .ok_or_else(|| crate::model::primitive::missing_index("gradient", id.0))
    }

    pub(crate) fn paint(&self, paint: &PaintAttrs) -> VgcResult<PaintAttrs> {
        paint.remap_gradients(|id| self.map(id))
    }

    pub(crate) fn shape<G: Clone>(&self, shape: &Shape<G>) -> VgcResult<Shape<G>> {
        Ok(Shape {
            geometry: shape.geometry.clone(),
            paint: self.paint(&shape.paint)?,
            transform: shape.transform,
        })
    }
}

impl BuilderCall {
    /// Issue this call on `builder` without gradient id translation.
    pub fn apply<B: ImageBuilder>(&self, builder: &mut B) -> VgcResult<()> {
        match self {
            Self::Init(t) => builder.init(t),
            Self::Document(d) => builder.document(d),
            Self::Gradient(g) => builder.gradient(g).map(drop),
            Self::BeginGroup(g) => builder.begin_group(g),
            Self::EndGroup => builder.end_group(),
            Self::ClipPath(c) => builder.clip_path(c),
            Self::BeginMask => builder.begin_mask(),
            Self::MaskContent => builder.mask_content(),
            Self::EndMask => builder.end_mask(),
            Self::Path(s) => builder.path(s),
            Self::Rect(s) => builder.rect(s),
            Self::Ellipse(s) => builder.ellipse(s),
            Self::Poly(s) => builder.poly(s),
            Self::Image(i) => builder.image(i),
            Self::Text(t) => builder.text(t),
            Self::Use(u) => builder.use_ref(u),
        }
    }

    fn apply_remapped<B: ImageBuilder>(
        &self,
        builder: &mut B,
        remap: &mut GradientRemap,
    ) -> VgcResult<()> {
        match self {
            Self::Gradient(g) => {
                let id = builder.gradient(g)?;
                remap.push(id);
                Ok(())
            }
            Self::Path(s) => builder.path(&remap.shape(s)?),
            Self::Rect(s) => builder.rect(&remap.shape(s)?),
            Self::Ellipse(s) => builder.ellipse(&remap.shape(s)?),
            Self::Poly(s) => builder.poly(&remap.shape(s)?),
            Self::Text(t) => builder.text(&TextLeaf {
                paint: remap.paint(&t.paint)?,
                ..*t
            }),
            other => other.apply(builder),
        }
    }
}

/// Replay a recorded stream into `builder` and finish it.
///
/// Gradient ids are translated to whatever the target builder returns, so canonicalizing
/// backends see consistent references.
pub fn replay_calls<B: ImageBuilder>(calls: &[BuilderCall], mut builder: B) -> VgcResult<B::Output> {
    let mut remap = GradientRemap::default();
    for call in calls {
        call.apply_remapped(&mut builder, &mut remap)?;
    }
    builder.finish()
}

/// Builder that records calls verbatim, checking the protocol contract as it goes.
#[derive(Debug, Default)]
pub struct Recorder {
    calls: Vec<BuilderCall>,
    tracker: NestingTracker,
    gradients: usize,
}

impl Recorder {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageBuilder for Recorder {
    type Output = Vec<BuilderCall>;

    fn init(&mut self, tables: &InitTables) -> VgcResult<()> {
        self.tracker.on_init(tables)?;
        self.calls.push(BuilderCall::Init(tables.clone()));
        Ok(())
    }

    fn document(&mut self, doc: &DocumentAttrs) -> VgcResult<()> {
        self.tracker.on_document()?;
        self.calls.push(BuilderCall::Document(*doc));
        Ok(())
    }

    fn gradient(&mut self, gradient: &Gradient) -> VgcResult<GradientId> {
        self.tracker.on_gradient(gradient)?;
        let id = GradientId(u32::try_from(self.gradients).map_err(anyhow::Error::from)?);
        self.gradients += 1;
        self.calls.push(BuilderCall::Gradient(gradient.clone()));
        Ok(id)
    }

    fn begin_group(&mut self, attrs: &GroupAttrs) -> VgcResult<()> {
        self.tracker.on_begin_group(attrs.export_id)?;
        self.calls.push(BuilderCall::BeginGroup(*attrs));
        Ok(())
    }

    fn end_group(&mut self) -> VgcResult<()> {
        self.tracker.on_end_group()?;
        self.calls.push(BuilderCall::EndGroup);
        Ok(())
    }

    fn clip_path(&mut self, clip: &ClipPath) -> VgcResult<()> {
        self.tracker.on_clip()?;
        self.calls.push(BuilderCall::ClipPath(clip.clone()));
        Ok(())
    }

    fn begin_mask(&mut self) -> VgcResult<()> {
        self.tracker.on_begin_mask()?;
        self.calls.push(BuilderCall::BeginMask);
        Ok(())
    }

    fn mask_content(&mut self) -> VgcResult<()> {
        self.tracker.on_mask_content()?;
        self.calls.push(BuilderCall::MaskContent);
        Ok(())
    }

    fn end_mask(&mut self) -> VgcResult<()> {
        self.tracker.on_end_mask()?;
        self.calls.push(BuilderCall::EndMask);
        Ok(())
    }

    fn path(&mut self, shape: &Shape<PathData>) -> VgcResult<()> {
        self.tracker.on_leaf("path", &shape.paint, self.gradients)?;
        self.calls.push(BuilderCall::Path(shape.clone()));
        Ok(())
    }

    fn rect(&mut self, shape: &Shape<RectGeom>) -> VgcResult<()> {
        self.tracker.on_leaf("rect", &shape.paint, self.gradients)?;
        self.calls.push(BuilderCall::Rect(shape.clone()));
        Ok(())
    }

    fn ellipse(&mut self, shape: &Shape<EllipseGeom>) -> VgcResult<()> {
        self.tracker.on_leaf("ellipse", &shape.paint, self.gradients)?;
        self.calls.push(BuilderCall::Ellipse(shape.clone()));
        Ok(())
    }

    fn poly(&mut self, shape: &Shape<PolyGeom>) -> VgcResult<()> {
        self.tracker.on_leaf("poly", &shape.paint, self.gradients)?;
        self.calls.push(BuilderCall::Poly(shape.clone()));
        Ok(())
    }

    fn image(&mut self, leaf: &ImageLeaf) -> VgcResult<()> {
        self.tracker.on_image(leaf.image)?;
        self.calls.push(BuilderCall::Image(*leaf));
        Ok(())
    }

    fn text(&mut self, leaf: &TextLeaf) -> VgcResult<()> {
        self.tracker
            .on_text(leaf.text, leaf.font_family, &leaf.paint, self.gradients)?;
        self.calls.push(BuilderCall::Text(*leaf));
        Ok(())
    }

    fn use_ref(&mut self, use_ref: &UseRef) -> VgcResult<()> {
        self.tracker.on_use(use_ref.target)?;
        self.calls.push(BuilderCall::Use(*use_ref));
        Ok(())
    }

    fn finish(self) -> VgcResult<Self::Output> {
        self.tracker.on_finish()?;
        Ok(self.calls)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/builder/call.rs"]
mod tests;
