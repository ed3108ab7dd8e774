use std::sync::Arc;

use crate::foundation::error::VgcResult;
use crate::model::ids::GradientId;
use crate::model::image::ImageData;
use crate::model::paint::Gradient;
use crate::model::path::PathData;
use crate::model::shape::{
    ClipPath, DocumentAttrs, EllipseGeom, GroupAttrs, ImageLeaf, PolyGeom, RectGeom, Shape,
    TextLeaf, UseRef,
};

/// Canonical tables handed to [`ImageBuilder::init`] before any tree call.
///
/// Leaves refer to entries by index ([`crate::model::ImageId`], [`crate::model::StringId`],
/// [`crate::model::FloatListId`]). Front ends with forward references fill these in a pre-scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InitTables {
    /// Encoded raster images.
    pub images: Vec<Arc<ImageData>>,
    /// Strings: text content, font families, export ids.
    pub strings: Vec<Arc<str>>,
    /// Float lists: gradient stop offsets, dash patterns.
    pub float_lists: Vec<Arc<[f64]>>,
}

impl InitTables {
    /// Empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an image and return its index.
    pub fn push_image(&mut self, image: ImageData) -> VgcResult<crate::model::ImageId> {
        let id = next_index(self.images.len())?;
        self.images.push(Arc::new(image));
        Ok(crate::model::ImageId(id))
    }

    /// Append a string and return its index.
    pub fn push_string(&mut self, s: &str) -> VgcResult<crate::model::StringId> {
        let id = next_index(self.strings.len())?;
        self.strings.push(Arc::from(s));
        Ok(crate::model::StringId(id))
    }

    /// Append a float list and return its index.
    pub fn push_float_list(&mut self, v: &[f64]) -> VgcResult<crate::model::FloatListId> {
        let id = next_index(self.float_lists.len())?;
        self.float_lists.push(Arc::from(v));
        Ok(crate::model::FloatListId(id))
    }
}

fn next_index(len: usize) -> VgcResult<u32> {
    Ok(u32::try_from(len).map_err(anyhow::Error::from)?)
}

/// Sink interface that markup front ends drive; implemented by every backend.
///
/// Calls form a strict, single-threaded sequence:
///
/// 1. [`init`](Self::init) exactly once,
/// 2. optionally [`document`](Self::document),
/// 3. tree calls: groups, clips, masks, leaves, gradient registrations and use references,
///    all inside an implicit root group,
/// 4. [`finish`](Self::finish).
///
/// Malformed nesting fails with [`crate::VgcError::Format`]; dangling or cyclic references
/// fail with [`crate::VgcError::Structural`]. Builders do not recover after an error.
pub trait ImageBuilder {
    /// Value produced by [`finish`](Self::finish).
    type Output;

    /// Supply the complete image, string, and float-list tables.
    fn init(&mut self, tables: &InitTables) -> VgcResult<()>;

    /// Declare document size, viewport, and tint.
    fn document(&mut self, doc: &DocumentAttrs) -> VgcResult<()>;

    /// Register a gradient; paints refer to the returned index.
    fn gradient(&mut self, gradient: &Gradient) -> VgcResult<GradientId>;

    /// Open a group.
    fn begin_group(&mut self, attrs: &GroupAttrs) -> VgcResult<()>;

    /// Close the innermost group.
    fn end_group(&mut self) -> VgcResult<()>;

    /// Clip the following siblings of the enclosing scope.
    fn clip_path(&mut self, clip: &ClipPath) -> VgcResult<()>;

    /// Open a mask; the following calls draw the mask itself.
    fn begin_mask(&mut self) -> VgcResult<()>;

    /// Switch from the mask to the content it masks.
    fn mask_content(&mut self) -> VgcResult<()>;

    /// Close the innermost mask.
    fn end_mask(&mut self) -> VgcResult<()>;

    /// Path leaf.
    fn path(&mut self, shape: &Shape<PathData>) -> VgcResult<()>;

    /// Rectangle leaf.
    fn rect(&mut self, shape: &Shape<RectGeom>) -> VgcResult<()>;

    /// Ellipse leaf.
    fn ellipse(&mut self, shape: &Shape<EllipseGeom>) -> VgcResult<()>;

    /// Polyline or polygon leaf.
    fn poly(&mut self, shape: &Shape<PolyGeom>) -> VgcResult<()>;

    /// Raster image leaf.
    fn image(&mut self, leaf: &ImageLeaf) -> VgcResult<()>;

    /// Text leaf.
    fn text(&mut self, leaf: &TextLeaf) -> VgcResult<()>;

    /// Reference a completed, exported group.
    fn use_ref(&mut self, use_ref: &UseRef) -> VgcResult<()>;

    /// Validate that every scope is closed and produce the output.
    fn finish(self) -> VgcResult<Self::Output>
    where
        Self: Sized;
}

#[cfg(test)]
#[path = "../../tests/unit/builder/protocol.rs"]
mod tests;
