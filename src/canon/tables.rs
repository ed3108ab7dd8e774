use std::sync::Arc;

use crate::canon::table::{CanonicalTable, KeyScratch};
use crate::foundation::core::Affine;
use crate::foundation::error::VgcResult;
use crate::foundation::hash::StructuralKey;
use crate::model::image::ImageData;
use crate::model::path::PathData;
use crate::model::primitive::missing_index;

/// The five canonical tables of one compact image.
#[derive(Clone, Debug, Default)]
pub(crate) struct TableSet {
    pub(crate) images: CanonicalTable<ImageData>,
    pub(crate) strings: CanonicalTable<str>,
    pub(crate) float_lists: CanonicalTable<[f64]>,
    pub(crate) transforms: CanonicalTable<Affine>,
    pub(crate) paths: CanonicalTable<PathData>,
}

impl TableSet {
    pub(crate) fn image(&self, index: u32) -> VgcResult<Arc<ImageData>> {
        lookup(&self.images, "image", index)
    }

    pub(crate) fn string(&self, index: u32) -> VgcResult<Arc<str>> {
        lookup(&self.strings, "string", index)
    }

    pub(crate) fn float_list(&self, index: u32) -> VgcResult<Arc<[f64]>> {
        lookup(&self.float_lists, "float list", index)
    }

    pub(crate) fn transform(&self, index: u32) -> VgcResult<Affine> {
        lookup(&self.transforms, "transform", index).map(|a| *a)
    }

    pub(crate) fn path(&self, index: u32) -> VgcResult<Arc<PathData>> {
        lookup(&self.paths, "path", index)
    }

    /// Entry counts in table order: images, strings, float lists, transforms, paths.
    pub(crate) fn counts(&self) -> [usize; 5] {
        [
            self.images.len(),
            self.strings.len(),
            self.float_lists.len(),
            self.transforms.len(),
            self.paths.len(),
        ]
    }
}

fn lookup<T: StructuralKey + ?Sized>(
    table: &CanonicalTable<T>,
    kind: &str,
    index: u32,
) -> VgcResult<Arc<T>> {
    table
        .get(index)
        .cloned()
        .ok_or_else(|| missing_index(kind, index))
}

/// Interning front for a shared [`TableSet`].
///
/// Lookups that hit leave the `Arc` untouched, so an interner seeded with another image's
/// tables keeps sharing them until a genuinely new value arrives.
#[derive(Debug, Default)]
pub(crate) struct TableInterner {
    tables: Arc<TableSet>,
    scratch: KeyScratch,
}

impl TableInterner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn seeded(tables: Arc<TableSet>) -> Self {
        Self {
            tables,
            scratch: KeyScratch::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn tables(&self) -> &TableSet {
        &self.tables
    }

    pub(crate) fn snapshot(&self) -> Arc<TableSet> {
        Arc::clone(&self.tables)
    }

    pub(crate) fn image(&mut self, v: &Arc<ImageData>) -> VgcResult<u32> {
        intern(
            &mut self.tables,
            &mut self.scratch,
            |t| &t.images,
            |t| &mut t.images,
            &**v,
            || Arc::clone(v),
        )
    }

    pub(crate) fn string(&mut self, v: &Arc<str>) -> VgcResult<u32> {
        intern(
            &mut self.tables,
            &mut self.scratch,
            |t| &t.strings,
            |t| &mut t.strings,
            &**v,
            || Arc::clone(v),
        )
    }

    pub(crate) fn float_list(&mut self, v: &[f64]) -> VgcResult<u32> {
        intern(
            &mut self.tables,
            &mut self.scratch,
            |t| &t.float_lists,
            |t| &mut t.float_lists,
            v,
            || Arc::from(v),
        )
    }

    pub(crate) fn transform(&mut self, v: &Affine) -> VgcResult<u32> {
        intern(
            &mut self.tables,
            &mut self.scratch,
            |t| &t.transforms,
            |t| &mut t.transforms,
            v,
            || Arc::new(*v),
        )
    }

    pub(crate) fn path(&mut self, v: &PathData) -> VgcResult<u32> {
        intern(
            &mut self.tables,
            &mut self.scratch,
            |t| &t.paths,
            |t| &mut t.paths,
            v,
            || Arc::new(v.clone()),
        )
    }
}

fn intern<T: StructuralKey + ?Sized>(
    tables: &mut Arc<TableSet>,
    scratch: &mut KeyScratch,
    pick: impl Fn(&TableSet) -> &CanonicalTable<T>,
    pick_mut: impl Fn(&mut TableSet) -> &mut CanonicalTable<T>,
    value: &T,
    make: impl FnOnce() -> Arc<T>,
) -> VgcResult<u32> {
    let found = pick(&**tables).find(value, scratch);
    match found.hit {
        Some(i) => Ok(i),
        None => pick_mut(Arc::make_mut(tables)).push(found.hash, make()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canon/tables.rs"]
mod tests;
