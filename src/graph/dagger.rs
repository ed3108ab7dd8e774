//! Construction-time identity maps ("daggers") realizing node sharing.
//!
//! Each map goes from a structural key to the one shared instance built for it. A build starts
//! from an optional seed (the maps of a previous build) and records every value it touches in
//! fresh maps, so the snapshot it hands back holds exactly the values of the latest build.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::canon::table::KeyScratch;
use crate::foundation::core::Affine;
use crate::foundation::hash::StructuralKey;
use crate::graph::node::Node;
use crate::model::image::ImageData;
use crate::model::paint::PaintAttrs;
use crate::model::path::PathData;
use crate::model::shape::PolyGeom;

type Buckets<T> = HashMap<u64, SmallVec<[Arc<T>; 1]>>;

fn find_in<T: StructuralKey + ?Sized>(
    buckets: &Buckets<T>,
    hash: u64,
    scratch: &mut KeyScratch,
) -> Option<Arc<T>> {
    buckets
        .get(&hash)?
        .iter()
        .find(|c| scratch.matches(&***c))
        .cloned()
}

pub(crate) struct Dagger<T: ?Sized> {
    seed: Arc<Buckets<T>>,
    fresh: Buckets<T>,
}

impl<T: StructuralKey + ?Sized> Dagger<T> {
    fn new(seed: Arc<Buckets<T>>) -> Self {
        Self {
            seed,
            fresh: HashMap::new(),
        }
    }

    /// Shared instance equal to `value`, if this build or the seed has one.
    fn find(&mut self, value: &T, scratch: &mut KeyScratch) -> (u64, Option<Arc<T>>) {
        let hash = scratch.hash_of(value);
        if let Some(hit) = find_in(&self.fresh, hash, scratch) {
            return (hash, Some(hit));
        }
        let reused = find_in(&*self.seed, hash, scratch);
        if let Some(hit) = &reused {
            self.fresh.entry(hash).or_default().push(Arc::clone(hit));
        }
        (hash, reused)
    }

    fn insert(&mut self, hash: u64, value: Arc<T>) -> Arc<T> {
        self.fresh.entry(hash).or_default().push(Arc::clone(&value));
        value
    }

    fn intern_with(
        &mut self,
        value: &T,
        scratch: &mut KeyScratch,
        make: impl FnOnce() -> Arc<T>,
    ) -> Arc<T> {
        match self.find(value, scratch) {
            (_, Some(hit)) => hit,
            (hash, None) => self.insert(hash, make()),
        }
    }

    fn freeze(self) -> Arc<Buckets<T>> {
        Arc::new(self.fresh)
    }
}

impl<T: StructuralKey> Dagger<T> {
    fn intern_owned(&mut self, value: T, scratch: &mut KeyScratch) -> Arc<T> {
        match self.find(&value, scratch) {
            (_, Some(hit)) => hit,
            (hash, None) => self.insert(hash, Arc::new(value)),
        }
    }
}

fn count<T: ?Sized>(b: &Buckets<T>) -> usize {
    b.values().map(SmallVec::len).sum()
}

/// Snapshot of the identity maps of one graph build.
///
/// Pass it to [`crate::graph::GraphBuilder::with_seed`] so a rebuild of a modified document
/// reuses every unchanged value and node instance.
#[derive(Clone, Default)]
pub struct NodeCache {
    images: Arc<Buckets<ImageData>>,
    strings: Arc<Buckets<str>>,
    float_lists: Arc<Buckets<[f64]>>,
    transforms: Arc<Buckets<Affine>>,
    paths: Arc<Buckets<PathData>>,
    polys: Arc<Buckets<PolyGeom>>,
    paints: Arc<Buckets<PaintAttrs>>,
    nodes: Arc<Buckets<Node>>,
}

impl NodeCache {
    /// Number of distinct nodes held.
    pub fn node_count(&self) -> usize {
        count(&self.nodes)
    }

    /// Number of distinct path geometries held.
    pub fn path_count(&self) -> usize {
        count(&self.paths)
    }

    /// Number of distinct transforms held.
    pub fn transform_count(&self) -> usize {
        count(&self.transforms)
    }

    /// Return `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.paths.is_empty() && self.strings.is_empty()
    }
}

impl fmt::Debug for NodeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCache")
            .field("nodes", &self.node_count())
            .field("paths", &self.path_count())
            .field("transforms", &self.transform_count())
            .finish_non_exhaustive()
    }
}

/// All identity maps of one build in progress.
pub(crate) struct Daggers {
    images: Dagger<ImageData>,
    strings: Dagger<str>,
    float_lists: Dagger<[f64]>,
    transforms: Dagger<Affine>,
    paths: Dagger<PathData>,
    polys: Dagger<PolyGeom>,
    paints: Dagger<PaintAttrs>,
    nodes: Dagger<Node>,
    scratch: KeyScratch,
}

impl Daggers {
    pub(crate) fn seeded(seed: &NodeCache) -> Self {
        Self {
            images: Dagger::new(Arc::clone(&seed.images)),
            strings: Dagger::new(Arc::clone(&seed.strings)),
            float_lists: Dagger::new(Arc::clone(&seed.float_lists)),
            transforms: Dagger::new(Arc::clone(&seed.transforms)),
            paths: Dagger::new(Arc::clone(&seed.paths)),
            polys: Dagger::new(Arc::clone(&seed.polys)),
            paints: Dagger::new(Arc::clone(&seed.paints)),
            nodes: Dagger::new(Arc::clone(&seed.nodes)),
            scratch: KeyScratch::default(),
        }
    }

    pub(crate) fn freeze(self) -> NodeCache {
        NodeCache {
            images: self.images.freeze(),
            strings: self.strings.freeze(),
            float_lists: self.float_lists.freeze(),
            transforms: self.transforms.freeze(),
            paths: self.paths.freeze(),
            polys: self.polys.freeze(),
            paints: self.paints.freeze(),
            nodes: self.nodes.freeze(),
        }
    }

    pub(crate) fn image(&mut self, v: &Arc<ImageData>) -> Arc<ImageData> {
        self.images
            .intern_with(&**v, &mut self.scratch, || Arc::clone(v))
    }

    pub(crate) fn string(&mut self, v: &Arc<str>) -> Arc<str> {
        self.strings
            .intern_with(&**v, &mut self.scratch, || Arc::clone(v))
    }

    pub(crate) fn float_list(&mut self, v: &Arc<[f64]>) -> Arc<[f64]> {
        self.float_lists
            .intern_with(&**v, &mut self.scratch, || Arc::clone(v))
    }

    pub(crate) fn transform(&mut self, v: Option<Affine>) -> Option<Arc<Affine>> {
        v.map(|a| self.transforms.intern_owned(a, &mut self.scratch))
    }

    pub(crate) fn path(&mut self, v: &PathData) -> Arc<PathData> {
        self.paths
            .intern_with(v, &mut self.scratch, || Arc::new(v.clone()))
    }

    pub(crate) fn poly(&mut self, v: &PolyGeom) -> Arc<PolyGeom> {
        self.polys
            .intern_with(v, &mut self.scratch, || Arc::new(v.clone()))
    }

    pub(crate) fn paint(&mut self, v: &PaintAttrs) -> Arc<PaintAttrs> {
        self.paints.intern_owned(*v, &mut self.scratch)
    }

    pub(crate) fn node(&mut self, node: Node) -> Arc<Node> {
        self.nodes.intern_owned(node, &mut self.scratch)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/dagger.rs"]
mod tests;
