use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::cache::lru::LruList;
use crate::cache::source::ImageSource;
use crate::foundation::error::{VgcError, VgcResult};
use crate::image::ScalableImage;

/// Settled result of a load. Failures are shared so every holder sees the same error.
pub type LoadResult = Result<ScalableImage, Arc<VgcError>>;

/// Cloneable, possibly still pending image. All clones observe one producer run.
pub type ImageHandle = Shared<BoxFuture<'static, LoadResult>>;

/// Image cache tunables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ImageCacheOpts {
    /// Maximum number of unreferenced entries retained for reuse.
    pub capacity: usize,
}

impl Default for ImageCacheOpts {
    fn default() -> Self {
        Self { capacity: 32 }
    }
}

struct Entry {
    handle: ImageHandle,
    refs: usize,
    /// LRU slot while unreferenced.
    slot: Option<usize>,
    generation: u64,
}

/// Canonicalizing, reference-counted cache over asynchronously produced images.
///
/// Referenced entries are never evicted. Entries whose count drops to zero join a recency list
/// bounded by [`capacity`](Self::capacity) and are evicted least recently used first. A failed
/// load stays cached until [`force_reload`](Self::force_reload).
///
/// Bookkeeping is synchronous and must be driven from one context; only the returned handles
/// are awaited.
pub struct ImageCache<S: ImageSource> {
    opts: ImageCacheOpts,
    entries: HashMap<S, Entry>,
    idle: LruList<S>,
}

impl<S: ImageSource> fmt::Debug for ImageCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCache")
            .field("capacity", &self.opts.capacity)
            .field("entries", &self.entries.len())
            .field("idle", &self.idle.len())
            .finish()
    }
}

impl<S: ImageSource> Default for ImageCache<S> {
    fn default() -> Self {
        Self::new(ImageCacheOpts::default())
    }
}

impl<S: ImageSource> ImageCache<S> {
    /// Empty cache.
    pub fn new(opts: ImageCacheOpts) -> Self {
        Self {
            opts,
            entries: HashMap::new(),
            idle: LruList::new(),
        }
    }

    fn start(source: &S) -> ImageHandle {
        source.load().map(|r| r.map_err(Arc::new)).boxed().shared()
    }

    /// Take a reference to `source`'s image, starting its producer if the entry is new.
    pub fn add_reference(&mut self, source: &S) -> ImageHandle {
        if let Some(entry) = self.entries.get_mut(source) {
            if let Some(slot) = entry.slot.take() {
                self.idle.remove(slot);
            }
            entry.refs += 1;
            return entry.handle.clone();
        }

        tracing::debug!(?source, "image cache entry created");
        let handle = Self::start(source);
        self.entries.insert(
            source.clone(),
            Entry {
                handle: handle.clone(),
                refs: 1,
                slot: None,
                generation: 0,
            },
        );
        handle
    }

    /// Release one reference. At zero the entry becomes most recently used and eviction runs.
    pub fn remove_reference(&mut self, source: &S) -> VgcResult<()> {
        let entry = self.entries.get_mut(source).ok_or_else(|| {
            VgcError::cache_usage(format!("remove_reference on unknown source {source:?}"))
        })?;
        if entry.refs == 0 {
            return Err(VgcError::cache_usage(format!(
                "remove_reference on unreferenced source {source:?}"
            )));
        }
        entry.refs -= 1;
        if entry.refs == 0 {
            entry.slot = Some(self.idle.push_back(source.clone()));
            self.evict();
        }
        Ok(())
    }

    /// Drop the cached result and start a fresh load, keeping the count and recency position.
    ///
    /// Holders of the previous handle keep observing the previous load.
    pub fn force_reload(&mut self, source: &S) -> VgcResult<ImageHandle> {
        let entry = self.entries.get_mut(source).ok_or_else(|| {
            VgcError::cache_usage(format!("force_reload on unknown source {source:?}"))
        })?;
        entry.generation += 1;
        entry.handle = Self::start(source);
        tracing::debug!(?source, generation = entry.generation, "image cache entry reloaded");
        Ok(entry.handle.clone())
    }

    /// Current handle without taking a reference.
    pub fn peek(&self, source: &S) -> Option<ImageHandle> {
        self.entries.get(source).map(|e| e.handle.clone())
    }

    /// Maximum number of unreferenced entries.
    pub fn capacity(&self) -> usize {
        self.opts.capacity
    }

    /// Change the capacity, evicting immediately if it shrank.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.opts.capacity = capacity;
        self.evict();
    }

    /// Number of entries, referenced or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of unreferenced entries awaiting eviction.
    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    /// Return `true` when `source` has an entry.
    pub fn contains(&self, source: &S) -> bool {
        self.entries.contains_key(source)
    }

    /// Reference count of `source`, or `None` when absent.
    pub fn ref_count(&self, source: &S) -> Option<usize> {
        self.entries.get(source).map(|e| e.refs)
    }

    /// Unreferenced sources from next-to-evict to most recently released.
    pub fn idle_sources(&self) -> impl Iterator<Item = &S> + '_ {
        self.idle.iter()
    }

    fn evict(&mut self) {
        while self.idle.len() > self.opts.capacity {
            let Some(source) = self.idle.pop_front() else {
                break;
            };
            self.entries.remove(&source);
            tracing::debug!(?source, "image cache entry evicted");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/cache.rs"]
mod tests;
