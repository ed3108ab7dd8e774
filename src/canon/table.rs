use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::foundation::error::VgcResult;
use crate::foundation::hash::{KeyWriter, StructuralKey};

/// Scratch buffers for structural key comparison; owned by the caller so lookups can run on
/// a shared (`&self`) table.
#[derive(Debug, Default)]
pub(crate) struct KeyScratch {
    key: KeyWriter,
    candidate_key: KeyWriter,
}

impl KeyScratch {
    /// Write the key of `value` and return its hash.
    pub(crate) fn hash_of<T: StructuralKey + ?Sized>(&mut self, value: &T) -> u64 {
        self.key.clear();
        value.write_key(&mut self.key);
        self.key.digest()
    }

    /// Compare `candidate` against the key last written by [`Self::hash_of`].
    pub(crate) fn matches<T: StructuralKey + ?Sized>(&mut self, candidate: &T) -> bool {
        self.candidate_key.clear();
        candidate.write_key(&mut self.candidate_key);
        self.candidate_key.as_bytes() == self.key.as_bytes()
    }
}

/// Outcome of a lookup: the key hash plus the index of a structurally equal entry, if any.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Lookup {
    pub(crate) hash: u64,
    pub(crate) hit: Option<u32>,
}

/// Append-only table of canonical values.
///
/// Equality is byte equality of the [`StructuralKey`]; the hash only picks a bucket. The first
/// occurrence of a value gets the next index and indices are never reused.
#[derive(Debug)]
pub(crate) struct CanonicalTable<T: ?Sized> {
    entries: Vec<Arc<T>>,
    buckets: HashMap<u64, SmallVec<[u32; 1]>>,
}

impl<T: ?Sized> Clone for CanonicalTable<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            buckets: self.buckets.clone(),
        }
    }
}

impl<T: ?Sized> Default for CanonicalTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            buckets: HashMap::new(),
        }
    }
}

impl<T: StructuralKey + ?Sized> CanonicalTable<T> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn find(&self, value: &T, scratch: &mut KeyScratch) -> Lookup {
        let hash = scratch.hash_of(value);
        let hit = self.buckets.get(&hash).and_then(|bucket| {
            bucket
                .iter()
                .copied()
                .find(|&i| scratch.matches(&*self.entries[i as usize]))
        });
        Lookup { hash, hit }
    }

    /// Append `value` under `hash` without looking for an equal entry.
    pub(crate) fn push(&mut self, hash: u64, value: Arc<T>) -> VgcResult<u32> {
        let index = u32::try_from(self.entries.len()).map_err(anyhow::Error::from)?;
        self.entries.push(value);
        self.buckets.entry(hash).or_default().push(index);
        Ok(index)
    }

    /// Append a value read back from a persisted table, keeping its position.
    pub(crate) fn push_loaded(&mut self, value: Arc<T>, scratch: &mut KeyScratch) -> VgcResult<u32> {
        let hash = scratch.hash_of(&*value);
        self.push(hash, value)
    }

    /// Return the index of `value`, inserting `make()` when no equal entry exists.
    pub(crate) fn intern_with(
        &mut self,
        value: &T,
        scratch: &mut KeyScratch,
        make: impl FnOnce() -> Arc<T>,
    ) -> VgcResult<u32> {
        let found = self.find(value, scratch);
        match found.hit {
            Some(i) => Ok(i),
            None => self.push(found.hash, make()),
        }
    }

    pub(crate) fn get(&self, index: u32) -> Option<&Arc<T>> {
        self.entries.get(index as usize)
    }

    pub(crate) fn entries(&self) -> &[Arc<T>] {
        &self.entries
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/canon/table.rs"]
mod tests;
