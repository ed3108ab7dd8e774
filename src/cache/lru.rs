//! Intrusive recency list over an arena of slots.
//!
//! Slot 0 is the sentinel; its `next` is the least recently used entry and its `prev` the most
//! recently used one. Links are slot indices, so unlinking is two index writes.

const HEAD: usize = 0;

#[derive(Debug)]
struct Slot<K> {
    prev: usize,
    next: usize,
    key: Option<K>,
}

/// Doubly linked recency list; the front is evicted first.
#[derive(Debug)]
pub(crate) struct LruList<K> {
    slots: Vec<Slot<K>>,
    free: Vec<usize>,
    len: usize,
}

impl<K> Default for LruList<K> {
    fn default() -> Self {
        Self {
            slots: vec![Slot {
                prev: HEAD,
                next: HEAD,
                key: None,
            }],
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<K> LruList<K> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Link `key` as most recently used and return its slot.
    pub(crate) fn push_back(&mut self, key: K) -> usize {
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx].key = Some(key);
                idx
            }
            None => {
                self.slots.push(Slot {
                    prev: HEAD,
                    next: HEAD,
                    key: Some(key),
                });
                self.slots.len() - 1
            }
        };
        let tail = self.slots[HEAD].prev;
        self.slots[idx].prev = tail;
        self.slots[idx].next = HEAD;
        self.slots[tail].next = idx;
        self.slots[HEAD].prev = idx;
        self.len += 1;
        idx
    }

    /// Unlink a slot and return its key; `None` for the sentinel or a free slot.
    pub(crate) fn remove(&mut self, idx: usize) -> Option<K> {
        if idx == HEAD {
            return None;
        }
        let slot = self.slots.get_mut(idx)?;
        let key = slot.key.take()?;
        let (prev, next) = (slot.prev, slot.next);
        self.slots[prev].next = next;
        self.slots[next].prev = prev;
        self.free.push(idx);
        self.len -= 1;
        Some(key)
    }

    pub(crate) fn pop_front(&mut self) -> Option<K> {
        let first = self.slots[HEAD].next;
        self.remove(first)
    }

    /// Keys from least to most recently used.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        let mut idx = self.slots[HEAD].next;
        std::iter::from_fn(move || {
            let key = self.slots[idx].key.as_ref()?;
            idx = self.slots[idx].next;
            Some(key)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/lru.rs"]
mod tests;
