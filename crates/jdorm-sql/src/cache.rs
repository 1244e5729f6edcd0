use crate::{Shape, StatementKind, Template};

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use jdorm_core::Result;
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Identifies a cached template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateKey {
    pub kind: StatementKind,
    pub entity: String,
    pub shape: Shape,
}

type Entries = IndexMap<TemplateKey, Arc<Template>>;

/// Bounded, thread-safe cache of statement templates.
///
/// Lookups read a published copy of the table without taking a lock.
/// Inserts copy the table, so they are expected to stop once every query
/// shape has been seen. When full, the oldest entry is evicted. A capacity
/// of zero disables caching.
#[derive(Debug)]
pub struct TemplateCache {
    capacity: usize,
    entries: ArcSwap<Entries>,
    write: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TemplateCache {
    pub fn new(capacity: usize) -> TemplateCache {
        TemplateCache {
            capacity,
            entries: ArcSwap::from_pointee(IndexMap::new()),
            write: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached template for `key`, building it with `build` on a miss.
    pub fn get_or_insert_with(
        &self,
        key: TemplateKey,
        build: impl FnOnce() -> Result<Template>,
    ) -> Result<Arc<Template>> {
        if let Some(template) = self.entries.load().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(template.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let template = Arc::new(build()?);

        if self.capacity == 0 {
            return Ok(template);
        }

        let _write = self.write.lock();
        let current = self.entries.load_full();

        // Another task may have built the same template meanwhile.
        if let Some(existing) = current.get(&key) {
            return Ok(existing.clone());
        }

        let mut next = Entries::clone(&current);
        while next.len() >= self.capacity {
            if let Some((evicted, _)) = next.shift_remove_index(0) {
                tracing::trace!(entity = %evicted.entity, kind = ?evicted.kind, "evicted statement template");
            }
        }

        next.insert(key, template.clone());
        self.entries.store(Arc::new(next));
        Ok(template)
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let _write = self.write.lock();
        self.entries.store(Arc::default());
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}
