//! Shared memoization table for canonical stamps.
//!
//! One cache is created when the compiler starts and handed to every
//! [`StampFactory`](super::StampFactory) through an `Arc`. Reads take a
//! shard read lock only; a lost insertion race keeps the first value, and
//! both racers return structurally equal stamps.

use crate::constant::Constant;
use crate::kind::MachineKind;
use crate::meta::TypeRef;
use crate::stamp::Stamp;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// Key of a memoized object stamp: type, exactness, non-null.
pub(crate) type ObjectKey = (TypeRef, bool, bool);

/// Hit and miss counters of a [`StampCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub struct StampCache {
    /// Unrestricted stamp per kind, indexed like [`MachineKind::ALL`].
    unrestricted: OnceCell<Vec<Stamp>>,
    constants: DashMap<Constant, Stamp>,
    objects: DashMap<ObjectKey, Stamp>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl StampCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unrestricted stamp of `kind`. Words get the default width.
    pub fn unrestricted(&self, kind: MachineKind) -> Stamp {
        let table = self.unrestricted.get_or_init(|| {
            MachineKind::ALL
                .iter()
                .map(|k| Stamp::unrestricted_for(*k))
                .collect()
        });
        table
            .get(kind.index())
            .cloned()
            .unwrap_or_else(|| Stamp::unrestricted_for(kind))
    }

    pub(crate) fn constant(&self, constant: &Constant, build: impl FnOnce() -> Stamp) -> Stamp {
        self.memoize(&self.constants, constant, build)
    }

    pub(crate) fn object(&self, key: &ObjectKey, build: impl FnOnce() -> Stamp) -> Stamp {
        self.memoize(&self.objects, key, build)
    }

    fn memoize<K: Eq + Hash + Clone>(
        &self,
        map: &DashMap<K, Stamp>,
        key: &K,
        build: impl FnOnce() -> Stamp,
    ) -> Stamp {
        // fast path: shard read lock only
        if let Some(hit) = map.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return hit.value().clone();
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        map.entry(key.clone()).or_insert_with(build).value().clone()
    }

    /// Number of memoized constant and object stamps.
    pub fn len(&self) -> usize {
        self.constants.len() + self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drops every memoized stamp and resets the counters. The unrestricted
    /// table is immutable and stays.
    pub fn clear(&self) {
        self.constants.clear();
        self.objects.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
