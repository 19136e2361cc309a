//! Cursors: pinned-guard traversal over the table chain.
//!
//! A cursor is not a snapshot. It pins whatever it currently points at,
//! walks generations old-to-new, and skips frozen buckets (their entries
//! are visited in the successor generation). Entries inserted after the
//! traversal started may or may not be visited; entries removed during it
//! may still be visited once. Within a quiescent table no entry is visited
//! twice, because erase never moves surviving entries between slots.

use crate::accessor::Accessor;
use crate::bucket::{BUCKET_SLOTS, Bucket, Entry, FROZEN_BIT};
use crate::map::VyukovMap;
use crate::table::Table;
use core::ptr;
use core::sync::atomic::Ordering;
use petek::Reclaim;

/// A pinned position inside the map. `valid()` is false at the end
/// position.
pub struct Cursor<'m, K: 'static, V: 'static, S, R: Reclaim> {
    pub(crate) map: &'m VyukovMap<K, V, S, R>,
    pub(crate) guard: R::Guard,
    pub(crate) table: *const Table<K, V>,
    /// Next primary bucket index to enter once the current chain runs out.
    pub(crate) bucket_idx: usize,
    /// Current bucket within the chain (primary or extension).
    pub(crate) chain: *const Bucket<K, V>,
    pub(crate) slot_idx: usize,
    pub(crate) entry: *const Entry<K, V>,
}

impl<'m, K: 'static, V: 'static, S, R: Reclaim> Cursor<'m, K, V, S, R> {
    /// Whether the cursor points at an entry.
    #[inline]
    pub fn valid(&self) -> bool {
        !self.entry.is_null()
    }

    /// Key of the current entry. Panics at the end position.
    pub fn key(&self) -> &K {
        assert!(self.valid(), "cursor is at end");
        // SAFETY: the entry was loaded under our guard and keys are
        // immutable for the entry's lifetime.
        unsafe { &(*self.entry).key }
    }

    /// Value of the current entry. Panics at the end position.
    pub fn value(&self) -> &V {
        assert!(self.valid(), "cursor is at end");
        // SAFETY: as `key`.
        unsafe { &(*self.entry).value }
    }

    /// An accessor pinning the current entry independently of the cursor.
    pub fn accessor(&self) -> Accessor<'m, K, V, R> {
        assert!(self.valid(), "cursor is at end");
        // SAFETY: the entry is pinned by our guard and the fresh region is
        // entered while that guard is live.
        unsafe { Accessor::pinned(self.entry, R::enter()) }
    }

    /// Advance to the next occupied slot.
    pub fn advance(&mut self) {
        self.slot_idx += 1;
        self.seek();
    }

    /// From the current coordinates, settle on the next occupied slot:
    /// remaining slots of the chain bucket, the rest of the chain, the
    /// next unfrozen primary bucket, then the next generation.
    pub(crate) fn seek(&mut self) {
        'tables: while !self.table.is_null() {
            // SAFETY: tables in the chain are pinned by our guard; the
            // root was loaded under it.
            let table = unsafe { &*self.table };
            loop {
                while !self.chain.is_null() {
                    // SAFETY: chain buckets live as long as their table.
                    let chain = unsafe { &*self.chain };
                    while self.slot_idx < BUCKET_SLOTS {
                        let entry = chain.slots[self.slot_idx].load(Ordering::Acquire, &self.guard);
                        if !entry.is_null() {
                            self.entry = entry.as_raw();
                            return;
                        }
                        self.slot_idx += 1;
                    }
                    self.chain = chain.next.load(Ordering::Acquire, &self.guard).as_raw();
                    self.slot_idx = 0;
                }
                if self.bucket_idx >= table.buckets.len() {
                    self.table = table.next.load(Ordering::Acquire, &self.guard).as_raw();
                    self.bucket_idx = 0;
                    self.chain = ptr::null();
                    self.slot_idx = 0;
                    continue 'tables;
                }
                let bucket = &table.buckets[self.bucket_idx];
                self.bucket_idx += 1;
                // Frozen buckets migrated out; their entries are visited in
                // the successor generation.
                if bucket.version.load(Ordering::Acquire) & FROZEN_BIT != 0 {
                    continue;
                }
                self.chain = bucket as *const Bucket<K, V>;
                self.slot_idx = 0;
            }
        }
        self.entry = ptr::null();
    }
}

/// Forward iterator yielding pinned [`Accessor`]s.
pub struct Iter<'m, K: 'static, V: 'static, S, R: Reclaim> {
    pub(crate) cursor: Cursor<'m, K, V, S, R>,
}

impl<'m, K: 'static, V: 'static, S, R: Reclaim> Iterator for Iter<'m, K, V, S, R> {
    type Item = Accessor<'m, K, V, R>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.cursor.valid() {
            return None;
        }
        let item = self.cursor.accessor();
        self.cursor.advance();
        Some(item)
    }
}
