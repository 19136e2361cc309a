//! Table generations.

use crate::bucket::{BUCKET_SLOTS, Bucket};
use core::sync::atomic::AtomicUsize;
use petek::{Atomic, Reclaimable, Retired};

/// One table generation: retirement header, routing mask, growth
/// bookkeeping, and the primary bucket array.
///
/// Capacity is a power of two. During growth `next` points at the
/// double-capacity successor; `scan_cursor` hands out conscription targets
/// and `frozen` counts migrated buckets so the writer that freezes the
/// last one can promote the root.
#[repr(C)]
pub(crate) struct Table<K, V> {
    pub(crate) link: Retired,
    pub(crate) mask: u64,
    /// Entry count beyond which an insert starts a new generation.
    pub(crate) fill_limit: usize,
    pub(crate) scan_cursor: AtomicUsize,
    pub(crate) frozen: AtomicUsize,
    pub(crate) next: Atomic<Table<K, V>>,
    pub(crate) buckets: Box<[Bucket<K, V>]>,
}

unsafe impl<K: 'static, V: 'static> Reclaimable for Table<K, V> {}

impl<K, V> Table<K, V> {
    pub(crate) fn boxed(bucket_count: usize, max_load: f64) -> Box<Self> {
        let bucket_count = bucket_count.next_power_of_two().max(1);
        let fill_limit = ((bucket_count * BUCKET_SLOTS) as f64 * max_load) as usize;
        Box::new(Self {
            link: Retired::new(),
            mask: bucket_count as u64 - 1,
            fill_limit,
            scan_cursor: AtomicUsize::new(0),
            frozen: AtomicUsize::new(0),
            next: Atomic::null(),
            buckets: (0..bucket_count).map(|_| Bucket::new()).collect(),
        })
    }

    #[inline]
    pub(crate) fn bucket_index(&self, hash: u64) -> usize {
        (hash & self.mask) as usize
    }

    #[inline]
    pub(crate) fn bucket_for(&self, hash: u64) -> &Bucket<K, V> {
        // The mask keeps the index in bounds.
        unsafe { self.buckets.get_unchecked(self.bucket_index(hash)) }
    }
}

impl<K, V> Drop for Table<K, V> {
    fn drop(&mut self) {
        // Extension chains belong to the table. Entries do not: they are
        // either shared with the successor generation or freed by the map.
        for bucket in self.buckets.iter_mut() {
            let mut ext = bucket.next.load_exclusive();
            while !ext.is_null() {
                let mut boxed = unsafe { Box::from_raw(ext) };
                ext = boxed.next.load_exclusive();
                drop(boxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_rounds_up_to_a_power_of_two() {
        let table: Box<Table<u32, u32>> = Table::boxed(12, 0.75);
        assert_eq!(table.buckets.len(), 16);
        assert_eq!(table.mask, 15);
        assert_eq!(table.fill_limit, 48);
    }
}
