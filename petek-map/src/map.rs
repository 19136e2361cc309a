//! The Vyukov-style concurrent hash map.

use crate::accessor::Accessor;
use crate::bucket::{BUCKET_SLOTS, Backoff, Bucket, BucketGuard, Entry, FROZEN_BIT, LOCK_BIT, LockOutcome};
use crate::iter::{Cursor, Iter};
use crate::table::Table;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::marker::PhantomData;
use core::ptr;
use core::sync::atomic::{AtomicUsize, Ordering};
use foldhash::fast::FixedState;
use petek::{Atomic, Epoch, Reclaim, Shared};

/// Default number of primary buckets.
const DEFAULT_CAPACITY: usize = 8;

/// Default growth threshold as a fraction of total slots.
const DEFAULT_MAX_LOAD: f64 = 0.75;

/// Optimistic read attempts before falling back to the bucket lock.
const READ_SPIN_LIMIT: u32 = 64;

/// A concurrent hash map with per-bucket locking, lock-free optimistic
/// reads, and cooperative growth.
///
/// Writers serialize per bucket through a version word; readers validate a
/// version snapshot around their scan and retry on mutation. When the
/// entry count crosses the load threshold a writer links a double-capacity
/// successor table, and subsequent writers migrate buckets into it as a
/// side effect of their own operations. Keys live in whichever generation
/// last accepted them; readers follow frozen buckets forward.
///
/// Unlinked entries and superseded tables are destroyed through the
/// reclaimer `R`, so lock-free readers never observe freed memory.
pub struct VyukovMap<K: 'static, V: 'static, S = FixedState, R: Reclaim = Epoch> {
    table: Atomic<Table<K, V>>,
    count: AtomicUsize,
    max_load: f64,
    hasher: S,
    _reclaim: PhantomData<R>,
}

// SAFETY: all shared state is synchronized through atomics and bucket
// locks; entries move between threads (Send) and are read concurrently
// (Sync).
unsafe impl<K: Send, V: Send, S: Send, R: Reclaim> Send for VyukovMap<K, V, S, R> {}
unsafe impl<K: Send + Sync, V: Send + Sync, S: Sync, R: Reclaim> Sync for VyukovMap<K, V, S, R> {}

/// Where `locate` found an entry; also the seed for a cursor.
struct Position<K: 'static, V: 'static> {
    table: *const Table<K, V>,
    bucket_idx: usize,
    chain: *const Bucket<K, V>,
    slot_idx: usize,
    entry: *const Entry<K, V>,
}

/// A locked, unfrozen bucket in the freshest generation for some hash.
struct WriteSlot<'g, K: 'static, V: 'static> {
    table: &'g Table<K, V>,
    lock: BucketGuard<'g, K, V>,
}

impl<K, V> VyukovMap<K, V>
where
    K: Hash + Eq + 'static,
    V: 'static,
{
    /// Creates an empty map with the default capacity and hasher.
    pub fn new() -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, FixedState::default())
    }

    /// Creates an empty map with at least `capacity` primary buckets
    /// (rounded up to a power of two).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, FixedState::default())
    }
}

impl<K, V> Default for VyukovMap<K, V>
where
    K: Hash + Eq + 'static,
    V: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, R> VyukovMap<K, V, S, R>
where
    K: Hash + Eq + 'static,
    V: 'static,
    S: BuildHasher,
    R: Reclaim,
{
    /// Creates an empty map with a custom hasher.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    /// Creates an empty map with a custom capacity and hasher.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        let table = Table::boxed(capacity.max(1), DEFAULT_MAX_LOAD);
        Self {
            table: Atomic::new(Box::into_raw(table)),
            count: AtomicUsize::new(0),
            max_load: DEFAULT_MAX_LOAD,
            hasher,
            _reclaim: PhantomData,
        }
    }

    /// Replaces the growth threshold fraction, clamped to (0, 1].
    pub fn max_load_factor(mut self, max_load: f64) -> Self {
        let max_load = if max_load > 0.0 {
            max_load.min(1.0)
        } else {
            DEFAULT_MAX_LOAD
        };
        self.max_load = max_load;
        let root = self.table.load_exclusive();
        // Exclusive access: the map has not been shared yet.
        let root = unsafe { &mut *root };
        root.fill_limit = ((root.buckets.len() * BUCKET_SLOTS) as f64 * max_load) as usize;
        self
    }

    /// Approximate number of entries.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Whether the map is (approximately) empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn hash_of<Q: Hash + ?Sized>(&self, key: &Q) -> u64 {
        self.hasher.hash_one(key)
    }

    /// Inserts `(key, value)`; returns true iff `key` was absent.
    pub fn emplace(&self, key: K, value: V) -> bool {
        let guard = R::enter();
        let hash = self.hash_of(&key);
        let WriteSlot { table, lock } = self.writer_lock(hash, &guard);
        if self
            .scan_chain(lock.bucket(), hash, &key, &guard)
            .is_some()
        {
            // Present: no mutation, the lock drop restores the version.
            return false;
        }
        let entry = Entry::boxed(hash, key, value);
        self.publish(lock.bucket(), hash, entry, &guard);
        lock.commit();
        self.post_insert(table, &guard);
        true
    }

    /// Returns an accessor to the value under `key`, inserting `value` if
    /// the key was absent. The bool is true iff an insert happened; the
    /// argument is consumed only in that case.
    pub fn get_or_emplace(&self, key: K, value: V) -> (Accessor<'_, K, V, R>, bool) {
        self.get_or_emplace_lazy(key, move || value)
    }

    /// As [`get_or_emplace`](Self::get_or_emplace), but the value is
    /// produced by `make`, invoked only on insert. `make` runs under the
    /// bucket lock; if it panics the bucket is unlocked and the panic
    /// propagates unchanged, leaving the key absent.
    pub fn get_or_emplace_lazy(
        &self,
        key: K,
        make: impl FnOnce() -> V,
    ) -> (Accessor<'_, K, V, R>, bool) {
        let guard = R::enter();
        let hash = self.hash_of(&key);
        let WriteSlot { table, lock } = self.writer_lock(hash, &guard);
        if let Some((_, _, existing)) = self.scan_chain(lock.bucket(), hash, &key, &guard) {
            // SAFETY: the entry is pinned by `guard`; the accessor's fresh
            // region is entered while `guard` is live.
            let accessor = unsafe { Accessor::pinned(existing.as_raw(), R::enter()) };
            return (accessor, false);
        }
        let value = make();
        let entry = Entry::boxed(hash, key, value);
        self.publish(lock.bucket(), hash, entry, &guard);
        lock.commit();
        // SAFETY: as above; the entry is published and pinned by `guard`.
        let accessor = unsafe { Accessor::pinned(entry, R::enter()) };
        self.post_insert(table, &guard);
        (accessor, true)
    }

    /// Returns an accessor to the value under `key`, if present.
    pub fn try_get_value<Q>(&self, key: &Q) -> Option<Accessor<'_, K, V, R>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let guard = R::enter();
        let hash = self.hash_of(key);
        let position = self.locate(hash, key, &guard)?;
        // SAFETY: the entry was validated under `guard`, which the
        // accessor now owns.
        Some(unsafe { Accessor::pinned(position.entry, guard) })
    }

    /// Whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let guard = R::enter();
        let hash = self.hash_of(key);
        self.locate(hash, key, &guard).is_some()
    }

    /// Returns a cursor positioned at `key`, or `None` (the end position).
    pub fn find<Q>(&self, key: &Q) -> Option<Cursor<'_, K, V, S, R>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let guard = R::enter();
        let hash = self.hash_of(key);
        let position = self.locate(hash, key, &guard)?;
        Some(Cursor {
            map: self,
            guard,
            table: position.table,
            bucket_idx: position.bucket_idx + 1,
            chain: position.chain,
            slot_idx: position.slot_idx,
            entry: position.entry,
        })
    }

    /// Returns a cursor at the first entry (invalid when the map is
    /// empty). Traversal order is unspecified.
    pub fn begin(&self) -> Cursor<'_, K, V, S, R> {
        let guard = R::enter();
        let table = self.table.load(Ordering::Acquire, &guard).as_raw();
        let mut cursor = Cursor {
            map: self,
            guard,
            table,
            bucket_idx: 0,
            chain: ptr::null(),
            slot_idx: 0,
            entry: ptr::null(),
        };
        cursor.seek();
        cursor
    }

    /// Iterates over the entries, yielding pinned accessors.
    pub fn iter(&self) -> Iter<'_, K, V, S, R> {
        Iter {
            cursor: self.begin(),
        }
    }

    /// Removes `key`; returns true iff it was present.
    pub fn erase<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let guard = R::enter();
        let hash = self.hash_of(key);
        match self.unlink(hash, key, &guard) {
            Some(entry) => {
                // SAFETY: just unlinked under the bucket lock; readers that
                // still see it are pinned.
                unsafe { R::retire(entry as *mut Entry<K, V>) };
                true
            }
            None => false,
        }
    }

    /// Removes the cursor's current entry and advances the cursor.
    ///
    /// The entry is re-located by key, so this stays correct when the
    /// entry has moved to a successor generation since the cursor was
    /// positioned.
    pub fn erase_at(&self, it: &mut Cursor<'_, K, V, S, R>) {
        debug_assert!(ptr::eq(self, it.map), "cursor belongs to another map");
        if !it.valid() {
            return;
        }
        {
            // SAFETY: the cursor's guard pins the entry.
            let hash = unsafe { (*it.entry).hash };
            let key = unsafe { &(*it.entry).key };
            if let Some(entry) = self.unlink(hash, key, &it.guard) {
                // SAFETY: as in `erase`.
                unsafe { R::retire(entry as *mut Entry<K, V>) };
            }
        }
        it.advance();
    }

    /// Atomically removes `key` and returns an owning accessor to its
    /// value, or `None` if absent.
    ///
    /// The entry is retired when the accessor drops; managed-pointer
    /// values transfer with it rather than being retired at extraction.
    pub fn extract<Q>(&self, key: &Q) -> Option<Accessor<'_, K, V, R>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let guard = R::enter();
        let hash = self.hash_of(key);
        let entry = self.unlink(hash, key, &guard)?;
        // SAFETY: unlinked under the bucket lock and pinned by `guard`,
        // which the accessor now owns.
        Some(unsafe { Accessor::owning(entry, guard) })
    }

    /// Lock the bucket for `hash` in the freshest generation, migrating
    /// pending buckets encountered along the way.
    fn writer_lock<'g>(&self, hash: u64, guard: &'g R::Guard) -> WriteSlot<'g, K, V> {
        let mut table = self.table.load(Ordering::Acquire, guard);
        loop {
            // SAFETY: tables reachable from the root are pinned by `guard`.
            let t = unsafe { table.deref() };
            match BucketGuard::acquire(t.bucket_for(hash)) {
                LockOutcome::Frozen => {
                    table = t.next.load(Ordering::Acquire, guard);
                }
                LockOutcome::Locked(lock) => {
                    let next = t.next.load(Ordering::Acquire, guard);
                    if next.is_null() {
                        return WriteSlot { table: t, lock };
                    }
                    // Growth in progress: move this bucket first, then
                    // continue in the successor.
                    self.migrate_locked(t, lock, guard);
                    table = next;
                }
            }
        }
    }

    /// Scan a locked chain for `key`. Also used for the under-lock phase
    /// of reads; a panicking user equality unwinds with the lock released
    /// by the guard's drop.
    fn scan_chain<'g, Q>(
        &self,
        bucket: &'g Bucket<K, V>,
        hash: u64,
        key: &Q,
        guard: &'g R::Guard,
    ) -> Option<(&'g Bucket<K, V>, usize, Shared<'g, Entry<K, V>>)>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut b = bucket;
        loop {
            for i in 0..BUCKET_SLOTS {
                if b.hashes[i].load(Ordering::Relaxed) != hash {
                    continue;
                }
                let e = b.slots[i].load(Ordering::Acquire, guard);
                if e.is_null() {
                    continue;
                }
                // SAFETY: non-null slot pointers are pinned by `guard`.
                let entry = unsafe { e.deref() };
                if entry.hash == hash && entry.key.borrow() == key {
                    return Some((b, i, e));
                }
            }
            match unsafe { b.next.load(Ordering::Acquire, guard).as_ref() } {
                Some(next) => b = next,
                None => return None,
            }
        }
    }

    /// Publish `entry` into the first free slot of the locked chain,
    /// appending an extension bucket on overflow.
    fn publish<'g>(
        &self,
        bucket: &'g Bucket<K, V>,
        hash: u64,
        entry: *mut Entry<K, V>,
        guard: &'g R::Guard,
    ) {
        let mut b = bucket;
        loop {
            for i in 0..BUCKET_SLOTS {
                if b.slots[i].load(Ordering::Relaxed, guard).is_null() {
                    b.hashes[i].store(hash, Ordering::Relaxed);
                    // SAFETY: entry is a fresh allocation owned by the table
                    // from here on.
                    b.slots[i].store(unsafe { Shared::from_raw(entry) }, Ordering::Release);
                    return;
                }
            }
            match unsafe { b.next.load(Ordering::Acquire, guard).as_ref() } {
                Some(next) => b = next,
                None => {
                    // Fully initialized before it becomes reachable.
                    let ext = Box::into_raw(Box::new(Bucket::new()));
                    unsafe {
                        (*ext).hashes[0].store(hash, Ordering::Relaxed);
                        (*ext).slots[0].store(Shared::from_raw(entry), Ordering::Relaxed);
                        b.next.store(Shared::from_raw(ext), Ordering::Release);
                    }
                    return;
                }
            }
        }
    }

    /// Remove `key` from the freshest generation. Returns the unlinked
    /// entry, still safely dereferencable under the caller's region.
    fn unlink<'g, Q>(&self, hash: u64, key: &Q, guard: &'g R::Guard) -> Option<*const Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let WriteSlot { table: _, lock } = self.writer_lock(hash, guard);
        match self.scan_chain(lock.bucket(), hash, key, guard) {
            Some((chain, slot_idx, entry)) => {
                // Tombstone: clear the pointer, then the advisory hash.
                chain.slots[slot_idx].store(Shared::null(), Ordering::Release);
                chain.hashes[slot_idx].store(0, Ordering::Relaxed);
                lock.commit();
                self.count.fetch_sub(1, Ordering::Relaxed);
                self.help_migrate(guard);
                Some(entry.as_raw())
            }
            None => None,
        }
    }

    /// Count bookkeeping, growth trigger, and one conscripted migration.
    fn post_insert<'g>(&self, table: &'g Table<K, V>, guard: &'g R::Guard) {
        let count = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        if count > table.fill_limit && table.next.load(Ordering::Acquire, guard).is_null() {
            self.grow(table, guard);
        }
        self.help_migrate(guard);
    }

    /// Link a double-capacity successor to `table`. Racing allocations are
    /// resolved by the CAS; losers free theirs.
    fn grow<'g>(&self, table: &'g Table<K, V>, guard: &'g R::Guard) {
        let fresh = Box::into_raw(Table::boxed(table.buckets.len() * 2, self.max_load));
        if table
            .next
            .compare_exchange(
                Shared::null(),
                // SAFETY: ownership moves to the table chain on success.
                unsafe { Shared::from_raw(fresh) },
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            )
            .is_err()
        {
            // SAFETY: the CAS failed, so nothing ever saw `fresh`.
            drop(unsafe { Box::from_raw(fresh) });
        }
    }

    /// Migrate one conscripted bucket of the root generation, if growth is
    /// under way. Each completed write pays at most this one bucket.
    fn help_migrate<'g>(&self, guard: &'g R::Guard) {
        let root = self.table.load(Ordering::Acquire, guard);
        // SAFETY: the root is pinned by `guard`.
        let t = unsafe { root.deref() };
        if t.next.load(Ordering::Acquire, guard).is_null() {
            return;
        }
        let pos = t.scan_cursor.fetch_add(1, Ordering::Relaxed);
        if pos >= t.buckets.len() {
            return;
        }
        match BucketGuard::acquire(&t.buckets[pos]) {
            // Another writer already moved it.
            LockOutcome::Frozen => {}
            LockOutcome::Locked(lock) => self.migrate_locked(t, lock, guard),
        }
    }

    /// Copy every entry of the locked bucket into the successor
    /// generation, then freeze the bucket. The writer that freezes the
    /// last bucket promotes the root.
    ///
    /// Old slots keep their entry pointers so cursors over this generation
    /// stay coherent; the entries are shared with the successor until the
    /// table is retired.
    fn migrate_locked<'g>(
        &self,
        table: &'g Table<K, V>,
        lock: BucketGuard<'g, K, V>,
        guard: &'g R::Guard,
    ) {
        let target = table.next.load(Ordering::Acquire, guard);
        // SAFETY: `next` is set before any bucket freezes and never
        // changes afterwards.
        let target = unsafe { target.deref() };
        let mut chain = Some(lock.bucket());
        while let Some(b) = chain {
            for i in 0..BUCKET_SLOTS {
                let e = b.slots[i].load(Ordering::Relaxed, guard);
                if e.is_null() {
                    continue;
                }
                // SAFETY: pinned slot pointer under the bucket lock.
                let entry = unsafe { e.deref() };
                self.publish_migrated(target, entry.hash, e.as_raw(), guard);
            }
            chain = unsafe { b.next.load(Ordering::Relaxed, guard).as_ref() };
        }
        lock.freeze();
        let frozen = table.frozen.fetch_add(1, Ordering::AcqRel) + 1;
        if frozen == table.buckets.len() {
            self.promote(guard);
        }
    }

    /// Insert an already-owned entry into generation `start` or one of its
    /// successors, locking per target bucket. Keys being migrated are
    /// absent from the target (their old bucket is still locked), so no
    /// duplicate scan is needed.
    fn publish_migrated<'g>(
        &self,
        start: &'g Table<K, V>,
        hash: u64,
        entry: *mut Entry<K, V>,
        guard: &'g R::Guard,
    ) {
        let mut table = start;
        loop {
            match BucketGuard::acquire(table.bucket_for(hash)) {
                LockOutcome::Frozen => {
                    // SAFETY: frozen implies a successor exists.
                    table = unsafe { table.next.load(Ordering::Acquire, guard).deref() };
                }
                LockOutcome::Locked(lock) => {
                    let next = table.next.load(Ordering::Acquire, guard);
                    if next.is_null() {
                        self.publish(lock.bucket(), hash, entry, guard);
                        lock.commit();
                        return;
                    }
                    // Cascading growth: this generation is migrating too.
                    self.migrate_locked(table, lock, guard);
                    table = unsafe { next.deref() };
                }
            }
        }
    }

    /// Swing the root past fully migrated generations, retiring each.
    fn promote<'g>(&self, guard: &'g R::Guard) {
        loop {
            let root = self.table.load(Ordering::Acquire, guard);
            // SAFETY: the root is pinned by `guard`.
            let t = unsafe { root.deref() };
            if t.frozen.load(Ordering::Acquire) != t.buckets.len() {
                return;
            }
            let next = t.next.load(Ordering::Acquire, guard);
            debug_assert!(!next.is_null());
            match self
                .table
                .compare_exchange(root, next, Ordering::AcqRel, Ordering::Acquire, guard)
            {
                Ok(_) => {
                    // SAFETY: unreachable from the root now; pinned readers
                    // are what retire defers for. Table drop frees only
                    // extension chains, never the shared entries.
                    unsafe { R::retire(root.as_raw()) };
                }
                // Another writer swung the root; re-examine.
                Err(_) => {}
            }
        }
    }

    /// Find `key` without taking the bucket lock: snapshot the version
    /// word, scan, re-validate. Falls back to the lock under writer churn
    /// so readers cannot starve.
    fn locate<'g, Q>(&self, hash: u64, key: &Q, guard: &'g R::Guard) -> Option<Position<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut table = self.table.load(Ordering::Acquire, guard);
        'tables: loop {
            // SAFETY: tables reachable from the root are pinned by `guard`.
            let t = unsafe { table.deref() };
            let bucket_idx = t.bucket_index(hash);
            let bucket = &t.buckets[bucket_idx];
            let mut attempts = 0u32;
            let mut backoff = Backoff::new();
            loop {
                let v0 = bucket.version.load(Ordering::Acquire);
                if v0 & FROZEN_BIT != 0 {
                    table = t.next.load(Ordering::Acquire, guard);
                    continue 'tables;
                }
                if v0 & LOCK_BIT == 0 {
                    let found = self.scan_chain(bucket, hash, key, guard);
                    if bucket.version.load(Ordering::Acquire) == v0 {
                        // A miss in an unfrozen bucket is authoritative:
                        // keys only move to the successor when their
                        // bucket freezes.
                        return found.map(|(chain, slot_idx, entry)| Position {
                            table: t as *const Table<K, V>,
                            bucket_idx,
                            chain: chain as *const Bucket<K, V>,
                            slot_idx,
                            entry: entry.as_raw(),
                        });
                    }
                }
                attempts += 1;
                if attempts >= READ_SPIN_LIMIT {
                    match BucketGuard::acquire(bucket) {
                        LockOutcome::Frozen => {
                            table = t.next.load(Ordering::Acquire, guard);
                            continue 'tables;
                        }
                        LockOutcome::Locked(lock) => {
                            let found = self.scan_chain(bucket, hash, key, guard);
                            drop(lock);
                            return found.map(|(chain, slot_idx, entry)| Position {
                                table: t as *const Table<K, V>,
                                bucket_idx,
                                chain: chain as *const Bucket<K, V>,
                                slot_idx,
                                entry: entry.as_raw(),
                            });
                        }
                    }
                }
                backoff.spin();
            }
        }
    }
}

impl<K: 'static, V: 'static, S, R: Reclaim> Drop for VyukovMap<K, V, S, R> {
    fn drop(&mut self) {
        // Exclusive access. Every live entry sits in exactly one unfrozen
        // bucket across the generation chain (migration freezes a bucket
        // only after copying it), so walking unfrozen buckets drops each
        // entry exactly once. Table drop then frees the extension chains.
        let mut table = self.table.load_exclusive();
        while !table.is_null() {
            let t = unsafe { &mut *table };
            for bucket in t.buckets.iter_mut() {
                if bucket.version.load(Ordering::Relaxed) & FROZEN_BIT != 0 {
                    continue;
                }
                let mut chain: *mut Bucket<K, V> = bucket as *mut Bucket<K, V>;
                while !chain.is_null() {
                    let b = unsafe { &mut *chain };
                    for slot in b.slots.iter_mut() {
                        let entry = slot.load_exclusive();
                        if !entry.is_null() {
                            drop(unsafe { Box::from_raw(entry) });
                        }
                    }
                    chain = b.next.load_exclusive();
                }
            }
            let next = t.next.load_exclusive();
            drop(unsafe { Box::from_raw(table) });
            table = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emplace_find_erase_round_trip() {
        let map = VyukovMap::new();
        assert!(map.emplace(1, 100));
        assert!(!map.emplace(1, 200));
        assert_eq!(*map.try_get_value(&1).unwrap(), 100);
        assert!(map.try_get_value(&2).is_none());
        assert!(map.erase(&1));
        assert!(!map.erase(&1));
        assert!(map.try_get_value(&1).is_none());
    }

    #[test]
    fn len_tracks_inserts_and_removes() {
        let map = VyukovMap::new();
        assert!(map.is_empty());
        for i in 0..10 {
            map.emplace(i, i);
        }
        assert_eq!(map.len(), 10);
        map.erase(&3);
        assert_eq!(map.len(), 9);
    }

    #[test]
    fn drop_frees_a_populated_map() {
        let map = VyukovMap::with_capacity(8);
        for i in 0..1000 {
            map.emplace(i, i.to_string());
        }
        drop(map);
    }
}
