//! Buckets: fixed-width slot groups sharing one version/lock word.

use core::array;
use core::hint::spin_loop;
use core::sync::atomic::{AtomicU64, Ordering};
use petek::{Atomic, Reclaimable, Retired};

/// Slots per bucket.
pub(crate) const BUCKET_SLOTS: usize = 4;

/// Version-word encoding: bit 0 = writer lock, bit 1 = frozen (migrated
/// out, permanently closed), upper bits = mutation counter.
pub(crate) const LOCK_BIT: u64 = 0b01;
pub(crate) const FROZEN_BIT: u64 = 0b10;
pub(crate) const VERSION_STEP: u64 = 0b100;

/// One key/value node. Published through a slot pointer and destroyed
/// through the reclaimer, so a reader that passed version validation may
/// keep dereferencing it after it leaves the table.
#[repr(C)]
pub(crate) struct Entry<K, V> {
    pub(crate) link: Retired,
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
}

unsafe impl<K: 'static, V: 'static> Reclaimable for Entry<K, V> {}

impl<K, V> Entry<K, V> {
    pub(crate) fn boxed(hash: u64, key: K, value: V) -> *mut Self {
        Box::into_raw(Box::new(Self {
            link: Retired::new(),
            hash,
            key,
            value,
        }))
    }
}

/// Exponential backoff for contended spins; yields once the cap is hit.
pub(crate) struct Backoff {
    step: u32,
}

impl Backoff {
    #[inline]
    pub(crate) fn new() -> Self {
        Self { step: 0 }
    }

    #[inline]
    pub(crate) fn spin(&mut self) {
        if self.step <= 6 {
            for _ in 0..(1u32 << self.step) {
                spin_loop();
            }
            self.step += 1;
        } else {
            std::thread::yield_now();
        }
    }
}

/// A bucket: version word, per-slot hash filters, per-slot entry pointers,
/// optional extension chain.
///
/// Extension buckets reuse this layout; their own version word stays inert
/// because the whole chain is covered by the primary bucket's lock.
#[repr(align(64))]
pub(crate) struct Bucket<K, V> {
    pub(crate) version: AtomicU64,
    /// Advisory per-slot hash copies. Readers filter on these before
    /// touching the entry; any torn state is caught by version validation.
    pub(crate) hashes: [AtomicU64; BUCKET_SLOTS],
    pub(crate) slots: [Atomic<Entry<K, V>>; BUCKET_SLOTS],
    pub(crate) next: Atomic<Bucket<K, V>>,
}

impl<K, V> Bucket<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            version: AtomicU64::new(0),
            hashes: array::from_fn(|_| AtomicU64::new(0)),
            slots: array::from_fn(|_| Atomic::null()),
            next: Atomic::null(),
        }
    }
}

/// Outcome of a lock attempt.
pub(crate) enum LockOutcome<'b, K, V> {
    Locked(BucketGuard<'b, K, V>),
    /// The bucket migrated to the next generation and rejects writes.
    Frozen,
}

/// Scoped bucket lock.
///
/// Dropping without committing restores the pre-lock version word, so
/// unwinding out of user callbacks (equality, lazy factories) leaves the
/// bucket unlocked with its counter untouched. `commit` bumps the counter;
/// `freeze` bumps it and closes the bucket for good.
pub(crate) struct BucketGuard<'b, K, V> {
    bucket: &'b Bucket<K, V>,
    v0: u64,
}

impl<'b, K, V> BucketGuard<'b, K, V> {
    pub(crate) fn acquire(bucket: &'b Bucket<K, V>) -> LockOutcome<'b, K, V> {
        let mut backoff = Backoff::new();
        loop {
            let v = bucket.version.load(Ordering::Relaxed);
            if v & FROZEN_BIT != 0 {
                return LockOutcome::Frozen;
            }
            if v & LOCK_BIT == 0
                && bucket
                    .version
                    .compare_exchange_weak(v, v | LOCK_BIT, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
            {
                return LockOutcome::Locked(BucketGuard { bucket, v0: v });
            }
            backoff.spin();
        }
    }

    #[inline]
    pub(crate) fn bucket(&self) -> &'b Bucket<K, V> {
        self.bucket
    }

    /// Unlock after a mutation: bump the counter so optimistic readers
    /// retry.
    pub(crate) fn commit(self) {
        self.bucket
            .version
            .store(self.v0 + VERSION_STEP, Ordering::Release);
        core::mem::forget(self);
    }

    /// Unlock and permanently close the bucket (growth).
    pub(crate) fn freeze(self) {
        self.bucket
            .version
            .store((self.v0 + VERSION_STEP) | FROZEN_BIT, Ordering::Release);
        core::mem::forget(self);
    }
}

impl<K, V> Drop for BucketGuard<'_, K, V> {
    fn drop(&mut self) {
        // Read-only critical section or unwind: no mutation happened.
        self.bucket.version.store(self.v0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_bumps_the_counter_once() {
        let bucket: Bucket<u32, u32> = Bucket::new();
        let LockOutcome::Locked(lock) = BucketGuard::acquire(&bucket) else {
            panic!("fresh bucket cannot be frozen");
        };
        assert_eq!(bucket.version.load(Ordering::Relaxed), LOCK_BIT);
        lock.commit();
        assert_eq!(bucket.version.load(Ordering::Relaxed), VERSION_STEP);
    }

    #[test]
    fn drop_restores_the_prelock_word() {
        let bucket: Bucket<u32, u32> = Bucket::new();
        {
            let LockOutcome::Locked(_lock) = BucketGuard::acquire(&bucket) else {
                panic!("fresh bucket cannot be frozen");
            };
        }
        assert_eq!(bucket.version.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn freeze_is_terminal() {
        let bucket: Bucket<u32, u32> = Bucket::new();
        let LockOutcome::Locked(lock) = BucketGuard::acquire(&bucket) else {
            panic!("fresh bucket cannot be frozen");
        };
        lock.freeze();
        assert_eq!(
            bucket.version.load(Ordering::Relaxed),
            VERSION_STEP | FROZEN_BIT
        );
        assert!(matches!(
            BucketGuard::acquire(&bucket),
            LockOutcome::Frozen
        ));
    }
}
