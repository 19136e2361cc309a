//! Fixed-slot thread registry shared by the concrete strategies.
//!
//! Each participating thread claims one [`ThreadRecord`] and publishes a
//! single packed state word through it. The advancement scan reads every
//! allocated record; what the word means (and when it blocks advancement)
//! is the strategy's business. Thread IDs are recycled through a
//! spin-locked free list so long-lived processes with thread churn stay
//! within the fixed slot count.

use crate::reclaim::Retired;
use core::cell::UnsafeCell;
use core::hint::spin_loop;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

// Maximum concurrent threads. Configurable via cargo features:
//   petek = { features = ["max-threads-512"] }
// Default: 128.
#[cfg(feature = "max-threads-1024")]
pub(crate) const MAX_THREADS: usize = 1024;
#[cfg(all(feature = "max-threads-512", not(feature = "max-threads-1024")))]
pub(crate) const MAX_THREADS: usize = 512;
#[cfg(all(
    feature = "max-threads-256",
    not(any(feature = "max-threads-512", feature = "max-threads-1024"))
))]
pub(crate) const MAX_THREADS: usize = 256;
#[cfg(not(any(
    feature = "max-threads-256",
    feature = "max-threads-512",
    feature = "max-threads-1024"
)))]
pub(crate) const MAX_THREADS: usize = 128;

/// Flag bit of a packed record state. Strategy-specific meaning: "inside a
/// region" (epoch) or "online" (quiescent-state).
pub(crate) const STATE_FLAG: u64 = 1;

#[inline]
pub(crate) fn pack_state(epoch: u64, flag: bool) -> u64 {
    (epoch << 1) | flag as u64
}

#[inline]
pub(crate) fn state_epoch(state: u64) -> u64 {
    state >> 1
}

#[inline]
pub(crate) fn state_flag(state: u64) -> bool {
    state & STATE_FLAG != 0
}

/// One registry slot, padded to its own cache line.
#[repr(align(128))]
pub(crate) struct ThreadRecord {
    pub(crate) state: AtomicU64,
}

impl ThreadRecord {
    fn new() -> Self {
        Self {
            state: AtomicU64::new(0),
        }
    }
}

/// Test-test-and-set spin lock with backoff, guarding the cold registry
/// paths (tid recycling, orphan hand-off).
pub(crate) struct SpinLock<T> {
    held: AtomicBool,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    pub(crate) const fn new(data: T) -> Self {
        Self {
            held: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }

    pub(crate) fn lock(&self) -> SpinLockGuard<'_, T> {
        let mut step = 0u32;
        loop {
            // Test phase: spin on a relaxed load so the line stays shared.
            while self.held.load(Ordering::Relaxed) {
                if step < 8 {
                    for _ in 0..(1u32 << step) {
                        spin_loop();
                    }
                    step += 1;
                } else {
                    std::thread::yield_now();
                }
            }
            if !self.held.swap(true, Ordering::Acquire) {
                return SpinLockGuard { lock: self };
            }
        }
    }
}

pub(crate) struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;
    #[inline]
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        self.lock.held.store(false, Ordering::Release);
    }
}

/// Limbo nodes inherited from exited threads, linked through their headers.
struct OrphanList(*mut Retired);

// SAFETY: the list head is only touched under the registry's spin lock.
unsafe impl Send for OrphanList {}

/// Global state for one reclamation strategy.
pub(crate) struct Registry {
    records: Box<[ThreadRecord]>,
    /// Global epoch counter (starts at 1).
    epoch: AtomicU64,
    next_tid: AtomicUsize,
    free_tids: SpinLock<Vec<usize>>,
    orphans: SpinLock<OrphanList>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            records: (0..MAX_THREADS).map(|_| ThreadRecord::new()).collect(),
            epoch: AtomicU64::new(1),
            next_tid: AtomicUsize::new(0),
            free_tids: SpinLock::new(Vec::new()),
            orphans: SpinLock::new(OrphanList(core::ptr::null_mut())),
        }
    }

    #[inline]
    pub(crate) fn record(&self, tid: usize) -> &ThreadRecord {
        &self.records[tid]
    }

    #[inline]
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// CAS the global epoch from `from` to `from + 1`.
    #[inline]
    pub(crate) fn advance_epoch(&self, from: u64) -> bool {
        self.epoch
            .compare_exchange(from, from + 1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Records the advancement scan must cover. The whole slot array is
    /// scanned so a freshly claimed record can never be missed; unclaimed
    /// records are all-zero and permit everything.
    #[inline]
    pub(crate) fn scan_limit(&self) -> usize {
        MAX_THREADS
    }

    pub(crate) fn alloc_tid(&self) -> usize {
        if let Some(tid) = self.free_tids.lock().pop() {
            return tid;
        }
        let tid = self.next_tid.fetch_add(1, Ordering::Relaxed);
        assert!(
            tid < MAX_THREADS,
            "petek: exceeded maximum thread count ({MAX_THREADS})"
        );
        tid
    }

    pub(crate) fn free_tid(&self, tid: usize) {
        // An all-zero state never blocks advancement under either strategy.
        self.records[tid].state.store(0, Ordering::Release);
        self.free_tids.lock().push(tid);
    }

    /// Hand a limbo list (each node stamped with its retirement epoch) to
    /// the registry. Called by exiting threads.
    pub(crate) fn adopt_orphans(&self, head: *mut Retired) {
        if head.is_null() {
            return;
        }
        let mut orphans = self.orphans.lock();
        // Splice onto the current head.
        let mut tail = head;
        unsafe {
            while !(*tail).next.is_null() {
                tail = (*tail).next;
            }
            (*tail).next = orphans.0;
        }
        orphans.0 = head;
    }

    /// Detach every orphan retired at or before `limit`. Destructors run on
    /// the caller's side, outside the lock (they may re-enter `retire`).
    pub(crate) fn take_orphans(&self, limit: u64) -> *mut Retired {
        let mut eligible: *mut Retired = core::ptr::null_mut();
        let mut orphans = self.orphans.lock();
        let mut keep: *mut Retired = core::ptr::null_mut();
        let mut cur = orphans.0;
        while !cur.is_null() {
            unsafe {
                let next = (*cur).next;
                if (*cur).epoch <= limit {
                    (*cur).next = eligible;
                    eligible = cur;
                } else {
                    (*cur).next = keep;
                    keep = cur;
                }
                cur = next;
            }
        }
        orphans.0 = keep;
        eligible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_packing_round_trips() {
        let s = pack_state(42, true);
        assert_eq!(state_epoch(s), 42);
        assert!(state_flag(s));
        let s = pack_state(7, false);
        assert_eq!(state_epoch(s), 7);
        assert!(!state_flag(s));
    }

    #[test]
    fn tids_are_recycled() {
        let registry = Registry::new();
        let a = registry.alloc_tid();
        let b = registry.alloc_tid();
        assert_ne!(a, b);
        registry.free_tid(a);
        assert_eq!(registry.alloc_tid(), a);
    }

    #[test]
    fn epoch_advances_by_cas() {
        let registry = Registry::new();
        let e = registry.epoch();
        assert!(registry.advance_epoch(e));
        assert!(!registry.advance_epoch(e));
        assert_eq!(registry.epoch(), e + 1);
    }
}
