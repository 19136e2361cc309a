//! Value-pinning handles.

use crate::bucket::Entry;
use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;
use petek::{GuardedPtr, Reclaim};

/// A handle pinning one entry so its storage cannot be reclaimed while the
/// handle is held. Dereferences to the value.
///
/// Accessors returned by `extract` additionally *own* their entry: it was
/// unlinked from the table, and the accessor retires it on drop. For
/// managed-pointer values that means the node's ownership travels with the
/// accessor instead of being retired at extraction.
///
/// Accessors are thread-bound (they carry a region guard) and borrow the
/// map's lifetime, so they cannot outlive it.
pub struct Accessor<'m, K: 'static, V: 'static, R: Reclaim> {
    entry: GuardedPtr<Entry<K, V>, R>,
    owned: bool,
    _map: PhantomData<&'m ()>,
}

impl<'m, K: 'static, V: 'static, R: Reclaim> Accessor<'m, K, V, R> {
    /// Pin `entry` with `region`.
    ///
    /// # Safety
    ///
    /// As [`GuardedPtr::new`]: the entry must have been reachable under a
    /// live guard on this thread, with `region` entered under it.
    pub(crate) unsafe fn pinned(entry: *const Entry<K, V>, region: R::Guard) -> Self {
        Self {
            // SAFETY: forwarded caller contract.
            entry: unsafe { GuardedPtr::new(entry, region) },
            owned: false,
            _map: PhantomData,
        }
    }

    /// As [`Accessor::pinned`], but the accessor takes ownership of the
    /// (already unlinked) entry and retires it on drop.
    ///
    /// # Safety
    ///
    /// As `pinned`, plus: `entry` must have been unlinked from the table
    /// by the caller and not be owned by anything else.
    pub(crate) unsafe fn owning(entry: *const Entry<K, V>, region: R::Guard) -> Self {
        Self {
            // SAFETY: forwarded caller contract.
            entry: unsafe { GuardedPtr::new(entry, region) },
            owned: true,
            _map: PhantomData,
        }
    }

    /// Key of the pinned entry.
    pub fn key(&self) -> &K {
        &self.entry.key
    }

    /// Value of the pinned entry (also available through `Deref`).
    pub fn value(&self) -> &V {
        &self.entry.value
    }
}

impl<K: 'static, V: 'static, R: Reclaim> Deref for Accessor<'_, K, V, R> {
    type Target = V;

    #[inline]
    fn deref(&self) -> &V {
        &self.entry.value
    }
}

impl<K: 'static, V: 'static, R: Reclaim> Drop for Accessor<'_, K, V, R> {
    fn drop(&mut self) {
        if self.owned {
            // SAFETY: the entry was unlinked at extraction; this accessor
            // is its sole owner. Concurrent readers that pinned it earlier
            // are exactly what retire defers for.
            unsafe { R::retire(self.entry.as_ptr() as *mut Entry<K, V>) };
        }
    }
}

impl<K: 'static, V: fmt::Debug + 'static, R: Reclaim> fmt::Debug for Accessor<'_, K, V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}
