//! Guard-witnessed atomic pointers.
//!
//! [`Atomic<T>`] is a plain atomic pointer whose loads are witnessed by a
//! region guard: the returned [`Shared<'g, T>`] borrows the guard's
//! lifetime, so the pointee cannot outlive the protection that made the
//! load safe. The witness is any [`Region`] guard, so one pointer type
//! serves every reclamation strategy.

use crate::reclaim::Region;
use core::marker::PhantomData;
use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

/// An atomic pointer to a reclamation-managed heap object.
pub struct Atomic<T> {
    data: AtomicPtr<T>,
}

unsafe impl<T: Send + Sync> Send for Atomic<T> {}
unsafe impl<T: Send + Sync> Sync for Atomic<T> {}

impl<T> Atomic<T> {
    /// Creates a new atomic pointer.
    #[inline]
    pub fn new(ptr: *mut T) -> Self {
        Self {
            data: AtomicPtr::new(ptr),
        }
    }

    /// Creates a null atomic pointer.
    #[inline]
    pub const fn null() -> Self {
        Self {
            data: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Loads the pointer under a region guard.
    #[inline]
    pub fn load<'g, G: Region>(&self, order: Ordering, _witness: &'g G) -> Shared<'g, T> {
        Shared {
            data: self.data.load(order),
            _marker: PhantomData,
        }
    }

    /// Plain read through exclusive access; no witness needed.
    #[inline]
    pub fn load_exclusive(&mut self) -> *mut T {
        *self.data.get_mut()
    }

    /// Stores a pointer.
    #[inline]
    pub fn store(&self, ptr: Shared<'_, T>, order: Ordering) {
        self.data.store(ptr.data, order);
    }

    /// Compares and exchanges the pointer.
    #[inline]
    pub fn compare_exchange<'g, G: Region>(
        &self,
        current: Shared<'_, T>,
        new: Shared<'_, T>,
        success: Ordering,
        failure: Ordering,
        _witness: &'g G,
    ) -> Result<Shared<'g, T>, Shared<'g, T>> {
        match self
            .data
            .compare_exchange(current.data, new.data, success, failure)
        {
            Ok(prev) => Ok(Shared {
                data: prev,
                _marker: PhantomData,
            }),
            Err(prev) => Err(Shared {
                data: prev,
                _marker: PhantomData,
            }),
        }
    }

    /// Swaps the pointer, returning the previous value.
    #[inline]
    pub fn swap<'g, G: Region>(
        &self,
        new: Shared<'_, T>,
        order: Ordering,
        _witness: &'g G,
    ) -> Shared<'g, T> {
        Shared {
            data: self.data.swap(new.data, order),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Atomic<T> {
    fn default() -> Self {
        Self::null()
    }
}

/// A pointer witnessed by a region guard.
///
/// The pointee is guaranteed not to be reclaimed for the guard's lifetime.
/// Dereferencing still requires `unsafe` because the pointer may be null or
/// may point to an object whose invariants the caller must uphold.
pub struct Shared<'g, T> {
    data: *mut T,
    _marker: PhantomData<&'g ()>,
}

impl<'g, T> Shared<'g, T> {
    /// A null shared pointer.
    #[inline]
    pub const fn null() -> Self {
        Self {
            data: ptr::null_mut(),
            _marker: PhantomData,
        }
    }

    /// Wraps a raw pointer.
    ///
    /// # Safety
    ///
    /// The pointer must stay valid for the witnessing guard's lifetime.
    #[inline]
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        Self {
            data: ptr,
            _marker: PhantomData,
        }
    }

    /// Returns the raw pointer.
    #[inline]
    pub fn as_raw(&self) -> *mut T {
        self.data
    }

    /// Returns true if the pointer is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }

    /// Converts to an optional reference.
    ///
    /// # Safety
    ///
    /// The pointer must be properly aligned and point to a valid `T`.
    #[inline]
    pub unsafe fn as_ref(&self) -> Option<&'g T> {
        if self.is_null() {
            None
        } else {
            // SAFETY: caller guarantees validity; the guard keeps the
            // object from being reclaimed.
            unsafe { Some(&*self.data) }
        }
    }

    /// Converts to a reference without checking for null.
    ///
    /// # Safety
    ///
    /// The pointer must be non-null, aligned, and point to a valid `T`.
    #[inline]
    pub unsafe fn deref(&self) -> &'g T {
        // SAFETY: caller guarantees the pointer is non-null and valid.
        unsafe { &*self.data }
    }
}

impl<T> Clone for Shared<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Shared<'_, T> {}

impl<T> PartialEq for Shared<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<T> Eq for Shared<'_, T> {}

impl<T> core::fmt::Debug for Shared<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Shared({:p})", self.data)
    }
}
