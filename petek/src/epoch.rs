//! Epoch-based reclamation (the default strategy).
//!
//! Threads announce the global epoch when they enter a region; the epoch
//! advances only when every in-region thread has announced the current one.
//! An object retired at epoch `e` is destroyed once the epoch reaches
//! `e + 3`, by which point no region that could have observed it is still
//! open. Reads inside a region need no per-object work at all, at the cost
//! of unbounded reclamation latency under a stalled reader.

use crate::collector::{Collector, Discipline, LocalHandle};
use crate::reclaim::{Reclaim, Reclaimable, Region};
use crate::registry::{pack_state, state_epoch, state_flag};
use core::marker::PhantomData;
use once_cell::race::OnceBox;

static GLOBAL: OnceBox<Collector> = OnceBox::new();

#[inline]
fn global() -> &'static Collector {
    GLOBAL.get_or_init(|| Box::new(Collector::new()))
}

struct HandleOwner(LocalHandle);

impl Drop for HandleOwner {
    fn drop(&mut self) {
        self.0.cleanup::<Epoch>(global());
    }
}

std::thread_local! {
    static HANDLE: HandleOwner = const { HandleOwner(LocalHandle::new()) };
}

/// Epoch-based reclamation strategy.
pub struct Epoch {
    _private: (),
}

impl Discipline for Epoch {
    #[inline]
    fn register_state(epoch: u64) -> u64 {
        pack_state(epoch, false)
    }

    #[inline]
    fn enter_state(epoch: u64) -> Option<u64> {
        Some(pack_state(epoch, true))
    }

    #[inline]
    fn exit_state(epoch: u64) -> u64 {
        pack_state(epoch, false)
    }

    #[inline]
    fn blocks_advance(state: u64, epoch: u64) -> bool {
        state_flag(state) && state_epoch(state) != epoch
    }
}

/// RAII region guard for [`Epoch`].
pub struct EpochGuard {
    // Thread-bound: the guard manipulates thread-local nesting state.
    _not_send: PhantomData<*mut ()>,
}

impl Region for EpochGuard {}

impl Drop for EpochGuard {
    #[inline]
    fn drop(&mut self) {
        // try_with: during thread teardown TLS may already be gone; the
        // nesting counter saturates at zero so this stays a no-op.
        let _ = HANDLE.try_with(|handle| handle.0.exit::<Epoch>(global()));
    }
}

// SAFETY: retire defers destruction until the epoch has advanced three
// times past every region that was open at the time of the call.
unsafe impl Reclaim for Epoch {
    type Guard = EpochGuard;

    #[inline]
    fn enter() -> EpochGuard {
        let _ = HANDLE.try_with(|handle| handle.0.enter::<Epoch>(global()));
        EpochGuard {
            _not_send: PhantomData,
        }
    }

    #[inline]
    unsafe fn retire<T: Reclaimable>(ptr: *mut T) {
        // If TLS is already destroyed the node leaks; the OS reclaims
        // process memory at exit.
        let _ = HANDLE.try_with(|handle| {
            // SAFETY: forwarded caller contract.
            unsafe { handle.0.retire::<Epoch, T>(global(), ptr) }
        });
    }

    fn flush() {
        let _ = HANDLE.try_with(|handle| handle.0.flush::<Epoch>(global()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_record_off_current_epoch_blocks() {
        assert!(Epoch::blocks_advance(pack_state(3, true), 4));
        assert!(!Epoch::blocks_advance(pack_state(4, true), 4));
        assert!(!Epoch::blocks_advance(pack_state(3, false), 4));
        assert!(!Epoch::blocks_advance(0, 4));
    }

    #[test]
    fn guards_nest() {
        let outer = Epoch::enter();
        let inner = Epoch::enter();
        drop(outer);
        drop(inner);
    }
}
