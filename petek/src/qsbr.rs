//! Quiescent-state-based reclamation.
//!
//! Records publish the epoch they last observed at a *quiescent point*: the
//! outermost region exit, or an explicit [`quiescent_state`] call between
//! regions. Region entry publishes nothing at all, which makes this the
//! cheapest strategy on the read side. The price: a registered thread that
//! stops passing quiescent points stalls reclamation (never correctness)
//! until it quiesces again or exits.

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
        self.0.cleanup::<Quiescent>(global());
    }
}

std::thread_local! {
    static HANDLE: HandleOwner = const { HandleOwner(LocalHandle::new()) };
}

/// Quiescent-state-based reclamation strategy.
pub struct Quiescent {
    _private: (),
}

impl Discipline for Quiescent {
    #[inline]
    fn register_state(epoch: u64) -> u64 {
        // Online, with the current epoch as the first observation.
        pack_state(epoch, true)
    }

    #[inline]
    fn enter_state(_epoch: u64) -> Option<u64> {
        // Entry publishes nothing; protection derives from the last
        // quiescent observation.
        None
    }

    #[inline]
    fn exit_state(epoch: u64) -> u64 {
        pack_state(epoch, true)
    }

    #[inline]
    fn blocks_advance(state: u64, epoch: u64) -> bool {
        // Online records block until they re-observe; offline records
        // (state 0, set on thread exit) never do.
        state_flag(state) && state_epoch(state) != epoch
    }
}

/// RAII region guard for [`Quiescent`].
pub struct QuiescentGuard {
    _not_send: PhantomData<*mut ()>,
}

impl Region for QuiescentGuard {}

impl Drop for QuiescentGuard {
    #[inline]
    fn drop(&mut self) {
        let _ = HANDLE.try_with(|handle| handle.0.exit::<Quiescent>(global()));
    }
}

// SAFETY: an object is destroyed only after three epoch advances, each of
// which requires every online thread to pass a quiescent point; any region
// open at retire time sits between two quiescent points and therefore
// blocks the later advances until it closes.
unsafe impl Reclaim for Quiescent {
    type Guard = QuiescentGuard;

    #[inline]
    fn enter() -> QuiescentGuard {
        let _ = HANDLE.try_with(|handle| handle.0.enter::<Quiescent>(global()));
        QuiescentGuard {
            _not_send: PhantomData,
        }
    }

    #[inline]
    unsafe fn retire<T: Reclaimable>(ptr: *mut T) {
        let _ = HANDLE.try_with(|handle| {
            // SAFETY: forwarded caller contract.
            unsafe { handle.0.retire::<Quiescent, T>(global(), ptr) }
        });
    }

    fn flush() {
        let _ = HANDLE.try_with(|handle| handle.0.flush::<Quiescent>(global()));
    }
}

/// Announce a quiescent point for the calling thread.
///
/// A no-op inside a region; the outermost region exit already counts as a
/// quiescent point, so only threads with long op-free stretches need this.
pub fn quiescent_state() {
    let _ = HANDLE.try_with(|handle| handle.0.quiesce::<Quiescent>(global()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn online_record_blocks_until_it_reobserves() {
        assert!(Quiescent::blocks_advance(pack_state(3, true), 4));
        assert!(!Quiescent::blocks_advance(pack_state(4, true), 4));
        // Offline (exited) threads never block.
        assert!(!Quiescent::blocks_advance(0, 4));
    }
}
