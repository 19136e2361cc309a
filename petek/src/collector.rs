//! Epoch machinery shared by the concrete strategies.
//!
//! Both shipped strategies are advancement-based: a global epoch moves
//! forward when every relevant thread record permits it, and an object
//! retired at epoch `e` may be destroyed once the epoch reaches `e + 3`.
//! Two advances already rule out any reader that was announced when the
//! object was unlinked; the third absorbs the window where a retirement
//! stamp lags the advancing scan. The strategies differ only in what a
//! record publishes at region boundaries and in when a record blocks
//! advancement; that variation point is the [`Discipline`] trait.

use crate::reclaim::{Reclaimable, Retired};
use crate::registry::Registry;
use core::cell::Cell;
use core::ptr;
use core::sync::atomic::{Ordering, fence};

/// Retirements between advancement attempts.
const ADVANCE_FREQ: usize = 64;

/// Strategy hook: how a thread record participates in the epoch protocol.
pub(crate) trait Discipline: 'static {
    /// State published when a record is claimed.
    fn register_state(epoch: u64) -> u64;

    /// State published on the outermost region entry, or `None` to leave
    /// the record untouched.
    fn enter_state(epoch: u64) -> Option<u64>;

    /// State published on the outermost region exit.
    fn exit_state(epoch: u64) -> u64;

    /// Whether `state` forbids advancing from `epoch` to `epoch + 1`.
    fn blocks_advance(state: u64, epoch: u64) -> bool;
}

/// Global collector for one strategy: the registry plus the advancement
/// scan.
pub(crate) struct Collector {
    pub(crate) registry: Registry,
}

impl Collector {
    pub(crate) fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    /// Advance the global epoch if every record permits it, then reap
    /// whatever the new epoch unlocks from the orphan list.
    pub(crate) fn try_advance<D: Discipline>(&self) {
        let epoch = self.registry.epoch();
        // Pairs with the SeqCst state stores in enter/exit: after this
        // fence the scan observes every announcement made before our epoch
        // read could have been satisfied.
        fence(Ordering::SeqCst);
        for tid in 0..self.registry.scan_limit() {
            let state = self.registry.record(tid).state.load(Ordering::Acquire);
            if D::blocks_advance(state, epoch) {
                return;
            }
        }
        if self.registry.advance_epoch(epoch) {
            let new = epoch + 1;
            let orphans = self.registry.take_orphans(new.saturating_sub(3));
            // SAFETY: every node in the list matured past the three-epoch lag.
            unsafe { free_list(orphans) };
        }
    }
}

/// Destroy a limbo list. Destructors may re-enter `retire`, which pushes
/// onto the caller's (already detached) bins.
pub(crate) unsafe fn free_list(mut head: *mut Retired) {
    while !head.is_null() {
        unsafe {
            let next = (*head).next;
            if let Some(destructor) = (*head).destructor {
                destructor(head);
            }
            head = next;
        }
    }
}

/// Thread-local reclamation state.
///
/// Retired objects go into one of three limbo bins keyed by retirement
/// epoch mod 3. A bin is drained right before reuse: by the time the
/// global epoch returns to the same residue, at least three advances have
/// passed, which meets the required lag exactly.
pub(crate) struct LocalHandle {
    tid: Cell<Option<usize>>,
    nesting: Cell<usize>,
    bins: [Cell<*mut Retired>; 3],
    bin_epochs: [Cell<u64>; 3],
    retired: Cell<usize>,
}

impl LocalHandle {
    pub(crate) const fn new() -> Self {
        Self {
            tid: Cell::new(None),
            nesting: Cell::new(0),
            bins: [
                Cell::new(ptr::null_mut()),
                Cell::new(ptr::null_mut()),
                Cell::new(ptr::null_mut()),
            ],
            bin_epochs: [Cell::new(0), Cell::new(0), Cell::new(0)],
            retired: Cell::new(0),
        }
    }

    /// Get or claim this thread's record.
    fn tid<D: Discipline>(&self, collector: &Collector) -> usize {
        match self.tid.get() {
            Some(tid) => tid,
            None => {
                let tid = collector.registry.alloc_tid();
                let record = collector.registry.record(tid);
                loop {
                    let epoch = collector.registry.epoch();
                    record
                        .state
                        .store(D::register_state(epoch), Ordering::SeqCst);
                    // Re-announce if the epoch moved, as in `enter`.
                    if collector.registry.epoch() == epoch {
                        break;
                    }
                }
                self.tid.set(Some(tid));
                tid
            }
        }
    }

    /// Enter a region. Only the outermost entry publishes state; nested
    /// guards share the outermost guard's protection.
    pub(crate) fn enter<D: Discipline>(&self, collector: &Collector) {
        let nesting = self.nesting.get();
        self.nesting.set(nesting + 1);
        if nesting > 0 {
            return;
        }
        let tid = self.tid::<D>(collector);
        let record = collector.registry.record(tid);
        loop {
            let epoch = collector.registry.epoch();
            match D::enter_state(epoch) {
                None => break,
                Some(state) => {
                    record.state.store(state, Ordering::SeqCst);
                    // If the epoch moved between the read and the
                    // announcement, re-announce so the scan cannot miss us.
                    if collector.registry.epoch() == epoch {
                        break;
                    }
                }
            }
        }
    }

    /// Exit a region. Saturates at zero so dummy guards created during
    /// thread teardown stay no-ops.
    pub(crate) fn exit<D: Discipline>(&self, collector: &Collector) {
        let nesting = self.nesting.get();
        if nesting == 0 {
            return;
        }
        self.nesting.set(nesting - 1);
        if nesting == 1 {
            if let Some(tid) = self.tid.get() {
                let epoch = collector.registry.epoch();
                collector
                    .registry
                    .record(tid)
                    .state
                    .store(D::exit_state(epoch), Ordering::SeqCst);
            }
        }
    }

    /// Publish a quiescent pass. Meaningful only outside any region.
    pub(crate) fn quiesce<D: Discipline>(&self, collector: &Collector) {
        if self.nesting.get() != 0 {
            return;
        }
        let tid = self.tid::<D>(collector);
        let epoch = collector.registry.epoch();
        collector
            .registry
            .record(tid)
            .state
            .store(D::exit_state(epoch), Ordering::SeqCst);
    }

    /// Retire `ptr` into the local bins.
    ///
    /// # Safety
    ///
    /// As [`crate::Reclaim::retire`].
    pub(crate) unsafe fn retire<D: Discipline, T: Reclaimable>(
        &self,
        collector: &Collector,
        ptr: *mut T,
    ) {
        let node = ptr.cast::<Retired>();
        unsafe fn destructor<T>(node: *mut Retired) {
            // SAFETY: retire() was called with a Box-allocated T whose
            // header sits at offset 0; this runs exactly once.
            unsafe { drop(Box::from_raw(node.cast::<T>())) };
        }
        // The fence orders the caller's unlink before the stamp read, so
        // the stamp cannot lag behind an advance that already scanned us.
        fence(Ordering::SeqCst);
        let epoch = collector.registry.epoch();
        // SAFETY: caller hands over ownership; the header is ours now.
        unsafe {
            (*node).destructor = Some(destructor::<T>);
            (*node).epoch = epoch;
        }
        self.push_bin(epoch, node);

        let retired = self.retired.get() + 1;
        self.retired.set(retired);
        if retired.is_multiple_of(ADVANCE_FREQ) {
            collector.try_advance::<D>();
        }
    }

    fn push_bin(&self, epoch: u64, node: *mut Retired) {
        let idx = (epoch % 3) as usize;
        if self.bin_epochs[idx].get() != epoch {
            // The bin holds nodes from at least three epochs back. Detach
            // and re-label before freeing: destructors may re-enter
            // retire() for the same residue.
            let stale = self.bins[idx].replace(ptr::null_mut());
            self.bin_epochs[idx].set(epoch);
            // SAFETY: stale nodes matured past the three-epoch lag.
            unsafe { free_list(stale) };
        }
        unsafe {
            (*node).next = self.bins[idx].get();
        }
        self.bins[idx].set(node);
    }

    /// Force local progress: advance (quiescing between attempts), then
    /// drain every bin that matured.
    pub(crate) fn flush<D: Discipline>(&self, collector: &Collector) {
        for _ in 0..3 {
            self.quiesce::<D>(collector);
            collector.try_advance::<D>();
        }
        let epoch = collector.registry.epoch();
        for idx in 0..3 {
            if !self.bins[idx].get().is_null() && self.bin_epochs[idx].get() + 3 <= epoch {
                let head = self.bins[idx].replace(ptr::null_mut());
                // SAFETY: the bin's epoch is at least three behind.
                unsafe { free_list(head) };
            }
        }
    }

    /// Thread exit: hand unreclaimed bins to the registry and recycle the
    /// tid. Idempotent.
    pub(crate) fn cleanup<D: Discipline>(&self, collector: &Collector) {
        let Some(tid) = self.tid.get() else { return };
        let mut head: *mut Retired = ptr::null_mut();
        for idx in 0..3 {
            let mut bin = self.bins[idx].replace(ptr::null_mut());
            while !bin.is_null() {
                unsafe {
                    let next = (*bin).next;
                    (*bin).next = head;
                    head = bin;
                    bin = next;
                }
            }
        }
        collector.registry.adopt_orphans(head);
        self.tid.set(None);
        self.nesting.set(0);
        collector.registry.free_tid(tid);
    }
}
