//! Deterministic reclamation lifecycle for the epoch strategy.
//!
//! Single #[test] on purpose: the assertions depend on global epoch
//! advancement, which any concurrently pinned thread in the same process
//! would stall.

use petek::{
    Atomic, Epoch, GuardedPtr, ManagedPtr, Ordering, Reclaim, Reclaimable, Retired, Shared,
};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

#[repr(C)]
struct TestNode {
    link: Retired,
    value: usize,
    freed: Arc<AtomicBool>,
}

unsafe impl Reclaimable for TestNode {}

impl TestNode {
    fn new(value: usize, freed: &Arc<AtomicBool>) -> *mut Self {
        Box::into_raw(Box::new(Self {
            link: Retired::new(),
            value,
            freed: freed.clone(),
        }))
    }
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.freed.store(true, Ordering::Release);
    }
}

#[test]
fn reclamation_lifecycle() {
    // Retire with no region open: the next flush destroys the node.
    let freed = Arc::new(AtomicBool::new(false));
    let node = TestNode::new(1, &freed);
    unsafe { Epoch::retire(node) };
    Epoch::flush();
    assert!(freed.load(Ordering::Acquire));

    // A live guard pins: retire + flush must not free.
    let freed = Arc::new(AtomicBool::new(false));
    let cell = Atomic::new(TestNode::new(2, &freed));
    let guard = Epoch::enter();
    let shared = cell.load(Ordering::Acquire, &guard);
    assert_eq!(unsafe { shared.deref() }.value, 2);
    let old = cell.swap(Shared::null(), Ordering::AcqRel, &guard);
    unsafe { Epoch::retire(old.as_raw()) };
    Epoch::flush();
    assert!(
        !freed.load(Ordering::Acquire),
        "node freed while a guard pinned it"
    );
    assert_eq!(unsafe { shared.deref() }.value, 2);
    drop(guard);
    Epoch::flush();
    assert!(freed.load(Ordering::Acquire));

    // A guarded pointer pins beyond its creating region.
    let freed = Arc::new(AtomicBool::new(false));
    let cell = Atomic::new(TestNode::new(3, &freed));
    let pin: GuardedPtr<TestNode, Epoch> = {
        let guard = Epoch::enter();
        let shared = cell.load(Ordering::Acquire, &guard);
        // SAFETY: loaded under `guard`, pinned while `guard` is live.
        unsafe { GuardedPtr::new(shared.as_raw(), Epoch::enter()) }
    };
    {
        let guard = Epoch::enter();
        let old = cell.swap(Shared::null(), Ordering::AcqRel, &guard);
        unsafe { Epoch::retire(old.as_raw()) };
    }
    Epoch::flush();
    assert!(
        !freed.load(Ordering::Acquire),
        "node freed while a guarded pointer pinned it"
    );
    assert_eq!(pin.value, 3);
    drop(pin);
    Epoch::flush();
    assert!(freed.load(Ordering::Acquire));

    // ManagedPtr retires on drop.
    let freed = Arc::new(AtomicBool::new(false));
    let managed: ManagedPtr<TestNode, Epoch> = ManagedPtr::new(Box::new(TestNode {
        link: Retired::new(),
        value: 4,
        freed: freed.clone(),
    }));
    assert_eq!(managed.value, 4);
    drop(managed);
    Epoch::flush();
    assert!(freed.load(Ordering::Acquire));

    // into_raw transfers ownership without retiring.
    let freed = Arc::new(AtomicBool::new(false));
    let managed: ManagedPtr<TestNode, Epoch> = ManagedPtr::new(Box::new(TestNode {
        link: Retired::new(),
        value: 5,
        freed: freed.clone(),
    }));
    let raw = managed.into_raw();
    Epoch::flush();
    assert!(!freed.load(Ordering::Acquire));
    drop(unsafe { Box::from_raw(raw) });
    assert!(freed.load(Ordering::Acquire));
}
