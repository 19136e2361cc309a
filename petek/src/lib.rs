//! Petek: region-based safe memory reclamation with pluggable strategies.
//!
//! Petek lets lock-free and optimistically-read data structures defer the
//! destruction of unlinked heap objects until no reader can still hold a
//! reference to them. The contract is expressed by the [`Reclaim`] trait:
//!
//! - a **region guard** ([`Reclaim::enter`]) marks the calling thread as a
//!   potential reader; objects retired while any guard is live on some
//!   thread stay addressable for that thread,
//! - a **guarded pointer** ([`GuardedPtr`]) pins one specific object beyond
//!   the region it was loaded in,
//! - **retire** ([`Reclaim::retire`]) hands an unlinked object to the
//!   reclaimer for deferred destruction.
//!
//! Two strategies ship: [`Epoch`] (epoch-based, the default) and
//! [`Quiescent`] (quiescent-state-based). Both are drop-in behind the same
//! trait; data structures are written once and parameterized over the
//! strategy.
//!
//! # Example
//!
//! ```rust
//! use core::sync::atomic::Ordering;
//! use petek::{Atomic, Epoch, Reclaim, Reclaimable, Retired};
//!
//! #[repr(C)]
//! struct Node {
//!     link: Retired,
//!     value: u64,
//! }
//! unsafe impl Reclaimable for Node {}
//!
//! let node = Box::into_raw(Box::new(Node { link: Retired::new(), value: 7 }));
//! let cell = Atomic::new(node);
//!
//! let guard = Epoch::enter();
//! let shared = cell.load(Ordering::Acquire, &guard);
//! assert_eq!(unsafe { shared.deref() }.value, 7);
//!
//! let old = cell.swap(petek::Shared::null(), Ordering::AcqRel, &guard);
//! unsafe { Epoch::retire(old.as_raw()) };
//! drop(guard);
//! Epoch::flush();
//! ```

#![warn(missing_docs)]

mod atomic;
mod collector;
mod epoch;
mod managed;
mod qsbr;
mod reclaim;
mod registry;

pub use atomic::{Atomic, Shared};
pub use epoch::Epoch;
pub use managed::ManagedPtr;
pub use qsbr::{Quiescent, quiescent_state};
pub use reclaim::{GuardedPtr, Reclaim, Reclaimable, Region, Retired};

// Re-export for convenience
pub use core::sync::atomic::Ordering;
