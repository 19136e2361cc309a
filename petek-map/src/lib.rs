//! Vyukov-style concurrent hash map over the `petek` reclamation substrate.
//!
//! [`VyukovMap`] combines fine-grained per-bucket locking for writers with
//! lock-free optimistic reads: every bucket carries a version word whose
//! low bits are a writer lock and whose counter lets readers validate that
//! a scan observed a consistent snapshot. The table grows cooperatively:
//! writers migrate buckets into the next generation as a side effect of
//! their own writes. All deferred destruction (entries, old table
//! generations) goes through a pluggable [`petek::Reclaim`] strategy.
//!
//! # Example
//!
//! ```rust
//! use petek_map::VyukovMap;
//!
//! let map = VyukovMap::new();
//! assert!(map.emplace(42, "a"));
//! assert!(!map.emplace(42, "b"));
//! let acc = map.try_get_value(&42).unwrap();
//! assert_eq!(*acc, "a");
//! assert!(map.erase(&42));
//! ```

#![warn(missing_docs)]

mod accessor;
mod bucket;
mod iter;
mod map;
mod table;

pub use accessor::Accessor;
pub use iter::{Cursor, Iter};
pub use map::VyukovMap;

/// The default hash builder (`foldhash`'s fixed-seed fast hasher).
pub use foldhash::fast::FixedState as DefaultHashBuilder;
