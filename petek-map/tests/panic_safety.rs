//! Panicking user callbacks must leave buckets unlocked and the map
//! consistent.

use petek_map::{DefaultHashBuilder, VyukovMap};
use std::hash::{Hash, Hasher};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Key whose equality always panics; hashing stays well-behaved. Mirrors
/// comparator failures that can also arise from guard acquisition inside
/// user-provided comparisons.
#[derive(Debug)]
struct PanickingKey(i64);

impl Hash for PanickingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialEq for PanickingKey {
    fn eq(&self, _other: &Self) -> bool {
        panic!("comparison failure");
    }
}

impl Eq for PanickingKey {}

macro_rules! reclaimer_suite {
    ($name:ident, $reclaim:ty) => {
        mod $name {
            use super::*;

            type Map<K, V> = VyukovMap<K, V, DefaultHashBuilder, $reclaim>;

            #[test]
            fn panicking_lazy_factory_unlocks_the_bucket() {
                let map: Map<i64, i64> =
                    Map::with_capacity_and_hasher(8, DefaultHashBuilder::default());
                map.emplace(42, 42);
                let result = catch_unwind(AssertUnwindSafe(|| {
                    map.get_or_emplace_lazy(43, || -> i64 { panic!("factory failure") })
                }));
                assert!(result.is_err());
                // The failed key stays absent and the bucket is usable.
                assert!(map.try_get_value(&43).is_none());
                assert!(map.emplace(43, 1));
                assert!(map.erase(&42));
            }

            #[test]
            fn panicking_equality_during_erase_keeps_the_entry() {
                let map: Map<PanickingKey, i64> =
                    Map::with_capacity_and_hasher(8, DefaultHashBuilder::default());
                // Insert never runs user equality on an empty chain.
                assert!(map.emplace(PanickingKey(42), 42));
                let result =
                    catch_unwind(AssertUnwindSafe(|| map.erase(&PanickingKey(42))));
                assert!(result.is_err());
                // The bucket is unlocked and the entry survived.
                let cursor = map.begin();
                assert!(cursor.valid());
                assert_eq!(cursor.key().0, 42);
                assert_eq!(*cursor.value(), 42);
            }

            #[test]
            fn panicking_equality_during_lookup_leaves_map_usable() {
                let map: Map<PanickingKey, i64> =
                    Map::with_capacity_and_hasher(8, DefaultHashBuilder::default());
                assert!(map.emplace(PanickingKey(7), 7));
                let result = catch_unwind(AssertUnwindSafe(|| {
                    map.try_get_value(&PanickingKey(7)).is_some()
                }));
                assert!(result.is_err());
                // A different bucket is unaffected and iteration still works.
                let mut seen = 0;
                for entry in map.iter() {
                    assert_eq!(*entry.value(), 7);
                    seen += 1;
                }
                assert_eq!(seen, 1);
            }
        }
    };
}

reclaimer_suite!(epoch, petek::Epoch);
reclaimer_suite!(qsbr, petek::Quiescent);
