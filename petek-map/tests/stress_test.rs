//! Parallel workloads mixing every map operation.

use petek::Reclaim;
use petek_map::{DefaultHashBuilder, VyukovMap};
use std::sync::Arc;
use std::thread;

const MAX_ITERATIONS: usize = 8000;

fn parallel_usage<R: Reclaim>() {
    const THREADS: i64 = 8;
    const KEYS_PER_THREAD: i64 = 8;

    let map: Arc<VyukovMap<i64, i64, DefaultHashBuilder, R>> = Arc::new(
        VyukovMap::with_capacity_and_hasher(8, DefaultHashBuilder::default()),
    );

    let mut handles = Vec::new();
    for t in 0..THREADS {
        let map = map.clone();
        handles.push(thread::spawn(move || {
            for k in t * KEYS_PER_THREAD..(t + 1) * KEYS_PER_THREAD {
                let outer = R::enter();
                for j in 0..MAX_ITERATIONS / KEYS_PER_THREAD as usize {
                    let inner = R::enter();
                    assert!(map.emplace(k, k), "k={k} j={j} thread={t}");
                    for x in 0..10 {
                        let accessor = map
                            .try_get_value(&k)
                            .unwrap_or_else(|| panic!("k={k} j={j} x={x} thread={t}"));
                        assert_eq!(*accessor, k, "k={k} j={j} x={x} thread={t}");
                    }
                    if (j + t as usize) % 8 == 0 {
                        // Iterate, checking invariants, erasing our key
                        // through the cursor when we meet it.
                        let mut cursor = map.begin();
                        while cursor.valid() {
                            assert_eq!(cursor.key(), cursor.value());
                            if *cursor.key() == k {
                                map.erase_at(&mut cursor);
                            } else {
                                cursor.advance();
                            }
                        }
                        // The cursor erase may have missed a concurrent
                        // relocation; our key is exclusively ours.
                        map.erase(&k);
                    } else if (j + t as usize) % 4 == 0 {
                        let accessor = map.extract(&k).expect("extract own key");
                        assert_eq!(*accessor, k);
                    } else {
                        assert!(map.erase(&k), "k={k} j={j} thread={t}");
                    }
                    drop(inner);
                }
                drop(outer);
            }
            R::flush();
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

fn parallel_usage_with_same_values<R: Reclaim>() {
    const THREADS: i64 = 8;

    let map: Arc<VyukovMap<i64, i64, DefaultHashBuilder, R>> = Arc::new(
        VyukovMap::with_capacity_and_hasher(8, DefaultHashBuilder::default()),
    );

    let mut handles = Vec::new();
    for t in 0..THREADS {
        let map = map.clone();
        handles.push(thread::spawn(move || {
            for j in 0..MAX_ITERATIONS / 10 {
                for k in 0..10i64 {
                    let guard = R::enter();
                    map.emplace(k, k);
                    if let Some(accessor) = map.try_get_value(&k) {
                        assert_eq!(*accessor, k, "j={j} thread={t}");
                    }
                    if j % 8 == 0 {
                        for entry in map.iter() {
                            assert_eq!(entry.key(), entry.value());
                        }
                    } else if j % 4 == 0 {
                        if let Some(mut cursor) = map.find(&k) {
                            map.erase_at(&mut cursor);
                        }
                    } else {
                        map.erase(&k);
                    }
                    drop(guard);
                }
            }
            R::flush();
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}

fn concurrent_growth<R: Reclaim>() {
    const THREADS: i64 = 8;
    const PER_THREAD: i64 = 4000;

    let map: Arc<VyukovMap<i64, i64, DefaultHashBuilder, R>> = Arc::new(
        VyukovMap::with_capacity_and_hasher(8, DefaultHashBuilder::default()),
    );

    let mut handles = Vec::new();
    for t in 0..THREADS {
        let map = map.clone();
        handles.push(thread::spawn(move || {
            for i in 0..PER_THREAD {
                let key = t * PER_THREAD + i;
                assert!(map.emplace(key, key * 2));
            }
            R::flush();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(map.len(), (THREADS * PER_THREAD) as usize);
    for key in 0..THREADS * PER_THREAD {
        assert_eq!(*map.try_get_value(&key).unwrap(), key * 2, "key {key} lost");
    }
}

fn insert_remove_cycles<R: Reclaim>() {
    const THREADS: i64 = 4;

    let map: Arc<VyukovMap<i64, String, DefaultHashBuilder, R>> = Arc::new(
        VyukovMap::with_capacity_and_hasher(8, DefaultHashBuilder::default()),
    );

    let mut handles = Vec::new();
    for t in 0..THREADS {
        let map = map.clone();
        handles.push(thread::spawn(move || {
            for i in 0..2000 {
                let key = t * 2000 + i;
                map.emplace(key, key.to_string());
                if i % 2 == 0 {
                    assert!(map.erase(&key));
                }
            }
            R::flush();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    for t in 0..THREADS {
        for i in 0..2000 {
            let key = t * 2000 + i;
            let present = map.try_get_value(&key).is_some();
            assert_eq!(present, i % 2 != 0, "key {key}");
        }
    }
}

#[test]
#[cfg_attr(miri, ignore)]
fn epoch_parallel_usage() {
    parallel_usage::<petek::Epoch>();
}

#[test]
#[cfg_attr(miri, ignore)]
fn qsbr_parallel_usage() {
    parallel_usage::<petek::Quiescent>();
}

#[test]
#[cfg_attr(miri, ignore)]
fn epoch_parallel_usage_with_same_values() {
    parallel_usage_with_same_values::<petek::Epoch>();
}

#[test]
#[cfg_attr(miri, ignore)]
fn qsbr_parallel_usage_with_same_values() {
    parallel_usage_with_same_values::<petek::Quiescent>();
}

#[test]
#[cfg_attr(miri, ignore)]
fn epoch_concurrent_growth() {
    concurrent_growth::<petek::Epoch>();
}

#[test]
#[cfg_attr(miri, ignore)]
fn qsbr_concurrent_growth() {
    concurrent_growth::<petek::Quiescent>();
}

#[test]
#[cfg_attr(miri, ignore)]
fn epoch_insert_remove_cycles() {
    insert_remove_cycles::<petek::Epoch>();
}

#[test]
#[cfg_attr(miri, ignore)]
fn qsbr_insert_remove_cycles() {
    insert_remove_cycles::<petek::Quiescent>();
}
