//! Integration Tests for Memoization
//!
//! Exercises the public API end to end: hits and misses, capacity, recency,
//! expiration and per-owner isolation.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use memorize::cache::ManualClock;
use memorize::{memorize_fn, ArgKey, CacheConfig, MemoOptions, MethodMemo};

// == Helper Functions ==

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

// == Hit / Miss ==

#[test]
fn test_second_call_is_served_from_cache() {
    let counter = AtomicUsize::new(0);
    let memo = memorize_fn(
        |(a, b): (u32, u32)| {
            counter.fetch_add(1, Ordering::SeqCst);
            a * b
        },
        MemoOptions::new(),
    );

    assert_eq!(memo.call((6, 7)), 42);
    assert_eq!(memo.call((6, 7)), 42);
    assert_eq!(calls(&counter), 1);

    let stats = memo.stats();
    assert_eq!(stats.cache.hits, 1);
    assert_eq!(stats.cache.misses, 1);
}

#[test]
fn test_default_configuration() {
    let memo = memorize_fn(|(n,): (u32,)| n, MemoOptions::default());
    assert_eq!(
        memo.config(),
        CacheConfig {
            capacity: 20,
            ttl_ms: 0
        }
    );

    // 20 distinct arguments stay resident, the 21st evicts the first
    for n in 0..20 {
        memo.call((n,));
    }
    assert_eq!(memo.stats().cache.evictions, 0);
    memo.call((20,));
    assert_eq!(memo.stats().cache.evictions, 1);
    assert_eq!(memo.stats().cache.total_entries, 20);
}

// == Capacity & Recency ==

#[test]
fn test_capacity_bound_evicts_least_recently_used() {
    let counter = AtomicUsize::new(0);
    let memo = memorize_fn(
        |(key,): (String,)| {
            counter.fetch_add(1, Ordering::SeqCst);
            key.len()
        },
        MemoOptions::new().with_size(2),
    );

    memo.call(("k1".to_string(),));
    memo.call(("k2".to_string(),));
    memo.call(("k1".to_string(),)); // k1 read again
    memo.call(("k3".to_string(),)); // k2 is evicted, not k1
    assert_eq!(calls(&counter), 3);

    memo.call(("k1".to_string(),));
    assert_eq!(calls(&counter), 3, "k1 survived");
    memo.call(("k2".to_string(),));
    assert_eq!(calls(&counter), 4, "k2 was evicted");
}

// == TTL ==

#[test]
fn test_capitalize_scenario() {
    let clock = ManualClock::new(0);
    let counter = AtomicUsize::new(0);
    let memo = memorize_fn(
        |(word,): (String,)| {
            counter.fetch_add(1, Ordering::SeqCst);
            capitalize(&word)
        },
        MemoOptions::new().with_duration(3000),
    )
    .with_clock(Arc::new(clock.clone()));

    assert_eq!(memo.call(("cat".to_string(),)), "Cat");
    assert_eq!(calls(&counter), 1);

    clock.set(2999);
    assert_eq!(memo.call(("cat".to_string(),)), "Cat");
    assert_eq!(calls(&counter), 1);

    clock.set(3001);
    assert_eq!(memo.call(("cat".to_string(),)), "Cat");
    assert_eq!(calls(&counter), 2);
}

#[test]
fn test_expiry_counts_from_insertion_not_last_hit() {
    let clock = ManualClock::new(10_000);
    let counter = AtomicUsize::new(0);
    let memo = memorize_fn(
        |(n,): (u32,)| {
            counter.fetch_add(1, Ordering::SeqCst);
            n
        },
        MemoOptions::new().with_duration(500),
    )
    .with_clock(Arc::new(clock.clone()));

    memo.call((1,));
    for _ in 0..5 {
        clock.advance(100);
        memo.call((1,));
    }
    assert_eq!(calls(&counter), 1);

    clock.advance(1);
    memo.call((1,));
    assert_eq!(calls(&counter), 2);
    assert_eq!(memo.stats().cache.expirations, 1);
}

// == Argument Sensitivity ==

#[test]
fn test_argument_order_and_arity() {
    let counter = AtomicUsize::new(0);
    let memo = memorize_fn(
        |(a, b): (i32, Option<i32>)| {
            counter.fetch_add(1, Ordering::SeqCst);
            a - b.unwrap_or(0)
        },
        MemoOptions::new(),
    );

    assert_eq!(memo.call((1, Some(2))), -1);
    assert_eq!(memo.call((2, Some(1))), 1);
    assert_eq!(memo.call((1, None)), 1);
    assert_eq!(calls(&counter), 3);

    // A trailing None is an argument, not an omission
    assert_ne!(
        ArgKey::derive(&(1,)).unwrap(),
        ArgKey::derive(&(1, None::<i32>)).unwrap()
    );
}

#[test]
fn test_structurally_equal_maps_collide() {
    let counter = AtomicUsize::new(0);
    let memo = memorize_fn(
        |(weights,): (HashMap<String, u32>,)| {
            counter.fetch_add(1, Ordering::SeqCst);
            weights.values().sum::<u32>()
        },
        MemoOptions::new(),
    );

    let mut first = HashMap::new();
    let mut second = HashMap::new();
    for (i, name) in ["a", "b", "c", "d", "e"].iter().enumerate() {
        first.insert(name.to_string(), i as u32);
    }
    for (i, name) in ["a", "b", "c", "d", "e"].iter().enumerate().rev() {
        second.insert(name.to_string(), i as u32);
    }

    assert_eq!(memo.call((first,)), 10);
    assert_eq!(memo.call((second,)), 10);
    assert_eq!(calls(&counter), 1);

    let ordered: BTreeMap<String, u32> = BTreeMap::from([("x".to_string(), 1)]);
    let hashed: HashMap<String, u32> = HashMap::from([("x".to_string(), 1)]);
    assert_eq!(
        ArgKey::derive(&(ordered,)).unwrap(),
        ArgKey::derive(&(hashed,)).unwrap()
    );
}

#[test]
fn test_non_finite_floats_run_uncached() {
    let counter = AtomicUsize::new(0);
    let memo = memorize_fn(
        |(x,): (f64,)| {
            counter.fetch_add(1, Ordering::SeqCst);
            format!("{x}")
        },
        MemoOptions::new(),
    );

    assert_eq!(memo.call((f64::NAN,)), "NaN");
    assert_eq!(memo.call((f64::INFINITY,)), "inf");
    assert_eq!(memo.call((f64::NEG_INFINITY,)), "-inf");
    assert_eq!(memo.call((f64::NAN,)), "NaN");
    assert_eq!(calls(&counter), 4);

    let stats = memo.stats();
    assert_eq!(stats.uncacheable, 4);
    assert_eq!(stats.cache.total_entries, 0);

    // Finite values are still cached
    assert_eq!(memo.call((1.5,)), "1.5");
    assert_eq!(memo.call((1.5,)), "1.5");
    assert_eq!(calls(&counter), 5);
}

#[test]
fn test_nested_options_are_distinct_arguments() {
    let counter = AtomicUsize::new(0);
    let memo = memorize_fn(
        |(flag,): (Option<Option<u8>>,)| {
            counter.fetch_add(1, Ordering::SeqCst);
            flag
        },
        MemoOptions::new(),
    );

    assert_eq!(memo.call((None,)), None);
    assert_eq!(memo.call((Some(None),)), Some(None));
    assert_eq!(memo.call((Some(Some(0)),)), Some(Some(0)));
    assert_eq!(calls(&counter), 3);

    assert_eq!(memo.call((Some(None),)), Some(None));
    assert_eq!(calls(&counter), 3);
    assert_eq!(memo.stats().cache.total_entries, 3);
}

#[test]
fn test_maps_with_composite_keys_are_cached() {
    let counter = AtomicUsize::new(0);
    let memo = memorize_fn(
        |(grid,): (HashMap<(u8, u8), char>,)| {
            counter.fetch_add(1, Ordering::SeqCst);
            grid.len()
        },
        MemoOptions::new(),
    );
    let grid = HashMap::from([((0, 0), 'x'), ((1, 1), 'o')]);

    assert_eq!(memo.call((grid.clone(),)), 2);
    assert_eq!(memo.call((grid,)), 2);
    assert_eq!(calls(&counter), 1);
    assert_eq!(memo.stats().uncacheable, 0);
}

// == Per-Owner Isolation ==

struct Thermometer {
    offset: i32,
    reads: AtomicUsize,
}

impl Thermometer {
    fn new(offset: i32) -> Arc<Self> {
        Arc::new(Self {
            offset,
            reads: AtomicUsize::new(0),
        })
    }

    fn calibrated(&self, (raw,): (i32,)) -> i32 {
        self.reads.fetch_add(1, Ordering::SeqCst);
        raw + self.offset
    }
}

type CalibrateMemo = MethodMemo<Thermometer, (i32,), i32, fn(&Thermometer, (i32,)) -> i32>;

fn calibrate_memo(options: MemoOptions) -> CalibrateMemo {
    MethodMemo::new(Thermometer::calibrated as fn(&Thermometer, (i32,)) -> i32, options)
}

#[test]
fn test_owners_with_identical_arguments_are_isolated() {
    let memo = calibrate_memo(MemoOptions::new());
    let kitchen = Thermometer::new(1);
    let garage = Thermometer::new(-3);

    assert_eq!(memo.call(&kitchen, (20,)), 21);
    assert_eq!(memo.call(&garage, (20,)), 17);
    assert_eq!(memo.call(&kitchen, (20,)), 21);
    assert_eq!(memo.call(&garage, (20,)), 17);

    assert_eq!(calls(&kitchen.reads), 1);
    assert_eq!(calls(&garage.reads), 1);
}

#[test]
fn test_eviction_is_scoped_to_one_owner() {
    let memo = calibrate_memo(MemoOptions::new().with_size(2));
    let a = Thermometer::new(0);
    let b = Thermometer::new(0);

    memo.call(&b, (1,));
    memo.call(&b, (2,));
    for raw in 0..10 {
        memo.call(&a, (raw,));
    }

    memo.call(&b, (1,));
    memo.call(&b, (2,));
    assert_eq!(calls(&b.reads), 2);
    assert_eq!(memo.stats_for(&b).unwrap().cache.evictions, 0);
    assert_eq!(memo.stats_for(&a).unwrap().cache.evictions, 8);
}

#[test]
fn test_owner_lifetime_is_not_extended() {
    let memo = calibrate_memo(MemoOptions::new());
    let owner = Thermometer::new(0);
    let weak = Arc::downgrade(&owner);

    memo.call(&owner, (1,));
    assert_eq!(memo.scope_count(), 1);

    drop(owner);
    assert!(weak.upgrade().is_none());
    assert_eq!(memo.scope_count(), 0);

    let replacement = Thermometer::new(0);
    memo.call(&replacement, (1,));
    assert_eq!(calls(&replacement.reads), 1, "new owner starts with an empty scope");
    assert_eq!(memo.scope_count(), 1);
}

#[test]
fn test_method_memo_shared_across_threads() {
    let memo = Arc::new(calibrate_memo(MemoOptions::new()));
    let owner = Thermometer::new(5);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let memo = Arc::clone(&memo);
            let owner = Arc::clone(&owner);
            std::thread::spawn(move || {
                for raw in 0..10 {
                    assert_eq!(memo.call(&owner, (raw,)), raw + 5);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Racing misses may compute twice, but every argument is cached afterwards
    assert!(calls(&owner.reads) >= 10);
    assert_eq!(memo.stats_for(&owner).unwrap().cache.total_entries, 10);
}
