//! Tests for the union-find structures.

use std::collections::HashMap;

use super::*;
use crate::Error;

#[test]
fn starts_as_singletons() {
    let dss = PagedDisjointSetStruct::new(4);
    for node in 0..4 {
        assert_eq!(dss.find(node), node);
        assert_eq!(dss.set_id_of(node), node);
    }
    assert_eq!(dss.set_count(), 4);
}

#[test]
fn union_joins_and_min_id_wins() {
    let dss = PagedDisjointSetStruct::new(6);
    dss.union(5, 3);
    assert_eq!(dss.find(5), 3);
    dss.union(3, 1);
    assert_eq!(dss.find(5), 1);
    assert!(dss.same_set(1, 5));
    assert!(!dss.same_set(0, 5));
    assert_eq!(dss.set_count(), 4);
}

#[test]
fn self_union_is_a_no_op() {
    let dss = PagedDisjointSetStruct::new(3);
    dss.union(2, 2);
    assert_eq!(dss.parent().get(2), ROOT);
    assert_eq!(dss.set_count(), 3);
}

#[test]
fn union_is_idempotent_and_commutative() {
    let forward = PagedDisjointSetStruct::new(8);
    let backward = PagedDisjointSetStruct::new(8);
    let pairs = [(0, 4), (4, 7), (2, 3), (7, 1)];
    for &(p, q) in &pairs {
        forward.union(p, q);
        forward.union(p, q);
    }
    for &(p, q) in pairs.iter().rev() {
        backward.union(q, p);
    }
    for node in 0..8 {
        assert_eq!(forward.find(node), backward.find(node));
    }
}

#[test]
fn find_compresses_but_find_no_opt_does_not() {
    let dss = PagedDisjointSetStruct::new(5);
    // Build the chain 4 -> 3 -> 2 -> 1 -> 0 by hand.
    for node in 1..5 {
        dss.parent().set(node, node as i64 - 1);
    }
    assert_eq!(dss.find_no_opt(4), 0);
    assert_eq!(dss.parent().get(4), 3);
    assert_eq!(dss.find(4), 0);
    // Halving re-pointed 4 at its former grandparent.
    assert_eq!(dss.parent().get(4), 2);
    assert_eq!(dss.find(4), 0);
    assert_eq!(dss.parent().get(4), 0);
}

#[test]
fn reset_restores_singletons() {
    let mut dss = PagedDisjointSetStruct::new(3);
    dss.union(0, 2);
    dss.reset();
    assert_eq!(dss.set_count(), 3);
}

#[test]
fn seeded_labels() {
    let seed: HashMap<u64, u64> = [(0, 100), (1, 100), (2, 200)].into_iter().collect();
    let dss = RemappingDisjointSetStruct::new(5, seed);
    assert_eq!(dss.set_id_of(0), 100);
    assert_eq!(dss.set_id_of(1), 100);
    assert_eq!(dss.set_id_of(2), 200);
    assert_eq!(dss.set_id_of(3), 3);
    assert_eq!(dss.set_id_of(4), 4);
    assert!(dss.same_set(0, 1));
    assert_eq!(dss.set_count(), 4);
}

#[test]
fn seeded_merge_keeps_label_of_smaller_root() {
    let seed: Vec<Option<u64>> = vec![None, Some(7), None, Some(9), Some(7)];
    let mut dss = RemappingDisjointSetStruct::new(5, seed);
    assert_eq!(dss.set_id_of(4), 7);
    dss.union(4, 3);
    assert_eq!(dss.set_id_of(3), 7);
    dss.union(0, 3);
    assert_eq!(dss.set_id_of(4), 0);

    dss.reset();
    assert_eq!(dss.set_id_of(4), 7);
    assert_eq!(dss.set_id_of(3), 9);
    assert_eq!(dss.set_id_of(0), 0);
}

#[test]
fn label_closure() {
    let labels = LabelFn(|node: u64| (node % 2 == 0).then_some(42u64));
    let dss = RemappingDisjointSetStruct::new(4, labels);
    assert_eq!(dss.set_id_of(0), 42);
    assert_eq!(dss.set_id_of(2), 42);
    assert_eq!(dss.set_id_of(3), 3);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn union_past_capacity_panics() {
    let dss = PagedDisjointSetStruct::new(2);
    dss.union(0, 2);
}

#[test]
fn try_variants_reject_before_mutation() {
    let dss = PagedDisjointSetStruct::new(2);
    assert!(matches!(
        dss.try_union(0, 2),
        Err(Error::IndexOutOfBounds { index: 2, capacity: 2 })
    ));
    assert_eq!(dss.set_count(), 2);
    assert!(dss.try_union(0, 1).is_ok());
    assert_eq!(dss.try_set_id_of(1).unwrap(), 0);
}

#[test]
fn concurrent_unions_never_lose_a_merge() {
    const N: u64 = 10_000;
    let dss = PagedDisjointSetStruct::new(N);
    std::thread::scope(|scope| {
        for t in 0..8u64 {
            let dss = &dss;
            scope.spawn(move || {
                // Each worker links a strided subset of the chain i -> i + 1.
                let mut node = t;
                while node + 1 < N {
                    dss.union(node, node + 1);
                    let _ = dss.find(node);
                    node += 8;
                }
            });
        }
    });
    assert_eq!(dss.set_count(), 1);
    for node in 0..N {
        assert_eq!(dss.find(node), 0);
    }
}

#[test]
fn memory_estimation_ranges() {
    let plain = PagedDisjointSetStruct::memory_estimation(1_000);
    assert_eq!(plain.min(), plain.max());
    let seeded = RemappingDisjointSetStruct::<HashMap<u64, u64>>::memory_estimation(1_000);
    assert_eq!(seeded.min(), plain.min());
    assert!(seeded.max() > plain.max());
}
