use pagegraph::{DisjointSetStruct, PagedDisjointSetStruct};
use petgraph::unionfind::UnionFind;
use proptest::prelude::*;

const N: u64 = 64;

proptest! {
    #[test]
    fn matches_sequential_union_find(pairs in proptest::collection::vec((0..N, 0..N), 0..200)) {
        let dss = PagedDisjointSetStruct::new(N);
        let mut reference = UnionFind::<usize>::new(N as usize);
        for &(p, q) in &pairs {
            dss.union(p, q);
            reference.union(p as usize, q as usize);
        }
        for p in 0..N {
            for q in (p + 1)..N {
                prop_assert_eq!(
                    dss.same_set(p, q),
                    reference.equiv(p as usize, q as usize),
                    "nodes {} and {}", p, q
                );
            }
            // The smallest member of a set is its root.
            let smallest = (0..=p).find(|&m| reference.equiv(m as usize, p as usize)).unwrap();
            prop_assert_eq!(dss.set_id_of(p), smallest);
        }
    }

    #[test]
    fn concurrent_unions_match_sequential(pairs in proptest::collection::vec((0..N, 0..N), 0..200)) {
        let dss = PagedDisjointSetStruct::new(N);
        let mut reference = UnionFind::<usize>::new(N as usize);
        for &(p, q) in &pairs {
            reference.union(p as usize, q as usize);
        }
        std::thread::scope(|scope| {
            for chunk in pairs.chunks(16) {
                let dss = &dss;
                scope.spawn(move || {
                    for &(p, q) in chunk {
                        dss.union(p, q);
                        dss.find(q);
                    }
                });
            }
        });
        for p in 0..N {
            for q in 0..N {
                prop_assert_eq!(dss.same_set(p, q), reference.equiv(p as usize, q as usize));
            }
        }
    }
}
