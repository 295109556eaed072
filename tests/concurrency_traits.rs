use pagegraph::{
    AtomicBitSet, AtomicPagedArray, CsrGraph, LoggingProgressTracker, MemoryGauge, PagedArray,
    PagedDisjointSetStruct, Partition, RemappingDisjointSetStruct, Scheduler, TerminationFlag,
    TopologicalSortResult,
};
use std::collections::HashMap;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn shared_state_is_send_sync() {
    assert_send_sync::<PagedArray<u64>>();
    assert_send_sync::<AtomicPagedArray>();
    assert_send_sync::<AtomicBitSet>();
    assert_send_sync::<PagedDisjointSetStruct>();
    assert_send_sync::<RemappingDisjointSetStruct<HashMap<u64, u64>>>();
    assert_send_sync::<CsrGraph>();
    assert_send_sync::<Partition>();
    assert_send_sync::<Scheduler>();
    assert_send_sync::<TerminationFlag>();
    assert_send_sync::<LoggingProgressTracker>();
    assert_send_sync::<MemoryGauge>();
    assert_send_sync::<TopologicalSortResult>();
}
