use serde::Serialize;
use std::cell::RefCell;

///
/// ObsCounters
///
/// Thread-local accumulation of compile/serialize activity. Thread-local
/// because every core call is synchronous and CPU-bound; embeddings that
/// want process-wide aggregation install their own sink.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ObsCounters {
    pub filters_compiled: u64,
    pub filter_nodes: u64,
    pub orderings_compiled: u64,
    pub order_terms: u64,
    pub order_joins: u64,
    pub includes_resolved: u64,
    pub include_paths: u64,
    pub serialize_calls: u64,
    pub entities_serialized: u64,
    pub relations_serialized: u64,
}

thread_local! {
    static STATE: RefCell<ObsCounters> = RefCell::new(ObsCounters::default());
}

pub(crate) fn with_state_mut<T>(f: impl FnOnce(&mut ObsCounters) -> T) -> T {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

/// Snapshot the current counters for endpoint/test plumbing.
#[must_use]
pub fn report() -> ObsCounters {
    STATE.with(|state| *state.borrow())
}

/// Reset all counters.
pub fn reset_all() {
    STATE.with(|state| {
        *state.borrow_mut() = ObsCounters::default();
    });
}
