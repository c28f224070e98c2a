// Arena-based storage for reactive graph metadata
//
// Two thread-local slabs back the graph:
// - Signal arena: subscribers of every change marker, plus the observer that
//   produces it when the signal is a computed's output
// - Observer arena: state, sources, and callback of every effect and computed
//
// Values never live here. Observable<T> and Computed<T> keep their data next to
// the Signal that describes it; the arena only holds graph edges. The graph is
// single-threaded: each thread builds its own independent graph.

pub mod observer_arena;
pub mod signal_arena;

use foldhash::fast::{FixedState, FoldHasher};
use std::hash::BuildHasher;

pub use observer_arena::{
    CurrentObserverGuard, ObserverId, ObserverKind, ObserverMetadata, current_observer,
    is_observer_running, observer_arena_insert, observer_arena_remove, pending_len,
    take_pending,
};
pub use signal_arena::{SignalId, signal_arena_insert, signal_arena_remove};

/// Zero-sized fixed-seed hasher for the arena's edge sets
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeHasher;

impl BuildHasher for EdgeHasher {
    type Hasher = FoldHasher<'static>;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        FixedState::with_seed(0x9e37_79b9_7f4a_7c15).build_hasher()
    }
}

/// Set of graph edges keyed by node id
pub type EdgeSet<T> = std::collections::HashSet<T, EdgeHasher>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_hasher_is_stable_across_instances() {
        assert_eq!(std::mem::size_of::<EdgeHasher>(), 0);
        assert_eq!(EdgeHasher.hash_one(7u32), EdgeHasher.hash_one(7u32));
    }
}
