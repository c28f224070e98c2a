// Signal arena - storage for signal metadata
//
// A signal only emits: it knows its subscribers and, for computed outputs,
// the single observer that writes it. Observers track sources; signals never do.
//
// PUSH-PULL MODEL:
// - notify() pushes Dirty to direct subscribers and Check further downstream
// - pull() runs the writer of a signal (if stale) before its value is trusted

use super::observer_arena::current_observer;
use super::{EdgeSet, ObserverId};
use slab::Slab;
use std::cell::RefCell;

thread_local! {
    static SIGNAL_ARENA: RefCell<Slab<SignalMetadata>> = const { RefCell::new(Slab::new()) };
}

/// Unique identifier for a signal node in the arena
///
/// Accessing a stale id (after the owning `Signal` dropped) is a no-op.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SignalId(u32);

impl SignalId {
    fn index(self) -> usize {
        self.0 as usize
    }

    /// Read the metadata of this signal, `None` when stale
    pub fn with<F, R>(self, f: F) -> Option<R>
    where
        F: FnOnce(&SignalMetadata) -> R,
    {
        SIGNAL_ARENA
            .try_with(|arena| arena.borrow().get(self.index()).map(f))
            .ok()
            .flatten()
    }

    fn with_mut<F, R>(self, f: F) -> Option<R>
    where
        F: FnOnce(&mut SignalMetadata) -> R,
    {
        SIGNAL_ARENA
            .try_with(|arena| arena.borrow_mut().get_mut(self.index()).map(f))
            .ok()
            .flatten()
    }

    /// Subscribe the running observer (if any) to this signal
    pub fn track(self) {
        let Some(observer) = current_observer() else {
            return;
        };
        // A computed never depends on its own output
        if self.writer() == Some(observer) {
            return;
        }
        observer.add_source(self);
        self.add_subscriber(observer);
    }

    /// Add a subscriber (deduplicated)
    pub fn add_subscriber(self, observer: ObserverId) {
        self.with_mut(|metadata| {
            metadata.subscribers.insert(observer);
        });
    }

    /// Remove a subscriber
    pub fn remove_subscriber(self, observer: ObserverId) {
        self.with_mut(|metadata| {
            metadata.subscribers.remove(&observer);
        });
    }

    /// Snapshot of the current subscribers
    ///
    /// Returned by value so that callers can mutate the graph while iterating.
    pub fn subscribers(self) -> Vec<ObserverId> {
        self.with(|metadata| metadata.subscribers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The observer that produces this signal, if it is a computed output
    pub fn writer(self) -> Option<ObserverId> {
        self.with(|metadata| metadata.writer).flatten()
    }

    pub(crate) fn set_writer(self, writer: ObserverId) {
        self.with_mut(|metadata| metadata.writer = Some(writer));
    }

    /// Mark direct subscribers Dirty and everything downstream of them Check
    pub fn notify(self) {
        for observer in self.subscribers() {
            observer.mark_dirty();
        }
    }

    /// Mark every subscriber (and transitively their dependents) Check
    pub fn mark_subscribers_check(self) {
        let subscribers = self.subscribers();
        if !subscribers.is_empty() {
            cov_mark::hit!(signal_marking_subscribers_check);
        }
        for observer in subscribers {
            observer.mark_check_recursive();
        }
    }

    /// Bring this signal up to date by running its writer if it is stale
    pub fn pull(self) {
        if let Some(writer) = self.writer() {
            if Some(writer) != current_observer() {
                writer.update_if_necessary();
            }
        }
    }
}

/// Metadata for a signal stored in the arena
#[derive(Debug, Default)]
pub struct SignalMetadata {
    pub(crate) subscribers: EdgeSet<ObserverId>,
    pub(crate) writer: Option<ObserverId>,
}

/// Allocate a signal slot
pub fn signal_arena_insert(metadata: SignalMetadata) -> SignalId {
    SIGNAL_ARENA.with(|arena| {
        let key = arena.borrow_mut().insert(metadata);
        SignalId(key as u32)
    })
}

/// Free a signal slot, detaching it from every observer that read it
pub fn signal_arena_remove(id: SignalId) -> Option<SignalMetadata> {
    let metadata = SIGNAL_ARENA
        .try_with(|arena| arena.borrow_mut().try_remove(id.index()))
        .ok()
        .flatten()?;
    for observer in &metadata.subscribers {
        observer.remove_source(id);
    }
    Some(metadata)
}
