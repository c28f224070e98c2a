// Observer arena - storage for effect and computed metadata
//
// Effects and computeds share one metadata struct:
// - sources: the signals read during the last run
// - output: the signal a computed writes (None for effects)
// - state: three-state reactive state (Clean/Check/Dirty)
// - callback: the body, stored in the arena; returns whether the output changed
//
// THREE-STATE REACTIVE SYSTEM:
// - Clean: value is current, use cached
// - Check: an upstream computed may have changed, verify sources first
// - Dirty: a direct source changed, must re-run
//
// Effects are queued on the pending set whenever they leave Clean. Computeds are
// never queued: they are pulled when read.

use super::{EdgeHasher, EdgeSet, SignalId};
use indexmap::IndexSet;
use slab::Slab;
use std::cell::{Cell, RefCell};

/// Reactive node states
///
/// States only upgrade (Clean -> Check -> Dirty) while changes propagate and
/// reset to Clean when the node runs or is verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReactiveState {
    /// Value is current, use cached
    Clean,
    /// Might be stale, verify sources first
    Check,
    /// Definitely stale, must re-run
    Dirty,
}

/// What kind of node an observer is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObserverKind {
    /// Eager side effect, queued for the next flush when stale
    Effect,
    /// Lazy memo, recomputed when read while stale
    Computed,
}

type Callback = Box<dyn FnMut() -> bool>;

thread_local! {
    static OBSERVER_ARENA: RefCell<Slab<ObserverMetadata>> = const { RefCell::new(Slab::new()) };

    // Stale effects awaiting the next flush, in the order they went stale.
    static PENDING_EFFECTS: RefCell<IndexSet<ObserverId, EdgeHasher>> =
        RefCell::new(IndexSet::default());

    static CURRENT_OBSERVER: Cell<Option<ObserverId>> = const { Cell::new(None) };

    // Observer bodies on the stack, including ones inside `untracked`.
    static RUNNING_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Whether any effect or computed body is executing on this thread
pub fn is_observer_running() -> bool {
    RUNNING_DEPTH.with(|depth| depth.get() > 0)
}

/// The observer whose body is currently executing, if any
pub fn current_observer() -> Option<ObserverId> {
    CURRENT_OBSERVER.with(Cell::get)
}

/// RAII guard that installs an observer as current and restores the
/// previous one on drop (also while unwinding).
pub struct CurrentObserverGuard {
    previous: Option<ObserverId>,
}

impl CurrentObserverGuard {
    /// Make `observer` current until the guard drops
    pub fn new(observer: Option<ObserverId>) -> Self {
        let previous = CURRENT_OBSERVER.with(|current| current.replace(observer));
        Self { previous }
    }
}

impl Drop for CurrentObserverGuard {
    fn drop(&mut self) {
        let _ = CURRENT_OBSERVER.try_with(|current| current.set(self.previous));
    }
}

/// Unique identifier for an effect or computed node in the arena
///
/// Accessing a stale id is a no-op that reports `Clean`.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct ObserverId(u32);

impl ObserverId {
    fn index(self) -> usize {
        self.0 as usize
    }

    /// Read the metadata of this observer, `None` when stale
    pub fn with<F, R>(self, f: F) -> Option<R>
    where
        F: FnOnce(&ObserverMetadata) -> R,
    {
        OBSERVER_ARENA
            .try_with(|arena| arena.borrow().get(self.index()).map(f))
            .ok()
            .flatten()
    }

    fn with_mut<F, R>(self, f: F) -> Option<R>
    where
        F: FnOnce(&mut ObserverMetadata) -> R,
    {
        OBSERVER_ARENA
            .try_with(|arena| arena.borrow_mut().get_mut(self.index()).map(f))
            .ok()
            .flatten()
    }

    /// Current state; `Clean` for stale ids
    pub fn state(self) -> ReactiveState {
        self.with(|metadata| metadata.state)
            .unwrap_or(ReactiveState::Clean)
    }

    /// Overwrite the state, returning the previous one
    pub fn replace_state(self, state: ReactiveState) -> ReactiveState {
        self.with_mut(|metadata| std::mem::replace(&mut metadata.state, state))
            .unwrap_or(ReactiveState::Clean)
    }

    /// Whether the node needs to run or be verified
    pub fn needs_work(self) -> bool {
        self.state() != ReactiveState::Clean
    }

    /// Node kind, `None` for stale ids
    pub fn kind(self) -> Option<ObserverKind> {
        self.with(|metadata| metadata.kind)
    }

    /// The signal this node writes (computed outputs only)
    pub fn output(self) -> Option<SignalId> {
        self.with(|metadata| metadata.output).flatten()
    }

    /// Record that this node read `source` during its current run
    pub fn add_source(self, source: SignalId) {
        self.with_mut(|metadata| {
            metadata.sources.insert(source);
        });
    }

    /// Forget a source (called when the source is dropped or untracked)
    pub fn remove_source(self, source: SignalId) {
        self.with_mut(|metadata| {
            metadata.sources.remove(&source);
        });
    }

    /// Whether `source` was read during the current or last run
    pub fn has_source(self, source: SignalId) -> bool {
        self.with(|metadata| metadata.sources.contains(&source))
            .unwrap_or(false)
    }

    /// Snapshot of the sources read during the last run
    pub fn sources(self) -> Vec<SignalId> {
        self.with(|metadata| metadata.sources.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Drop every source edge (both directions) before a re-run
    fn clear_sources(self) {
        let sources = self
            .with_mut(|metadata| std::mem::take(&mut metadata.sources))
            .unwrap_or_default();
        for source in sources {
            source.remove_subscriber(self);
        }
    }

    /// Mark this node Dirty because one of its direct sources changed
    ///
    /// A node that was Clean also pushes Check to everything downstream of
    /// its output. Effects are queued for the next flush.
    pub fn mark_dirty(self) {
        let previous = self.replace_state(ReactiveState::Dirty);
        if previous == ReactiveState::Dirty {
            return;
        }
        if self.kind() == Some(ObserverKind::Effect) {
            enqueue(self);
        }
        if previous == ReactiveState::Clean {
            if let Some(output) = self.output() {
                output.mark_subscribers_check();
            }
        }
    }

    /// Mark this node and everything downstream Check
    ///
    /// Nodes already Check or Dirty stop the walk: their dependents were
    /// marked when they left Clean.
    pub fn mark_check_recursive(self) {
        if self.state() != ReactiveState::Clean {
            return;
        }
        cov_mark::hit!(marking_observer_check_recursive);
        self.replace_state(ReactiveState::Check);
        if self.kind() == Some(ObserverKind::Effect) {
            enqueue(self);
        }
        if let Some(output) = self.output() {
            output.mark_subscribers_check();
        }
    }

    /// Run this node if it is stale
    ///
    /// A Check node first pulls the writers of its sources; if none of them
    /// produced a new value it becomes Clean without running. Returns true
    /// if the body ran.
    pub fn update_if_necessary(self) -> bool {
        match self.state() {
            ReactiveState::Clean => false,
            ReactiveState::Check => {
                for source in self.sources() {
                    source.pull();
                    if self.state() == ReactiveState::Dirty {
                        cov_mark::hit!(check_upgraded_to_dirty_by_pull);
                        break;
                    }
                }
                if self.state() == ReactiveState::Check {
                    cov_mark::hit!(check_verified_clean);
                    self.replace_state(ReactiveState::Clean);
                    remove_from_pending(self);
                    return false;
                }
                cov_mark::hit!(check_became_dirty_running);
                self.run()
            }
            ReactiveState::Dirty => {
                cov_mark::hit!(dirty_running);
                self.run()
            }
        }
    }

    /// Re-run the body with fresh dependency tracking
    ///
    /// When a computed reports a changed value, its subscribers are upgraded
    /// to Dirty so that their own verification re-runs them. Returns false
    /// if the body is already executing.
    fn run(self) -> bool {
        // No callback means the body is already on the stack. Leave it stale
        // with its sources intact so the outer run finishes tracking.
        let Some(callback) = self.with_mut(|metadata| metadata.callback.take()).flatten() else {
            cov_mark::hit!(reentrant_run_skipped);
            return false;
        };

        self.replace_state(ReactiveState::Clean);
        remove_from_pending(self);
        self.clear_sources();

        // Puts the callback back even if the body panics.
        struct Restore {
            observer: ObserverId,
            callback: Option<Callback>,
        }

        impl Drop for Restore {
            fn drop(&mut self) {
                let _ = RUNNING_DEPTH.try_with(|depth| depth.set(depth.get().saturating_sub(1)));
                if let Some(callback) = self.callback.take() {
                    self.observer.with_mut(|metadata| metadata.callback = Some(callback));
                }
            }
        }

        RUNNING_DEPTH.with(|depth| depth.set(depth.get() + 1));
        let mut restore = Restore {
            observer: self,
            callback: Some(callback),
        };
        tracing::trace!(observer = ?self, "running observer");
        let changed = {
            let _current = CurrentObserverGuard::new(Some(self));
            restore.callback.as_mut().is_some_and(|callback| callback())
        };
        drop(restore);

        if changed {
            if let Some(output) = self.output() {
                for subscriber in output.subscribers() {
                    if subscriber.state() == ReactiveState::Check {
                        cov_mark::hit!(subscriber_upgraded_check_to_dirty);
                    }
                    subscriber.mark_dirty();
                }
            }
        }
        true
    }
}

/// Unified metadata for effects and computeds
pub struct ObserverMetadata {
    pub(crate) state: ReactiveState,
    pub(crate) kind: ObserverKind,
    pub(crate) sources: EdgeSet<SignalId>,
    pub(crate) output: Option<SignalId>,
    pub(crate) callback: Option<Callback>,
}

impl ObserverMetadata {
    /// New node that has never run (state = Dirty)
    pub fn new(kind: ObserverKind, callback: Callback) -> Self {
        Self {
            state: ReactiveState::Dirty,
            kind,
            sources: EdgeSet::default(),
            output: None,
            callback: Some(callback),
        }
    }

    /// Attach the signal this node writes
    pub fn with_output(mut self, output: SignalId) -> Self {
        self.output = Some(output);
        self
    }
}

/// Allocate an observer slot. A computed's output signal learns its writer here
pub fn observer_arena_insert(metadata: ObserverMetadata) -> ObserverId {
    let output = metadata.output;
    let id = OBSERVER_ARENA.with(|arena| ObserverId(arena.borrow_mut().insert(metadata) as u32));
    if let Some(output) = output {
        output.set_writer(id);
    }
    id
}

/// Free an observer slot, unsubscribing it from all of its sources
pub fn observer_arena_remove(id: ObserverId) -> Option<()> {
    remove_from_pending(id);
    let metadata = OBSERVER_ARENA
        .try_with(|arena| arena.borrow_mut().try_remove(id.index()))
        .ok()
        .flatten()?;
    for source in &metadata.sources {
        source.remove_subscriber(id);
    }
    // The callback may own Observables and Computeds; drop it outside the arena borrow.
    drop(metadata);
    Some(())
}

fn enqueue(id: ObserverId) {
    PENDING_EFFECTS.with(|pending| {
        if pending.borrow_mut().insert(id) {
            cov_mark::hit!(effect_added_to_pending);
        }
    });
}

/// Remove an observer from the pending set
pub fn remove_from_pending(id: ObserverId) {
    let _ = PENDING_EFFECTS.try_with(|pending| pending.borrow_mut().shift_remove(&id));
}

/// Drain the pending set in queue order
pub fn take_pending() -> Vec<ObserverId> {
    PENDING_EFFECTS.with(|pending| pending.borrow_mut().drain(..).collect())
}

/// Number of effects waiting for the next flush
pub fn pending_len() -> usize {
    PENDING_EFFECTS.with(|pending| pending.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::signal_arena::SignalMetadata;
    use crate::arena::{signal_arena_insert, signal_arena_remove};
    use std::rc::Rc;

    #[test]
    fn stale_access_reports_clean() {
        let id = observer_arena_insert(ObserverMetadata::new(ObserverKind::Effect, Box::new(|| true)));
        observer_arena_remove(id);

        assert_eq!(id.state(), ReactiveState::Clean);
        assert!(id.sources().is_empty());
        assert!(id.kind().is_none());
        assert!(!id.update_if_necessary());
    }

    #[test]
    fn callback_restored_after_panic() {
        let runs = Rc::new(Cell::new(0));
        let runs_in_body = runs.clone();
        let id = observer_arena_insert(ObserverMetadata::new(
            ObserverKind::Effect,
            Box::new(move || {
                runs_in_body.set(runs_in_body.get() + 1);
                if runs_in_body.get() == 1 {
                    panic!("first run fails");
                }
                true
            }),
        ));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| id.update_if_necessary()));
        assert!(result.is_err());
        assert_eq!(current_observer(), None);

        id.mark_dirty();
        assert!(id.update_if_necessary());
        assert_eq!(runs.get(), 2);

        observer_arena_remove(id);
    }

    #[test]
    fn current_observer_guard_restores_previous() {
        let outer = ObserverId(10);
        let inner = ObserverId(20);

        let _outer = CurrentObserverGuard::new(Some(outer));
        {
            let _inner = CurrentObserverGuard::new(Some(inner));
            assert_eq!(current_observer(), Some(inner));
        }
        assert_eq!(current_observer(), Some(outer));
    }

    #[test]
    fn reentrant_run_keeps_sources_and_stays_stale() {
        let source = signal_arena_insert(SignalMetadata::default());
        let this = Rc::new(Cell::new(None::<ObserverId>));
        let runs = Rc::new(Cell::new(0));
        let id = observer_arena_insert(ObserverMetadata::new(
            ObserverKind::Effect,
            Box::new({
                let (this, runs) = (this.clone(), runs.clone());
                move || {
                    runs.set(runs.get() + 1);
                    source.track();
                    if let Some(this) = this.get() {
                        assert!(is_observer_running());
                        this.mark_dirty();
                        assert!(!this.update_if_necessary());
                    }
                    true
                }
            }),
        ));
        this.set(Some(id));

        {
            cov_mark::check!(reentrant_run_skipped);
            assert!(id.update_if_necessary());
        }
        assert!(!is_observer_running());
        assert_eq!(runs.get(), 1);
        assert_eq!(id.sources(), vec![source]);
        assert!(id.needs_work());

        observer_arena_remove(id);
        signal_arena_remove(source);
    }

    #[test]
    fn dirty_effect_is_queued_once() {
        let id = observer_arena_insert(ObserverMetadata::new(ObserverKind::Effect, Box::new(|| true)));
        id.update_if_necessary();
        assert_eq!(pending_len(), 0);

        {
            cov_mark::check!(effect_added_to_pending);
            id.mark_dirty();
        }
        id.mark_dirty();
        assert_eq!(pending_len(), 1);

        observer_arena_remove(id);
        assert_eq!(pending_len(), 0);
    }

    #[test]
    fn removing_observer_unsubscribes_sources() {
        let source = signal_arena_insert(SignalMetadata::default());
        let id = observer_arena_insert(ObserverMetadata::new(ObserverKind::Computed, Box::new(|| false)));
        id.add_source(source);
        source.add_subscriber(id);

        observer_arena_remove(id);
        assert!(source.subscribers().is_empty());

        signal_arena_remove(source);
    }
}
