use crate::arena::{
    CurrentObserverGuard, ObserverId, ObserverKind, ObserverMetadata, is_observer_running,
    observer_arena_insert, observer_arena_remove, pending_len, take_pending,
};
use crate::transaction::is_transaction_active;
use std::cell::Cell;

thread_local! {
    // Set while flush_effects drains the queue; nested flushes fold into it.
    static FLUSHING: Cell<bool> = const { Cell::new(false) };
}

struct FlushGuard;

impl FlushGuard {
    fn acquire() -> Option<Self> {
        FLUSHING.with(|flushing| (!flushing.replace(true)).then_some(FlushGuard))
    }
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        let _ = FLUSHING.try_with(|flushing| flushing.set(false));
    }
}

/// Run all pending effects now
///
/// Effects queued while flushing (cascades) are processed in the same call,
/// so the queue is empty on return. Returns the number of effects visited.
/// Calling this from inside a running flush is a no-op; the outer flush
/// picks the work up.
///
/// Writes already flush on their own; call this after manual
/// [`Computed::invalidate`](crate::Computed::invalidate) calls made from
/// inside an effect, or from an event loop that batches work.
pub fn flush_effects() -> usize {
    let Some(_guard) = FlushGuard::acquire() else {
        return 0;
    };

    let mut total = 0;
    loop {
        let pending = take_pending();
        if pending.is_empty() {
            break;
        }
        for effect in pending {
            if effect.needs_work() {
                effect.update_if_necessary();
                total += 1;
            }
        }
    }
    total
}

/// Flush unless a transaction is open or an observer body is executing
pub(crate) fn flush_if_idle() {
    if !is_transaction_active() && !is_observer_running() {
        flush_effects();
    }
}

/// Number of effects waiting to run
pub fn pending_effects() -> usize {
    pending_len()
}

/// Run a closure without tracking dependencies
///
/// Reads inside `f` do not subscribe the running effect or computed.
///
/// # Example
/// ```ignore
/// let effect = Effect::new(move || {
///     let page = view.current_page().number();          // tracked
///     let total = untracked(|| store.len());             // not tracked
///     render(page, total);
/// });
/// ```
pub fn untracked<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = CurrentObserverGuard::new(None);
    f()
}

/// Side-effectful computation that re-runs when its dependencies change
///
/// An effect runs once on creation, recording every signal it reads. When any
/// of them changes the effect re-runs, at most once per batch of writes and
/// only after the computeds it reads have settled. This is how a renderer
/// observes the view model.
///
/// # Example
/// ```ignore
/// let view = views.get(0).unwrap().clone();
/// let _render = Effect::new(move || {
///     for item in view.searched().items {
///         println!("{}", item.name());
///     }
/// });
///
/// view.query().set("t".to_string()); // effect re-runs here
/// ```
///
/// Dropping the effect unsubscribes it.
pub struct Effect {
    id: ObserverId,
}

impl Effect {
    /// Create a new effect and run it immediately
    pub fn new<F>(mut f: F) -> Self
    where
        F: FnMut() + 'static,
    {
        let metadata = ObserverMetadata::new(
            ObserverKind::Effect,
            Box::new(move || {
                f();
                true
            }),
        );
        let effect = Self {
            id: observer_arena_insert(metadata),
        };
        effect.id.update_if_necessary();
        // Writes made by the first run were deferred until it returned.
        flush_if_idle();
        effect
    }

    /// Wrap an already allocated observer so that drop frees it
    pub(crate) fn from_raw(id: ObserverId) -> Self {
        Self { id }
    }

    pub(crate) fn id(&self) -> ObserverId {
        self.id
    }

    /// Force a re-run on the next flush
    pub fn invalidate(&self) {
        self.id.mark_dirty();
        flush_if_idle();
    }

    /// Number of signals read during the last run
    pub fn source_count(&self) -> usize {
        self.id.sources().len()
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        observer_arena_remove(self.id);
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Signal, Transaction};
    use std::rc::Rc;

    #[test]
    fn effect_batches_rapid_invalidations() {
        let runs = Rc::new(Cell::new(0));
        let effect = Effect::new({
            let runs = runs.clone();
            move || runs.set(runs.get() + 1)
        });
        assert_eq!(runs.get(), 1);

        Transaction::run(|| {
            for _ in 0..20 {
                effect.invalidate();
            }
            assert_eq!(pending_effects(), 1);
        });

        assert_eq!(runs.get(), 2);
        assert_eq!(pending_effects(), 0);
    }

    #[test]
    fn untracked_reads_do_not_subscribe() {
        let tracked = Rc::new(Signal::new());
        let ignored = Rc::new(Signal::new());
        let runs = Rc::new(Cell::new(0));

        let effect = Effect::new({
            let tracked = tracked.clone();
            let ignored = ignored.clone();
            let runs = runs.clone();
            move || {
                tracked.track();
                untracked(|| ignored.track());
                runs.set(runs.get() + 1);
            }
        });
        assert_eq!(effect.source_count(), 1);

        ignored.emit();
        assert_eq!(runs.get(), 1);

        tracked.emit();
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn cascading_effects_settle_in_one_flush() {
        let first = Rc::new(Signal::new());
        let second = Rc::new(Signal::new());
        let downstream_runs = Rc::new(Cell::new(0));

        let _forward = Effect::new({
            let first = first.clone();
            let second = second.clone();
            move || {
                first.track();
                second.emit();
            }
        });
        let _downstream = Effect::new({
            let second = second.clone();
            let runs = downstream_runs.clone();
            move || {
                second.track();
                runs.set(runs.get() + 1);
            }
        });
        assert_eq!(downstream_runs.get(), 1);

        first.emit();
        assert_eq!(downstream_runs.get(), 2);
        assert_eq!(pending_effects(), 0);
    }

    #[test]
    fn dropped_effect_stops_reacting() {
        let signal = Rc::new(Signal::new());
        let runs = Rc::new(Cell::new(0));

        let effect = Effect::new({
            let signal = signal.clone();
            let runs = runs.clone();
            move || {
                signal.track();
                runs.set(runs.get() + 1);
            }
        });
        drop(effect);

        signal.emit();
        assert_eq!(runs.get(), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }
}
