use crate::arena::{ObserverKind, ObserverMetadata, observer_arena_insert};
use crate::effect::flush_if_idle;
use crate::{Effect, Signal};
use std::cell::RefCell;
use std::rc::Rc;

/// Memoized derived value that updates when its dependencies change
///
/// A Computed only recomputes when something it read has changed, and only
/// notifies its own subscribers when the result actually differs from the
/// cached one (requires `T: PartialEq`).
///
/// # How it works
/// Internally, a Computed is composed of:
/// - An observer that tracks dependencies and holds the compute function
/// - A Signal that other effects/computeds subscribe to
/// - The cached value
///
/// When a dependency changes:
/// 1. A direct source change marks the Computed Dirty; an upstream computed
///    change only marks it Check
/// 2. The next [`get`](Computed::get) verifies Check sources (pulling upstream
///    computeds first) and recomputes only if one of them really changed
/// 3. If the new value equals the cached one, subscribers are left alone
///
/// Evaluation is lazy: a Computed that is never read never runs.
///
/// # Example
/// ```ignore
/// let items = Observable::new(vec![1, 2, 3]);
/// let total = Computed::new({
///     let items = items.clone();
///     move || items.with(|items| items.iter().sum::<i32>())
/// });
///
/// assert_eq!(total.get(), 6);
/// items.update(|items| items.push(4));
/// assert_eq!(total.get(), 10);
/// ```
pub struct Computed<T> {
    /// Output signal: readers subscribe to this
    signal: Signal,

    /// Observer that re-runs the compute function; frees its slot on drop
    effect: Effect,

    /// Cached result, `None` until the first evaluation
    value: Rc<RefCell<Option<T>>>,
}

impl<T: Clone + PartialEq + 'static> Computed<T> {
    /// Create a lazily evaluated computed value
    ///
    /// Dependencies are tracked automatically while `f` runs.
    pub fn new<F>(mut f: F) -> Rc<Self>
    where
        F: FnMut() -> T + 'static,
    {
        let signal = Signal::new();
        let value: Rc<RefCell<Option<T>>> = Rc::new(RefCell::new(None));

        let slot = value.clone();
        let callback = Box::new(move || {
            let next = f();
            let mut cached = slot.borrow_mut();
            let changed = cached.as_ref() != Some(&next);
            *cached = Some(next);
            changed
        });

        let metadata =
            ObserverMetadata::new(ObserverKind::Computed, callback).with_output(signal.id());
        let effect = Effect::from_raw(observer_arena_insert(metadata));

        Rc::new(Self {
            signal,
            effect,
            value,
        })
    }

    /// Create a computed value and evaluate it immediately
    pub fn eager<F>(f: F) -> Rc<Self>
    where
        F: FnMut() -> T + 'static,
    {
        let computed = Self::new(f);
        if computed.effect.id().update_if_necessary() {
            flush_if_idle();
        }
        computed
    }

    /// Get a clone of the current value
    ///
    /// Recomputes first if stale and subscribes the running observer.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Borrow the current value without cloning it
    ///
    /// # Panics
    /// Panics if the compute function reads its own Computed during the
    /// first evaluation (a dependency cycle).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        if self.effect.id().update_if_necessary() {
            flush_if_idle();
        }
        self.signal.track();

        let value = self.value.borrow();
        f(value
            .as_ref()
            .expect("computed value read inside its own first evaluation"))
    }

    /// Get the current value without subscribing the running observer
    pub fn get_untracked(&self) -> T {
        crate::untracked(|| self.get())
    }

    /// Force recomputation on the next read
    ///
    /// Subscribers are marked Check; effects among them settle before this
    /// call returns unless a batch is in progress.
    pub fn invalidate(&self) {
        self.effect.id().mark_dirty();
        flush_if_idle();
    }

    /// Whether the cached value is known to be current
    pub fn is_clean(&self) -> bool {
        !self.effect.id().needs_work()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("value", &self.value.borrow())
            .finish()
    }
}
