use crate::Signal;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared reactive cell that owns its value
///
/// Cloning an `Observable` clones the handle, not the value: every clone
/// reads and writes the same cell. Reads inside an effect or computed
/// subscribe it; writes notify subscribers.
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

struct ObservableInner<T> {
    value: RefCell<T>,
    signal: Signal,
}

impl<T> Observable<T> {
    /// Create a new cell
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                signal: Signal::new(),
            }),
        }
    }

    /// Borrow the value, subscribing the running observer
    ///
    /// # Panics
    /// The value stays borrowed while `f` runs: writing this cell from
    /// inside `f` panics. Clone it out with [`get`](Self::get) first.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.signal.track();
        f(&self.inner.value.borrow())
    }

    /// Mutate the value in place and notify subscribers unconditionally
    ///
    /// # Panics
    /// The value stays mutably borrowed while `f` runs: reading or writing
    /// this cell from inside `f` panics.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut self.inner.value.borrow_mut());
        self.inner.signal.emit();
        result
    }

    /// Whether two handles refer to the same cell
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> Observable<T> {
    /// Get a clone of the value, subscribing the running observer
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Get a clone of the value without subscribing
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

impl<T: PartialEq> Observable<T> {
    /// Store a new value
    ///
    /// Subscribers are notified only if the value differs from the current
    /// one. Returns whether it changed.
    pub fn set(&self, value: T) -> bool {
        let changed = {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        };
        if changed {
            self.inner.signal.emit();
        }
        changed
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Observable")
            .field(&self.inner.value.borrow())
            .finish()
    }
}
