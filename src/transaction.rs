use crate::effect::flush_if_idle;
use std::cell::Cell;

// Transaction depth on this thread.
// When > 0, emissions queue effects instead of running them.
thread_local! {
    static TRANSACTION_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Whether a transaction is open on this thread
pub fn is_transaction_active() -> bool {
    TRANSACTION_DEPTH.with(|depth| depth.get() > 0)
}

/// Closes the transaction on drop, flushing when the outermost one ends
struct TransactionGuard;

impl TransactionGuard {
    fn enter() -> Self {
        TRANSACTION_DEPTH.with(|depth| depth.set(depth.get() + 1));
        TransactionGuard
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        let outermost = TRANSACTION_DEPTH
            .try_with(|depth| {
                let remaining = depth.get().saturating_sub(1);
                depth.set(remaining);
                remaining == 0
            })
            .unwrap_or(false);

        // Effects queued before a panic stay pending for the next flush.
        // Inside a running observer the flush waits for that body to return.
        if outermost && !std::thread::panicking() {
            flush_if_idle();
        }
    }
}

/// Batch multiple writes into a single round of effect runs
///
/// Inside a transaction, writes mark dependents stale but effects wait. When
/// the outermost transaction exits, every pending effect runs once against
/// the final state.
///
/// # Example
/// ```ignore
/// // Without a transaction the renderer runs after every write
/// view.query().set("t".into());
/// view.current_page().write("2");
///
/// // With a transaction it runs once, at the end
/// Transaction::run(|| {
///     view.query().set("t".into());
///     view.current_page().write("2");
/// });
/// ```
pub struct Transaction {
    _private: (),
}

impl Transaction {
    /// Run a function within a transaction and return its result
    pub fn run<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = TransactionGuard::enter();
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Effect, Observable, Signal};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn transaction_returns_value() {
        assert_eq!(Transaction::run(|| 42), 42);
    }

    #[test]
    fn transaction_active_flag_tracks_nesting() {
        assert!(!is_transaction_active());

        Transaction::run(|| {
            assert!(is_transaction_active());
            Transaction::run(|| assert!(is_transaction_active()));
            assert!(is_transaction_active());
        });

        assert!(!is_transaction_active());
    }

    #[test]
    fn nested_transactions_defer_until_outermost_exits() {
        let signal = Rc::new(Signal::new());
        let runs = Rc::new(Cell::new(0));
        let _effect = Effect::new({
            let signal = signal.clone();
            let runs = runs.clone();
            move || {
                signal.track();
                runs.set(runs.get() + 1);
            }
        });

        Transaction::run(|| {
            signal.emit();
            Transaction::run(|| signal.emit());
            assert_eq!(runs.get(), 1);
            signal.emit();
        });

        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn transaction_inside_an_effect_waits_for_the_body() {
        let trigger = Observable::new(1);
        let mirror = Observable::new(0);
        let mirrored = Rc::new(Cell::new(0));
        let _reader = Effect::new({
            let (mirror, mirrored) = (mirror.clone(), mirrored.clone());
            move || mirrored.set(mirror.get())
        });

        let seen_in_body = Rc::new(RefCell::new(Vec::new()));
        let writer = Effect::new({
            let (trigger, mirror) = (trigger.clone(), mirror.clone());
            let (mirrored, seen_in_body) = (mirrored.clone(), seen_in_body.clone());
            move || {
                let value = trigger.get();
                Transaction::run(|| mirror.set(value * 10));
                seen_in_body.borrow_mut().push(mirrored.get());
            }
        });
        assert_eq!(mirrored.get(), 10);

        trigger.set(2);
        assert_eq!(mirrored.get(), 20);
        assert_eq!(writer.source_count(), 1);
        assert_eq!(*seen_in_body.borrow(), [0, 10]);
    }

    #[test]
    fn depth_restored_after_panic() {
        let result = std::panic::catch_unwind(|| {
            Transaction::run(|| panic!("inside transaction"));
        });

        assert!(result.is_err());
        assert!(!is_transaction_active());
    }
}
