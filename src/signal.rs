use crate::arena::{SignalId, current_observer, signal_arena_insert, signal_arena_remove};
use crate::effect::flush_if_idle;

/// Lightweight reactive marker that tracks dependencies without owning data
///
/// A Signal is only graph metadata; the value it describes stays in your struct.
/// Call [`track`](Signal::track) when the value is read and
/// [`emit`](Signal::emit) after it changed.
///
/// # Usage
/// ```ignore
/// struct Inventory {
///     items: Vec<Item>,
///     signal: Signal,
/// }
///
/// impl Inventory {
///     fn push(&mut self, item: Item) {
///         self.items.push(item);
///         self.signal.emit();
///     }
///
///     fn len(&self) -> usize {
///         self.signal.track();
///         self.items.len()
///     }
/// }
/// ```
pub struct Signal {
    id: SignalId,
}

impl Signal {
    /// Create a new signal and allocate it in the arena
    pub fn new() -> Self {
        Self {
            id: signal_arena_insert(Default::default()),
        }
    }

    pub(crate) fn id(&self) -> SignalId {
        self.id
    }

    /// Register the running effect or computed (if any) as a subscriber
    pub fn track(&self) {
        self.id.track();
    }

    /// Notify subscribers that the described value changed
    ///
    /// Direct subscribers become Dirty and everything downstream of them
    /// becomes Check. Pending effects run before this call returns, unless a
    /// [`Transaction`](crate::Transaction) is open or an observer is running,
    /// in which case they run when that batch completes.
    pub fn emit(&self) {
        if let Some(observer) = current_observer() {
            // Reading and writing the same signal from one observer would
            // re-trigger it forever; keep the write and drop the read.
            if observer.has_source(self.id) {
                tracing::warn!(
                    ?observer,
                    signal = ?self.id,
                    "observer both reads and writes a signal; treating the read as untracked"
                );
                self.id.remove_subscriber(observer);
                observer.remove_source(self.id);
            }
        }

        self.id.notify();
        flush_if_idle();
    }

    /// Number of observers currently subscribed
    pub fn subscriber_count(&self) -> usize {
        self.id.subscribers().len()
    }
}

impl Drop for Signal {
    fn drop(&mut self) {
        signal_arena_remove(self.id);
    }
}

// Signal is deliberately not Clone: the owner frees the arena slot on drop.
// Share the owning value (e.g. through Rc) instead.

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal").field("id", &self.id).finish()
    }
}
