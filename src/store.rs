//! The mutable backing collection shared by every view.

use crate::error::StoreError;
use crate::item::{ItemData, ItemRef};
use crate::{Signal, Transaction, untracked};
use indexmap::IndexMap;
use std::cell::RefCell;

/// Counts reported by [`Store::update`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Existing items whose fields changed
    pub updated: usize,
    /// Items appended because their id was new
    pub inserted: usize,
    /// Existing items the payload left as they were
    pub unchanged: usize,
}

/// Ordered, id-keyed item collection
///
/// The item list itself is described by one signal that fires only when
/// the set of items changes (insertion or removal). Field edits go through
/// each item's own cells, so a rename does not wake views that only care
/// about membership.
///
/// Views hold the store by reference and never mutate it; every mutation
/// goes through [`update`](Store::update) or [`remove`](Store::remove).
pub struct Store {
    items: RefCell<IndexMap<u64, ItemRef>>,
    signal: Signal,
}

impl Store {
    /// Create a store from an initial list. Duplicate ids merge, last wins
    pub fn new(initial: impl IntoIterator<Item = ItemData>) -> Self {
        let store = Self {
            items: RefCell::new(IndexMap::new()),
            signal: Signal::new(),
        };
        store.update(initial);
        store
    }

    /// Merge a payload into the store, keyed by id
    ///
    /// Known ids are updated in place (their [`ItemRef`] stays the same),
    /// new ids are appended in payload order, and ids absent from the
    /// payload are kept. All resulting recomputation happens once, after
    /// the whole payload has been applied.
    pub fn update(&self, payload: impl IntoIterator<Item = ItemData>) -> UpdateSummary {
        Transaction::run(|| {
            let mut summary = UpdateSummary::default();
            for data in payload {
                let existing = self.items.borrow().get(&data.id).cloned();
                match existing {
                    Some(item) => {
                        if item.apply(data) {
                            summary.updated += 1;
                        } else {
                            summary.unchanged += 1;
                        }
                    }
                    None => {
                        self.items.borrow_mut().insert(data.id, ItemRef::new(data));
                        summary.inserted += 1;
                    }
                }
            }
            if summary.inserted > 0 {
                self.signal.emit();
            }
            tracing::debug!(
                updated = summary.updated,
                inserted = summary.inserted,
                unchanged = summary.unchanged,
                "store updated"
            );
            summary
        })
    }

    /// Merge a JSON array of items
    ///
    /// Nothing is applied if the payload does not parse.
    pub fn update_json(&self, json: &str) -> Result<UpdateSummary, StoreError> {
        let payload: Vec<ItemData> = serde_json::from_str(json)?;
        Ok(self.update(payload))
    }

    /// Remove items by id, keeping the order of the rest
    ///
    /// Returns how many were removed. Unknown ids are ignored.
    pub fn remove(&self, ids: impl IntoIterator<Item = u64>) -> usize {
        let removed = {
            let mut items = self.items.borrow_mut();
            ids.into_iter()
                .filter(|id| items.shift_remove(id).is_some())
                .count()
        };
        if removed > 0 {
            tracing::debug!(removed, "store items removed");
            self.signal.emit();
        }
        removed
    }

    /// All items in order (tracked)
    pub fn items(&self) -> Vec<ItemRef> {
        self.signal.track();
        self.items.borrow().values().cloned().collect()
    }

    /// Look up an item by id (tracked)
    pub fn get(&self, id: u64) -> Option<ItemRef> {
        self.signal.track();
        self.items.borrow().get(&id).cloned()
    }

    /// Number of items (tracked)
    pub fn len(&self) -> usize {
        self.signal.track();
        self.items.borrow().len()
    }

    /// Whether the store is empty (tracked)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Plain copy of every item, in order. Never subscribes
    pub fn snapshot(&self) -> Vec<ItemData> {
        untracked(|| {
            self.items
                .borrow()
                .values()
                .map(|item| item.to_data())
                .collect()
        })
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("len", &self.items.borrow().len())
            .finish()
    }
}
