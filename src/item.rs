//! List items and their plain payload form.

use crate::Observable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// Plain item payload, as supplied by the presentation layer or JSON
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemData {
    /// Stable unique key
    pub id: u64,
    /// Display name, matched by search
    pub name: String,
    /// Whether the item is active
    pub active: bool,
}

impl ItemData {
    /// Convenience constructor
    pub fn new(id: u64, name: impl Into<String>, active: bool) -> Self {
        Self {
            id,
            name: name.into(),
            active,
        }
    }
}

/// A live item whose fields are reactive cells
///
/// Views read `name` and `active` through the graph, so changing one item's
/// field only wakes the computations that looked at that field.
#[derive(Debug)]
pub struct Item {
    id: u64,
    name: Observable<String>,
    active: Observable<bool>,
}

impl Item {
    fn from_data(data: ItemData) -> Self {
        Self {
            id: data.id,
            name: Observable::new(data.name),
            active: Observable::new(data.active),
        }
    }

    /// Stable key
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current name (tracked)
    pub fn name(&self) -> String {
        self.name.get()
    }

    /// Borrow the name without cloning it (tracked)
    pub fn with_name<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        self.name.with(|name| f(name))
    }

    /// Current active flag (tracked)
    pub fn active(&self) -> bool {
        self.active.get()
    }

    /// Plain copy of the current fields (tracked)
    pub fn to_data(&self) -> ItemData {
        ItemData {
            id: self.id,
            name: self.name(),
            active: self.active(),
        }
    }

    /// Write the payload's fields in place. Returns whether anything changed
    pub(crate) fn apply(&self, data: ItemData) -> bool {
        debug_assert_eq!(self.id, data.id);
        let renamed = self.name.set(data.name);
        let toggled = self.active.set(data.active);
        renamed || toggled
    }
}

/// Shared handle to a store item
///
/// Equality is identity: two handles are equal when they point at the same
/// live item. A view's result is therefore unchanged by edits to item
/// fields, which the views observe separately.
#[derive(Clone)]
pub struct ItemRef(Rc<Item>);

impl ItemRef {
    pub(crate) fn new(data: ItemData) -> Self {
        Self(Rc::new(Item::from_data(data)))
    }

    /// Whether both handles point at the same item
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ItemRef {
    type Target = Item;

    fn deref(&self) -> &Item {
        &self.0
    }
}

impl PartialEq for ItemRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ItemRef {}

impl fmt::Debug for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ItemRef").field(&self.0.id).finish()
    }
}
