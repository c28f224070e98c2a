//! Typed item predicates for named views.

use crate::item::{Item, ItemRef};
use serde::{Deserialize, Serialize};

/// One required field value
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterClause {
    /// `item.active == value`
    Active(bool),
    /// `item.name == value`
    Name(String),
    /// `item.id == value`
    Id(u64),
}

impl FilterClause {
    /// Whether `item` satisfies this clause. Field reads are tracked
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Self::Active(active) => item.active() == *active,
            Self::Name(name) => item.with_name(|current| current == name.as_str()),
            Self::Id(id) => item.id() == *id,
        }
    }
}

/// Conjunction of clauses; an empty filter matches everything
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter {
    clauses: Vec<FilterClause>,
}

impl Filter {
    /// Filter with no clauses
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on the active flag
    pub fn active(active: bool) -> Self {
        Self::new().with(FilterClause::Active(active))
    }

    /// Add a clause
    pub fn with(mut self, clause: FilterClause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// The clauses, in insertion order
    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    /// Whether `item` satisfies every clause
    pub fn matches(&self, item: &Item) -> bool {
        self.clauses.iter().all(|clause| clause.matches(item))
    }

    /// The matching items, in input order
    pub fn apply(&self, items: Vec<ItemRef>) -> Vec<ItemRef> {
        if self.clauses.is_empty() {
            return items;
        }
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

impl FromIterator<FilterClause> for Filter {
    fn from_iter<I: IntoIterator<Item = FilterClause>>(iter: I) -> Self {
        Self {
            clauses: iter.into_iter().collect(),
        }
    }
}
