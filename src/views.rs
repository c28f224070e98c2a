//! The named views and which one is selected.

use crate::config::ViewConfig;
use crate::filter::Filter;
use crate::list_view::{ListView, ViewOptions};
use crate::store::Store;
use crate::Observable;
use std::rc::Rc;

/// Template every standard view renders with
pub const LIST_TEMPLATE: &str = "listTmpl";

/// An ordered set of [`ListView`]s plus the current selection
///
/// The collection only tracks selection; each view derives its own data.
#[derive(Debug)]
pub struct Views {
    views: Vec<Rc<ListView>>,
    selected: Observable<Option<usize>>,
}

impl Views {
    /// The three standard views over `store`: everything, active items and
    /// inactive items.
    pub fn standard(store: Rc<Store>, config: &ViewConfig) -> Self {
        let view = |title: &str, filter: Option<Filter>| {
            ListView::new(
                title,
                LIST_TEMPLATE,
                ViewOptions::new(filter),
                store.clone(),
                config,
            )
        };
        Self::new([
            view("All", None),
            view("Active", Some(Filter::active(true))),
            view("Inactive", Some(Filter::active(false))),
        ])
    }

    /// A collection of arbitrary views, none selected
    pub fn new(views: impl IntoIterator<Item = ListView>) -> Self {
        Self {
            views: views.into_iter().map(Rc::new).collect(),
            selected: Observable::new(None),
        }
    }

    /// Select the view at `index`. Returns false, leaving the selection
    /// alone, if there is no such view.
    pub fn select(&self, index: usize) -> bool {
        let Some(view) = self.views.get(index) else {
            return false;
        };
        tracing::debug!(index, title = view.title(), "view selected");
        self.selected.set(Some(index));
        true
    }

    /// Select the first view titled `title`
    pub fn select_title(&self, title: &str) -> bool {
        self.views
            .iter()
            .position(|view| view.title() == title)
            .is_some_and(|index| self.select(index))
    }

    /// Deselect
    pub fn clear_selection(&self) {
        if self.selected.set(None) {
            tracing::debug!("view selection cleared");
        }
    }

    /// The selected view (tracked)
    pub fn selected(&self) -> Option<Rc<ListView>> {
        self.selected_index()
            .and_then(|index| self.views.get(index).cloned())
    }

    /// Index of the selected view (tracked)
    pub fn selected_index(&self) -> Option<usize> {
        self.selected.get()
    }

    /// All views, in order
    pub fn views(&self) -> &[Rc<ListView>] {
        &self.views
    }

    /// The view at `index`
    pub fn get(&self, index: usize) -> Option<&Rc<ListView>> {
        self.views.get(index)
    }

    /// Number of views
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Whether there are no views
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
