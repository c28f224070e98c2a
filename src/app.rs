//! Application context: the store plus its standard views.

use crate::config::ViewConfig;
use crate::error::StoreError;
use crate::item::ItemData;
use crate::store::{Store, UpdateSummary};
use crate::views::Views;
use std::rc::Rc;

/// Owns the shared [`Store`] and the [`Views`] over it
///
/// Construct one per presentation root and pass it down; nothing here is
/// global.
#[derive(Debug)]
pub struct App {
    store: Rc<Store>,
    views: Views,
}

impl App {
    /// Build an app over `items` with the default pagination settings
    pub fn new(items: impl IntoIterator<Item = ItemData>) -> Self {
        Self::with_config(items, &ViewConfig::default())
    }

    /// Build an app over `items` with explicit pagination settings
    pub fn with_config(items: impl IntoIterator<Item = ItemData>, config: &ViewConfig) -> Self {
        let store = Rc::new(Store::new(items));
        let views = Views::standard(store.clone(), config);
        Self { store, views }
    }

    /// Merge a payload into the store. See [`Store::update`]
    pub fn update(&self, items: impl IntoIterator<Item = ItemData>) -> UpdateSummary {
        self.store.update(items)
    }

    /// Merge a JSON payload into the store. See [`Store::update_json`]
    pub fn update_json(&self, json: &str) -> Result<UpdateSummary, StoreError> {
        self.store.update_json(json)
    }

    /// The backing store
    pub fn store(&self) -> &Rc<Store> {
        &self.store
    }

    /// The standard views
    pub fn views(&self) -> &Views {
        &self.views
    }

    /// Sample items for demos
    pub fn demo() -> Vec<ItemData> {
        vec![
            ItemData::new(1, "one", true),
            ItemData::new(2, "two", false),
            ItemData::new(3, "three", false),
            ItemData::new(4, "four", true),
            ItemData::new(5, "five", true),
            ItemData::new(6, "six", false),
        ]
    }

    /// The follow-up demo payload: item 1 deactivated and a new active
    /// item 11 appended.
    pub fn demo_mutation() -> Vec<ItemData> {
        let mut items = Self::demo();
        items[0].active = false;
        items.push(ItemData::new(11, "Stuff", true));
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lengths(app: &App) -> Vec<usize> {
        app.views()
            .views()
            .iter()
            .map(|view| view.data_length())
            .collect()
    }

    #[test]
    fn demo_mutation_moves_and_appends() {
        let app = App::new(App::demo());
        assert_eq!(lengths(&app), [6, 3, 3]);

        let summary = app.update(App::demo_mutation());
        assert_eq!(
            summary,
            UpdateSummary {
                updated: 1,
                inserted: 1,
                unchanged: 5
            }
        );
        assert_eq!(lengths(&app), [7, 3, 4]);

        let active = app.views().get(1).unwrap().filtered();
        let names: Vec<String> = active.iter().map(|item| item.name()).collect();
        assert_eq!(names, ["four", "five", "Stuff"]);
    }

    #[test]
    fn config_reaches_every_view() {
        let config = ViewConfig {
            page_size: 2,
            page_slide: 1.0,
        };
        let app = App::with_config(App::demo(), &config);
        for view in app.views().views() {
            assert_eq!(view.page_size(), 2);
        }
        assert_eq!(app.views().get(0).unwrap().last_page(), 3);
        assert_eq!(app.views().get(0).unwrap().page_numbers(), [1, 2, 3]);
    }

    #[test]
    fn json_updates_flow_through() {
        let app = App::new(App::demo());
        app.update_json(r#"[{"id": 2, "name": "two", "active": true}]"#)
            .unwrap();
        assert_eq!(lengths(&app), [6, 4, 2]);
    }
}
