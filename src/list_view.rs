//! Filtered, paginated, searchable view over a [`Store`].

use crate::config::ViewConfig;
use crate::filter::Filter;
use crate::item::ItemRef;
use crate::numeric::NumericCell;
use crate::store::Store;
use crate::{Computed, Observable, untracked};
use std::rc::Rc;

/// Items shown by a view
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    /// The items, in source order
    pub items: Vec<ItemRef>,
}

impl Page {
    /// Item names, in order (tracked)
    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|item| item.name()).collect()
    }

    /// Item ids, in order
    pub fn ids(&self) -> Vec<u64> {
        self.items.iter().map(|item| item.id()).collect()
    }
}

/// Per-view inputs: the search query and the optional filter
///
/// The filter is fixed once the view exists; the query is a live cell.
#[derive(Clone, Debug, Default)]
pub struct ViewOptions {
    /// Search text, matched case-insensitively against item names
    pub query: Observable<String>,
    /// Membership filter; `None` shows every item
    pub filter: Option<Filter>,
}

impl ViewOptions {
    /// Options with an empty query
    pub fn new(filter: Option<Filter>) -> Self {
        Self {
            query: Observable::new(String::new()),
            filter,
        }
    }
}

/// A named, reactive window over the store
///
/// Every derived field is a lazily pulled [`Computed`]: reading one brings
/// it (and only what it depends on) up to date. The derivation chain is
///
/// ```text
/// store + filter ─► filtered ─► data_length ─► last_page ─► has_next_page
///                      │              │             └─────► page_numbers
///                      │              └──► page_end
/// current_page ─► page ─► page_start ─┘    has_prev_page
///                      │
///                      ├──► paged ─┐
/// query ───────────────┴──────────► searched
/// ```
pub struct ListView {
    title: String,
    template: String,
    options: ViewOptions,
    page_size: usize,
    current_page: NumericCell,
    page_slide: NumericCell,

    filtered: Rc<Computed<Vec<ItemRef>>>,
    data_length: Rc<Computed<usize>>,
    page: Rc<Computed<usize>>,
    last_page: Rc<Computed<usize>>,
    has_next_page: Rc<Computed<bool>>,
    has_prev_page: Rc<Computed<bool>>,
    page_start: Rc<Computed<usize>>,
    page_end: Rc<Computed<usize>>,
    page_numbers: Rc<Computed<Vec<usize>>>,
    paged: Rc<Computed<Page>>,
    searched: Rc<Computed<Page>>,
}

impl ListView {
    /// Build a view over `store`
    ///
    /// A zero page size in `config` is treated as 1.
    pub fn new(
        title: impl Into<String>,
        template: impl Into<String>,
        options: ViewOptions,
        store: Rc<Store>,
        config: &ViewConfig,
    ) -> Self {
        let title = title.into();
        let page_size = config.page_size.max(1);
        let current_page = NumericCell::new(1.0);
        let page_slide = NumericCell::new(config.page_slide);

        let filtered = Computed::new({
            let filter = options.filter.clone();
            let title = title.clone();
            move || {
                let items = store.items();
                let items = match &filter {
                    Some(filter) => filter.apply(items),
                    None => items,
                };
                tracing::trace!(view = %title, len = items.len(), "filtered recomputed");
                items
            }
        });

        let data_length = Computed::new({
            let filtered = filtered.clone();
            move || filtered.with(Vec::len)
        });

        let page = Computed::new({
            let current_page = current_page.clone();
            move || whole_number(current_page.number(), 1)
        });

        let slide = Computed::new({
            let page_slide = page_slide.clone();
            move || whole_number(page_slide.number(), 0)
        });

        let last_page = Computed::new({
            let data_length = data_length.clone();
            move || last_page(data_length.get(), page_size)
        });

        let has_next_page = Computed::new({
            let (page, last_page) = (page.clone(), last_page.clone());
            move || page.get() < last_page.get()
        });

        let has_prev_page = Computed::new({
            let page = page.clone();
            move || page.get() > 1
        });

        let page_start = Computed::new({
            let page = page.clone();
            move || page_size.saturating_mul(page.get() - 1)
        });

        let page_end = Computed::new({
            let (page_start, data_length) = (page_start.clone(), data_length.clone());
            move || {
                page_start
                    .get()
                    .saturating_add(page_size)
                    .min(data_length.get())
            }
        });

        let page_numbers = Computed::new({
            let (page, slide, last_page) = (page.clone(), slide.clone(), last_page.clone());
            move || page_window(page.get(), slide.get(), last_page.get())
        });

        let paged = Computed::new({
            let filtered = filtered.clone();
            let (page_start, page_end) = (page_start.clone(), page_end.clone());
            move || {
                let end = page_end.get();
                let start = page_start.get().min(end);
                Page {
                    items: filtered.with(|items| items[start..end].to_vec()),
                }
            }
        });

        let searched = Computed::new({
            let query = options.query.clone();
            let (filtered, paged) = (filtered.clone(), paged.clone());
            move || {
                let needle = query.with(|query| query.to_lowercase());
                if needle.is_empty() {
                    return paged.get();
                }
                filtered.with(|items| Page {
                    items: items
                        .iter()
                        .filter(|item| item.with_name(|name| name.to_lowercase().contains(&needle)))
                        .cloned()
                        .collect(),
                })
            }
        });

        Self {
            title,
            template: template.into(),
            options,
            page_size,
            current_page,
            page_slide,
            filtered,
            data_length,
            page,
            last_page,
            has_next_page,
            has_prev_page,
            page_start,
            page_end,
            page_numbers,
            paged,
            searched,
        }
    }

    /// Display title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Template identifier used by the renderer
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Query and filter
    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    /// The search query cell
    pub fn query(&self) -> &Observable<String> {
        &self.options.query
    }

    /// Items per page
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// The current page input, as typed
    pub fn current_page(&self) -> &NumericCell {
        &self.current_page
    }

    /// The page-number window half-width input, as typed
    pub fn page_slide(&self) -> &NumericCell {
        &self.page_slide
    }

    /// Items passing the filter, in source order
    pub fn filtered(&self) -> Vec<ItemRef> {
        self.filtered.get()
    }

    /// Number of filtered items
    pub fn data_length(&self) -> usize {
        self.data_length.get()
    }

    /// The page in effect: the current page input floored, at least 1
    pub fn page(&self) -> usize {
        self.page.get()
    }

    /// Last page number; 0 when there are no items
    pub fn last_page(&self) -> usize {
        self.last_page.get()
    }

    /// Whether a later page exists
    pub fn has_next_page(&self) -> bool {
        self.has_next_page.get()
    }

    /// Whether an earlier page exists
    pub fn has_prev_page(&self) -> bool {
        self.has_prev_page.get()
    }

    /// Offset of the first item on the current page
    pub fn page_start(&self) -> usize {
        self.page_start.get()
    }

    /// Offset one past the last item on the current page
    pub fn page_end(&self) -> usize {
        self.page_end.get()
    }

    /// Page numbers to show in the pager
    pub fn page_numbers(&self) -> Vec<usize> {
        self.page_numbers.get()
    }

    /// The current page of filtered items
    pub fn paged(&self) -> Page {
        self.paged.get()
    }

    /// Search results when a query is set (unpaginated), otherwise [`paged`](Self::paged)
    pub fn searched(&self) -> Page {
        self.searched.get()
    }

    /// Advance one page if there is a next page
    pub fn next_page(&self) -> bool {
        let target = untracked(|| self.has_next_page().then(|| self.page() + 1));
        target.map(|page| self.go_to_page(page)).is_some()
    }

    /// Go back one page if there is a previous page
    pub fn prev_page(&self) -> bool {
        let target = untracked(|| self.has_prev_page().then(|| self.page() - 1));
        target.map(|page| self.go_to_page(page)).is_some()
    }

    /// Jump to `page`. Out-of-range pages are allowed and show nothing
    pub fn go_to_page(&self, page: usize) {
        self.current_page.set_number(page as f64);
    }
}

impl std::fmt::Debug for ListView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListView")
            .field("title", &self.title)
            .field("template", &self.template)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

/// Floor a cell number to a whole count no smaller than `min`
fn whole_number(number: f64, min: usize) -> usize {
    // `as` saturates for out-of-range floats
    (number.floor() as usize).max(min)
}

/// `floor((len - 1) / page_size) + 1`, which is 0 for an empty list
fn last_page(len: usize, page_size: usize) -> usize {
    if len == 0 { 0 } else { (len - 1) / page_size + 1 }
}

/// Symmetric window of `2 * slide + 1` page numbers around `page`, shifted
/// rather than truncated at either end, and clamped to `1..=last_page`.
fn page_window(page: usize, slide: usize, last_page: usize) -> Vec<usize> {
    let width = slide.saturating_mul(2);
    let from = page.saturating_sub(slide).max(1);
    let to = page.saturating_add(slide).min(last_page);
    let from = to.saturating_sub(width).min(from).max(1);
    let to = from.saturating_add(width).max(to).min(last_page);
    (from..=to).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemData;

    fn store_of(count: u64) -> Rc<Store> {
        Rc::new(Store::new(
            (1..=count).map(|id| ItemData::new(id, format!("item {id}"), id % 2 == 1)),
        ))
    }

    fn view(store: Rc<Store>, filter: Option<Filter>) -> ListView {
        ListView::new("All", "listTmpl", ViewOptions::new(filter), store, &ViewConfig::default())
    }

    #[test]
    fn page_window_slides_at_the_edges() {
        assert_eq!(page_window(1, 2, 10), [1, 2, 3, 4, 5]);
        assert_eq!(page_window(10, 2, 10), [6, 7, 8, 9, 10]);
        assert_eq!(page_window(2, 2, 3), [1, 2, 3]);
        assert_eq!(page_window(5, 2, 10), [3, 4, 5, 6, 7]);
        assert_eq!(page_window(4, 0, 10), [4]);
        assert_eq!(page_window(1, 2, 0), Vec::<usize>::new());
    }

    #[test]
    fn last_page_is_zero_for_empty_lists() {
        assert_eq!(last_page(0, 5), 0);
        assert_eq!(last_page(1, 5), 1);
        assert_eq!(last_page(5, 5), 1);
        assert_eq!(last_page(6, 5), 2);
    }

    #[test]
    fn whole_number_floors_and_clamps() {
        assert_eq!(whole_number(2.7, 1), 2);
        assert_eq!(whole_number(0.0, 1), 1);
        assert_eq!(whole_number(-3.0, 1), 1);
        assert_eq!(whole_number(-3.0, 0), 0);
    }

    #[test]
    fn pagination_fields_follow_the_current_page() {
        let view = view(store_of(12), None);
        assert_eq!(view.data_length(), 12);
        assert_eq!(view.last_page(), 3);
        assert_eq!((view.page_start(), view.page_end()), (0, 5));
        assert!(view.has_next_page());
        assert!(!view.has_prev_page());

        view.current_page().write("3");
        assert_eq!((view.page_start(), view.page_end()), (10, 12));
        assert_eq!(view.paged().ids(), [11, 12]);
        assert!(!view.has_next_page());
        assert!(view.has_prev_page());
        assert_eq!(view.page_numbers(), [1, 2, 3]);
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let view = view(store_of(7), None);
        view.go_to_page(9);

        assert!(view.paged().items.is_empty());
        assert!(view.searched().items.is_empty());
        assert!(!view.has_next_page());
        assert!(view.has_prev_page());
    }

    #[test]
    fn non_numeric_page_keeps_the_previous_page() {
        let view = view(store_of(12), None);
        view.current_page().write("2");
        assert_eq!(view.paged().ids(), [6, 7, 8, 9, 10]);

        view.current_page().write("two");
        assert_eq!(view.page(), 2);
        assert_eq!(view.paged().ids(), [6, 7, 8, 9, 10]);
    }

    #[test]
    fn empty_view_is_degenerate_but_defined() {
        let view = view(store_of(0), None);
        assert_eq!(view.data_length(), 0);
        assert_eq!(view.last_page(), 0);
        assert!(!view.has_next_page());
        assert!(!view.has_prev_page());
        assert_eq!((view.page_start(), view.page_end()), (0, 0));
        assert!(view.page_numbers().is_empty());
        assert!(view.paged().items.is_empty());
        assert!(view.searched().items.is_empty());
    }

    #[test]
    fn navigation_stops_at_the_bounds() {
        let view = view(store_of(11), None);
        assert!(!view.prev_page());
        assert!(view.next_page());
        assert!(view.next_page());
        assert!(!view.next_page());
        assert_eq!(view.page(), 3);
        assert!(view.prev_page());
        assert_eq!(view.current_page().get(), crate::CellValue::Number(2.0));
    }

    #[test]
    fn search_overrides_pagination() {
        let view = view(store_of(12), None);
        view.current_page().write("2");
        view.query().set("ITEM 1".to_string());

        assert_eq!(view.searched().ids(), [1, 10, 11, 12]);
        assert_eq!(view.paged().ids(), [6, 7, 8, 9, 10]);
    }

    #[test]
    fn page_slide_input_resizes_the_window() {
        let view = view(store_of(50), None);
        view.go_to_page(5);
        assert_eq!(view.page_numbers(), [3, 4, 5, 6, 7]);

        view.page_slide().write("1");
        assert_eq!(view.page_numbers(), [4, 5, 6]);

        view.page_slide().write("-");
        assert_eq!(view.page_numbers(), [4, 5, 6]);
    }
}
