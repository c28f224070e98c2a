#![deny(missing_docs)]

//! Reactive, filterable, paginated list views.
//!
//! A [`Store`] holds items keyed by id. Each [`ListView`] derives a filtered,
//! paginated and searchable projection of it, and the [`Views`] collection
//! tracks which view is selected. Every derived field is a memoized
//! [`Computed`] in a fine-grained dependency graph: writing an input
//! recomputes exactly the values that depend on it, once, and never exposes a
//! half-updated state.
//!
//! # Quick Start
//!
//! ```ignore
//! use reactive_views::{App, Effect};
//!
//! let app = App::new(App::demo());
//! let active = app.views().get(1).unwrap().clone();
//!
//! // Effects re-run whenever what they read changes
//! let _render = Effect::new(move || {
//!     println!("{:?}", active.searched().names());
//! });
//!
//! // One render for the whole payload
//! app.update(App::demo_mutation());
//! ```
//!
//! # View Model
//!
//! - [`Store`] - Ordered, id-keyed items. [`update`](Store::update) merges in place.
//! - [`ListView`] - `filtered`, pagination fields, `paged` and `searched`.
//! - [`Views`] - The "All", "Active" and "Inactive" views plus the selection.
//! - [`NumericCell`] - Text input that coerces to a number when it can.
//!
//! # Reactive Engine
//!
//! - [`Signal`] - Value-less change marker. [`track`](Signal::track) subscribes, [`emit`](Signal::emit) notifies.
//! - [`Observable<T>`] - A value plus its signal.
//! - [`Computed<T>`] - Lazy memo. Recomputes only when a dependency really changed.
//! - [`Effect`] - Side-effectful observer. Runs once, then again after each change.
//! - [`Transaction`] - Batch writes into one round of effect runs.
//!
//! ```ignore
//! let count = Observable::new(1);
//! let doubled = Computed::new({
//!     let count = count.clone();
//!     move || count.get() * 2
//! });
//!
//! Transaction::run(|| {
//!     count.set(2);
//!     count.set(3);
//! });
//! assert_eq!(doubled.get(), 6); // computed once
//! ```
//!
//! The engine is single-threaded: each thread has its own graph.

// Internal modules
pub(crate) mod arena;
mod computed;
mod effect;
mod observable;
mod signal;
mod transaction;

mod app;
mod config;
mod error;
mod filter;
mod item;
mod list_view;
mod numeric;
mod store;
mod views;

// Engine
pub use computed::Computed;
pub use effect::Effect;
pub use observable::Observable;
pub use signal::Signal;
pub use transaction::{Transaction, is_transaction_active};

// Key functions
pub use effect::{flush_effects, pending_effects, untracked};

// View model
pub use app::App;
pub use config::{DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SLIDE, ViewConfig};
pub use error::{ConfigError, StoreError};
pub use filter::{Filter, FilterClause};
pub use item::{Item, ItemData, ItemRef};
pub use list_view::{ListView, Page, ViewOptions};
pub use numeric::{CellValue, NumericCell, parse_float};
pub use store::{Store, UpdateSummary};
pub use views::{LIST_TEMPLATE, Views};
