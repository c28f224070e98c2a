//! Renders the demo views as text, applies the demo update and renders again.
//!
//! ```text
//! views-demo [CONFIG.json]
//! ```
//!
//! Set `RUST_LOG=reactive_views=debug` to watch the store and selection.

use reactive_views::{App, Effect, ViewConfig};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ViewConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => ViewConfig::default(),
    };
    let app = Rc::new(App::with_config(App::demo(), &config));
    app.views().select(0);

    let _renderer = Effect::new({
        let app = app.clone();
        move || render(&app)
    });

    tracing::info!("applying demo update");
    let summary = app.update(App::demo_mutation());
    tracing::info!(?summary, "demo update applied");

    Ok(())
}

fn render(app: &App) {
    let selected = app.views().selected_index();
    for (index, view) in app.views().views().iter().enumerate() {
        let marker = if selected == Some(index) { '*' } else { ' ' };
        println!(
            "{marker} {} ({} items, page {} of {})",
            view.title(),
            view.data_length(),
            view.page(),
            view.last_page()
        );
        for item in view.searched().items {
            let state = if item.active() { "active" } else { "inactive" };
            println!("    #{:<3} {:<8} {state}", item.id(), item.name());
        }
        let pages: Vec<String> = view.page_numbers().iter().map(usize::to_string).collect();
        println!("    pages: {}", pages.join(" "));
    }
    println!();
}
