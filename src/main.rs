//! Binary entry point that glues the JSON-backed catalog to the TUI.
//! Summarizing the bootstrapping pipeline here keeps the intent obvious when
//! revisiting the code: we locate the collection blob, hydrate the initial
//! app state (seeding samples on first run), and drive the Ratatui event loop
//! until the user exits.
use book_catalog_manager::{load_or_seed_books, open_catalog, run_app, App};

/// Initialize persistence, load cached data, and launch the Ratatui event loop.
///
/// Returning a `Result` bubbles up fatal initialization problems (for example
/// the user's home directory being unresolvable) to the terminal instead of
/// crashing silently.
fn main() -> anyhow::Result<()> {
    let catalog = open_catalog()?;
    let (books, seeded) = load_or_seed_books(&catalog)?;

    let mut app = App::new(catalog, books, seeded);
    run_app(&mut app)
}
