//! Core library surface for the Book Catalog Manager TUI application.
//!
//! The public modules exposed here provide an intentionally small API so the
//! `bin` target as well as potential external tooling can reuse the same
//! pieces: the persistence layer in `catalog`, the pure list derivation in
//! `views`, and the interactive front-end in `ui`.
pub mod catalog;
pub mod models;
pub mod ui;
pub mod views;

/// Convenience re-exports for the persistence layer. These functions are
/// typically used by `main.rs` to locate the collection blob and preload
/// data.
pub use catalog::{load_or_seed_books, open_catalog, Catalog, CatalogError};

/// The primary domain types that other layers manipulate.
pub use models::{Book, BookDraft, BookPatch};

/// The pure derivation pipeline and its control values.
pub use views::{GenreFilter, SortKey};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
