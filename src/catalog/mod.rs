//! Persistence module split across logical submodules.

mod books;
mod error;
mod storage;

pub use books::{
    create_book, delete_book, export_snapshot, fetch_all_books, fetch_book, import_snapshot,
    load_or_seed_books, toggle_favorite, update_book,
};
pub use error::CatalogError;
pub use storage::{open_catalog, Catalog};
