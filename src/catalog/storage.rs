use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;

use super::error::CatalogError;
use crate::models::Book;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".book-catalog-manager";
/// Collection blob file name stored inside the application data directory.
const CATALOG_FILE_NAME: &str = "books.json";

/// Handle to the on-disk collection blob. It only knows where the file lives;
/// the full collection is re-read and re-written inside each operation, so no
/// stale in-memory copy can drift from storage between calls.
pub struct Catalog {
    path: PathBuf,
}

/// Ensure the application data directory exists and return a handle pointing
/// at the default blob location inside the user's home.
pub fn open_catalog() -> Result<Catalog> {
    let path = default_catalog_path()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    Ok(Catalog { path })
}

/// Resolve the absolute path to the collection blob inside the user's home.
fn default_catalog_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs
        .home_dir()
        .join(DATA_DIR_NAME)
        .join(CATALOG_FILE_NAME))
}

impl Catalog {
    /// Build a handle against an explicit blob path. Tests point the store at
    /// throwaway locations this way instead of touching the user's home.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Absolute location of the blob, used by export/import status messages.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full collection in storage order. A missing, unreadable, or
    /// unparseable blob reads as an empty collection; the read path never
    /// fails, and the next successful write replaces whatever was corrupt.
    pub(crate) fn read_books(&self) -> Vec<Book> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    /// Replace the blob with the given collection. Every mutating operation
    /// funnels through here exactly once, after applying its change to a
    /// freshly read copy.
    pub(crate) fn write_books(&self, books: &[Book]) -> Result<(), CatalogError> {
        let payload =
            serde_json::to_string(books).map_err(|err| CatalogError::Storage(err.to_string()))?;
        fs::write(&self.path, payload).map_err(|err| CatalogError::Storage(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_blob_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let catalog = Catalog::with_path(tmp.path().join("books.json"));
        assert!(catalog.read_books().is_empty());
    }

    #[test]
    fn corrupt_blob_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("books.json");
        fs::write(&path, "{definitely not json").unwrap();

        let catalog = Catalog::with_path(&path);
        assert!(catalog.read_books().is_empty());
    }

    #[test]
    fn write_then_read_round_trips_storage_order() {
        let tmp = TempDir::new().unwrap();
        let catalog = Catalog::with_path(tmp.path().join("books.json"));

        let books: Vec<Book> = serde_json::from_str(
            r#"[{"id":"1","title":"B","author":"x","genre":"g"},
                {"id":"2","title":"A","author":"y","genre":"g"}]"#,
        )
        .unwrap();
        catalog.write_books(&books).unwrap();

        let read_back = catalog.read_books();
        assert_eq!(read_back, books);
    }
}
