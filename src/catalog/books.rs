use chrono::Utc;
use uuid::Uuid;

use super::error::CatalogError;
use super::storage::Catalog;
use crate::models::{Book, BookDraft, BookPatch};

/// Starter records written the first time the catalog opens empty, so the UI
/// has something to show before the user adds their own books.
const SAMPLE_BOOKS: &[(&str, &str, &str, &str)] = &[
    (
        "The Great Gatsby",
        "F. Scott Fitzgerald",
        "Fiction",
        "978-0743273565",
    ),
    (
        "To Kill a Mockingbird",
        "Harper Lee",
        "Fiction",
        "978-0446310789",
    ),
    ("1984", "George Orwell", "Science Fiction", "978-0451524935"),
    (
        "Pride and Prejudice",
        "Jane Austen",
        "Romance",
        "978-0141439518",
    ),
    ("The Hobbit", "J.R.R. Tolkien", "Fantasy", "978-0547928241"),
];

/// Load the existing collection, seeding the sample set first when the store
/// is empty. Keeping a named function makes the startup flow in `main.rs`
/// easier to read, and tells the caller whether the notice about sample data
/// should be shown.
pub fn load_or_seed_books(catalog: &Catalog) -> Result<(Vec<Book>, bool), CatalogError> {
    let books = fetch_all_books(catalog);
    if !books.is_empty() {
        return Ok((books, false));
    }

    for (title, author, genre, isbn) in SAMPLE_BOOKS {
        create_book(
            catalog,
            BookDraft {
                title: (*title).to_string(),
                author: (*author).to_string(),
                genre: (*genre).to_string(),
                isbn: Some((*isbn).to_string()),
            },
        )?;
    }

    Ok((fetch_all_books(catalog), true))
}

/// Fetch every record in storage order, which is insertion order. Reading is
/// infallible: an absent or damaged blob simply yields an empty collection.
pub fn fetch_all_books(catalog: &Catalog) -> Vec<Book> {
    catalog.read_books()
}

/// Fetch a single record by id. "Not found" is an ordinary absent result
/// here; only mutations treat a missing id as an error.
pub fn fetch_book(catalog: &Catalog, id: &str) -> Option<Book> {
    catalog
        .read_books()
        .into_iter()
        .find(|book| book.id == id)
}

/// Append a brand new record and persist the collection. We echo the hydrated
/// struct so callers can update UI state without having to re-read the blob.
/// Required fields arrive pre-validated by the form layer; the store does not
/// re-check them.
pub fn create_book(catalog: &Catalog, draft: BookDraft) -> Result<Book, CatalogError> {
    let mut books = catalog.read_books();

    let book = Book {
        id: Uuid::new_v4().to_string(),
        title: draft.title,
        author: draft.author,
        genre: draft.genre,
        isbn: draft.isbn,
        favorite: false,
        created_at: Utc::now(),
        updated_at: None,
    };

    books.push(book.clone());
    catalog.write_books(&books)?;
    Ok(book)
}

/// Merge a partial update into an existing record, stamp `updatedAt`, and
/// persist. Fields the patch leaves out are preserved; `id` and `createdAt`
/// are never touched.
pub fn update_book(catalog: &Catalog, id: &str, patch: BookPatch) -> Result<Book, CatalogError> {
    let mut books = catalog.read_books();

    let Some(book) = books.iter_mut().find(|book| book.id == id) else {
        return Err(CatalogError::NotFound(id.to_string()));
    };

    if let Some(title) = patch.title {
        book.title = title;
    }
    if let Some(author) = patch.author {
        book.author = author;
    }
    if let Some(genre) = patch.genre {
        book.genre = genre;
    }
    if let Some(isbn) = patch.isbn {
        book.isbn = isbn;
    }
    book.updated_at = Some(Utc::now());

    let updated = book.clone();
    catalog.write_books(&books)?;
    Ok(updated)
}

/// Remove a record if present. Removing an id that is already gone is a
/// no-op rather than an error, so repeated deletes behave identically.
pub fn delete_book(catalog: &Catalog, id: &str) -> Result<(), CatalogError> {
    let mut books = catalog.read_books();
    let before = books.len();
    books.retain(|book| book.id != id);

    if books.len() == before {
        return Ok(());
    }
    catalog.write_books(&books)
}

/// Flip the favorite flag on a record and persist, returning the new value so
/// the UI can report which way it went.
pub fn toggle_favorite(catalog: &Catalog, id: &str) -> Result<bool, CatalogError> {
    let mut books = catalog.read_books();

    let Some(book) = books.iter_mut().find(|book| book.id == id) else {
        return Err(CatalogError::NotFound(id.to_string()));
    };

    book.favorite = !book.favorite;
    let favorite = book.favorite;
    catalog.write_books(&books)?;
    Ok(favorite)
}

/// Serialize the full collection to pretty-printed JSON, a faithful copy of
/// what `fetch_all_books` returns.
pub fn export_snapshot(catalog: &Catalog) -> Result<String, CatalogError> {
    let books = catalog.read_books();
    serde_json::to_string_pretty(&books).map_err(|err| CatalogError::Storage(err.to_string()))
}

/// Replace the entire collection with the records parsed from `text`. This is
/// a full overwrite, not a merge. Parse failure leaves the stored collection
/// untouched. Records may omit `isbn`, `favorite`, and the timestamps; the
/// record schema fills in defaults.
pub fn import_snapshot(catalog: &Catalog, text: &str) -> Result<Vec<Book>, CatalogError> {
    let books: Vec<Book> =
        serde_json::from_str(text).map_err(|err| CatalogError::InvalidFormat(err.to_string()))?;

    catalog.write_books(&books)?;
    Ok(books)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use tempfile::TempDir;

    /// Set up a catalog backed by a throwaway blob path. The `TempDir` is
    /// returned so it stays alive for the duration of the test.
    fn test_catalog() -> (TempDir, Catalog) {
        let tmp = TempDir::new().unwrap();
        let catalog = Catalog::with_path(tmp.path().join("books.json"));
        (tmp, catalog)
    }

    fn draft(title: &str, author: &str, genre: &str) -> BookDraft {
        BookDraft {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            isbn: None,
        }
    }

    #[test]
    fn create_then_fetch_returns_equal_record() {
        let (_tmp, catalog) = test_catalog();

        let created = create_book(&catalog, draft("1984", "George Orwell", "Science Fiction"))
            .unwrap();
        assert!(!created.favorite);
        assert!(created.created_at > DateTime::<Utc>::default());
        assert_eq!(created.updated_at, None);

        let fetched = fetch_book(&catalog, &created.id).unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetch_all_books(&catalog).len(), 1);
    }

    #[test]
    fn fetch_book_returns_none_for_unknown_id() {
        let (_tmp, catalog) = test_catalog();
        create_book(&catalog, draft("Dune", "Frank Herbert", "Science Fiction")).unwrap();
        assert!(fetch_book(&catalog, "no-such-id").is_none());
    }

    #[test]
    fn update_merges_only_supplied_fields() {
        let (_tmp, catalog) = test_catalog();
        let created = create_book(
            &catalog,
            BookDraft {
                isbn: Some("978-0451524935".to_string()),
                ..draft("1984", "George Orwell", "Science Fiction")
            },
        )
        .unwrap();

        let updated = update_book(
            &catalog,
            &created.id,
            BookPatch {
                title: Some("Nineteen Eighty-Four".to_string()),
                ..BookPatch::default()
            },
        )
        .unwrap();

        assert_eq!(updated.title, "Nineteen Eighty-Four");
        assert_eq!(updated.author, created.author);
        assert_eq!(updated.genre, created.genre);
        assert_eq!(updated.isbn, created.isbn);
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn update_can_clear_the_isbn() {
        let (_tmp, catalog) = test_catalog();
        let created = create_book(
            &catalog,
            BookDraft {
                isbn: Some("978-0547928241".to_string()),
                ..draft("The Hobbit", "J.R.R. Tolkien", "Fantasy")
            },
        )
        .unwrap();

        let updated = update_book(
            &catalog,
            &created.id,
            BookPatch {
                isbn: Some(None),
                ..BookPatch::default()
            },
        )
        .unwrap();
        assert_eq!(updated.isbn, None);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let (_tmp, catalog) = test_catalog();
        let err = update_book(&catalog, "missing", BookPatch::default()).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[test]
    fn delete_is_idempotent() {
        let (_tmp, catalog) = test_catalog();
        let created = create_book(&catalog, draft("Emma", "Jane Austen", "Romance")).unwrap();

        delete_book(&catalog, &created.id).unwrap();
        assert!(fetch_all_books(&catalog).is_empty());

        // Deleting the same id again must not error.
        delete_book(&catalog, &created.id).unwrap();
        assert!(fetch_all_books(&catalog).is_empty());
    }

    #[test]
    fn toggle_favorite_flips_and_restores() {
        let (_tmp, catalog) = test_catalog();
        let created = create_book(&catalog, draft("Emma", "Jane Austen", "Romance")).unwrap();

        assert!(toggle_favorite(&catalog, &created.id).unwrap());
        assert!(!toggle_favorite(&catalog, &created.id).unwrap());
        assert!(!fetch_book(&catalog, &created.id).unwrap().favorite);

        let err = toggle_favorite(&catalog, "missing").unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[test]
    fn export_of_an_empty_store_round_trips() {
        let (_tmp, catalog) = test_catalog();
        let snapshot = export_snapshot(&catalog).unwrap();
        assert_eq!(snapshot.trim(), "[]");
        assert!(import_snapshot(&catalog, &snapshot).unwrap().is_empty());
        assert!(fetch_all_books(&catalog).is_empty());
    }

    #[test]
    fn export_then_import_round_trips() {
        let (_tmp, catalog) = test_catalog();
        create_book(&catalog, draft("1984", "George Orwell", "Science Fiction")).unwrap();
        create_book(&catalog, draft("Emma", "Jane Austen", "Romance")).unwrap();
        let before = fetch_all_books(&catalog);

        let snapshot = export_snapshot(&catalog).unwrap();
        let imported = import_snapshot(&catalog, &snapshot).unwrap();

        assert_eq!(imported, before);
        assert_eq!(fetch_all_books(&catalog), before);
    }

    #[test]
    fn import_replaces_the_entire_collection() {
        let (_tmp, catalog) = test_catalog();
        create_book(&catalog, draft("Dune", "Frank Herbert", "Science Fiction")).unwrap();

        let imported = import_snapshot(
            &catalog,
            r#"[{"id":"x","title":"A","author":"B","genre":"C","favorite":false}]"#,
        )
        .unwrap();

        assert_eq!(imported.len(), 1);
        let books = fetch_all_books(&catalog);
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, "x");
        assert_eq!(books[0].title, "A");
        // Fields the snapshot omitted take their defaults.
        assert_eq!(books[0].isbn, None);
        assert_eq!(books[0].created_at, DateTime::<Utc>::default());
    }

    #[test]
    fn import_rejects_non_array_text_and_keeps_prior_collection() {
        let (_tmp, catalog) = test_catalog();
        let created = create_book(&catalog, draft("Emma", "Jane Austen", "Romance")).unwrap();

        let err = import_snapshot(&catalog, "{not an array}").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidFormat(_)));

        let err = import_snapshot(&catalog, r#"{"books":[]}"#).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidFormat(_)));

        assert_eq!(fetch_all_books(&catalog), vec![created]);
    }

    #[test]
    fn seeding_runs_once_on_an_empty_store() {
        let (_tmp, catalog) = test_catalog();

        let (books, seeded) = load_or_seed_books(&catalog).unwrap();
        assert!(seeded);
        assert_eq!(books.len(), SAMPLE_BOOKS.len());

        let (again, seeded) = load_or_seed_books(&catalog).unwrap();
        assert!(!seeded);
        assert_eq!(again, books);
    }
}
