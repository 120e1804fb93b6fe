//! Pure derivation of the currently visible book list. Every function here is
//! a function of its arguments alone: no storage access, no hidden state, and
//! inputs are never mutated. The UI re-runs this pipeline after every store
//! mutation or filter-control change so the rendered list always agrees with
//! the collection.

use std::cmp::Ordering;

use crate::models::Book;

/// Sort orders the UI cycles through. `DateAdded` is the default and shows
/// the most recently added books first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    DateAdded,
    Title,
    Author,
    Genre,
}

impl SortKey {
    /// Human-readable name for the footer and the sort indicator.
    pub fn label(self) -> &'static str {
        match self {
            SortKey::DateAdded => "Newest",
            SortKey::Title => "Title",
            SortKey::Author => "Author",
            SortKey::Genre => "Genre",
        }
    }

    /// The next key in the cycle, wrapping back to the default.
    pub fn next(self) -> Self {
        match self {
            SortKey::DateAdded => SortKey::Title,
            SortKey::Title => SortKey::Author,
            SortKey::Author => SortKey::Genre,
            SortKey::Genre => SortKey::DateAdded,
        }
    }
}

/// Genre selector state: either everything or exactly one genre value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenreFilter {
    #[default]
    All,
    Only(String),
}

impl GenreFilter {
    /// Human-readable name for the footer and the filter indicator.
    pub fn label(&self) -> &str {
        match self {
            GenreFilter::All => "All genres",
            GenreFilter::Only(genre) => genre,
        }
    }

    fn keeps(&self, book: &Book) -> bool {
        match self {
            GenreFilter::All => true,
            GenreFilter::Only(genre) => book.genre == *genre,
        }
    }
}

/// Header counters: total records and how many distinct genres they span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    pub total_books: usize,
    pub distinct_genres: usize,
}

/// Keep the records matching the genre selector and the free-text query, in
/// their original relative order. The query matches case-insensitively as a
/// substring of title, author, genre, or ISBN; records without an ISBN can
/// only match on the other three fields.
pub fn filter_books(books: &[Book], genre: &GenreFilter, query: &str) -> Vec<Book> {
    let needle = query.to_lowercase();
    let needle = if needle.trim().is_empty() {
        None
    } else {
        Some(needle)
    };

    books
        .iter()
        .filter(|book| genre.keeps(book))
        .filter(|book| match &needle {
            None => true,
            Some(needle) => matches_query(book, needle),
        })
        .cloned()
        .collect()
}

fn matches_query(book: &Book, needle: &str) -> bool {
    book.title.to_lowercase().contains(needle)
        || book.author.to_lowercase().contains(needle)
        || book.genre.to_lowercase().contains(needle)
        || book
            .isbn
            .as_ref()
            .is_some_and(|isbn| isbn.to_lowercase().contains(needle))
}

/// Produce a newly ordered copy of `books`. Text keys compare lowercase first
/// and fall back to the original text so accents and capitalization order
/// deterministically; `DateAdded` orders by creation time descending. The
/// sort is stable, so records with equal keys keep their input order.
pub fn sort_books(books: &[Book], key: SortKey) -> Vec<Book> {
    let mut sorted = books.to_vec();
    match key {
        SortKey::Title => sorted.sort_by(|a, b| compare_text(&a.title, &b.title)),
        SortKey::Author => sorted.sort_by(|a, b| compare_text(&a.author, &b.author)),
        SortKey::Genre => sorted.sort_by(|a, b| compare_text(&a.genre, &b.genre)),
        SortKey::DateAdded => sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
    sorted
}

/// Order by lowercase first but fall back to the original text, so mixed-case
/// values group together without collapsing into an arbitrary order.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Every distinct genre present in the collection, sorted for the genre
/// selector. First occurrence wins on exact duplicates, so the result is
/// also deduplicated.
pub fn distinct_genres(books: &[Book]) -> Vec<String> {
    let mut genres: Vec<String> = Vec::new();
    for book in books {
        if !genres.contains(&book.genre) {
            genres.push(book.genre.clone());
        }
    }
    genres.sort_by(|a, b| compare_text(a, b));
    genres
}

/// Counters for the header line.
pub fn catalog_stats(books: &[Book]) -> CatalogStats {
    CatalogStats {
        total_books: books.len(),
        distinct_genres: distinct_genres(books).len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    /// Build a book with a creation time offset in minutes, so date ordering
    /// is deterministic without real clocks.
    fn book(id: &str, title: &str, author: &str, genre: &str, isbn: Option<&str>, minute: u32) -> Book {
        Book {
            id: id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            isbn: isbn.map(str::to_string),
            favorite: false,
            created_at: Utc.with_ymd_and_hms(2024, 5, 4, 12, minute, 0).unwrap(),
            updated_at: None,
        }
    }

    fn library() -> Vec<Book> {
        vec![
            book("1", "The Great Gatsby", "F. Scott Fitzgerald", "Fiction", Some("978-0743273565"), 0),
            book("2", "To Kill a Mockingbird", "Harper Lee", "Fiction", None, 1),
            book("3", "1984", "George Orwell", "Science Fiction", Some("978-0451524935"), 2),
            book("4", "Pride and Prejudice", "Jane Austen", "Romance", None, 3),
            book("5", "The Hobbit", "J.R.R. Tolkien", "Fantasy", Some("978-0547928241"), 4),
        ]
    }

    #[test]
    fn genre_filter_keeps_matching_subset_in_order() {
        let books = library();
        let fiction = filter_books(&books, &GenreFilter::Only("Fiction".into()), "");
        let ids: Vec<&str> = fiction.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
    }

    #[test]
    fn blank_query_keeps_everything() {
        let books = library();
        assert_eq!(filter_books(&books, &GenreFilter::All, "").len(), books.len());
        assert_eq!(filter_books(&books, &GenreFilter::All, "   ").len(), books.len());
    }

    #[test]
    fn query_matches_every_text_field_case_insensitively() {
        let books = library();

        // Title, author, genre, and ISBN are all searchable.
        assert_eq!(filter_books(&books, &GenreFilter::All, "gatsby")[0].id, "1");
        assert_eq!(filter_books(&books, &GenreFilter::All, "ORWELL")[0].id, "3");
        assert_eq!(filter_books(&books, &GenreFilter::All, "romance")[0].id, "4");
        assert_eq!(filter_books(&books, &GenreFilter::All, "0547928241")[0].id, "5");
    }

    #[test]
    fn absent_isbn_never_matches() {
        let books = vec![book("1", "A", "B", "C", None, 0)];
        assert!(filter_books(&books, &GenreFilter::All, "978").is_empty());
    }

    #[test]
    fn genre_and_query_compose() {
        let books = library();
        let hits = filter_books(&books, &GenreFilter::Only("Fiction".into()), "harper");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");
    }

    #[test]
    fn sort_by_title_orders_case_insensitively() {
        let sorted = sort_books(&library(), SortKey::Title);
        for pair in sorted.windows(2) {
            assert!(pair[0].title.to_lowercase() <= pair[1].title.to_lowercase());
        }
        assert_eq!(sorted[0].title, "1984");
    }

    #[test]
    fn sort_by_date_added_puts_most_recent_first() {
        let sorted = sort_books(&library(), SortKey::DateAdded);
        for pair in sorted.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
        assert_eq!(sorted[0].id, "5");
    }

    #[test]
    fn sort_keeps_input_order_for_equal_keys() {
        let books = vec![
            book("first", "Same Title", "X", "G", None, 7),
            book("second", "Same Title", "Y", "G", None, 7),
        ];
        let by_title = sort_books(&books, SortKey::Title);
        assert_eq!(by_title[0].id, "first");
        let by_date = sort_books(&books, SortKey::DateAdded);
        assert_eq!(by_date[0].id, "first");
    }

    #[test]
    fn sort_leaves_its_input_untouched() {
        let books = library();
        let _ = sort_books(&books, SortKey::Author);
        let ids: Vec<&str> = books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn distinct_genres_are_sorted_and_deduplicated() {
        let genres = distinct_genres(&library());
        assert_eq!(genres, ["Fantasy", "Fiction", "Romance", "Science Fiction"]);
    }

    #[test]
    fn stats_count_books_and_genres() {
        let stats = catalog_stats(&library());
        assert_eq!(stats.total_books, 5);
        assert_eq!(stats.distinct_genres, 4);

        let empty = catalog_stats(&[]);
        assert_eq!(empty.total_books, 0);
        assert_eq!(empty.distinct_genres, 0);
    }
}
