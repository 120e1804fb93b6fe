//! Domain models that mirror the persisted JSON collection and get passed
//! throughout the TUI. The intent is that these types stay light-weight data
//! holders so other layers can focus on presentation and persistence logic.
//! The serde attributes double as the single source of truth for the on-disk
//! field names, so the blob layout is readable straight from this file.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A single catalog entry. Instances always travel by value between the store
/// and the UI; the store never hands out references into its own state.
pub struct Book {
    /// Opaque unique token assigned at creation and never changed afterwards.
    /// Edit/delete flows bubble it back to the persistence layer.
    pub id: String,
    /// Title displayed in lists and search results. Required, never blank in
    /// a stored record.
    pub title: String,
    /// Author field used both for display and filtering. Required.
    pub author: String,
    /// Genre used for grouping and the genre selector. Required.
    pub genre: String,
    /// Optional ISBN. Stored as an explicit `null` when absent so exported
    /// snapshots keep a uniform record shape.
    #[serde(default)]
    pub isbn: Option<String>,
    /// Reader-toggled favorite flag. Defaults to off for new records.
    #[serde(default)]
    pub favorite: bool,
    /// Creation timestamp, set once by the store. Imported records without
    /// one fall back to the Unix epoch so they sort after everything recent.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Stamped on every successful update; absent from the blob until the
    /// record is first edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Book {
    /// Compose a `Title - Author` string for compact listings. Both fields
    /// are required, so there is no blank-field fallback to worry about.
    pub fn display_title(&self) -> String {
        format!("{} - {}", self.title, self.author)
    }
}

impl fmt::Display for Book {
    /// Write the book title to any formatter. Display is implemented so the
    /// type plays nicely with Ratatui widgets that consume strings implicitly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[derive(Debug, Clone)]
/// Input for creating a record. The store fills in `id`, `favorite`, and
/// `createdAt` itself; callers are expected to have validated that the three
/// required fields are non-blank before building a draft.
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub isbn: Option<String>,
}

#[derive(Debug, Clone, Default)]
/// Partial update applied field-by-field against an existing record. `None`
/// means "leave unchanged"; only `isbn` can be explicitly cleared, via the
/// nested option.
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    /// `Some(None)` clears the ISBN, `Some(Some(..))` replaces it, `None`
    /// keeps whatever is stored.
    pub isbn: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_book() -> Book {
        Book {
            id: "b-1".into(),
            title: "The Hobbit".into(),
            author: "J.R.R. Tolkien".into(),
            genre: "Fantasy".into(),
            isbn: None,
            favorite: false,
            created_at: Utc.with_ymd_and_hms(2024, 5, 4, 12, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn serialized_shape_uses_camel_case_and_explicit_null_isbn() {
        let json = serde_json::to_value(sample_book()).unwrap();
        let object = json.as_object().unwrap();
        assert!(object.contains_key("createdAt"));
        assert!(object["isbn"].is_null());
        // `updatedAt` only appears once the record has been edited.
        assert!(!object.contains_key("updatedAt"));
    }

    #[test]
    fn deserialization_defaults_optional_fields() {
        let book: Book = serde_json::from_str(
            r#"{"id":"x","title":"A","author":"B","genre":"C"}"#,
        )
        .unwrap();
        assert_eq!(book.isbn, None);
        assert!(!book.favorite);
        assert_eq!(book.created_at, DateTime::<Utc>::default());
        assert_eq!(book.updated_at, None);
    }

    #[test]
    fn display_title_joins_title_and_author() {
        assert_eq!(sample_book().display_title(), "The Hobbit - J.R.R. Tolkien");
    }
}
