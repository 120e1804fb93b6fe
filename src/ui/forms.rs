use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Book, BookDraft, BookPatch};

/// Internal representation of the book form used by both the create and the
/// edit modals.
#[derive(Default, Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) genre: String,
    pub(crate) isbn: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

/// Enumerates the fields within the book form to drive focus management.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Genre,
    Isbn,
}

impl BookForm {
    /// Populate the form from an existing book when entering edit mode.
    pub(crate) fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            isbn: book.isbn.clone().unwrap_or_default(),
            active: BookField::Title,
            error: None,
        }
    }

    /// Cycle focus across the four fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            BookField::Title => BookField::Author,
            BookField::Author => BookField::Genre,
            BookField::Genre => BookField::Isbn,
            BookField::Isbn => BookField::Title,
        };
    }

    /// Insert a character into the active field.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BookField::Title => self.title.push(ch),
            BookField::Author => self.author.push(ch),
            BookField::Genre => self.genre.push(ch),
            BookField::Isbn => self.isbn.push(ch),
        }
        true
    }

    /// Remove a character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            BookField::Title => {
                self.title.pop();
            }
            BookField::Author => {
                self.author.pop();
            }
            BookField::Genre => {
                self.genre.pop();
            }
            BookField::Isbn => {
                self.isbn.pop();
            }
        }
    }

    /// Validate and normalize the inputs into a creation draft. This is the
    /// boundary that guarantees the store never sees blank required fields;
    /// a blank ISBN becomes an absent one.
    pub(crate) fn parse_inputs(&self) -> Result<BookDraft> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Title is required."));
        }
        let author = self.author.trim();
        if author.is_empty() {
            return Err(anyhow!("Author is required."));
        }
        let genre = self.genre.trim();
        if genre.is_empty() {
            return Err(anyhow!("Genre is required."));
        }
        let isbn = self.isbn.trim();

        Ok(BookDraft {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            isbn: (!isbn.is_empty()).then(|| isbn.to_string()),
        })
    }

    /// Validate the inputs into a full-field patch for the edit flow. Every
    /// field is supplied, matching what the form shows; clearing the ISBN box
    /// clears the stored value.
    pub(crate) fn parse_patch(&self) -> Result<BookPatch> {
        let draft = self.parse_inputs()?;
        Ok(BookPatch {
            title: Some(draft.title),
            author: Some(draft.author),
            genre: Some(draft.genre),
            isbn: Some(draft.isbn),
        })
    }

    /// Render a styled line for the modal form widget.
    pub(crate) fn build_line(&self, field_name: &str, field: BookField) -> Line<'static> {
        let (value, is_active) = match field {
            BookField::Title => (&self.title, self.active == BookField::Title),
            BookField::Author => (&self.author, self.active == BookField::Author),
            BookField::Genre => (&self.genre, self.active == BookField::Genre),
            BookField::Isbn => (&self.isbn, self.active == BookField::Isbn),
        };

        let placeholder = match field {
            BookField::Isbn => "<optional>",
            _ => "<required>",
        };

        let display = if value.is_empty() {
            placeholder.to_string()
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    /// Character length of the requested field, used for cursor placement.
    pub(crate) fn value_len(&self, field: BookField) -> usize {
        match field {
            BookField::Title => self.title.chars().count(),
            BookField::Author => self.author.chars().count(),
            BookField::Genre => self.genre.chars().count(),
            BookField::Isbn => self.isbn.chars().count(),
        }
    }
}

/// State for confirming permanent book deletion. Holding the whole record
/// keeps the title available for the dialog after the list refreshes.
#[derive(Clone)]
pub(crate) struct ConfirmBookDelete {
    pub(crate) book: Book,
}

impl ConfirmBookDelete {
    pub(crate) fn from(book: Book) -> Self {
        Self { book }
    }
}

/// Single-field form asking for the path of a snapshot file to import.
#[derive(Default, Clone)]
pub(crate) struct ImportForm {
    pub(crate) path: String,
    pub(crate) error: Option<String>,
}

impl ImportForm {
    /// Insert a character into the path field.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.path.push(ch);
        true
    }

    /// Remove the last character from the path field.
    pub(crate) fn backspace(&mut self) {
        self.path.pop();
    }

    /// Validate that a path was actually entered.
    pub(crate) fn parse_inputs(&self) -> Result<String> {
        let path = self.path.trim();
        if path.is_empty() {
            return Err(anyhow!("Snapshot path is required."));
        }
        Ok(path.to_string())
    }
}
