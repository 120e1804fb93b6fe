use std::cmp::min;
use std::fs;
use std::mem;

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::catalog::{
    create_book, delete_book, export_snapshot, fetch_all_books, fetch_book, import_snapshot,
    toggle_favorite, update_book, Catalog,
};
use crate::models::Book;
use crate::views::{catalog_stats, distinct_genres, filter_books, sort_books, GenreFilter, SortKey};

use super::forms::{BookField, BookForm, ConfirmBookDelete, ImportForm};
use super::helpers::{centered_rect, format_timestamp, surface_error};

/// Header space reserved for the application title and catalog counters.
const HEADER_HEIGHT: u16 = 4;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height allocation per book card in the list view.
const BOOK_CARD_HEIGHT: u16 = 5;
/// File written next to the working directory when the user exports.
const EXPORT_FILE_NAME: &str = "books-export.json";

/// Fine-grained interaction modes layered over the book list. Keeping this
/// explicit makes it easy to reason about which rendering path runs and what
/// keyboard shortcuts should do.
enum Mode {
    Normal,
    AddingBook(BookForm),
    EditingBook {
        id: String,
        form: BookForm,
    },
    /// Read-only details dialog for the selected book.
    ViewingBook(Book),
    ConfirmBookDelete(ConfirmBookDelete),
    Searching(SearchState),
    ImportingSnapshot(ImportForm),
}

/// State for an active inline search. The query applies live while typing;
/// Enter keeps it, Esc clears it.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI. The collection snapshot
/// and the derived visible list live side by side; every mutation re-reads
/// the former and re-derives the latter so they can never disagree.
pub struct App {
    catalog: Catalog,
    books: Vec<Book>,
    visible: Vec<Book>,
    genres: Vec<String>,
    genre_filter: GenreFilter,
    sort_key: SortKey,
    query: String,
    selected: usize,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(catalog: Catalog, books: Vec<Book>, seeded: bool) -> Self {
        let genres = distinct_genres(&books);
        let mut app = Self {
            catalog,
            books,
            visible: Vec::new(),
            genres,
            genre_filter: GenreFilter::All,
            sort_key: SortKey::default(),
            query: String::new(),
            selected: 0,
            mode: Mode::Normal,
            status: None,
        };
        app.apply_view(None);
        if seeded {
            app.set_status(
                "Added sample books to get your catalog started.",
                StatusKind::Info,
            );
        }
        app
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBook(form) => self.handle_add_book(code, form)?,
            Mode::EditingBook { id, form } => self.handle_edit_book(code, id, form)?,
            Mode::ViewingBook(book) => self.handle_view_book(code, book)?,
            Mode::ConfirmBookDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::Searching(state) => self.handle_search(code, state)?,
            Mode::ImportingSnapshot(form) => self.handle_import(code, form)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-5),
            KeyCode::PageDown => self.move_selection(5),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.visible.len().saturating_sub(1),
            KeyCode::Enter => {
                if let Some(book) = self.current_book().cloned() {
                    self.clear_status();
                    return Ok(Mode::ViewingBook(book));
                }
                self.set_status("No book selected.", StatusKind::Error);
            }
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::AddingBook(BookForm::default()));
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(book) = self.current_book().cloned() {
                    self.clear_status();
                    return Ok(Mode::EditingBook {
                        id: book.id.clone(),
                        form: BookForm::from_book(&book),
                    });
                }
                self.set_status("No book selected to edit.", StatusKind::Error);
            }
            KeyCode::Char('-') => {
                if let Some(book) = self.current_book().cloned() {
                    self.clear_status();
                    return Ok(Mode::ConfirmBookDelete(ConfirmBookDelete::from(book)));
                }
                self.set_status("No book selected to delete.", StatusKind::Error);
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                if let Some(book) = self.current_book().cloned() {
                    self.toggle_current_favorite(&book);
                } else {
                    self.set_status("No book selected.", StatusKind::Error);
                }
            }
            KeyCode::Char('/') => {
                self.clear_status();
                return Ok(Mode::Searching(SearchState {
                    query: self.query.clone(),
                }));
            }
            KeyCode::Char('g') | KeyCode::Char('G') => self.cycle_genre_filter(),
            KeyCode::Char('s') | KeyCode::Char('S') => self.cycle_sort_key(),
            KeyCode::Char('x') | KeyCode::Char('X') => self.export_to_file(),
            KeyCode::Char('i') | KeyCode::Char('I') => {
                self.clear_status();
                return Ok(Mode::ImportingSnapshot(ImportForm::default()));
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add book cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_book(&form) {
                Ok(_) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingBook(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_edit_book(&mut self, code: KeyCode, id: String, mut form: BookForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_existing_book(&id, &form) {
                Ok(_) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::EditingBook { id, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_view_book(&mut self, code: KeyCode, book: Book) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => Ok(Mode::Normal),
            KeyCode::Char('e') | KeyCode::Char('E') => Ok(Mode::EditingBook {
                id: book.id.clone(),
                form: BookForm::from_book(&book),
            }),
            KeyCode::Char('-') => Ok(Mode::ConfirmBookDelete(ConfirmBookDelete::from(book))),
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.toggle_current_favorite(&book);
                // Re-read so the dialog reflects the flip immediately.
                match fetch_book(&self.catalog, &book.id) {
                    Some(updated) => Ok(Mode::ViewingBook(updated)),
                    None => Ok(Mode::Normal),
                }
            }
            _ => Ok(Mode::ViewingBook(book)),
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmBookDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(_) => Ok(Mode::Normal),
                    Err(err) => {
                        let message = surface_error(&err);
                        self.set_status(message, StatusKind::Error);
                        Ok(Mode::ConfirmBookDelete(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmBookDelete(confirm)),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.query.clear();
                self.apply_view(None);
                self.set_status("Search cleared.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => {
                return Ok(Mode::Normal);
            }
            KeyCode::Up => {
                self.move_selection(-1);
                return Ok(Mode::Searching(state));
            }
            KeyCode::Down => {
                self.move_selection(1);
                return Ok(Mode::Searching(state));
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    state.query.push(ch);
                }
            }
            _ => {}
        }

        // The query applies as it is typed, mirroring the live list refresh.
        self.query = state.query.clone();
        self.apply_view(None);
        Ok(Mode::Searching(state))
    }

    fn handle_import(&mut self, code: KeyCode, mut form: ImportForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Import cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.perform_import(&form) {
                Ok(count) => {
                    self.set_status(
                        format!("Imported {count} books. The previous catalog was replaced."),
                        StatusKind::Info,
                    );
                    keep_open = false;
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::ImportingSnapshot(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let header_height = HEADER_HEIGHT.min(area.height);
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (header_area, list_area, footer_area) = if area.height > header_height + footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(header_height),
                    Constraint::Min(0),
                    Constraint::Length(footer_height),
                ])
                .split(area);
            (chunks[0], chunks[1], chunks[2])
        } else {
            (area, area, area)
        };

        if area.height > header_height + footer_height {
            self.draw_header(frame, header_area);
            self.draw_footer(frame, footer_area);
        }
        self.draw_book_list(frame, list_area);

        match &self.mode {
            Mode::AddingBook(form) => self.draw_book_form(frame, area, "Add Book", form),
            Mode::EditingBook { form, .. } => self.draw_book_form(frame, area, "Edit Book", form),
            Mode::ViewingBook(book) => self.draw_book_details(frame, area, book),
            Mode::ConfirmBookDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::ImportingSnapshot(form) => self.draw_import_form(frame, area, form),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().title("Book Catalog").borders(Borders::ALL);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let stats = catalog_stats(&self.books);
        let counters = Line::from(vec![
            Span::styled(
                format!("{} books", stats.total_books),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled(
                format!("{} genres", stats.distinct_genres),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]);

        let mut view_parts = vec![
            Span::raw("Sort: "),
            Span::styled(self.sort_key.label(), Style::default().fg(Color::Cyan)),
            Span::raw("   Genre: "),
            Span::styled(
                self.genre_filter.label().to_string(),
                Style::default().fg(Color::Cyan),
            ),
        ];
        if !self.query.trim().is_empty() {
            view_parts.push(Span::raw("   Search: "));
            view_parts.push(Span::styled(
                self.query.clone(),
                Style::default().fg(Color::Cyan),
            ));
        }

        let paragraph = Paragraph::new(vec![counters, Line::from(view_parts)]);
        frame.render_widget(paragraph, inner);
    }

    fn draw_book_list(&self, frame: &mut Frame, area: Rect) {
        if self.visible.is_empty() {
            let message = if self.books.is_empty() {
                "No books yet. Press '+' to add one."
            } else {
                "No books match the current search or genre filter."
            };
            let paragraph = Paragraph::new(message)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::NONE));
            frame.render_widget(paragraph, area);
            return;
        }

        self.render_book_cards(frame, area, &self.visible, self.selected);
    }

    fn render_book_cards(&self, frame: &mut Frame, area: Rect, books: &[Book], selected: usize) {
        if books.is_empty() || area.height == 0 {
            return;
        }

        // Scroll window keeping the selected card visible.
        let card_height = BOOK_CARD_HEIGHT as usize;
        let capacity = ((area.height as usize) / card_height).max(1);
        let len = books.len();
        let mut start = if selected >= capacity {
            selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > len {
            start = len.saturating_sub(capacity);
        }
        let end = min(start + capacity, len);
        let visible_len = end.saturating_sub(start);
        if visible_len == 0 {
            return;
        }

        let constraints: Vec<Constraint> = (0..visible_len)
            .map(|_| Constraint::Length(BOOK_CARD_HEIGHT))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (idx, chunk) in rows.iter().enumerate() {
            if chunk.height == 0 {
                continue;
            }

            let book_index = start + idx;
            if book_index >= len {
                break;
            }

            let book = &books[book_index];
            let mut block = Block::default().borders(Borders::ALL);
            let mut paragraph_style = Style::default();
            if book_index == selected {
                block = block.style(Style::default().fg(Color::Yellow));
                paragraph_style = Style::default().fg(Color::Yellow);
            }

            let mut title = String::new();
            if book_index == selected {
                title.push_str("▶ ");
            }
            if book.favorite {
                title.push_str("★ ");
            }
            title.push_str(&book.title);

            let mut lines = vec![
                Line::from(Span::styled(
                    title,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("by {}", book.author),
                    Style::default().fg(Color::Gray),
                )),
            ];

            let mut detail = book.genre.clone();
            if let Some(isbn) = &book.isbn {
                detail.push_str("  ·  ");
                detail.push_str(isbn);
            }
            lines.push(Line::from(Span::styled(
                detail,
                Style::default().fg(Color::Cyan),
            )));

            let paragraph = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true })
                .alignment(Alignment::Left)
                .style(paragraph_style);

            frame.render_widget(paragraph, *chunk);
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match &self.mode {
            Mode::AddingBook(_) | Mode::EditingBook { .. } => Line::from(vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Switch Field   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::ViewingBook(_) => Line::from(vec![
                Span::styled("[E]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[-]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[F]", key_style),
                Span::raw(" Favorite   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Close"),
            ]),
            Mode::ConfirmBookDelete(_) => Line::from(vec![
                Span::styled("[Y]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[N/Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::Searching(_) => Line::from(vec![
                Span::raw("Type to filter   "),
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Keep   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Clear"),
            ]),
            Mode::ImportingSnapshot(_) => Line::from(vec![
                Span::raw("Enter the snapshot path   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Import   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::Normal => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" View   "),
                Span::styled("[+]", key_style),
                Span::raw(" Add   "),
                Span::styled("[E]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[-]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[F]", key_style),
                Span::raw(" Favorite   "),
                Span::styled("[/]", key_style),
                Span::raw(" Search   "),
                Span::styled("[G]", key_style),
                Span::raw(" Genre   "),
                Span::styled("[S]", key_style),
                Span::raw(" Sort   "),
                Span::styled("[X]", key_style),
                Span::raw(" Export   "),
                Span::styled("[I]", key_style),
                Span::raw(" Import   "),
                Span::styled("[Q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Title", BookField::Title),
            form.build_line("Author", BookField::Author),
            form.build_line("Genre", BookField::Genre),
            form.build_line("ISBN", BookField::Isbn),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (prefix, row) = match form.active {
            BookField::Title => ("Title: ", 0),
            BookField::Author => ("Author: ", 1),
            BookField::Genre => ("Genre: ", 2),
            BookField::Isbn => ("ISBN: ", 3),
        };
        let cursor_x = inner.x + prefix.len() as u16 + form.value_len(form.active) as u16;
        frame.set_cursor_position((cursor_x, inner.y + row));
    }

    fn draw_book_details(&self, frame: &mut Frame, area: Rect, book: &Book) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Book Details").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let label_style = Style::default().fg(Color::Gray);
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Title:    ", label_style),
                Span::styled(
                    book.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Author:   ", label_style),
                Span::raw(book.author.clone()),
            ]),
            Line::from(vec![
                Span::styled("Genre:    ", label_style),
                Span::raw(book.genre.clone()),
            ]),
        ];

        if let Some(isbn) = &book.isbn {
            lines.push(Line::from(vec![
                Span::styled("ISBN:     ", label_style),
                Span::raw(isbn.clone()),
            ]));
        }

        lines.push(Line::from(vec![
            Span::styled("Favorite: ", label_style),
            Span::raw(if book.favorite { "★ yes" } else { "no" }),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Added:    ", label_style),
            Span::raw(format_timestamp(book.created_at)),
        ]));
        if let Some(updated_at) = book.updated_at {
            lines.push(Line::from(vec![
                Span::styled("Updated:  ", label_style),
                Span::raw(format_timestamp(updated_at)),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "E to edit • - to delete • F to toggle favorite • Esc to close",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmBookDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Delete '{}' permanently?",
                confirm.book.display_title()
            )),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_import_form(&self, frame: &mut Frame, area: Rect, form: &ImportForm) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Import Snapshot")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(format!("Path: {}", form.path)),
            Line::from(""),
            Line::from("Importing replaces the entire catalog with the file's records."),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to import • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + "Path: ".len() as u16 + form.path.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn save_new_book(&mut self, form: &BookForm) -> Result<()> {
        let draft = form.parse_inputs()?;
        let book = create_book(&self.catalog, draft)?;
        self.set_status(format!("Added '{}'.", book.title), StatusKind::Info);
        self.refresh_books(Some(&book.id));
        Ok(())
    }

    fn save_existing_book(&mut self, id: &str, form: &BookForm) -> Result<()> {
        let patch = form.parse_patch()?;
        let book = update_book(&self.catalog, id, patch)?;
        self.set_status(format!("Updated '{}'.", book.title), StatusKind::Info);
        self.refresh_books(Some(id));
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmBookDelete) -> Result<()> {
        delete_book(&self.catalog, &confirm.book.id)?;
        self.set_status(
            format!("Deleted '{}'.", confirm.book.title),
            StatusKind::Info,
        );
        self.refresh_books(None);
        Ok(())
    }

    fn toggle_current_favorite(&mut self, book: &Book) {
        match toggle_favorite(&self.catalog, &book.id) {
            Ok(true) => {
                self.set_status(format!("Marked '{}' as a favorite.", book.title), StatusKind::Info);
            }
            Ok(false) => {
                self.set_status(
                    format!("Removed '{}' from favorites.", book.title),
                    StatusKind::Info,
                );
            }
            Err(err) => {
                let message = surface_error(&err.into());
                self.set_status(message, StatusKind::Error);
            }
        }
        self.refresh_books(Some(&book.id));
    }

    fn export_to_file(&mut self) {
        match self.perform_export() {
            Ok(path) => {
                self.set_status(
                    format!("Exported {} books to {path}.", self.books.len()),
                    StatusKind::Info,
                );
            }
            Err(err) => {
                let message = surface_error(&err);
                self.set_status(message, StatusKind::Error);
            }
        }
    }

    fn perform_export(&self) -> Result<String> {
        let snapshot = export_snapshot(&self.catalog)?;
        fs::write(EXPORT_FILE_NAME, snapshot).context("failed to write the export file")?;
        Ok(EXPORT_FILE_NAME.to_string())
    }

    fn perform_import(&mut self, form: &ImportForm) -> Result<usize> {
        let path = form.parse_inputs()?;
        let text = fs::read_to_string(&path).context("failed to read the snapshot file")?;
        let imported = import_snapshot(&self.catalog, &text)?;
        self.refresh_books(None);
        Ok(imported.len())
    }

    /// Re-read the collection after a mutation and re-derive everything that
    /// hangs off it: the genre selector, the visible list, and the selection.
    fn refresh_books(&mut self, focus_id: Option<&str>) {
        self.books = fetch_all_books(&self.catalog);
        self.genres = distinct_genres(&self.books);

        // A genre filter pointing at a genre that no longer exists resets.
        if let GenreFilter::Only(genre) = &self.genre_filter {
            if !self.genres.contains(genre) {
                self.genre_filter = GenreFilter::All;
            }
        }

        self.apply_view(focus_id);
    }

    /// Run the collection snapshot through the derivation pipeline and clamp
    /// the selection to the new visible list.
    fn apply_view(&mut self, focus_id: Option<&str>) {
        let filtered = filter_books(&self.books, &self.genre_filter, &self.query);
        self.visible = sort_books(&filtered, self.sort_key);

        if let Some(id) = focus_id {
            if let Some(position) = self.visible.iter().position(|book| book.id == id) {
                self.selected = position;
            }
        }
        if self.selected >= self.visible.len() {
            self.selected = self.visible.len().saturating_sub(1);
        }
    }

    fn cycle_genre_filter(&mut self) {
        let next = match &self.genre_filter {
            GenreFilter::All => self.genres.first().cloned().map(GenreFilter::Only),
            GenreFilter::Only(current) => {
                match self.genres.iter().position(|genre| genre == current) {
                    Some(index) if index + 1 < self.genres.len() => {
                        Some(GenreFilter::Only(self.genres[index + 1].clone()))
                    }
                    _ => None,
                }
            }
        };

        self.genre_filter = next.unwrap_or(GenreFilter::All);
        self.set_status(
            format!("Genre filter: {}.", self.genre_filter.label()),
            StatusKind::Info,
        );
        self.apply_view(None);
    }

    fn cycle_sort_key(&mut self) {
        self.sort_key = self.sort_key.next();
        self.set_status(
            format!("Sorted by {}.", self.sort_key.label()),
            StatusKind::Info,
        );
        self.apply_view(None);
    }

    fn current_book(&self) -> Option<&Book> {
        self.visible.get(self.selected)
    }

    fn move_selection(&mut self, offset: isize) {
        if self.visible.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.visible.len() - 1;
        let current = self.selected as isize;
        let next = (current + offset).clamp(0, last as isize);
        self.selected = next as usize;
    }
}
