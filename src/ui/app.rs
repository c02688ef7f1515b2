use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::error;

use crate::error::StoreError;
use crate::models::BookRecord;
use crate::store::RecordStore;

use super::forms::{BookForm, ConfirmBookRemove, FormField};
use super::helpers::{centered_rect, section_title, surface_error};
use super::screens::CollectionScreen;

/// Header space for the application title and library summary.
const HEADER_HEIGHT: u16 = 3;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;

/// Fine-grained modes layered over the collection screen.
enum Mode {
    Normal,
    Adding(BookForm),
    /// `title` is the lookup key captured when the form opened.
    Updating {
        title: String,
        form: BookForm,
    },
    ConfirmRemove(ConfirmBookRemove),
    Searching(SearchState),
}

/// State for an active inline search.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Warning,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Warning => Style::default().fg(Color::Yellow),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state. Owns the record store and passes it into each
/// operation triggered by a key press.
pub struct App {
    store: RecordStore,
    collection: CollectionScreen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            collection: CollectionScreen::default(),
            mode: Mode::Normal,
            status: None,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Process one key press. Returns `true` once the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Adding(form) => self.handle_add_book(code, form)?,
            Mode::Updating { title, form } => self.handle_update_book(code, title, form)?,
            Mode::ConfirmRemove(confirm) => self.handle_confirm_remove(code, confirm)?,
            Mode::Searching(state) => self.handle_search(code, state)?,
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let books = self.store.books();
        match code {
            KeyCode::Esc if self.collection.filter.is_some() => {
                self.collection.set_filter(None, books);
                self.set_status("Search cleared.", StatusKind::Info);
            }
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up | KeyCode::Char('k') => self.collection.move_selection(-1, books),
            KeyCode::Down | KeyCode::Char('j') => self.collection.move_selection(1, books),
            KeyCode::PageUp => self.collection.move_selection(-10, books),
            KeyCode::PageDown => self.collection.move_selection(10, books),
            KeyCode::Home => self.collection.select_first(),
            KeyCode::End => self.collection.select_last(books),
            KeyCode::Char('a') | KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::Adding(BookForm::default()));
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                // Prefill from the first record with this title: that is the
                // one `update` replaces, even if a later duplicate is selected.
                if let Some(book) = self
                    .collection
                    .current(books)
                    .and_then(|selected| self.store.find(&selected.title))
                {
                    let title = book.title.clone();
                    let form = BookForm::from_record(book);
                    self.clear_status();
                    return Ok(Mode::Updating { title, form });
                }
                self.set_status("No book selected.", StatusKind::Error);
            }
            KeyCode::Char('d') | KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(book) = self.collection.current(books) {
                    let title = book.title.clone();
                    let matches = books.iter().filter(|b| b.title == title).count();
                    self.clear_status();
                    return Ok(Mode::ConfirmRemove(ConfirmBookRemove { title, matches }));
                }
                self.set_status("No book selected.", StatusKind::Error);
            }
            KeyCode::Char(' ') => {
                if let Some(book) = self
                    .collection
                    .current(books)
                    .and_then(|selected| self.store.find(&selected.title))
                    .cloned()
                {
                    self.toggle_read(book);
                } else {
                    self.set_status("No book selected.", StatusKind::Error);
                }
            }
            KeyCode::Char('/') => {
                let query = self.collection.filter.clone().unwrap_or_default();
                return Ok(Mode::Searching(SearchState { query }));
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
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_book(&form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let (message, kind) = describe_store_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, kind);
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
            Ok(Mode::Adding(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_update_book(
        &mut self,
        code: KeyCode,
        title: String,
        mut form: BookForm,
    ) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Update cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_existing_book(&title, &form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let (message, kind) = describe_store_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, kind);
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
            Ok(Mode::Updating { title, form })
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_remove(
        &mut self,
        code: KeyCode,
        confirm: ConfirmBookRemove,
    ) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Removal cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_remove(&confirm) {
                    Ok(()) => Ok(Mode::Normal),
                    Err(err) => {
                        let (message, kind) = describe_store_error(&err);
                        self.set_status(message, kind);
                        Ok(Mode::ConfirmRemove(confirm))
                    }
                }
            }
            _ => Ok(Mode::ConfirmRemove(confirm)),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.collection.set_filter(None, self.store.books());
                self.set_status("Search cleared.", StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => {
                let visible = self.collection.view(self.store.books()).len();
                self.set_status(format!("{visible} matching books."), StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => return Ok(Mode::Searching(state)),
        }

        let filter = Some(state.query.clone()).filter(|q| !q.is_empty());
        self.collection.set_filter(filter, self.store.books());
        self.collection.select_first();
        Ok(Mode::Searching(state))
    }

    fn save_new_book(&mut self, form: &BookForm) -> Result<()> {
        let book = form.to_record();
        let title = book.title.clone();
        self.store.add(book)?;
        self.collection.focus_title(&title, self.store.books());
        self.set_status(format!("'{title}' added successfully!"), StatusKind::Info);
        Ok(())
    }

    fn save_existing_book(&mut self, title: &str, form: &BookForm) -> Result<()> {
        let book = form.to_record();
        let new_title = book.title.clone();
        if self.store.update(title, book)? {
            self.collection.focus_title(&new_title, self.store.books());
            self.set_status(
                format!("'{new_title}' updated successfully!"),
                StatusKind::Info,
            );
        } else {
            self.collection.ensure_in_bounds(self.store.books());
            self.set_status(
                format!("No book titled '{title}' to update."),
                StatusKind::Warning,
            );
        }
        Ok(())
    }

    fn perform_remove(&mut self, confirm: &ConfirmBookRemove) -> Result<()> {
        let removed = self.store.remove(&confirm.title)?;
        self.collection.ensure_in_bounds(self.store.books());
        let text = match removed {
            0 => format!("No book titled '{}' to remove.", confirm.title),
            1 => format!("'{}' removed successfully!", confirm.title),
            n => format!("'{}' removed successfully! ({n} copies)", confirm.title),
        };
        self.set_status(text, StatusKind::Info);
        Ok(())
    }

    /// Flip the read flag. Goes through `update`, so with duplicate titles the
    /// first record of that title is the one that changes.
    fn toggle_read(&mut self, mut book: BookRecord) {
        let title = book.title.clone();
        book.read = !book.read;
        let now_read = book.read;
        match self.store.update(&title, book) {
            Ok(_) => {
                self.collection.focus_title(&title, self.store.books());
                let state = if now_read { "read" } else { "unread" };
                self.set_status(format!("'{title}' marked as {state}."), StatusKind::Info);
            }
            Err(err) => {
                let err = anyhow::Error::from(err);
                let (message, kind) = describe_store_error(&err);
                self.set_status(message, kind);
            }
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        self.draw_collection(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Adding(form) => self.draw_book_form(frame, area, "Add a New Book", form),
            Mode::Updating { form, .. } => {
                self.draw_book_form(frame, area, "Update a Book", form)
            }
            Mode::ConfirmRemove(confirm) => self.draw_confirm_remove(frame, area, confirm),
            Mode::Searching(state) => self.draw_search_bar(frame, chunks[1], state),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let summary = format!(
            "{} books  •  {} read  •  {}",
            self.store.len(),
            self.store.read_books().len(),
            self.store.path().display()
        );
        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                "Personal Library Manager",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(summary, Style::default().fg(Color::Gray))),
        ])
        .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(header, area);
    }

    fn draw_collection(&self, frame: &mut Frame, area: Rect) {
        let books = self.store.books();
        if books.is_empty() {
            let message = Paragraph::new("No books in your collection yet. Press 'a' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Your Book Collection"));
            frame.render_widget(message, area);
            return;
        }

        let view = self.collection.view(books);
        if view.is_empty() {
            let message = Paragraph::new("No books match the search.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Your Book Collection"));
            frame.render_widget(message, area);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let read_selected = (self.collection.selected < view.read.len())
            .then_some(self.collection.selected);
        let unread_selected = self
            .collection
            .selected
            .checked_sub(view.read.len())
            .filter(|pos| *pos < view.unread.len());

        self.render_section(
            frame,
            chunks[0],
            &section_title("Read Books", view.read.len()),
            &view.read,
            read_selected,
            "No read books yet.",
        );
        self.render_section(
            frame,
            chunks[1],
            &section_title("Unread Books", view.unread.len()),
            &view.unread,
            unread_selected,
            "No unread books yet.",
        );
    }

    fn render_section(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        indices: &[usize],
        selected: Option<usize>,
        empty_message: &str,
    ) {
        let block = Block::default().borders(Borders::ALL).title(title.to_string());
        if indices.is_empty() {
            let message = Paragraph::new(Span::styled(
                empty_message.to_string(),
                Style::default().fg(Color::Blue),
            ))
            .block(block);
            frame.render_widget(message, area);
            return;
        }

        let books = self.store.books();
        let items: Vec<ListItem> = indices
            .iter()
            .filter_map(|idx| books.get(*idx))
            .map(|book| ListItem::new(Line::from(book.display_line())))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default().with_selected(selected);
        frame.render_stateful_widget(list, area, &mut state);
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

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let pairs: &[(&str, &str)] = match &self.mode {
            Mode::Adding(_) | Mode::Updating { .. } => &[
                ("[Tab]", " Next Field   "),
                ("[Space]", " Toggle Read   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::ConfirmRemove(_) => &[("[y]", " Remove   "), ("[n]", " Keep")],
            Mode::Searching(_) => &[("[Enter]", " Apply   "), ("[Esc]", " Clear")],
            Mode::Normal => &[
                ("[↑↓]", " Navigate   "),
                ("[a]", " Add   "),
                ("[e]", " Update   "),
                ("[d]", " Remove   "),
                ("[Space]", " Read/Unread   "),
                ("[/]", " Search   "),
                ("[q]", " Quit"),
            ],
        };

        Line::from(
            pairs
                .iter()
                .flat_map(|(key, label)| {
                    [
                        Span::styled(key.to_string(), key_style),
                        Span::raw(label.to_string()),
                    ]
                })
                .collect::<Vec<_>>(),
        )
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
        let typed = "Search: ".len() + state.query.chars().count();
        frame.set_cursor_position((cursor_column(inner, typed), inner.y));
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = [
            FormField::Title,
            FormField::Author,
            FormField::Year,
            FormField::Genre,
            FormField::Read,
        ]
        .into_iter()
        .map(|field| form.build_line(field))
        .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Yellow),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let prefix = form.active.label().len() + 2;
        let offset = match form.active {
            FormField::Read => 1,
            field => form.value_len(field),
        };
        frame.set_cursor_position((
            cursor_column(inner, prefix + offset),
            inner.y.saturating_add(form.active.row()),
        ));
    }

    fn draw_confirm_remove(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmBookRemove) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Remove a Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![Line::from(format!("Remove '{}'?", confirm.title))];
        if confirm.matches > 1 {
            lines.push(Line::from(format!(
                "{} books share this title; all of them will be removed.",
                confirm.matches
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
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
}

/// Column for a cursor `typed` characters into `inner`, pinned to its last
/// column once the text runs past the edge.
fn cursor_column(inner: Rect, typed: usize) -> u16 {
    let max_offset = inner.width.saturating_sub(1);
    let offset = u16::try_from(typed).unwrap_or(u16::MAX).min(max_offset);
    inner.x.saturating_add(offset)
}

/// Validation failures are warnings; anything else is an error worth logging.
fn describe_store_error(err: &anyhow::Error) -> (String, StatusKind) {
    match err.downcast_ref::<StoreError>() {
        Some(StoreError::MissingField(_)) => (err.to_string(), StatusKind::Warning),
        _ => {
            error!(error = %surface_error(err), "library operation failed");
            (surface_error(err), StatusKind::Error)
        }
    }
}
