use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::BookRecord;

/// Fields available within the book form, in focus order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum FormField {
    #[default]
    Title,
    Author,
    Year,
    Genre,
    Read,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Title,
        FormField::Author,
        FormField::Year,
        FormField::Genre,
        FormField::Read,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Author => "Author",
            FormField::Year => "Year",
            FormField::Genre => "Genre",
            FormField::Read => "Read",
        }
    }

    /// Row of the field inside the form popup.
    pub(crate) fn row(self) -> u16 {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as u16
    }

    fn step(self, offset: isize) -> Self {
        let len = Self::ORDER.len() as isize;
        let idx = (self.row() as isize + offset).rem_euclid(len);
        Self::ORDER[idx as usize]
    }
}

/// Form state shared by the add and update popups.
#[derive(Default, Clone, Debug)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) year: String,
    pub(crate) genre: String,
    pub(crate) read: bool,
    pub(crate) active: FormField,
    pub(crate) error: Option<String>,
}

impl BookForm {
    /// Prefill the form from an existing record when updating.
    pub(crate) fn from_record(book: &BookRecord) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year.clone(),
            genre: book.genre.clone(),
            read: book.read,
            active: FormField::Title,
            error: None,
        }
    }

    /// Values exactly as typed. Validation is the store's job.
    pub(crate) fn to_record(&self) -> BookRecord {
        BookRecord::new(
            self.title.clone(),
            self.author.clone(),
            self.year.clone(),
            self.genre.clone(),
            self.read,
        )
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.step(1);
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.step(-1);
    }

    pub(crate) fn toggle_read(&mut self) {
        self.read = !self.read;
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Title => Some(&mut self.title),
            FormField::Author => Some(&mut self.author),
            FormField::Year => Some(&mut self.year),
            FormField::Genre => Some(&mut self.genre),
            FormField::Read => None,
        }
    }

    fn text(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Title => Some(&self.title),
            FormField::Author => Some(&self.author),
            FormField::Year => Some(&self.year),
            FormField::Genre => Some(&self.genre),
            FormField::Read => None,
        }
    }

    /// Feed a typed character to the active field. On the read checkbox a
    /// space toggles and `y`/`n` set the flag. Returns whether anything
    /// changed.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if self.active == FormField::Read {
            match ch {
                ' ' => self.toggle_read(),
                'y' | 'Y' => self.read = true,
                'n' | 'N' => self.read = false,
                _ => return false,
            }
            return true;
        }

        if ch.is_control() {
            return false;
        }
        match self.text_mut(self.active) {
            Some(value) => {
                value.push(ch);
                true
            }
            None => false,
        }
    }

    /// Remove the last character from the active text field.
    pub(crate) fn backspace(&mut self) {
        if let Some(value) = self.text_mut(self.active) {
            value.pop();
        }
    }

    /// Character count for the requested field; the checkbox has none.
    pub(crate) fn value_len(&self, field: FormField) -> usize {
        self.text(field).map(|v| v.chars().count()).unwrap_or(0)
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: FormField) -> Line<'static> {
        let is_active = self.active == field;

        let (display, empty) = match self.text(field) {
            Some("") => ("<required>".to_string(), true),
            Some(value) => (value.to_string(), false),
            None => (
                if self.read { "[x]" } else { "[ ]" }.to_string(),
                false,
            ),
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if empty {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ])
    }
}

/// Pending removal; `matches` counts every record sharing the title because
/// all of them go.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmBookRemove {
    pub(crate) title: String,
    pub(crate) matches: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_wraps_in_both_directions() {
        let mut form = BookForm::default();
        form.previous_field();
        assert_eq!(form.active, FormField::Read);
        form.next_field();
        assert_eq!(form.active, FormField::Title);
        form.next_field();
        assert_eq!(form.active, FormField::Author);
    }

    #[test]
    fn typing_targets_active_field() {
        let mut form = BookForm::default();
        for ch in "Emma".chars() {
            form.push_char(ch);
        }
        form.next_field();
        for ch in "Austen".chars() {
            form.push_char(ch);
        }
        form.backspace();

        assert_eq!(form.title, "Emma");
        assert_eq!(form.author, "Auste");
        assert_eq!(form.value_len(FormField::Author), 5);
        assert!(!form.push_char('\u{7}'));
    }

    #[test]
    fn read_field_takes_toggle_keys_only() {
        let mut form = BookForm {
            active: FormField::Read,
            ..BookForm::default()
        };
        assert!(form.push_char(' '));
        assert!(form.read);
        assert!(form.push_char('n'));
        assert!(!form.read);
        assert!(!form.push_char('x'));
        form.backspace();
        assert_eq!(form.value_len(FormField::Read), 0);
    }

    #[test]
    fn record_round_trips_through_form() {
        let book = BookRecord::new("Emma", "Jane Austen", "1815", "Novel", true);
        assert_eq!(BookForm::from_record(&book).to_record(), book);
    }
}
