//! Domain models persisted to the library file and passed throughout the TUI.
//! The types stay light-weight data holders so the store can focus on
//! persistence and the UI on presentation.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// A single catalog entry. Field order matches the on-disk key order.
///
/// Records carry no identifier. The title doubles as the lookup key, so two
/// books sharing a title cannot be told apart by update or remove.
pub struct BookRecord {
    pub title: String,
    pub author: String,
    /// Free text. Nothing requires it to be numeric ("c. 1600" is fine).
    /// Hand-edited files sometimes hold a bare number, which is read as text.
    #[serde(deserialize_with = "year_text")]
    pub year: String,
    pub genre: String,
    /// Older files may omit the flag entirely.
    #[serde(default)]
    pub read: bool,
}

impl BookRecord {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        year: impl Into<String>,
        genre: impl Into<String>,
        read: bool,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            year: year.into(),
            genre: genre.into(),
            read,
        }
    }

    /// Text value of one of the required fields.
    pub fn field(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Year => &self.year,
            BookField::Genre => &self.genre,
        }
    }

    /// First required field that is empty once surrounding whitespace is
    /// ignored, in form order.
    pub fn first_missing_field(&self) -> Option<BookField> {
        BookField::REQUIRED
            .into_iter()
            .find(|field| self.field(*field).trim().is_empty())
    }

    /// `Title | Author | Year | Genre`, the line shown in collection lists.
    pub fn display_line(&self) -> String {
        format!(
            "{} | {} | {} | {}",
            self.title, self.author, self.year, self.genre
        )
    }
}

impl fmt::Display for BookRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearValue {
    Text(String),
    Number(serde_json::Number),
}

fn year_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match YearValue::deserialize(deserializer)? {
        YearValue::Text(text) => text,
        YearValue::Number(number) => number.to_string(),
    })
}

/// The text fields a new record must fill in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Year,
    Genre,
}

impl BookField {
    pub const REQUIRED: [BookField; 4] = [
        BookField::Title,
        BookField::Author,
        BookField::Year,
        BookField::Genre,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Year => "Year",
            BookField::Genre => "Genre",
        }
    }
}

impl fmt::Display for BookField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_ignores_surrounding_whitespace() {
        let book = BookRecord::new("Dune", "Frank Herbert", "  \t", "Sci-Fi", false);
        assert_eq!(book.first_missing_field(), Some(BookField::Year));

        let book = BookRecord::new("Dune", "Frank Herbert", "1965", "Sci-Fi", false);
        assert_eq!(book.first_missing_field(), None);
    }

    #[test]
    fn missing_field_reports_form_order() {
        let book = BookRecord::new(" ", "", "1965", "", false);
        assert_eq!(book.first_missing_field(), Some(BookField::Title));
    }

    #[test]
    fn read_flag_defaults_when_absent() {
        let json = r#"{"title":"A","author":"X","year":"2000","genre":"Fiction"}"#;
        let book: BookRecord = serde_json::from_str(json).unwrap();
        assert!(!book.read);
    }

    #[test]
    fn numeric_year_reads_as_text() {
        let json = r#"[{"title":"B","author":"Y","year":2010,"genre":"Sci-Fi","read":true},
                       {"title":"C","author":"Z","year":"c. 1600","genre":"Poetry"}]"#;
        let books: Vec<BookRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(books[0].year, "2010");
        assert_eq!(books[1].year, "c. 1600");

        let bad = r#"{"title":"B","author":"Y","year":[2010],"genre":"Sci-Fi"}"#;
        assert!(serde_json::from_str::<BookRecord>(bad).is_err());
    }

    #[test]
    fn display_line_joins_fields() {
        let book = BookRecord::new("Emma", "Jane Austen", "1815", "Novel", true);
        assert_eq!(book.display_line(), "Emma | Jane Austen | 1815 | Novel");
        assert_eq!(book.to_string(), "Emma");
    }
}
