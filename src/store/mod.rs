//! The record store: an ordered list of books mirrored to a flat JSON file.
//! Every mutation rewrites the whole file; there is no incremental diff and
//! no locking, so two processes sharing a file race with last write wins.

mod file;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::StoreError;
use crate::models::BookRecord;

pub use file::{load_books, save_books, to_pretty_json};

/// In-memory library bound to its backing file. The UI owns one of these and
/// hands it out by reference for each interaction.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    books: Vec<BookRecord>,
}

impl RecordStore {
    /// Bind to `path` and load whatever it currently holds. Never fails; an
    /// unreadable file simply yields an empty library.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let books = load_books(&path);
        info!(path = %path.display(), count = books.len(), "opened library");
        Self { path, books }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn books(&self) -> &[BookRecord] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// First record carrying exactly this title.
    pub fn find(&self, title: &str) -> Option<&BookRecord> {
        self.books.iter().find(|book| book.title == title)
    }

    pub fn read_books(&self) -> Vec<&BookRecord> {
        self.books.iter().filter(|book| book.read).collect()
    }

    pub fn unread_books(&self) -> Vec<&BookRecord> {
        self.books.iter().filter(|book| !book.read).collect()
    }

    /// Titles in library order, duplicates included.
    pub fn titles(&self) -> Vec<&str> {
        self.books.iter().map(|book| book.title.as_str()).collect()
    }

    /// Write the current library to the backing file.
    pub fn save(&self) -> Result<(), StoreError> {
        save_books(&self.path, &self.books)
    }

    /// Append a new record and persist. Title, author, year and genre must
    /// contain something other than whitespace; otherwise nothing changes and
    /// nothing is written. A failed write leaves the library as it was.
    pub fn add(&mut self, record: BookRecord) -> Result<(), StoreError> {
        if let Some(field) = record.first_missing_field() {
            return Err(StoreError::MissingField(field));
        }

        info!(title = %record.title, "adding book");
        self.books.push(record);
        if let Err(err) = self.save() {
            self.books.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Replace the first record titled `title` with `record` wholesale and
    /// persist. Returns `false` without touching the file when no title
    /// matches.
    pub fn update(&mut self, title: &str, record: BookRecord) -> Result<bool, StoreError> {
        let Some(slot) = self.books.iter_mut().find(|book| book.title == title) else {
            return Ok(false);
        };

        info!(title, new_title = %record.title, "updating book");
        *slot = record;
        self.save()?;
        Ok(true)
    }

    /// Drop every record titled `title`, not just the first, then persist.
    /// Returns how many records went away.
    pub fn remove(&mut self, title: &str) -> Result<usize, StoreError> {
        let before = self.books.len();
        self.books.retain(|book| book.title != title);
        let removed = before - self.books.len();

        info!(title, removed, "removing book");
        self.save()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::models::BookField;

    fn book(title: &str, read: bool) -> BookRecord {
        BookRecord::new(title, "Author", "1999", "Genre", read)
    }

    fn store_with(books: &[BookRecord]) -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books_data.json");
        save_books(&path, books).unwrap();
        let store = RecordStore::open(&path);
        (dir, store)
    }

    #[test]
    fn add_appends_and_persists() {
        let (_dir, mut store) = store_with(&[book("A", false)]);
        store.add(book("B", true)).unwrap();

        assert_eq!(store.titles(), vec!["A", "B"]);
        assert_eq!(load_books(store.path()), store.books());
        assert!(store.books()[1].read);
    }

    #[test]
    fn add_keeps_values_untrimmed() {
        let (_dir, mut store) = store_with(&[]);
        store
            .add(BookRecord::new(" Dune ", "Herbert", "1965", "Sci-Fi", false))
            .unwrap();
        assert_eq!(store.books()[0].title, " Dune ");
    }

    #[test]
    fn add_rejects_blank_field_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books_data.json");
        let mut store = RecordStore::open(&path);

        let err = store
            .add(BookRecord::new("Dune", "Herbert", "1965", "   ", false))
            .unwrap_err();

        assert!(matches!(err, StoreError::MissingField(BookField::Genre)));
        assert!(store.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn failed_add_does_not_keep_record() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let mut store = RecordStore::open(blocker.join("books_data.json"));

        for _ in 0..2 {
            let err = store.add(book("A", false)).unwrap_err();
            assert!(matches!(err, StoreError::Write { .. }));
        }
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn update_replaces_first_match_only() {
        let (_dir, mut store) = store_with(&[book("A", false), book("A", false)]);
        let replacement = BookRecord::new("A2", "New", "2024", "Essay", true);

        assert!(store.update("A", replacement.clone()).unwrap());
        assert_eq!(store.books(), &[replacement, book("A", false)]);
        assert_eq!(load_books(store.path()), store.books());
    }

    #[test]
    fn update_allows_blank_fields() {
        let (_dir, mut store) = store_with(&[book("A", false)]);
        let blank = BookRecord::new("A", "", "", "", false);
        assert!(store.update("A", blank.clone()).unwrap());
        assert_eq!(store.books(), &[blank]);
    }

    #[test]
    fn update_unknown_title_is_noop() {
        let (_dir, mut store) = store_with(&[book("A", false)]);
        let before = fs::read(store.path()).unwrap();

        assert!(!store.update("a", book("Z", true)).unwrap());
        assert_eq!(store.books(), &[book("A", false)]);
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn remove_drops_every_match() {
        let (_dir, mut store) = store_with(&[book("A", false), book("B", true), book("A", true)]);

        assert_eq!(store.remove("A").unwrap(), 2);
        assert_eq!(store.titles(), vec!["B"]);
        assert_eq!(load_books(store.path()), store.books());
    }

    #[test]
    fn remove_unknown_title_is_noop() {
        let (_dir, mut store) = store_with(&[book("A", false)]);
        let before = fs::read(store.path()).unwrap();

        assert_eq!(store.remove("missing").unwrap(), 0);
        assert_eq!(store.titles(), vec!["A"]);
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn read_and_unread_views_keep_order() {
        let (_dir, store) = store_with(&[
            book("A", true),
            book("B", false),
            book("C", true),
            book("D", false),
        ]);

        let read: Vec<_> = store.read_books().iter().map(|b| b.title.as_str()).collect();
        let unread: Vec<_> = store.unread_books().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(read, vec!["A", "C"]);
        assert_eq!(unread, vec!["B", "D"]);
        assert_eq!(store.find("C"), Some(&book("C", true)));
        assert_eq!(store.find("c"), None);
    }
}
