use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::models::BookRecord;

/// Indentation used for the on-disk JSON so the file stays easy to hand-edit.
const INDENT: &[u8] = b"    ";

/// Read every record from `path`. A missing, empty, or unparsable file is
/// treated as an empty library; the problem is logged and never surfaced.
pub fn load_books(path: &Path) -> Vec<BookRecord> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "library file not found, starting empty");
            return Vec::new();
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not read library file, starting empty");
            return Vec::new();
        }
    };

    if contents.trim().is_empty() {
        debug!(path = %path.display(), "library file is empty");
        return Vec::new();
    }

    match serde_json::from_str::<Vec<BookRecord>>(&contents) {
        Ok(books) => {
            debug!(path = %path.display(), count = books.len(), "loaded library");
            books
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "library file is not a valid book list, starting empty");
            Vec::new()
        }
    }
}

/// Overwrite `path` with the full serialized library, creating the parent
/// directory on first save.
pub fn save_books(path: &Path, books: &[BookRecord]) -> Result<(), StoreError> {
    let bytes = to_pretty_json(books)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StoreError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, bytes).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), count = books.len(), "saved library");
    Ok(())
}

/// Serialize with four-space indentation, every character outside printable
/// ASCII written as a lowercase `\uXXXX` escape, and no trailing newline.
pub fn to_pretty_json(books: &[BookRecord]) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, AsciiFormatter::new());
    books
        .serialize(&mut serializer)
        .map_err(StoreError::Serialize)?;
    Ok(buf)
}

/// Pretty layout with ASCII-only string contents. Characters beyond the
/// basic plane become UTF-16 surrogate pairs.
struct AsciiFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl AsciiFormatter<'_> {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(INDENT),
        }
    }
}

impl Formatter for AsciiFormatter<'_> {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(fragment[start..idx].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BookRecord {
        BookRecord::new("A", "X", "2000", "Fiction", false)
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_books(&dir.path().join("nope.json")).is_empty());
    }

    #[test]
    fn empty_and_whitespace_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        fs::write(&path, "").unwrap();
        assert!(load_books(&path).is_empty());
        fs::write(&path, "\n  \n").unwrap();
        assert!(load_books(&path).is_empty());
    }

    #[test]
    fn malformed_content_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        for junk in ["{not json", "{\"title\": \"A\"}", "[1, 2, 3]", "[{\"title\": 5}]"] {
            fs::write(&path, junk).unwrap();
            assert!(load_books(&path).is_empty(), "expected empty for {junk:?}");
        }
    }

    #[test]
    fn directory_in_place_of_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_books(dir.path()).is_empty());
    }

    #[test]
    fn pretty_json_uses_four_space_indent() {
        let text = String::from_utf8(to_pretty_json(&[sample()]).unwrap()).unwrap();
        let expected = "[\n    {\n        \"title\": \"A\",\n        \"author\": \"X\",\n        \"year\": \"2000\",\n        \"genre\": \"Fiction\",\n        \"read\": false\n    }\n]";
        assert_eq!(text, expected);
    }

    #[test]
    fn non_ascii_text_is_escaped() {
        let book = BookRecord::new(
            "Émile \u{1F4DA}",
            "Rousseau\u{7f}",
            "1762",
            "Tab\there",
            false,
        );
        let text = String::from_utf8(to_pretty_json(&[book.clone()]).unwrap()).unwrap();

        assert!(text.is_ascii());
        assert!(text.contains(r#""title": "\u00c9mile \ud83d\udcda""#));
        assert!(text.contains(r#""author": "Rousseau\u007f""#));
        assert!(text.contains(r#""genre": "Tab\there""#));
        assert_eq!(serde_json::from_str::<Vec<BookRecord>>(&text).unwrap(), vec![book]);
    }

    #[test]
    fn empty_library_serializes_as_empty_array() {
        assert_eq!(to_pretty_json(&[]).unwrap(), b"[]");
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("books.json");
        save_books(&path, &[sample()]).unwrap();
        assert_eq!(load_books(&path), vec![sample()]);
    }

    #[test]
    fn save_into_unwritable_location_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();
        let err = save_books(&blocker.join("books.json"), &[sample()]).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }
}
