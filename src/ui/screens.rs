use crate::models::BookRecord;

/// Indices into the library split the way the collection screen shows them.
/// Both halves keep library order.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct CollectionView {
    pub(crate) read: Vec<usize>,
    pub(crate) unread: Vec<usize>,
}

impl CollectionView {
    pub(crate) fn len(&self) -> usize {
        self.read.len() + self.unread.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Library index at a flat position (read section first).
    pub(crate) fn index_at(&self, position: usize) -> Option<usize> {
        if position < self.read.len() {
            self.read.get(position).copied()
        } else {
            self.unread.get(position - self.read.len()).copied()
        }
    }

    /// Flat position of a library index, if it is visible.
    pub(crate) fn position_of(&self, index: usize) -> Option<usize> {
        self.read
            .iter()
            .chain(self.unread.iter())
            .position(|i| *i == index)
    }
}

/// Selection and filter state for the collection screen. The records
/// themselves live in the store; this only remembers where the cursor is.
#[derive(Debug, Default)]
pub(crate) struct CollectionScreen {
    pub(crate) filter: Option<String>,
    pub(crate) selected: usize,
}

impl CollectionScreen {
    pub(crate) fn view(&self, books: &[BookRecord]) -> CollectionView {
        let query = self
            .filter
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let mut view = CollectionView::default();
        for (idx, book) in books.iter().enumerate() {
            if let Some(q) = &query {
                if !book.title.to_lowercase().contains(q) && !book.author.to_lowercase().contains(q)
                {
                    continue;
                }
            }
            if book.read {
                view.read.push(idx);
            } else {
                view.unread.push(idx);
            }
        }
        view
    }

    pub(crate) fn current<'a>(&self, books: &'a [BookRecord]) -> Option<&'a BookRecord> {
        self.view(books)
            .index_at(self.selected)
            .and_then(|idx| books.get(idx))
    }

    pub(crate) fn set_filter(&mut self, filter: Option<String>, books: &[BookRecord]) {
        self.filter = filter;
        self.ensure_in_bounds(books);
    }

    pub(crate) fn move_selection(&mut self, offset: isize, books: &[BookRecord]) {
        let len = self.view(books).len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let new = (self.selected as isize + offset).clamp(0, len as isize - 1);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self, books: &[BookRecord]) {
        self.selected = self.view(books).len().saturating_sub(1);
    }

    /// Put the cursor on the first visible record titled `title`, or keep it
    /// in range when there is none.
    pub(crate) fn focus_title(&mut self, title: &str, books: &[BookRecord]) {
        let view = self.view(books);
        let found = books
            .iter()
            .enumerate()
            .filter(|(_, book)| book.title == title)
            .find_map(|(idx, _)| view.position_of(idx));
        match found {
            Some(position) => self.selected = position,
            None => self.ensure_in_bounds(books),
        }
    }

    pub(crate) fn ensure_in_bounds(&mut self, books: &[BookRecord]) {
        let len = self.view(books).len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books() -> Vec<BookRecord> {
        vec![
            BookRecord::new("Dune", "Frank Herbert", "1965", "Sci-Fi", false),
            BookRecord::new("Emma", "Jane Austen", "1815", "Novel", true),
            BookRecord::new("Persuasion", "Jane Austen", "1817", "Novel", false),
            BookRecord::new("Hyperion", "Dan Simmons", "1989", "Sci-Fi", true),
        ]
    }

    #[test]
    fn read_section_comes_first() {
        let books = books();
        let screen = CollectionScreen::default();
        let view = screen.view(&books);
        assert_eq!(view.read, vec![1, 3]);
        assert_eq!(view.unread, vec![0, 2]);
        assert_eq!(view.index_at(2), Some(0));
        assert_eq!(view.index_at(4), None);
        assert_eq!(screen.current(&books).map(|b| b.title.as_str()), Some("Emma"));
    }

    #[test]
    fn filter_matches_title_or_author() {
        let books = books();
        let mut screen = CollectionScreen::default();
        screen.set_filter(Some("AUSTEN".to_string()), &books);
        let view = screen.view(&books);
        assert_eq!(view.read, vec![1]);
        assert_eq!(view.unread, vec![2]);

        screen.set_filter(Some("dune".to_string()), &books);
        assert_eq!(screen.view(&books).len(), 1);
    }

    #[test]
    fn selection_is_clamped() {
        let books = books();
        let mut screen = CollectionScreen::default();
        screen.move_selection(10, &books);
        assert_eq!(screen.selected, 3);
        screen.move_selection(-10, &books);
        assert_eq!(screen.selected, 0);

        screen.select_last(&books);
        screen.set_filter(Some("emma".to_string()), &books);
        assert_eq!(screen.selected, 0);
    }

    #[test]
    fn focus_title_finds_visible_position() {
        let books = books();
        let mut screen = CollectionScreen::default();
        screen.focus_title("Persuasion", &books);
        assert_eq!(screen.selected, 3);
        assert_eq!(screen.current(&books).map(|b| b.title.as_str()), Some("Persuasion"));
    }
}
