//! Page navigation state machine.

use crate::reader::{ReadingState, paginate};

/// Token tying an in-flight content load to the session generation that
/// issued it. A stale ticket means a newer book was opened in the
/// meantime and the response must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// One open book in the reader: its paginated content, the current
/// position, and the lines-per-page setting.
///
/// Navigation saturates at the edges, jumps clamp into range, and
/// changing lines-per-page re-paginates from the raw content while
/// keeping the viewer on a valid page. Content loads are guarded by a
/// monotonically increasing generation counter so a superseded fetch
/// can never clobber the book that replaced it.
pub struct ReaderSession {
    book_id: Option<String>,
    content: String,
    pages: Vec<String>,
    current_page: usize,
    lines_per_page: usize,
    default_lines_per_page: usize,
    generation: u64,
}

impl ReaderSession {
    /// Create an empty session. A zero default falls back to 80 lines.
    pub fn new(default_lines_per_page: usize) -> Self {
        let default_lines_per_page = if default_lines_per_page == 0 {
            80
        } else {
            default_lines_per_page
        };

        Self {
            book_id: None,
            content: String::new(),
            pages: vec![String::new()],
            current_page: 0,
            lines_per_page: default_lines_per_page,
            default_lines_per_page,
            generation: 0,
        }
    }

    /// Start loading a book. Any ticket issued earlier becomes stale.
    pub fn begin_load(&mut self, book_id: &str) -> LoadTicket {
        self.generation += 1;
        self.book_id = Some(book_id.to_string());
        LoadTicket(self.generation)
    }

    /// Finish a load started with [`begin_load`](Self::begin_load).
    ///
    /// Returns `false` and leaves the session untouched when the ticket
    /// is stale. Position and lines-per-page are restored from `saved`
    /// when present (clamped into the new page range), else reset to
    /// page 0 with the default lines-per-page.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        text: &str,
        saved: Option<&ReadingState>,
    ) -> bool {
        if ticket.0 != self.generation {
            return false;
        }

        let lines_per_page = saved
            .map(|s| s.lines_per_page)
            .filter(|&l| l > 0)
            .unwrap_or(self.default_lines_per_page);

        self.content = text.to_string();
        self.lines_per_page = lines_per_page;
        // lines_per_page is validated above, so paginate cannot fail.
        self.pages = paginate(&self.content, lines_per_page).unwrap_or_else(|_| vec![String::new()]);
        self.current_page = saved
            .map(|s| s.current_page)
            .unwrap_or(0)
            .min(self.last_page());

        true
    }

    /// Advance one page. No-op on the last page.
    pub fn next(&mut self) {
        if self.current_page < self.last_page() {
            self.current_page += 1;
        }
    }

    /// Go back one page. No-op on page 0.
    pub fn prev(&mut self) {
        if self.current_page > 0 {
            self.current_page -= 1;
        }
    }

    /// Jump to a page, clamped into the valid range.
    pub fn jump(&mut self, page: usize) {
        self.current_page = page.min(self.last_page());
    }

    /// Change lines-per-page and re-paginate. Zero falls back to the
    /// default. The current page is clamped so the viewer stays on a
    /// valid (possibly different) page.
    pub fn set_lines_per_page(&mut self, lines_per_page: usize) {
        let lines_per_page = if lines_per_page == 0 {
            self.default_lines_per_page
        } else {
            lines_per_page
        };

        self.lines_per_page = lines_per_page;
        self.pages = paginate(&self.content, lines_per_page).unwrap_or_else(|_| vec![String::new()]);
        self.current_page = self.current_page.min(self.last_page());
    }

    /// Text of the current page.
    pub fn page(&self) -> &str {
        &self.pages[self.current_page]
    }

    /// Zero-based index of the current page.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Total number of pages (always at least 1).
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Lines-per-page currently in effect.
    pub fn lines_per_page(&self) -> usize {
        self.lines_per_page
    }

    /// Id of the loaded book, if any.
    pub fn book_id(&self) -> Option<&str> {
        self.book_id.as_deref()
    }

    /// Snapshot of the current position for the reading-state cache.
    /// `None` until a book has been loaded.
    pub fn state(&self, display_name: &str) -> Option<ReadingState> {
        Some(ReadingState {
            book_id: self.book_id.clone()?,
            current_page: self.current_page,
            lines_per_page: self.lines_per_page,
            display_name: display_name.to_string(),
            last_accessed: 0,
        })
    }

    fn last_page(&self) -> usize {
        self.pages.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(text: &str, lines_per_page: usize) -> ReaderSession {
        let mut session = ReaderSession::new(lines_per_page);
        let ticket = session.begin_load("book-1");
        assert!(session.complete_load(ticket, text, None));
        session
    }

    #[test]
    fn prev_at_first_page_is_noop() {
        let mut session = loaded("a\nb\nc", 1);
        session.prev();
        assert_eq!(session.current_page(), 0);
    }

    #[test]
    fn next_at_last_page_is_noop() {
        let mut session = loaded("a\nb\nc", 1);
        session.jump(2);
        session.next();
        assert_eq!(session.current_page(), 2);
    }

    #[test]
    fn jump_clamps_into_range() {
        let mut session = loaded("a\nb\nc", 1);
        session.jump(999);
        assert_eq!(session.current_page(), 2);
    }

    #[test]
    fn shrinking_page_count_keeps_position_valid() {
        let mut session = loaded("a\nb\nc\nd\ne\nf", 1);
        session.jump(5);

        session.set_lines_per_page(4);
        assert_eq!(session.page_count(), 2);
        assert_eq!(session.current_page(), 1);
        assert_eq!(session.page(), "e\nf");
    }

    #[test]
    fn zero_lines_per_page_falls_back_to_default() {
        let mut session = loaded("a\nb\nc", 2);
        session.set_lines_per_page(0);
        assert_eq!(session.lines_per_page(), 2);
    }

    #[test]
    fn stale_load_is_discarded() {
        let mut session = ReaderSession::new(1);

        let first = session.begin_load("book-1");
        let second = session.begin_load("book-2");

        assert!(!session.complete_load(first, "old\ncontent", None));
        assert!(session.complete_load(second, "new", None));
        assert_eq!(session.book_id(), Some("book-2"));
        assert_eq!(session.page(), "new");
    }

    #[test]
    fn restores_saved_position() {
        let saved = ReadingState {
            book_id: "book-1".to_string(),
            current_page: 2,
            lines_per_page: 1,
            display_name: "Book".to_string(),
            last_accessed: 0,
        };

        let mut session = ReaderSession::new(80);
        let ticket = session.begin_load("book-1");
        assert!(session.complete_load(ticket, "a\nb\nc\nd", Some(&saved)));

        assert_eq!(session.current_page(), 2);
        assert_eq!(session.lines_per_page(), 1);
        assert_eq!(session.page(), "c");
    }

    #[test]
    fn saved_position_beyond_content_is_clamped() {
        let saved = ReadingState {
            book_id: "book-1".to_string(),
            current_page: 40,
            lines_per_page: 1,
            display_name: "Book".to_string(),
            last_accessed: 0,
        };

        let mut session = ReaderSession::new(80);
        let ticket = session.begin_load("book-1");
        session.complete_load(ticket, "a\nb", Some(&saved));

        assert_eq!(session.current_page(), 1);
    }

    #[test]
    fn state_snapshot_carries_position() {
        let mut session = loaded("a\nb\nc", 1);
        session.next();

        let state = session.state("My Book").unwrap();
        assert_eq!(state.book_id, "book-1");
        assert_eq!(state.current_page, 1);
        assert_eq!(state.display_name, "My Book");
    }
}
