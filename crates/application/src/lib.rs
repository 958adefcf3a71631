//! Application orchestration layer for Folio.

use std::sync::Arc;

use folio_core::{
    Book, BookId, BookRepository, Config, DisplayPrefs, FontSize, Progress, ReaderId, Theme,
};
use folio_engine::{PagedText, Paginator};
use folio_storage::{ProgressStore, ProgressWriteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Ready,
    /// Tried to step past the last page.
    Finished,
}

/// Result of a navigation call. `warning` carries a failed progress write;
/// the page has still moved in memory and the next navigation writes again.
#[derive(Debug)]
#[must_use]
pub struct Step {
    pub moved: bool,
    pub warning: Option<ProgressWriteError>,
}

impl Step {
    fn stayed() -> Self {
        Self {
            moved: false,
            warning: None,
        }
    }

    fn moved(warning: Option<ProgressWriteError>) -> Self {
        Self {
            moved: true,
            warning,
        }
    }
}

#[derive(Debug)]
struct OpenBook {
    book: Book,
    reader: ReaderId,
    pages: PagedText,
    page_index: usize,
    finished: bool,
    unsaved: bool,
}

/// One reader's view of one open book.
#[derive(Debug)]
pub struct ReadingSession {
    store: Arc<ProgressStore>,
    paginator: Paginator,
    prefs: DisplayPrefs,
    open: Option<OpenBook>,
}

impl ReadingSession {
    pub fn new(store: Arc<ProgressStore>, paginator: Paginator) -> Self {
        Self {
            store,
            paginator,
            prefs: DisplayPrefs::default(),
            open: None,
        }
    }

    pub fn from_config(config: &Config, store: Arc<ProgressStore>) -> Self {
        Self::new(store, Paginator::new(config.chunk_size))
    }

    pub fn with_prefs(mut self, prefs: DisplayPrefs) -> Self {
        self.prefs = prefs;
        self
    }

    /// Loads `book_id`, paginates it and restores the reader's saved page,
    /// clamped to the current page count. On error the session is left as it
    /// was.
    ///
    /// A book that was already open is closed first and its close warning is
    /// returned. Reopening the same book for the same reader while its
    /// position is still unsaved keeps the in-memory position, which the next
    /// navigation writes.
    pub fn open(
        &mut self,
        repo: &dyn BookRepository,
        book_id: &BookId,
        reader: ReaderId,
    ) -> folio_core::Result<Option<ProgressWriteError>> {
        let content = repo.load(book_id)?;
        let pages = self.paginator.paginate(&content.text);

        let carried = self
            .open
            .as_ref()
            .filter(|open| &open.book.id == book_id && open.reader == reader)
            .map(|open| open.page_index);
        let warning = self.close();
        let (saved, unsaved) = match (carried, &warning) {
            (Some(page_index), Some(_)) => (page_index, true),
            _ => (self.store.load(&reader, book_id), false),
        };

        let page_index = pages.clamp(saved);
        if page_index != saved {
            tracing::debug!(
                book = %book_id,
                saved,
                total_pages = pages.total_pages(),
                "clamped stale page index"
            );
        }

        tracing::info!(
            book = %book_id,
            %reader,
            page_index,
            total_pages = pages.total_pages(),
            unsaved,
            "opened book"
        );
        self.open = Some(OpenBook {
            book: content.book,
            reader,
            pages,
            page_index,
            finished: false,
            unsaved,
        });
        Ok(warning)
    }

    pub fn next(&mut self) -> Step {
        let Some(open) = self.open.as_mut() else {
            return Step::stayed();
        };
        if open.page_index + 1 < open.pages.total_pages() {
            open.page_index += 1;
            Step::moved(self.persist())
        } else {
            open.finished = true;
            Step::stayed()
        }
    }

    pub fn prev(&mut self) -> Step {
        let Some(open) = self.open.as_mut() else {
            return Step::stayed();
        };
        if open.page_index > 0 {
            open.page_index -= 1;
            open.finished = false;
            Step::moved(self.persist())
        } else {
            Step::stayed()
        }
    }

    /// Jumps to `page_index`, clamped into range.
    pub fn go_to(&mut self, page_index: usize) -> Step {
        let Some(open) = self.open.as_mut() else {
            return Step::stayed();
        };
        let target = open.pages.clamp(page_index);
        if target == open.page_index {
            return Step::stayed();
        }
        open.page_index = target;
        open.finished = false;
        Step::moved(self.persist())
    }

    /// Retries a progress write that failed earlier.
    pub fn flush(&mut self) -> Result<(), ProgressWriteError> {
        if !self.has_unsaved_progress() {
            return Ok(());
        }
        match self.persist() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Returns to `Idle`, retrying any unsaved position first.
    pub fn close(&mut self) -> Option<ProgressWriteError> {
        let warning = self.flush().err();
        if let Some(open) = self.open.take() {
            tracing::debug!(book = %open.book.id, page_index = open.page_index, "closed book");
        }
        warning
    }

    fn persist(&mut self) -> Option<ProgressWriteError> {
        let open = self.open.as_mut()?;
        match self.store.save(&open.reader, &open.book.id, open.page_index) {
            Ok(()) => {
                open.unsaved = false;
                None
            }
            Err(err) => {
                tracing::warn!(book = %open.book.id, error = %err, "could not save reading progress");
                open.unsaved = true;
                Some(err)
            }
        }
    }

    pub fn state(&self) -> SessionState {
        match &self.open {
            None => SessionState::Idle,
            Some(open) if open.finished => SessionState::Finished,
            Some(_) => SessionState::Ready,
        }
    }

    pub fn book(&self) -> Option<&Book> {
        self.open.as_ref().map(|open| &open.book)
    }

    pub fn reader(&self) -> Option<&ReaderId> {
        self.open.as_ref().map(|open| &open.reader)
    }

    pub fn current_page(&self) -> Option<&str> {
        self.open
            .as_ref()
            .map(|open| open.pages.page(open.page_index))
    }

    /// 0 while idle.
    pub fn page_index(&self) -> usize {
        self.open.as_ref().map_or(0, |open| open.page_index)
    }

    /// 0 while idle, otherwise at least 1.
    pub fn total_pages(&self) -> usize {
        self.open.as_ref().map_or(0, |open| open.pages.total_pages())
    }

    pub fn progress(&self) -> Option<Progress> {
        self.open.as_ref().map(|open| Progress {
            page_index: open.page_index,
            total_pages: open.pages.total_pages(),
        })
    }

    pub fn has_unsaved_progress(&self) -> bool {
        self.open.as_ref().is_some_and(|open| open.unsaved)
    }

    pub fn prefs(&self) -> DisplayPrefs {
        self.prefs
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.prefs.theme = theme;
    }

    pub fn cycle_theme(&mut self) {
        self.prefs.theme = self.prefs.theme.cycle();
    }

    pub fn set_font_size(&mut self, size: i32) {
        self.prefs.font_size = FontSize::new(size);
    }

    pub fn font_larger(&mut self) {
        self.prefs.font_size = self.prefs.font_size.larger();
    }

    pub fn font_smaller(&mut self) {
        self.prefs.font_size = self.prefs.font_size.smaller();
    }
}
