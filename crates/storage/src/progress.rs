//! Per-reader reading history on disk.

use std::path::PathBuf;

use folio_core::{BookId, Config, ReaderId};

use crate::record::{ProgressWriteError, ReaderRecords};
use crate::recency::RecencyMap;

const RECORD_FILE: &str = "reading_history.json";

/// `book -> page index`, least recently read first.
pub type ReadingHistory = RecencyMap<BookId, usize>;

/// Remembers the last viewed page of every book, one JSON record per reader.
///
/// Anonymous readers get default answers and nothing is written for them.
/// Missing or unreadable records load as empty. A record is read from disk
/// the first time a reader is seen and kept in memory afterwards, so
/// `peek_most_recent` is a lookup on the in-memory map. Writes replace the
/// record atomically and are serialized per reader, so concurrent sessions of
/// one reader cannot lose each other's updates. Share one store per data
/// directory.
#[derive(Debug)]
pub struct ProgressStore {
    records: ReaderRecords<ReadingHistory>,
}

impl ProgressStore {
    pub fn new(config: &Config) -> Self {
        Self::with_users_dir(config.users_dir())
    }

    pub fn with_users_dir(users_dir: impl Into<PathBuf>) -> Self {
        Self {
            records: ReaderRecords::new(users_dir.into(), RECORD_FILE),
        }
    }

    pub fn record_path(&self, reader: &ReaderId) -> Option<PathBuf> {
        self.records.path(reader)
    }

    /// Saved page for `book`, or 0 when nothing usable is stored.
    pub fn load(&self, reader: &ReaderId, book: &BookId) -> usize {
        self.records
            .read(reader, |history| history.get(book).copied())
            .unwrap_or(0)
    }

    pub fn load_history(&self, reader: &ReaderId) -> ReadingHistory {
        self.records.read(reader, |history| history.clone())
    }

    /// Records `page_index` for `book` and makes it the most recent book.
    pub fn save(
        &self,
        reader: &ReaderId,
        book: &BookId,
        page_index: usize,
    ) -> Result<(), ProgressWriteError> {
        if self.records.update(reader, |history| {
            history.insert(book.clone(), page_index);
            true
        })? {
            tracing::debug!(%reader, %book, page_index, "saved reading progress");
        }
        Ok(())
    }

    /// Drops `book` from the reader's history. Returns whether it was there.
    pub fn forget(&self, reader: &ReaderId, book: &BookId) -> Result<bool, ProgressWriteError> {
        let forgotten = self
            .records
            .update(reader, |history| history.remove(book).is_some())?;
        if forgotten {
            tracing::info!(%reader, %book, "forgot reading progress");
        }
        Ok(forgotten)
    }

    /// The book this reader touched last, with its saved page.
    pub fn peek_most_recent(&self, reader: &ReaderId) -> Option<(BookId, usize)> {
        self.records.read(reader, |history| {
            history
                .most_recent()
                .map(|(book, page)| (book.clone(), *page))
        })
    }

    /// All saved positions, most recently read first.
    pub fn history(&self, reader: &ReaderId) -> Vec<(BookId, usize)> {
        self.records.read(reader, |history| {
            history
                .iter()
                .rev()
                .map(|(book, page)| (book.clone(), *page))
                .collect()
        })
    }
}
