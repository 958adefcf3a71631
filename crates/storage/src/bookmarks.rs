//! Per-reader reading list.

use std::path::PathBuf;

use folio_core::{BookId, Config, ReaderId};

use crate::record::{ProgressWriteError, ReaderRecords};

const RECORD_FILE: &str = "bookmarks.json";

/// Books a reader has saved for later, kept as a JSON array in the order they
/// were added. Anonymous readers have no bookmarks.
#[derive(Debug)]
pub struct BookmarkStore {
    records: ReaderRecords<Vec<BookId>>,
}

impl BookmarkStore {
    pub fn new(config: &Config) -> Self {
        Self::with_users_dir(config.users_dir())
    }

    pub fn with_users_dir(users_dir: impl Into<PathBuf>) -> Self {
        Self {
            records: ReaderRecords::new(users_dir.into(), RECORD_FILE),
        }
    }

    pub fn load(&self, reader: &ReaderId) -> Vec<BookId> {
        self.records.read(reader, |books| books.clone())
    }

    pub fn is_bookmarked(&self, reader: &ReaderId, book: &BookId) -> bool {
        self.records.read(reader, |books| books.contains(book))
    }

    /// Adds `book` to the list, or removes it when already there. Returns
    /// whether the book is bookmarked afterwards.
    pub fn toggle(&self, reader: &ReaderId, book: &BookId) -> Result<bool, ProgressWriteError> {
        let mut added = false;
        self.records.update(reader, |books| {
            match books.iter().position(|b| b == book) {
                Some(at) => {
                    books.remove(at);
                }
                None => {
                    books.push(book.clone());
                    added = true;
                }
            }
            true
        })?;
        tracing::debug!(%reader, %book, added, "toggled bookmark");
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, BookmarkStore) {
        let dir = TempDir::new().unwrap();
        let store = BookmarkStore::with_users_dir(dir.path().join("users"));
        (dir, store)
    }

    #[test]
    fn toggle_adds_then_removes() -> anyhow::Result<()> {
        let (_dir, store) = store();
        let r = ReaderId::new("alice");
        let book = BookId::from("7");

        assert!(store.toggle(&r, &book)?);
        assert!(store.is_bookmarked(&r, &book));
        assert!(!store.toggle(&r, &book)?);
        assert!(!store.is_bookmarked(&r, &book));
        assert!(store.load(&r).is_empty());
        Ok(())
    }

    #[test]
    fn keeps_insertion_order_on_disk() -> anyhow::Result<()> {
        let (dir, store) = store();
        let r = ReaderId::new("alice");
        for id in ["b", "a", "c"] {
            store.toggle(&r, &BookId::from(id))?;
        }
        store.toggle(&r, &BookId::from("a"))?;

        let raw = fs::read_to_string(dir.path().join("users/alice/bookmarks.json"))?;
        let on_disk: Vec<String> = serde_json::from_str(&raw)?;
        assert_eq!(on_disk, vec!["b", "c"]);

        let reopened = BookmarkStore::with_users_dir(dir.path().join("users"));
        assert_eq!(reopened.load(&r), vec![BookId::from("b"), BookId::from("c")]);
        Ok(())
    }

    #[test]
    fn corrupt_list_loads_empty() -> anyhow::Result<()> {
        let (dir, store) = store();
        let r = ReaderId::new("alice");
        let path = dir.path().join("users/alice/bookmarks.json");
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, "{\"not\": \"a list\"}")?;

        assert!(store.load(&r).is_empty());
        assert!(store.toggle(&r, &BookId::from("x"))?);
        assert_eq!(store.load(&r), vec![BookId::from("x")]);
        Ok(())
    }

    #[test]
    fn anonymous_reader_has_no_bookmarks() -> anyhow::Result<()> {
        let (dir, store) = store();
        let anon = ReaderId::anonymous();
        assert!(!store.toggle(&anon, &BookId::from("x"))?);
        assert!(!store.is_bookmarked(&anon, &BookId::from("x")));
        assert!(!dir.path().join("users").exists());
        Ok(())
    }
}
