//! Test helpers and fixtures.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use folio_core::{Book, BookContent, BookId, BookRepository, Config, FolioError};
use folio_storage::ProgressStore;
use tempfile::TempDir;

/// In-memory book repository.
#[derive(Debug, Default, Clone)]
pub struct MemoryRepository {
    books: HashMap<BookId, BookContent>,
}

impl MemoryRepository {
    pub fn with_book(mut self, id: &str, title: &str, text: impl Into<String>) -> Self {
        self.set_text(id, title, text);
        self
    }

    pub fn set_text(&mut self, id: &str, title: &str, text: impl Into<String>) {
        let id = BookId::from(id);
        self.books.insert(
            id.clone(),
            BookContent {
                book: Book {
                    id,
                    title: title.to_string(),
                },
                text: text.into(),
            },
        );
    }
}

impl BookRepository for MemoryRepository {
    fn load(&self, id: &BookId) -> folio_core::Result<BookContent> {
        self.books
            .get(id)
            .cloned()
            .ok_or_else(|| FolioError::BookNotFound(id.clone()))
    }
}

/// Temporary data directory with a config and progress store rooted in it.
pub struct Fixture {
    pub dir: TempDir,
    pub config: Config,
    pub store: Arc<ProgressStore>,
}

pub fn make_fixture(chunk_size: usize) -> anyhow::Result<Fixture> {
    let dir = TempDir::new()?;
    let config = make_config(dir.path(), chunk_size);
    let store = Arc::new(ProgressStore::new(&config));
    Ok(Fixture { dir, config, store })
}

pub fn make_config(data_dir: &Path, chunk_size: usize) -> Config {
    Config::new(data_dir, chunk_size)
}

/// Hard-wrapped prose: `paragraphs` paragraphs of wrapped lines, separated by
/// blank lines, the way text comes out of an extractor.
pub fn wrapped_prose(paragraphs: usize, lines_per_paragraph: usize) -> String {
    let mut out = String::new();
    for p in 0..paragraphs {
        if p > 0 {
            out.push_str("\n\n");
        }
        for l in 0..lines_per_paragraph {
            if l > 0 {
                out.push('\n');
            }
            out.push_str(&format!("Paragraph {p} line {l} runs  on"));
        }
    }
    out
}

/// Writes a book in the on-disk library layout.
pub fn write_book(config: &Config, id: &str, title: &str, text: &str) -> anyhow::Result<()> {
    let dir = config.books_dir().join(id);
    fs::create_dir_all(&dir)?;
    fs::write(
        dir.join("metadata.json"),
        serde_json::json!({ "title": title }).to_string(),
    )?;
    fs::write(dir.join("content.txt"), text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use folio_application::{ReadingSession, SessionState};
    use folio_core::ReaderId;
    use folio_engine::{Paginator, normalize};
    use folio_storage::{BookmarkStore, FsBookRepository};

    use super::*;

    #[test]
    fn builds_config() {
        let config = make_config(Path::new("/tmp/folio"), 12);
        assert_eq!(config.chunk_size, 12);
        assert_eq!(config.users_dir(), Path::new("/tmp/folio/users"));
    }

    #[test]
    fn wrapped_prose_normalizes_to_paragraphs() {
        let text = normalize(&wrapped_prose(2, 2));
        assert_eq!(
            text,
            "Paragraph 0 line 0 runs on Paragraph 0 line 1 runs on\n\n\
             Paragraph 1 line 0 runs on Paragraph 1 line 1 runs on"
        );
    }

    #[test]
    fn resume_reopens_most_recent_book() -> anyhow::Result<()> {
        let fx = make_fixture(100)?;
        let repo = MemoryRepository::default()
            .with_book("a", "Alpha", wrapped_prose(20, 4))
            .with_book("b", "Beta", wrapped_prose(20, 4));
        let reader = ReaderId::new("sam");

        let mut session = ReadingSession::from_config(&fx.config, Arc::clone(&fx.store));
        session.open(&repo, &BookId::from("a"), reader.clone())?;
        let _ = session.next();
        let _ = session.next();
        session.open(&repo, &BookId::from("b"), reader.clone())?;
        let _ = session.next();
        session.open(&repo, &BookId::from("a"), reader.clone())?;
        assert_eq!(session.page_index(), 2);
        let _ = session.next();
        let _ = session.close();

        assert_eq!(
            fx.store.peek_most_recent(&reader),
            Some((BookId::from("a"), 3))
        );
        assert_eq!(
            fx.store.history(&reader),
            vec![(BookId::from("a"), 3), (BookId::from("b"), 1)]
        );

        let (book, _) = fx.store.peek_most_recent(&reader).unwrap();
        let mut resumed = ReadingSession::from_config(&fx.config, Arc::clone(&fx.store));
        resumed.open(&repo, &book, reader)?;
        assert_eq!(resumed.page_index(), 3);
        assert_eq!(resumed.book().map(|b| b.title.as_str()), Some("Alpha"));
        Ok(())
    }

    #[test]
    fn shrunken_book_clamps_saved_page() -> anyhow::Result<()> {
        let fx = make_fixture(50)?;
        let mut repo = MemoryRepository::default().with_book("a", "Alpha", "x".repeat(500));
        let reader = ReaderId::new("sam");

        let mut session = ReadingSession::from_config(&fx.config, Arc::clone(&fx.store));
        session.open(&repo, &BookId::from("a"), reader.clone())?;
        let _ = session.go_to(9);
        assert_eq!(fx.store.load(&reader, &BookId::from("a")), 9);

        repo.set_text("a", "Alpha", "x".repeat(120));
        session.open(&repo, &BookId::from("a"), reader)?;
        assert_eq!(session.total_pages(), 3);
        assert_eq!(session.page_index(), 2);
        assert_eq!(session.current_page().map(str::len), Some(20));
        Ok(())
    }

    #[test]
    fn library_on_disk_round_trip() -> anyhow::Result<()> {
        let fx = make_fixture(3000)?;
        let body: String = "abcdefghij".chars().cycle().take(7000).collect();
        write_book(&fx.config, "long", "Long Book", &body)?;
        let repo = FsBookRepository::new(&fx.config);
        let reader = ReaderId::new("kim");

        let mut session = ReadingSession::from_config(&fx.config, Arc::clone(&fx.store));
        session.open(&repo, &BookId::from("long"), reader.clone())?;
        assert_eq!(session.total_pages(), 3);

        let mut lens = vec![session.current_page().map_or(0, str::len)];
        while session.next().moved {
            lens.push(session.current_page().map_or(0, str::len));
        }
        assert_eq!(lens, vec![3000, 3000, 1000]);
        assert_eq!(session.state(), SessionState::Finished);

        let record = fx.store.record_path(&reader).unwrap();
        assert!(record.starts_with(fx.dir.path()));
        assert_eq!(fx.store.load(&reader, &BookId::from("long")), 2);
        Ok(())
    }

    #[test]
    fn two_sessions_of_one_reader_share_history() -> anyhow::Result<()> {
        let fx = make_fixture(10)?;
        let repo = MemoryRepository::default()
            .with_book("a", "Alpha", "x".repeat(100))
            .with_book("b", "Beta", "y".repeat(100));
        let reader = ReaderId::new("sam");

        let mut first = ReadingSession::new(Arc::clone(&fx.store), Paginator::new(10));
        let mut second = ReadingSession::new(Arc::clone(&fx.store), Paginator::new(10));
        first.open(&repo, &BookId::from("a"), reader.clone())?;
        second.open(&repo, &BookId::from("b"), reader.clone())?;

        let _ = first.next();
        let _ = second.next();
        let _ = second.next();
        let _ = first.next();

        assert_eq!(
            fx.store.history(&reader),
            vec![(BookId::from("a"), 2), (BookId::from("b"), 2)]
        );
        Ok(())
    }

    #[test]
    fn reopening_after_outage_never_rewinds_saved_page() -> anyhow::Result<()> {
        let fx = make_fixture(10)?;
        let users = fx.config.users_dir();
        fs::write(&users, "blocking file")?;
        let repo = MemoryRepository::default().with_book("a", "Alpha", "z".repeat(50));
        let reader = ReaderId::new("sam");
        let book = BookId::from("a");

        let mut session = ReadingSession::from_config(&fx.config, Arc::clone(&fx.store));
        session.open(&repo, &book, reader.clone())?;
        let _ = session.next();
        let _ = session.next();

        fs::remove_file(&users)?;
        assert!(session.open(&repo, &book, reader.clone())?.is_none());
        let _ = session.next();
        assert_eq!(fx.store.load(&reader, &book), 3);
        Ok(())
    }

    #[test]
    fn bookmarks_live_beside_history() -> anyhow::Result<()> {
        let fx = make_fixture(10)?;
        let reader = ReaderId::new("sam");
        let bookmarks = BookmarkStore::new(&fx.config);
        fx.store.save(&reader, &BookId::from("a"), 1)?;
        assert!(bookmarks.toggle(&reader, &BookId::from("b"))?);

        let dir = fx.config.users_dir().join("sam");
        assert!(dir.join("reading_history.json").is_file());
        assert!(dir.join("bookmarks.json").is_file());
        assert_eq!(fx.store.history(&reader), vec![(BookId::from("a"), 1)]);
        assert_eq!(bookmarks.load(&reader), vec![BookId::from("b")]);
        Ok(())
    }
}
