//! Book content laid out as `<books_dir>/<id>/{metadata.json,content.txt}`.

use std::fs;
use std::io;
use std::path::PathBuf;

use folio_core::{Book, BookContent, BookId, BookRepository, Config, FolioError};
use serde::Deserialize;

pub const MISSING_CONTENT: &str = "Content not available.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Metadata {
    title: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FsBookRepository {
    books_dir: PathBuf,
}

impl FsBookRepository {
    pub fn new(config: &Config) -> Self {
        Self::with_books_dir(config.books_dir())
    }

    pub fn with_books_dir(books_dir: impl Into<PathBuf>) -> Self {
        Self {
            books_dir: books_dir.into(),
        }
    }

    pub fn book(&self, id: &BookId) -> folio_core::Result<Book> {
        let dir = self.book_dir(id)?;
        let raw = match fs::read_to_string(dir.join("metadata.json")) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(FolioError::BookNotFound(id.clone()));
            }
            Err(err) => return Err(err.into()),
        };
        let metadata: Metadata =
            serde_json::from_str(&raw).map_err(|err| FolioError::Metadata {
                book: id.clone(),
                message: err.to_string(),
            })?;
        Ok(Book {
            id: id.clone(),
            title: metadata
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
        })
    }

    /// Every book with readable metadata, sorted by title.
    pub fn list_books(&self) -> folio_core::Result<Vec<Book>> {
        let entries = match fs::read_dir(&self.books_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut books = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let id = BookId::new(entry.file_name().to_string_lossy());
            match self.book(&id) {
                Ok(book) => books.push(book),
                Err(FolioError::BookNotFound(_)) => {}
                Err(err) => tracing::warn!(book = %id, error = %err, "skipping unreadable book"),
            }
        }
        books.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(books)
    }

    fn book_dir(&self, id: &BookId) -> folio_core::Result<PathBuf> {
        let raw = id.as_str();
        if raw.is_empty() || raw == "." || raw == ".." || raw.contains(['/', '\\']) {
            return Err(FolioError::BookNotFound(id.clone()));
        }
        Ok(self.books_dir.join(raw))
    }
}

impl BookRepository for FsBookRepository {
    fn load(&self, id: &BookId) -> folio_core::Result<BookContent> {
        let book = self.book(id)?;
        let text = match fs::read_to_string(self.book_dir(id)?.join("content.txt")) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => MISSING_CONTENT.to_string(),
            Err(err) => return Err(err.into()),
        };
        Ok(BookContent { book, text })
    }
}
