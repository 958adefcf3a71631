//! Error types shared across the Folio crates.

use thiserror::Error;

use crate::BookId;

pub type Result<T> = std::result::Result<T, FolioError>;

#[derive(Error, Debug)]
pub enum FolioError {
    #[error("book not found: {0}")]
    BookNotFound(BookId),

    #[error("invalid metadata for book {book}: {message}")]
    Metadata { book: BookId, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FolioError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FolioError::BookNotFound(_))
    }
}
