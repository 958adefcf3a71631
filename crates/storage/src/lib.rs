//! File-backed persistence: reading progress, bookmarks and book content.

mod bookmarks;
mod books;
mod progress;
mod recency;
mod record;

pub use bookmarks::BookmarkStore;
pub use books::{FsBookRepository, MISSING_CONTENT};
pub use progress::{ProgressStore, ReadingHistory};
pub use recency::{Iter, RecencyMap};
pub use record::ProgressWriteError;
