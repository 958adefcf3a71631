//! Core domain types for Folio.

use serde::{Deserialize, Serialize};

mod config;
mod error;

pub use config::{Config, ConfigError, DEFAULT_CHUNK_SIZE};
pub use error::{FolioError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub String);

impl BookId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BookId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
}

/// A book as handed over by a repository: metadata plus raw extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookContent {
    pub book: Book,
    pub text: String,
}

/// Source of raw book text. Implementations return
/// [`FolioError::BookNotFound`] for ids they have no content for.
pub trait BookRepository {
    fn load(&self, id: &BookId) -> Result<BookContent>;
}

/// Identity of whoever is reading. Names are reduced to their alphanumeric
/// characters so they can double as a directory name; a name with nothing
/// left over is anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReaderId {
    Anonymous,
    Named(String),
}

impl ReaderId {
    pub fn new(name: &str) -> Self {
        let safe: String = name.chars().filter(|c| c.is_alphanumeric()).collect();
        if safe.is_empty() {
            ReaderId::Anonymous
        } else {
            ReaderId::Named(safe)
        }
    }

    pub fn anonymous() -> Self {
        ReaderId::Anonymous
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, ReaderId::Anonymous)
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            ReaderId::Anonymous => None,
            ReaderId::Named(name) => Some(name),
        }
    }
}

impl std::fmt::Display for ReaderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReaderId::Anonymous => f.write_str("<anonymous>"),
            ReaderId::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Sepia,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Sepia => "sepia",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Sepia,
            Theme::Sepia => Theme::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = &'static str;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "sepia" => Ok(Theme::Sepia),
            _ => Err("unknown theme"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontSize(u16);

impl FontSize {
    pub const MIN: u16 = 12;
    pub const MAX: u16 = 32;
    pub const STEP: u16 = 2;

    pub fn new(size: i32) -> Self {
        Self(size.clamp(Self::MIN as i32, Self::MAX as i32) as u16)
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn larger(self) -> Self {
        Self::new(self.0 as i32 + Self::STEP as i32)
    }

    pub fn smaller(self) -> Self {
        Self::new(self.0 as i32 - Self::STEP as i32)
    }
}

impl Default for FontSize {
    fn default() -> Self {
        Self(18)
    }
}

/// Per-session look of the page. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayPrefs {
    pub theme: Theme,
    pub font_size: FontSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub page_index: usize,
    pub total_pages: usize,
}

impl Progress {
    /// Share of the book read once the current page is finished.
    pub fn percent(&self) -> f32 {
        if self.total_pages == 0 {
            0.0
        } else {
            ((self.page_index + 1) as f32 / self.total_pages as f32) * 100.0
        }
    }

    pub fn ratio(&self) -> f64 {
        f64::from(self.percent()) / 100.0
    }
}
