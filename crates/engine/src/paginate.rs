use folio_core::DEFAULT_CHUNK_SIZE;

use crate::normalize;

/// Number of pages `text` spans at `chunk_size` characters per page.
/// Empty text still has one (empty) page.
pub fn total_pages(text: &str, chunk_size: usize) -> usize {
    let chunk_size = chunk_size.max(1);
    let len = text.chars().count();
    if len == 0 { 1 } else { len.div_ceil(chunk_size) }
}

/// Content of page `page_index`, clamped into `[0, total_pages - 1]`.
pub fn get_page(text: &str, page_index: usize, chunk_size: usize) -> &str {
    let chunk_size = chunk_size.max(1);
    let page_index = page_index.min(total_pages(text, chunk_size) - 1);
    let start = byte_offset(text, page_index * chunk_size);
    let end = start + byte_offset(&text[start..], chunk_size);
    &text[start..end]
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    chunk_size: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Paginator {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Normalizes `raw` and splits the result into pages.
    pub fn paginate(&self, raw: &str) -> PagedText {
        self.paginate_canonical(normalize(raw))
    }

    /// Splits text that is already canonical.
    pub fn paginate_canonical(&self, text: String) -> PagedText {
        let bounds = page_bounds(&text, self.chunk_size);
        tracing::debug!(
            bytes = text.len(),
            pages = bounds.len() - 1,
            chunk_size = self.chunk_size,
            "paginated text"
        );
        PagedText { text, bounds }
    }
}

// Byte offsets of every page start followed by the text length, so page `i`
// is `bounds[i]..bounds[i + 1]`. Always holds at least two entries.
fn page_bounds(text: &str, chunk_size: usize) -> Vec<usize> {
    let mut bounds = vec![0];
    for (n, (offset, _)) in text.char_indices().enumerate() {
        if n > 0 && n % chunk_size == 0 {
            bounds.push(offset);
        }
    }
    bounds.push(text.len());
    bounds
}

/// Canonical text of one open book with its page boundaries precomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedText {
    text: String,
    bounds: Vec<usize>,
}

impl PagedText {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn total_pages(&self) -> usize {
        self.bounds.len() - 1
    }

    pub fn clamp(&self, page_index: usize) -> usize {
        page_index.min(self.total_pages() - 1)
    }

    pub fn page(&self, page_index: usize) -> &str {
        let page_index = self.clamp(page_index);
        &self.text[self.bounds[page_index]..self.bounds[page_index + 1]]
    }

    pub fn pages(&self) -> impl Iterator<Item = &str> + '_ {
        self.bounds
            .windows(2)
            .map(|window| &self.text[window[0]..window[1]])
    }
}
