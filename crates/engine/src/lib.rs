//! Text engine: turns raw extracted book text into canonical text and
//! fixed-size pages.

mod normalize;
mod paginate;

pub use normalize::normalize;
pub use paginate::{PagedText, Paginator, get_page, total_pages};
