pub mod api;
pub mod cache;
pub mod error;
pub mod grid;
pub mod ui;

// Re-export commonly used items
pub use api::{fetch_page, fetch_page_from, ListedImage, PAGE_SIZE};
pub use cache::{fetch_image_cached, ImageCache};
pub use error::{FetchError, FetchResult};
pub use grid::{should_fetch_more, FetchTicket, GridController, SCROLL_LOOKAHEAD};
