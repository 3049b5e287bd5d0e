//! API client for the Lorem Picsum listing service

pub mod picsum;

pub use picsum::{fetch_image, fetch_page, fetch_page_from, ListedImage, PAGE_SIZE};
