//! Caching layer for downloaded images

pub mod image_cache;

pub use image_cache::{fetch_image_cached, ImageCache, CACHE_CAPACITY, CACHE_MAX_AGE};
