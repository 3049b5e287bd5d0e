use crate::error::{FetchError, FetchResult};
use serde::{Deserialize, Serialize};

/// Production endpoint for the image listing API
pub const BASE_URL: &str = "https://picsum.photos";

/// Number of images requested per page
pub const PAGE_SIZE: u32 = 90;

const USER_AGENT: &str = "picsum_grid/0.1";

/// One element of the `/v2/list` response.
/// Only `download_url` feeds the grid; the rest is kept for completeness.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ListedImage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub url: String,
    pub download_url: String,
}

fn client() -> FetchResult<reqwest::Client> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}

/// Fetch one page of image URLs from a specific base URL.
/// Returns the `download_url` of each listed image, preserving response order.
pub async fn fetch_page_from(base_url: &str, page: u32) -> FetchResult<Vec<String>> {
    let url = format!("{}/v2/list?page={}&limit={}", base_url, page, PAGE_SIZE);

    log::info!("Fetching image list page {}: {}", page, url);

    let response = client()?.get(&url).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status()));
    }

    // Parse through serde_json so a malformed body surfaces as Parse,
    // not as a reqwest body error.
    let body = response.text().await?;
    let listed: Vec<ListedImage> = serde_json::from_str(&body)?;

    log::debug!("Page {} returned {} images", page, listed.len());

    Ok(listed.into_iter().map(|img| img.download_url).collect())
}

/// Fetch one page of image URLs from the production endpoint
pub async fn fetch_page(page: u32) -> FetchResult<Vec<String>> {
    fetch_page_from(BASE_URL, page).await
}

/// Fetch raw image bytes
pub async fn fetch_image(url: &str) -> FetchResult<Vec<u8>> {
    log::debug!("Fetching image: {}", url);

    let response = client()?.get(url).send().await?;

    if response.status().is_success() {
        Ok(response.bytes().await?.to_vec())
    } else {
        Err(FetchError::HttpStatus(response.status()))
    }
}

#[cfg(test)]
#[path = "picsum_tests.rs"]
mod tests;
