//! End-to-end feed flow against a mock HTTP server: the page fetcher
//! driving the grid controller, and the shared image cache's
//! single-network-fetch guarantee.

use picsum_grid::cache::CACHE_MAX_AGE;
use picsum_grid::{fetch_image_cached, fetch_page_from, GridController, ImageCache};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Listing body for one page: `count` elements with distinct download URLs
fn listing_json(page: u32, count: usize) -> serde_json::Value {
    serde_json::Value::Array(
        (0..count)
            .map(|i| {
                serde_json::json!({
                    "id": format!("{page}-{i}"),
                    "author": "Author",
                    "width": 5000,
                    "height": 3333,
                    "url": format!("https://example.com/photos/{page}-{i}"),
                    "download_url": format!("https://example.com/id/{page}-{i}/5000/3333")
                })
            })
            .collect(),
    )
}

async fn mount_page(server: &MockServer, page: u32, count: usize) {
    Mock::given(method("GET"))
        .and(path("/v2/list"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_json(page, count)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn two_pages_then_refresh_scenario() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 90).await;
    mount_page(&server, 2, 90).await;

    let mut ctrl = GridController::new();

    // Initial mount: page 1
    let ticket = ctrl.start_fetch().unwrap();
    let result = fetch_page_from(&server.uri(), ticket.page()).await;
    ctrl.finish(ticket, result);
    assert_eq!(ctrl.urls().len(), 90);
    assert_eq!(ctrl.page(), 2);
    assert!(!ctrl.is_loading());

    // Near-bottom scroll: page 2
    let ticket = ctrl.start_fetch().unwrap();
    let result = fetch_page_from(&server.uri(), ticket.page()).await;
    ctrl.finish(ticket, result);
    assert_eq!(ctrl.urls().len(), 180);
    assert_eq!(ctrl.page(), 3);

    // URLs are the two pages concatenated in request order
    assert!(ctrl.urls()[0].contains("/id/1-0/"));
    assert!(ctrl.urls()[90].contains("/id/2-0/"));

    // Manual refresh: exactly the refresh fetch's results remain
    let ticket = ctrl.refresh();
    let result = fetch_page_from(&server.uri(), ticket.page()).await;
    ctrl.finish(ticket, result);
    assert_eq!(ctrl.urls().len(), 90);
    assert_eq!(ctrl.page(), 2);
    assert!(ctrl.urls().iter().all(|u| u.contains("/id/1-")));
}

#[tokio::test]
async fn failed_page_fetch_leaves_feed_unchanged() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 30).await;
    Mock::given(method("GET"))
        .and(path("/v2/list"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut ctrl = GridController::new();

    let ticket = ctrl.start_fetch().unwrap();
    let result = fetch_page_from(&server.uri(), ticket.page()).await;
    ctrl.finish(ticket, result);

    let urls_before = ctrl.urls().to_vec();

    let ticket = ctrl.start_fetch().unwrap();
    let result = fetch_page_from(&server.uri(), ticket.page()).await;
    assert!(result.is_err());
    ctrl.finish(ticket, result);

    assert_eq!(ctrl.urls(), urls_before.as_slice());
    assert_eq!(ctrl.page(), 2);
    assert!(!ctrl.is_loading());

    // The failure did not poison the feed: the next trigger fires again
    assert!(ctrl.start_fetch().is_some());
}

#[tokio::test]
async fn refresh_discards_in_flight_page_result() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 90).await;

    let mut ctrl = GridController::new();

    // A page-1 fetch goes out, then the user refreshes before it lands
    let stale = ctrl.start_fetch().unwrap();
    let stale_result = fetch_page_from(&server.uri(), stale.page()).await;

    let ticket = ctrl.refresh();

    ctrl.finish(stale, stale_result);
    assert!(ctrl.urls().is_empty(), "stale result must be discarded");
    assert!(ctrl.is_loading(), "refresh fetch is still outstanding");

    let result = fetch_page_from(&server.uri(), ticket.page()).await;
    ctrl.finish(ticket, result);
    assert_eq!(ctrl.urls().len(), 90);
    assert_eq!(ctrl.page(), 2);
}

#[tokio::test]
async fn shared_cache_issues_one_network_fetch_per_url() {
    let server = MockServer::start().await;

    let image_bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x01, 0x02];

    // expect(1): a second network request would fail verification on drop
    Mock::given(method("GET"))
        .and(path("/id/7/5000/3333"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = tempfile::TempDir::new().unwrap();
    let cache = ImageCache::with_config(temp_dir.path().to_path_buf(), CACHE_MAX_AGE, 1000);

    let url = format!("{}/id/7/5000/3333", server.uri());

    // First request: grid cell
    let first = fetch_image_cached(&cache, &url).await.unwrap();
    // Second request: full-screen viewer for the same URL
    let second = fetch_image_cached(&cache, &url).await.unwrap();

    assert_eq!(*first, image_bytes);
    assert_eq!(*second, image_bytes);
}

#[tokio::test]
async fn concurrent_requests_for_one_url_coalesce_into_one_fetch() {
    let server = MockServer::start().await;

    let image_bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x03, 0x04];

    // The delay keeps the first download in flight while the second
    // caller arrives; expect(1) fails verification on a second request.
    Mock::given(method("GET"))
        .and(path("/id/8/5000/3333"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(image_bytes.clone())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = tempfile::TempDir::new().unwrap();
    let cache = ImageCache::with_config(temp_dir.path().to_path_buf(), CACHE_MAX_AGE, 1000);

    let url = format!("{}/id/8/5000/3333", server.uri());

    // Grid cell and full-screen viewer racing for the same image
    let (first, second) = tokio::join!(
        fetch_image_cached(&cache, &url),
        fetch_image_cached(&cache, &url)
    );

    assert_eq!(*first.unwrap(), image_bytes);
    assert_eq!(*second.unwrap(), image_bytes);
}

#[tokio::test]
async fn independent_controllers_do_not_share_feed_state() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 10).await;

    let mut home = GridController::new();
    let mut gallery = GridController::new();

    let ticket = home.start_fetch().unwrap();
    let result = fetch_page_from(&server.uri(), ticket.page()).await;
    home.finish(ticket, result);

    assert_eq!(home.urls().len(), 10);
    assert!(gallery.urls().is_empty());
    assert_eq!(gallery.page(), 1);
    assert!(!gallery.is_loading());
}
