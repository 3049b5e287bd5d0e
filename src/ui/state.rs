use crate::api::picsum::fetch_page;
use crate::cache::{fetch_image_cached, ImageCache};
use crate::error::FetchResult;
use crate::grid::{should_fetch_more, FetchTicket, GridController};
use eframe::egui;
use log::{debug, error};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Semaphore;

/// Which grid screen is visible. Both stay alive regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Gallery,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Gallery => "Gallery",
        }
    }
}

/// Message sent from a background page-fetch task
pub struct FetchedPage {
    pub ticket: FetchTicket,
    pub result: FetchResult<Vec<String>>,
}

/// Message sent from a background image-download task.
/// `bytes` is `None` when the download failed; the cell falls back to the
/// error glyph and the failure never reaches controller state.
pub struct LoadedImage {
    pub url: String,
    pub bytes: Option<Arc<Vec<u8>>>,
}

/// Width of the decode target for grid thumbnails, in pixels
pub const THUMBNAIL_WIDTH: u32 = 300;

/// Maximum concurrent image downloads per screen
const MAX_CONCURRENT_DOWNLOADS: usize = 5;

/// State owned by one grid screen: the feed controller plus the plumbing
/// that moves fetch results from tokio tasks back onto the UI thread.
///
/// Constructed once per tab and kept alive for the process lifetime, so
/// switching tabs never discards fetched URLs or textures.
pub struct GridScreenState {
    /// Stable id for scroll areas and texture names
    pub name: &'static str,
    pub controller: GridController,
    /// Thumbnail textures keyed by URL
    pub thumbnails: HashMap<String, egui::TextureHandle>,
    /// URLs with a download in flight
    pub loading_images: HashSet<String>,
    /// URLs whose download or decode failed; rendered as the error glyph
    pub failed_images: HashSet<String>,
    page_sender: UnboundedSender<FetchedPage>,
    page_receiver: UnboundedReceiver<FetchedPage>,
    image_sender: UnboundedSender<LoadedImage>,
    image_receiver: UnboundedReceiver<LoadedImage>,
    download_semaphore: Arc<Semaphore>,
    /// Scroll offset and content height seen last frame, for re-arming
    /// the next-page trigger after a stall
    last_scroll: Option<(f32, f32)>,
}

impl GridScreenState {
    pub fn new(name: &'static str) -> Self {
        let (page_tx, page_rx) = unbounded_channel();
        let (image_tx, image_rx) = unbounded_channel();
        Self {
            name,
            controller: GridController::new(),
            thumbnails: HashMap::new(),
            loading_images: HashSet::new(),
            failed_images: HashSet::new(),
            page_sender: page_tx,
            page_receiver: page_rx,
            image_sender: image_tx,
            image_receiver: image_rx,
            download_semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_DOWNLOADS)),
            last_scroll: None,
        }
    }

    /// Decide whether this frame should start a next-page fetch.
    ///
    /// The near-bottom check is evaluated every frame, so on its own a
    /// stalled feed (failed or exhausted fetch) would retry endlessly.
    /// While the controller is stalled the trigger only fires again once
    /// the scroll offset or content height actually changes; a manual
    /// refresh bypasses this entirely.
    pub fn should_start_fetch(
        &mut self,
        scroll_offset: f32,
        viewport_height: f32,
        content_height: f32,
    ) -> bool {
        let position = (scroll_offset, content_height);
        let moved = self.last_scroll != Some(position);
        self.last_scroll = Some(position);

        if !should_fetch_more(scroll_offset, viewport_height, content_height) {
            return false;
        }
        !self.controller.is_stalled() || moved
    }

    /// Drain both channels and apply results (non-blocking, called every frame)
    pub fn poll(&mut self, ctx: &egui::Context) {
        while let Ok(fetched) = self.page_receiver.try_recv() {
            self.controller.finish(fetched.ticket, fetched.result);
        }

        while let Ok(loaded) = self.image_receiver.try_recv() {
            self.loading_images.remove(&loaded.url);
            match loaded.bytes {
                Some(bytes) => self.install_thumbnail(ctx, &loaded.url, &bytes),
                None => {
                    self.failed_images.insert(loaded.url);
                }
            }
        }

        // Keep frames coming while background work is outstanding
        if self.controller.is_loading() || !self.loading_images.is_empty() {
            ctx.request_repaint();
        }
    }

    /// Decode downloaded bytes to a 300-px-wide thumbnail and upload it
    fn install_thumbnail(&mut self, ctx: &egui::Context, url: &str, bytes: &[u8]) {
        match image::load_from_memory(bytes) {
            Ok(img) => {
                let thumb = img.thumbnail(THUMBNAIL_WIDTH, THUMBNAIL_WIDTH * 2);
                let rgba = thumb.to_rgba8();
                let size = [rgba.width() as usize, rgba.height() as usize];
                let pixels = rgba.into_raw();
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &pixels);

                let texture = ctx.load_texture(
                    format!("{}_{}", self.name, url),
                    color_image,
                    egui::TextureOptions::LINEAR,
                );
                self.thumbnails.insert(url.to_string(), texture);
                debug!("Created thumbnail texture for {}", url);
            }
            Err(e) => {
                error!("Failed to decode image {}: {}", url, e);
                self.failed_images.insert(url.to_string());
            }
        }
    }

    /// Spawn the page fetch for a ticket handed out by the controller
    pub fn spawn_page_fetch(&self, ticket: FetchTicket, runtime: &Handle, ctx: &egui::Context) {
        let sender = self.page_sender.clone();
        let ctx = ctx.clone();
        runtime.spawn(async move {
            let result = fetch_page(ticket.page()).await;
            let _ = sender.send(FetchedPage { ticket, result });
            ctx.request_repaint();
        });
    }

    /// Start a background download for a cell's image unless it is already
    /// loaded, in flight, or known-bad.
    pub fn request_image(
        &mut self,
        url: &str,
        runtime: &Handle,
        cache: &Arc<ImageCache>,
        ctx: &egui::Context,
    ) {
        if self.thumbnails.contains_key(url)
            || self.loading_images.contains(url)
            || self.failed_images.contains(url)
        {
            return;
        }
        self.loading_images.insert(url.to_string());

        let sender = self.image_sender.clone();
        let cache = Arc::clone(cache);
        let semaphore = Arc::clone(&self.download_semaphore);
        let url = url.to_string();
        let ctx = ctx.clone();

        runtime.spawn(async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return; // semaphore closed, app is shutting down
            };
            let bytes = match fetch_image_cached(&cache, &url).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    error!("Failed to fetch image {}: {}", url, e);
                    None
                }
            };
            let _ = sender.send(LoadedImage { url, bytes });
            ctx.request_repaint();
        });
    }
}
