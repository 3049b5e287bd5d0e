//! Paginated feed state machine backing one grid screen.
//!
//! Owns the ordered URL list, the page cursor, and the loading flag.
//! All mutation happens on the UI thread; background tasks only report
//! completion through [`GridController::finish`] with the ticket they
//! were handed at start.

use crate::error::FetchResult;

/// Distance from the maximum scroll extent (in points) at which the next
/// page fetch is triggered.
pub const SCROLL_LOOKAHEAD: f32 = 200.0;

/// Handle for one outstanding page fetch.
///
/// The generation pins the ticket to the refresh epoch it was issued in:
/// a completion whose generation no longer matches the controller is
/// dropped without touching any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    page: u32,
    generation: u64,
}

impl FetchTicket {
    /// The page this ticket's fetch should request
    pub fn page(&self) -> u32 {
        self.page
    }
}

/// Per-screen feed state: URL list, page cursor, loading flag
#[derive(Debug)]
pub struct GridController {
    urls: Vec<String>,
    page: u32,
    loading: bool,
    stalled: bool,
    generation: u64,
}

impl Default for GridController {
    fn default() -> Self {
        Self::new()
    }
}

impl GridController {
    pub fn new() -> Self {
        Self {
            urls: Vec::new(),
            page: 1,
            loading: false,
            stalled: false,
            generation: 0,
        }
    }

    /// Fetched image URLs in display order. Duplicates across pages are
    /// kept as-is; the API may repeat entries and the order is the
    /// display contract.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// 1-based cursor of the next page to fetch
    pub fn page(&self) -> u32 {
        self.page
    }

    /// True while a fetch is outstanding
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True after a fetch failed or came back empty.
    ///
    /// While stalled, the near-bottom check alone must not start another
    /// fetch; it would fire again every frame and turn one failure (or an
    /// exhausted feed) into an endless retry loop. A scroll movement
    /// re-arms the trigger for one attempt; a manual refresh or a later
    /// non-empty fetch clears the stall.
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    /// Begin fetching the next page.
    ///
    /// Returns `None` while a fetch is already outstanding, which is what
    /// keeps the level-triggered scroll check from issuing duplicates.
    pub fn start_fetch(&mut self) -> Option<FetchTicket> {
        if self.loading {
            return None;
        }
        self.loading = true;
        log::debug!("Starting fetch for page {}", self.page);
        Some(FetchTicket {
            page: self.page,
            generation: self.generation,
        })
    }

    /// Manual refresh: discard everything and fetch page 1 again.
    ///
    /// Allowed while a fetch is in flight; bumping the generation makes
    /// the superseded fetch's eventual completion a no-op.
    pub fn refresh(&mut self) -> FetchTicket {
        log::info!("Refreshing feed (discarding {} urls)", self.urls.len());
        self.urls.clear();
        self.page = 1;
        self.generation += 1;
        self.loading = true;
        self.stalled = false;
        FetchTicket {
            page: self.page,
            generation: self.generation,
        }
    }

    /// Record the outcome of a fetch started with `ticket`.
    ///
    /// Success appends the returned URLs and advances the cursor; failure
    /// leaves the list and cursor untouched. Either way the loading flag
    /// clears, unless the ticket is stale (pre-refresh), in which case
    /// nothing happens at all.
    pub fn finish(&mut self, ticket: FetchTicket, result: FetchResult<Vec<String>>) {
        if ticket.generation != self.generation {
            log::debug!(
                "Dropping stale fetch result for page {} (generation {} != {})",
                ticket.page,
                ticket.generation,
                self.generation
            );
            return;
        }

        match result {
            Ok(urls) => {
                log::info!("Page {} fetched: {} urls", ticket.page, urls.len());
                // An empty page means the feed is exhausted; stall so the
                // level-triggered check stops asking for more.
                self.stalled = urls.is_empty();
                self.urls.extend(urls);
                self.page += 1;
            }
            Err(e) => {
                // Deliberate: no retry, no error surface beyond the
                // loading indicator disappearing.
                log::warn!("Page {} fetch failed: {}", ticket.page, e);
                self.stalled = true;
            }
        }
        self.loading = false;
    }
}

/// Level-triggered near-bottom check, evaluated on every scroll-position
/// change. Also true while the content does not yet fill the viewport,
/// which covers the initial-mount fetch.
pub fn should_fetch_more(scroll_offset: f32, viewport_height: f32, content_height: f32) -> bool {
    scroll_offset + viewport_height >= content_height - SCROLL_LOOKAHEAD
}

#[cfg(test)]
#[path = "grid_tests.rs"]
mod tests;
