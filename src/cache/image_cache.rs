use crate::api::picsum::fetch_image;
use crate::error::{FetchError, FetchResult};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::OnceCell;

/// Directory name under the OS cache dir; doubles as the cache namespace key
pub const CACHE_NAMESPACE: &str = "picsum_grid";

/// Entries older than this are refetched
pub const CACHE_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Maximum number of cached objects on disk
pub const CACHE_CAPACITY: usize = 1000;

/// One memory-layer entry. The insertion timestamp makes the staleness
/// window apply to memory hits the same way file mtime applies to disk.
struct MemoryEntry {
    bytes: Arc<Vec<u8>>,
    inserted: Instant,
}

/// Cell shared by every caller awaiting one URL's in-flight download.
/// The error is kept as its message: `FetchError` is not cloneable.
type InFlightCell = Arc<OnceCell<Result<Arc<Vec<u8>>, String>>>;

/// Shared disk+memory cache mapping an image URL to its bytes.
///
/// One instance per namespace is constructed at startup and handed to
/// every consumer; the file mtime is the staleness timestamp and eviction
/// drops the oldest files once the object count exceeds capacity.
pub struct ImageCache {
    cache_dir: PathBuf,
    max_age: Duration,
    capacity: usize,
    memory: Mutex<LruCache<String, MemoryEntry>>,
    in_flight: Mutex<HashMap<String, InFlightCell>>,
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCache {
    /// Create the cache in the platform cache directory
    pub fn new() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CACHE_NAMESPACE)
            .join("images");
        Self::with_config(cache_dir, CACHE_MAX_AGE, CACHE_CAPACITY)
    }

    /// Create a cache over an explicit directory with explicit limits
    pub fn with_config(cache_dir: PathBuf, max_age: Duration, capacity: usize) -> Self {
        if let Err(e) = std::fs::create_dir_all(&cache_dir) {
            log::warn!("Failed to create image cache directory: {}", e);
        } else {
            log::info!("Image cache directory: {:?}", cache_dir);
        }

        let memory_slots =
            NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).expect("1 is non-zero"));

        Self {
            cache_dir,
            max_age,
            capacity,
            memory: Mutex::new(LruCache::new(memory_slots)),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Generate a filename from the image URL. URLs are hashed so they are
    /// never used as path components.
    fn filename(url: &str) -> String {
        format!("{}.img", blake3::hash(url.as_bytes()).to_hex())
    }

    /// Get the full path for a cached image
    fn path(&self, url: &str) -> PathBuf {
        self.cache_dir.join(Self::filename(url))
    }

    /// Check if an image is cached on disk. Disk only: the memory layer
    /// can still serve a URL this reports absent (see [`ImageCache::get`]).
    pub fn contains(&self, url: &str) -> bool {
        self.path(url).exists()
    }

    /// Get a cached image: memory layer first, then disk.
    /// Both layers honor the staleness window; an entry past it is
    /// dropped and treated as a miss.
    pub fn get(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        {
            let mut memory = self.memory.lock().ok()?;
            let hit = memory
                .get(url)
                .map(|entry| (entry.inserted.elapsed() <= self.max_age).then(|| Arc::clone(&entry.bytes)));
            match hit {
                Some(Some(bytes)) => {
                    log::debug!("Memory cache hit for {}", url);
                    return Some(bytes);
                }
                Some(None) => {
                    log::info!("Memory cache entry stale for {}, discarding", url);
                    memory.pop(url);
                }
                None => {}
            }
        }

        let path = self.path(url);
        let age = self.entry_age(&path);
        if let Some(age) = age {
            if age > self.max_age {
                log::info!("Cache entry stale for {}, discarding", url);
                if let Err(e) = std::fs::remove_file(&path) {
                    log::warn!("Failed to remove stale cache entry: {}", e);
                }
                return None;
            }
        }

        match std::fs::read(&path) {
            Ok(bytes) => {
                log::info!("Disk cache hit for {}", url);
                let bytes = Arc::new(bytes);
                // The promoted entry inherits the on-disk age so memory
                // residency never extends the staleness window.
                let inserted = age
                    .and_then(|age| Instant::now().checked_sub(age))
                    .unwrap_or_else(Instant::now);
                if let Ok(mut memory) = self.memory.lock() {
                    memory.put(
                        url.to_string(),
                        MemoryEntry {
                            bytes: Arc::clone(&bytes),
                            inserted,
                        },
                    );
                }
                Some(bytes)
            }
            Err(_) => None,
        }
    }

    /// Store an image in the cache (write-through to disk and memory)
    pub fn insert(&self, url: &str, bytes: Vec<u8>) -> Arc<Vec<u8>> {
        let path = self.path(url);
        if let Err(e) = std::fs::write(&path, &bytes) {
            log::warn!("Failed to cache image: {}", e);
        } else {
            log::debug!("Cached image for {}", url);
        }

        let bytes = Arc::new(bytes);
        if let Ok(mut memory) = self.memory.lock() {
            memory.put(
                url.to_string(),
                MemoryEntry {
                    bytes: Arc::clone(&bytes),
                    inserted: Instant::now(),
                },
            );
        }

        self.enforce_capacity();
        bytes
    }

    /// Age of a disk entry per its mtime; `None` for a missing file or an
    /// mtime in the future (left alone rather than treated as stale)
    fn entry_age(&self, path: &Path) -> Option<Duration> {
        let modified = std::fs::metadata(path).ok()?.modified().ok()?;
        SystemTime::now().duration_since(modified).ok()
    }

    /// Drop the oldest files while the object count exceeds capacity
    fn enforce_capacity(&self) {
        let Ok(entries) = std::fs::read_dir(&self.cache_dir) else {
            return;
        };

        let mut files: Vec<(PathBuf, SystemTime)> = entries
            .flatten()
            .filter_map(|entry| {
                let meta = entry.metadata().ok()?;
                if !meta.is_file() {
                    return None;
                }
                Some((entry.path(), meta.modified().ok()?))
            })
            .collect();

        if files.len() <= self.capacity {
            return;
        }

        files.sort_by_key(|(_, modified)| *modified);
        let excess = files.len() - self.capacity;
        for (path, _) in files.into_iter().take(excess) {
            log::info!("Evicting cached image {:?}", path.file_name());
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("Failed to evict cache entry: {}", e);
            }
        }
    }
}

/// Fetch an image, checking the shared cache first.
///
/// Concurrent misses for one URL are coalesced: the first caller
/// downloads while everyone else awaits the same cell, so a grid cell
/// and the viewer racing for an image still cost exactly one network
/// fetch.
pub async fn fetch_image_cached(cache: &ImageCache, url: &str) -> FetchResult<Arc<Vec<u8>>> {
    if let Some(bytes) = cache.get(url) {
        return Ok(bytes);
    }

    let cell = {
        let Ok(mut in_flight) = cache.in_flight.lock() else {
            return Err(FetchError::Cache("in-flight map poisoned".to_string()));
        };
        Arc::clone(in_flight.entry(url.to_string()).or_default())
    };

    let result = cell
        .get_or_init(|| async {
            // The download that created this entry may have landed between
            // our miss and this point; check once more before fetching.
            if let Some(bytes) = cache.get(url) {
                return Ok(bytes);
            }
            log::info!("Image cache miss for {}, fetching", url);
            match fetch_image(url).await {
                Ok(bytes) => Ok(cache.insert(url, bytes)),
                Err(e) => Err(e.to_string()),
            }
        })
        .await
        .clone();

    if let Ok(mut in_flight) = cache.in_flight.lock() {
        in_flight.remove(url);
    }

    result.map_err(FetchError::Cache)
}
