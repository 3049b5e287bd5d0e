use std::fmt;

/// Unified error type for fetch and cache operations
#[derive(Debug)]
pub enum FetchError {
    /// HTTP request failed (network error, timeout, etc.)
    Network(reqwest::Error),
    /// Failed to parse JSON response or a required field was missing
    Parse(serde_json::Error),
    /// HTTP error status code
    HttpStatus(reqwest::StatusCode),
    /// Image decoding error
    Image(String),
    /// Cache error, including a failure relayed from a coalesced download
    Cache(String),
    /// File I/O error
    Io(std::io::Error),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network(e) => write!(f, "Network error: {}", e),
            FetchError::Parse(e) => write!(f, "Parse error: {}", e),
            FetchError::HttpStatus(status) => write!(f, "HTTP error: {}", status),
            FetchError::Image(msg) => write!(f, "Image error: {}", msg),
            FetchError::Cache(msg) => write!(f, "Cache error: {}", msg),
            FetchError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Network(e) => Some(e),
            FetchError::Parse(e) => Some(e),
            FetchError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err)
    }
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Io(err)
    }
}

/// Result type alias for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;
