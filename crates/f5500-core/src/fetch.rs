//! HTTP download into memory with per-chunk read timeout.
//!
//! Uses async reqwest on a shared tokio runtime but presents a blocking
//! interface; the archive engine is sequential and has no async surface.

use std::sync::{LazyLock, OnceLock};
use std::time::Duration;

use indicatif::ProgressBar;

use crate::progress::upgrade_to_bar;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport settings shared by every download in the process.
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    /// No data for this long while reading the body counts as a stall.
    pub read_timeout: Duration,
    /// Extra attempts after the first one for retryable failures.
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

static HTTP_CONFIG: OnceLock<HttpConfig> = OnceLock::new();

/// Install the process-wide HTTP settings. Only the first call wins.
pub fn set_http_config(config: HttpConfig) {
    if HTTP_CONFIG.set(config).is_err() {
        log::debug!("http config already initialized, ignoring {config:?}");
    }
}

/// Current HTTP settings (defaults if never set).
pub fn http_config() -> &'static HttpConfig {
    HTTP_CONFIG.get_or_init(HttpConfig::default)
}

/// Error types for fetch operations
#[derive(Debug)]
pub enum FetchError {
    /// HTTP error with optional status code (None = connection-level failure)
    Http {
        status: Option<u16>,
        message: String,
    },
    /// I/O error while reading the body
    Io(std::io::Error),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Http { .. } => None,
        }
    }
}

impl FetchError {
    /// Create HTTP error from reqwest error.
    ///
    /// The URL is stripped from the message; it is reported separately by callers.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.without_url().to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            // 404 = not published (yet), other 4xx are our fault; 429 is throttling
            Self::Http {
                status: Some(s), ..
            } => *s == 429 || *s >= 500,
            Self::Http { status: None, .. } => true,
            Self::Io(e) => e.kind() != std::io::ErrorKind::StorageFull,
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Upper bound on up-front body allocation; larger bodies grow as they arrive.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Buffer size to reserve for an announced `Content-Length`.
fn initial_capacity(content_length: Option<u64>) -> usize {
    content_length.unwrap_or(0).min(MAX_PREALLOC) as usize
}

/// HTTP GET → whole body in memory.
///
/// Fails on any non-2xx status. Each body chunk must arrive within
/// [`HttpConfig::read_timeout`], otherwise the read fails with `TimedOut`.
/// `pb` is switched to a byte bar once the content length is known.
pub fn fetch_bytes(url: &str, pb: &ProgressBar) -> Result<Vec<u8>, FetchError> {
    let read_timeout = http_config().read_timeout;

    SHARED_RUNTIME.handle().block_on(async {
        let mut response = SHARED_CLIENT
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(FetchError::from_reqwest)?;

        let total = response.content_length();
        if let Some(total) = total {
            upgrade_to_bar(pb, total);
        }

        let mut body = Vec::with_capacity(initial_capacity(total));
        loop {
            let chunk = tokio::time::timeout(read_timeout, response.chunk())
                .await
                .map_err(|_| {
                    std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("read timeout ({}s with no data)", read_timeout.as_secs()),
                    )
                })?
                .map_err(FetchError::from_reqwest)?;

            match chunk {
                Some(bytes) => {
                    pb.inc(bytes.len() as u64);
                    body.extend_from_slice(&bytes);
                }
                None => break,
            }
        }

        log::debug!("fetched {} bytes from {url}", body.len());
        Ok::<_, FetchError>(body)
    })
}
