//! f5500 core - shared infrastructure for the Form 5500 dataset archive
//!
//! HTTP transport, retry policy, progress reporting and logging used by
//! the archive engine and the CLI.

pub mod fetch;
pub mod logging;
pub mod progress;
pub mod retry;

// Re-exports for convenience
pub use fetch::{
    FetchError, HttpConfig, SHARED_RUNTIME, fetch_bytes, http_client, http_config,
    set_http_config,
};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_bytes};
pub use retry::retry_with_backoff;
