//! Blocking HTTP GET with a per-request timeout.
//!
//! Uses async reqwest internally on a shared runtime, but presents a sync
//! interface so the pipeline loop stays single-threaded and sequential.

use std::sync::LazyLock;
use std::time::Duration;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Identify ourselves; some SEFAZ frontends reject requests without a UA.
const USER_AGENT: &str = concat!("nfce-scrape/", env!("CARGO_PKG_VERSION"));

/// Error types for HTTP operations
#[derive(Debug)]
pub enum HttpError {
    /// Server answered with a non-success status
    Status { status: u16, message: String },
    /// Transport failure (DNS, connect, TLS, body read)
    Transport(String),
    /// No complete response within the configured timeout
    Timeout(Duration),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::Transport(message) => write!(f, "HTTP error: {message}"),
            Self::Timeout(after) => write!(f, "HTTP timeout after {}s", after.as_secs()),
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    /// Create HTTP error from reqwest error
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        match e.status() {
            Some(s) => Self::Status {
                status: s.as_u16(),
                message: e.to_string(),
            },
            None => Self::Transport(e.to_string()),
        }
    }

    /// Status code, when the server got far enough to send one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime for HTTP operations.
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// HTTP GET → response body as text.
///
/// `timeout` bounds the whole exchange (connect, headers and body).
/// Non-2xx statuses are errors.
pub fn get_text(url: &str, timeout: Duration) -> Result<String, HttpError> {
    SHARED_RUNTIME.handle().block_on(async {
        let request = async {
            let response = SHARED_CLIENT
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| HttpError::from_reqwest(&e))?;
            log::debug!("{url}: {}", response.status());
            response
                .text()
                .await
                .map_err(|e| HttpError::from_reqwest(&e))
        };

        match tokio::time::timeout(timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(HttpError::Timeout(timeout)),
        }
    })
}
