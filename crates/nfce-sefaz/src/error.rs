//! Per-link error types
//!
//! Everything here is recoverable: the runner logs it, keeps the link queued
//! for the next run and moves on.

use std::path::PathBuf;

use nfce_core::HttpError;

/// Failure to obtain the raw document for a link.
#[derive(Debug)]
pub enum FetchError {
    /// Transport failure or non-2xx status
    Http { url: String, source: HttpError },
    /// URL carries no `p=` access key
    AccessKey { url: String },
    /// Reading a replay document or writing an artifact
    Io { path: PathBuf, source: std::io::Error },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http { url, source } => write!(f, "fetch {url}: {source}"),
            Self::AccessKey { url } => write!(f, "no access key (p=...) in {url}"),
            Self::Io { path, source } => write!(f, "IO {}: {source}", path.display()),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::AccessKey { .. } => None,
        }
    }
}

/// Failure to turn a raw document into a record.
///
/// A selector that simply matches nothing is *not* an error; the field
/// becomes `"N/A"`.
#[derive(Debug, PartialEq, Eq)]
pub enum ExtractionError {
    /// Input has no parseable element content
    Unparseable,
    /// A located block lacks a node it cannot exist without
    Structure(String),
    /// A configured pattern does not compile
    Selector(String),
}

impl std::fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unparseable => write!(f, "document could not be parsed"),
            Self::Structure(msg) => write!(f, "unexpected page structure: {msg}"),
            Self::Selector(msg) => write!(f, "invalid selector pattern: {msg}"),
        }
    }
}

impl std::error::Error for ExtractionError {}

/// Any per-link failure.
#[derive(Debug)]
pub enum LinkError {
    Fetch(FetchError),
    Extract(ExtractionError),
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "{e}"),
            Self::Extract(e) => write!(f, "extraction: {e}"),
        }
    }
}

impl std::error::Error for LinkError {}

impl From<FetchError> for LinkError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

impl From<ExtractionError> for LinkError {
    fn from(e: ExtractionError) -> Self {
        Self::Extract(e)
    }
}

impl LinkError {
    /// Short label for the failure stage, used in the per-link error log
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Extract(_) => "extract",
        }
    }
}
