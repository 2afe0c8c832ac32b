//! NFC-e SEFAZ-RS - consumer tax receipt scraping pipeline
//!
//! Turns a list of receipt consultation links (usually scanned from QR
//! codes) into rows of a CSV table: issuer, totals, line items and consumer.
//!
//! # Features
//!
//! - Remove-on-success link store: failed links stay queued for the next run
//! - Every selector is configurable, absent fields become `"N/A"`
//! - Replay mode: re-extract a stored page without touching the network
//!
//! # Example
//!
//! ```ignore
//! use nfce_core::ProgressContext;
//! use nfce_sefaz::{Config, run};
//!
//! let config = Config::from_file("nfce.toml".as_ref())?;
//! let summary = run(&config, &ProgressContext::new())?;
//! println!("{} links remaining", summary.remaining);
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod prepare;
pub mod record;
pub mod runner;
pub mod sink;
pub mod source;

// Re-exports
pub use config::Config;
pub use error::{ExtractionError, FetchError, LinkError};
pub use extract::{Extractor, extract};
pub use prepare::{PrepareOutcome, prepare_links};
pub use record::{LineItem, NfceRecord};
pub use runner::{Summary, run, run_with_source};
pub use source::{DocumentSource, FetchedDocument, LiveSource, ReplaySource};
