//! nfce-core - Common infrastructure for receipt scraping pipelines
//!
//! This crate provides the reusable pieces: a persisted link queue,
//! a throttled blocking HTTP fetch, an append-only CSV sink, and
//! console/file logging that cooperates with progress bars.

pub mod http;
pub mod logging;
pub mod progress;
pub mod queue;
pub mod sink;
pub mod throttle;

// Re-exports for convenience
pub use http::{HttpError, get_text};
pub use logging::{PipelineLogger, daily_log_path, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use queue::{LinkQueue, QueueError};
pub use sink::CsvSink;
pub use throttle::Throttle;
