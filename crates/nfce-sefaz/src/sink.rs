//! Result sink: append extracted records to the output table

use std::path::Path;

use anyhow::{Context, Result};
use nfce_core::CsvSink;

use crate::record::{NfceRecord, OutputRow};

/// What [`append`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOutcome {
    /// Batch was empty; the table was left untouched
    Empty,
    /// Rows appended (header included if the table was new)
    Written { rows: usize, created: bool },
}

/// Append `records` to the CSV table at `destination`.
///
/// Line items are flattened into one JSON cell per record. The header is
/// only written when the table does not exist yet.
pub fn append(records: &[NfceRecord], destination: &Path) -> Result<SinkOutcome> {
    if records.is_empty() {
        return Ok(SinkOutcome::Empty);
    }

    let created = !destination.exists();
    let rows: Vec<OutputRow<'_>> = records.iter().map(NfceRecord::to_row).collect();
    let written = CsvSink::new(destination)
        .append(&rows)
        .with_context(|| format!("Failed to write {}", destination.display()))?;

    Ok(SinkOutcome::Written {
        rows: written,
        created,
    })
}
