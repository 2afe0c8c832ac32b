//! Main runner for the SEFAZ-RS pipeline

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use nfce_core::{LinkQueue, ProgressContext, fmt_num};

use crate::config::Config;
use crate::error::LinkError;
use crate::extract::Extractor;
use crate::prepare::{PrepareOutcome, prepare_links};
use crate::record::{NA, NfceRecord};
use crate::sink::{self, SinkOutcome};
use crate::source::{DocumentSource, source_for};

/// Per-link lifecycle, logged at debug level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Pending,
    Fetching,
    Extracting,
    Sunk,
    Failed,
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Sunk => "sunk",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

fn transition(url: &str, state: LinkState) {
    log::debug!("[{state}] {url}");
}

/// Pipeline execution summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total_links: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub remaining: usize,
    pub records_written: usize,
    pub elapsed: Duration,
}

/// Run the pipeline with the source selected by `debug.live_requests`.
pub fn run(config: &Config, progress: &ProgressContext) -> Result<Summary> {
    let mut source = source_for(config);
    run_with_source(config, source.as_mut(), progress)
}

/// Run the pipeline against an explicit document source.
pub fn run_with_source(
    config: &Config,
    source: &mut dyn DocumentSource,
    progress: &ProgressContext,
) -> Result<Summary> {
    let start = Instant::now();
    let links_file = &config.general.links_file;

    if config.general.prepare_input {
        let outcome = prepare_links(links_file, links_file, &config.general.input_column)
            .context("Failed to prepare link store")?;
        if let PrepareOutcome::Prepared { rows } = outcome {
            log::info!("Prepared {} links from export", fmt_num(rows));
        }
    }

    let mut queue = LinkQueue::load(links_file).context("Failed to load link store")?;
    let extractor = Extractor::new(config).context("Invalid selector configuration")?;

    let total_links = queue.total();
    log::info!(
        "Processing {} links ({} source)",
        fmt_num(total_links),
        source.name()
    );

    let output = config.output_path();
    let snapshot = queue.remaining().to_vec();
    let pb = progress.link_bar("links", total_links);
    let mut batch: Vec<NfceRecord> = Vec::new();
    let mut succeeded = 0;
    let mut failed = 0;
    let mut records_written = 0;

    for url in &snapshot {
        transition(url, LinkState::Pending);
        pb.set_message(url.clone());

        match process_link(url, source, &extractor) {
            Ok(record) => {
                if record.access_key == NA {
                    log::warn!("{url}: no access key found in document");
                }
                log::info!("{url}: extracted {} items", record.items.len());

                // Output row first, then the store: a crash in between repeats the link
                if config.general.checkpoint {
                    records_written += write_records(std::slice::from_ref(&record), &output)?;
                    queue.mark_done(url);
                    queue
                        .persist(links_file)
                        .with_context(|| format!("Failed to checkpoint {}", links_file.display()))?;
                } else {
                    batch.push(record);
                    queue.mark_done(url);
                }
                succeeded += 1;
                transition(url, LinkState::Sunk);
            }
            Err(e) => {
                failed += 1;
                log::error!("{url}: {} failed: {e}", e.stage());
                transition(url, LinkState::Failed);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    // Store is only rewritten once the batch is safely in the output table
    records_written += write_records(&batch, &output)?;
    if succeeded == 0 {
        log::warn!("No records extracted; {} left untouched", output.display());
    }
    queue
        .persist(links_file)
        .with_context(|| format!("Failed to write {}", links_file.display()))?;

    let summary = Summary {
        total_links,
        succeeded,
        failed,
        remaining: queue.len(),
        records_written,
        elapsed: start.elapsed(),
    };

    log::info!("=== NFC-e Pipeline Summary ===");
    log::info!(
        "Links: {}/{} succeeded ({} failed)",
        summary.succeeded,
        summary.total_links,
        summary.failed
    );
    log::info!("Records: {} written to {}", summary.records_written, output.display());
    if summary.remaining > 0 {
        log::info!("{} links remaining in {}", summary.remaining, links_file.display());
    } else {
        log::info!("All links processed");
    }
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());

    Ok(summary)
}

/// Append `records` to the output table, returning the rows written.
fn write_records(records: &[NfceRecord], output: &Path) -> Result<usize> {
    match sink::append(records, output)? {
        SinkOutcome::Empty => Ok(0),
        SinkOutcome::Written { rows, created } => {
            let verb = if created { "Created" } else { "Appended to" };
            log::debug!("{verb} {} ({} rows)", output.display(), fmt_num(rows));
            Ok(rows)
        }
    }
}

fn process_link(
    url: &str,
    source: &mut dyn DocumentSource,
    extractor: &Extractor<'_>,
) -> Result<NfceRecord, LinkError> {
    transition(url, LinkState::Fetching);
    let doc = source.fetch(url)?;
    log::debug!("{url}: {} bytes, key {}", doc.html.len(), doc.access_key);

    transition(url, LinkState::Extracting);
    Ok(extractor.extract(&doc.html, url)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::source::FetchedDocument;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    const PAGE: &str = r#"<html><body>
        <span class="chave">4325 0612 3456</span>
        <div class="txtCenter"><div id="u20">MERCADO TESTE</div></div>
        </body></html>"#;

    /// Serves canned pages by URL; anything else fails as a fetch error
    struct MapSource(HashMap<String, String>);

    impl DocumentSource for MapSource {
        fn fetch(&mut self, url: &str) -> Result<FetchedDocument, FetchError> {
            match self.0.get(url) {
                Some(html) => Ok(FetchedDocument {
                    html: html.clone(),
                    access_key: "k".to_string(),
                }),
                None => Err(FetchError::AccessKey {
                    url: url.to_string(),
                }),
            }
        }

        fn name(&self) -> &'static str {
            "map"
        }
    }

    fn setup(links: &str) -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.general.links_file = dir.path().join("links.csv");
        config.general.data_dir = dir.path().join("dados");
        fs::write(&config.general.links_file, links).unwrap();
        (dir, config)
    }

    fn source(pages: &[(&str, &str)]) -> MapSource {
        MapSource(
            pages
                .iter()
                .map(|(u, h)| (u.to_string(), h.to_string()))
                .collect(),
        )
    }

    #[test]
    fn mixed_run_keeps_failures() {
        let (_dir, config) = setup("https://a/?p=1|1\nhttps://b/?p=2|1\nhttps://c/?p=3|1\n");
        let mut src = source(&[("https://a/?p=1|1", PAGE), ("https://c/?p=3|1", "")]);

        let summary = run_with_source(&config, &mut src, &ProgressContext::hidden()).unwrap();

        // b: fetch failure, c: empty document
        assert_eq!(summary.total_links, 3);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.remaining, 2);
        assert_eq!(summary.records_written, 1);
        assert_eq!(
            fs::read_to_string(&config.general.links_file).unwrap(),
            "https://b/?p=2|1\nhttps://c/?p=3|1\n"
        );
    }

    #[test]
    fn full_success_truncates_store() {
        let (_dir, config) = setup("https://a/?p=1|1\n");
        let mut src = source(&[("https://a/?p=1|1", PAGE)]);

        let summary = run_with_source(&config, &mut src, &ProgressContext::hidden()).unwrap();

        assert_eq!(summary.remaining, 0);
        assert_eq!(fs::metadata(&config.general.links_file).unwrap().len(), 0);
        assert!(config.output_path().exists());
    }

    #[test]
    fn all_failures_leave_output_untouched() {
        let (_dir, config) = setup("https://a/?p=1|1\n");
        let mut src = source(&[]);

        let summary = run_with_source(&config, &mut src, &ProgressContext::hidden()).unwrap();

        assert_eq!(summary.records_written, 0);
        assert!(!config.output_path().exists());
        assert_eq!(
            fs::read_to_string(&config.general.links_file).unwrap(),
            "https://a/?p=1|1\n"
        );
    }

    #[test]
    fn duplicate_link_needs_one_success_per_occurrence() {
        let (_dir, config) = setup("https://a/?p=1|1\nhttps://a/?p=1|1\n");
        let mut src = source(&[("https://a/?p=1|1", PAGE)]);

        let summary = run_with_source(&config, &mut src, &ProgressContext::hidden()).unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.remaining, 0);
    }

    /// Records what the store and output table hold when each link is fetched
    struct SnapshotSource {
        inner: MapSource,
        links_file: std::path::PathBuf,
        output: std::path::PathBuf,
        seen: Vec<(String, Option<String>)>,
    }

    impl DocumentSource for SnapshotSource {
        fn fetch(&mut self, url: &str) -> Result<FetchedDocument, FetchError> {
            let store = fs::read_to_string(&self.links_file).unwrap();
            let output = fs::read_to_string(&self.output).ok();
            self.seen.push((store, output));
            self.inner.fetch(url)
        }

        fn name(&self) -> &'static str {
            "snapshot"
        }
    }

    #[test]
    fn checkpoint_writes_record_before_shrinking_store() {
        let (_dir, mut config) = setup("https://a/?p=1|1\nhttps://b/?p=2|1\n");
        config.general.checkpoint = true;
        let mut src = SnapshotSource {
            inner: source(&[("https://a/?p=1|1", PAGE)]),
            links_file: config.general.links_file.clone(),
            output: config.output_path(),
            seen: Vec::new(),
        };

        let summary = run_with_source(&config, &mut src, &ProgressContext::hidden()).unwrap();

        // While b is being fetched, a is already out of the store and in the table
        let (store, output) = &src.seen[1];
        assert_eq!(store, "https://b/?p=2|1\n");
        let output = output.as_deref().expect("output table written mid-run");
        assert!(output.contains("https://a/?p=1|1"));
        assert!(output.contains("MERCADO TESTE"));

        assert_eq!(summary.records_written, 1);
        assert_eq!(
            fs::read_to_string(&config.general.links_file).unwrap(),
            "https://b/?p=2|1\n"
        );
    }

    #[test]
    fn default_mode_leaves_store_untouched_mid_run() {
        let (_dir, config) = setup("https://a/?p=1|1\nhttps://b/?p=2|1\n");
        let mut src = SnapshotSource {
            inner: source(&[("https://a/?p=1|1", PAGE)]),
            links_file: config.general.links_file.clone(),
            output: config.output_path(),
            seen: Vec::new(),
        };

        run_with_source(&config, &mut src, &ProgressContext::hidden()).unwrap();

        let (store, output) = &src.seen[1];
        assert_eq!(store, "https://a/?p=1|1\nhttps://b/?p=2|1\n");
        assert!(output.is_none());
    }

    /// Output path occupied by a directory, so every append fails
    fn block_output(config: &Config) {
        fs::create_dir_all(config.output_path()).unwrap();
    }

    #[test]
    fn sink_failure_keeps_every_link() {
        let (_dir, config) = setup("https://a/?p=1|1\nhttps://b/?p=2|1\n");
        block_output(&config);
        let mut src = source(&[("https://a/?p=1|1", PAGE), ("https://b/?p=2|1", PAGE)]);

        let result = run_with_source(&config, &mut src, &ProgressContext::hidden());

        assert!(result.is_err());
        assert_eq!(
            fs::read_to_string(&config.general.links_file).unwrap(),
            "https://a/?p=1|1\nhttps://b/?p=2|1\n"
        );
    }

    #[test]
    fn checkpoint_sink_failure_keeps_every_link() {
        let (_dir, mut config) = setup("https://a/?p=1|1\nhttps://b/?p=2|1\n");
        config.general.checkpoint = true;
        block_output(&config);
        let mut src = source(&[("https://a/?p=1|1", PAGE), ("https://b/?p=2|1", PAGE)]);

        let result = run_with_source(&config, &mut src, &ProgressContext::hidden());

        assert!(result.is_err());
        assert_eq!(
            fs::read_to_string(&config.general.links_file).unwrap(),
            "https://a/?p=1|1\nhttps://b/?p=2|1\n"
        );
    }

    #[test]
    fn missing_store_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.general.links_file = dir.path().join("absent.csv");
        config.general.prepare_input = false;
        let mut src = source(&[]);

        let err = run_with_source(&config, &mut src, &ProgressContext::hidden()).unwrap_err();
        assert!(format!("{err:#}").contains("not found"));
    }

    #[test]
    fn state_labels() {
        assert_eq!(LinkState::Sunk.to_string(), "sunk");
        assert_eq!(LinkState::Failed.to_string(), "failed");
    }
}
