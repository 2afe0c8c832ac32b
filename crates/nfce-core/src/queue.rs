//! Persisted link queue with remove-on-success semantics
//!
//! The backing store is a single-column file, one URL per line, no header.
//! A run loads it, marks links done as they succeed, and writes back only the
//! links that are still pending.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Failure to hydrate the queue from its backing store.
#[derive(Debug)]
pub enum QueueError {
    /// Store file does not exist
    Missing(PathBuf),
    /// Store exists but holds zero links
    Empty(PathBuf),
    /// Any other I/O failure while reading
    Io(PathBuf, io::Error),
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(p) => write!(f, "link store not found: {}", p.display()),
            Self::Empty(p) => write!(f, "link store is empty: {}", p.display()),
            Self::Io(p, e) => write!(f, "failed to read {}: {e}", p.display()),
        }
    }
}

impl std::error::Error for QueueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            _ => None,
        }
    }
}

/// Ordered list of pending links.
///
/// Removal is by value and only drops the first occurrence, so a URL listed
/// twice needs two successes to leave the queue.
#[derive(Debug, Clone)]
pub struct LinkQueue {
    links: Vec<String>,
    total: usize,
}

impl LinkQueue {
    /// Create queue from in-memory links
    pub fn new(links: Vec<String>) -> Self {
        let total = links.len();
        Self { links, total }
    }

    /// Read the single-column store at `source`.
    pub fn load(source: &Path) -> Result<Self, QueueError> {
        let content = match fs::read_to_string(source) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(QueueError::Missing(source.to_path_buf()));
            }
            Err(e) => return Err(QueueError::Io(source.to_path_buf(), e)),
        };

        let links: Vec<String> = content.lines().filter_map(parse_line).collect();
        if links.is_empty() {
            return Err(QueueError::Empty(source.to_path_buf()));
        }
        log::debug!("{} links loaded from {}", links.len(), source.display());
        Ok(Self::new(links))
    }

    /// Links not yet marked done, in original relative order
    pub fn remaining(&self) -> &[String] {
        &self.links
    }

    /// Drop the first occurrence of `url`. Returns false if it was not queued.
    pub fn mark_done(&mut self, url: &str) -> bool {
        match self.links.iter().position(|l| l == url) {
            Some(i) => {
                self.links.remove(i);
                true
            }
            None => false,
        }
    }

    /// Overwrite `destination` with the remaining links.
    ///
    /// An empty queue truncates the file to zero bytes.
    pub fn persist(&self, destination: &Path) -> io::Result<()> {
        let mut file = fs::File::create(destination)?;
        for link in &self.links {
            writeln!(file, "{link}")?;
        }
        file.sync_all()
    }

    /// Links held at load time
    pub fn total(&self) -> usize {
        self.total
    }

    /// Links still pending
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// One store row → link. Blank rows are skipped; a CSV-quoted cell is unwrapped.
fn parse_line(line: &str) -> Option<String> {
    let cell = line.trim();
    let cell = cell
        .strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .map(|c| c.replace("\"\"", "\""))
        .unwrap_or_else(|| cell.to_string());
    (!cell.is_empty()).then_some(cell)
}
