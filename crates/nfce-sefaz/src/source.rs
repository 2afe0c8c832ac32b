//! Where raw receipt pages come from
//!
//! Two interchangeable sources: [`LiveSource`] fetches over HTTP and keeps a
//! copy of every page, [`ReplaySource`] serves one stored page for every link
//! so selectors can be tuned offline.

use std::fs;

use nfce_core::{Throttle, get_text};

use crate::config::Config;
use crate::error::FetchError;
use crate::record::DEBUG_ACCESS_KEY;

/// Query parameter carrying the access key in SEFAZ-RS consultation URLs
const KEY_MARKER: &str = "p=";
/// Separator ending the access key inside the `p` parameter
const KEY_DELIMITER: char = '|';

/// Raw page plus the key it was filed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub html: String,
    pub access_key: String,
}

/// A way of turning a link into its raw page.
pub trait DocumentSource {
    fn fetch(&mut self, url: &str) -> Result<FetchedDocument, FetchError>;

    /// Short label for logs
    fn name(&self) -> &'static str;
}

/// Access key embedded in a consultation URL: the text between `p=` and `|`.
pub fn access_key_from_url(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once(KEY_MARKER)?;
    let key = rest.split(KEY_DELIMITER).next().unwrap_or_default();
    let usable = !key.is_empty() && !key.contains(['/', '\\']) && !key.contains("..");
    usable.then_some(key)
}

/// Fetches pages over HTTP, throttled, saving each under its access key.
pub struct LiveSource<'c> {
    config: &'c Config,
    throttle: Throttle,
}

impl<'c> LiveSource<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            throttle: Throttle::new(config.request_interval()),
        }
    }
}

impl DocumentSource for LiveSource<'_> {
    fn fetch(&mut self, url: &str) -> Result<FetchedDocument, FetchError> {
        // Every link after the first waits, even one that fails before the request
        self.throttle.wait();

        let access_key = access_key_from_url(url)
            .ok_or_else(|| FetchError::AccessKey {
                url: url.to_string(),
            })?
            .to_string();
        log::debug!("access key from link: {access_key}");

        let html = get_text(url, self.config.timeout()).map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

        let path = self.config.artifact_path(&access_key);
        fs::create_dir_all(&self.config.general.data_dir)
            .and_then(|()| fs::write(&path, &html))
            .map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            })?;
        log::info!("Saved page to {}", path.display());

        Ok(FetchedDocument { html, access_key })
    }

    fn name(&self) -> &'static str {
        "live"
    }
}

/// Serves the stored page named by `debug.access_key`; never touches the network.
pub struct ReplaySource<'c> {
    config: &'c Config,
}

impl<'c> ReplaySource<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }
}

impl DocumentSource for ReplaySource<'_> {
    fn fetch(&mut self, url: &str) -> Result<FetchedDocument, FetchError> {
        let path = self.config.artifact_path(&self.config.debug.access_key);
        log::debug!("replaying {} for {url}", path.display());
        let html = fs::read_to_string(&path).map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(FetchedDocument {
            html,
            access_key: DEBUG_ACCESS_KEY.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

/// Source selected by `debug.live_requests`
pub fn source_for(config: &Config) -> Box<dyn DocumentSource + '_> {
    if config.debug.live_requests {
        Box::new(LiveSource::new(config))
    } else {
        log::info!("Debug mode: replaying stored page instead of fetching");
        Box::new(ReplaySource::new(config))
    }
}
