//! Selector and runtime configuration for the SEFAZ-RS pipeline
//!
//! Loaded once from TOML at startup and then passed around by reference.
//! Every section is `#[serde(default)]`, so a file only needs the keys it
//! wants to change.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default configuration file, written by `nfce init`
pub const DEFAULT_TOML: &str = include_str!("../nfce.default.toml");

/// Runtime configuration for the SEFAZ-RS pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub metadata: Metadata,
    pub general: GeneralConfig,
    pub debug: DebugConfig,
    pub issuer: IssuerSelectors,
    pub totals: TotalsSelectors,
    pub items: ItemSelectors,
    pub consumer: ConsumerSelectors,
}

/// Informational only; not read by the pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub config_version: String,
    pub updated: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Single-column link store
    pub links_file: PathBuf,
    /// Run the column-extraction step on `links_file` before loading it
    pub prepare_input: bool,
    /// Header of the URL column in a multi-column export
    pub input_column: String,
    /// Class of the `span` holding the access key
    pub access_key_class: String,
    /// Directory for the output table and raw HTML artifacts
    pub data_dir: PathBuf,
    /// Output table file name inside `data_dir`
    pub output_file: String,
    /// Prefix for raw HTML artifacts: `<prefix><access key>.html`
    pub html_prefix: String,
    pub request_interval_secs: u64,
    pub timeout_secs: u64,
    /// Persist the link store after every success, not only at the end
    pub checkpoint: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            links_file: PathBuf::from("links.csv"),
            prepare_input: true,
            input_column: "text".to_string(),
            access_key_class: "chave".to_string(),
            data_dir: PathBuf::from("dados"),
            output_file: "dados_nfe.csv".to_string(),
            html_prefix: "response_rs_".to_string(),
            request_interval_secs: 5,
            timeout_secs: 30,
            checkpoint: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// `false` replays a stored page instead of fetching
    pub live_requests: bool,
    /// Access key naming the stored page to replay
    pub access_key: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            live_requests: true,
            access_key: "chave_acesso".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuerSelectors {
    /// Class of the issuer `div`
    pub container_class: String,
    /// Id of the `div` with the issuer name
    pub name_id: String,
    /// Class shared by the CNPJ and address `div`s
    pub detail_class: String,
}

impl Default for IssuerSelectors {
    fn default() -> Self {
        Self {
            container_class: "txtCenter".to_string(),
            name_id: "u20".to_string(),
            detail_class: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TotalsSelectors {
    pub container_id: String,
    /// Id repeated on every totals row
    pub row_id: String,
    pub value_class: String,
}

impl Default for TotalsSelectors {
    fn default() -> Self {
        Self {
            container_id: "totalNota".to_string(),
            row_id: "linhaTotal".to_string(),
            value_class: "totalNumb".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemSelectors {
    pub table_id: String,
    /// Regex searched in each `tr` id ("Item + 1", "Item + 2", ...)
    pub row_id_pattern: String,
    pub name_class: String,
    pub quantity_class: String,
    pub unit_class: String,
    pub unit_value_class: String,
    pub total_class: String,
}

impl Default for ItemSelectors {
    fn default() -> Self {
        Self {
            table_id: "tabResult".to_string(),
            row_id_pattern: r"Item \+ \d+".to_string(),
            name_class: "txtTit".to_string(),
            quantity_class: "Rqtd".to_string(),
            unit_class: "RUN".to_string(),
            unit_value_class: "RvlUnit".to_string(),
            total_class: "valor".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerSelectors {
    /// `data-role` of the collapsible sections
    pub container_role: String,
    /// Text the section's `h4` must contain
    pub heading_text: String,
    /// `data-role` of the `ul` inside the section
    pub list_role: String,
}

impl Default for ConsumerSelectors {
    fn default() -> Self {
        Self {
            container_role: "collapsible".to_string(),
            heading_text: "Consumidor".to_string(),
            list_role: "listview".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would fail on every document.
    pub fn validate(&self) -> Result<()> {
        regex::Regex::new(&self.items.row_id_pattern).with_context(|| {
            format!(
                "items.row_id_pattern is not a valid regex: {}",
                self.items.row_id_pattern
            )
        })?;
        if self.general.output_file.trim().is_empty() {
            anyhow::bail!("general.output_file must not be empty");
        }
        Ok(())
    }

    /// Output table path
    pub fn output_path(&self) -> PathBuf {
        self.general.data_dir.join(&self.general.output_file)
    }

    /// Raw HTML artifact path for an access key
    pub fn artifact_path(&self, access_key: &str) -> PathBuf {
        self.general
            .data_dir
            .join(format!("{}{access_key}.html", self.general.html_prefix))
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_secs(self.general.request_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.general.timeout_secs)
    }
}
