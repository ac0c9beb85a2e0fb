use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glossary_core::tree::TreeOptions;

/// Env var consulted when `connectors.microcms.service_domain` is absent.
pub const SERVICE_DOMAIN_ENV: &str = "MICROCMS_SERVICE_DOMAIN";

/// microCMS caps list requests at 100 items.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub tree: TreeConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub connectors: ConnectorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_final_limit")]
    pub final_limit: usize,
    #[serde(default = "default_recommended_limit")]
    pub recommended_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            final_limit: default_final_limit(),
            recommended_limit: default_recommended_limit(),
        }
    }
}

fn default_final_limit() -> usize {
    50
}
fn default_recommended_limit() -> usize {
    6
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TreeConfig {
    #[serde(default)]
    pub sort_terms_by_title: bool,
    /// Category id → sibling position, replacing the CMS value.
    #[serde(default)]
    pub order: HashMap<String, i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(default = "default_site_url")]
    pub site_url: String,
}

fn default_site_url() -> String {
    "http://localhost:3000".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConnectorsConfig {
    pub microcms: Option<MicroCmsConfig>,
    pub snapshot: Option<SnapshotConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MicroCmsConfig {
    #[serde(default)]
    pub service_domain: Option<String>,
    /// Overrides `https://{service_domain}.microcms.io/api/v1`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_terms_endpoint")]
    pub terms_endpoint: String,
    #[serde(default = "default_categories_endpoint")]
    pub categories_endpoint: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_key_env() -> String {
    "MICROCMS_API_KEY".to_string()
}
fn default_terms_endpoint() -> String {
    "terms".to_string()
}
fn default_categories_endpoint() -> String {
    "categories".to_string()
}
fn default_page_size() -> usize {
    MAX_PAGE_SIZE
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}

impl MicroCmsConfig {
    /// API root, from `base_url`, `service_domain`, or the env var, in that order.
    pub fn api_root(&self) -> Result<String> {
        if let Some(ref base) = self.base_url {
            return Ok(base.trim_end_matches('/').to_string());
        }
        let domain = match self.service_domain.clone() {
            Some(d) if !d.trim().is_empty() => d,
            _ => std::env::var(SERVICE_DOMAIN_ENV).map_err(|_| {
                anyhow::anyhow!(
                    "connectors.microcms.service_domain is not set and {} is missing",
                    SERVICE_DOMAIN_ENV
                )
            })?,
        };
        Ok(format!("https://{}.microcms.io/api/v1", domain.trim()))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotConfig {
    pub path: PathBuf,
}

impl Config {
    pub fn tree_options(&self) -> TreeOptions {
        TreeOptions {
            sort_terms_by_title: self.tree.sort_terms_by_title,
            order_overrides: self.tree.order.clone(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Parse and validate a TOML config document.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.search.final_limit < 1 {
        anyhow::bail!("search.final_limit must be >= 1");
    }
    if config.search.recommended_limit < 1 {
        anyhow::bail!("search.recommended_limit must be >= 1");
    }
    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    if let Some(ref cms) = config.connectors.microcms {
        if cms.page_size == 0 || cms.page_size > MAX_PAGE_SIZE {
            anyhow::bail!(
                "connectors.microcms.page_size must be in 1..={}",
                MAX_PAGE_SIZE
            );
        }
        if cms.api_key_env.trim().is_empty() {
            anyhow::bail!("connectors.microcms.api_key_env must not be empty");
        }
    }

    Ok(config)
}
