//! microCMS list API connector.
//!
//! Fetches every record of the `categories` and `terms` endpoints with
//! `limit`/`offset` paging. The first page reveals `totalCount`; the
//! remaining pages are requested concurrently on a [`JoinSet`] and
//! reassembled in offset order.
//!
//! Requests authenticate with the `X-MICROCMS-API-KEY` header. Transport
//! errors, HTTP 429 and 5xx are retried with exponential backoff up to
//! `max_retries` times; other 4xx responses fail immediately.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::cms::{MicroCmsList, RawCategory, RawRecord, RawTerm};
use crate::config::MicroCmsConfig;
use crate::traits::{Connector, ContentBatch};

pub const API_KEY_HEADER: &str = "X-MICROCMS-API-KEY";

#[derive(Clone)]
struct PageFetcher {
    client: reqwest::Client,
    api_root: String,
    api_key: String,
    page_size: usize,
    max_retries: u32,
}

impl PageFetcher {
    fn page_url(&self, endpoint: &str, offset: usize) -> String {
        format!(
            "{}/{}?limit={}&offset={}",
            self.api_root, endpoint, self.page_size, offset
        )
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        offset: usize,
    ) -> Result<MicroCmsList<T>> {
        let url = self.page_url(endpoint, offset);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // 1s, 2s, 4s, ... capped at 32s
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::debug!(%url, attempt, "retrying after {:?}", delay);
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .get(&url)
                .header(API_KEY_HEADER, &self.api_key)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<MicroCmsList<T>>()
                            .await
                            .with_context(|| format!("Invalid list response from {}", url));
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(anyhow!("microCMS error {}: {}", status, body_text));
                        continue;
                    }
                    bail!("microCMS error {} for {}: {}", status, endpoint, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("microCMS request failed after retries")))
    }
}

/// Offsets of the pages after the first one.
pub fn remaining_offsets(total_count: usize, page_size: usize) -> Vec<usize> {
    if page_size == 0 {
        return Vec::new();
    }
    (1..)
        .map(|page| page * page_size)
        .take_while(|offset| *offset < total_count)
        .collect()
}

pub struct MicroCmsConnector {
    fetcher: PageFetcher,
    terms_endpoint: String,
    categories_endpoint: String,
}

impl MicroCmsConnector {
    /// Build from config, reading the API key from `api_key_env`.
    pub fn from_config(config: &MicroCmsConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow!("{} not set", config.api_key_env))?;
        Self::new(config, api_key)
    }

    pub fn new(config: &MicroCmsConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            fetcher: PageFetcher {
                client,
                api_root: config.api_root()?,
                api_key,
                page_size: config.page_size,
                max_retries: config.max_retries,
            },
            terms_endpoint: config.terms_endpoint.clone(),
            categories_endpoint: config.categories_endpoint.clone(),
        })
    }

    /// Every record of `endpoint`, in CMS order.
    pub async fn fetch_all<T>(&self, endpoint: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let first = self.fetcher.fetch::<T>(endpoint, 0).await?;
        let total = first.total_count;
        let mut contents = first.contents;

        let offsets = remaining_offsets(total, self.fetcher.page_size);
        tracing::info!(
            endpoint,
            total,
            pages = offsets.len() + 1,
            "fetching microCMS list"
        );

        let mut set = JoinSet::new();
        for offset in offsets {
            let fetcher = self.fetcher.clone();
            let endpoint = endpoint.to_string();
            set.spawn(async move { (offset, fetcher.fetch::<T>(&endpoint, offset).await) });
        }

        let mut pages = Vec::new();
        while let Some(joined) = set.join_next().await {
            let (offset, page) = joined?;
            pages.push((offset, page?.contents));
        }
        pages.sort_by_key(|(offset, _)| *offset);
        for (_, page) in pages {
            contents.extend(page);
        }

        if contents.len() != total {
            tracing::warn!(
                endpoint,
                expected = total,
                received = contents.len(),
                "microCMS list changed while paging"
            );
        }
        Ok(contents)
    }
}

#[async_trait]
impl Connector for MicroCmsConnector {
    fn name(&self) -> &str {
        "microcms"
    }

    fn description(&self) -> &str {
        "Categories and terms from the microCMS list API"
    }

    fn connector_type(&self) -> &str {
        "microcms"
    }

    async fn scan(&self) -> Result<ContentBatch> {
        let (categories, terms) = tokio::try_join!(
            self.fetch_all::<RawRecord<RawCategory>>(&self.categories_endpoint),
            self.fetch_all::<RawRecord<RawTerm>>(&self.terms_endpoint),
        )?;
        Ok(ContentBatch { categories, terms })
    }
}
