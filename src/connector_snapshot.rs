//! Local JSON snapshot connector.
//!
//! Reads a file shaped like `{"categories": [...], "terms": [...]}` where
//! each list is either a bare array or a microCMS list envelope
//! (`{"contents": [...], "totalCount": ...}`). Records use the same raw
//! shape as the live API, so a saved API response can be synced offline.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cms::{MicroCmsList, RawCategory, RawRecord, RawTerm};
use crate::config::SnapshotConfig;
use crate::traits::{Connector, ContentBatch};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawList<T> {
    Bare(Vec<T>),
    Envelope(MicroCmsList<T>),
}

impl<T> RawList<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            RawList::Bare(v) => v,
            RawList::Envelope(page) => page.contents,
        }
    }
}

#[derive(Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    categories: Option<RawList<RawRecord<RawCategory>>>,
    #[serde(default)]
    terms: Option<RawList<RawRecord<RawTerm>>>,
}

/// Parse snapshot JSON text into a batch.
pub fn parse_snapshot(text: &str) -> Result<ContentBatch> {
    let file: SnapshotFile =
        serde_json::from_str(text).with_context(|| "Failed to parse snapshot JSON")?;
    Ok(ContentBatch {
        categories: file.categories.map(RawList::into_vec).unwrap_or_default(),
        terms: file.terms.map(RawList::into_vec).unwrap_or_default(),
    })
}

pub fn read_snapshot(path: &Path) -> Result<ContentBatch> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    parse_snapshot(&text).with_context(|| format!("in {}", path.display()))
}

pub struct SnapshotConnector {
    path: PathBuf,
}

impl SnapshotConnector {
    pub fn new(config: &SnapshotConfig) -> Self {
        Self {
            path: config.path.clone(),
        }
    }
}

#[async_trait]
impl Connector for SnapshotConnector {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn description(&self) -> &str {
        "Categories and terms from a local JSON snapshot"
    }

    fn connector_type(&self) -> &str {
        "snapshot"
    }

    async fn scan(&self) -> Result<ContentBatch> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_snapshot(&path)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_arrays() {
        let batch = parse_snapshot(
            r#"{"categories": [{"id": "c", "name": "C"}], "terms": [{"id": "t", "title": "T"}]}"#,
        )
        .unwrap();
        assert_eq!(batch.categories.len(), 1);
        assert_eq!(batch.terms.len(), 1);
    }

    #[test]
    fn test_envelopes_and_missing_lists() {
        let batch = parse_snapshot(
            r#"{"terms": {"contents": [{"id": "a", "title": "A"}, {"id": "b", "title": "B"}], "totalCount": 2, "offset": 0, "limit": 100}}"#,
        )
        .unwrap();
        assert!(batch.categories.is_empty());
        assert_eq!(batch.terms.len(), 2);
    }

    #[test]
    fn test_badly_typed_record_is_rejected_alone() {
        let batch = parse_snapshot(
            r#"{"terms": {"contents": [
                {"id": "a", "title": "A"},
                {"id": "b", "title": "B", "order": "2"},
                {"id": "c", "title": "C"}
            ]}}"#,
        )
        .unwrap();
        let prepared = crate::ingest::prepare_batch(batch);
        let ids: Vec<&str> = prepared.terms.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(prepared.rejected, 1);
    }

    #[test]
    fn test_invalid_json_errors() {
        assert!(parse_snapshot("[1, 2").is_err());
    }

    #[tokio::test]
    async fn test_scan_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, r#"{"categories": [], "terms": [{"id": "t", "title": "T"}]}"#)
            .unwrap();
        let connector = SnapshotConnector::new(&SnapshotConfig { path });
        let batch = connector.scan().await.unwrap();
        assert_eq!(batch.terms.len(), 1);
        assert_eq!(connector.source_label(), "snapshot:snapshot");
    }
}
