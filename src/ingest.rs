//! Sync pipeline orchestration.
//!
//! connector scan → validation → upsert (content-hashed) → removal of
//! records missing from the scan → checkpoint. Every sync is a full
//! snapshot of the source, so the stored set always mirrors the last scan.
//! On SQLite the write steps share one transaction; a failed sync leaves
//! the previous snapshot and checkpoint untouched.

use anyhow::{bail, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use glossary_core::models::{Category, Term};
use glossary_core::store::{Store, UpsertOutcome};

use crate::cms::validate_batch;
use crate::config::Config;
use crate::connector_microcms::MicroCmsConnector;
use crate::connector_snapshot::SnapshotConnector;
use crate::sqlite_store::SqliteStore;
use crate::traits::{Connector, ContentBatch};

/// Per-entity write counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteCounts {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
}

impl WriteCounts {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub categories: WriteCounts,
    pub terms: WriteCounts,
    pub rejected: usize,
    pub duplicates: usize,
}

/// Validated content ready to be written.
#[derive(Debug, Clone, Default)]
pub struct ValidatedBatch {
    pub categories: Vec<Category>,
    pub terms: Vec<Term>,
    pub rejected: usize,
    pub duplicates: usize,
}

/// Validate a raw batch and drop repeated ids (first occurrence wins).
pub fn prepare_batch(batch: ContentBatch) -> ValidatedBatch {
    let (categories, rejected_categories) = validate_batch(batch.categories);
    let (terms, rejected_terms) = validate_batch(batch.terms);

    let mut duplicates = 0;
    let categories = dedupe(categories, |c| c.id.clone(), &mut duplicates);
    let terms = dedupe(terms, |t| t.id.clone(), &mut duplicates);

    ValidatedBatch {
        categories,
        terms,
        rejected: rejected_categories.len() + rejected_terms.len(),
        duplicates,
    }
}

fn dedupe<T>(records: Vec<T>, id_of: impl Fn(&T) -> String, duplicates: &mut usize) -> Vec<T> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let id = id_of(r);
            if seen.insert(id.clone()) {
                true
            } else {
                tracing::warn!(%id, "duplicate id in sync batch; keeping the first");
                *duplicates += 1;
                false
            }
        })
        .collect()
}

/// SHA-256 over the record's canonical JSON.
pub fn content_hash<T: Serialize>(record: &T) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(record)?);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write a validated batch so the store mirrors it exactly.
pub async fn apply_batch(store: &dyn Store, batch: &ValidatedBatch) -> Result<SyncReport> {
    let mut report = SyncReport {
        rejected: batch.rejected,
        duplicates: batch.duplicates,
        ..Default::default()
    };

    for category in &batch.categories {
        let outcome = store
            .upsert_category(category, &content_hash(category)?)
            .await?;
        report.categories.record(outcome);
    }
    for term in &batch.terms {
        let outcome = store.upsert_term(term, &content_hash(term)?).await?;
        report.terms.record(outcome);
    }

    let category_ids: Vec<String> = batch.categories.iter().map(|c| c.id.clone()).collect();
    let term_ids: Vec<String> = batch.terms.iter().map(|t| t.id.clone()).collect();
    report.categories.removed = store.retain_categories(&category_ids).await?;
    report.terms.removed = store.retain_terms(&term_ids).await?;

    Ok(report)
}

/// Apply `batch` and record the checkpoint in a single transaction.
/// Returns the report and the checkpoint cursor.
pub async fn commit_sync(
    store: &SqliteStore,
    batch: &ValidatedBatch,
    source: &str,
) -> Result<(SyncReport, String)> {
    let tx = store.begin().await?;
    let report = apply_batch(&tx, batch).await?;
    let cursor = chrono::Utc::now().to_rfc3339();
    tx.set_checkpoint(source, &cursor).await?;
    tx.commit().await?;
    Ok((report, cursor))
}

/// Resolve a connector name from the CLI.
pub fn build_connector(config: &Config, name: &str) -> Result<Box<dyn Connector>> {
    match name {
        "microcms" => match config.connectors.microcms {
            Some(ref cms) => Ok(Box::new(MicroCmsConnector::from_config(cms)?)),
            None => bail!("connectors.microcms is not configured"),
        },
        "snapshot" => match config.connectors.snapshot {
            Some(ref snap) => Ok(Box::new(SnapshotConnector::new(snap))),
            None => bail!("connectors.snapshot is not configured"),
        },
        _ => bail!(
            "Unknown connector: '{}'. Available: microcms, snapshot",
            name
        ),
    }
}

pub async fn run_sync(config: &Config, connector_name: &str, dry_run: bool) -> Result<()> {
    let connector = build_connector(config, connector_name)?;
    tracing::info!(source = %connector.source_label(), "scanning");
    let raw = connector.scan().await?;
    let fetched = (raw.categories.len(), raw.terms.len());
    let batch = prepare_batch(raw);

    if dry_run {
        println!("sync {} (dry-run)", connector_name);
        println!("  fetched: {} categories, {} terms", fetched.0, fetched.1);
        println!(
            "  valid: {} categories, {} terms",
            batch.categories.len(),
            batch.terms.len()
        );
        println!("  rejected: {}", batch.rejected);
        return Ok(());
    }

    if batch.categories.is_empty() && batch.terms.is_empty() {
        tracing::warn!("scan returned no content; the stored snapshot will be emptied");
    }

    let store = SqliteStore::connect(config).await?;
    let (report, cursor) = commit_sync(&store, &batch, &connector.source_label()).await?;

    println!("sync {}", connector_name);
    println!("  fetched: {} categories, {} terms", fetched.0, fetched.1);
    println!("  rejected: {}", report.rejected);
    if report.duplicates > 0 {
        println!("  duplicates skipped: {}", report.duplicates);
    }
    print_counts("categories", &report.categories);
    print_counts("terms", &report.terms);
    println!("  checkpoint: {}", cursor);
    println!("ok");

    store.close().await;
    Ok(())
}

fn print_counts(label: &str, counts: &WriteCounts) {
    println!(
        "  {}: {} inserted, {} updated, {} unchanged, {} removed",
        label, counts.inserted, counts.updated, counts.unchanged, counts.removed
    );
}
