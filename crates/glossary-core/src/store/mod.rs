//! Storage abstraction for the glossary snapshot.
//!
//! The [`Store`] trait holds the synced Category and Term records. The
//! algorithms never talk to a store directly; application code loads a
//! snapshot through it and hands plain slices to [`crate::rank`],
//! [`crate::tree`], and [`crate::alphabet`].
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::models::{Category, Term};

/// Outcome of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Row counts of a stored snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub categories: usize,
    pub terms: usize,
    pub categorized_terms: usize,
    pub recommended_terms: usize,
}

/// Abstract storage backend for synced glossary content.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_category`](Store::upsert_category) | Insert or update a category |
/// | [`upsert_term`](Store::upsert_term) | Insert or update a term |
/// | [`retain_categories`](Store::retain_categories) | Delete categories not in the id set |
/// | [`retain_terms`](Store::retain_terms) | Delete terms not in the id set |
/// | [`list_categories`](Store::list_categories) | All categories in sync order |
/// | [`list_terms`](Store::list_terms) | All terms in sync order |
/// | [`get_term`](Store::get_term) | Look up a term by id or slug |
/// | [`counts`](Store::counts) | Row counts for stats |
#[async_trait]
pub trait Store: Send + Sync {
    /// `content_hash` lets the store report unchanged rows.
    async fn upsert_category(&self, category: &Category, content_hash: &str)
        -> Result<UpsertOutcome>;

    async fn upsert_term(&self, term: &Term, content_hash: &str) -> Result<UpsertOutcome>;

    /// Delete every category whose id is not in `keep`. Returns the number removed.
    async fn retain_categories(&self, keep: &[String]) -> Result<usize>;

    /// Delete every term whose id is not in `keep`. Returns the number removed.
    async fn retain_terms(&self, keep: &[String]) -> Result<usize>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn list_terms(&self) -> Result<Vec<Term>>;

    /// Id match wins over slug match.
    async fn get_term(&self, id_or_slug: &str) -> Result<Option<Term>>;

    async fn counts(&self) -> Result<StoreCounts>;
}
