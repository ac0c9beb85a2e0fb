//! In-memory [`Store`] implementation for tests and embedding.
//!
//! Uses `Vec`s behind `std::sync::RwLock`; records keep the order in which
//! they were first inserted.

use std::sync::{PoisonError, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{Category, Term};

use super::{Store, StoreCounts, UpsertOutcome};

struct Row<T> {
    record: T,
    hash: String,
}

/// In-memory store.
pub struct InMemoryStore {
    categories: RwLock<Vec<Row<Category>>>,
    terms: RwLock<Vec<Row<Term>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            categories: RwLock::new(Vec::new()),
            terms: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

fn upsert<T: Clone>(
    rows: &mut Vec<Row<T>>,
    id_of: impl Fn(&T) -> &str,
    record: &T,
    hash: &str,
) -> UpsertOutcome {
    let id = id_of(record);
    match rows.iter_mut().find(|r| id_of(&r.record) == id) {
        Some(row) if row.hash == hash => UpsertOutcome::Unchanged,
        Some(row) => {
            row.record = record.clone();
            row.hash = hash.to_string();
            UpsertOutcome::Updated
        }
        None => {
            rows.push(Row {
                record: record.clone(),
                hash: hash.to_string(),
            });
            UpsertOutcome::Inserted
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn upsert_category(
        &self,
        category: &Category,
        content_hash: &str,
    ) -> Result<UpsertOutcome> {
        let mut rows = self.categories.write().map_err(poisoned)?;
        Ok(upsert(&mut rows, |c: &Category| c.id.as_str(), category, content_hash))
    }

    async fn upsert_term(&self, term: &Term, content_hash: &str) -> Result<UpsertOutcome> {
        let mut rows = self.terms.write().map_err(poisoned)?;
        Ok(upsert(&mut rows, |t: &Term| t.id.as_str(), term, content_hash))
    }

    async fn retain_categories(&self, keep: &[String]) -> Result<usize> {
        let mut rows = self.categories.write().map_err(poisoned)?;
        let before = rows.len();
        rows.retain(|r| keep.contains(&r.record.id));
        Ok(before - rows.len())
    }

    async fn retain_terms(&self, keep: &[String]) -> Result<usize> {
        let mut rows = self.terms.write().map_err(poisoned)?;
        let before = rows.len();
        rows.retain(|r| keep.contains(&r.record.id));
        Ok(before - rows.len())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = self.categories.read().map_err(poisoned)?;
        Ok(rows.iter().map(|r| r.record.clone()).collect())
    }

    async fn list_terms(&self) -> Result<Vec<Term>> {
        let rows = self.terms.read().map_err(poisoned)?;
        Ok(rows.iter().map(|r| r.record.clone()).collect())
    }

    async fn get_term(&self, id_or_slug: &str) -> Result<Option<Term>> {
        let rows = self.terms.read().map_err(poisoned)?;
        let by_id = rows.iter().find(|r| r.record.id == id_or_slug);
        let found = by_id.or_else(|| rows.iter().find(|r| r.record.slug == id_or_slug));
        Ok(found.map(|r| r.record.clone()))
    }

    async fn counts(&self) -> Result<StoreCounts> {
        let categories = self.categories.read().map_err(poisoned)?;
        let terms = self.terms.read().map_err(poisoned)?;
        Ok(StoreCounts {
            categories: categories.len(),
            terms: terms.len(),
            categorized_terms: terms
                .iter()
                .filter(|r| r.record.category_id.is_some())
                .count(),
            recommended_terms: terms.iter().filter(|r| r.record.is_recommended).count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_outcomes() {
        let store = InMemoryStore::new();
        let term = Term::new("t1", "DNS");
        assert_eq!(store.upsert_term(&term, "h1").await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(store.upsert_term(&term, "h1").await.unwrap(), UpsertOutcome::Unchanged);

        let mut renamed = term.clone();
        renamed.title = "Domain Name System".to_string();
        assert_eq!(store.upsert_term(&renamed, "h2").await.unwrap(), UpsertOutcome::Updated);

        let terms = store.list_terms().await.unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].title, "Domain Name System");
    }

    #[tokio::test]
    async fn test_retain_removes_missing() {
        let store = InMemoryStore::new();
        for id in ["a", "b", "c"] {
            store.upsert_category(&Category::new(id, id), id).await.unwrap();
        }
        let removed = store
            .retain_categories(&["a".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        let ids: Vec<String> = store
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_get_term_by_id_or_slug() {
        let store = InMemoryStore::new();
        let mut term = Term::new("x9", "Kerberos");
        term.slug = "kerberos".to_string();
        store.upsert_term(&term, "h").await.unwrap();

        assert!(store.get_term("x9").await.unwrap().is_some());
        assert!(store.get_term("kerberos").await.unwrap().is_some());
        assert!(store.get_term("ldap").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_counts() {
        let store = InMemoryStore::new();
        let mut a = Term::new("a", "A");
        a.category_id = Some("c".to_string());
        a.is_recommended = true;
        store.upsert_term(&a, "1").await.unwrap();
        store.upsert_term(&Term::new("b", "B"), "2").await.unwrap();
        store.upsert_category(&Category::new("c", "C"), "3").await.unwrap();

        let counts = store.counts().await.unwrap();
        assert_eq!(
            counts,
            StoreCounts {
                categories: 1,
                terms: 2,
                categorized_terms: 1,
                recommended_terms: 1,
            }
        );
    }
}
