//! Term retrieval by id or slug.
//!
//! Used by both `glossary get` and `GET /api/terms/{id_or_slug}`. The
//! detail view carries the category breadcrumb (root first) and the
//! related terms that still exist in the store.

use anyhow::Result;
use serde::Serialize;

use glossary_core::models::{Category, Term};
use glossary_core::store::Store;
use glossary_core::tree::ancestors_of;

use crate::config::Config;
use crate::errors::LookupError;
use crate::sqlite_store::SqliteStore;

/// Compact reference to another term.
#[derive(Debug, Clone, Serialize)]
pub struct TermSummary {
    pub id: String,
    pub slug: String,
    pub title: String,
}

impl From<&Term> for TermSummary {
    fn from(term: &Term) -> Self {
        Self {
            id: term.id.clone(),
            slug: term.slug.clone(),
            title: term.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermDetail {
    pub term: Term,
    pub difficulty_label: &'static str,
    pub breadcrumb: Vec<Category>,
    pub related: Vec<TermSummary>,
}

pub async fn get_term_detail(store: &dyn Store, id_or_slug: &str) -> Result<TermDetail> {
    let term = store
        .get_term(id_or_slug)
        .await?
        .ok_or_else(|| LookupError::TermNotFound(id_or_slug.to_string()))?;

    let breadcrumb = match term.category_id.as_deref() {
        Some(category_id) => ancestors_of(&store.list_categories().await?, category_id),
        None => Vec::new(),
    };

    let related = if term.related_term_ids.is_empty() {
        Vec::new()
    } else {
        let all = store.list_terms().await?;
        term.related_term_ids
            .iter()
            .filter_map(|id| all.iter().find(|t| &t.id == id))
            .map(TermSummary::from)
            .collect()
    };

    Ok(TermDetail {
        difficulty_label: term.difficulty_label(),
        term,
        breadcrumb,
        related,
    })
}

/// CLI entry point: calls get_term_detail and prints to stdout.
pub async fn run_get(config: &Config, id_or_slug: &str) -> Result<()> {
    let store = SqliteStore::connect(config).await?;
    let detail = get_term_detail(&store, id_or_slug).await;
    store.close().await;
    let detail = detail?;
    let term = &detail.term;

    println!("--- Term ---");
    println!("id:           {}", term.id);
    println!("title:        {}", term.title);
    println!("slug:         {}", term.slug);
    if let Some(ref aliases) = term.search_aliases {
        println!("aliases:      {}", aliases);
    }
    if !detail.breadcrumb.is_empty() {
        let path: Vec<&str> = detail.breadcrumb.iter().map(|c| c.name.as_str()).collect();
        println!("category:     {}", path.join(" > "));
    }
    println!("difficulty:   {}", detail.difficulty_label);
    if !term.tags.is_empty() {
        let tags: Vec<&str> = term.tags.iter().map(|t| t.name.as_str()).collect();
        println!("tags:         {}", tags.join(", "));
    }
    if term.is_recommended {
        println!("recommended:  yes");
    }
    if let Some(updated) = term.updated_at {
        println!("updated_at:   {}", updated.format("%Y-%m-%dT%H:%M:%SZ"));
    }
    println!();

    if !term.description.is_empty() {
        println!("--- Description ---");
        println!("{}", term.description);
        println!();
    }
    if !term.content.is_empty() {
        println!("--- Content ---");
        println!("{}", term.content);
        println!();
    }

    if !detail.related.is_empty() {
        println!("--- Related ({}) ---", detail.related.len());
        for related in &detail.related {
            println!("{}  [{}]", related.title, related.slug);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossary_core::store::memory::InMemoryStore;

    #[tokio::test]
    async fn test_detail_resolves_breadcrumb_and_related() {
        let store = InMemoryStore::new();
        for c in [
            Category::new("net", "Network"),
            Category::new("proto", "Protocols").with_parent("net"),
        ] {
            store.upsert_category(&c, &c.id).await.unwrap();
        }
        let mut dns = Term::new("dns", "DNS");
        dns.slug = "domain-name-system".to_string();
        dns.category_id = Some("proto".to_string());
        dns.related_term_ids = vec!["ip".to_string(), "gone".to_string()];
        store.upsert_term(&dns, "1").await.unwrap();
        store.upsert_term(&Term::new("ip", "IP"), "2").await.unwrap();

        let detail = get_term_detail(&store, "domain-name-system").await.unwrap();
        let crumbs: Vec<&str> = detail.breadcrumb.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(crumbs, vec!["net", "proto"]);
        assert_eq!(detail.related.len(), 1);
        assert_eq!(detail.related[0].title, "IP");
        assert_eq!(detail.difficulty_label, "不明");
    }

    #[tokio::test]
    async fn test_missing_term() {
        let store = InMemoryStore::new();
        let err = get_term_detail(&store, "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "term not found: nope");
    }
}
