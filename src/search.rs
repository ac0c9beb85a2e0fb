//! Keyword search over the synced terms.
//!
//! Candidates are narrowed with [`TermFilter`] (category, difficulty and
//! the title/alias containment check), then ordered by
//! [`rank_scored`]. A blank query is an inactive search: no results, not
//! the full list.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;

use glossary_core::filter::TermFilter;
use glossary_core::models::Difficulty;
use glossary_core::rank::{rank_scored, ScoredTerm};
use glossary_core::store::Store;

use crate::config::Config;
use crate::errors::LookupError;
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub query: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// `false` when the query was blank.
    pub active: bool,
    /// Matches before the limit was applied.
    pub total_count: usize,
    pub results: Vec<ScoredTerm>,
}

impl SearchResponse {
    pub fn inactive() -> Self {
        Self {
            active: false,
            total_count: 0,
            results: Vec::new(),
        }
    }
}

pub fn parse_difficulty(raw: Option<&str>) -> Result<Option<Difficulty>, LookupError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(key) => Difficulty::parse(key)
            .map(Some)
            .ok_or_else(|| LookupError::InvalidDifficulty(key.to_string())),
    }
}

pub async fn search_terms(
    store: &dyn Store,
    request: &SearchQuery,
    default_limit: usize,
) -> Result<SearchResponse> {
    let difficulty = parse_difficulty(request.difficulty.as_deref())?;
    let query = request.query.trim();
    if query.is_empty() {
        return Ok(SearchResponse::inactive());
    }

    let filter = TermFilter {
        category_id: request
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        difficulty,
        query: Some(query.to_string()),
    };
    let candidates = filter.apply(store.list_terms().await?);
    let mut results = rank_scored(query, candidates);
    let total_count = results.len();
    results.truncate(request.limit.unwrap_or(default_limit).max(1));

    tracing::debug!(query, total_count, "search complete");
    Ok(SearchResponse {
        active: true,
        total_count,
        results,
    })
}

pub async fn run_search(config: &Config, request: &SearchQuery, explain: bool) -> Result<()> {
    let store = SqliteStore::connect(config).await?;
    let response = search_terms(&store, request, config.search.final_limit).await?;

    if !response.active {
        println!("Enter a keyword to search.");
        store.close().await;
        return Ok(());
    }
    if response.results.is_empty() {
        println!("No results.");
        store.close().await;
        return Ok(());
    }

    let category_names: HashMap<String, String> = store
        .list_categories()
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    println!(
        "{} of {} results for \"{}\":",
        response.results.len(),
        response.total_count,
        request.query.trim()
    );
    println!();
    for (i, scored) in response.results.iter().enumerate() {
        let term = &scored.term;
        if explain {
            println!(
                "{}. {}  [{} {}]",
                i + 1,
                term.title,
                scored.tier.as_str(),
                scored.score
            );
        } else {
            println!("{}. {}", i + 1, term.title);
        }
        println!("    slug: {}", term.slug);
        if let Some(category) = term
            .category_id
            .as_ref()
            .and_then(|id| category_names.get(id))
        {
            println!("    category: {}", category);
        }
        println!("    difficulty: {}", term.difficulty_label());
        if !term.description.is_empty() {
            println!("    {}", term.description);
        }
        println!();
    }

    store.close().await;
    Ok(())
}
