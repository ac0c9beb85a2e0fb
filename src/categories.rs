//! Category tree and per-category term listings.

use anyhow::Result;
use serde::Serialize;

use glossary_core::filter::terms_in_category;
use glossary_core::models::{Category, Term};
use glossary_core::store::Store;
use glossary_core::tree::{build_category_tree, CategoryNode, TreeOptions};

use crate::config::Config;
use crate::errors::LookupError;
use crate::sqlite_store::SqliteStore;

/// The category forest. Terms are attached only when `with_terms` is set.
pub async fn category_tree(
    store: &dyn Store,
    options: &TreeOptions,
    with_terms: bool,
) -> Result<Vec<CategoryNode>> {
    let categories = store.list_categories().await?;
    let terms = if with_terms {
        store.list_terms().await?
    } else {
        Vec::new()
    };
    Ok(build_category_tree(&categories, &terms, options))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTerms {
    pub category: Category,
    pub total_count: usize,
    pub terms: Vec<Term>,
}

/// Terms tagged directly with `category_id`, by `order` then title.
pub async fn category_terms(store: &dyn Store, category_id: &str) -> Result<CategoryTerms> {
    let category = store
        .list_categories()
        .await?
        .into_iter()
        .find(|c| c.id == category_id)
        .ok_or_else(|| LookupError::CategoryNotFound(category_id.to_string()))?;
    let terms = terms_in_category(&store.list_terms().await?, category_id);
    Ok(CategoryTerms {
        category,
        total_count: terms.len(),
        terms,
    })
}

pub async fn run_tree(config: &Config, show_terms: bool) -> Result<()> {
    let store = SqliteStore::connect(config).await?;
    let roots = category_tree(&store, &config.tree_options(), true).await?;
    store.close().await;

    if roots.is_empty() {
        println!("No categories. Run `glossary sync` first.");
        return Ok(());
    }

    for root in &roots {
        for (depth, node) in root.walk() {
            let indent = "  ".repeat(depth);
            println!(
                "{}{} ({})",
                indent,
                node.category.name,
                node.total_terms()
            );
            if show_terms {
                for term in &node.terms {
                    println!("{}  - {}", indent, term.title);
                }
            }
        }
    }
    Ok(())
}
