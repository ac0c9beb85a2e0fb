//! Export the synced glossary as JSON for static site builds.
//!
//! Produces one document with the flat term list, the category tree
//! (terms attached), and the A–Z index, so a static front end can render
//! every page without talking to the server.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use glossary_core::alphabet::{build_alphabet_index, AlphabetIndex};
use glossary_core::models::Term;
use glossary_core::store::Store;
use glossary_core::tree::{build_category_tree, CategoryNode, TreeOptions};

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub generated_at: DateTime<Utc>,
    pub terms: Vec<Term>,
    pub categories: Vec<CategoryNode>,
    pub index: AlphabetIndex,
}

pub async fn export_data(store: &dyn Store, options: &TreeOptions) -> Result<ExportData> {
    let terms = store.list_terms().await?;
    let categories = store.list_categories().await?;
    Ok(ExportData {
        generated_at: Utc::now(),
        categories: build_category_tree(&categories, &terms, options),
        index: build_alphabet_index(&terms),
        terms,
    })
}

/// Export terms, tree, and index as JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let store = SqliteStore::connect(config).await?;
    let data = export_data(&store, &config.tree_options()).await;
    store.close().await;
    let data = data?;

    let json = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)?;
            eprintln!(
                "Exported {} terms, {} root categories to {}",
                data.terms.len(),
                data.categories.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}
