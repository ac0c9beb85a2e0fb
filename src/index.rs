//! A–Z / 0-9 index lookups.

use anyhow::Result;

use glossary_core::alphabet::{build_alphabet_index, AlphabetIndex, IndexGroup, IndexKey};
use glossary_core::store::Store;

use crate::config::Config;
use crate::errors::LookupError;
use crate::sqlite_store::SqliteStore;

pub async fn alphabet_index(store: &dyn Store) -> Result<AlphabetIndex> {
    Ok(build_alphabet_index(&store.list_terms().await?))
}

/// One bucket, e.g. `"a"` or `"0-9"`. Empty buckets are returned, not 404.
pub async fn index_group(store: &dyn Store, raw_key: &str) -> Result<IndexGroup> {
    let key =
        IndexKey::parse(raw_key).ok_or_else(|| LookupError::InvalidIndexKey(raw_key.to_string()))?;
    let index = alphabet_index(store).await?;
    Ok(index
        .groups
        .into_iter()
        .find(|g| g.key == key)
        .unwrap_or(IndexGroup {
            key,
            terms: Vec::new(),
        }))
}

pub async fn run_index(config: &Config, key: Option<&str>) -> Result<()> {
    let store = SqliteStore::connect(config).await?;

    match key {
        Some(raw) => {
            let group = index_group(&store, raw).await?;
            println!("{} ({})", group.key, group.terms.len());
            for term in &group.terms {
                println!("  {}  [{}]", term.title, term.slug);
            }
        }
        None => {
            let index = alphabet_index(&store).await?;
            for group in index.non_empty() {
                let titles: Vec<&str> = group.terms.iter().map(|t| t.title.as_str()).collect();
                println!("{} ({}): {}", group.key, titles.len(), titles.join(", "));
            }
            if index.unindexed > 0 {
                println!("(not indexed: {})", index.unindexed);
            }
        }
    }

    store.close().await;
    Ok(())
}
