use anyhow::Result;

use glossary_core::filter::recommended_terms;
use glossary_core::models::Term;
use glossary_core::store::Store;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// Recommended terms by `order`, at most `limit`.
pub async fn recommended(store: &dyn Store, limit: usize) -> Result<Vec<Term>> {
    Ok(recommended_terms(&store.list_terms().await?, limit))
}

pub async fn run_recommended(config: &Config, limit: Option<usize>) -> Result<()> {
    let store = SqliteStore::connect(config).await?;
    let terms = recommended(&store, limit.unwrap_or(config.search.recommended_limit)).await?;
    store.close().await;

    if terms.is_empty() {
        println!("No recommended terms.");
        return Ok(());
    }
    for (i, term) in terms.iter().enumerate() {
        println!("{}. {}  [{}]", i + 1, term.title, term.difficulty_label());
        if !term.description.is_empty() {
            println!("    {}", term.description);
        }
    }
    Ok(())
}
