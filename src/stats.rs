//! Snapshot statistics.
//!
//! A quick summary of what has been synced: term and category counts,
//! coverage of categories and difficulties, tree shape, and when each
//! source was last synced. Used by `glossary stats`.

use anyhow::Result;
use serde::Serialize;

use glossary_core::store::{Store, StoreCounts};
use glossary_core::tree::build_category_tree;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    pub counts: StoreCounts,
    pub root_categories: usize,
    pub max_depth: usize,
    pub with_difficulty: usize,
    pub with_aliases: usize,
}

pub async fn snapshot_stats(store: &dyn Store, config: &Config) -> Result<SnapshotStats> {
    let counts = store.counts().await?;
    let categories = store.list_categories().await?;
    let terms = store.list_terms().await?;
    let roots = build_category_tree(&categories, &[], &config.tree_options());

    let max_depth = roots
        .iter()
        .flat_map(|root| root.walk())
        .map(|(depth, _)| depth + 1)
        .max()
        .unwrap_or(0);

    Ok(SnapshotStats {
        counts,
        root_categories: roots.len(),
        max_depth,
        with_difficulty: terms.iter().filter(|t| t.difficulty.is_some()).count(),
        with_aliases: terms.iter().filter(|t| t.aliases().next().is_some()).count(),
    })
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = SqliteStore::connect(config).await?;
    let stats = snapshot_stats(&store, config).await?;
    let checkpoints = store.checkpoints().await?;
    store.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Glossary Harness: Snapshot Stats");
    println!("=================================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Terms:       {}", stats.counts.terms);
    println!(
        "  Categorized: {} / {} ({}%)",
        stats.counts.categorized_terms,
        stats.counts.terms,
        percent(stats.counts.categorized_terms, stats.counts.terms)
    );
    println!("  Difficulty:  {} set", stats.with_difficulty);
    println!("  Aliases:     {} with aliases", stats.with_aliases);
    println!("  Recommended: {}", stats.counts.recommended_terms);
    println!();
    println!(
        "  Categories:  {} ({} roots, depth {})",
        stats.counts.categories, stats.root_categories, stats.max_depth
    );

    if !checkpoints.is_empty() {
        println!();
        println!("  By source:");
        println!("  {:<24} {}", "SOURCE", "LAST SYNC");
        println!("  {}", "-".repeat(44));
        for cp in &checkpoints {
            println!("  {:<24} {}", cp.source, format_ts_relative(cp.updated_at));
        }
    }

    println!();
    Ok(())
}

fn percent(part: usize, whole: usize) -> usize {
    if whole > 0 {
        (part * 100) / whole
    } else {
        0
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    if delta < 0 {
        format_ts(ts)
    } else if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts(ts)
    }
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossary_core::models::{Category, Difficulty, Term};
    use glossary_core::store::memory::InMemoryStore;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_format_ts_relative() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_ts_relative(now), "just now");
        assert_eq!(format_ts_relative(now - 7200), "2 hours ago");
        assert_eq!(format_ts_relative(now - 86400), "1 day ago");
    }

    #[tokio::test]
    async fn test_snapshot_stats() {
        let cfg = crate::config::parse_config(
            "[db]\npath = \"x.sqlite\"\n[server]\nbind = \"127.0.0.1:1\"\n",
        )
        .unwrap();
        let store = InMemoryStore::new();
        for c in [
            Category::new("a", "A"),
            Category::new("b", "B").with_parent("a"),
            Category::new("c", "C").with_parent("b"),
            Category::new("d", "D"),
        ] {
            store.upsert_category(&c, &c.id).await.unwrap();
        }
        let mut t = Term::new("t", "T");
        t.difficulty = Some(Difficulty::Intermediate);
        t.search_aliases = Some(" , ".to_string());
        store.upsert_term(&t, "t").await.unwrap();

        let stats = snapshot_stats(&store, &cfg).await.unwrap();
        assert_eq!(stats.root_categories, 2);
        assert_eq!(stats.max_depth, 3);
        assert_eq!(stats.with_difficulty, 1);
        assert_eq!(stats.with_aliases, 0);
        assert_eq!(stats.counts.categories, 4);
    }
}
