//! # Glossary Harness CLI (`glossary`)
//!
//! The `glossary` binary is the primary interface for Glossary Harness. It
//! provides commands for database initialization, content sync, search,
//! category and index browsing, static exports, and starting the HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! glossary --config ./config/glossary.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `glossary init` | Create the SQLite database and run schema migrations |
//! | `glossary sources` | List connectors and their health status |
//! | `glossary sync <connector>` | Sync from `microcms` or `snapshot` |
//! | `glossary search "<query>"` | Ranked keyword search |
//! | `glossary tree` | Print the category tree |
//! | `glossary index [KEY]` | Browse the A–Z / 0-9 index |
//! | `glossary get <id-or-slug>` | Show one term |
//! | `glossary recommended` | List recommended terms |
//! | `glossary stats` | Snapshot statistics |
//! | `glossary export` | Export terms, tree, and index as JSON |
//! | `glossary sitemap` | Write the XML sitemap |
//! | `glossary serve` | Start the JSON HTTP API |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use glossary_harness::search::SearchQuery;
use glossary_harness::{
    categories, config, export, get, index, ingest, migrate, recommended, search, server,
    sitemap, sources, stats,
};

/// Glossary Harness CLI: sync, search, and serve an IT glossary.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/glossary.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "glossary",
    about = "Glossary Harness: sync, search, and serve an IT glossary",
    version,
    long_about = "Glossary Harness syncs terms and categories from microCMS (or a JSON snapshot) \
    into a local SQLite database and serves ranked search, a category tree, an A–Z index, \
    and a sitemap via a CLI and a JSON HTTP API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/glossary.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins when set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the categories, terms, and
    /// checkpoints tables. Running it again is safe.
    Init,

    /// List available connectors and their status.
    Sources,

    /// Sync categories and terms from a connector.
    ///
    /// Every sync is a full snapshot: records missing from the source are
    /// removed locally.
    Sync {
        /// Connector: `microcms` or `snapshot`.
        connector: String,

        /// Fetch and validate without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Search terms by keyword.
    Search {
        /// The search query string.
        query: String,

        /// Only terms in this category id.
        #[arg(long)]
        category: Option<String>,

        /// Only terms of this difficulty: beginner, intermediate, or advanced.
        #[arg(long)]
        difficulty: Option<String>,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<usize>,

        /// Show each result's relevance tier and score.
        #[arg(long)]
        explain: bool,
    },

    /// Print the category tree with term counts.
    Tree {
        /// List each category's terms under it.
        #[arg(long)]
        terms: bool,
    },

    /// Browse the alphabetical index.
    Index {
        /// One group: a letter or `0-9`. Omit to list all non-empty groups.
        key: Option<String>,
    },

    /// Show a term by id or slug.
    Get {
        /// Term id or slug.
        id: String,
    },

    /// List recommended terms.
    Recommended {
        /// Maximum number of terms to show.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show snapshot statistics.
    Stats,

    /// Export terms, category tree, and index as JSON.
    Export {
        /// Output file path. Prints to stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Generate the XML sitemap.
    Sitemap {
        /// Output file path. Prints to stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Start the JSON HTTP API.
    ///
    /// Binds to the address configured in `[server].bind`.
    Serve,
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Sync { connector, dry_run } => {
            ingest::run_sync(&cfg, &connector, dry_run).await?;
        }
        Commands::Search {
            query,
            category,
            difficulty,
            limit,
            explain,
        } => {
            let request = SearchQuery {
                query,
                category,
                difficulty,
                limit,
            };
            search::run_search(&cfg, &request, explain).await?;
        }
        Commands::Tree { terms } => {
            categories::run_tree(&cfg, terms).await?;
        }
        Commands::Index { key } => {
            index::run_index(&cfg, key.as_deref()).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::Recommended { limit } => {
            recommended::run_recommended(&cfg, limit).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
        Commands::Sitemap { output } => {
            sitemap::run_sitemap(&cfg, output.as_deref()).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
