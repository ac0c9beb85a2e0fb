//! # Glossary Harness
//!
//! A local-first glossary engine for an IT-terminology site.
//!
//! Glossary Harness syncs terms and categories from a headless CMS
//! (microCMS) or a JSON snapshot into SQLite, then serves ranked keyword
//! search, a category tree, an A–Z index, recommendations and a sitemap
//! through a CLI and a JSON HTTP API. The ranking, tree, and index
//! algorithms live in the [`glossary_core`] crate.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌────────────┐   ┌──────────┐
//! │ Connectors  │──▶│  Validate   │──▶│  SQLite   │
//! │ microCMS /  │   │  + upsert   │   │ snapshot  │
//! │ snapshot    │   └────────────┘   └────┬─────┘
//! └─────────────┘                         │
//!                      ┌──────────────────┤
//!                      ▼                  ▼
//!                 ┌──────────┐      ┌──────────┐
//!                 │   CLI    │      │   HTTP   │
//!                 │(glossary)│      │  (axum)  │
//!                 └──────────┘      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! glossary init                 # create database
//! glossary sync microcms        # pull categories and terms
//! glossary search "dns"
//! glossary tree --terms
//! glossary serve                # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`cms`] | Raw CMS shapes and validation |
//! | [`connector_microcms`] | microCMS list API connector |
//! | [`connector_snapshot`] | Local JSON snapshot connector |
//! | [`ingest`] | Sync pipeline |
//! | [`sqlite_store`] | SQLite implementation of the store |
//! | [`search`] | Ranked keyword search |
//! | [`categories`] | Category tree and per-category listings |
//! | [`index`] | A–Z / 0-9 index |
//! | [`server`] | JSON HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod categories;
pub mod cms;
pub mod config;
pub mod connector_microcms;
pub mod connector_snapshot;
pub mod db;
pub mod errors;
pub mod export;
pub mod get;
pub mod index;
pub mod ingest;
pub mod migrate;
pub mod recommended;
pub mod search;
pub mod server;
pub mod sitemap;
pub mod sources;
pub mod sqlite_store;
pub mod stats;
pub mod traits;
