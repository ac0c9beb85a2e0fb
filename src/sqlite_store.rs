//! SQLite-backed [`Store`] over a sqlx pool.
//!
//! Each row keeps the full record as JSON plus a few indexed columns.
//! Listing follows `rowid`, which is first-insert order. Queries are
//! written once against a connection and shared by the pooled store and
//! the transactional [`SqliteTx`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::collections::HashSet;
use tokio::sync::Mutex;

use glossary_core::models::{Category, Term};
use glossary_core::store::{Store, StoreCounts, UpsertOutcome};

use crate::config::Config;
use crate::db;

/// One row of the `checkpoints` table.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub source: String,
    pub cursor: String,
    pub updated_at: i64,
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &Config) -> Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Open a transaction. Nothing written through it is visible until
    /// [`SqliteTx::commit`]; dropping it rolls everything back.
    pub async fn begin(&self) -> Result<SqliteTx> {
        Ok(SqliteTx {
            tx: Mutex::new(self.pool.begin().await?),
        })
    }

    pub async fn checkpoints(&self) -> Result<Vec<Checkpoint>> {
        let rows = sqlx::query("SELECT source, cursor, updated_at FROM checkpoints ORDER BY source")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| Checkpoint {
                source: row.get("source"),
                cursor: row.get("cursor"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }

    async fn retain(&self, table: &str, keep: &[String]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let removed = retain_ids(&mut tx, table, keep).await?;
        tx.commit().await?;
        Ok(removed)
    }
}

/// A [`Store`] view over one open SQLite transaction.
///
/// A sync writes its upserts, removals, and checkpoint through one of
/// these so a failure part-way leaves the previous snapshot in place.
pub struct SqliteTx {
    tx: Mutex<Transaction<'static, Sqlite>>,
}

impl SqliteTx {
    pub async fn set_checkpoint(&self, source: &str, cursor: &str) -> Result<()> {
        let mut tx = self.tx.lock().await;
        write_checkpoint(&mut tx, source, cursor).await
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.into_inner().commit().await?;
        Ok(())
    }
}

fn outcome(previous: Option<String>) -> UpsertOutcome {
    if previous.is_some() {
        UpsertOutcome::Updated
    } else {
        UpsertOutcome::Inserted
    }
}

async fn stored_hash(conn: &mut SqliteConnection, table: &str, id: &str) -> Result<Option<String>> {
    let sql = format!("SELECT content_hash FROM {} WHERE id = ?", table);
    Ok(sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?)
}

async fn write_category(
    conn: &mut SqliteConnection,
    category: &Category,
    content_hash: &str,
) -> Result<UpsertOutcome> {
    let previous = stored_hash(conn, "categories", &category.id).await?;
    if previous.as_deref() == Some(content_hash) {
        return Ok(UpsertOutcome::Unchanged);
    }

    sqlx::query(
        r#"
        INSERT INTO categories (id, name, parent_id, sort_order, updated_at, record_json, content_hash)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            parent_id = excluded.parent_id,
            sort_order = excluded.sort_order,
            updated_at = excluded.updated_at,
            record_json = excluded.record_json,
            content_hash = excluded.content_hash
        "#,
    )
    .bind(&category.id)
    .bind(&category.name)
    .bind(&category.parent_id)
    .bind(category.order)
    .bind(category.updated_at.map(|ts| ts.timestamp()))
    .bind(serde_json::to_string(category)?)
    .bind(content_hash)
    .execute(&mut *conn)
    .await?;

    Ok(outcome(previous))
}

async fn write_term(
    conn: &mut SqliteConnection,
    term: &Term,
    content_hash: &str,
) -> Result<UpsertOutcome> {
    let previous = stored_hash(conn, "terms", &term.id).await?;
    if previous.as_deref() == Some(content_hash) {
        return Ok(UpsertOutcome::Unchanged);
    }

    sqlx::query(
        r#"
        INSERT INTO terms (id, slug, title, category_id, is_recommended, sort_order, updated_at, record_json, content_hash)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            slug = excluded.slug,
            title = excluded.title,
            category_id = excluded.category_id,
            is_recommended = excluded.is_recommended,
            sort_order = excluded.sort_order,
            updated_at = excluded.updated_at,
            record_json = excluded.record_json,
            content_hash = excluded.content_hash
        "#,
    )
    .bind(&term.id)
    .bind(&term.slug)
    .bind(&term.title)
    .bind(&term.category_id)
    .bind(term.is_recommended)
    .bind(term.order)
    .bind(term.updated_at.map(|ts| ts.timestamp()))
    .bind(serde_json::to_string(term)?)
    .bind(content_hash)
    .execute(&mut *conn)
    .await?;

    Ok(outcome(previous))
}

async fn retain_ids(conn: &mut SqliteConnection, table: &str, keep: &[String]) -> Result<usize> {
    let keep: HashSet<&str> = keep.iter().map(String::as_str).collect();
    let ids: Vec<String> = sqlx::query_scalar(&format!("SELECT id FROM {}", table))
        .fetch_all(&mut *conn)
        .await?;

    let delete_sql = format!("DELETE FROM {} WHERE id = ?", table);
    let mut removed = 0;
    for id in ids.iter().filter(|id| !keep.contains(id.as_str())) {
        sqlx::query(&delete_sql).bind(id).execute(&mut *conn).await?;
        removed += 1;
    }
    Ok(removed)
}

async fn write_checkpoint(conn: &mut SqliteConnection, source: &str, cursor: &str) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        r#"
        INSERT INTO checkpoints (source, cursor, updated_at) VALUES (?, ?, ?)
        ON CONFLICT(source) DO UPDATE SET cursor = excluded.cursor, updated_at = excluded.updated_at
        "#,
    )
    .bind(source)
    .bind(cursor)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn list_records<T: DeserializeOwned>(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Vec<T>> {
    let rows: Vec<String> =
        sqlx::query_scalar(&format!("SELECT record_json FROM {} ORDER BY rowid", table))
            .fetch_all(&mut *conn)
            .await?;
    rows.iter()
        .map(|json| {
            serde_json::from_str(json).with_context(|| format!("Corrupt record in {} table", table))
        })
        .collect()
}

async fn find_term(conn: &mut SqliteConnection, id_or_slug: &str) -> Result<Option<Term>> {
    let row: Option<String> = sqlx::query_scalar(
        "SELECT record_json FROM terms WHERE id = ?1 OR slug = ?1 ORDER BY (id = ?1) DESC, rowid LIMIT 1",
    )
    .bind(id_or_slug)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(json) => Ok(Some(
            serde_json::from_str(&json).with_context(|| "Corrupt record in terms table")?,
        )),
        None => Ok(None),
    }
}

async fn count_rows(conn: &mut SqliteConnection) -> Result<StoreCounts> {
    let categories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&mut *conn)
        .await?;
    let terms: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM terms")
        .fetch_one(&mut *conn)
        .await?;
    let categorized: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM terms WHERE category_id IS NOT NULL")
            .fetch_one(&mut *conn)
            .await?;
    let recommended: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM terms WHERE is_recommended = 1")
            .fetch_one(&mut *conn)
            .await?;

    Ok(StoreCounts {
        categories: categories as usize,
        terms: terms as usize,
        categorized_terms: categorized as usize,
        recommended_terms: recommended as usize,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_category(
        &self,
        category: &Category,
        content_hash: &str,
    ) -> Result<UpsertOutcome> {
        let mut conn = self.pool.acquire().await?;
        write_category(&mut conn, category, content_hash).await
    }

    async fn upsert_term(&self, term: &Term, content_hash: &str) -> Result<UpsertOutcome> {
        let mut conn = self.pool.acquire().await?;
        write_term(&mut conn, term, content_hash).await
    }

    async fn retain_categories(&self, keep: &[String]) -> Result<usize> {
        self.retain("categories", keep).await
    }

    async fn retain_terms(&self, keep: &[String]) -> Result<usize> {
        self.retain("terms", keep).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut conn = self.pool.acquire().await?;
        list_records(&mut conn, "categories").await
    }

    async fn list_terms(&self) -> Result<Vec<Term>> {
        let mut conn = self.pool.acquire().await?;
        list_records(&mut conn, "terms").await
    }

    async fn get_term(&self, id_or_slug: &str) -> Result<Option<Term>> {
        let mut conn = self.pool.acquire().await?;
        find_term(&mut conn, id_or_slug).await
    }

    async fn counts(&self) -> Result<StoreCounts> {
        let mut conn = self.pool.acquire().await?;
        count_rows(&mut conn).await
    }
}

#[async_trait]
impl Store for SqliteTx {
    async fn upsert_category(
        &self,
        category: &Category,
        content_hash: &str,
    ) -> Result<UpsertOutcome> {
        let mut tx = self.tx.lock().await;
        write_category(&mut tx, category, content_hash).await
    }

    async fn upsert_term(&self, term: &Term, content_hash: &str) -> Result<UpsertOutcome> {
        let mut tx = self.tx.lock().await;
        write_term(&mut tx, term, content_hash).await
    }

    async fn retain_categories(&self, keep: &[String]) -> Result<usize> {
        let mut tx = self.tx.lock().await;
        retain_ids(&mut tx, "categories", keep).await
    }

    async fn retain_terms(&self, keep: &[String]) -> Result<usize> {
        let mut tx = self.tx.lock().await;
        retain_ids(&mut tx, "terms", keep).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut tx = self.tx.lock().await;
        list_records(&mut tx, "categories").await
    }

    async fn list_terms(&self) -> Result<Vec<Term>> {
        let mut tx = self.tx.lock().await;
        list_records(&mut tx, "terms").await
    }

    async fn get_term(&self, id_or_slug: &str) -> Result<Option<Term>> {
        let mut tx = self.tx.lock().await;
        find_term(&mut tx, id_or_slug).await
    }

    async fn counts(&self) -> Result<StoreCounts> {
        let mut tx = self.tx.lock().await;
        count_rows(&mut tx).await
    }
}
