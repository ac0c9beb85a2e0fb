//! Connector extension point.
//!
//! A [`Connector`] produces one complete [`ContentBatch`] per sync: every
//! category and term the source currently holds, still in raw CMS shape.
//! The sync pipeline validates the batch, upserts it, and removes stored
//! records the batch no longer contains.
//!
//! ```rust
//! use async_trait::async_trait;
//! use anyhow::Result;
//! use glossary_harness::traits::{Connector, ContentBatch};
//!
//! pub struct FixtureConnector;
//!
//! #[async_trait]
//! impl Connector for FixtureConnector {
//!     fn name(&self) -> &str { "fixture" }
//!     fn description(&self) -> &str { "Static test content" }
//!
//!     async fn scan(&self) -> Result<ContentBatch> {
//!         Ok(ContentBatch::default())
//!     }
//! }
//! ```

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::cms::{RawCategory, RawRecord, RawTerm};

/// Raw content returned by one scan.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBatch {
    #[serde(default)]
    pub categories: Vec<RawRecord<RawCategory>>,
    #[serde(default)]
    pub terms: Vec<RawRecord<RawTerm>>,
}

impl ContentBatch {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.terms.is_empty()
    }
}

#[async_trait]
pub trait Connector: Send + Sync {
    /// Instance name, e.g. `"microcms"`.
    fn name(&self) -> &str;

    /// One-line description for `glossary sources`.
    fn description(&self) -> &str;

    fn connector_type(&self) -> &str {
        "custom"
    }

    /// Key under which the sync checkpoint is stored.
    fn source_label(&self) -> String {
        format!("{}:{}", self.connector_type(), self.name())
    }

    async fn scan(&self) -> Result<ContentBatch>;
}
