//! Core data models shared by the ranking, tree, and index algorithms.
//!
//! These are the strict, validated shapes that flow through the pipeline
//! after the CMS boundary has normalized raw responses. The algorithms only
//! read `id`, `title`, `search_aliases`, `category_id`, `parent_id`, and
//! `order`; every other field is passthrough for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single glossary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Term {
    pub id: String,
    pub title: String,
    pub slug: String,
    /// Comma-separated alternate names and synonyms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_aliases: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub related_term_ids: Vec<String>,
    #[serde(default)]
    pub is_recommended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Term {
    /// Minimal term with only the fields the algorithms look at.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            slug: id.clone(),
            id,
            title: title.into(),
            search_aliases: None,
            category_id: None,
            description: String::new(),
            content: String::new(),
            difficulty: None,
            tags: Vec::new(),
            related_term_ids: Vec::new(),
            is_recommended: false,
            order: None,
            published_at: None,
            updated_at: None,
        }
    }

    /// Trimmed, non-empty aliases from `search_aliases`.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.search_aliases
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    /// Label shown next to the title; `不明` when difficulty is unknown.
    pub fn difficulty_label(&self) -> &'static str {
        self.difficulty.map(Difficulty::label).unwrap_or("不明")
    }
}

/// A classification node; categories nest under an optional parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Explicit sibling order; lower sorts first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: None,
            icon: None,
            parent_id: None,
            order: None,
            updated_at: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Exam difficulty level attached to a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Parse the CMS select key. Unknown keys yield `None`.
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Beginner => "初級",
            Self::Intermediate => "中級",
            Self::Advanced => "上級",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison key for ordering titles.
///
/// Lower-cases, folds full-width ASCII to half-width, and folds katakana
/// onto hiragana so `イヌ` sorts between `あめ` and `うし` as it does in a
/// Japanese dictionary. Kanji stay in code-point order.
pub fn title_sort_key(title: &str) -> String {
    title
        .trim()
        .chars()
        .map(|c| match c {
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
            _ => c,
        })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Total order on titles: [`title_sort_key`], then the raw title.
pub fn compare_titles(a: &str, b: &str) -> std::cmp::Ordering {
    title_sort_key(a)
        .cmp(&title_sort_key(b))
        .then_with(|| a.cmp(b))
}

/// Reasons a raw CMS record is rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{entity} record is missing an id")]
    MissingId { entity: &'static str },

    #[error("{entity} {id} is missing required field '{field}'")]
    MissingField {
        entity: &'static str,
        id: String,
        field: &'static str,
    },

    /// The record did not decode into the expected shape.
    #[error("malformed {entity} record {id}: {message}")]
    Malformed {
        entity: &'static str,
        id: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_trimmed_and_skips_blanks() {
        let mut term = Term::new("t1", "Domain Name System");
        term.search_aliases = Some(" DNS , ,name server,".to_string());
        let aliases: Vec<&str> = term.aliases().collect();
        assert_eq!(aliases, vec!["DNS", "name server"]);
    }

    #[test]
    fn test_aliases_absent() {
        let term = Term::new("t1", "TCP");
        assert_eq!(term.aliases().count(), 0);
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::parse("Beginner"), Some(Difficulty::Beginner));
        assert_eq!(Difficulty::parse(" advanced "), Some(Difficulty::Advanced));
        assert_eq!(Difficulty::parse("expert"), None);
    }

    #[test]
    fn test_difficulty_label_unknown() {
        let mut term = Term::new("t1", "TCP");
        assert_eq!(term.difficulty_label(), "不明");
        term.difficulty = Some(Difficulty::Intermediate);
        assert_eq!(term.difficulty_label(), "中級");
    }

    #[test]
    fn test_title_sort_key_folds_kana_and_width() {
        assert_eq!(title_sort_key("イヌ"), "いぬ");
        assert_eq!(title_sort_key("ＤＮＳ"), "dns");
        assert_eq!(title_sort_key(" Cache "), "cache");
        assert_eq!(title_sort_key("暗号"), "暗号");

        let mut titles = vec!["うし", "イヌ", "あめ"];
        titles.sort_by_key(|t| title_sort_key(t));
        assert_eq!(titles, vec!["あめ", "イヌ", "うし"]);
    }

    #[test]
    fn test_term_json_is_camel_case() {
        let mut term = Term::new("t1", "DNS");
        term.category_id = Some("net".to_string());
        let json = serde_json::to_value(&term).unwrap();
        assert_eq!(json["categoryId"], "net");
        assert_eq!(json["isRecommended"], false);
        assert!(json.get("searchAliases").is_none());
    }
}
