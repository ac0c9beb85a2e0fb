//! microCMS response shapes and their validation into core models.
//!
//! CMS payloads are loosely typed: references arrive either expanded
//! (`{"id": "...", "name": ...}`) or as a bare id string, select fields
//! arrive as a string or an array, and any field may be missing or `null`.
//! The `Raw*` types accept all of that; [`Validate::validate`] turns each
//! record into a strict [`Term`] or [`Category`] or rejects it with a
//! [`ValidationError`]. A rejected record never fails a whole batch.
//!
//! Lists hold [`RawRecord`]s, which decode each element on its own: a
//! record with a wrongly typed field becomes [`RawRecord::Malformed`] and
//! is rejected at validation, leaving its neighbours intact.

use chrono::{DateTime, Utc};
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use glossary_core::models::{Category, Difficulty, Tag, Term, ValidationError};

/// A microCMS list API page.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroCmsList<T> {
    #[serde(default = "Vec::new")]
    pub contents: Vec<T>,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
}

/// One list element, decoded independently of the rest of the page.
#[derive(Debug, Clone)]
pub enum RawRecord<R> {
    Parsed(R),
    Malformed { id: Option<String>, message: String },
}

impl<R> RawRecord<R> {
    pub fn parsed(&self) -> Option<&R> {
        match self {
            RawRecord::Parsed(r) => Some(r),
            RawRecord::Malformed { .. } => None,
        }
    }
}

impl<R> From<R> for RawRecord<R> {
    fn from(record: R) -> Self {
        RawRecord::Parsed(record)
    }
}

impl<'de, R: DeserializeOwned> Deserialize<'de> for RawRecord<R> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let id = match value.get("id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Ok(match serde_json::from_value::<R>(value) {
            Ok(record) => RawRecord::Parsed(record),
            Err(e) => RawRecord::Malformed {
                id,
                message: e.to_string(),
            },
        })
    }
}

/// A content reference: expanded object or bare id.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawRef {
    Id(String),
    Object {
        #[serde(default)]
        id: Option<String>,
    },
}

impl RawRef {
    pub fn id(&self) -> Option<&str> {
        let id = match self {
            RawRef::Id(id) => id.as_str(),
            RawRef::Object { id } => id.as_deref()?,
        };
        let id = id.trim();
        (!id.is_empty()).then_some(id)
    }
}

/// Single-select or multi-select difficulty field.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawDifficulty {
    One(String),
    Many(Vec<String>),
}

impl RawDifficulty {
    /// First recognisable value; accepts keys (`beginner`) and labels (`初級`).
    pub fn resolve(&self) -> Option<Difficulty> {
        match self {
            RawDifficulty::One(v) => parse_difficulty(v),
            RawDifficulty::Many(vs) => vs.iter().find_map(|v| parse_difficulty(v)),
        }
    }
}

fn parse_difficulty(raw: &str) -> Option<Difficulty> {
    Difficulty::parse(raw).or_else(|| match raw.trim() {
        "初級" => Some(Difficulty::Beginner),
        "中級" => Some(Difficulty::Intermediate),
        "上級" => Some(Difficulty::Advanced),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTag {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTerm {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, rename = "search_title", alias = "searchTitle")]
    pub search_title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub difficulty: Option<RawDifficulty>,
    #[serde(default)]
    pub category: Option<RawRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<RawTag>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub related_terms: Vec<RawRef>,
    #[serde(default)]
    pub is_recommended: Option<bool>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCategory {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub parent: Option<RawRef>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Conversion of a raw CMS record into a strict model.
pub trait Validate {
    type Output;
    /// Entity name used in rejection messages.
    const ENTITY: &'static str;
    fn validate(self) -> Result<Self::Output, ValidationError>;
}

impl<R: Validate> Validate for RawRecord<R> {
    type Output = R::Output;
    const ENTITY: &'static str = R::ENTITY;

    fn validate(self) -> Result<R::Output, ValidationError> {
        match self {
            RawRecord::Parsed(record) => record.validate(),
            RawRecord::Malformed { id, message } => Err(ValidationError::Malformed {
                entity: R::ENTITY,
                id: id.unwrap_or_else(|| "<no id>".to_string()),
                message,
            }),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    let raw = non_blank(value)?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!(value = %raw, error = %e, "ignoring unparseable timestamp");
            None
        }
    }
}

impl Validate for RawTerm {
    type Output = Term;
    const ENTITY: &'static str = "term";

    fn validate(self) -> Result<Term, ValidationError> {
        let id = non_blank(self.id).ok_or(ValidationError::MissingId { entity: Self::ENTITY })?;
        let title = non_blank(self.title).ok_or_else(|| ValidationError::MissingField {
            entity: Self::ENTITY,
            id: id.clone(),
            field: "title",
        })?;

        let mut related_term_ids: Vec<String> = Vec::new();
        for r in &self.related_terms {
            if let Some(rid) = r.id() {
                if rid != id && !related_term_ids.iter().any(|x| x == rid) {
                    related_term_ids.push(rid.to_string());
                }
            }
        }

        let tags = self
            .tags
            .into_iter()
            .filter_map(|t| {
                Some(Tag {
                    id: non_blank(t.id)?,
                    name: non_blank(t.name)?,
                    slug: non_blank(t.slug),
                })
            })
            .collect();

        Ok(Term {
            slug: non_blank(self.slug).unwrap_or_else(|| id.clone()),
            search_aliases: non_blank(self.search_title),
            category_id: self.category.as_ref().and_then(|c| c.id()).map(str::to_string),
            description: self.description.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            difficulty: self.difficulty.as_ref().and_then(RawDifficulty::resolve),
            tags,
            related_term_ids,
            is_recommended: self.is_recommended.unwrap_or(false),
            order: self.order,
            published_at: parse_timestamp(self.published_at),
            updated_at: parse_timestamp(self.updated_at),
            id,
            title,
        })
    }
}

impl Validate for RawCategory {
    type Output = Category;
    const ENTITY: &'static str = "category";

    fn validate(self) -> Result<Category, ValidationError> {
        let id = non_blank(self.id).ok_or(ValidationError::MissingId { entity: Self::ENTITY })?;
        let name = non_blank(self.name).ok_or_else(|| ValidationError::MissingField {
            entity: Self::ENTITY,
            id: id.clone(),
            field: "name",
        })?;

        Ok(Category {
            parent_id: self.parent.as_ref().and_then(|p| p.id()).map(str::to_string),
            slug: non_blank(self.slug),
            icon: non_blank(self.icon),
            order: self.order,
            updated_at: parse_timestamp(self.updated_at),
            id,
            name,
        })
    }
}

/// Validate every record, keeping the valid ones in input order.
pub fn validate_batch<R: Validate>(raw: Vec<R>) -> (Vec<R::Output>, Vec<ValidationError>) {
    let mut valid = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();
    for record in raw {
        match record.validate() {
            Ok(v) => valid.push(v),
            Err(e) => {
                tracing::warn!(error = %e, "rejecting CMS record");
                rejected.push(e);
            }
        }
    }
    (valid, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_with_expanded_refs() {
        let json = r#"{
            "id": "dns",
            "title": " DNS ",
            "search_title": "Domain Name System,名前解決",
            "difficulty": ["beginner"],
            "category": {"id": "network", "name": "Network"},
            "tags": [{"id": "t1", "name": "protocol"}, {"name": "no id"}],
            "relatedTerms": [{"id": "ip"}, "udp", {"id": "dns"}, "ip"],
            "isRecommended": true,
            "order": 3,
            "updatedAt": "2024-05-01T10:00:00.000Z"
        }"#;
        let raw: RawTerm = serde_json::from_str(json).unwrap();
        let term = raw.validate().unwrap();

        assert_eq!(term.title, "DNS");
        assert_eq!(term.slug, "dns");
        assert_eq!(term.search_aliases.as_deref(), Some("Domain Name System,名前解決"));
        assert_eq!(term.difficulty, Some(Difficulty::Beginner));
        assert_eq!(term.category_id.as_deref(), Some("network"));
        assert_eq!(term.tags.len(), 1);
        assert_eq!(term.related_term_ids, vec!["ip", "udp"]);
        assert!(term.is_recommended);
        assert_eq!(term.order, Some(3));
        assert!(term.updated_at.is_some());
    }

    #[test]
    fn test_term_with_nulls_and_labels() {
        let json = r#"{
            "id": "bgp",
            "title": "BGP",
            "slug": "",
            "difficulty": "上級",
            "category": null,
            "tags": null,
            "relatedTerms": null,
            "updatedAt": "yesterday"
        }"#;
        let term = serde_json::from_str::<RawTerm>(json).unwrap().validate().unwrap();
        assert_eq!(term.slug, "bgp");
        assert_eq!(term.difficulty, Some(Difficulty::Advanced));
        assert!(term.category_id.is_none());
        assert!(term.tags.is_empty());
        assert!(term.updated_at.is_none());
    }

    #[test]
    fn test_term_missing_title_rejected() {
        let raw = RawTerm {
            id: Some("x".to_string()),
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            raw.validate().unwrap_err(),
            ValidationError::MissingField {
                entity: "term",
                id: "x".to_string(),
                field: "title"
            }
        );
    }

    #[test]
    fn test_category_parent_as_bare_id() {
        let json = r#"{"id": "dns-cat", "name": "DNS", "parent": "network"}"#;
        let category = serde_json::from_str::<RawCategory>(json)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(category.parent_id.as_deref(), Some("network"));
    }

    #[test]
    fn test_validate_batch_keeps_good_records() {
        let raw = vec![
            RawCategory {
                id: Some("a".to_string()),
                name: Some("A".to_string()),
                ..Default::default()
            },
            RawCategory {
                name: Some("orphan".to_string()),
                ..Default::default()
            },
            RawCategory {
                id: Some("b".to_string()),
                name: Some("B".to_string()),
                ..Default::default()
            },
        ];
        let (valid, rejected) = validate_batch(raw);
        let ids: Vec<&str> = valid.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(rejected, vec![ValidationError::MissingId { entity: "category" }]);
    }

    #[test]
    fn test_badly_typed_record_does_not_sink_page() {
        let json = r#"{"contents": [
            {"id": "a", "title": "A"},
            {"id": "b", "title": "B", "order": "2"},
            {"id": 7, "title": "Seven", "isRecommended": "yes"},
            {"id": "c", "title": "C", "relatedTerms": [{"title": "no id"}, "a"]}
        ], "totalCount": 4}"#;
        let page: MicroCmsList<RawRecord<RawTerm>> = serde_json::from_str(json).unwrap();
        assert_eq!(page.contents.len(), 4);

        let (valid, rejected) = validate_batch(page.contents);
        let ids: Vec<&str> = valid.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(valid[1].related_term_ids, vec!["a"]);

        assert_eq!(rejected.len(), 2);
        assert!(matches!(
            &rejected[0],
            ValidationError::Malformed { entity: "term", id, .. } if id == "b"
        ));
        assert!(matches!(
            &rejected[1],
            ValidationError::Malformed { id, .. } if id == "7"
        ));
    }

    #[test]
    fn test_non_object_record_is_malformed() {
        let records: Vec<RawRecord<RawCategory>> =
            serde_json::from_str(r#"[null, {"id": "x", "name": "X"}]"#).unwrap();
        assert!(records[0].parsed().is_none());
        let (valid, rejected) = validate_batch(records);
        assert_eq!(valid.len(), 1);
        assert!(matches!(
            &rejected[0],
            ValidationError::Malformed { entity: "category", id, .. } if id == "<no id>"
        ));
    }

    #[test]
    fn test_list_envelope() {
        let json = r#"{"contents": [{"id": "a", "name": "A"}], "totalCount": 1, "offset": 0, "limit": 100}"#;
        let page: MicroCmsList<RawCategory> = serde_json::from_str(json).unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.contents.len(), 1);
    }
}
