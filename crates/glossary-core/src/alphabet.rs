//! Alphabetical ("A–Z / 0-9") index over term titles.
//!
//! Terms are bucketed by the first character of their trimmed title:
//! ASCII letters go to their uppercase letter, ASCII digits share a single
//! `0-9` bucket. Titles starting with anything else (kana, kanji, symbols)
//! are counted as unindexed and left out.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::models::{compare_titles, Term};

/// Label of the shared digits bucket.
pub const DIGITS_LABEL: &str = "0-9";

/// One bucket of the alphabetical index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKey {
    Letter(char),
    Digits,
}

impl IndexKey {
    /// All keys in display order: `A`..=`Z`, then `0-9`.
    pub fn all() -> impl Iterator<Item = IndexKey> {
        ('A'..='Z').map(IndexKey::Letter).chain(std::iter::once(IndexKey::Digits))
    }

    /// Parse a user-supplied key such as `"a"`, `"Q"`, `"0-9"`, or `"7"`.
    pub fn parse(raw: &str) -> Option<IndexKey> {
        let raw = raw.trim();
        if raw == DIGITS_LABEL {
            return Some(IndexKey::Digits);
        }
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::for_char(c),
            _ => None,
        }
    }

    /// Bucket for a title, or `None` when it starts with a non-ASCII-alphanumeric.
    pub fn for_title(title: &str) -> Option<IndexKey> {
        title.trim().chars().next().and_then(Self::for_char)
    }

    fn for_char(c: char) -> Option<IndexKey> {
        if c.is_ascii_alphabetic() {
            Some(IndexKey::Letter(c.to_ascii_uppercase()))
        } else if c.is_ascii_digit() {
            Some(IndexKey::Digits)
        } else {
            None
        }
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Letter(c) => write!(f, "{}", c),
            IndexKey::Digits => f.write_str(DIGITS_LABEL),
        }
    }
}

impl Serialize for IndexKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexGroup {
    pub key: IndexKey,
    pub terms: Vec<Term>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlphabetIndex {
    /// One group per key in [`IndexKey::all`] order, empty groups included.
    pub groups: Vec<IndexGroup>,
    /// Terms whose title does not start with an ASCII letter or digit.
    pub unindexed: usize,
}

impl AlphabetIndex {
    pub fn group(&self, key: IndexKey) -> Option<&IndexGroup> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn non_empty(&self) -> impl Iterator<Item = &IndexGroup> {
        self.groups.iter().filter(|g| !g.terms.is_empty())
    }
}

/// Bucket `terms` by title initial; each bucket sorted case-insensitively.
pub fn build_alphabet_index(terms: &[Term]) -> AlphabetIndex {
    let mut groups: Vec<IndexGroup> = IndexKey::all()
        .map(|key| IndexGroup {
            key,
            terms: Vec::new(),
        })
        .collect();
    let mut unindexed = 0;

    for term in terms {
        match IndexKey::for_title(&term.title) {
            Some(IndexKey::Letter(c)) => groups[(c as u8 - b'A') as usize].terms.push(term.clone()),
            Some(IndexKey::Digits) => groups[26].terms.push(term.clone()),
            None => unindexed += 1,
        }
    }

    for group in &mut groups {
        group.terms.sort_by(|a, b| compare_titles(&a.title, &b.title));
    }

    AlphabetIndex { groups, unindexed }
}
