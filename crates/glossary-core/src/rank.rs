//! Keyword relevance ranking for glossary search.
//!
//! Candidates are first narrowed with [`matches_query`] (plain
//! case-insensitive containment in the title or aliases). The ranker then
//! assigns each candidate a [`RelevanceTier`] and produces a stable total
//! order over them. It never adds or drops terms.
//!
//! # Tiers
//!
//! | Tier | Score | Condition |
//! |------|-------|-----------|
//! | `Exact` | 100 | title equals query |
//! | `TitlePrefix` | 90 | title starts with query |
//! | `WordBoundary` | 80 | query is a whole token inside the title |
//! | `AliasPrefix` | 70 | some alias starts with query |
//! | `Fallback` | 10 | anything else that made it into the candidate set |
//!
//! All comparisons are case-insensitive. A token ends where the kind of
//! character changes: ASCII word characters, hiragana, katakana and kanji
//! each form their own runs, so `逆引きDNS` contains the token `dns` and
//! `HTTPのキャッシュ` contains `キャッシュ`. Ties within a tier are broken by
//! [`title_sort_key`], then raw title, then input position.
//!
//! # Example
//!
//! ```rust
//! use glossary_core::models::Term;
//! use glossary_core::rank::rank_terms;
//!
//! let terms = vec![
//!     Term::new("3", "UDP (uses DNS lookups)"),
//!     Term::new("2", "DNSSEC"),
//!     Term::new("1", "DNS"),
//! ];
//! let ranked: Vec<String> = rank_terms("dns", terms).into_iter().map(|t| t.title).collect();
//! assert_eq!(ranked, vec!["DNS", "DNSSEC", "UDP (uses DNS lookups)"]);
//! ```

use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;

use crate::models::{title_sort_key, Term};

/// Relevance bucket assigned to a term for a given query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceTier {
    Exact,
    TitlePrefix,
    WordBoundary,
    AliasPrefix,
    Fallback,
}

impl RelevanceTier {
    pub fn score(self) -> u32 {
        match self {
            Self::Exact => 100,
            Self::TitlePrefix => 90,
            Self::WordBoundary => 80,
            Self::AliasPrefix => 70,
            Self::Fallback => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::TitlePrefix => "title_prefix",
            Self::WordBoundary => "word_boundary",
            Self::AliasPrefix => "alias_prefix",
            Self::Fallback => "fallback",
        }
    }
}

/// A ranked term together with the tier that placed it.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredTerm {
    pub score: u32,
    pub tier: RelevanceTier,
    pub term: Term,
}

/// Regex class body of the characters that continue a run of the same
/// kind as `c`. `None` for punctuation, spaces and anything else that never
/// continues a token.
fn token_class(c: char) -> Option<&'static str> {
    match c {
        '0'..='9' | 'a'..='z' | 'A'..='Z' | '_' => Some("0-9A-Za-z_"),
        // katakana middle dot
        '\u{30FB}' => None,
        '\u{3041}'..='\u{309F}' => Some(r"\p{Hiragana}"),
        '\u{30A1}'..='\u{30FF}' => Some(r"\p{Katakana}\x{30FC}"),
        '\u{3400}'..='\u{4DBF}' | '\u{4E00}'..='\u{9FFF}' | '\u{3005}' => Some(r"\p{Han}"),
        _ => None,
    }
}

/// `query` as a whole token: each edge that could continue a run must sit
/// at a string end or next to a character of a different kind. The regex
/// crate has no lookaround, so the neighbour is matched as a character.
fn token_pattern(query: &str) -> String {
    let mut pattern = String::new();
    if let Some(class) = query.chars().next().and_then(token_class) {
        pattern.push_str(&format!("(?:^|[^{}])", class));
    }
    pattern.push_str(&regex::escape(query));
    if let Some(class) = query.chars().last().and_then(token_class) {
        pattern.push_str(&format!("(?:$|[^{}])", class));
    }
    pattern
}

/// A query prepared once and reused for every candidate.
struct PreparedQuery {
    lowered: String,
    /// `None` when the pattern could not be built; that tier is then skipped.
    word: Option<Regex>,
}

impl PreparedQuery {
    fn new(query: &str) -> Self {
        let lowered = query.trim().to_lowercase();
        // both sides are lower-cased, so no case folding is needed here
        let word = match Regex::new(&token_pattern(&lowered)) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(query = %lowered, error = %e, "word-boundary pattern rejected");
                None
            }
        };
        Self { lowered, word }
    }

    fn tier(&self, term: &Term) -> RelevanceTier {
        let title = term.title.to_lowercase();

        if title == self.lowered {
            return RelevanceTier::Exact;
        }
        if title.starts_with(&self.lowered) {
            return RelevanceTier::TitlePrefix;
        }
        if self.word.as_ref().is_some_and(|re| re.is_match(&title)) {
            return RelevanceTier::WordBoundary;
        }
        if term
            .aliases()
            .any(|alias| alias.to_lowercase().starts_with(&self.lowered))
        {
            return RelevanceTier::AliasPrefix;
        }
        RelevanceTier::Fallback
    }
}

/// Candidate filter: case-insensitive containment in title or aliases.
///
/// A blank query matches nothing; callers treat it as "no active search".
pub fn matches_query(term: &Term, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    term.title.to_lowercase().contains(&needle)
        || term
            .search_aliases
            .as_deref()
            .is_some_and(|a| a.to_lowercase().contains(&needle))
}

/// Tier of a single term for `query`.
pub fn score_term(term: &Term, query: &str) -> RelevanceTier {
    PreparedQuery::new(query).tier(term)
}

/// Order `terms` by relevance to `query`, carrying each term's tier.
///
/// A blank query returns the input order with every term at `Fallback`.
pub fn rank_scored(query: &str, terms: Vec<Term>) -> Vec<ScoredTerm> {
    let prepared = PreparedQuery::new(query);
    if prepared.lowered.is_empty() {
        return terms
            .into_iter()
            .map(|term| ScoredTerm {
                score: RelevanceTier::Fallback.score(),
                tier: RelevanceTier::Fallback,
                term,
            })
            .collect();
    }

    let mut keyed: Vec<(String, ScoredTerm)> = terms
        .into_iter()
        .map(|term| {
            let tier = prepared.tier(&term);
            let key = title_sort_key(&term.title);
            (
                key,
                ScoredTerm {
                    score: tier.score(),
                    tier,
                    term,
                },
            )
        })
        .collect();

    // sort_by is stable, so input position is the last tiebreaker
    keyed.sort_by(|(ka, a), (kb, b)| compare_ranked(ka, a, kb, b));

    keyed.into_iter().map(|(_, scored)| scored).collect()
}

/// Order `terms` by relevance to `query`.
pub fn rank_terms(query: &str, terms: Vec<Term>) -> Vec<Term> {
    rank_scored(query, terms)
        .into_iter()
        .map(|scored| scored.term)
        .collect()
}

fn compare_ranked(ka: &str, a: &ScoredTerm, kb: &str, b: &ScoredTerm) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| ka.cmp(kb))
        .then_with(|| a.term.title.cmp(&b.term.title))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(id: &str, title: &str) -> Term {
        Term::new(id, title)
    }

    fn aliased(id: &str, title: &str, aliases: &str) -> Term {
        let mut t = Term::new(id, title);
        t.search_aliases = Some(aliases.to_string());
        t
    }

    fn titles(terms: &[Term]) -> Vec<&str> {
        terms.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_dns_example() {
        let terms = vec![
            term("a", "DNS"),
            term("b", "DNSSEC"),
            term("c", "UDP (uses DNS lookups)"),
        ];
        let ranked = rank_terms("dns", terms);
        assert_eq!(titles(&ranked), vec!["DNS", "DNSSEC", "UDP (uses DNS lookups)"]);
    }

    #[test]
    fn test_tiers_for_each_case() {
        assert_eq!(score_term(&term("1", "Cache"), "cache"), RelevanceTier::Exact);
        assert_eq!(score_term(&term("1", "Cache memory"), "CACHE"), RelevanceTier::TitlePrefix);
        assert_eq!(score_term(&term("1", "Disk cache"), "cache"), RelevanceTier::WordBoundary);
        assert_eq!(
            score_term(&aliased("1", "Translation lookaside buffer", "TLB, address cache"), "addr"),
            RelevanceTier::AliasPrefix
        );
        assert_eq!(score_term(&term("1", "Precached"), "cache"), RelevanceTier::Fallback);
    }

    #[test]
    fn test_tier_hierarchy_across_mixed_input() {
        let terms = vec![
            term("f", "Subnetting"),
            aliased("e", "Internet Protocol", "net protocol"),
            term("d", "Wide area net"),
            term("c", "Network"),
            term("b", "Net"),
        ];
        let ranked = rank_scored("net", terms);
        let tiers: Vec<RelevanceTier> = ranked.iter().map(|s| s.tier).collect();
        assert_eq!(
            tiers,
            vec![
                RelevanceTier::Exact,
                RelevanceTier::TitlePrefix,
                RelevanceTier::WordBoundary,
                RelevanceTier::AliasPrefix,
                RelevanceTier::Fallback,
            ]
        );
    }

    #[test]
    fn test_ties_break_case_insensitively() {
        let terms = vec![term("1", "dns zone"), term("2", "DNS Cache")];
        let ranked = rank_terms("dns", terms);
        assert_eq!(titles(&ranked), vec!["DNS Cache", "dns zone"]);
    }

    #[test]
    fn test_ties_differing_only_in_case_are_deterministic() {
        let forward = rank_terms("ip", vec![term("1", "ipv4"), term("2", "IPv4")]);
        let backward = rank_terms("ip", vec![term("2", "IPv4"), term("1", "ipv4")]);
        assert_eq!(titles(&forward), titles(&backward));
        assert_eq!(titles(&forward), vec!["IPv4", "ipv4"]);
    }

    #[test]
    fn test_output_is_permutation() {
        let terms = vec![
            term("1", "C++"),
            term("2", "C#"),
            aliased("3", "Objective-C", "objc, c"),
            term("4", "C"),
        ];
        let mut before: Vec<String> = terms.iter().map(|t| t.id.clone()).collect();
        let mut after: Vec<String> = rank_terms("c", terms).into_iter().map(|t| t.id).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_regex_special_characters_are_escaped() {
        let ranked = rank_scored("c++", vec![term("1", "Learn c++ today"), term("2", "(c++")]);
        assert_eq!(ranked.len(), 2);
        let ranked = rank_scored("(", vec![term("1", "f(x)"), term("2", "[a-z]*")]);
        assert_eq!(ranked.len(), 2);
        let ranked = rank_scored("a.b", vec![term("1", "axb"), term("2", "see a.b here")]);
        assert_eq!(ranked[0].term.id, "2");
        assert_eq!(ranked[0].tier, RelevanceTier::WordBoundary);
        assert_eq!(ranked[1].tier, RelevanceTier::Fallback);
    }

    #[test]
    fn test_blank_query_keeps_order() {
        let ranked = rank_terms("   ", vec![term("1", "Zeta"), term("2", "Alpha")]);
        assert_eq!(titles(&ranked), vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_query_is_trimmed() {
        assert_eq!(score_term(&term("1", "RAID"), "  raid "), RelevanceTier::Exact);
    }

    #[test]
    fn test_matches_query_title_or_aliases() {
        let t = aliased("1", "Transmission Control Protocol", "TCP, tcp/ip");
        assert!(matches_query(&t, "control"));
        assert!(matches_query(&t, "TCP/IP"));
        assert!(!matches_query(&t, "udp"));
        assert!(!matches_query(&t, "  "));
    }

    #[test]
    fn test_word_boundary_next_to_japanese() {
        assert_eq!(score_term(&term("1", "逆引きDNS"), "dns"), RelevanceTier::WordBoundary);
        assert_eq!(
            score_term(&term("2", "HTTPのキャッシュ"), "キャッシュ"),
            RelevanceTier::WordBoundary
        );
        assert_eq!(score_term(&term("3", "DNSサーバ"), "サーバ"), RelevanceTier::WordBoundary);
        assert_eq!(score_term(&term("4", "mydns_zone"), "dns"), RelevanceTier::Fallback);
        assert_eq!(
            score_term(&term("5", "ブラウザキャッシュ"), "キャッシュ"),
            RelevanceTier::Fallback
        );
        assert_eq!(score_term(&term("6", "公開鍵暗号"), "暗号"), RelevanceTier::Fallback);
    }

    #[test]
    fn test_kana_ties_follow_reading_order() {
        let ranked = rank_scored(
            "検索",
            vec![
                term("1", "ハッシュの検索"),
                term("2", "あいの検索"),
                term("3", "インデックスの検索"),
            ],
        );
        assert!(ranked.iter().all(|s| s.tier == RelevanceTier::WordBoundary));
        let order: Vec<&str> = ranked.iter().map(|s| s.term.title.as_str()).collect();
        assert_eq!(order, vec!["あいの検索", "インデックスの検索", "ハッシュの検索"]);
    }

    #[test]
    fn test_missing_aliases_skip_alias_tier() {
        assert_eq!(score_term(&term("1", "Firewall"), "wall"), RelevanceTier::Fallback);
    }
}
