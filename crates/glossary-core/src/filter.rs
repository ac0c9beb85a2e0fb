//! Term list narrowing: category/difficulty/keyword filters and the
//! recommended-term selection.

use std::cmp::Ordering;

use crate::models::{compare_titles, Difficulty, Term};
use crate::rank::matches_query;

/// Conjunctive filter over a term list. `None` fields are not applied.
#[derive(Debug, Clone, Default)]
pub struct TermFilter {
    pub category_id: Option<String>,
    pub difficulty: Option<Difficulty>,
    /// Keyword for the candidate containment check. Blank means no keyword.
    pub query: Option<String>,
}

impl TermFilter {
    pub fn matches(&self, term: &Term) -> bool {
        if let Some(ref category_id) = self.category_id {
            if term.category_id.as_deref() != Some(category_id.as_str()) {
                return false;
            }
        }
        if let Some(difficulty) = self.difficulty {
            if term.difficulty != Some(difficulty) {
                return false;
            }
        }
        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => matches_query(term, q),
            _ => true,
        }
    }

    /// Keep matching terms, preserving input order.
    pub fn apply(&self, terms: Vec<Term>) -> Vec<Term> {
        terms.into_iter().filter(|t| self.matches(t)).collect()
    }
}

/// Terms tagged with `category_id`, by `order` (absent last) then title.
pub fn terms_in_category(terms: &[Term], category_id: &str) -> Vec<Term> {
    let mut out: Vec<Term> = terms
        .iter()
        .filter(|t| t.category_id.as_deref() == Some(category_id))
        .cloned()
        .collect();
    out.sort_by(by_order_then_title);
    out
}

/// Recommended terms, by `order` (absent last) then title, at most `limit`.
pub fn recommended_terms(terms: &[Term], limit: usize) -> Vec<Term> {
    let mut out: Vec<Term> = terms.iter().filter(|t| t.is_recommended).cloned().collect();
    out.sort_by(by_order_then_title);
    out.truncate(limit);
    out
}

fn by_order_then_title(a: &Term, b: &Term) -> Ordering {
    let by_order = match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_order.then_with(|| compare_titles(&a.title, &b.title))
}
