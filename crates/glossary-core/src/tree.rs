//! Category tree assembly.
//!
//! Converts a flat list of parent-referencing [`Category`] records plus the
//! [`Term`]s tagged with them into a forest of [`CategoryNode`]s for
//! expand/collapse views.
//!
//! # Algorithm
//!
//! 1. Group terms by `category_id` (insertion order preserved).
//! 2. Build an id → index map over the categories (first occurrence wins).
//! 3. Resolve each parent through the map. Missing, blank, or self parents
//!    make the category a root.
//! 4. Walk from the roots; anything unreachable sits on a parent cycle. The
//!    cycle member with the lowest input position is detached and promoted
//!    to a root.
//! 5. Sort siblings at every level: explicit `order` ascending first, then
//!    categories without `order`, both by input position on ties.
//! 6. Materialize nodes recursively, moving each term group into its node.
//!
//! Every unique category id appears exactly once in the output. Malformed
//! input degrades to extra roots and never fails.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::models::{compare_titles, Category, Term};

/// Knobs applied while assembling the tree.
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    /// Sort each node's terms by title instead of keeping input order.
    pub sort_terms_by_title: bool,
    /// Per-category `order` values that replace the record's own.
    pub order_overrides: HashMap<String, i64>,
}

/// A category with its resolved children and attached terms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
    pub terms: Vec<Term>,
}

impl CategoryNode {
    pub fn id(&self) -> &str {
        &self.category.id
    }

    /// Depth-first search of this subtree.
    pub fn find(&self, id: &str) -> Option<&CategoryNode> {
        if self.category.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Terms attached to this node and all of its descendants.
    pub fn total_terms(&self) -> usize {
        self.terms.len() + self.children.iter().map(CategoryNode::total_terms).sum::<usize>()
    }

    /// Number of categories below this node.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Pre-order traversal yielding `(depth, node)`; this node is depth 0.
    pub fn walk(&self) -> Vec<(usize, &CategoryNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

/// Find a node anywhere in a forest.
pub fn find_node<'a>(roots: &'a [CategoryNode], id: &str) -> Option<&'a CategoryNode> {
    roots.iter().find_map(|root| root.find(id))
}

/// Group terms by their category reference.
///
/// Terms without a category (or with a blank one) are left out.
pub fn group_terms_by_category(terms: &[Term]) -> HashMap<String, Vec<Term>> {
    let mut groups: HashMap<String, Vec<Term>> = HashMap::new();
    for term in terms {
        if let Some(category_id) = term.category_id.as_deref().filter(|c| !c.is_empty()) {
            groups
                .entry(category_id.to_string())
                .or_default()
                .push(term.clone());
        }
    }
    groups
}

/// Build the category forest.
pub fn build_category_tree(
    categories: &[Category],
    terms: &[Term],
    options: &TreeOptions,
) -> Vec<CategoryNode> {
    let mut grouped = group_terms_by_category(terms);

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(categories.len());
    let mut unique: Vec<&Category> = Vec::with_capacity(categories.len());
    for category in categories {
        if index.contains_key(category.id.as_str()) {
            tracing::warn!(id = %category.id, "duplicate category id, keeping first occurrence");
            continue;
        }
        index.insert(category.id.as_str(), unique.len());
        unique.push(category);
    }

    let n = unique.len();
    let orders: Vec<Option<i64>> = unique
        .iter()
        .map(|c| options.order_overrides.get(&c.id).copied().or(c.order))
        .collect();

    let mut parent: Vec<Option<usize>> = Vec::with_capacity(n);
    for (i, category) in unique.iter().enumerate() {
        let resolved = match category.parent_id.as_deref().filter(|p| !p.is_empty()) {
            None => None,
            Some(parent_id) => match index.get(parent_id) {
                Some(&p) if p != i => Some(p),
                Some(_) => {
                    tracing::warn!(id = %category.id, "category lists itself as parent, treating as root");
                    None
                }
                None => {
                    tracing::debug!(id = %category.id, parent = %parent_id, "dangling parent, treating as root");
                    None
                }
            },
        };
        parent.push(resolved);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut roots: Vec<usize> = Vec::new();
    for (i, p) in parent.iter().enumerate() {
        match p {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    let mut reachable = vec![false; n];
    mark_reachable(&roots, &children, &mut reachable);

    // Unreachable nodes only have unreachable ancestors, so following parents
    // from one of them must close a cycle.
    let mut stamp = vec![usize::MAX; n];
    for start in 0..n {
        if reachable[start] {
            continue;
        }
        let mut cursor = start;
        while stamp[cursor] != start {
            stamp[cursor] = start;
            match parent[cursor] {
                Some(p) if !reachable[p] => cursor = p,
                _ => break,
            }
        }
        let promoted = if parent[cursor].is_some_and(|p| !reachable[p]) {
            cycle_min(cursor, &parent)
        } else {
            cursor
        };
        tracing::warn!(id = %unique[promoted].id, "category parent cycle, promoting to root");
        if let Some(p) = parent[promoted].take() {
            children[p].retain(|&c| c != promoted);
        }
        roots.push(promoted);
        mark_reachable(&[promoted], &children, &mut reachable);
    }

    let sibling_order = |a: &usize, b: &usize| compare_siblings(*a, *b, &orders);
    roots.sort_by(sibling_order);
    for list in children.iter_mut() {
        list.sort_by(sibling_order);
    }

    let ctx = Assembly {
        unique: &unique,
        orders: &orders,
        children: &children,
        sort_terms: options.sort_terms_by_title,
    };
    roots
        .iter()
        .map(|&root| ctx.materialize(root, &mut grouped))
        .collect()
}

/// Root → `id` path of categories, following parent references.
///
/// Stops at a missing parent or when a cycle would repeat a category.
/// Returns an empty vector when `id` is unknown.
pub fn ancestors_of(categories: &[Category], id: &str) -> Vec<Category> {
    let by_id: HashMap<&str, &Category> = categories
        .iter()
        .rev()
        .map(|c| (c.id.as_str(), c))
        .collect();

    let mut path = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = by_id.get(id).copied();
    while let Some(category) = cursor {
        if !seen.insert(category.id.as_str()) {
            break;
        }
        path.push(category.clone());
        cursor = category
            .parent_id
            .as_deref()
            .and_then(|p| by_id.get(p).copied());
    }
    path.reverse();
    path
}

fn mark_reachable(from: &[usize], children: &[Vec<usize>], reachable: &mut [bool]) {
    let mut stack: Vec<usize> = from.to_vec();
    while let Some(i) = stack.pop() {
        if reachable[i] {
            continue;
        }
        reachable[i] = true;
        stack.extend(children[i].iter().copied());
    }
}

/// Lowest input position among the members of the cycle containing `entry`.
fn cycle_min(entry: usize, parent: &[Option<usize>]) -> usize {
    let mut best = entry;
    let mut cursor = parent[entry];
    while let Some(i) = cursor {
        if i == entry {
            break;
        }
        best = best.min(i);
        cursor = parent[i];
    }
    best
}

fn compare_siblings(a: usize, b: usize, orders: &[Option<i64>]) -> Ordering {
    match (orders[a], orders[b]) {
        (Some(x), Some(y)) => x.cmp(&y).then(a.cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(&b),
    }
}

struct Assembly<'a> {
    unique: &'a [&'a Category],
    orders: &'a [Option<i64>],
    children: &'a [Vec<usize>],
    sort_terms: bool,
}

impl Assembly<'_> {
    fn materialize(&self, i: usize, grouped: &mut HashMap<String, Vec<Term>>) -> CategoryNode {
        let mut category = self.unique[i].clone();
        category.order = self.orders[i];

        let mut terms = grouped.remove(&category.id).unwrap_or_default();
        if self.sort_terms {
            terms.sort_by(|a, b| compare_titles(&a.title, &b.title));
        }

        let children = self.children[i]
            .iter()
            .map(|&child| self.materialize(child, grouped))
            .collect();

        CategoryNode {
            category,
            children,
            terms,
        }
    }
}
