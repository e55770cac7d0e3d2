//! Decision tree over required route values.
//!
//! Each item carries the `(key, value)` pairs it requires. At every node the
//! key shared by the most remaining items becomes a criterion; items are
//! partitioned by their value for that key and the rest move on to the next
//! criterion of the same node. Every item ends up in exactly one leaf.
//!
//! A lookup follows the explicit value of each criterion key. When the key is
//! not given explicitly it follows both the ambient value and the empty
//! branch; results reached through the empty branch are fallbacks.

use crate::values::{RouteValue, RouteValueDictionary};
use std::collections::HashMap;

/// A match reached by [`LinkDecisionTree::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TreeMatch {
    pub(crate) item: usize,
    pub(crate) is_fallback: bool,
}

#[derive(Debug, Default)]
struct TreeNode {
    matches: Vec<usize>,
    criteria: Vec<Criterion>,
}

#[derive(Debug)]
struct Criterion {
    key: String,
    /// Keyed on the lowercased invariant text; `""` holds null and empty.
    branches: HashMap<String, TreeNode>,
}

/// Required-values index used by route-value link generation.
#[derive(Debug, Default)]
pub(crate) struct LinkDecisionTree {
    root: TreeNode,
}

fn branch_key(value: &RouteValue) -> String {
    value.as_invariant_str().to_ascii_lowercase()
}

impl LinkDecisionTree {
    /// `items[i]` holds the required values of item `i`.
    pub(crate) fn build(items: &[RouteValueDictionary]) -> Self {
        let pending: Vec<(usize, Vec<(String, String)>)> = items
            .iter()
            .enumerate()
            .map(|(i, required)| {
                let criteria = required
                    .iter()
                    .map(|(k, v)| (k.to_ascii_lowercase(), branch_key(v)))
                    .collect();
                (i, criteria)
            })
            .collect();
        Self {
            root: build_node(pending),
        }
    }

    /// Items compatible with `values` and `ambient`, in leaf order.
    pub(crate) fn find(
        &self,
        values: &RouteValueDictionary,
        ambient: Option<&RouteValueDictionary>,
    ) -> Vec<TreeMatch> {
        let mut results = Vec::new();
        walk(&self.root, values, ambient, false, &mut results);
        results
    }
}

fn build_node(mut pending: Vec<(usize, Vec<(String, String)>)>) -> TreeNode {
    let mut node = TreeNode::default();
    pending.retain(|(item, criteria)| {
        if criteria.is_empty() {
            node.matches.push(*item);
            false
        } else {
            true
        }
    });

    while !pending.is_empty() {
        // Most common key first; ties go to the smallest key.
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for (_, criteria) in &pending {
            for (key, _) in criteria {
                *counts.entry(key.as_str()).or_default() += 1;
            }
        }
        let Some(key) = counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(key, _)| key.to_string())
        else {
            break;
        };

        let mut partitions: HashMap<String, Vec<(usize, Vec<(String, String)>)>> = HashMap::new();
        let mut rest = Vec::new();
        for (item, mut criteria) in pending {
            match criteria.iter().position(|(k, _)| *k == key) {
                Some(pos) => {
                    let (_, value) = criteria.remove(pos);
                    partitions.entry(value).or_default().push((item, criteria));
                }
                None => rest.push((item, criteria)),
            }
        }

        node.criteria.push(Criterion {
            key,
            branches: partitions
                .into_iter()
                .map(|(value, items)| (value, build_node(items)))
                .collect(),
        });
        pending = rest;
    }
    node
}

fn walk(
    node: &TreeNode,
    values: &RouteValueDictionary,
    ambient: Option<&RouteValueDictionary>,
    is_fallback: bool,
    results: &mut Vec<TreeMatch>,
) {
    results.extend(node.matches.iter().map(|&item| TreeMatch { item, is_fallback }));

    for criterion in &node.criteria {
        if let Some(value) = values.get(&criterion.key) {
            if let Some(branch) = criterion.branches.get(&branch_key(value)) {
                walk(branch, values, ambient, is_fallback, results);
            }
            continue;
        }
        if let Some(value) = ambient.and_then(|a| a.get(&criterion.key)) {
            if !value.is_empty() {
                if let Some(branch) = criterion.branches.get(&branch_key(value)) {
                    walk(branch, values, ambient, is_fallback, results);
                }
            }
        }
        if let Some(branch) = criterion.branches.get("") {
            walk(branch, values, ambient, true, results);
        }
    }
}
