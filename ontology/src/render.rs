//! Human-readable renderings of a term graph.
//!
//! Terms with several parents appear under each of them; the subtree is
//! expanded at its first appearance only and later occurrences are marked
//! with `*`.

use std::collections::HashSet;

use serde_json::{json, Value};

use crate::graph::{TermGraph, TermIdx};

/// Renders the graph as an indented tree rooted at the graph root.
#[must_use]
pub fn text_tree(graph: &TermGraph) -> String {
    let mut out = String::new();
    let mut expanded = HashSet::new();
    out.push_str(graph.name(graph.root()));
    out.push('\n');
    expanded.insert(graph.root());
    write_children(graph, graph.root(), "", &mut expanded, &mut out);
    out
}

fn write_children(
    graph: &TermGraph,
    idx: TermIdx,
    prefix: &str,
    expanded: &mut HashSet<TermIdx>,
    out: &mut String,
) {
    let children = sorted_children(graph, idx);
    let last = children.len().saturating_sub(1);
    for (i, child) in children.into_iter().enumerate() {
        let (branch, indent) = if i == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(graph.name(child));
        if expanded.insert(child) {
            out.push('\n');
            write_children(graph, child, &format!("{prefix}{indent}"), expanded, out);
        } else {
            out.push_str(" *\n");
        }
    }
}

/// Renders the graph as nested `{"id", "name", "children"}` objects.
#[must_use]
pub fn json_tree(graph: &TermGraph) -> Value {
    let mut expanded = HashSet::new();
    json_node(graph, graph.root(), &mut expanded)
}

fn json_node(graph: &TermGraph, idx: TermIdx, expanded: &mut HashSet<TermIdx>) -> Value {
    let term = graph.term(idx);
    if !expanded.insert(idx) {
        return json!({ "id": term.id, "name": term.name, "repeated": true });
    }
    let children: Vec<Value> = sorted_children(graph, idx)
        .into_iter()
        .map(|c| json_node(graph, c, expanded))
        .collect();
    json!({ "id": term.id, "name": term.name, "children": children })
}

fn sorted_children(graph: &TermGraph, idx: TermIdx) -> Vec<TermIdx> {
    let mut children = graph.children(idx).to_vec();
    children.sort_by(|a, b| graph.name(*a).cmp(graph.name(*b)));
    children
}
