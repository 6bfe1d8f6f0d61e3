//! Immutable term graph.
//!
//! Terms live in an arena (`Vec<TermNode>`) addressed by [`TermIdx`]; parent
//! and child links are index lists. Construction rejects unknown parents and
//! cycles up front, prunes everything that does not descend from the
//! configured root, and stores the arena in topological order so the root is
//! always index 0 and every parent precedes its children.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::model::OntologyTerm;

/// Index of a term inside one [`TermGraph`].
///
/// Indices are only meaningful for the graph that handed them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TermIdx(usize);

impl TermIdx {
    /// Returns the raw arena position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Errors raised while constructing a term graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Two terms share an id.
    #[error("duplicate term id `{id}`")]
    DuplicateTerm {
        /// The repeated id.
        id: String,
    },
    /// A parent id does not resolve inside the graph.
    #[error("term `{term}` names unknown parent `{parent}`")]
    UnknownParent {
        /// Child term id.
        term: String,
        /// Unresolved parent id.
        parent: String,
    },
    /// The subsumption relation is not acyclic.
    #[error("cycle in term graph: {}", .path.join(" -> "))]
    Cycle {
        /// Term ids along the cycle, child to parent, first id repeated last.
        path: Vec<String>,
    },
    /// The configured root is not a term of the graph.
    #[error("root term `{root}` not found")]
    UnknownRoot {
        /// Requested root id or name.
        root: String,
    },
    /// A synonym points at a term that does not exist.
    #[error("synonym `{synonym}` points at unknown term `{target}`")]
    UnknownSynonymTarget {
        /// Synonym display name.
        synonym: String,
        /// Unresolved target.
        target: String,
    },
    /// A synonym name is already used by a real term.
    #[error("synonym `{name}` collides with an existing term name")]
    SynonymCollision {
        /// The colliding name.
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct TermNode {
    term: OntologyTerm,
    parents: Vec<TermIdx>,
    children: Vec<TermIdx>,
    depth: usize,
}

/// An immutable, validated, rooted DAG of ontology terms.
#[derive(Debug, Clone, PartialEq)]
pub struct TermGraph {
    nodes: Vec<TermNode>,
    by_id: HashMap<String, TermIdx>,
    by_name: HashMap<String, TermIdx>,
    aliases: HashMap<String, TermIdx>,
    synonyms: Vec<OntologyTerm>,
}

impl TermGraph {
    /// Builds a graph from parsed terms, rooted at `root` (an id or a name).
    ///
    /// Terms that do not descend from the root are dropped, and parent links
    /// leaving the root's subtree are cut.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] on duplicate ids, unresolved parents, cycles
    /// (including self-parents), a missing root, or a dangling synonym.
    pub fn build<I>(terms: I, root: &str) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = OntologyTerm>,
    {
        let (synonyms, terms): (Vec<OntologyTerm>, Vec<OntologyTerm>) = terms
            .into_iter()
            .partition(|term| term.synonym_for.is_some());

        let mut raw_ids: HashMap<String, usize> = HashMap::with_capacity(terms.len());
        for (i, term) in terms.iter().enumerate() {
            if raw_ids.insert(term.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateTerm {
                    id: term.id.clone(),
                });
            }
        }

        let mut raw_parents: Vec<Vec<usize>> = Vec::with_capacity(terms.len());
        for term in &terms {
            let mut list = Vec::with_capacity(term.parents.len());
            for parent in &term.parents {
                if *parent == term.id {
                    return Err(GraphError::Cycle {
                        path: vec![term.id.clone(), term.id.clone()],
                    });
                }
                let &p = raw_ids
                    .get(parent)
                    .ok_or_else(|| GraphError::UnknownParent {
                        term: term.id.clone(),
                        parent: parent.clone(),
                    })?;
                if !list.contains(&p) {
                    list.push(p);
                }
            }
            raw_parents.push(list);
        }

        let order = topological_order(&terms, &raw_parents)?;

        let root_raw = raw_ids
            .get(root)
            .copied()
            .or_else(|| terms.iter().position(|t| t.name == root))
            .ok_or_else(|| GraphError::UnknownRoot {
                root: root.to_owned(),
            })?;

        let keep = subtree_mask(terms.len(), &raw_parents, root_raw);
        let pruned = keep.iter().filter(|k| !**k).count();
        if pruned > 0 {
            debug!(pruned, root, "dropped terms outside the root's subtree");
        }

        let known_raw: HashSet<String> = terms
            .iter()
            .flat_map(|t| [t.id.clone(), t.name.clone()])
            .collect();

        // Arena in topological order: the root lands at index 0.
        let mut slots: Vec<Option<OntologyTerm>> = terms.into_iter().map(Some).collect();
        let mut remap: Vec<Option<TermIdx>> = vec![None; slots.len()];
        let mut nodes: Vec<TermNode> = Vec::with_capacity(slots.len() - pruned);
        for &i in &order {
            if !keep[i] {
                continue;
            }
            if let Some(term) = slots[i].take() {
                remap[i] = Some(TermIdx(nodes.len()));
                nodes.push(TermNode {
                    term,
                    parents: Vec::new(),
                    children: Vec::new(),
                    depth: 0,
                });
            }
        }

        for &i in &order {
            let Some(child) = remap[i] else { continue };
            let parents: Vec<TermIdx> = raw_parents[i].iter().filter_map(|&p| remap[p]).collect();
            for &parent in &parents {
                nodes[parent.0].children.push(child);
            }
            let depth = parents
                .iter()
                .map(|p| nodes[p.0].depth + 1)
                .max()
                .unwrap_or(0);
            let node = &mut nodes[child.0];
            node.term
                .parents
                .retain(|id| raw_ids.get(id.as_str()).and_then(|&r| remap[r]).is_some());
            node.parents = parents;
            node.depth = depth;
        }

        let mut by_id: HashMap<String, TermIdx> = HashMap::with_capacity(nodes.len());
        let mut by_name: HashMap<String, TermIdx> = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            by_id.insert(node.term.id.clone(), TermIdx(i));
            if let Some(&first) = by_name.get(&node.term.name) {
                warn!(
                    name = %node.term.name,
                    kept = %nodes[first.0].term.id,
                    shadowed = %node.term.id,
                    "duplicate term name; lookups by name use the first term"
                );
            } else {
                by_name.insert(node.term.name.clone(), TermIdx(i));
            }
        }

        let mut graph = TermGraph {
            nodes,
            by_id,
            by_name,
            aliases: HashMap::new(),
            synonyms: Vec::new(),
        };

        for mut synonym in synonyms {
            let target = synonym.synonym_for.clone().unwrap_or_default();
            let Some(idx) = graph.lookup(&target) else {
                if known_raw.contains(&target) {
                    debug!(synonym = %synonym.name, %target, "synonym target pruned; dropping synonym");
                    continue;
                }
                return Err(GraphError::UnknownSynonymTarget {
                    synonym: synonym.name,
                    target,
                });
            };
            if graph.by_name.contains_key(&synonym.name) || graph.by_id.contains_key(&synonym.name)
            {
                return Err(GraphError::SynonymCollision { name: synonym.name });
            }
            synonym.synonym_for = Some(graph.nodes[idx.0].term.id.clone());
            synonym.parents.clear();
            graph.aliases.insert(synonym.name.clone(), idx);
            graph.synonyms.push(synonym);
        }

        Ok(graph)
    }

    /// Returns the root term.
    #[must_use]
    pub fn root(&self) -> TermIdx {
        TermIdx(0)
    }

    /// Returns the id of the root term.
    #[must_use]
    pub fn root_id(&self) -> &str {
        &self.nodes[0].term.id
    }

    /// Number of terms (synonyms excluded).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a graph holds at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the term stored at `idx`.
    #[must_use]
    pub fn term(&self, idx: TermIdx) -> &OntologyTerm {
        &self.nodes[idx.0].term
    }

    /// Returns the display name of the term at `idx`.
    #[must_use]
    pub fn name(&self, idx: TermIdx) -> &str {
        &self.nodes[idx.0].term.name
    }

    /// Direct parents, in declaration order.
    #[must_use]
    pub fn parents(&self, idx: TermIdx) -> &[TermIdx] {
        &self.nodes[idx.0].parents
    }

    /// Direct children, in arena order.
    #[must_use]
    pub fn children(&self, idx: TermIdx) -> &[TermIdx] {
        &self.nodes[idx.0].children
    }

    /// Length of the longest path from the root to `idx`.
    #[must_use]
    pub fn depth(&self, idx: TermIdx) -> usize {
        self.nodes[idx.0].depth
    }

    /// Resolves an id, a display name, or a synonym name, in that order.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<TermIdx> {
        self.by_id
            .get(key)
            .or_else(|| self.by_name.get(key))
            .or_else(|| self.aliases.get(key))
            .copied()
    }

    /// Returns true if `key` resolves through [`TermGraph::lookup`].
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Returns `idx` followed by all of its transitive parents, each once,
    /// in breadth-first order.
    #[must_use]
    pub fn ancestors(&self, idx: TermIdx) -> Vec<TermIdx> {
        self.walk(idx, |node| &node.parents)
    }

    /// Returns `idx` followed by all of its transitive children, each once,
    /// in breadth-first order.
    #[must_use]
    pub fn descendants(&self, idx: TermIdx) -> Vec<TermIdx> {
        self.walk(idx, |node| &node.children)
    }

    fn walk<F>(&self, start: TermIdx, next: F) -> Vec<TermIdx>
    where
        F: Fn(&TermNode) -> &Vec<TermIdx>,
    {
        let mut seen = HashSet::from([start]);
        let mut out = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &n in next(&self.nodes[current.0]) {
                if seen.insert(n) {
                    out.push(n);
                    queue.push_back(n);
                }
            }
        }
        out
    }

    /// Iterates all terms in topological order (root first).
    pub fn iter(&self) -> impl Iterator<Item = (TermIdx, &OntologyTerm)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (TermIdx(i), &node.term))
    }

    /// Synonym terms, each pointing at the id of its target.
    #[must_use]
    pub fn synonyms(&self) -> &[OntologyTerm] {
        &self.synonyms
    }

    /// Returns the graph's terms (parents restricted to surviving terms)
    /// followed by its synonyms; building from this list reproduces the graph.
    #[must_use]
    pub fn to_terms(&self) -> Vec<OntologyTerm> {
        self.nodes
            .iter()
            .map(|node| node.term.clone())
            .chain(self.synonyms.iter().cloned())
            .collect()
    }

    /// Returns a new graph with `extra` terms added. An extra term whose id
    /// already exists is unified with the existing term (parents unioned,
    /// existing property declarations win).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] if the extended graph is invalid, notably when
    /// the additions introduce a cycle.
    pub fn extend<I>(&self, extra: I) -> Result<TermGraph, GraphError>
    where
        I: IntoIterator<Item = OntologyTerm>,
    {
        let mut merged: IndexMap<String, OntologyTerm> = self
            .nodes
            .iter()
            .map(|node| (node.term.id.clone(), node.term.clone()))
            .collect();
        let mut synonyms = self.synonyms.clone();
        for term in extra {
            if term.synonym_for.is_some() {
                synonyms.push(term);
            } else if let Some(existing) = merged.get_mut(&term.id) {
                existing.absorb(term);
            } else {
                merged.insert(term.id.clone(), term);
            }
        }
        let root = self.root_id().to_owned();
        TermGraph::build(merged.into_values().chain(synonyms), &root)
    }

    /// Returns the subgraph induced by `seeds` and all of their ancestors.
    ///
    /// # Errors
    ///
    /// Never fails for seeds of this graph; the result is re-validated like
    /// any other build.
    pub fn subgraph<I>(&self, seeds: I) -> Result<TermGraph, GraphError>
    where
        I: IntoIterator<Item = TermIdx>,
    {
        let mut keep: HashSet<TermIdx> = HashSet::from([self.root()]);
        for seed in seeds {
            keep.extend(self.ancestors(seed));
        }
        let ids: HashSet<&str> = keep.iter().map(|&i| self.term(i).id.as_str()).collect();
        let terms = self
            .nodes
            .iter()
            .filter(|node| ids.contains(node.term.id.as_str()))
            .map(|node| {
                let mut term = node.term.clone();
                term.parents.retain(|p| ids.contains(p.as_str()));
                term
            });
        TermGraph::build(terms, self.root_id())
    }
}

/// Kahn's algorithm over raw parent lists; reports one concrete cycle when
/// the relation is not acyclic.
fn topological_order(
    terms: &[OntologyTerm],
    parents: &[Vec<usize>],
) -> Result<Vec<usize>, GraphError> {
    let n = terms.len();
    let mut indegree: Vec<usize> = parents.iter().map(Vec::len).collect();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (child, ps) in parents.iter().enumerate() {
        for &p in ps {
            children[p].push(child);
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(i) = queue.pop_front() {
        order.push(i);
        for &c in &children[i] {
            indegree[c] -= 1;
            if indegree[c] == 0 {
                queue.push_back(c);
            }
        }
    }

    if order.len() == n {
        return Ok(order);
    }

    // Every unprocessed term has an unprocessed parent; follow those until
    // a term repeats.
    let stuck = (0..n).find(|&i| indegree[i] > 0).unwrap_or(0);
    let mut position: HashMap<usize, usize> = HashMap::new();
    let mut path: Vec<usize> = Vec::new();
    let mut current = stuck;
    while !position.contains_key(&current) {
        position.insert(current, path.len());
        path.push(current);
        current = parents[current]
            .iter()
            .copied()
            .find(|&p| indegree[p] > 0)
            .unwrap_or(current);
    }
    let start = position.get(&current).copied().unwrap_or(0);
    let mut cycle: Vec<String> = path[start..].iter().map(|&i| terms[i].id.clone()).collect();
    cycle.push(terms[current].id.clone());
    Err(GraphError::Cycle { path: cycle })
}

fn subtree_mask(n: usize, parents: &[Vec<usize>], root: usize) -> Vec<bool> {
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (child, ps) in parents.iter().enumerate() {
        for &p in ps {
            children[p].push(child);
        }
    }
    let mut keep = vec![false; n];
    keep[root] = true;
    let mut queue = VecDeque::from([root]);
    while let Some(i) = queue.pop_front() {
        for &c in &children[i] {
            if !keep[c] {
                keep[c] = true;
                queue.push_back(c);
            }
        }
    }
    keep
}
