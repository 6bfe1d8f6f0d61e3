//! Resolution of a schema selection against a term graph.
//!
//! Resolution runs in two phases. Planning synthesizes the terms the schema
//! asks for (explicit `is_a` children and chains, implicit
//! `namespace.parent` subclasses, synonym aliases) and re-validates the
//! extended graph. Resolution then walks every class through a memoized
//! builder that computes its ancestor chain and merged property schema.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use biograph_ontology::{GraphError, OntologyTerm, PropertyType, TermGraph, TermIdx};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ClassSpec, Representation, SchemaConfig};

/// Provenance keys every schema carries in strict mode.
pub const PROVENANCE_KEYS: [&str; 3] = ["source", "version", "license"];

/// Order of names in a resolved ancestor chain.
///
/// Has no default; a run names its policy and applies it to every class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// All chain names sorted lexicographically.
    Alphabetic,
    /// Most specific first, root last; ties broken by name.
    Specificity,
}

/// Run-wide resolution options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogOptions {
    /// Ancestor chain order.
    pub ordering: OrderingPolicy,
    /// Add [`PROVENANCE_KEYS`] to every schema.
    pub strict: bool,
}

impl CatalogOptions {
    /// Options with the given ordering and strict mode off.
    #[must_use]
    pub fn new(ordering: OrderingPolicy) -> Self {
        Self {
            ordering,
            strict: false,
        }
    }

    /// Sets strict mode.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Fatal schema resolution errors. Each names the offending class.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A direct mapping names no term of the graph.
    #[error("class `{class}` is not a term of the ontology")]
    ClassNotInOntology {
        /// Offending class.
        class: String,
    },
    /// An `is_a` or `synonym_for` reference never resolves.
    #[error("class `{class}` references `{reference}`, which does not resolve")]
    UnresolvedReference {
        /// Offending class.
        class: String,
        /// The unresolved name.
        reference: String,
    },
    /// Namespace and label lists cannot be paired.
    #[error(
        "class `{class}` pairs {namespaces} preferred_id namespaces with {labels} input labels"
    )]
    PairingMismatch {
        /// Offending class.
        class: String,
        /// Length of `preferred_id`.
        namespaces: usize,
        /// Length of `input_label`.
        labels: usize,
    },
    /// Two classes claim the same input label.
    #[error("input label `{label}` is claimed by both `{first}` and `{second}`")]
    AmbiguousLabel {
        /// The contested label.
        label: String,
        /// Class registered first.
        first: String,
        /// Class registered second.
        second: String,
    },
    /// Property inheritance loops back onto the class being resolved.
    #[error("property inheritance of `{class}` loops back onto itself")]
    InheritanceCycle {
        /// Offending class.
        class: String,
    },
    /// A relationship endpoint names no class or term.
    #[error("relationship `{class}` names unknown endpoint `{endpoint}`")]
    UnknownEndpoint {
        /// Offending class.
        class: String,
        /// The unknown endpoint.
        endpoint: String,
    },
    /// Mutually exclusive fields are both set.
    #[error("class `{class}`: {reason}")]
    Conflict {
        /// Offending class.
        class: String,
        /// What conflicts.
        reason: String,
    },
    /// The extended term graph is invalid, e.g. `is_a` closed a cycle.
    #[error("extending the term graph failed")]
    Graph(#[from] GraphError),
}

/// How a resolved class came to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassOrigin {
    /// The class name is an ontology term.
    Direct,
    /// Synthesized below its `is_a` parent(s).
    Explicit,
    /// Synthesized from a (namespace, label) pair of `parent`.
    Implicit {
        /// Preferred-id namespace of the pair.
        namespace: String,
        /// Synthesizing class.
        parent: String,
    },
    /// Alternate name for `target`.
    Synonym {
        /// Class or term the synonym stands for.
        target: String,
    },
}

/// A class after resolution: immutable and shared across workers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedClass {
    /// Canonical class name.
    pub name: String,
    /// How the class was produced.
    pub origin: ClassOrigin,
    /// Id of the term the class sits on in the extended graph.
    pub term: String,
    /// The class and all of its ancestors, in the run's ordering policy.
    pub ancestors: Vec<String>,
    /// Declared ∪ inherited − excluded.
    pub properties: IndexMap<String, PropertyType>,
    /// Node or edge.
    pub represented_as: Representation,
    /// True for relationship classes.
    pub relationship: bool,
    /// Identifier namespace, if any.
    pub preferred_id: Option<String>,
    /// Input labels routed to this class.
    pub input_labels: Vec<String>,
    /// Relationship source class.
    pub source: Option<String>,
    /// Relationship target class.
    pub target: Option<String>,
    /// Edge label override.
    pub label_as_edge: Option<String>,
    /// Whether relationship entities carry ids.
    pub use_id: bool,
    /// Uninterpreted spec fields.
    pub extra: IndexMap<String, serde_json::Value>,
}

impl ResolvedClass {
    /// True for relationship classes.
    #[must_use]
    pub fn is_relationship(&self) -> bool {
        self.relationship
    }

    /// True when entities of this class become nodes (including reified
    /// relationships).
    #[must_use]
    pub fn materializes_as_node(&self) -> bool {
        self.represented_as == Representation::Node
    }

    /// Label for edges of this class.
    #[must_use]
    pub fn relationship_label(&self) -> &str {
        self.label_as_edge.as_deref().unwrap_or(&self.name)
    }
}

/// All resolved classes of a run plus the extended term graph they sit on.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    graph: TermGraph,
    classes: IndexMap<String, Arc<ResolvedClass>>,
    options: CatalogOptions,
}

impl SchemaCatalog {
    /// Resolves `config` against `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] for unresolvable classes or references,
    /// mismatched implicit pairings, conflicting fields, unknown endpoints,
    /// inheritance loops, or an extended graph that fails validation.
    pub fn build(
        graph: &TermGraph,
        config: &SchemaConfig,
        options: CatalogOptions,
    ) -> Result<Self, SchemaError> {
        let plan = Planner::run(graph, config)?;
        let synthetic = plan.extras.len();
        let extended = graph.extend(plan.extras.into_values().chain(plan.synonyms))?;

        let mut builder = Builder {
            graph: &extended,
            config,
            options,
            class_terms: &plan.class_terms,
            implicit_terms: &plan.implicit_terms,
            resolved: HashMap::new(),
            implicit: HashMap::new(),
            in_progress: HashSet::new(),
        };

        let mut classes = IndexMap::with_capacity(config.len());
        for (name, spec) in config.iter() {
            let class = builder.resolve(name)?;
            classes.insert(name.clone(), class);
            if spec.is_paired() {
                for namespace in spec.preferred_ids() {
                    let key = (name.clone(), namespace.clone());
                    if let Some(child) = builder.implicit.get(&key) {
                        classes.insert(child.name.clone(), Arc::clone(child));
                    }
                }
            }
        }

        info!(
            classes = classes.len(),
            synthetic,
            terms = extended.len(),
            ordering = ?options.ordering,
            "resolved schema"
        );
        Ok(Self {
            graph: extended,
            classes,
            options,
        })
    }

    /// The term graph extended with synthetic terms.
    #[must_use]
    pub fn graph(&self) -> &TermGraph {
        &self.graph
    }

    /// Looks up a class by name.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&Arc<ResolvedClass>> {
        self.classes.get(name)
    }

    /// Iterates classes: configured classes in authoring order, each followed
    /// by its implicit subclasses.
    pub fn classes(&self) -> impl Iterator<Item = &Arc<ResolvedClass>> {
        self.classes.values()
    }

    /// Number of resolved classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// True when nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Options the catalog was resolved with.
    #[must_use]
    pub fn options(&self) -> CatalogOptions {
        self.options
    }
}

enum Step {
    Done,
    Blocked(String),
}

#[derive(Default)]
struct Plan {
    extras: IndexMap<String, OntologyTerm>,
    synonyms: Vec<OntologyTerm>,
    aliases: HashMap<String, String>,
    // term id -> class name
    class_terms: HashMap<String, String>,
    // implicit term id -> (parent class, namespace)
    implicit_terms: HashMap<String, (String, String)>,
    planned: HashSet<String>,
}

struct Planner<'a> {
    graph: &'a TermGraph,
    config: &'a SchemaConfig,
    plan: Plan,
}

impl<'a> Planner<'a> {
    /// Plans every class, retrying blocked ones until a pass makes no
    /// progress.
    fn run(graph: &'a TermGraph, config: &'a SchemaConfig) -> Result<Plan, SchemaError> {
        let mut planner = Planner {
            graph,
            config,
            plan: Plan::default(),
        };
        let mut pending: Vec<(&String, &ClassSpec)> = config.iter().collect();
        while !pending.is_empty() {
            let mut blocked = Vec::new();
            let mut progressed = false;
            for (name, spec) in pending {
                match planner.plan(name, spec)? {
                    Step::Done => {
                        planner.plan.planned.insert(name.clone());
                        progressed = true;
                    }
                    Step::Blocked(reference) => blocked.push((name, spec, reference)),
                }
            }
            if !progressed {
                if let Some((name, _, reference)) = blocked.first() {
                    return Err(if reference == *name {
                        SchemaError::ClassNotInOntology {
                            class: (*name).clone(),
                        }
                    } else {
                        SchemaError::UnresolvedReference {
                            class: (*name).clone(),
                            reference: reference.clone(),
                        }
                    });
                }
            }
            pending = blocked.into_iter().map(|(n, s, _)| (n, s)).collect();
        }
        Ok(planner.plan)
    }

    fn canonical(&self, name: &str) -> Option<String> {
        if self.plan.extras.contains_key(name) {
            return Some(name.to_owned());
        }
        if let Some(target) = self.plan.aliases.get(name) {
            return Some(target.clone());
        }
        self.graph
            .lookup(name)
            .map(|idx| self.graph.term(idx).id.clone())
    }

    /// A configured class that is not planned yet blocks its dependents.
    fn is_pending(&self, current: &str, name: &str) -> bool {
        name != current && self.config.contains(name) && !self.plan.planned.contains(name)
    }

    fn plan(&mut self, name: &str, spec: &ClassSpec) -> Result<Step, SchemaError> {
        let namespaces = spec.preferred_ids().len();
        let labels = spec.input_labels().len();
        if namespaces > 1 && namespaces != labels {
            return Err(SchemaError::PairingMismatch {
                class: name.to_owned(),
                namespaces,
                labels,
            });
        }

        let mut seen = HashSet::new();
        if let Some(namespace) = spec.preferred_ids().iter().find(|ns| !seen.insert(*ns)) {
            return Err(SchemaError::Conflict {
                class: name.to_owned(),
                reason: format!("namespace `{namespace}` is listed twice in `preferred_id`"),
            });
        }

        if let Some(target) = &spec.synonym_for {
            if spec.is_a.is_some() {
                return Err(SchemaError::Conflict {
                    class: name.to_owned(),
                    reason: "`synonym_for` and `is_a` are mutually exclusive".to_owned(),
                });
            }
            if self.is_pending(name, target) {
                return Ok(Step::Blocked(target.clone()));
            }
            let Some(id) = self.canonical(target) else {
                return Ok(Step::Blocked(target.clone()));
            };
            debug!(class = name, target = %id, "registered synonym");
            self.plan
                .synonyms
                .push(OntologyTerm::new(name, name).synonym_of(id.clone()));
            self.plan.aliases.insert(name.to_owned(), id);
            return Ok(Step::Done);
        }

        let own_id = match spec.parents().split_last() {
            Some((last, intermediates)) => {
                for reference in spec.parents() {
                    if self.is_pending(name, reference) {
                        return Ok(Step::Blocked(reference.clone()));
                    }
                }
                let Some(mut parent) = self.canonical(last) else {
                    return Ok(Step::Blocked(last.clone()));
                };
                for intermediate in intermediates.iter().rev() {
                    parent = match self.canonical(intermediate) {
                        Some(id) => {
                            self.add_parent(&id, parent);
                            id
                        }
                        None => {
                            debug!(class = name, term = %intermediate, parent = %parent, "synthesized intermediate term");
                            self.plan.extras.insert(
                                intermediate.clone(),
                                OntologyTerm::new(intermediate, intermediate).with_parent(parent),
                            );
                            intermediate.clone()
                        }
                    };
                }
                match self.canonical(name) {
                    Some(id) => {
                        self.add_parent(&id, parent);
                        id
                    }
                    None => {
                        let mut term = OntologyTerm::new(name, name).with_parent(parent);
                        term.properties = spec.properties.clone();
                        self.plan.extras.insert(name.to_owned(), term);
                        name.to_owned()
                    }
                }
            }
            None => match self.canonical(name) {
                Some(id) => id,
                None => return Ok(Step::Blocked(name.to_owned())),
            },
        };

        if spec.is_paired() {
            for namespace in spec.preferred_ids() {
                let implicit = format!("{namespace}.{name}");
                if self.canonical(&implicit).is_none() {
                    self.plan.extras.insert(
                        implicit.clone(),
                        OntologyTerm::new(&implicit, &implicit).with_parent(own_id.clone()),
                    );
                }
                self.plan
                    .implicit_terms
                    .insert(implicit, (name.to_owned(), namespace.clone()));
            }
        }

        self.plan
            .class_terms
            .entry(own_id)
            .or_insert_with(|| name.to_owned());
        Ok(Step::Done)
    }

    fn add_parent(&mut self, id: &str, parent: String) {
        match self.plan.extras.get_mut(id) {
            Some(term) => {
                if !term.parents.contains(&parent) && term.id != parent {
                    term.parents.push(parent);
                }
            }
            None => {
                self.plan
                    .extras
                    .insert(id.to_owned(), OntologyTerm::new(id, id).with_parent(parent));
            }
        }
    }
}

struct Builder<'a> {
    graph: &'a TermGraph,
    config: &'a SchemaConfig,
    options: CatalogOptions,
    class_terms: &'a HashMap<String, String>,
    implicit_terms: &'a HashMap<String, (String, String)>,
    resolved: HashMap<String, Arc<ResolvedClass>>,
    implicit: HashMap<(String, String), Arc<ResolvedClass>>,
    in_progress: HashSet<String>,
}

impl Builder<'_> {
    fn resolve(&mut self, name: &str) -> Result<Arc<ResolvedClass>, SchemaError> {
        if let Some(class) = self.resolved.get(name) {
            return Ok(Arc::clone(class));
        }
        if !self.in_progress.insert(name.to_owned()) {
            return Err(SchemaError::InheritanceCycle {
                class: name.to_owned(),
            });
        }

        let config = self.config;
        let graph = self.graph;
        let not_found = || SchemaError::ClassNotInOntology {
            class: name.to_owned(),
        };
        let spec = config.get(name).ok_or_else(not_found)?;
        let idx = graph.lookup(name).ok_or_else(not_found)?;

        let class = match &spec.synonym_for {
            Some(target) => self.resolve_synonym(name, spec, target, idx)?,
            None => self.resolve_spec(name, spec, idx)?,
        };
        let class = Arc::new(class);

        if spec.is_paired() {
            for (namespace, label) in spec.preferred_ids().iter().zip(spec.input_labels()) {
                let child = self.resolve_implicit(&class, namespace, label)?;
                self.implicit
                    .insert((name.to_owned(), namespace.clone()), Arc::new(child));
            }
        }

        self.in_progress.remove(name);
        self.resolved.insert(name.to_owned(), Arc::clone(&class));
        Ok(class)
    }

    fn resolve_spec(
        &mut self,
        name: &str,
        spec: &ClassSpec,
        idx: TermIdx,
    ) -> Result<ResolvedClass, SchemaError> {
        let graph = self.graph;
        let mut own = graph.term(idx).properties.clone();
        for (key, ty) in &spec.properties {
            own.insert(key.clone(), *ty);
        }

        let mut properties = if spec.inherit_properties {
            let nearest = match spec.parents().first() {
                Some(parent) => graph.lookup(parent),
                None => graph.parents(idx).first().copied(),
            };
            let mut merged = match nearest {
                Some(parent) => self.schema_of_term(parent)?,
                None => IndexMap::new(),
            };
            for (key, ty) in own {
                merged.insert(key, ty);
            }
            merged
        } else {
            own
        };
        for key in &spec.exclude_properties {
            properties.shift_remove(key);
        }
        self.add_provenance(&mut properties);

        let source = self.endpoint(name, spec.source.as_deref())?;
        let target = self.endpoint(name, spec.target.as_deref())?;

        let input_labels = if spec.is_paired() {
            Vec::new()
        } else if spec.input_labels().is_empty() {
            vec![name.to_owned()]
        } else {
            spec.input_labels().to_vec()
        };
        let preferred_id = if spec.is_paired() {
            None
        } else {
            spec.preferred_ids().first().cloned()
        };

        Ok(ResolvedClass {
            name: name.to_owned(),
            origin: if spec.is_a.is_some() {
                ClassOrigin::Explicit
            } else {
                ClassOrigin::Direct
            },
            term: graph.term(idx).id.clone(),
            ancestors: self.chain(idx, Some(name)),
            properties,
            represented_as: spec.represented_as,
            relationship: spec.is_relationship(),
            preferred_id,
            input_labels,
            source,
            target,
            label_as_edge: spec.label_as_edge.clone(),
            use_id: spec.use_id,
            extra: spec.extra.clone(),
        })
    }

    /// Synonyms copy the target's chain and schema verbatim and keep their
    /// own name, labels and representation.
    fn resolve_synonym(
        &mut self,
        name: &str,
        spec: &ClassSpec,
        target: &str,
        idx: TermIdx,
    ) -> Result<ResolvedClass, SchemaError> {
        let (ancestors, mut properties, preferred) = if self.config.contains(target) {
            let resolved = self.resolve(target)?;
            (
                resolved.ancestors.clone(),
                resolved.properties.clone(),
                resolved.preferred_id.clone(),
            )
        } else {
            (self.chain(idx, None), self.schema_of_term(idx)?, None)
        };
        self.add_provenance(&mut properties);

        let input_labels = if spec.input_labels().is_empty() {
            vec![name.to_owned()]
        } else {
            spec.input_labels().to_vec()
        };

        Ok(ResolvedClass {
            name: name.to_owned(),
            origin: ClassOrigin::Synonym {
                target: target.to_owned(),
            },
            term: self.graph.term(idx).id.clone(),
            ancestors,
            properties,
            represented_as: spec.represented_as,
            relationship: spec.is_relationship(),
            preferred_id: spec.preferred_ids().first().cloned().or(preferred),
            input_labels,
            source: self.endpoint(name, spec.source.as_deref())?,
            target: self.endpoint(name, spec.target.as_deref())?,
            label_as_edge: spec.label_as_edge.clone(),
            use_id: spec.use_id,
            extra: spec.extra.clone(),
        })
    }

    fn resolve_implicit(
        &self,
        parent: &ResolvedClass,
        namespace: &str,
        label: &str,
    ) -> Result<ResolvedClass, SchemaError> {
        let name = format!("{namespace}.{}", parent.name);
        let idx = self
            .graph
            .lookup(&name)
            .ok_or_else(|| SchemaError::ClassNotInOntology {
                class: name.clone(),
            })?;
        Ok(ResolvedClass {
            origin: ClassOrigin::Implicit {
                namespace: namespace.to_owned(),
                parent: parent.name.clone(),
            },
            term: self.graph.term(idx).id.clone(),
            ancestors: self.chain(idx, Some(&name)),
            preferred_id: Some(namespace.to_owned()),
            input_labels: vec![label.to_owned()],
            name,
            ..parent.clone()
        })
    }

    /// Merged schema of whatever class sits on `idx`, or the term's own
    /// declarations when no class does.
    fn schema_of_term(
        &mut self,
        idx: TermIdx,
    ) -> Result<IndexMap<String, PropertyType>, SchemaError> {
        let graph = self.graph;
        let class_terms = self.class_terms;
        let implicit_terms = self.implicit_terms;
        let id = &graph.term(idx).id;
        if let Some(class) = class_terms.get(id) {
            return Ok(self.resolve(class)?.properties.clone());
        }
        if let Some((parent, namespace)) = implicit_terms.get(id) {
            self.resolve(parent)?;
            if let Some(child) = self.implicit.get(&(parent.clone(), namespace.clone())) {
                return Ok(child.properties.clone());
            }
        }
        Ok(graph.term(idx).properties.clone())
    }

    fn add_provenance(&self, properties: &mut IndexMap<String, PropertyType>) {
        if self.options.strict {
            for key in PROVENANCE_KEYS {
                properties
                    .entry(key.to_owned())
                    .or_insert(PropertyType::STR);
            }
        }
    }

    fn endpoint(&self, class: &str, endpoint: Option<&str>) -> Result<Option<String>, SchemaError> {
        match endpoint {
            None => Ok(None),
            Some(name) if self.config.contains(name) || self.graph.contains(name) => {
                Ok(Some(name.to_owned()))
            }
            Some(name) => Err(SchemaError::UnknownEndpoint {
                class: class.to_owned(),
                endpoint: name.to_owned(),
            }),
        }
    }

    /// Ancestor names of `idx` in the run's order; `own_name` replaces the
    /// term's display name for the class itself.
    fn chain(&self, idx: TermIdx, own_name: Option<&str>) -> Vec<String> {
        let graph = self.graph;
        let mut entries: Vec<(usize, &str)> = graph
            .ancestors(idx)
            .into_iter()
            .map(|i| {
                let name = match own_name {
                    Some(own) if i == idx => own,
                    _ => graph.name(i),
                };
                (graph.depth(i), name)
            })
            .collect();
        match self.options.ordering {
            OrderingPolicy::Specificity => {
                entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
            }
            OrderingPolicy::Alphabetic => entries.sort_by(|a, b| a.1.cmp(b.1)),
        }
        let mut seen = HashSet::new();
        entries
            .into_iter()
            .filter(|(_, name)| seen.insert(*name))
            .map(|(_, name)| name.to_owned())
            .collect()
    }
}
