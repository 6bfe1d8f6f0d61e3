//! Stream checks applied to translated entities before they reach a sink.

use std::collections::{BTreeMap, BTreeSet};

use biograph_translate::{EntityKind, GraphEntity, LabelTally};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Guard settings for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Require provenance (`source`, `version`, `license`/`licence`).
    pub strict_mode: bool,
    /// Abort on the first strict-mode violation instead of rejecting the
    /// record.
    pub strict_fatal: bool,
}

/// Guard failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// A strict-mode entity lacks required provenance.
    #[error("strict mode: {class} entity {id} is missing {}", .missing.join(", "))]
    StrictMode {
        /// Class of the entity.
        class: String,
        /// Entity id, or `source->target` for edges without one.
        id: String,
        /// Missing provenance keys.
        missing: Vec<String>,
    },
    /// Two entities of one class expose different key sets.
    #[error("shape mismatch for class {class}: expected keys [{}], found [{}]", .expected.join(", "), .found.join(", "))]
    ShapeConsistency {
        /// Class whose entities disagree.
        class: String,
        /// First key set seen for the class.
        expected: Vec<String>,
        /// Offending key set.
        found: Vec<String>,
    },
}

/// Outcome of checking one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Pass the entity on.
    Accepted,
    /// Drop the entity; the run continues.
    Rejected(GuardError),
}

/// Strict-mode and shape-consistency checks over an entity stream.
///
/// Each translator worker owns a guard; [`ConsistencyGuard::merge`] folds
/// them together and re-checks shapes across workers.
#[derive(Debug, Clone, Default)]
pub struct ConsistencyGuard {
    config: GuardConfig,
    shapes: BTreeMap<String, BTreeSet<String>>,
    accepted: usize,
    rejections: BTreeMap<String, LabelTally>,
}

impl ConsistencyGuard {
    /// A guard with no entities seen.
    #[must_use]
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Checks one entity: strict mode first, then shape.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::ShapeConsistency`] on any key-set mismatch, and
    /// [`GuardError::StrictMode`] when a violation occurs with
    /// `strict_fatal` set.
    pub fn check(&mut self, entity: &GraphEntity) -> Result<Admission, GuardError> {
        if self.config.strict_mode && !entity.is_link() {
            let missing = missing_provenance(entity);
            if !missing.is_empty() {
                let violation = GuardError::StrictMode {
                    class: entity.class.clone(),
                    id: entity_ref(entity),
                    missing,
                };
                if self.config.strict_fatal {
                    error!(%violation, "strict mode violation");
                    return Err(violation);
                }
                warn!(%violation, "rejecting entity");
                self.rejections
                    .entry(entity.class.clone())
                    .or_default()
                    .hit(&entity_ref(entity));
                return Ok(Admission::Rejected(violation));
            }
        }

        self.check_shape(&entity.class, entity.properties.keys())?;
        self.accepted += 1;
        Ok(Admission::Accepted)
    }

    /// Lazily guards `entities`: rejected entities are skipped, a fatal
    /// error is yielded once and ends the stream.
    pub fn guard_stream<I>(&mut self, entities: I) -> Guarded<'_, I::IntoIter>
    where
        I: IntoIterator<Item = GraphEntity>,
    {
        Guarded {
            guard: self,
            entities: entities.into_iter(),
            failed: false,
        }
    }

    /// Folds another worker's guard into this one.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::ShapeConsistency`] when the two guards saw
    /// different key sets for one class.
    pub fn merge(&mut self, other: ConsistencyGuard) -> Result<(), GuardError> {
        for (class, keys) in other.shapes {
            self.check_shape(&class, keys.iter())?;
        }
        self.accepted += other.accepted;
        for (class, tally) in other.rejections {
            self.rejections.entry(class).or_default().merge(tally);
        }
        Ok(())
    }

    /// Settings in effect.
    #[must_use]
    pub fn config(&self) -> GuardConfig {
        self.config
    }

    /// Entities that passed.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Entities rejected by strict mode.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejections.values().map(|t| t.count).sum()
    }

    /// Strict-mode rejections per class, with example ids.
    #[must_use]
    pub fn rejections(&self) -> &BTreeMap<String, LabelTally> {
        &self.rejections
    }

    /// Key set recorded for each class.
    #[must_use]
    pub fn shapes(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.shapes
    }

    fn check_shape<'k>(
        &mut self,
        class: &str,
        keys: impl Iterator<Item = &'k String>,
    ) -> Result<(), GuardError> {
        let found: BTreeSet<&str> = keys.map(String::as_str).collect();
        match self.shapes.get(class) {
            Some(expected) if !expected.iter().map(String::as_str).eq(found.iter().copied()) => {
                let err = GuardError::ShapeConsistency {
                    class: class.to_owned(),
                    expected: expected.iter().cloned().collect(),
                    found: found.into_iter().map(str::to_owned).collect(),
                };
                error!(%err, "shape consistency breached");
                Err(err)
            }
            Some(_) => Ok(()),
            None => {
                self.shapes.insert(
                    class.to_owned(),
                    found.into_iter().map(str::to_owned).collect(),
                );
                Ok(())
            }
        }
    }
}

fn missing_provenance(entity: &GraphEntity) -> Vec<String> {
    let mut missing = Vec::new();
    for key in ["source", "version"] {
        if entity.value(key).is_none() {
            missing.push(key.to_owned());
        }
    }
    if entity.value("license").is_none() && entity.value("licence").is_none() {
        missing.push("license".to_owned());
    }
    missing
}

fn entity_ref(entity: &GraphEntity) -> String {
    entity.id.clone().unwrap_or_else(|| match &entity.kind {
        EntityKind::Edge { source, target, .. } | EntityKind::Link { source, target, .. } => {
            format!("{source}->{target}")
        }
        EntityKind::Node => String::new(),
    })
}

/// Guarded entity stream returned by [`ConsistencyGuard::guard_stream`].
#[derive(Debug)]
pub struct Guarded<'g, I> {
    guard: &'g mut ConsistencyGuard,
    entities: I,
    failed: bool,
}

impl<I> Iterator for Guarded<'_, I>
where
    I: Iterator<Item = GraphEntity>,
{
    type Item = Result<GraphEntity, GuardError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        for entity in self.entities.by_ref() {
            match self.guard.check(&entity) {
                Ok(Admission::Accepted) => return Some(Ok(entity)),
                Ok(Admission::Rejected(_)) => {}
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}
