//! TOML run configuration.
//!
//! Relative paths are resolved against the directory of the configuration
//! file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use biograph_ontology::JoinSpec;
use biograph_schema::OrderingPolicy;
use biograph_translate::LinkDirection;
use serde::Deserialize;

/// Run configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum RunConfigError {
    /// The file could not be read.
    #[error("failed to read run configuration {path}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for a run configuration.
    #[error("invalid run configuration")]
    Parse(#[from] toml::de::Error),
    /// The configuration is well formed but inconsistent.
    #[error("invalid run configuration: {0}")]
    Invalid(String),
}

/// Head ontology: a JSON array of terms plus the root to prune against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeadSource {
    /// Term file.
    pub terms: PathBuf,
    /// Root term id or name.
    pub root: String,
}

/// A tail ontology referenced by join specs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TailSource {
    /// Name joins use in `tail_source`.
    pub source: String,
    /// Term file.
    pub terms: PathBuf,
    /// Root term id or name.
    pub root: String,
}

/// On-disk term graph cache.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Cache directory.
    pub dir: PathBuf,
    /// Clear the cache before building.
    #[serde(default)]
    pub clear: bool,
}

/// Everything one build or translation run needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Ancestor ordering; deliberately has no default.
    pub ordering: OrderingPolicy,
    /// Schema selection (YAML).
    pub schema: PathBuf,
    /// Head ontology.
    pub head: HeadSource,
    /// Tail ontologies.
    #[serde(default)]
    pub tails: Vec<TailSource>,
    /// Join points, applied in order.
    #[serde(default)]
    pub joins: Vec<JoinSpec>,
    /// Require provenance on every entity.
    #[serde(default)]
    pub strict_mode: bool,
    /// Abort on the first strict-mode violation.
    #[serde(default)]
    pub strict_fatal: bool,
    /// Direction of links emitted for reified relationships.
    #[serde(default)]
    pub link_direction: LinkDirection,
    /// Term graph cache; absent disables caching.
    #[serde(default)]
    pub cache: Option<CacheConfig>,
    /// Base IRI for RDF exports.
    #[serde(default = "default_base_iri")]
    pub base_iri: String,
}

fn default_base_iri() -> String {
    "https://w3id.org/biograph/".to_owned()
}

impl RunConfig {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`RunConfigError`] if the file cannot be read, parsed or
    /// validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RunConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RunConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&content, base)
    }

    /// Parses a configuration, resolving relative paths against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`RunConfigError`] if parsing or validation fails.
    pub fn from_toml_str(content: &str, base: &Path) -> Result<Self, RunConfigError> {
        let mut config: RunConfig = toml::from_str(content)?;
        config.rebase(base);
        config.validate()?;
        Ok(config)
    }

    fn rebase(&mut self, base: &Path) {
        let rebase = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        rebase(&mut self.schema);
        rebase(&mut self.head.terms);
        for tail in &mut self.tails {
            rebase(&mut tail.terms);
        }
        if let Some(cache) = &mut self.cache {
            rebase(&mut cache.dir);
        }
    }

    fn validate(&self) -> Result<(), RunConfigError> {
        if self.head.root.is_empty() {
            return Err(RunConfigError::Invalid("head.root must not be empty".into()));
        }
        let mut sources = HashSet::new();
        for tail in &self.tails {
            if tail.root.is_empty() {
                return Err(RunConfigError::Invalid(format!(
                    "tail {} has an empty root",
                    tail.source
                )));
            }
            if !sources.insert(tail.source.as_str()) {
                return Err(RunConfigError::Invalid(format!(
                    "tail source {} is declared twice",
                    tail.source
                )));
            }
        }
        for join in &self.joins {
            if !sources.contains(join.tail_source.as_str()) {
                return Err(RunConfigError::Invalid(format!(
                    "join at {} names undeclared tail source {}",
                    join.head, join.tail_source
                )));
            }
        }
        if self.strict_fatal && !self.strict_mode {
            return Err(RunConfigError::Invalid(
                "strict_fatal requires strict_mode".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
ordering = "specificity"
schema = "schema.yaml"
strict_mode = true

[head]
terms = "biolink.json"
root = "entity"

[[tails]]
source = "so"
terms = "/data/so.json"
root = "sequence_variant"

[[joins]]
head = "sequence variant"
tail_source = "so"
tail = "sequence_variant"
merge = true

[cache]
dir = "cache"
"#;

    #[test]
    fn parses_and_rebases_paths() {
        let config = RunConfig::from_toml_str(CONFIG, Path::new("/etc/biograph")).unwrap();
        assert_eq!(config.ordering, OrderingPolicy::Specificity);
        assert_eq!(config.schema, Path::new("/etc/biograph/schema.yaml"));
        assert_eq!(config.head.terms, Path::new("/etc/biograph/biolink.json"));
        assert_eq!(config.tails[0].terms, Path::new("/data/so.json"));
        assert_eq!(config.cache.unwrap().dir, Path::new("/etc/biograph/cache"));
        assert!(config.joins[0].merge);
        assert_eq!(config.link_direction, LinkDirection::Directed);
        assert_eq!(config.base_iri, "https://w3id.org/biograph/");
    }

    #[test]
    fn ordering_is_required() {
        let without = CONFIG.replace("ordering = \"specificity\"\n", "");
        assert!(matches!(
            RunConfig::from_toml_str(&without, Path::new(".")),
            Err(RunConfigError::Parse(_))
        ));
    }

    #[test]
    fn joins_must_name_declared_tails() {
        let bad = CONFIG.replace("tail_source = \"so\"", "tail_source = \"mondo\"");
        let err = RunConfig::from_toml_str(&bad, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("undeclared tail source mondo"));
    }

    #[test]
    fn strict_fatal_needs_strict_mode() {
        let bad = CONFIG.replace("strict_mode = true", "strict_fatal = true");
        assert!(matches!(
            RunConfig::from_toml_str(&bad, Path::new(".")),
            Err(RunConfigError::Invalid(_))
        ));
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(&path, CONFIG).unwrap();
        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.schema, dir.path().join("schema.yaml"));
    }
}
