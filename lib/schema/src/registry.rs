use crate::client::ClientFactory;
use crate::schema::{Schema, DEFAULT_SUGGESTION_SIZE};
use crate::validate::{ExprValidator, NoopValidator};
use elastic_dql_core::{ConfigError, Result, SchemaError};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

/// Include-set entry matching every index
pub const ALL_INDICES: &str = "*";

const MAX_INDEX_NAME_BYTES: usize = 255;

/// Reject names the engine would read as a pattern, a list or a path.
///
/// Follows the engine's own index naming rules, so every concrete index or
/// alias name passes; `%` is refused as well since names end up in a URL.
pub fn validate_index_name(index: &str) -> std::result::Result<(), SchemaError> {
    let invalid = index.is_empty()
        || index.len() > MAX_INDEX_NAME_BYTES
        || index == "."
        || index == ".."
        || index.starts_with(['-', '_', '+'])
        || index
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || "\\/*?\"<>|,#:%".contains(c));
    if invalid {
        return Err(SchemaError::InvalidIndexName(index.to_string()));
    }
    Ok(())
}

/// Which indices a registry serves and how their schemas are built
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub include_indices: Vec<String>,

    #[serde(default)]
    pub exclude_indices: Vec<String>,

    /// Field names hidden per index
    #[serde(default)]
    pub field_limits: HashMap<String, Vec<String>>,

    #[serde(default = "default_suggestion_size")]
    pub suggestion_size: usize,
}

fn default_suggestion_size() -> usize {
    DEFAULT_SUGGESTION_SIZE
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            include_indices: vec![ALL_INDICES.to_string()],
            exclude_indices: Vec::new(),
            field_limits: HashMap::new(),
            suggestion_size: DEFAULT_SUGGESTION_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexPolicy {
    Include(HashSet<String>),
    Exclude(HashSet<String>),
}

impl IndexPolicy {
    /// Exactly one of the two sets must be non-empty
    pub fn from_sets<I, E>(include: I, exclude: E) -> std::result::Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
        E: IntoIterator<Item = String>,
    {
        let include: HashSet<String> = include.into_iter().collect();
        let exclude: HashSet<String> = exclude.into_iter().collect();
        match (include.is_empty(), exclude.is_empty()) {
            (false, false) => Err(ConfigError::ConflictingIndexPolicy),
            (true, true) => Err(ConfigError::MissingIndexPolicy),
            (false, true) => Ok(IndexPolicy::Include(include)),
            (true, false) => Ok(IndexPolicy::Exclude(exclude)),
        }
    }

    pub fn excluded(&self, index: &str) -> bool {
        match self {
            IndexPolicy::Include(include) => !include.contains(ALL_INDICES) && !include.contains(index),
            IndexPolicy::Exclude(exclude) => exclude.contains(index),
        }
    }
}

/// Per-index schema memo shared by every request
pub struct SchemaRegistry {
    policy: Arc<IndexPolicy>,
    field_limits: HashMap<String, Vec<String>>,
    suggestion_size: usize,
    clients: Arc<dyn ClientFactory>,
    default_validator: Arc<dyn ExprValidator>,
    schemas: RwLock<HashMap<String, Arc<Schema>>>,
}

impl SchemaRegistry {
    pub fn new(config: &RegistryConfig, clients: Arc<dyn ClientFactory>) -> Result<Self> {
        let policy = IndexPolicy::from_sets(
            config.include_indices.iter().cloned(),
            config.exclude_indices.iter().cloned(),
        )?;

        Ok(Self {
            policy: Arc::new(policy),
            field_limits: config.field_limits.clone(),
            suggestion_size: config.suggestion_size,
            clients,
            default_validator: Arc::new(NoopValidator),
            schemas: RwLock::new(HashMap::new()),
        })
    }

    /// Validator used by [`SchemaRegistry::get_schema_instance`]
    pub fn with_default_validator(mut self, validator: Arc<dyn ExprValidator>) -> Self {
        self.default_validator = validator;
        self
    }

    #[inline]
    pub fn policy(&self) -> &IndexPolicy {
        &self.policy
    }

    #[inline]
    pub fn excluded(&self, index: &str) -> bool {
        self.policy.excluded(index)
    }

    pub fn get_schema_instance(&self, index: &str) -> Result<Arc<Schema>> {
        self.get_schema_instance_with(index, self.default_validator.clone())
    }

    /// Memoized schema for `index`, rebuilt when the cached one uses a
    /// different validator kind.
    pub fn get_schema_instance_with(&self, index: &str, validator: Arc<dyn ExprValidator>) -> Result<Arc<Schema>> {
        validate_index_name(index)?;
        if self.excluded(index) {
            return Err(SchemaError::IndexExcluded(index.to_string()).into());
        }

        let kind = validator.kind();
        if let Some(schema) = self.cached(index, &kind) {
            return Ok(schema);
        }

        let mut schemas = self.schemas.write();
        if let Some(schema) = schemas.get(index).filter(|s| s.validator_kind() == kind) {
            return Ok(schema.clone());
        }

        let schema = Arc::new(self.create_schema(index, validator)?);
        info!("Created schema for index {} ({})", index, schema.validator_kind());
        schemas.insert(index.to_string(), schema.clone());
        Ok(schema)
    }

    /// Indices with a memoized schema
    #[must_use]
    pub fn cached_indices(&self) -> Vec<String> {
        self.schemas.read().keys().cloned().collect()
    }

    fn cached(&self, index: &str, kind: &str) -> Option<Arc<Schema>> {
        self.schemas
            .read()
            .get(index)
            .filter(|schema| schema.validator_kind() == kind)
            .cloned()
    }

    fn create_schema(&self, index: &str, validator: Arc<dyn ExprValidator>) -> Result<Schema> {
        let client = self.clients.create()?;
        let excluded = self.field_limits.get(index).cloned().unwrap_or_default();
        Ok(Schema::new(index, client)
            .with_excluded_fields(excluded)
            .with_validator(validator)
            .with_index_policy(self.policy.clone())
            .with_suggestion_size(self.suggestion_size))
    }
}
