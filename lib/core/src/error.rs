use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),
}

impl Error {
    /// True for errors caused by the request (bad field, bad value, excluded index),
    /// false for startup configuration problems.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Config(_))
    }
}

/// Value and operator checks against a single field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("Field \"{field}\" is not nullable, can't compare it to null")]
    NotNullable { field: String },

    #[error("Field \"{field}\" has \"{field_type}\" type. It can be compared to {expected}, but not to {value}")]
    InvalidType {
        field: String,
        field_type: String,
        expected: &'static str,
        value: String,
    },

    #[error("Field \"{field}\" expects dates in \"YYYY-MM-DD\" format, got {value}")]
    InvalidDate { field: String, value: String },

    #[error("Operator \"{operator}\" is not valid for field \"{field}\" of type \"{field_type}\"")]
    OperatorNotAllowed {
        field: String,
        field_type: String,
        operator: String,
    },

    #[error("Can't convert {value} to {target} for field \"{field}\"")]
    ValueConversion {
        field: String,
        target: &'static str,
        value: String,
    },
}

/// Field resolution, mapping and search-engine failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("invalid field_name: {0}")]
    UnresolvedField(String),

    #[error("invalid field type: {0}")]
    UnknownFieldType(String),

    #[error("index {0} can't be used because it's excluded")]
    IndexExcluded(String),

    #[error("invalid index name: {0}")]
    InvalidIndexName(String),

    #[error("index not specified")]
    IndexNotSpecified,

    #[error("field {0} hasn't type keyword")]
    NotSuggestable(String),

    #[error("Mapping fetch failed: {0}")]
    MappingFetch(String),

    #[error("Search failed: {0}")]
    Search(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Either include_indices or exclude_indices can be specified, but not both")]
    ConflictingIndexPolicy,

    #[error("One of include_indices or exclude_indices must be specified")]
    MissingIndexPolicy,

    #[error("if accept_index_param is false default_index must be specified")]
    MissingDefaultIndex,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
