//! # elastic-dql
//!
//! Compile readable filter expressions into search-engine bool queries.
//!
//! End users write `author.name = "Ann" and pages > 300`; an external parser
//! turns that into an [`Expr`] tree, and elastic-dql resolves every field
//! against the index mapping, validates and coerces the literals, and emits
//! the nested `{"query": {"bool": ...}}` document the engine executes.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! elastic-dql --config dql.json --port 8000
//! curl 'http://localhost:8000/mappings?index=books'
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use elastic_dql::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let client = InMemoryClient::new().with_mapping("books", json!({
//!     "properties": {
//!         "title": {"type": "text", "fields": {"keyword": {"type": "keyword"}}},
//!         "pages": {"type": "integer"}
//!     }
//! }));
//! let registry = SchemaRegistry::new(
//!     &RegistryConfig::default(),
//!     Arc::new(SharedClientFactory::new(Arc::new(client))),
//! ).unwrap();
//!
//! let schema = registry.get_schema_instance("books").unwrap();
//! let expr = Expr::and(
//!     Expr::compare("pages", Operator::Gt, 300),
//!     Expr::compare("title.keyword", Operator::NotIn, vec!["Dune", "Emma"]),
//! );
//! let query = get_query(&expr, &schema).unwrap();
//! assert!(query["query"]["bool"]["filter"][0]["bool"]["filter"].is_array());
//! ```
//!
//! ## Crate Structure
//!
//! - `elastic-dql-core` - Expression tree, field registry, fragment factory, compiler
//! - `elastic-dql-schema` - Engine client, per-index schema cache, schema registry
//! - `elastic-dql-api` - REST endpoints

pub mod config;

// Re-export core types
pub use elastic_dql_core::{
    build_query, finalize_query, get_query, query_builder, ConfigError, Error, Expr, Field, FieldCatalog, FieldError,
    FieldKind, FieldMapper, FieldResolver, Fragment, Literal, LogicalOp, Name, Operator, Result, SchemaError,
};

// Re-export schema
pub use elastic_dql_schema::{
    validate_index_name, ClientFactory, ConnectionConfig, DepthLimitValidator, ExprValidator, FieldInfo, HttpClientFactory,
    HttpSearchClient, InMemoryClient, IndexPolicy, NoopValidator, RegistryConfig, Schema, SchemaRegistry,
    SearchClient, SharedClientFactory, Suggestion,
};

// Re-export API
pub use elastic_dql_api::{ApiConfig, ApiState, RestApi};

pub use config::Config;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        get_query, Config, Error, Expr, Field, FieldKind, InMemoryClient, Literal, Operator, RegistryConfig, Result,
        Schema, SchemaRegistry, SharedClientFactory,
    };
}
