//! # elastic-dql Schema
//!
//! Index-aware field resolution for the elastic-dql compiler.
//!
//! ## Overview
//!
//! A [`Schema`] belongs to one index. On first use it fetches the index
//! mapping through a [`SearchClient`], flattens it into typed fields and keeps
//! them cached; later resolutions never touch the engine again. The
//! [`SchemaRegistry`] owns one schema per index, applies the include/exclude
//! index policy and builds a fresh client for every new schema.
//!
//! ```rust
//! use elastic_dql_schema::{InMemoryClient, RegistryConfig, SchemaRegistry, SharedClientFactory};
//! use elastic_dql_core::{get_query, Expr, Operator};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let client = InMemoryClient::new()
//!     .with_mapping("books", json!({"properties": {"pages": {"type": "integer"}}}));
//! let factory = Arc::new(SharedClientFactory::new(Arc::new(client)));
//! let registry = SchemaRegistry::new(&RegistryConfig::default(), factory).unwrap();
//!
//! let schema = registry.get_schema_instance("books").unwrap();
//! let query = get_query(&Expr::compare("pages", Operator::Lt, 300), &schema).unwrap();
//! assert!(query["query"]["bool"]["filter"].is_array());
//! ```
//!
//! ## Request Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Registry   │────>│   Schema    │────>│   Client    │
//! │ (per index) │     │ (field map) │     │ (_mapping)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                     ┌──────┴──────┐
//!                     │  Compiler   │
//!                     │ (bool query)│
//!                     └─────────────┘
//! ```

pub mod client;
pub mod listing;
pub mod registry;
pub mod schema;
pub mod validate;

pub use client::{
    ClientFactory, ConnectionConfig, HttpClientFactory, HttpSearchClient, InMemoryClient, SearchClient,
    SharedClientFactory,
};
pub use listing::{serialize_mappings, serialize_suggestions, FieldInfo, Suggestion};
pub use registry::{validate_index_name, IndexPolicy, RegistryConfig, SchemaRegistry, ALL_INDICES};
pub use schema::{Schema, DEFAULT_SUGGESTION_SIZE};
pub use validate::{DepthLimitValidator, ExprValidator, NoopValidator};
