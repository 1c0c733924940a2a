//! # elastic-dql Core
//!
//! Core library for compiling query-language expressions into search-engine
//! bool queries.
//!
//! This crate provides:
//!
//! - [`Expr`] - The parsed expression tree handed over by the parser
//! - [`Field`] - Typed fields with validation, coercion and operator rules
//! - [`FieldMapper`] - Mapping -> flat field list translator
//! - [`query_builder`] - Operator -> query fragment factory
//! - [`build_query`] / [`get_query`] - The bool query compiler
//!
//! ## Example
//!
//! ```rust
//! use elastic_dql_core::{get_query, Expr, Field, FieldCatalog, Operator};
//!
//! let catalog: FieldCatalog = vec![Field::long("price"), Field::keyword("tag")]
//!     .into_iter()
//!     .collect();
//!
//! let expr = Expr::and(
//!     Expr::compare("price", Operator::Gte, 10),
//!     Expr::compare("tag", Operator::NotEq, "sale"),
//! );
//! let query = get_query(&expr, &catalog).unwrap();
//! assert!(query["query"]["bool"]["filter"].is_array());
//! ```

pub mod ast;
pub mod catalog;
pub mod compiler;
pub mod error;
pub mod field;
pub mod lookup;
pub mod mapping;
pub mod value;

pub use ast::{Expr, LogicalOp, Name, Operator};
pub use catalog::FieldCatalog;
pub use compiler::{build_query, finalize_query, get_query, FieldResolver};
pub use error::{ConfigError, Error, FieldError, Result, SchemaError};
pub use field::{Field, FieldKind};
pub use lookup::{escape_wildcard, query_builder, Fragment, QueryBuilder, QueryKind, RangeBound};
pub use mapping::{dot_join, FieldMapper};
pub use value::Literal;
