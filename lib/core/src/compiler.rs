//! Query compiler: expression tree -> bool query document.
//!
//! Each comparison is compiled to its own `bool` wrapper. A fragment with
//! inverted polarity goes under `must_not`, any other under a single-clause
//! `should`. Logical nodes combine the already wrapped children (`filter` for
//! `and`, `should` with `minimum_should_match: 1` for `or`) and report normal
//! polarity, since negation has been consumed at the comparison level. For the
//! same reason the root is always placed under `filter`.

use crate::ast::{Expr, LogicalOp};
use crate::catalog::FieldCatalog;
use crate::error::{Result, SchemaError};
use crate::field::Field;
use crate::lookup::Fragment;
use serde_json::{json, Value};
use std::sync::Arc;

/// Name resolution for the compiler, usually backed by an index schema
pub trait FieldResolver {
    fn resolve_name(&self, name: &str) -> Result<Arc<Field>>;

    /// Hook run on the whole tree before compilation
    fn validate(&self, _expr: &Expr) -> Result<()> {
        Ok(())
    }
}

impl FieldResolver for FieldCatalog {
    fn resolve_name(&self, name: &str) -> Result<Arc<Field>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnresolvedField(name.to_string()).into())
    }
}

impl<R: FieldResolver + ?Sized> FieldResolver for Arc<R> {
    fn resolve_name(&self, name: &str) -> Result<Arc<Field>> {
        (**self).resolve_name(name)
    }

    fn validate(&self, expr: &Expr) -> Result<()> {
        (**self).validate(expr)
    }
}

/// Compile `expr` into a bool document and its polarity
pub fn build_query<R: FieldResolver + ?Sized>(expr: &Expr, resolver: &R) -> Result<Fragment> {
    match expr {
        Expr::Logical { operator, left, right } => {
            let left = build_query(left, resolver)?;
            let right = build_query(right, resolver)?;
            let query = match operator {
                LogicalOp::Or => json!({
                    "bool": {
                        "minimum_should_match": 1,
                        "should": [left.query, right.query]
                    }
                }),
                LogicalOp::And => json!({
                    "bool": { "filter": [left.query, right.query] }
                }),
            };
            Ok(Fragment::new(query, false))
        }
        Expr::Comparison { left, operator, right } => {
            let field = resolver.resolve_name(&left.dotted())?;
            let fragment = field.get_lookup(*operator, right)?;
            let query = if fragment.invert {
                json!({ "bool": { "must_not": [fragment.query] } })
            } else {
                json!({
                    "bool": {
                        "minimum_should_match": 1,
                        "should": [fragment.query]
                    }
                })
            };
            Ok(Fragment::new(query, fragment.invert))
        }
    }
}

/// Wrap a compiled root into the final `{"query": {"bool": ...}}` envelope
pub fn finalize_query(root: Fragment) -> Value {
    json!({ "query": { "bool": { "filter": [root.query] } } })
}

/// Validate, compile and finalize in one step
pub fn get_query<R: FieldResolver + ?Sized>(expr: &Expr, resolver: &R) -> Result<Value> {
    resolver.validate(expr)?;
    let root = build_query(expr, resolver)?;
    Ok(finalize_query(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Operator;
    use crate::error::{Error, FieldError};

    fn catalog() -> FieldCatalog {
        [Field::long("a"), Field::long("b"), Field::keyword("tag"), Field::date("day")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_equality_compiles_to_single_should() {
        let fragment = build_query(&Expr::compare("a", Operator::Eq, 1), &catalog()).unwrap();
        assert!(!fragment.invert);
        assert_eq!(
            fragment.query,
            json!({"bool": {"minimum_should_match": 1, "should": [{"match": {"a": 1}}]}})
        );
    }

    #[test]
    fn test_not_equals_goes_under_must_not() {
        let query = get_query(&Expr::compare("a", Operator::NotEq, 1), &catalog()).unwrap();
        assert_eq!(
            query,
            json!({"query": {"bool": {"filter": [
                {"bool": {"must_not": [{"match": {"a": 1}}]}}
            ]}}})
        );
    }

    #[test]
    fn test_and_combines_children_under_filter() {
        let expr = Expr::and(
            Expr::compare("a", Operator::Eq, 1),
            Expr::compare("b", Operator::NotEq, 2),
        );
        let fragment = build_query(&expr, &catalog()).unwrap();
        assert!(!fragment.invert);
        assert_eq!(
            fragment.query,
            json!({"bool": {"filter": [
                {"bool": {"minimum_should_match": 1, "should": [{"match": {"a": 1}}]}},
                {"bool": {"must_not": [{"match": {"b": 2}}]}}
            ]}})
        );
    }

    #[test]
    fn test_or_of_negations_keeps_each_must_not() {
        let expr = Expr::or(
            Expr::compare("a", Operator::NotEq, 1),
            Expr::compare("b", Operator::NotEq, 2),
        );
        let fragment = build_query(&expr, &catalog()).unwrap();
        assert_eq!(
            fragment.query,
            json!({"bool": {"minimum_should_match": 1, "should": [
                {"bool": {"must_not": [{"match": {"a": 1}}]}},
                {"bool": {"must_not": [{"match": {"b": 2}}]}}
            ]}})
        );
    }

    #[test]
    fn test_unresolved_field() {
        let err = build_query(&Expr::compare("missing", Operator::Eq, 1), &catalog()).unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::UnresolvedField(ref name)) if name == "missing"));
    }

    #[test]
    fn test_field_errors_propagate() {
        let err = build_query(&Expr::compare("day", Operator::Eq, "yesterday"), &catalog()).unwrap_err();
        assert!(matches!(err, Error::Field(FieldError::InvalidDate { .. })));

        let err = build_query(&Expr::compare("a", Operator::Contains, "1"), &catalog()).unwrap_err();
        assert!(matches!(err, Error::Field(FieldError::OperatorNotAllowed { .. })));
    }

    #[test]
    fn test_not_in_is_wrapped_in_must_not() {
        let fragment = build_query(&Expr::compare("tag", Operator::NotIn, vec!["x", "y"]), &catalog()).unwrap();
        assert!(fragment.invert);
        assert_eq!(
            fragment.query,
            json!({"bool": {"must_not": [{"bool": {
                "should": [{"match": {"tag": "x"}}, {"match": {"tag": "y"}}],
                "minimum_should_match": 1
            }}]}})
        );
    }
}
