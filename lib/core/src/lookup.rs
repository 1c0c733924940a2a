//! Operator fragment factory.
//!
//! Maps each comparison [`Operator`] to a stateless [`QueryBuilder`] that turns a
//! field name and an already formatted value into a search-engine query fragment.
//! The engine has no native "not equals", so negated operators produce the same
//! fragment as their positive twin and set [`Fragment::invert`]; the compiler
//! wraps such fragments in `must_not`.

use crate::ast::Operator;
use crate::value::Literal;
use serde_json::{json, Value};

/// A generated query document plus its polarity.
///
/// `invert == true` means the caller must logically negate `query`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub query: Value,
    pub invert: bool,
}

impl Fragment {
    pub fn new(query: Value, invert: bool) -> Self {
        Self { query, invert }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeBound {
    fn key(&self) -> &'static str {
        match self {
            RangeBound::Gt => "gt",
            RangeBound::Gte => "gte",
            RangeBound::Lt => "lt",
            RangeBound::Lte => "lte",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Match,
    Range(RangeBound),
    /// `*value*`
    Contains,
    /// One match per listed value, any of them may match
    AnyOf,
    Prefix,
    /// `*value`
    Suffix,
}

/// Stateless fragment generator for one operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryBuilder {
    kind: QueryKind,
    invert: bool,
}

impl QueryBuilder {
    pub const fn new(kind: QueryKind, invert: bool) -> Self {
        Self { kind, invert }
    }

    #[inline]
    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    #[inline]
    pub fn invert(&self) -> bool {
        self.invert
    }

    pub fn generate(&self, field_name: &str, value: &Literal) -> Fragment {
        let query = match self.kind {
            QueryKind::Match => match_query(field_name, value),
            QueryKind::Range(bound) => json!({
                "range": { field_name: { bound.key(): value.to_json() } }
            }),
            QueryKind::Contains => wildcard_query(field_name, format!("*{}*", escape_wildcard(&value.as_text()))),
            QueryKind::Suffix => wildcard_query(field_name, format!("*{}", escape_wildcard(&value.as_text()))),
            QueryKind::Prefix => json!({
                "prefix": { field_name: { "value": value.to_json() } }
            }),
            QueryKind::AnyOf => {
                let should: Vec<Value> = match value {
                    Literal::List(items) => items.iter().map(|v| match_query(field_name, v)).collect(),
                    single => vec![match_query(field_name, single)],
                };
                json!({
                    "bool": {
                        "should": should,
                        "minimum_should_match": 1
                    }
                })
            }
        };
        Fragment::new(query, self.invert)
    }
}

/// Builder for `operator`; operator membership is checked by the field beforehand.
pub fn query_builder(operator: Operator) -> QueryBuilder {
    match operator {
        Operator::Eq => QueryBuilder::new(QueryKind::Match, false),
        Operator::NotEq => QueryBuilder::new(QueryKind::Match, true),
        Operator::Gt => QueryBuilder::new(QueryKind::Range(RangeBound::Gt), false),
        Operator::Gte => QueryBuilder::new(QueryKind::Range(RangeBound::Gte), false),
        Operator::Lt => QueryBuilder::new(QueryKind::Range(RangeBound::Lt), false),
        Operator::Lte => QueryBuilder::new(QueryKind::Range(RangeBound::Lte), false),
        Operator::Contains => QueryBuilder::new(QueryKind::Contains, false),
        Operator::NotContains => QueryBuilder::new(QueryKind::Contains, true),
        Operator::In => QueryBuilder::new(QueryKind::AnyOf, false),
        Operator::NotIn => QueryBuilder::new(QueryKind::AnyOf, true),
        Operator::StartsWith => QueryBuilder::new(QueryKind::Prefix, false),
        Operator::NotStartsWith => QueryBuilder::new(QueryKind::Prefix, true),
        Operator::EndsWith => QueryBuilder::new(QueryKind::Suffix, false),
        Operator::NotEndsWith => QueryBuilder::new(QueryKind::Suffix, true),
    }
}

/// `field` has any value. Inverted for `field = null`.
pub fn exists_query(field_name: &str) -> Value {
    json!({ "exists": { "field": field_name } })
}

/// Backslash-escape `*`, `?` and `\` so user text matches literally inside a wildcard pattern
pub fn escape_wildcard(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn wildcard_query(field_name: &str, pattern: String) -> Value {
    json!({ "wildcard": { field_name: { "value": pattern } } })
}

fn match_query(field_name: &str, value: &Literal) -> Value {
    json!({ "match": { field_name: value.to_json() } })
}
