//! Parsed expression tree.
//!
//! The query-language parser lives outside this crate; it hands over an
//! [`Expr`] built from logical and comparison nodes. The tree serializes as
//! tagged JSON so a pre-parsed expression can be shipped over HTTP:
//!
//! ```json
//! {"type": "logical", "operator": "and",
//!  "left":  {"type": "comparison", "left": "price", "operator": ">", "right": 10},
//!  "right": {"type": "comparison", "left": "tags.keyword", "operator": "in", "right": ["a", "b"]}}
//! ```

use crate::value::Literal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    And,
    Or,
}

/// Comparison operators of the query language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "~")]
    Contains,
    #[serde(rename = "!~")]
    NotContains,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
    #[serde(rename = "startswith")]
    StartsWith,
    #[serde(rename = "not startswith")]
    NotStartsWith,
    #[serde(rename = "endswith")]
    EndsWith,
    #[serde(rename = "not endswith")]
    NotEndsWith,
}

impl Operator {
    pub const ALL: [Operator; 14] = [
        Operator::Eq,
        Operator::NotEq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Contains,
        Operator::NotContains,
        Operator::In,
        Operator::NotIn,
        Operator::StartsWith,
        Operator::NotStartsWith,
        Operator::EndsWith,
        Operator::NotEndsWith,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Contains => "~",
            Operator::NotContains => "!~",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::StartsWith => "startswith",
            Operator::NotStartsWith => "not startswith",
            Operator::EndsWith => "endswith",
            Operator::NotEndsWith => "not endswith",
        }
    }

    /// Operators whose right-hand side is a list
    #[inline]
    pub fn takes_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Operator {
    type Err = crate::Error;

    fn from_str(token: &str) -> crate::Result<Self> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.token() == token)
            .ok_or_else(|| crate::Error::InvalidExpression(format!("unknown operator: {}", token)))
    }
}

/// Dotted field reference, e.g. `author.name.keyword`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Name {
    pub parts: Vec<String>,
}

impl Name {
    pub fn new(parts: Vec<String>) -> Self {
        Self { parts }
    }

    /// Parts joined with "."
    pub fn dotted(&self) -> String {
        self.parts.join(".")
    }
}

impl From<String> for Name {
    fn from(path: String) -> Self {
        Self::from(path.as_str())
    }
}

impl From<&str> for Name {
    fn from(path: &str) -> Self {
        Self {
            parts: path.split('.').map(str::to_string).collect(),
        }
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.dotted()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expr {
    Logical {
        operator: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Comparison {
        left: Name,
        operator: Operator,
        right: Literal,
    },
}

impl Expr {
    pub fn compare(name: impl Into<Name>, operator: Operator, value: impl Into<Literal>) -> Self {
        Expr::Comparison {
            left: name.into(),
            operator,
            right: value.into(),
        }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::Logical {
            operator: LogicalOp::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Logical {
            operator: LogicalOp::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Nesting depth; a single comparison has depth 1
    pub fn depth(&self) -> usize {
        match self {
            Expr::Logical { left, right, .. } => 1 + left.depth().max(right.depth()),
            Expr::Comparison { .. } => 1,
        }
    }
}
