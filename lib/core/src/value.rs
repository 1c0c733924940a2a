//! Literal values appearing on the right-hand side of a comparison.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A literal as produced by the expression parser.
///
/// Deserializes from plain JSON: integers become [`Literal::Int`], other
/// numbers [`Literal::Float`], arrays [`Literal::List`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Literal>),
}

impl Literal {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Short type name used in validation messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::String(_) => "string",
            Literal::List(_) => "list",
        }
    }

    /// JSON representation sent to the search engine
    pub fn to_json(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::from(*i),
            Literal::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Literal::String(s) => Value::String(s.clone()),
            Literal::List(items) => Value::Array(items.iter().map(Literal::to_json).collect()),
        }
    }

    /// Unquoted text form, used when a value is spliced into a wildcard pattern
    pub fn as_text(&self) -> String {
        match self {
            Literal::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<i64> for Literal {
    fn from(i: i64) -> Self {
        Literal::Int(i)
    }
}

impl From<i32> for Literal {
    fn from(i: i32) -> Self {
        Literal::Int(i64::from(i))
    }
}

impl From<f64> for Literal {
    fn from(f: f64) -> Self {
        Literal::Float(f)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(items: Vec<T>) -> Self {
        Literal::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Literal::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_distinguishes_int_and_float() {
        let parsed: Vec<Literal> = serde_json::from_value(json!([1, 2.5, "x", true, null, [1, 2]])).unwrap();
        assert_eq!(
            parsed,
            vec![
                Literal::Int(1),
                Literal::Float(2.5),
                Literal::String("x".to_string()),
                Literal::Bool(true),
                Literal::Null,
                Literal::List(vec![Literal::Int(1), Literal::Int(2)]),
            ]
        );
    }

    #[test]
    fn test_display_quotes_strings() {
        assert_eq!(Literal::from("abc").to_string(), "\"abc\"");
        assert_eq!(Literal::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(Literal::from("abc").as_text(), "abc");
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Literal::from(vec!["a", "b"]).to_json(), json!(["a", "b"]));
        assert_eq!(Literal::Float(f64::NAN).to_json(), Value::Null);
    }
}
