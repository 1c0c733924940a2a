//! Field type registry.
//!
//! Every mapped field of an index becomes a [`Field`] whose [`FieldKind`] decides
//! which values it accepts, how they are coerced and which operators may be
//! applied to it. Operator membership is checked before any fragment is built.

use crate::ast::Operator;
use crate::error::FieldError;
use crate::lookup::{exists_query, query_builder, Fragment};
use crate::value::Literal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const NUMERIC_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::NotEq,
    Operator::Gt,
    Operator::Gte,
    Operator::Lt,
    Operator::Lte,
    Operator::In,
    Operator::NotIn,
];

const BOOLEAN_OPERATORS: &[Operator] = &[Operator::Eq, Operator::NotEq, Operator::In, Operator::NotIn];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Closed set of field variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Long,
    Float,
    Text,
    Date,
    Boolean,
    /// Exact-match string; the only kind that can suggest values
    Keyword,
}

impl FieldKind {
    /// Kind for an engine type tag, `None` when the tag is not supported
    pub fn from_engine_type(tag: &str) -> Option<Self> {
        let kind = match tag {
            "long" | "integer" | "short" | "byte" | "unsigned_long" => FieldKind::Long,
            "float" | "double" | "half_float" | "scaled_float" => FieldKind::Float,
            "text" => FieldKind::Text,
            "keyword" | "constant_keyword" | "wildcard" => FieldKind::Keyword,
            "date" => FieldKind::Date,
            "boolean" => FieldKind::Boolean,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical engine type tag
    pub fn engine_type(&self) -> &'static str {
        match self {
            FieldKind::Long => "long",
            FieldKind::Float => "float",
            FieldKind::Text => "text",
            FieldKind::Date => "date",
            FieldKind::Boolean => "boolean",
            FieldKind::Keyword => "keyword",
        }
    }

    pub fn valid_operators(&self) -> &'static [Operator] {
        match self {
            FieldKind::Long | FieldKind::Float | FieldKind::Date => NUMERIC_OPERATORS,
            FieldKind::Boolean => BOOLEAN_OPERATORS,
            FieldKind::Text | FieldKind::Keyword => &Operator::ALL,
        }
    }

    pub fn value_types_description(&self) -> &'static str {
        match self {
            FieldKind::Long | FieldKind::Float => "numeric values",
            FieldKind::Text | FieldKind::Keyword => "strings",
            FieldKind::Date => "dates in \"YYYY-MM-DD\" format",
            FieldKind::Boolean => "booleans",
        }
    }

    /// Whether a non-null scalar literal has an acceptable type
    fn accepts(&self, value: &Literal) -> bool {
        match self {
            FieldKind::Long | FieldKind::Float => matches!(value, Literal::Int(_) | Literal::Float(_)),
            FieldKind::Text | FieldKind::Keyword | FieldKind::Date => matches!(value, Literal::String(_)),
            FieldKind::Boolean => matches!(value, Literal::Bool(_)),
        }
    }

    #[inline]
    pub fn can_suggest_values(&self) -> bool {
        matches!(self, FieldKind::Keyword)
    }
}

/// A leaf field of an index mapping
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    nullable: bool,
    kind: FieldKind,
    engine_type: String,
    parent: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            nullable: false,
            kind,
            engine_type: kind.engine_type().to_string(),
            parent: None,
        }
    }

    pub fn long(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Long)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Keyword)
    }

    /// Keep the engine's own type tag (e.g. `integer`) instead of the canonical one
    pub fn with_engine_type(mut self, engine_type: impl Into<String>) -> Self {
        self.engine_type = engine_type.into();
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[inline]
    pub fn engine_type(&self) -> &str {
        &self.engine_type
    }

    /// Field this one is a multi-field of
    #[inline]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub fn valid_operators(&self) -> &'static [Operator] {
        self.kind.valid_operators()
    }

    #[inline]
    pub fn can_suggest_values(&self) -> bool {
        self.kind.can_suggest_values()
    }

    /// Check that `value` may be compared against this field.
    ///
    /// Lists are checked element by element.
    pub fn validate(&self, value: &Literal) -> Result<(), FieldError> {
        match value {
            Literal::Null if self.nullable => Ok(()),
            Literal::Null => Err(FieldError::NotNullable {
                field: self.name.clone(),
            }),
            Literal::List(items) => items.iter().try_for_each(|item| match item {
                Literal::List(_) => Err(self.type_error(item)),
                _ => self.validate(item),
            }),
            scalar if !self.kind.accepts(scalar) => Err(self.type_error(scalar)),
            Literal::String(s) if self.kind == FieldKind::Date => {
                NaiveDate::parse_from_str(s, DATE_FORMAT)
                    .map(|_| ())
                    .map_err(|_| FieldError::InvalidDate {
                        field: self.name.clone(),
                        value: value.to_string(),
                    })
            }
            _ => Ok(()),
        }
    }

    /// Coerce `value` to this field's native type
    pub fn format_value(&self, value: &Literal) -> Result<Literal, FieldError> {
        let formatted = match (self.kind, value) {
            (_, Literal::Null) => Literal::Null,
            (_, Literal::List(items)) => Literal::List(
                items
                    .iter()
                    .map(|item| self.format_value(item))
                    .collect::<Result<_, _>>()?,
            ),

            (FieldKind::Long, Literal::Int(i)) => Literal::Int(*i),
            // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
            (FieldKind::Long, Literal::Float(f)) if (i64::MIN as f64..i64::MAX as f64).contains(f) => {
                Literal::Int(f.trunc() as i64)
            }
            (FieldKind::Long, Literal::Bool(b)) => Literal::Int(i64::from(*b)),
            (FieldKind::Long, Literal::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Literal::Int)
                .map_err(|_| self.conversion_error(value))?,

            (FieldKind::Float, Literal::Int(i)) => Literal::Float(*i as f64),
            (FieldKind::Float, Literal::Float(f)) => Literal::Float(*f),
            (FieldKind::Float, Literal::Bool(b)) => Literal::Float(if *b { 1.0 } else { 0.0 }),
            (FieldKind::Float, Literal::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Literal::Float)
                .map_err(|_| self.conversion_error(value))?,

            (FieldKind::Text | FieldKind::Keyword | FieldKind::Date, scalar) => Literal::String(scalar.as_text()),

            (FieldKind::Boolean, Literal::Bool(b)) => Literal::Bool(*b),
            (FieldKind::Boolean, Literal::Int(0)) => Literal::Bool(false),
            (FieldKind::Boolean, Literal::Int(1)) => Literal::Bool(true),
            (FieldKind::Boolean, Literal::String(s)) if s.eq_ignore_ascii_case("true") => Literal::Bool(true),
            (FieldKind::Boolean, Literal::String(s)) if s.eq_ignore_ascii_case("false") => Literal::Bool(false),

            _ => return Err(self.conversion_error(value)),
        };
        Ok(formatted)
    }

    /// Build the query fragment for `self <operator> value`.
    pub fn get_lookup(&self, operator: Operator, value: &Literal) -> Result<Fragment, FieldError> {
        if !self.valid_operators().contains(&operator) {
            return Err(FieldError::OperatorNotAllowed {
                field: self.name.clone(),
                field_type: self.engine_type.clone(),
                operator: operator.token().to_string(),
            });
        }

        if value.is_null() {
            self.validate(value)?;
            return match operator {
                Operator::Eq => Ok(Fragment::new(exists_query(&self.name), true)),
                Operator::NotEq => Ok(Fragment::new(exists_query(&self.name), false)),
                _ => Err(self.type_error(value)),
            };
        }

        if operator.takes_list() != matches!(value, Literal::List(_)) {
            return Err(self.shape_error(operator, value));
        }

        self.validate(value)?;
        let formatted = self.format_value(value)?;
        Ok(query_builder(operator).generate(&self.name, &formatted))
    }

    fn described_type(&self) -> String {
        if self.nullable {
            format!("nullable {}", self.engine_type)
        } else {
            self.engine_type.clone()
        }
    }

    fn type_error(&self, value: &Literal) -> FieldError {
        FieldError::InvalidType {
            field: self.name.clone(),
            field_type: self.described_type(),
            expected: self.kind.value_types_description(),
            value: value.to_string(),
        }
    }

    fn shape_error(&self, operator: Operator, value: &Literal) -> FieldError {
        FieldError::InvalidType {
            field: self.name.clone(),
            field_type: self.described_type(),
            expected: if operator.takes_list() {
                "a list of values with this operator"
            } else {
                "a single value with this operator"
            },
            value: value.to_string(),
        }
    }

    fn conversion_error(&self, value: &Literal) -> FieldError {
        FieldError::ValueConversion {
            field: self.name.clone(),
            target: self.kind.engine_type(),
            value: value.to_string(),
        }
    }
}
