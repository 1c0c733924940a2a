//! Serializable listings returned to API callers

use elastic_dql_core::Field;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// One entry of the field listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl From<&Field> for FieldInfo {
    fn from(field: &Field) -> Self {
        Self {
            name: field.name().to_string(),
            field_type: field.engine_type().to_string(),
        }
    }
}

pub fn serialize_mappings(fields: &[Arc<Field>]) -> Vec<FieldInfo> {
    fields.iter().map(|field| FieldInfo::from(field.as_ref())).collect()
}

/// A distinct field value and the number of documents holding it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub key: String,
    pub doc_count: u64,
}

/// Buckets of the `values` terms aggregation; empty when absent
pub fn serialize_suggestions(response: &Value) -> Vec<Suggestion> {
    response
        .pointer("/aggregations/values/buckets")
        .and_then(Value::as_array)
        .map(|buckets| {
            buckets
                .iter()
                .filter_map(|bucket| serde_json::from_value(bucket.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
