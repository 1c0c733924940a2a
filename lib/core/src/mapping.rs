//! Translate a search-engine mapping into a flat list of [`Field`]s.
//!
//! Nested `properties` objects are flattened into dotted names and every
//! declared multi-field (`"fields": {...}`) becomes its own field named
//! `<parent>.<sub>`.

use crate::error::SchemaError;
use crate::field::{Field, FieldKind};
use serde_json::Value;

/// Join two path segments with "."
#[inline]
pub fn dot_join(first: &str, second: &str) -> String {
    format!("{}.{}", first, second)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FieldMapper;

impl FieldMapper {
    pub fn new() -> Self {
        Self
    }

    /// Leaf fields of a `mappings` object, in mapping order
    pub fn get_properties(&self, mappings: &Value) -> Result<Vec<Field>, SchemaError> {
        let mut fields = Vec::new();
        self.collect(mappings, None, &mut fields)?;
        Ok(fields)
    }

    fn collect(&self, mapping: &Value, base_name: Option<&str>, out: &mut Vec<Field>) -> Result<(), SchemaError> {
        let obj = match mapping.as_object() {
            Some(obj) => obj,
            None => return Ok(()),
        };

        if let Some(properties) = obj.get("properties").and_then(Value::as_object) {
            for (property_name, property) in properties {
                let prefix = match base_name {
                    Some(base) => dot_join(base, property_name),
                    None => property_name.clone(),
                };
                self.collect(property, Some(&prefix), out)?;
            }
            return Ok(());
        }

        let (name, field_type) = match (base_name, obj.get("type").and_then(Value::as_str)) {
            (Some(name), Some(field_type)) => (name, field_type),
            _ => return Ok(()),
        };

        // Containers without properties have no leaves.
        if matches!(field_type, "object" | "nested") {
            return Ok(());
        }

        out.push(self.build_field(name, field_type, None)?);

        if let Some(multi_fields) = obj.get("fields").and_then(Value::as_object) {
            out.extend(self.get_fields(multi_fields, name)?);
        }
        Ok(())
    }

    /// Multi-fields of `parent`, each named `<parent>.<sub>`
    pub fn get_fields(&self, fields: &serde_json::Map<String, Value>, parent: &str) -> Result<Vec<Field>, SchemaError> {
        fields
            .iter()
            .map(|(sub_name, data)| {
                let field_type = data.get("type").and_then(Value::as_str).unwrap_or_default();
                self.build_field(&dot_join(parent, sub_name), field_type, Some(parent))
            })
            .collect()
    }

    fn build_field(&self, name: &str, field_type: &str, parent: Option<&str>) -> Result<Field, SchemaError> {
        let kind = FieldKind::from_engine_type(field_type)
            .ok_or_else(|| SchemaError::UnknownFieldType(field_type.to_string()))?;
        let field = Field::new(name, kind).with_engine_type(field_type);
        Ok(match parent {
            Some(parent) => field.with_parent(parent),
            None => field,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(fields: &[Field]) -> Vec<&str> {
        fields.iter().map(Field::name).collect()
    }

    #[test]
    fn test_dot_join() {
        assert_eq!(dot_join("a", "b"), "a.b");
    }

    #[test]
    fn test_empty_mapping() {
        assert!(FieldMapper::new().get_properties(&json!({})).unwrap().is_empty());
        assert!(FieldMapper::new().get_properties(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_nested_properties_and_multi_fields() {
        let mapping = json!({
            "properties": {
                "title": {
                    "type": "text",
                    "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } }
                },
                "author": {
                    "properties": {
                        "name": { "type": "keyword" },
                        "age": { "type": "integer" }
                    }
                },
                "published": { "type": "date" }
            }
        });

        let fields = FieldMapper::new().get_properties(&mapping).unwrap();
        assert_eq!(
            names(&fields),
            vec!["title", "title.keyword", "author.name", "author.age", "published"]
        );

        let sub = &fields[1];
        assert_eq!(sub.kind(), FieldKind::Keyword);
        assert_eq!(sub.parent(), Some("title"));
        assert_eq!(fields[3].engine_type(), "integer");
        assert_eq!(fields[3].kind(), FieldKind::Long);
    }

    #[test]
    fn test_unknown_type_fails() {
        let mapping = json!({ "properties": { "location": { "type": "geo_point" } } });
        assert_eq!(
            FieldMapper::new().get_properties(&mapping).unwrap_err(),
            SchemaError::UnknownFieldType("geo_point".to_string())
        );
    }

    #[test]
    fn test_empty_object_container_is_skipped() {
        let mapping = json!({ "properties": { "meta": { "type": "object" }, "n": { "type": "long" } } });
        let fields = FieldMapper::new().get_properties(&mapping).unwrap();
        assert_eq!(names(&fields), vec!["n"]);
    }
}
