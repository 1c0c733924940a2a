//! Per-index schema.
//!
//! Resolves dotted field names against the index mapping, fetched through a
//! [`SearchClient`] on first use and cached for the lifetime of the schema.
//! Concurrent first resolutions share a single mapping fetch.

use crate::client::SearchClient;
use crate::listing::{serialize_suggestions, Suggestion};
use crate::registry::IndexPolicy;
use crate::validate::{ExprValidator, NoopValidator};
use elastic_dql_core::lookup::{escape_wildcard, exists_query, wildcard_query};
use elastic_dql_core::{Expr, Field, FieldCatalog, FieldMapper, FieldResolver, Result, SchemaError};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Default number of terms returned by [`Schema::suggestions`]
pub const DEFAULT_SUGGESTION_SIZE: usize = 10;

pub struct Schema {
    index: String,
    client: Arc<dyn SearchClient>,
    excluded_fields: HashSet<String>,
    validator: Arc<dyn ExprValidator>,
    validator_kind: String,
    policy: Option<Arc<IndexPolicy>>,
    suggestion_size: usize,
    catalog: RwLock<Option<Arc<FieldCatalog>>>,
    fetch_lock: Mutex<()>,
}

impl Schema {
    pub fn new(index: impl Into<String>, client: Arc<dyn SearchClient>) -> Self {
        Self {
            index: index.into(),
            client,
            excluded_fields: HashSet::new(),
            validator: Arc::new(NoopValidator),
            validator_kind: NoopValidator.kind(),
            policy: None,
            suggestion_size: DEFAULT_SUGGESTION_SIZE,
            catalog: RwLock::new(None),
            fetch_lock: Mutex::new(()),
        }
    }

    /// Hide these field names from resolution and listings
    pub fn with_excluded_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn ExprValidator>) -> Self {
        self.validator_kind = validator.kind();
        self.validator = validator;
        self
    }

    /// Policy checked against the concrete index when the engine answers
    /// for an alias
    pub fn with_index_policy(mut self, policy: Arc<IndexPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_suggestion_size(mut self, size: usize) -> Self {
        self.suggestion_size = size;
        self
    }

    #[inline]
    pub fn index(&self) -> &str {
        &self.index
    }

    #[inline]
    pub fn validator_kind(&self) -> &str {
        &self.validator_kind
    }

    /// Whether the mapping has been fetched
    pub fn is_loaded(&self) -> bool {
        self.catalog.read().is_some()
    }

    /// Fetch the mapping, replace the cache and return all visible fields
    pub fn get_mappings(&self) -> Result<Vec<Arc<Field>>> {
        let _fetch = self.fetch_lock.lock();
        let catalog = self.fetch_catalog()?;
        *self.catalog.write() = Some(catalog.clone());
        Ok(catalog.fields().to_vec())
    }

    pub fn resolve_name(&self, field_name: &str) -> Result<Arc<Field>> {
        self.catalog()?
            .get(field_name)
            .cloned()
            .ok_or_else(|| SchemaError::UnresolvedField(field_name.to_string()).into())
    }

    /// Most frequent values of a keyword field, optionally containing `search`
    pub fn suggestions(&self, field_name: &str, search: Option<&str>) -> Result<Vec<Suggestion>> {
        let field = self.resolve_name(field_name)?;
        if !field.can_suggest_values() {
            return Err(SchemaError::NotSuggestable(field_name.to_string()).into());
        }

        let (query, aggregations) = self.suggestions_query(field.name(), search);
        let response = self.client.search(&self.index, &query, &aggregations)?;
        Ok(serialize_suggestions(&response))
    }

    pub fn validate(&self, expr: &Expr) -> Result<()> {
        self.validator.validate(expr)
    }

    fn suggestions_query(&self, field_name: &str, search: Option<&str>) -> (Value, Value) {
        let mut filter = vec![exists_query(field_name)];
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            filter.push(wildcard_query(field_name, format!("*{}*", escape_wildcard(search))));
        }
        let query = json!({ "bool": { "filter": filter } });
        let aggregations = json!({
            "values": {
                "terms": { "field": field_name, "size": self.suggestion_size }
            }
        });
        (query, aggregations)
    }

    fn catalog(&self) -> Result<Arc<FieldCatalog>> {
        if let Some(catalog) = self.catalog.read().as_ref() {
            return Ok(catalog.clone());
        }

        let _fetch = self.fetch_lock.lock();
        // Another caller may have finished the fetch while we waited.
        if let Some(catalog) = self.catalog.read().as_ref() {
            return Ok(catalog.clone());
        }

        let catalog = self.fetch_catalog()?;
        *self.catalog.write() = Some(catalog.clone());
        Ok(catalog)
    }

    fn fetch_catalog(&self) -> Result<Arc<FieldCatalog>> {
        debug!("Fetching mapping for index {}", self.index);
        let response = self.client.get_mapping(&self.index)?;
        let (concrete, mappings) = extract_mappings(&response, &self.index)?;
        if concrete != self.index {
            debug!("Index {} resolved to {}", self.index, concrete);
            if self.policy.as_ref().is_some_and(|policy| policy.excluded(concrete)) {
                return Err(SchemaError::IndexExcluded(concrete.to_string()).into());
            }
        }
        let fields = FieldMapper::new().get_properties(mappings)?;
        let catalog = FieldCatalog::new(fields, &self.excluded_fields);
        debug!("Index {} has {} visible fields", self.index, catalog.len());
        Ok(Arc::new(catalog))
    }
}

impl FieldResolver for Schema {
    fn resolve_name(&self, name: &str) -> Result<Arc<Field>> {
        Schema::resolve_name(self, name)
    }

    fn validate(&self, expr: &Expr) -> Result<()> {
        Schema::validate(self, expr)
    }
}

/// `mappings` object of `index` in a `GET /{index}/_mapping` response.
///
/// Requests through an alias are keyed by the concrete index name, so a
/// response holding exactly one index is accepted under any name. Returns
/// the name the engine answered with.
fn extract_mappings<'a>(response: &'a Value, index: &str) -> Result<(&'a str, &'a Value)> {
    let entries = response
        .as_object()
        .ok_or_else(|| SchemaError::MappingFetch("mapping response is not an object".to_string()))?;

    let (concrete, entry) = match entries.get_key_value(index) {
        Some(found) => found,
        None if entries.len() == 1 => match entries.iter().next() {
            Some(only) => only,
            None => return Err(SchemaError::MappingFetch(format!("no mapping for index {}", index)).into()),
        },
        None => return Err(SchemaError::MappingFetch(format!("no mapping for index {}", index)).into()),
    };

    let mappings = entry
        .get("mappings")
        .ok_or_else(|| SchemaError::MappingFetch(format!("no mappings section for index {}", index)))?;
    Ok((concrete.as_str(), mappings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::InMemoryClient;
    use crate::validate::DepthLimitValidator;
    use elastic_dql_core::{Error, FieldKind, Operator};

    fn books_mapping() -> Value {
        json!({
            "properties": {
                "title": {
                    "type": "text",
                    "fields": { "keyword": { "type": "keyword" } }
                },
                "pages": { "type": "integer" },
                "author": {
                    "properties": {
                        "name": { "type": "keyword" },
                        "email": { "type": "keyword" }
                    }
                }
            }
        })
    }

    fn books_client() -> Arc<InMemoryClient> {
        Arc::new(InMemoryClient::new().with_mapping("books", books_mapping()))
    }

    #[test]
    fn test_resolve_name_caches_mapping() {
        let client = books_client();
        let schema = Schema::new("books", client.clone());
        assert!(!schema.is_loaded());

        let field = schema.resolve_name("title.keyword").unwrap();
        assert_eq!(field.kind(), FieldKind::Keyword);
        assert_eq!(field.parent(), Some("title"));

        assert_eq!(schema.resolve_name("pages").unwrap().kind(), FieldKind::Long);
        assert_eq!(client.mapping_fetches(), 1);
    }

    #[test]
    fn test_unresolved_field() {
        let schema = Schema::new("books", books_client());
        assert!(matches!(
            schema.resolve_name("isbn"),
            Err(Error::Schema(SchemaError::UnresolvedField(_)))
        ));
    }

    #[test]
    fn test_fetch_failure_surfaces() {
        let schema = Schema::new("movies", books_client());
        assert!(matches!(
            schema.resolve_name("title"),
            Err(Error::Schema(SchemaError::MappingFetch(_)))
        ));
        assert!(!schema.is_loaded());
    }

    #[test]
    fn test_excluded_fields_are_hidden() {
        let schema = Schema::new("books", books_client()).with_excluded_fields(["author.email"]);
        assert!(schema.resolve_name("author.email").is_err());

        let names: Vec<String> = schema
            .get_mappings()
            .unwrap()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        assert_eq!(names, vec!["title", "title.keyword", "pages", "author.name"]);
    }

    #[test]
    fn test_get_mappings_refetches() {
        let client = books_client();
        let schema = Schema::new("books", client.clone());
        schema.get_mappings().unwrap();
        schema.get_mappings().unwrap();
        schema.resolve_name("pages").unwrap();
        assert_eq!(client.mapping_fetches(), 2);
    }

    #[test]
    fn test_concurrent_first_access_fetches_once() {
        let client = books_client();
        let schema = Arc::new(Schema::new("books", client.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let schema = schema.clone();
                std::thread::spawn(move || schema.resolve_name("author.name").map(|f| f.name().to_string()))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), "author.name");
        }
        assert_eq!(client.mapping_fetches(), 1);
    }

    #[test]
    fn test_suggestions() {
        let client = Arc::new(
            InMemoryClient::new()
                .with_mapping("books", books_mapping())
                .with_search_response(json!({
                    "aggregations": {"values": {"buckets": [{"key": "Ann", "doc_count": 4}]}}
                })),
        );
        let schema = Schema::new("books", client.clone());

        let suggestions = schema.suggestions("author.name", Some("An")).unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].key, "Ann");
        assert_eq!(suggestions[0].doc_count, 4);

        let searches = client.searches();
        assert_eq!(searches.len(), 1);
        let (index, query, aggregations) = &searches[0];
        assert_eq!(index, "books");
        assert_eq!(
            query,
            &json!({"bool": {"filter": [
                {"exists": {"field": "author.name"}},
                {"wildcard": {"author.name": {"value": "*An*"}}}
            ]}})
        );
        assert_eq!(
            aggregations,
            &json!({"values": {"terms": {"field": "author.name", "size": DEFAULT_SUGGESTION_SIZE}}})
        );
    }

    #[test]
    fn test_suggestions_require_keyword() {
        let schema = Schema::new("books", books_client());
        assert!(matches!(
            schema.suggestions("title", None),
            Err(Error::Schema(SchemaError::NotSuggestable(_)))
        ));
    }

    #[test]
    fn test_schema_as_resolver() {
        let schema = Schema::new("books", books_client()).with_validator(Arc::new(DepthLimitValidator::new(1)));
        let query = elastic_dql_core::get_query(&Expr::compare("pages", Operator::Gt, 100), &schema).unwrap();
        assert_eq!(
            query["query"]["bool"]["filter"][0]["bool"]["should"][0],
            json!({"range": {"pages": {"gt": 100}}})
        );

        let deep = Expr::and(
            Expr::compare("pages", Operator::Gt, 1),
            Expr::compare("pages", Operator::Lt, 9),
        );
        assert!(elastic_dql_core::get_query(&deep, &schema).is_err());
    }

    #[test]
    fn test_extract_mappings_through_alias() {
        let response = json!({"books-v2": {"mappings": {"properties": {}}}});
        let (concrete, _) = extract_mappings(&response, "books").unwrap();
        assert_eq!(concrete, "books-v2");

        let response = json!({"a": {"mappings": {}}, "b": {"mappings": {}}});
        assert!(extract_mappings(&response, "books").is_err());
    }
}
