use crate::field::Field;
use ahash::AHashMap;
use std::collections::HashSet;
use std::sync::Arc;

/// Immutable name -> field index built from one mapping fetch
#[derive(Debug, Default)]
pub struct FieldCatalog {
    fields: Vec<Arc<Field>>,
    by_name: AHashMap<String, Arc<Field>>,
}

impl FieldCatalog {
    /// Index `fields`, dropping every name listed in `excluded`
    pub fn new(fields: Vec<Field>, excluded: &HashSet<String>) -> Self {
        let fields: Vec<Arc<Field>> = fields
            .into_iter()
            .filter(|field| !excluded.contains(field.name()))
            .map(Arc::new)
            .collect();
        let by_name = fields
            .iter()
            .map(|field| (field.name().to_string(), field.clone()))
            .collect();
        Self { fields, by_name }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Arc<Field>> {
        self.by_name.get(name)
    }

    /// Fields in mapping order
    #[inline]
    pub fn fields(&self) -> &[Arc<Field>] {
        &self.fields
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<Field> for FieldCatalog {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect(), &HashSet::new())
    }
}
