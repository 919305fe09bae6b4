use std::collections::HashMap;
use std::sync::Arc;

use arrow_schema::{Schema as ArrowSchema, SchemaRef as ArrowSchemaRef};
use indexmap::IndexMap;

use crate::engine::errors::TableError;
use crate::engine::schema::field::Field;

pub type SchemaRef = Arc<Schema>;

/// Ordered, immutable list of fields describing a table.
///
/// Duplicate field names are allowed; lookups by name resolve to the first match.
/// Metadata is an ordered string map carried through serialization untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    fields: Vec<Field>,
    metadata: IndexMap<String, String>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            metadata: IndexMap::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, metadata: IndexMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    pub fn metadata(&self) -> &IndexMap<String, String> {
        &self.metadata
    }

    pub fn to_arrow(&self) -> ArrowSchemaRef {
        let fields = self.fields.iter().map(Field::to_arrow).collect::<Vec<_>>();
        let metadata = self
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<HashMap<_, _>>();
        Arc::new(ArrowSchema::new_with_metadata(fields, metadata))
    }

    /// Arrow keeps metadata in a hash map, so keys come back sorted to stay deterministic.
    pub fn from_arrow(schema: &ArrowSchema) -> Result<Self, TableError> {
        let fields = schema
            .fields()
            .iter()
            .map(|f| Field::from_arrow(f))
            .collect::<Result<Vec<_>, _>>()?;
        let mut entries = schema.metadata().iter().collect::<Vec<_>>();
        entries.sort();
        let metadata = entries
            .into_iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Self { fields, metadata })
    }
}

impl FromIterator<Field> for Schema {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
