//! Validated records

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::SchemaNode;

/// Ordered field map known to satisfy a schema
///
/// Records only come into existence through [`validate`](super::validate),
/// [`mock`](super::mock), or by loading a document the store already holds.
/// The generic map form is lossless: [`Record::into_map`] returns exactly the
/// values that were validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: String,
    fields: Map<String, Value>,
}

impl Record {
    pub(crate) fn validated(schema: &SchemaNode, fields: Map<String, Value>) -> Self {
        Self {
            schema: schema.name().to_string(),
            fields,
        }
    }

    /// Wrap a document loaded from the store
    ///
    /// Documents in the store were validated before insertion, and a
    /// projected lookup may legitimately return a subset of the fields, so
    /// no validation happens here.
    pub(crate) fn from_store(schema: &SchemaNode, fields: Map<String, Value>) -> Self {
        Self::validated(schema, fields)
    }

    /// Name of the schema this record was checked against
    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    /// Get a value by dotted path (`engine.maxRpm`)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = self.fields.get(parts.next()?)?;
        parts.try_fold(first, |value, part| value.as_object()?.get(part))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serialize as a JSON object string
    pub fn to_json(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
