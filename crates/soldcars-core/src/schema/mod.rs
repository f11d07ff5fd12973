//! Schema engine
//!
//! Describes the shape of a record as a tree of [`SchemaNode`]s whose leaves
//! are bounded [`FieldSpec`]s. The same description drives both validation of
//! external input and generation of random records.
//!
//! ## Usage
//!
//! ```ignore
//! let schema = SchemaNode::new("Person")
//!     .field("serialNumber", FieldSpec::int(0, u32::MAX as i64))
//!     .field("ownerName", FieldSpec::string(3, 255));
//!
//! let record = validate(&schema, &json!({"serialNumber": 42, "ownerName": "Jane Doe"}))?;
//! ```

mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod record;
mod validate;

pub use error::{Constraint, ValidationError};
#[cfg(any(test, feature = "mock"))]
pub use mock::{mock, mock_with_rng};
pub use record::Record;
pub use validate::validate;

/// Constraint on a single field. All bounds are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    /// Integer in `[min, max]`
    Int { min: i64, max: i64 },
    /// Float in `[min, max]`
    Float { min: f64, max: f64 },
    /// String whose length in characters lies in `[min_len, max_len]`
    Str { min_len: usize, max_len: usize },
    /// Nested object
    Nested(SchemaNode),
}

impl FieldSpec {
    pub fn int(min: i64, max: i64) -> Self {
        assert!(min <= max, "integer bounds inverted: [{}, {}]", min, max);
        FieldSpec::Int { min, max }
    }

    /// Unsigned integer that fits in `bits` bits
    pub fn uint(bits: u32) -> Self {
        assert!(
            (1..=32).contains(&bits),
            "unsupported integer width: {}",
            bits
        );
        Self::int(0, (1i64 << bits) - 1)
    }

    pub fn float(min: f64, max: f64) -> Self {
        assert!(min <= max, "float bounds inverted: [{}, {}]", min, max);
        FieldSpec::Float { min, max }
    }

    pub fn string(min_len: usize, max_len: usize) -> Self {
        assert!(
            min_len <= max_len,
            "length bounds inverted: [{}, {}]",
            min_len,
            max_len
        );
        FieldSpec::Str { min_len, max_len }
    }

    /// A single character, or nothing
    pub fn char() -> Self {
        Self::string(0, 1)
    }

    /// Short name of the value kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            FieldSpec::Int { .. } => "integer",
            FieldSpec::Float { .. } => "float",
            FieldSpec::Str { .. } => "string",
            FieldSpec::Nested(_) => "object",
        }
    }
}

impl From<SchemaNode> for FieldSpec {
    fn from(node: SchemaNode) -> Self {
        FieldSpec::Nested(node)
    }
}

/// Ordered set of named fields
///
/// Field names are unique within a node. Nodes are built once, at startup,
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    name: String,
    fields: Vec<(String, FieldSpec)>,
}

impl SchemaNode {
    /// Create an empty node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field
    ///
    /// Panics if a field with the same name already exists: schemas are
    /// static definitions and a duplicate is a programming error.
    pub fn field(mut self, name: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
        let name = name.into();
        assert!(
            self.get(&name).is_none(),
            "duplicate field '{}' in schema '{}'",
            name,
            self.name
        );
        self.fields.push((name, spec.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, spec)| spec)
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
