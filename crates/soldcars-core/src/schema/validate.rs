//! Input validation against a schema

use serde_json::{Map, Value};

use super::{Constraint, FieldSpec, Record, SchemaNode, ValidationError};

/// Validate raw structured input against `schema`
///
/// Walks the schema and the input together, recursing into nested nodes.
/// Every declared field is required and undeclared fields are rejected. The
/// first violation aborts the whole validation.
pub fn validate(schema: &SchemaNode, input: &Value) -> Result<Record, ValidationError> {
    let fields = validate_node(schema, input, "")?;
    Ok(Record::validated(schema, fields))
}

fn validate_node(
    node: &SchemaNode,
    input: &Value,
    path: &str,
) -> Result<Map<String, Value>, ValidationError> {
    let Some(object) = input.as_object() else {
        return Err(wrong_kind(path, "an object"));
    };

    let mut fields = Map::new();
    for (name, spec) in node.fields() {
        let field_path = join(path, name);
        let value = object
            .get(name)
            .ok_or_else(|| ValidationError::new(&field_path, Constraint::Missing))?;
        fields.insert(name.to_string(), validate_field(spec, value, &field_path)?);
    }

    if let Some(unknown) = object.keys().find(|key| node.get(key).is_none()) {
        return Err(ValidationError::new(join(path, unknown), Constraint::Unknown));
    }

    Ok(fields)
}

fn validate_field(spec: &FieldSpec, value: &Value, path: &str) -> Result<Value, ValidationError> {
    match spec {
        FieldSpec::Int { min, max } => {
            let out_of_range = || {
                let constraint = Constraint::IntOutOfRange {
                    min: *min,
                    max: *max,
                };
                ValidationError::new(path, constraint)
            };
            let number = match value {
                Value::Number(n) if n.is_i64() => n.as_i64(),
                // Larger than i64::MAX: an integer, just not one we accept
                Value::Number(n) if n.is_u64() => return Err(out_of_range()),
                _ => None,
            };
            let number = number.ok_or_else(|| wrong_kind(path, "an integer"))?;
            if number < *min || number > *max {
                return Err(out_of_range());
            }
        }
        FieldSpec::Float { min, max } => {
            let Some(number) = value.as_f64() else {
                return Err(wrong_kind(path, "a number"));
            };
            if number < *min || number > *max {
                return Err(ValidationError::new(
                    path,
                    Constraint::FloatOutOfRange {
                        min: *min,
                        max: *max,
                    },
                ));
            }
        }
        FieldSpec::Str { min_len, max_len } => {
            let Some(text) = value.as_str() else {
                return Err(wrong_kind(path, "a string"));
            };
            let actual = text.chars().count();
            if actual < *min_len || actual > *max_len {
                return Err(ValidationError::new(
                    path,
                    Constraint::BadLength {
                        min_len: *min_len,
                        max_len: *max_len,
                        actual,
                    },
                ));
            }
        }
        FieldSpec::Nested(node) => {
            return validate_node(node, value, path).map(Value::Object);
        }
    }

    Ok(value.clone())
}

fn wrong_kind(path: &str, expected: &'static str) -> ValidationError {
    ValidationError::new(path, Constraint::WrongKind { expected })
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}
