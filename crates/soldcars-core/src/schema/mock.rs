//! Random record generation
//!
//! Only for seeding and test fixtures. Compiled in through the `mock`
//! feature so that server write paths cannot reach it.

use rand::Rng;
use serde_json::{Map, Number, Value};

use super::{validate, FieldSpec, Record, SchemaNode, ValidationError};

/// Generate a random record satisfying `schema`
///
/// Top-level entries of `overrides` replace the generated values wholesale.
/// The merged result is validated before it is returned, so an override that
/// breaks the schema is reported instead of producing an invalid record.
pub fn mock(
    schema: &SchemaNode,
    overrides: &Map<String, Value>,
) -> Result<Record, ValidationError> {
    mock_with_rng(schema, overrides, &mut rand::thread_rng())
}

/// [`mock`] with a caller-supplied random source
pub fn mock_with_rng<R: Rng>(
    schema: &SchemaNode,
    overrides: &Map<String, Value>,
    rng: &mut R,
) -> Result<Record, ValidationError> {
    let mut fields = mock_node(schema, rng);
    for (name, value) in overrides {
        fields.insert(name.clone(), value.clone());
    }
    validate(schema, &Value::Object(fields))
}

fn mock_node<R: Rng>(node: &SchemaNode, rng: &mut R) -> Map<String, Value> {
    node.fields()
        .map(|(name, spec)| (name.to_string(), mock_field(spec, rng)))
        .collect()
}

fn mock_field<R: Rng>(spec: &FieldSpec, rng: &mut R) -> Value {
    match spec {
        FieldSpec::Int { min, max } => Value::from(rng.gen_range(*min..=*max)),
        FieldSpec::Float { min, max } => {
            let raw = rng.gen_range(*min..=*max);
            // Rounding can step past a bound that is not itself on the grid
            let rounded = ((raw * 100.0).round() / 100.0).clamp(*min, *max);
            Number::from_f64(rounded).map_or(Value::Null, Value::Number)
        }
        FieldSpec::Str { min_len, max_len } => {
            let len = rng.gen_range(*min_len..=*max_len);
            Value::String(
                (0..len)
                    .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
                    .collect(),
            )
        }
        FieldSpec::Nested(node) => Value::Object(mock_node(node, rng)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn vehicle() -> SchemaNode {
        SchemaNode::new("Vehicle")
            .field("serialNumber", FieldSpec::uint(32))
            .field("name", FieldSpec::string(3, 12))
            .field(
                "performance",
                SchemaNode::new("Performance").field(
                    "acceleration",
                    SchemaNode::new("Acceleration")
                        .field("mph", FieldSpec::uint(16))
                        .field("seconds", FieldSpec::float(0.0, 100.0)),
                ),
            )
            .field("code", FieldSpec::char())
    }

    #[test]
    fn test_mock_passes_validation() {
        let schema = vehicle();
        let record = mock(&schema, &Map::new()).unwrap();
        assert!(validate(&schema, &Value::Object(record.into_map())).is_ok());
    }

    #[test]
    fn test_floats_have_two_decimals() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let record = mock_with_rng(&vehicle(), &Map::new(), &mut rng).unwrap();
            let seconds = record
                .get("performance.acceleration.seconds")
                .and_then(Value::as_f64)
                .unwrap();
            assert!((seconds * 100.0 - (seconds * 100.0).round()).abs() < 1e-6);
        }
    }

    #[test]
    fn test_strings_are_lowercase_letters() {
        let mut rng = StdRng::seed_from_u64(11);
        let record = mock_with_rng(&vehicle(), &Map::new(), &mut rng).unwrap();
        let name = record.get("name").and_then(Value::as_str).unwrap();
        assert!(name.chars().all(|c| c.is_ascii_lowercase()));
        assert!((3..=12).contains(&name.len()));
    }

    #[test]
    fn test_overrides_replace_generated_values() {
        let overrides = json!({"serialNumber": 42, "name": "fixed"});
        let Value::Object(overrides) = overrides else {
            unreachable!()
        };
        let record = mock(&vehicle(), &overrides).unwrap();
        assert_eq!(record.get("serialNumber"), Some(&json!(42)));
        assert_eq!(record.get("name"), Some(&json!("fixed")));
    }

    #[test]
    fn test_invalid_override_is_reported() {
        let overrides = json!({"name": "x"});
        let Value::Object(overrides) = overrides else {
            unreachable!()
        };
        let err = mock(&vehicle(), &overrides).unwrap_err();
        assert_eq!(err.path, "name");
    }

    #[test]
    fn test_rounding_respects_off_grid_bounds() {
        let tight = FieldSpec::float(0.001, 0.004);
        let schema = SchemaNode::new("Tight").field("x", tight);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            assert!(mock_with_rng(&schema, &Map::new(), &mut rng).is_ok());
        }
    }

    proptest! {
        #[test]
        fn prop_mock_always_validates(
            seed in any::<u64>(),
            lo in -1000i64..1000,
            span in 0i64..1000,
            min_len in 0usize..8,
            extra_len in 0usize..8,
        ) {
            let schema = SchemaNode::new("Generated")
                .field("i", FieldSpec::int(lo, lo + span))
                .field("f", FieldSpec::float(lo as f64, (lo + span) as f64))
                .field("s", FieldSpec::string(min_len, min_len + extra_len))
                .field("n", SchemaNode::new("Inner").field("c", FieldSpec::char()));
            let mut rng = StdRng::seed_from_u64(seed);
            let record = mock_with_rng(&schema, &Map::new(), &mut rng);
            prop_assert!(record.is_ok());
        }
    }
}
