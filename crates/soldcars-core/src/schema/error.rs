//! Validation errors

use std::fmt;

use thiserror::Error;

/// The constraint a value violated
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Required field absent from the input
    Missing,
    /// Field present in the input but not declared by the schema
    Unknown,
    /// Value has the wrong JSON kind
    WrongKind { expected: &'static str },
    /// Integer outside its inclusive bounds
    IntOutOfRange { min: i64, max: i64 },
    /// Float outside its inclusive bounds
    FloatOutOfRange { min: f64, max: f64 },
    /// String length outside its inclusive bounds
    BadLength {
        min_len: usize,
        max_len: usize,
        actual: usize,
    },
    /// Value passed the schema but does not fit the typed model
    Malformed { reason: String },
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Missing => write!(f, "is required"),
            Constraint::Unknown => write!(f, "is not allowed"),
            Constraint::WrongKind { expected } => write!(f, "must be {}", expected),
            Constraint::IntOutOfRange { min, max } => {
                write!(f, "must be an integer in [{}, {}]", min, max)
            }
            Constraint::FloatOutOfRange { min, max } => {
                write!(f, "must be a number in [{}, {}]", min, max)
            }
            Constraint::BadLength {
                min_len,
                max_len,
                actual,
            } => write!(
                f,
                "must be {}..={} characters long, got {}",
                min_len, max_len, actual
            ),
            Constraint::Malformed { reason } => write!(f, "is malformed: {}", reason),
        }
    }
}

/// Input did not satisfy a schema
///
/// `path` is the dotted field path from the schema root, e.g.
/// `engine.maxRpm`. An empty path refers to the input as a whole.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid value for '{path}': {constraint}")]
pub struct ValidationError {
    pub path: String,
    pub constraint: Constraint,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            path: path.into(),
            constraint,
        }
    }
}
