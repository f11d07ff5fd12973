//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde_json::{json, Map, Value};
use soldcars_core::Record;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single car record
    pub fn print_record(&self, record: &Record) {
        match self.format {
            OutputFormat::Human => {
                for (path, value) in flatten(record.as_map()) {
                    println!("{:<40} {}", format!("{}:", path), scalar(&value));
                }
            }
            OutputFormat::Json => {
                println!("{:#}", Value::Object(record.as_map().clone()));
            }
            OutputFormat::Quiet => {
                println!("{}", serial_of(record));
            }
        }
    }

    /// Print a list of car records
    pub fn print_records(&self, records: &[Record]) {
        match self.format {
            OutputFormat::Human => {
                if records.is_empty() {
                    println!("No cars found.");
                    return;
                }
                for record in records {
                    println!(
                        "{:>10} | {} {} ({}) | {}",
                        serial_of(record),
                        text_at(record, "manufacturer"),
                        text_at(record, "model"),
                        text_at(record, "modelYear"),
                        truncate(&text_at(record, "ownerName"), 30)
                    );
                }
                println!("\n{} car(s)", records.len());
            }
            OutputFormat::Json => {
                let list: Vec<Value> = records
                    .iter()
                    .map(|r| Value::Object(r.as_map().clone()))
                    .collect();
                println!("{:#}", Value::Array(list));
            }
            OutputFormat::Quiet => {
                for record in records {
                    println!("{}", serial_of(record));
                }
            }
        }
    }

    /// Print an arbitrary JSON value (pretty in human mode)
    pub fn print_value(&self, value: &Value) {
        match self.format {
            OutputFormat::Human => println!("{:#}", value),
            OutputFormat::Json => println!("{}", value),
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!("{}", json!({"status": "success", "message": message}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn serial_of(record: &Record) -> String {
    text_at(record, "serialNumber")
}

fn text_at(record: &Record, path: &str) -> String {
    record
        .get(path)
        .map(scalar)
        .unwrap_or_else(|| "-".to_string())
}

/// Strings without quotes, everything else as JSON
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Leaf values keyed by dotted path, in record order
fn flatten(map: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut leaves = Vec::new();
    flatten_into(None, map, &mut leaves);
    leaves
}

fn flatten_into(
    prefix: Option<&str>,
    map: &Map<String, Value>,
    leaves: &mut Vec<(String, Value)>,
) {
    for (key, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => flatten_into(Some(&path), nested, leaves),
            leaf => leaves.push((path, leaf.clone())),
        }
    }
}

/// Truncate a string to max chars, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
