//! Shared utilities for command handlers

use crate::config::Config;
use crate::error::{Error, ErrorContext, Result};
use crate::logging::redaction;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Records read from an input file
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFile {
    pub values: Vec<Value>,
    /// The file held an array rather than a single record
    pub batch: bool,
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false)
}

/// Load one record or an array of records from a JSON or YAML file
pub fn load_records(path: &Path) -> Result<RecordFile> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    let value: Value = if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "YAML".to_string(),
        })?
    } else {
        serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: "JSON".to_string(),
        })?
    };

    let file = match value {
        Value::Array(values) => RecordFile { values, batch: true },
        value @ Value::Object(_) => RecordFile {
            values: vec![value],
            batch: false,
        },
        _ => {
            return Err(Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "an object or an array of objects".to_string(),
            })
        }
    };

    tracing::debug!(
        path = %path.display(),
        records = file.values.len(),
        batch = file.batch,
        "Loaded records"
    );
    Ok(file)
}

/// Write converted records, YAML or JSON by extension
pub fn save_records(path: &Path, value: &Value) -> Result<()> {
    let content = if is_yaml(path) {
        serde_yaml::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };

    fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}

/// Trace a record, masking customer data unless disabled
pub fn log_record(config: &Config, index: usize, value: &Value) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let rendered = if config.logging.redact {
        redaction::redacted(value)
    } else {
        value.to_string()
    };
    tracing::debug!(index, record = %rendered, "Processing record");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_single_and_batch() {
        let dir = TempDir::new().unwrap();

        let single = dir.path().join("booking.json");
        fs::write(&single, r#"{"firstName": "John"}"#).unwrap();
        let file = load_records(&single).unwrap();
        assert!(!file.batch);
        assert_eq!(file.values, vec![json!({"firstName": "John"})]);

        let batch = dir.path().join("bookings.yaml");
        fs::write(&batch, "- firstName: John\n- firstName: Jane\n").unwrap();
        let file = load_records(&batch).unwrap();
        assert!(file.batch);
        assert_eq!(file.values.len(), 2);
    }

    #[test]
    fn test_load_rejects_scalars_and_bad_syntax() {
        let dir = TempDir::new().unwrap();

        let scalar = dir.path().join("n.json");
        fs::write(&scalar, "42").unwrap();
        assert!(matches!(load_records(&scalar), Err(Error::InvalidFormat { .. })));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{\"firstName\": ").unwrap();
        assert!(matches!(load_records(&broken), Err(Error::InvalidFormat { .. })));

        assert!(matches!(
            load_records(&dir.path().join("missing.json")),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_save_records_by_extension() {
        let dir = TempDir::new().unwrap();
        let value = json!([{"customer_first_name": "John"}]);

        let yaml = dir.path().join("rows.yml");
        save_records(&yaml, &value).unwrap();
        assert!(fs::read_to_string(&yaml).unwrap().contains("customer_first_name: John"));

        let json_path = dir.path().join("rows.json");
        save_records(&json_path, &value).unwrap();
        let back: Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(back, value);
    }
}
