//! Validation guard for persistence-bound records
//!
//! The guard is the last stage of every forward transform and the only way
//! to turn a candidate JSON map into a `PersistenceRecord`. A nested object or
//! array that reached this point would be rejected remotely by the storage
//! client; here it becomes a local `NonScalarValue` naming the column.

use crate::error::{Result, TransformError};
use crate::types::{PersistenceRecord, Scalar};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Check that every value of `candidate` is scalar and wrap it
///
/// Keys are scanned in order, so the reported key is the first offending
/// column.
pub fn validate(candidate: Map<String, Value>) -> Result<PersistenceRecord> {
    let mut columns = BTreeMap::new();

    for (key, value) in candidate {
        match Scalar::from_json(value) {
            Some(scalar) => {
                columns.insert(key, scalar);
            }
            None => {
                tracing::warn!(column = %key, "Rejected non-scalar value bound for persistence");
                return Err(TransformError::NonScalarValue { key });
            }
        }
    }

    Ok(PersistenceRecord::from_columns(columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test candidate must be an object"),
        }
    }

    #[test]
    fn test_accepts_scalars() {
        let record = validate(candidate(json!({
            "customer_first_name": "John",
            "guest_count": 6,
            "deposit_paid": true,
            "notes": null
        })))
        .unwrap();

        assert_eq!(record.len(), 4);
        assert_eq!(record.get("guest_count"), Some(&Scalar::from(6u64)));
    }

    #[test]
    fn test_rejects_object() {
        let err = validate(candidate(json!({
            "customer_first_name": "John",
            "crew_experience_file": {
                "name": "crew.pdf",
                "url": "https://x/crew.pdf",
                "size": 1024000
            }
        })))
        .unwrap_err();

        match err {
            TransformError::NonScalarValue { key } => assert_eq!(key, "crew_experience_file"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_array() {
        let err = validate(candidate(json!({"tags": ["vip", "repeat"]}))).unwrap_err();
        assert!(matches!(err, TransformError::NonScalarValue { ref key } if key == "tags"));
    }

    #[test]
    fn test_reports_first_offending_key() {
        let map = candidate(json!({"b_nested": {}, "a_list": [], "c": 1}));
        let err = validate(map).unwrap_err();
        assert_eq!(err.key(), Some("a_list"));
    }

    #[test]
    fn test_empty_candidate() {
        let record = validate(Map::new()).unwrap();
        assert!(record.is_empty());
    }
}
