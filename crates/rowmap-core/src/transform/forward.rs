//! Application record → persistence record

use super::report::ReportTracker;
use super::MappingEngine;
use crate::config::UnknownFieldPolicy;
use crate::error::{Result, TransformError};
use crate::guard;
use crate::mapping::STATUS_KEY;
use crate::types::{ApplicationRecord, FieldValue, PersistenceRecord, Scalar};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Candidate row that refuses to overwrite a column with a different value
#[derive(Debug, Default)]
struct ColumnMerger {
    values: Map<String, Value>,
    sources: HashMap<String, Vec<String>>,
}

impl ColumnMerger {
    fn insert(
        &mut self,
        source: &str,
        column: String,
        value: Value,
        tracker: &mut ReportTracker,
    ) -> Result<()> {
        match self.values.get(&column) {
            None => {
                self.sources.insert(column.clone(), vec![source.to_string()]);
                self.values.insert(column, value);
                Ok(())
            }
            Some(existing) => {
                let sources = self.sources.entry(column.clone()).or_default();
                sources.push(source.to_string());
                if *existing == value {
                    tracker.deduplicated(&column, sources.clone());
                    Ok(())
                } else {
                    Err(TransformError::FieldCollision {
                        column,
                        keys: sources.clone(),
                    })
                }
            }
        }
    }
}

pub(super) fn run(
    engine: &MappingEngine,
    record: &ApplicationRecord,
    tracker: &mut ReportTracker,
) -> Result<PersistenceRecord> {
    let mut merger = ColumnMerger::default();

    // Step 1: flatten the status block
    if let Some(value) = record.get(STATUS_KEY) {
        let entries = engine
            .status
            .flatten(value, &engine.table, engine.unknown_fields)?;
        let columns: Vec<String> = entries.iter().map(|e| e.column.clone()).collect();
        for entry in entries {
            merger.insert(&entry.source, entry.column, Value::Bool(entry.value), tracker)?;
        }
        debug!(flags = columns.len(), "Flattened status block");
        tracker.consumed(
            STATUS_KEY,
            format!("Status block flattened into {} column(s)", columns.len()),
            columns,
        );
    }

    // Step 2: decompose compound fields
    for (key, value) in record.iter() {
        let Some(rule) = engine.compounds.get(key) else {
            continue;
        };
        let columns = rule.decompose(value)?;
        let names: Vec<String> = columns.iter().map(|(c, _)| c.clone()).collect();
        for (column, scalar) in columns {
            merger.insert(key, column, scalar.to_json(), tracker)?;
        }
        debug!(key, "Decomposed compound field");
        tracker.consumed(
            key,
            format!("'{key}' decomposed into {} column(s)", names.len()),
            names,
        );
    }

    // Step 3 and 4: drop transient keys, rename the rest
    for (key, value) in record.iter() {
        if key == STATUS_KEY || engine.compounds.contains(key) {
            continue;
        }
        if engine.table.is_transient(key) {
            tracker.dropped(key);
            continue;
        }

        let column = match engine.table.lookup(key) {
            Some(column) => column.to_string(),
            None => match engine.unknown_fields {
                UnknownFieldPolicy::Reject => {
                    debug!(key, "Rejected unmapped key");
                    return Err(TransformError::UnknownField { key: key.to_string() });
                }
                UnknownFieldPolicy::Passthrough => {
                    tracker.passthrough(key);
                    key.to_string()
                }
            },
        };

        // Status columns only ever hold booleans
        if engine.status.is_member_column(&column) {
            match value {
                FieldValue::Scalar(Scalar::Bool(_)) => {}
                FieldValue::Scalar(Scalar::Null) => {
                    tracker.dropped_null_flag(key);
                    continue;
                }
                other => {
                    debug!(key, found = other.kind(), "Status flag is not boolean");
                    return Err(TransformError::shape_mismatch(key, "boolean"));
                }
            }
        }
        merger.insert(key, column, value.to_json(), tracker)?;
    }

    // Step 5: nothing leaves without passing the guard
    guard::validate(merger.values)
}
