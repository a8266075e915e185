//! Persistence record → application record

use super::report::ReportTracker;
use super::MappingEngine;
use crate::config::{PartialCompoundPolicy, UnknownFieldPolicy};
use crate::error::{Result, TransformError};
use crate::mapping::{Recomposed, STATUS_KEY};
use crate::types::{ApplicationRecord, FieldValue, PersistenceRecord};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Output record that refuses two different values for one key
#[derive(Debug, Default)]
struct KeyMerger {
    values: BTreeMap<String, FieldValue>,
    sources: BTreeMap<String, Vec<String>>,
}

impl KeyMerger {
    fn insert(
        &mut self,
        source: &str,
        key: String,
        value: FieldValue,
        tracker: &mut ReportTracker,
    ) -> Result<()> {
        let sources = self.sources.entry(key.clone()).or_default();
        sources.push(source.to_string());

        match self.values.get(&key) {
            None => {
                self.values.insert(key, value);
                Ok(())
            }
            Some(existing) if *existing == value => {
                tracker.deduplicated(&key, sources.clone());
                Ok(())
            }
            Some(_) => Err(TransformError::FieldCollision {
                column: key,
                keys: sources.clone(),
            }),
        }
    }
}

pub(super) fn run(
    engine: &MappingEngine,
    row: &PersistenceRecord,
    tracker: &mut ReportTracker,
) -> Result<ApplicationRecord> {
    let mut merger = KeyMerger::default();
    let mut consumed: HashSet<String> = HashSet::new();

    // Step 1: regroup compound columns
    for rule in engine.compounds.iter() {
        match rule.recompose(row)? {
            Recomposed::Absent => {}
            Recomposed::Value(value) => {
                let columns = rule.columns();
                consumed.extend(columns.iter().cloned());
                tracker.consumed(
                    &rule.key,
                    format!("'{}' regrouped from {} column(s)", rule.key, columns.len()),
                    columns,
                );
                merger.insert(&rule.prefix, rule.key.clone(), value, tracker)?;
            }
            Recomposed::Partial {
                present,
                missing_members,
            } => match engine.partial_compounds {
                PartialCompoundPolicy::Reject => {
                    debug!(key = %rule.key, ?missing_members, "Rejected partial compound group");
                    return Err(TransformError::IncompleteCompound {
                        key: rule.key.clone(),
                        missing_members,
                    });
                }
                PartialCompoundPolicy::Omit => {
                    consumed.extend(present.iter().cloned());
                    tracker.omitted(&rule.key, &missing_members, present);
                }
            },
        }
    }

    // Step 2: rebuild the status block
    if let Some(rebuilt) = engine.status.rebuild(row)? {
        consumed.extend(rebuilt.consumed.iter().cloned());
        if rebuilt.block.is_empty() {
            debug!("Status columns all null, no block rebuilt");
        } else {
            tracker.consumed(
                STATUS_KEY,
                format!("Status block rebuilt from {} column(s)", rebuilt.consumed.len()),
                rebuilt.consumed,
            );
            merger.insert(
                STATUS_KEY,
                STATUS_KEY.to_string(),
                FieldValue::Status(rebuilt.block),
                tracker,
            )?;
        }
    }

    // Step 3: inverse rename of the remaining columns
    for (column, value) in row.iter() {
        if consumed.contains(column) {
            continue;
        }
        if let Some(rule) = engine.compounds.by_prefix(column) {
            debug!(column, key = %rule.key, "Compound column stored as a single scalar");
            return Err(TransformError::shape_mismatch(
                column,
                "decomposed file attachment columns",
            ));
        }

        let key = match engine.table.reverse_lookup(column) {
            Some(key) => key.to_string(),
            None => match engine.unknown_fields {
                UnknownFieldPolicy::Reject => {
                    debug!(column, "Rejected unmapped column");
                    return Err(TransformError::UnknownField { key: column.to_string() });
                }
                UnknownFieldPolicy::Passthrough => {
                    tracker.passthrough(column);
                    column.to_string()
                }
            },
        };
        merger.insert(column, key, FieldValue::Scalar(value.clone()), tracker)?;
    }

    Ok(merger.values.into_iter().collect())
}
