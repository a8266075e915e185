//! Status block flattener
//!
//! The status sub-document is flattened into top-level columns on the way to
//! storage and never kept in nested form. Members are resolved through the
//! mapping table; the nested block only reappears when a flat row is read
//! back.

use super::table::{FieldGroup, FieldMappingTable};
use crate::config::UnknownFieldPolicy;
use crate::error::{Result, TransformError};
use crate::types::{FieldValue, PersistenceRecord, Scalar, StatusBlock};

/// Application key holding the status sub-document
pub const STATUS_KEY: &str = "status";

/// One flattened status flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Source path, e.g. `status.depositPaid`
    pub source: String,
    pub column: String,
    pub value: bool,
}

/// Flags regrouped from a flat record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuiltStatus {
    pub block: StatusBlock,
    /// Every member column seen, including null ones
    pub consumed: Vec<String>,
}

/// Flatten-only rule for the status sub-document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBlockRule {
    key: String,
    /// (flag, column) pairs in table order
    members: Vec<(String, String)>,
}

impl StatusBlockRule {
    /// Members are the table's `status` group entries
    pub fn from_table(table: &FieldMappingTable) -> Self {
        Self {
            key: STATUS_KEY.to_string(),
            members: table
                .entries_in(FieldGroup::Status)
                .map(|entry| (entry.app_key.clone(), entry.column.clone()))
                .collect(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &str)> {
        self.members.iter().map(|(flag, column)| (flag.as_str(), column.as_str()))
    }

    /// Whether `column` belongs to a declared status member
    pub fn is_member_column(&self, column: &str) -> bool {
        self.members.iter().any(|(_, c)| c == column)
    }

    /// Column of a declared status member
    pub fn member_column(&self, flag: &str) -> Option<&str> {
        self.members
            .iter()
            .find(|(f, _)| f == flag)
            .map(|(_, column)| column.as_str())
    }

    /// Flatten the value found at the status key
    ///
    /// `null` yields no entries. Only members of the status group are
    /// resolved. A flag that names another table key or column is a shape
    /// mismatch; any other unknown flag follows the unknown field policy.
    pub fn flatten(
        &self,
        value: &FieldValue,
        table: &FieldMappingTable,
        unknown_fields: UnknownFieldPolicy,
    ) -> Result<Vec<StatusEntry>> {
        let block = match value {
            FieldValue::Status(block) => block,
            FieldValue::Scalar(Scalar::Null) => return Ok(Vec::new()),
            other => {
                tracing::debug!(found = other.kind(), "Status key holds a non-status value");
                return Err(TransformError::shape_mismatch(&self.key, "status block"));
            }
        };

        let mut entries = Vec::with_capacity(block.len());
        for (flag, flag_value) in block.iter() {
            let source = format!("{}.{}", self.key, flag);
            let column = match self.member_column(flag) {
                Some(column) => column.to_string(),
                None if table.lookup(flag).is_some() || table.reverse_lookup(flag).is_some() => {
                    tracing::debug!(flag, "Status block holds a field of another group");
                    return Err(TransformError::shape_mismatch(&source, "status flag"));
                }
                None => match unknown_fields {
                    UnknownFieldPolicy::Reject => {
                        return Err(TransformError::UnknownField { key: source });
                    }
                    UnknownFieldPolicy::Passthrough => flag.to_string(),
                },
            };
            entries.push(StatusEntry {
                source,
                column,
                value: flag_value,
            });
        }

        Ok(entries)
    }

    /// Collect declared member columns back into a status block
    ///
    /// Null members are skipped. Returns `None` when no member column is
    /// present at all.
    pub fn rebuild(&self, record: &PersistenceRecord) -> Result<Option<RebuiltStatus>> {
        let mut block = StatusBlock::new();
        let mut consumed = Vec::new();

        for (flag, column) in &self.members {
            match record.get(column) {
                None => continue,
                Some(Scalar::Null) => consumed.push(column.clone()),
                Some(Scalar::Bool(value)) => {
                    block.insert(flag.clone(), *value);
                    consumed.push(column.clone());
                }
                Some(other) => {
                    tracing::debug!(
                        column = %column,
                        found = other.type_name(),
                        "Status column is not boolean"
                    );
                    return Err(TransformError::shape_mismatch(column, "boolean"));
                }
            }
        }

        if consumed.is_empty() {
            return Ok(None);
        }
        Ok(Some(RebuiltStatus { block, consumed }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule() -> (StatusBlockRule, FieldMappingTable) {
        let table = FieldMappingTable::booking();
        (StatusBlockRule::from_table(&table), table)
    }

    #[test]
    fn test_members_follow_table() {
        let (rule, _) = rule();
        assert_eq!(rule.members().count(), 6);
        assert!(rule.is_member_column("deposit_paid"));
        assert!(!rule.is_member_column("customer_first_name"));
    }

    #[test]
    fn test_flatten() {
        let (rule, table) = rule();
        let value = FieldValue::Status(
            StatusBlock::new()
                .with("depositPaid", true)
                .with("contractSigned", false),
        );

        let entries = rule.flatten(&value, &table, UnknownFieldPolicy::Reject).unwrap();
        assert_eq!(
            entries,
            vec![
                StatusEntry {
                    source: "status.contractSigned".into(),
                    column: "contract_signed".into(),
                    value: false
                },
                StatusEntry {
                    source: "status.depositPaid".into(),
                    column: "deposit_paid".into(),
                    value: true
                },
            ]
        );
    }

    #[test]
    fn test_flatten_null_and_empty() {
        let (rule, table) = rule();
        let none = rule
            .flatten(&FieldValue::Scalar(Scalar::Null), &table, UnknownFieldPolicy::Reject)
            .unwrap();
        assert!(none.is_empty());

        let empty = rule
            .flatten(&FieldValue::Status(StatusBlock::new()), &table, UnknownFieldPolicy::Reject)
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_flatten_wrong_shape() {
        let (rule, table) = rule();
        for value in [
            FieldValue::Scalar(Scalar::from("confirmed")),
            FieldValue::Compound(json!({"depositPaid": "yes"})),
            FieldValue::Compound(json!([true])),
        ] {
            let err = rule.flatten(&value, &table, UnknownFieldPolicy::Reject).unwrap_err();
            assert!(matches!(
                err,
                TransformError::ShapeMismatch { ref key, ref expected_shape }
                    if key == "status" && expected_shape == "status block"
            ));
        }
    }

    #[test]
    fn test_flatten_unknown_flag() {
        let (rule, table) = rule();
        let value = FieldValue::Status(StatusBlock::new().with("insurancePaid", true));

        let err = rule.flatten(&value, &table, UnknownFieldPolicy::Reject).unwrap_err();
        assert!(matches!(
            err,
            TransformError::UnknownField { ref key } if key == "status.insurancePaid"
        ));

        let entries = rule.flatten(&value, &table, UnknownFieldPolicy::Passthrough).unwrap();
        assert_eq!(entries[0].column, "insurancePaid");
    }

    #[test]
    fn test_flatten_field_of_another_group() {
        let (rule, table) = rule();
        for flag in ["notes", "crewExperienceFile", "firstName", "crew_experience_file"] {
            let value = FieldValue::Status(StatusBlock::new().with(flag, true));
            for policy in [UnknownFieldPolicy::Reject, UnknownFieldPolicy::Passthrough] {
                let err = rule.flatten(&value, &table, policy).unwrap_err();
                assert!(
                    matches!(
                        err,
                        TransformError::ShapeMismatch { ref key, ref expected_shape }
                            if *key == format!("status.{flag}") && expected_shape == "status flag"
                    ),
                    "{flag}: {err}"
                );
            }
        }
    }

    #[test]
    fn test_member_column() {
        let (rule, _) = rule();
        assert_eq!(rule.member_column("depositPaid"), Some("deposit_paid"));
        assert_eq!(rule.member_column("notes"), None);
    }

    #[test]
    fn test_rebuild() {
        let (rule, _) = rule();
        let record = PersistenceRecord::from_json(json!({
            "deposit_paid": true,
            "contract_signed": false,
            "checked_in": null,
            "customer_first_name": "John"
        }))
        .unwrap();

        let rebuilt = rule.rebuild(&record).unwrap().unwrap();
        assert_eq!(
            rebuilt.block,
            StatusBlock::new().with("depositPaid", true).with("contractSigned", false)
        );
        assert_eq!(rebuilt.consumed.len(), 3);
    }

    #[test]
    fn test_rebuild_without_members() {
        let (rule, _) = rule();
        let record = PersistenceRecord::from_json(json!({"customer_first_name": "John"})).unwrap();
        assert_eq!(rule.rebuild(&record).unwrap(), None);
    }

    #[test]
    fn test_rebuild_non_boolean() {
        let (rule, _) = rule();
        let record = PersistenceRecord::from_json(json!({"deposit_paid": "yes"})).unwrap();
        let err = rule.rebuild(&record).unwrap_err();
        assert!(matches!(
            err,
            TransformError::ShapeMismatch { ref key, .. } if key == "deposit_paid"
        ));
    }
}
