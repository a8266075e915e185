//! Compound field decomposers
//!
//! A compound field is an application value that is a structured object and
//! must be spread over several scalar columns. Each rule names the key, the
//! column prefix and the shape; the shape decides the members and how they
//! are extracted. Dispatch is a `match` on the shape tag.

use super::table::{FieldGroup, FieldMappingTable};
use crate::error::{Result, TransformError};
use crate::types::{FieldValue, FileAttachment, PersistenceRecord, Scalar};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Recognized compound shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompoundShape {
    /// `{ name, url, size }` upload metadata
    FileAttachment,
}

impl CompoundShape {
    /// Member names in column order
    pub fn members(&self) -> &'static [&'static str] {
        match self {
            CompoundShape::FileAttachment => &FileAttachment::MEMBERS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CompoundShape::FileAttachment => "file attachment",
        }
    }
}

impl fmt::Display for CompoundShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of regrouping a rule's columns from a flat record
#[derive(Debug, Clone, PartialEq)]
pub enum Recomposed {
    /// None of the columns is present
    Absent,
    /// Every column present; either a full value or all null
    Value(FieldValue),
    /// Some columns present, others missing or null
    Partial {
        present: Vec<String>,
        missing_members: Vec<String>,
    },
}

/// Declares a structured application key and the columns it spreads over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundFieldRule {
    pub key: String,
    pub prefix: String,
    pub shape: CompoundShape,
}

impl CompoundFieldRule {
    pub fn new(key: impl Into<String>, prefix: impl Into<String>, shape: CompoundShape) -> Self {
        Self {
            key: key.into(),
            prefix: prefix.into(),
            shape,
        }
    }

    /// Column holding one member
    pub fn column(&self, member: &str) -> String {
        format!("{}_{}", self.prefix, member)
    }

    /// All columns of this rule in member order
    pub fn columns(&self) -> Vec<String> {
        self.shape.members().iter().map(|m| self.column(m)).collect()
    }

    /// Spread a value over the rule's columns
    ///
    /// `null` clears every column. Any other shape than the declared one is a
    /// `ShapeMismatch`; nothing is coerced.
    pub fn decompose(&self, value: &FieldValue) -> Result<Vec<(String, Scalar)>> {
        match (self.shape, value) {
            (CompoundShape::FileAttachment, FieldValue::File(file)) => Ok(vec![
                (self.column("name"), Scalar::String(file.name.clone())),
                (self.column("url"), Scalar::String(file.url.clone())),
                (self.column("size"), Scalar::from(file.size)),
            ]),
            (_, FieldValue::Scalar(Scalar::Null)) => Ok(self
                .columns()
                .into_iter()
                .map(|column| (column, Scalar::Null))
                .collect()),
            (shape, other) => {
                tracing::debug!(
                    key = %self.key,
                    expected = %shape,
                    found = other.kind(),
                    "Compound value has the wrong shape"
                );
                Err(TransformError::shape_mismatch(&self.key, shape.name()))
            }
        }
    }

    /// Regroup the rule's columns from a flat record
    pub fn recompose(&self, record: &PersistenceRecord) -> Result<Recomposed> {
        let members = self.shape.members();
        let mut present = Vec::new();
        let mut missing_members = Vec::new();
        let mut null_count = 0;

        for member in members {
            let column = self.column(member);
            match record.get(&column) {
                None => missing_members.push(member.to_string()),
                Some(Scalar::Null) => {
                    null_count += 1;
                    missing_members.push(member.to_string());
                    present.push(column);
                }
                Some(_) => present.push(column),
            }
        }

        if present.is_empty() {
            return Ok(Recomposed::Absent);
        }
        if null_count == members.len() {
            return Ok(Recomposed::Value(FieldValue::Scalar(Scalar::Null)));
        }
        if !missing_members.is_empty() {
            return Ok(Recomposed::Partial {
                present,
                missing_members,
            });
        }

        match self.shape {
            CompoundShape::FileAttachment => {
                let name = self.string_member(record, "name")?;
                let url = self.string_member(record, "url")?;
                let size_column = self.column("size");
                let size = record
                    .get(&size_column)
                    .and_then(Scalar::as_u64)
                    .ok_or_else(|| {
                        TransformError::shape_mismatch(&size_column, "unsigned integer")
                    })?;
                Ok(Recomposed::Value(FieldValue::File(FileAttachment { name, url, size })))
            }
        }
    }

    fn string_member(&self, record: &PersistenceRecord, member: &str) -> Result<String> {
        let column = self.column(member);
        record
            .get(&column)
            .and_then(Scalar::as_str)
            .map(str::to_string)
            .ok_or_else(|| TransformError::shape_mismatch(column, "string"))
    }
}

/// Registry of compound rules keyed by application key
#[derive(Debug, Clone, Default)]
pub struct CompoundRegistry {
    rules: Vec<CompoundFieldRule>,
    by_key: HashMap<String, usize>,
}

impl CompoundRegistry {
    /// One file attachment rule per `file` group entry, prefixed by its column
    pub fn from_table(table: &FieldMappingTable) -> Self {
        let rules = table
            .entries_in(FieldGroup::File)
            .map(|entry| {
                CompoundFieldRule::new(&entry.app_key, &entry.column, CompoundShape::FileAttachment)
            })
            .collect();
        Self::from_rules(rules)
    }

    pub fn from_rules(rules: Vec<CompoundFieldRule>) -> Self {
        let by_key = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| (rule.key.clone(), i))
            .collect();
        Self { rules, by_key }
    }

    pub fn get(&self, key: &str) -> Option<&CompoundFieldRule> {
        self.by_key.get(key).map(|&i| &self.rules[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Rule whose prefix is exactly `column`
    pub fn by_prefix(&self, column: &str) -> Option<&CompoundFieldRule> {
        self.rules.iter().find(|rule| rule.prefix == column)
    }

    /// Rule owning a decomposed column
    pub fn owner_of(&self, column: &str) -> Option<&CompoundFieldRule> {
        self.rules
            .iter()
            .find(|rule| rule.shape.members().iter().any(|m| rule.column(m) == column))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompoundFieldRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatusBlock;
    use serde_json::json;

    fn crew_rule() -> CompoundFieldRule {
        CompoundFieldRule::new(
            "crewExperienceFile",
            "crew_experience_file",
            CompoundShape::FileAttachment,
        )
    }

    #[test]
    fn test_decompose_file() {
        let value =
            FieldValue::File(FileAttachment::new("crew.pdf", "https://x/crew.pdf", 1024000));
        let columns = crew_rule().decompose(&value).unwrap();
        assert_eq!(
            columns,
            vec![
                ("crew_experience_file_name".to_string(), Scalar::from("crew.pdf")),
                ("crew_experience_file_url".to_string(), Scalar::from("https://x/crew.pdf")),
                ("crew_experience_file_size".to_string(), Scalar::from(1024000u64)),
            ]
        );
    }

    #[test]
    fn test_decompose_null_clears_every_column() {
        let columns = crew_rule().decompose(&FieldValue::Scalar(Scalar::Null)).unwrap();
        assert_eq!(columns.len(), 3);
        assert!(columns.iter().all(|(_, v)| v.is_null()));
    }

    #[test]
    fn test_decompose_wrong_shapes() {
        let rule = crew_rule();
        let wrong = [
            FieldValue::Scalar(Scalar::from("crew.pdf")),
            FieldValue::Scalar(Scalar::from(12u64)),
            FieldValue::Status(StatusBlock::new().with("uploaded", true)),
            FieldValue::Compound(json!({"name": "crew.pdf", "url": "https://x/crew.pdf"})),
            FieldValue::Compound(json!(["crew.pdf"])),
        ];

        for value in wrong {
            let err = rule.decompose(&value).unwrap_err();
            match err {
                TransformError::ShapeMismatch { key, expected_shape } => {
                    assert_eq!(key, "crewExperienceFile");
                    assert_eq!(expected_shape, "file attachment");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_recompose_full() {
        let record = PersistenceRecord::from_json(json!({
            "crew_experience_file_name": "crew.pdf",
            "crew_experience_file_url": "https://x/crew.pdf",
            "crew_experience_file_size": 1024000
        }))
        .unwrap();

        assert_eq!(
            crew_rule().recompose(&record).unwrap(),
            Recomposed::Value(FieldValue::File(FileAttachment::new(
                "crew.pdf",
                "https://x/crew.pdf",
                1024000
            )))
        );
    }

    #[test]
    fn test_recompose_absent_and_null() {
        let empty = PersistenceRecord::from_json(json!({"notes": "x"})).unwrap();
        assert_eq!(crew_rule().recompose(&empty).unwrap(), Recomposed::Absent);

        let nulls = PersistenceRecord::from_json(json!({
            "crew_experience_file_name": null,
            "crew_experience_file_url": null,
            "crew_experience_file_size": null
        }))
        .unwrap();
        assert_eq!(
            crew_rule().recompose(&nulls).unwrap(),
            Recomposed::Value(FieldValue::Scalar(Scalar::Null))
        );
    }

    #[test]
    fn test_recompose_partial() {
        let record = PersistenceRecord::from_json(json!({
            "crew_experience_file_name": "crew.pdf",
            "crew_experience_file_url": "https://x/crew.pdf"
        }))
        .unwrap();

        match crew_rule().recompose(&record).unwrap() {
            Recomposed::Partial { present, missing_members } => {
                assert_eq!(present.len(), 2);
                assert_eq!(missing_members, vec!["size".to_string()]);
            }
            other => panic!("expected partial, got {other:?}"),
        }
    }

    #[test]
    fn test_recompose_partial_with_null_member() {
        let record = PersistenceRecord::from_json(json!({
            "crew_experience_file_name": "crew.pdf",
            "crew_experience_file_url": null,
            "crew_experience_file_size": 10
        }))
        .unwrap();

        match crew_rule().recompose(&record).unwrap() {
            Recomposed::Partial { present, missing_members } => {
                assert_eq!(present.len(), 3);
                assert_eq!(missing_members, vec!["url".to_string()]);
            }
            other => panic!("expected partial, got {other:?}"),
        }
    }

    #[test]
    fn test_recompose_wrong_member_type() {
        let record = PersistenceRecord::from_json(json!({
            "crew_experience_file_name": "crew.pdf",
            "crew_experience_file_url": "https://x/crew.pdf",
            "crew_experience_file_size": "large"
        }))
        .unwrap();

        let err = crew_rule().recompose(&record).unwrap_err();
        assert!(matches!(
            err,
            TransformError::ShapeMismatch { ref key, .. } if key == "crew_experience_file_size"
        ));
    }

    #[test]
    fn test_registry_from_booking_table() {
        let registry = CompoundRegistry::from_table(&FieldMappingTable::booking());
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("crewExperienceFile"));
        assert!(registry.contains("signedContractFile"));
        assert_eq!(
            registry.owner_of("signed_contract_file_url").map(|r| r.key.as_str()),
            Some("signedContractFile")
        );
        assert!(registry.by_prefix("crew_experience_file").is_some());
        assert!(registry.owner_of("crew_experience_file").is_none());
    }
}
