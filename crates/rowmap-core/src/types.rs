//! Core types and data structures for the Rowmap mapping engine
//!
//! This module defines the two record shapes the engine translates between:
//! the nested, camelCase `ApplicationRecord` produced by the form layer and
//! the flat, snake_case, scalar-only `PersistenceRecord` written to storage.

use crate::error::{Result, TransformError};
use crate::guard;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A single JSON scalar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    /// Convert a JSON value, returning `None` for objects and arrays
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(b)),
            Value::Number(n) => Some(Scalar::Number(n)),
            Value::String(s) => Some(Scalar::String(s)),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => Value::Number(n.clone()),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Scalar::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    /// Name of the scalar type, used in shape mismatch messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "boolean",
            Scalar::Number(_) => "number",
            Scalar::String(_) => "string",
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Metadata of an uploaded file as held by the form layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub name: String,
    pub url: String,
    pub size: u64,
}

impl FileAttachment {
    /// Member names in column order
    pub const MEMBERS: [&'static str; 3] = ["name", "url", "size"];

    pub fn new(name: impl Into<String>, url: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            size,
        }
    }

    /// Recognize an object with exactly `name`, `url` and `size`
    fn from_map(map: &Map<String, Value>) -> Option<Self> {
        if map.len() != Self::MEMBERS.len() {
            return None;
        }
        Some(Self {
            name: map.get("name")?.as_str()?.to_string(),
            url: map.get("url")?.as_str()?.to_string(),
            size: map.get("size")?.as_u64()?,
        })
    }

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("url".to_string(), Value::String(self.url.clone()));
        map.insert("size".to_string(), Value::Number(self.size.into()));
        Value::Object(map)
    }
}

/// Nested sub-document of boolean workflow flags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusBlock {
    flags: BTreeMap<String, bool>,
}

impl StatusBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style flag insertion
    pub fn with(mut self, flag: impl Into<String>, value: bool) -> Self {
        self.flags.insert(flag.into(), value);
        self
    }

    pub fn insert(&mut self, flag: impl Into<String>, value: bool) -> Option<bool> {
        self.flags.insert(flag.into(), value)
    }

    pub fn get(&self, flag: &str) -> Option<bool> {
        self.flags.get(flag).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.flags.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Recognize an object whose every member is a boolean
    fn from_map(map: &Map<String, Value>) -> Option<Self> {
        let mut flags = BTreeMap::new();
        for (key, value) in map {
            flags.insert(key.clone(), value.as_bool()?);
        }
        Some(Self { flags })
    }

    fn to_json(&self) -> Value {
        Value::Object(
            self.flags
                .iter()
                .map(|(k, v)| (k.clone(), Value::Bool(*v)))
                .collect(),
        )
    }
}

/// Tagged value of an application record field
///
/// Classification happens once, when JSON enters the engine. Everything
/// downstream dispatches on the tag, so an unrecognized object can never be
/// mistaken for a scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    File(FileAttachment),
    Status(StatusBlock),
    /// Any object or array that matches no known shape
    Compound(Value),
}

impl FieldValue {
    /// Classify a JSON value by shape
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                if let Some(file) = FileAttachment::from_map(&map) {
                    FieldValue::File(file)
                } else if let Some(status) = StatusBlock::from_map(&map) {
                    FieldValue::Status(status)
                } else {
                    FieldValue::Compound(Value::Object(map))
                }
            }
            Value::Array(_) => FieldValue::Compound(value),
            Value::Null => FieldValue::Scalar(Scalar::Null),
            Value::Bool(b) => FieldValue::Scalar(Scalar::Bool(b)),
            Value::Number(n) => FieldValue::Scalar(Scalar::Number(n)),
            Value::String(s) => FieldValue::Scalar(Scalar::String(s)),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Scalar(s) => s.to_json(),
            FieldValue::File(file) => file.to_json(),
            FieldValue::Status(status) => status.to_json(),
            FieldValue::Compound(value) => value.clone(),
        }
    }

    /// Human-readable name of the shape
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Scalar(_) => "scalar",
            FieldValue::File(_) => "file attachment",
            FieldValue::Status(_) => "status block",
            FieldValue::Compound(_) => "unrecognized compound",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Scalar(Scalar::Null))
    }
}

impl From<Scalar> for FieldValue {
    fn from(value: Scalar) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<FileAttachment> for FieldValue {
    fn from(value: FileAttachment) -> Self {
        FieldValue::File(value)
    }
}

impl From<StatusBlock> for FieldValue {
    fn from(value: StatusBlock) -> Self {
        FieldValue::Status(value)
    }
}

/// Nested, camelCase booking record as consumed and produced by the UI layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ApplicationRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl ApplicationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a record from a JSON object, classifying every value
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(TransformError::InvalidRecord {
                message: format!(
                    "application record must be a JSON object, got {}",
                    json_type(&other)
                ),
            }),
        }
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self {
            fields: map
                .into_iter()
                .map(|(k, v)| (k, FieldValue::from_json(v)))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.to_map())
    }

    fn to_map(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

impl FromIterator<(String, FieldValue)> for ApplicationRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl TryFrom<Map<String, Value>> for ApplicationRecord {
    type Error = TransformError;

    fn try_from(map: Map<String, Value>) -> Result<Self> {
        Ok(Self::from_map(map))
    }
}

impl From<ApplicationRecord> for Map<String, Value> {
    fn from(record: ApplicationRecord) -> Self {
        record.to_map()
    }
}

/// Flat, snake_case, scalar-only row matching the storage columns
///
/// The only way to build one from arbitrary JSON is through the validation
/// guard, so holding a `PersistenceRecord` means every value is scalar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct PersistenceRecord {
    columns: BTreeMap<String, Scalar>,
}

impl PersistenceRecord {
    pub(crate) fn from_columns(columns: BTreeMap<String, Scalar>) -> Self {
        Self { columns }
    }

    /// Validate and wrap a flat JSON object
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => guard::validate(map),
            other => Err(TransformError::InvalidRecord {
                message: format!(
                    "persistence record must be a JSON object, got {}",
                    json_type(&other)
                ),
            }),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Scalar> {
        self.columns.get(column)
    }

    pub fn contains_key(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.to_map())
    }

    fn to_map(&self) -> Map<String, Value> {
        self.columns
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

impl TryFrom<Map<String, Value>> for PersistenceRecord {
    type Error = TransformError;

    fn try_from(map: Map<String, Value>) -> Result<Self> {
        guard::validate(map)
    }
}

impl From<PersistenceRecord> for Map<String, Value> {
    fn from(record: PersistenceRecord) -> Self {
        record.to_map()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
