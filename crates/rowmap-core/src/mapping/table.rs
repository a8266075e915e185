//! Field mapping table
//!
//! An ordered registry of application key → column renames, grouped by the
//! domain area each field belongs to. A key with no entry is an identity
//! passthrough candidate; whether that passthrough is allowed is an engine
//! policy, not a property of the table.
//!
//! The table also lists the UI-only transient keys that never reach storage.

use crate::error::{Result, TransformError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Domain area of a mapped field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Financial,
    Customer,
    BookingDetail,
    Status,
    Timestamp,
    File,
    Notes,
}

impl FieldGroup {
    /// All groups in display order
    pub const ALL: [FieldGroup; 7] = [
        FieldGroup::Financial,
        FieldGroup::Customer,
        FieldGroup::BookingDetail,
        FieldGroup::Status,
        FieldGroup::Timestamp,
        FieldGroup::File,
        FieldGroup::Notes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldGroup::Financial => "financial",
            FieldGroup::Customer => "customer",
            FieldGroup::BookingDetail => "booking_detail",
            FieldGroup::Status => "status",
            FieldGroup::Timestamp => "timestamp",
            FieldGroup::File => "file",
            FieldGroup::Notes => "notes",
        }
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldGroup {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        FieldGroup::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| TransformError::configuration(format!("unknown field group '{s}'")))
    }
}

/// A single rename entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub app_key: String,
    pub column: String,
    pub group: FieldGroup,
}

/// Built-in booking fields: (app key, column, group)
const BOOKING_FIELDS: &[(&str, &str, FieldGroup)] = &[
    // Financial
    ("totalPrice", "total_price", FieldGroup::Financial),
    ("depositAmount", "deposit_amount", FieldGroup::Financial),
    ("balanceDue", "balance_due", FieldGroup::Financial),
    ("currency", "currency", FieldGroup::Financial),
    ("paymentMethod", "payment_method", FieldGroup::Financial),
    // Customer
    ("firstName", "customer_first_name", FieldGroup::Customer),
    ("lastName", "customer_last_name", FieldGroup::Customer),
    ("email", "customer_email", FieldGroup::Customer),
    ("phone", "customer_phone", FieldGroup::Customer),
    ("nationality", "customer_nationality", FieldGroup::Customer),
    // Booking detail
    ("id", "id", FieldGroup::BookingDetail),
    ("bookingReference", "booking_reference", FieldGroup::BookingDetail),
    ("yachtName", "yacht_name", FieldGroup::BookingDetail),
    ("charterType", "charter_type", FieldGroup::BookingDetail),
    ("startDate", "start_date", FieldGroup::BookingDetail),
    ("endDate", "end_date", FieldGroup::BookingDetail),
    ("embarkationPort", "embarkation_port", FieldGroup::BookingDetail),
    ("guestCount", "guest_count", FieldGroup::BookingDetail),
    ("skipperRequired", "skipper_required", FieldGroup::BookingDetail),
    // Status flags
    ("depositPaid", "deposit_paid", FieldGroup::Status),
    ("finalPaymentPaid", "final_payment_paid", FieldGroup::Status),
    ("contractSigned", "contract_signed", FieldGroup::Status),
    ("crewListSubmitted", "crew_list_submitted", FieldGroup::Status),
    ("bookingConfirmed", "booking_confirmed", FieldGroup::Status),
    ("checkedIn", "checked_in", FieldGroup::Status),
    // Timestamps
    ("createdAt", "created_at", FieldGroup::Timestamp),
    ("updatedAt", "updated_at", FieldGroup::Timestamp),
    ("confirmedAt", "confirmed_at", FieldGroup::Timestamp),
    // Files: the column is the prefix of the decomposed columns
    ("crewExperienceFile", "crew_experience_file", FieldGroup::File),
    ("signedContractFile", "signed_contract_file", FieldGroup::File),
    // Notes
    ("notes", "notes", FieldGroup::Notes),
    ("specialRequests", "special_requests", FieldGroup::Notes),
    ("internalNotes", "internal_notes", FieldGroup::Notes),
];

/// UI-only keys the form layer attaches to records
const BOOKING_TRANSIENT_KEYS: &[&str] =
    &["isEditing", "isDirty", "uploadProgress", "validationErrors"];

const APP_KEY_PATTERN: &str = r"^[a-z][a-zA-Z0-9]*$";
const COLUMN_PATTERN: &str = r"^[a-z][a-z0-9]*(_[a-z0-9]+)*$";

/// Ordered, immutable rename registry
#[derive(Debug, Clone)]
pub struct FieldMappingTable {
    entries: Vec<FieldMapping>,
    by_app_key: HashMap<String, usize>,
    by_column: HashMap<String, usize>,
    transient: HashSet<String>,
}

impl FieldMappingTable {
    /// Start an empty table
    pub fn builder() -> FieldMappingTableBuilder {
        FieldMappingTableBuilder::default()
    }

    /// Builder preloaded with the booking fields
    pub fn booking_builder() -> FieldMappingTableBuilder {
        let mut builder = FieldMappingTableBuilder::default();
        for (app_key, column, group) in BOOKING_FIELDS {
            builder = builder.field(*app_key, *column, *group);
        }
        for key in BOOKING_TRANSIENT_KEYS {
            builder = builder.transient(*key);
        }
        builder
    }

    /// The built-in booking table
    pub fn booking() -> Self {
        let builder = Self::booking_builder();
        Self::assemble(builder.entries, builder.transient)
    }

    fn assemble(entries: Vec<FieldMapping>, transient: Vec<String>) -> Self {
        let mut by_app_key = HashMap::with_capacity(entries.len());
        let mut by_column = HashMap::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            by_app_key.entry(entry.app_key.clone()).or_insert(index);
            // First entry wins when two app keys alias one column
            by_column.entry(entry.column.clone()).or_insert(index);
        }

        Self {
            entries,
            by_app_key,
            by_column,
            transient: transient.into_iter().collect(),
        }
    }

    /// Column for an application key
    pub fn lookup(&self, app_key: &str) -> Option<&str> {
        self.by_app_key
            .get(app_key)
            .map(|&i| self.entries[i].column.as_str())
    }

    /// Application key for a column
    pub fn reverse_lookup(&self, column: &str) -> Option<&str> {
        self.by_column
            .get(column)
            .map(|&i| self.entries[i].app_key.as_str())
    }

    pub fn get(&self, app_key: &str) -> Option<&FieldMapping> {
        self.by_app_key.get(app_key).map(|&i| &self.entries[i])
    }

    pub fn group_of(&self, app_key: &str) -> Option<FieldGroup> {
        self.get(app_key).map(|entry| entry.group)
    }

    /// Entries of one group in table order
    pub fn entries_in(&self, group: FieldGroup) -> impl Iterator<Item = &FieldMapping> {
        self.entries.iter().filter(move |entry| entry.group == group)
    }

    pub fn entries(&self) -> &[FieldMapping] {
        &self.entries
    }

    pub fn is_transient(&self, app_key: &str) -> bool {
        self.transient.contains(app_key)
    }

    /// Transient keys in sorted order
    pub fn transient_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.transient.iter().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FieldMappingTable {
    fn default() -> Self {
        Self::booking()
    }
}

/// Builder validating entries before the table is frozen
#[derive(Debug, Clone, Default)]
pub struct FieldMappingTableBuilder {
    entries: Vec<FieldMapping>,
    transient: Vec<String>,
}

impl FieldMappingTableBuilder {
    /// Append a rename entry
    pub fn field(
        mut self,
        app_key: impl Into<String>,
        column: impl Into<String>,
        group: FieldGroup,
    ) -> Self {
        self.entries.push(FieldMapping {
            app_key: app_key.into(),
            column: column.into(),
            group,
        });
        self
    }

    /// Declare a UI-only key
    pub fn transient(mut self, key: impl Into<String>) -> Self {
        self.transient.push(key.into());
        self
    }

    /// Validate and freeze the table
    ///
    /// Two app keys may alias the same column; the collision is detected per
    /// record by the forward transform.
    pub fn build(self) -> Result<FieldMappingTable> {
        let app_key_re = compile(APP_KEY_PATTERN)?;
        let column_re = compile(COLUMN_PATTERN)?;

        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !app_key_re.is_match(&entry.app_key) {
                return Err(TransformError::configuration(format!(
                    "application key '{}' is not camelCase",
                    entry.app_key
                )));
            }
            if !column_re.is_match(&entry.column) {
                return Err(TransformError::configuration(format!(
                    "column '{}' for '{}' is not snake_case",
                    entry.column, entry.app_key
                )));
            }
            if !seen.insert(entry.app_key.as_str()) {
                return Err(TransformError::configuration(format!(
                    "application key '{}' is mapped more than once",
                    entry.app_key
                )));
            }
        }

        for key in &self.transient {
            if seen.contains(key.as_str()) {
                return Err(TransformError::configuration(format!(
                    "transient key '{key}' is also a mapped field"
                )));
            }
        }

        Ok(FieldMappingTable::assemble(self.entries, self.transient))
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| TransformError::Configuration {
        message: format!("invalid key pattern '{pattern}'"),
        source: Some(e.into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_table_is_valid() {
        let table = FieldMappingTable::booking_builder().build().unwrap();
        assert_eq!(table.len(), BOOKING_FIELDS.len());
    }

    #[test]
    fn test_lookup() {
        let table = FieldMappingTable::booking();
        assert_eq!(table.lookup("firstName"), Some("customer_first_name"));
        assert_eq!(table.lookup("depositPaid"), Some("deposit_paid"));
        assert_eq!(table.lookup("misspeltField"), None);
    }

    #[test]
    fn test_reverse_lookup() {
        let table = FieldMappingTable::booking();
        assert_eq!(table.reverse_lookup("customer_first_name"), Some("firstName"));
        assert_eq!(table.reverse_lookup("no_such_column"), None);
    }

    #[test]
    fn test_every_group_is_covered() {
        let table = FieldMappingTable::booking();
        for group in FieldGroup::ALL {
            assert!(table.entries_in(group).next().is_some(), "group {group} has no entries");
        }
    }

    #[test]
    fn test_group_of() {
        let table = FieldMappingTable::booking();
        assert_eq!(table.group_of("totalPrice"), Some(FieldGroup::Financial));
        assert_eq!(table.group_of("crewExperienceFile"), Some(FieldGroup::File));
        assert_eq!(table.group_of("isEditing"), None);
    }

    #[test]
    fn test_transient_keys() {
        let table = FieldMappingTable::booking();
        assert!(table.is_transient("isEditing"));
        assert!(!table.is_transient("firstName"));
        assert_eq!(
            table.transient_keys(),
            vec!["isDirty", "isEditing", "uploadProgress", "validationErrors"]
        );
    }

    #[test]
    fn test_aliasing_first_entry_wins_in_reverse() {
        let table = FieldMappingTable::builder()
            .field("phone", "customer_phone", FieldGroup::Customer)
            .field("mobile", "customer_phone", FieldGroup::Customer)
            .build()
            .unwrap();

        assert_eq!(table.lookup("mobile"), Some("customer_phone"));
        assert_eq!(table.reverse_lookup("customer_phone"), Some("phone"));
    }

    #[test]
    fn test_rejects_duplicate_app_key() {
        let err = FieldMappingTable::builder()
            .field("notes", "notes", FieldGroup::Notes)
            .field("notes", "booking_notes", FieldGroup::Notes)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("mapped more than once"));
    }

    #[test]
    fn test_rejects_bad_key_case() {
        let err = FieldMappingTable::builder()
            .field("first_name", "customer_first_name", FieldGroup::Customer)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not camelCase"));

        let err = FieldMappingTable::builder()
            .field("firstName", "customerFirstName", FieldGroup::Customer)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not snake_case"));
    }

    #[test]
    fn test_rejects_mapped_transient_key() {
        let err = FieldMappingTable::builder()
            .field("notes", "notes", FieldGroup::Notes)
            .transient("notes")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("also a mapped field"));
    }

    #[test]
    fn test_group_from_str() {
        assert_eq!("booking_detail".parse::<FieldGroup>().unwrap(), FieldGroup::BookingDetail);
        assert!("bogus".parse::<FieldGroup>().is_err());
    }
}
