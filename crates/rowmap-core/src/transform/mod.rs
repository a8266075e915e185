//! Forward and reverse transforms
//!
//! `MappingEngine` holds the mapping table and the rules derived from it and
//! runs both directions. It is immutable once built and holds no interior
//! state, so one instance can serve any number of threads.

mod forward;
mod report;
mod reverse;


pub use report::{Direction, ReportCode, ReportItem, TransformReport};

use crate::config::{EngineConfig, PartialCompoundPolicy, UnknownFieldPolicy};
use crate::error::{Result, TransformError};
use crate::mapping::{CompoundRegistry, FieldGroup, FieldMappingTable, StatusBlockRule, STATUS_KEY};
use crate::types::{ApplicationRecord, PersistenceRecord};
use report::ReportTracker;
use std::sync::OnceLock;
use tracing::{debug, instrument};

static SHARED: OnceLock<MappingEngine> = OnceLock::new();

/// Bidirectional mapping engine
#[derive(Debug, Clone)]
pub struct MappingEngine {
    table: FieldMappingTable,
    compounds: CompoundRegistry,
    status: StatusBlockRule,
    unknown_fields: UnknownFieldPolicy,
    partial_compounds: PartialCompoundPolicy,
}

impl MappingEngine {
    /// Build an engine from the booking table extended by `config`
    pub fn new(config: EngineConfig) -> Result<Self> {
        let mut builder = FieldMappingTable::booking_builder();
        for entry in config.extra_fields {
            builder = builder.field(entry.app_key, entry.column, entry.group);
        }
        for key in config.extra_transient_keys {
            builder = builder.transient(key);
        }

        let table = builder.build()?;
        Self::with_table(table, config.unknown_fields, config.partial_compounds)
    }

    /// Build an engine over an arbitrary table
    ///
    /// Fails when a plain column would overlap a decomposed compound column or
    /// when the status key is itself mapped.
    pub fn with_table(
        table: FieldMappingTable,
        unknown_fields: UnknownFieldPolicy,
        partial_compounds: PartialCompoundPolicy,
    ) -> Result<Self> {
        let compounds = CompoundRegistry::from_table(&table);

        if table.get(STATUS_KEY).is_some() || table.is_transient(STATUS_KEY) {
            return Err(TransformError::configuration(format!(
                "'{STATUS_KEY}' is reserved for the status block"
            )));
        }

        for entry in table.entries() {
            if let Some(rule) = compounds.owner_of(&entry.column) {
                return Err(TransformError::configuration(format!(
                    "column '{}' for '{}' overlaps a decomposed column of '{}'",
                    entry.column, entry.app_key, rule.key
                )));
            }
            if entry.group == FieldGroup::File {
                continue;
            }
            if let Some(rule) = compounds.by_prefix(&entry.column) {
                return Err(TransformError::configuration(format!(
                    "column '{}' for '{}' is the column prefix of '{}'",
                    entry.column, entry.app_key, rule.key
                )));
            }
        }

        let status = StatusBlockRule::from_table(&table);
        debug!(
            fields = table.len(),
            compounds = compounds.len(),
            status_members = status.members().count(),
            %unknown_fields,
            %partial_compounds,
            "Mapping engine built"
        );

        Ok(Self {
            table,
            compounds,
            status,
            unknown_fields,
            partial_compounds,
        })
    }

    /// The built-in booking engine with default policies
    pub fn booking() -> Self {
        let table = FieldMappingTable::booking();
        Self {
            compounds: CompoundRegistry::from_table(&table),
            status: StatusBlockRule::from_table(&table),
            table,
            unknown_fields: UnknownFieldPolicy::default(),
            partial_compounds: PartialCompoundPolicy::default(),
        }
    }

    /// Process-wide booking engine, built on first use
    pub fn shared() -> &'static MappingEngine {
        SHARED.get_or_init(Self::booking)
    }

    pub fn table(&self) -> &FieldMappingTable {
        &self.table
    }

    pub fn compounds(&self) -> &CompoundRegistry {
        &self.compounds
    }

    pub fn status_rule(&self) -> &StatusBlockRule {
        &self.status
    }

    pub fn unknown_fields(&self) -> UnknownFieldPolicy {
        self.unknown_fields
    }

    pub fn partial_compounds(&self) -> PartialCompoundPolicy {
        self.partial_compounds
    }

    /// Flatten an application record into a storage row
    ///
    /// Fails fast: no partial record is ever returned.
    #[instrument(level = "debug", skip_all, fields(keys = record.len()))]
    pub fn to_persistence(&self, record: &ApplicationRecord) -> Result<PersistenceRecord> {
        let mut tracker = ReportTracker::new();
        forward::run(self, record, &mut tracker)
    }

    /// Like `to_persistence`, also returning what was dropped or merged
    #[instrument(level = "debug", skip_all, fields(keys = record.len()))]
    pub fn to_persistence_with_report(
        &self,
        record: &ApplicationRecord,
    ) -> Result<(PersistenceRecord, TransformReport)> {
        let mut tracker = ReportTracker::new();
        let row = forward::run(self, record, &mut tracker)?;
        let report = tracker.finish(Direction::ToPersistence, record.len(), row.len());
        Ok((row, report))
    }

    /// Rebuild the nested application record from a storage row
    #[instrument(level = "debug", skip_all, fields(columns = row.len()))]
    pub fn from_persistence(&self, row: &PersistenceRecord) -> Result<ApplicationRecord> {
        let mut tracker = ReportTracker::new();
        reverse::run(self, row, &mut tracker)
    }

    /// Like `from_persistence`, also returning what was regrouped or omitted
    #[instrument(level = "debug", skip_all, fields(columns = row.len()))]
    pub fn from_persistence_with_report(
        &self,
        row: &PersistenceRecord,
    ) -> Result<(ApplicationRecord, TransformReport)> {
        let mut tracker = ReportTracker::new();
        let record = reverse::run(self, row, &mut tracker)?;
        let report = tracker.finish(Direction::FromPersistence, row.len(), record.len());
        Ok((record, report))
    }
}

impl Default for MappingEngine {
    fn default() -> Self {
        Self::booking()
    }
}
