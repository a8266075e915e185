//! Field mapping rules
//!
//! The static knowledge the engine works from: the rename table, the compound
//! decomposers and the status block rule.

pub mod compound;
pub mod status;
pub mod table;

pub use compound::{CompoundFieldRule, CompoundRegistry, CompoundShape, Recomposed};
pub use status::{RebuiltStatus, StatusBlockRule, StatusEntry, STATUS_KEY};
pub use table::{FieldGroup, FieldMapping, FieldMappingTable, FieldMappingTableBuilder};
