//! Rowmap Core - bidirectional mapping between booking records and storage rows
//!
//! The form layer works with nested, camelCase booking records that carry
//! uploaded-file metadata and a status sub-document. The storage backend only
//! accepts flat rows of scalar, snake_case columns. This crate translates
//! between the two and refuses to produce a row that the backend would reject.
//!
//! # Main Components
//!
//! - **Field Mapping Table**: key renames grouped by domain area
//! - **Compound Field Decomposers**: spread file metadata over scalar columns
//! - **Status Block Flattener**: lift status flags to top-level columns
//! - **Validation Guard**: the only constructor of a `PersistenceRecord`
//! - **Mapping Engine**: the forward and reverse transforms
//!
//! # Example
//!
//! ```
//! use rowmap_core::{from_persistence, to_persistence, ApplicationRecord};
//! use serde_json::json;
//!
//! fn example() -> rowmap_core::Result<()> {
//!     let record = ApplicationRecord::from_json(json!({
//!         "firstName": "John",
//!         "crewExperienceFile": {
//!             "name": "crew.pdf",
//!             "url": "https://x/crew.pdf",
//!             "size": 1024000
//!         },
//!         "status": {"depositPaid": true}
//!     }))?;
//!
//!     let row = to_persistence(&record)?;
//!     assert_eq!(row.to_json()["crew_experience_file_size"], 1024000);
//!
//!     let back = from_persistence(&row)?;
//!     assert_eq!(back, record);
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod guard;
pub mod mapping;
pub mod transform;
pub mod types;

// Re-export main types for convenience
pub use config::{EngineConfig, FieldEntry, PartialCompoundPolicy, UnknownFieldPolicy};
pub use error::{ErrorCode, Result, TransformError};
pub use mapping::{
    CompoundFieldRule, CompoundShape, FieldGroup, FieldMapping, FieldMappingTable, StatusBlockRule,
};
pub use transform::{Direction, MappingEngine, ReportCode, ReportItem, TransformReport};
pub use types::{
    ApplicationRecord, FieldValue, FileAttachment, PersistenceRecord, Scalar, StatusBlock,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Flatten a record with the shared booking engine
pub fn to_persistence(record: &ApplicationRecord) -> Result<PersistenceRecord> {
    MappingEngine::shared().to_persistence(record)
}

/// Rebuild a record with the shared booking engine
pub fn from_persistence(row: &PersistenceRecord) -> Result<ApplicationRecord> {
    MappingEngine::shared().from_persistence(row)
}
