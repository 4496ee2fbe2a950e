//! Pathway Records - Record stores for pathway saves
//!
//! Implementations of [`pathway_core::RecordStore`] used by tests, demos and
//! the `pathwayctl` CLI. Both share the same bulk-update semantics:
//!
//! - an unsaved patient is created and given the next id
//! - patient-scoped models attach to the patient, everything else to the
//!   patient's latest episode (opened on demand)
//! - records with an `id` update that record, records without one are created,
//!   except singleton models which update their existing record
//! - every written record is stamped with `updated` and `updated_by`
//!
//! ## Backends
//!
//! - **InMemoryRecordStore**: ephemeral, cleared when dropped
//! - **FileRecordStore**: JSON file rewritten after every save
//!
//! ```rust,no_run
//! use pathway_records::{FileRecordStore, StoreOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileRecordStore::open("./records.json", StoreOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;

pub use backend::file::FileRecordStore;
pub use backend::memory::InMemoryRecordStore;
pub use backend::{EpisodeRecords, PatientRecords, RecordState, StoreOptions};

pub use pathway_core::{Episode, Patient, RecordStore, User};
