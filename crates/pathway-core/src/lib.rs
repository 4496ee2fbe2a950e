// Pathways Core - Declarative multi-step data-entry workflows
//
// A pathway is an ordered list of form steps, each usually bound to a record
// type of the clinical records system. This crate provides the definitions,
// the registry the hosting application fills at startup, serialization for
// the front end, and the save flow that hands payloads to a record store.

pub mod config;
pub mod definition;
pub mod discovery;
pub mod error;
pub mod field;
pub mod model;
pub mod pathway;
pub mod records;
pub mod registry;
pub mod resource;
pub mod routes;
pub mod site;
pub mod slug;
pub mod step;

pub use config::{PathwaysConfig, PathwaysConfigSpec, StoreConfig};
pub use definition::{PathwayResource, PathwaySpec, StepSpec};
pub use discovery::{DiscoverySummary, PathwayPlugin};
pub use error::{PathwayError, PathwayResult};
pub use field::{resolve_field, StepField};
pub use model::{ModelCatalog, RecordModel, RecordModelResource, RecordScope};
pub use pathway::{Pathway, PathwayDefinition, PathwayVariant, RedirectPolicy};
pub use records::{
    Episode, EpisodeId, Patient, PatientId, RecordStore, SavePayload, User,
};
pub use registry::PathwayRegistry;
pub use routes::RouteTable;
pub use site::{PathwaySite, PathwaySiteBuilder};
pub use slug::slugify;
pub use step::{MultiSaveStep, PathwayStep, Step, StepEntry};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
