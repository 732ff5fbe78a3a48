//! Compliancy-State: external stores consumed by the compliancy gate
//!
//! The gate engine reads three kinds of state it never owns:
//!
//! - `PipelineRegistration`: which pipeline stages deploy to production, under
//!   which CI identifier and rule profile
//! - `Deviation`: approved exceptions that suppress a rule finding
//! - `ClassificationSnapshot`: pipeline classifications learned by the
//!   scanning batch
//!
//! ## Layer 0 - Data
//!
//! Everything here is a read-only snapshot for the duration of one gate
//! evaluation.

mod error;
pub mod fakes;
pub mod json_store;
mod records;
pub mod storage_traits;

pub use error::StorageError;
pub use json_store::{JsonFileStore, ProjectEntry, StoreDocument};
pub use records::{
    ClassificationSnapshot, ClassifiedPipeline, Deviation, PipelineKind, PipelineRegistration,
    SnapshotKey,
};
pub use storage_traits::{
    ClassificationSnapshotStore, DeviationRepository, RegistrationRepository, StorageResult,
};
