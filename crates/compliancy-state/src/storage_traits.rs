//! Storage trait definitions for the compliancy gate
//!
//! These traits define the read-only stores the gate engine consumes:
//! - `RegistrationRepository`: pipelines registered for compliance tracking
//! - `DeviationRepository`: approved rule exceptions
//! - `ClassificationSnapshotStore`: pipeline classifications from the scanning batch
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::records::{ClassificationSnapshot, Deviation, PipelineRegistration, SnapshotKey};

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Pipeline registrations keyed by `(organization, project id)`.
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// All registrations in the project. Empty when none exist.
    async fn registrations(
        &self,
        organization: &str,
        project_id: &str,
    ) -> StorageResult<Vec<PipelineRegistration>>;
}

/// Deviations keyed by `(organization, project id)`.
#[async_trait]
pub trait DeviationRepository: Send + Sync {
    /// All deviations recorded for the project, `None` when the project has
    /// never had any.
    async fn deviations(
        &self,
        organization: &str,
        project_id: &str,
    ) -> StorageResult<Option<Vec<Deviation>>>;
}

/// Extension-data blob store holding the classification snapshots.
#[async_trait]
pub trait ClassificationSnapshotStore: Send + Sync {
    /// Download the snapshot document, `None` if it does not exist.
    async fn download(&self, key: &SnapshotKey) -> StorageResult<Option<ClassificationSnapshot>>;
}
