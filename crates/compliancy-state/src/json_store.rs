//! JSON-file-backed store for offline gate runs.
//!
//! Layout of the document:
//!
//! ```json
//! {
//!   "projects": [
//!     {
//!       "organization": "contoso",
//!       "projectId": "p-1",
//!       "projectName": "Payments",
//!       "registrations": [ ... ],
//!       "deviations": [ ... ],
//!       "classification": { "buildPipelines": [ ... ] }
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::records::{ClassificationSnapshot, Deviation, PipelineRegistration, SnapshotKey};
use crate::storage_traits::*;

/// One project's worth of stored compliancy state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    pub organization: String,
    pub project_id: String,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub registrations: Vec<PipelineRegistration>,
    #[serde(default)]
    pub deviations: Option<Vec<Deviation>>,
    #[serde(default)]
    pub classification: Option<ClassificationSnapshot>,
}

/// Root of the store document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
}

/// Read-only store over a [`StoreDocument`] loaded from disk.
#[derive(Debug, Clone, Default)]
pub struct JsonFileStore {
    document: StoreDocument,
}

impl JsonFileStore {
    /// Load the document at `path`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let document: StoreDocument = serde_json::from_str(&raw)?;
        debug!(
            path = %path.display(),
            projects = document.projects.len(),
            "loaded compliancy store"
        );
        Ok(Self { document })
    }

    pub fn from_document(document: StoreDocument) -> Self {
        Self { document }
    }

    fn by_project_id(&self, organization: &str, project_id: &str) -> Option<&ProjectEntry> {
        self.document
            .projects
            .iter()
            .find(|p| p.organization == organization && p.project_id == project_id)
    }

    fn by_project_name(&self, organization: &str, project_name: &str) -> Option<&ProjectEntry> {
        self.document.projects.iter().find(|p| {
            p.organization == organization
                && p.project_name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(project_name))
        })
    }
}

#[async_trait]
impl RegistrationRepository for JsonFileStore {
    async fn registrations(
        &self,
        organization: &str,
        project_id: &str,
    ) -> StorageResult<Vec<PipelineRegistration>> {
        Ok(self
            .by_project_id(organization, project_id)
            .map(|p| p.registrations.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl DeviationRepository for JsonFileStore {
    async fn deviations(
        &self,
        organization: &str,
        project_id: &str,
    ) -> StorageResult<Option<Vec<Deviation>>> {
        Ok(self
            .by_project_id(organization, project_id)
            .and_then(|p| p.deviations.clone()))
    }
}

#[async_trait]
impl ClassificationSnapshotStore for JsonFileStore {
    async fn download(&self, key: &SnapshotKey) -> StorageResult<Option<ClassificationSnapshot>> {
        Ok(self
            .by_project_name(&key.organization, &key.project_name)
            .and_then(|p| p.classification.clone()))
    }
}
