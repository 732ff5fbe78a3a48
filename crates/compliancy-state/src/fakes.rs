//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryRegistrationRepository`, `MemoryDeviationRepository` and
//! `MemorySnapshotStore` that satisfy the trait contracts without any
//! external dependencies.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::records::{ClassificationSnapshot, Deviation, PipelineRegistration, SnapshotKey};
use crate::storage_traits::*;

fn project_key(organization: &str, project: &str) -> (String, String) {
    (organization.to_string(), project.to_string())
}

// ---------------------------------------------------------------------------
// MemoryRegistrationRepository
// ---------------------------------------------------------------------------

/// In-memory registration store keyed by `(organization, project id)`.
#[derive(Debug, Default)]
pub struct MemoryRegistrationRepository {
    store: Mutex<HashMap<(String, String), Vec<PipelineRegistration>>>,
}

impl MemoryRegistrationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, organization: &str, project_id: &str, registration: PipelineRegistration) {
        let mut store = self.store.lock().unwrap();
        store
            .entry(project_key(organization, project_id))
            .or_default()
            .push(registration);
    }
}

#[async_trait]
impl RegistrationRepository for MemoryRegistrationRepository {
    async fn registrations(
        &self,
        organization: &str,
        project_id: &str,
    ) -> StorageResult<Vec<PipelineRegistration>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .get(&project_key(organization, project_id))
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MemoryDeviationRepository
// ---------------------------------------------------------------------------

/// In-memory deviation store that counts reads, so callers can assert the
/// list is fetched once per evaluation.
#[derive(Debug, Default)]
pub struct MemoryDeviationRepository {
    store: Mutex<HashMap<(String, String), Vec<Deviation>>>,
    reads: AtomicUsize,
}

impl MemoryDeviationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, organization: &str, project_id: &str, deviation: Deviation) {
        let mut store = self.store.lock().unwrap();
        store
            .entry(project_key(organization, project_id))
            .or_default()
            .push(deviation);
    }

    /// Number of `deviations` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviationRepository for MemoryDeviationRepository {
    async fn deviations(
        &self,
        organization: &str,
        project_id: &str,
    ) -> StorageResult<Option<Vec<Deviation>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let store = self.store.lock().unwrap();
        Ok(store.get(&project_key(organization, project_id)).cloned())
    }
}

// ---------------------------------------------------------------------------
// MemorySnapshotStore
// ---------------------------------------------------------------------------

/// In-memory classification snapshots keyed by `(organization, project name)`.
///
/// Publisher, collection and extension name are ignored.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    store: Mutex<HashMap<(String, String), ClassificationSnapshot>>,
    reads: AtomicUsize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, organization: &str, project_name: &str, snapshot: ClassificationSnapshot) {
        let mut store = self.store.lock().unwrap();
        store.insert(project_key(organization, project_name), snapshot);
    }

    /// Number of `download` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClassificationSnapshotStore for MemorySnapshotStore {
    async fn download(&self, key: &SnapshotKey) -> StorageResult<Option<ClassificationSnapshot>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let store = self.store.lock().unwrap();
        Ok(store
            .get(&project_key(&key.organization, &key.project_name))
            .cloned())
    }
}
