//! Injectable DevOps lookups.
//!
//! Implement these traits to plug in the real REST API (see the
//! `compliancy-azdo` crate) or test stubs. Lookups return `Ok(None)` when the
//! requested object does not exist; retries and timeouts belong to the
//! implementation, never to the engine.

use async_trait::async_trait;

use crate::domain::{
    Build, BuildDefinition, Project, Release, ReleaseDefinition, Repository, ResolvedPipeline,
};
use crate::error::SourceResult;

/// Project, release and build lookups.
#[async_trait]
pub trait DevOpsClient: Send + Sync {
    /// Look a project up by id or by name.
    async fn project(&self, organization: &str, project: &str) -> SourceResult<Option<Project>>;

    async fn release(
        &self,
        organization: &str,
        project_id: &str,
        release_id: &str,
    ) -> SourceResult<Option<Release>>;

    /// `revision: None` fetches the latest revision.
    async fn release_definition(
        &self,
        organization: &str,
        project_id: &str,
        definition_id: i64,
        revision: Option<i32>,
    ) -> SourceResult<Option<ReleaseDefinition>>;

    async fn build(
        &self,
        organization: &str,
        project_id: &str,
        build_id: &str,
    ) -> SourceResult<Option<Build>>;

    /// `revision: None` fetches the latest revision.
    async fn build_definition(
        &self,
        organization: &str,
        project_id: &str,
        definition_id: i64,
        revision: Option<i32>,
    ) -> SourceResult<Option<BuildDefinition>>;

    /// Fully expanded YAML that was used for the given build run.
    ///
    /// Fails with [`SourceError::BadRequest`](crate::error::SourceError::BadRequest)
    /// when the service cannot compile the pipeline.
    async fn yaml_used_in_run(
        &self,
        organization: &str,
        project_id: &str,
        build: &Build,
    ) -> SourceResult<String>;
}

/// Resolves the build pipelines and repositories a pipeline depends on.
#[async_trait]
pub trait LinkedResources: Send + Sync {
    /// Build pipelines linked from a build pipeline (pipeline resources) or
    /// from a classic release (build artifacts).
    async fn linked_build_pipelines(
        &self,
        organization: &str,
        pipeline: &ResolvedPipeline,
        project_id: &str,
    ) -> SourceResult<Vec<BuildDefinition>>;

    /// Repositories used by `pipelines` and by their linked build pipelines.
    async fn linked_repositories(
        &self,
        organization: &str,
        pipelines: &[ResolvedPipeline],
        linked_build_pipelines: &[BuildDefinition],
    ) -> SourceResult<Vec<Repository>>;
}
