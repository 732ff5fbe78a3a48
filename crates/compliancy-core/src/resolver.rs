//! Run enrichment.
//!
//! Turns a [`RunRequest`] into a [`RunContext`]: the run's pipeline
//! definition, its stages and, for build/YAML runs, the pipeline's
//! classification. Only outbound reads happen here.

use std::sync::Arc;

use compliancy_state::{ClassificationSnapshotStore, PipelineKind};
use tracing::{debug, instrument};

use crate::cancel::CancelSignal;
use crate::classifier::{classify_from_snapshot, classify_structure, parse_stage_names};
use crate::config::GateConfig;
use crate::domain::{
    Build, BuildDefinition, PipelineClassification, ReleaseDefinition, ResolvedPipeline,
    RunContext, RunRequest, StageDescriptor,
};
use crate::error::{GateError, GateResult, SourceError};
use crate::obs;
use crate::source::DevOpsClient;

/// Resolves run references against the DevOps lookups and snapshot store.
#[derive(Clone)]
pub struct RunResolver {
    client: Arc<dyn DevOpsClient>,
    snapshots: Arc<dyn ClassificationSnapshotStore>,
    config: Arc<GateConfig>,
}

/// Stages and classification derived from a build run's YAML.
struct YamlOutcome {
    stages: Vec<StageDescriptor>,
    classification: PipelineClassification,
    error_message: Option<String>,
}

impl RunResolver {
    pub fn new(
        client: Arc<dyn DevOpsClient>,
        snapshots: Arc<dyn ClassificationSnapshotStore>,
        config: Arc<GateConfig>,
    ) -> Self {
        Self {
            client,
            snapshots,
            config,
        }
    }

    /// Enrich `request` into a full run context.
    #[instrument(
        skip_all,
        fields(
            organization = %request.organization,
            project_id = %request.project_id,
            run_id = %request.run_id
        )
    )]
    pub async fn resolve(&self, request: &RunRequest) -> GateResult<RunContext> {
        let ctx = match self.config.pipeline_kind(&request.pipeline_type) {
            PipelineKind::Release => self.resolve_release(request).await?,
            PipelineKind::Build => self.resolve_build(request).await?,
        };
        obs::emit_run_resolved(&ctx);
        Ok(ctx)
    }

    /// [`resolve`](Self::resolve), abandoned with [`GateError::Cancelled`]
    /// as soon as `cancel` fires.
    pub async fn resolve_with_cancel(
        &self,
        request: &RunRequest,
        cancel: &CancelSignal,
    ) -> GateResult<RunContext> {
        cancel.guard(self.resolve(request)).await
    }

    async fn resolve_release(&self, request: &RunRequest) -> GateResult<RunContext> {
        let organization = &request.organization;
        let project = self
            .client
            .project(organization, &request.project_id)
            .await?
            .ok_or_else(|| GateError::ProjectNotAvailable {
                organization: organization.clone(),
                project: request.project_id.clone(),
            })?;

        let release = self
            .client
            .release(organization, &request.project_id, &request.run_id)
            .await?
            .ok_or_else(|| GateError::RunNotAvailable {
                run_id: request.run_id.clone(),
            })?;
        let definition_ref = release.release_definition.as_ref().ok_or_else(|| {
            GateError::RunNotAvailable {
                run_id: request.run_id.clone(),
            }
        })?;

        let definition = self
            .release_definition_with_fallback(
                organization,
                &request.project_id,
                definition_ref.id,
                release.release_definition_revision,
            )
            .await?;

        let stages = definition
            .environments
            .iter()
            .map(|env| StageDescriptor::new(env.id.to_string(), env.name.clone()))
            .collect();

        Ok(RunContext {
            organization: organization.clone(),
            project_id: request.project_id.clone(),
            project_name: project.name,
            run_id: request.run_id.clone(),
            stage_id: request.stage_id.clone(),
            pipeline: ResolvedPipeline::Release(definition),
            stages,
            classification: None,
            error_message: None,
        })
    }

    /// Fetch the definition at the release's revision, falling back to the
    /// latest revision when that one has been pruned.
    async fn release_definition_with_fallback(
        &self,
        organization: &str,
        project_id: &str,
        definition_id: i64,
        revision: Option<i32>,
    ) -> GateResult<ReleaseDefinition> {
        let at_revision = self
            .client
            .release_definition(organization, project_id, definition_id, revision)
            .await?;

        let definition = match (at_revision, revision) {
            (Some(definition), _) => Some(definition),
            (None, Some(pruned)) => {
                obs::emit_revision_fallback(definition_id, pruned);
                self.client
                    .release_definition(organization, project_id, definition_id, None)
                    .await?
            }
            (None, None) => None,
        };

        definition.ok_or(GateError::DefinitionNotAvailable {
            kind: PipelineKind::Release,
            definition_id,
        })
    }

    async fn resolve_build(&self, request: &RunRequest) -> GateResult<RunContext> {
        let organization = &request.organization;
        let build = self
            .client
            .build(organization, &request.project_id, &request.run_id)
            .await?
            .ok_or_else(|| GateError::BuildNotAvailable {
                run_id: request.run_id.clone(),
            })?;
        let definition_ref = build
            .definition
            .as_ref()
            .ok_or_else(|| GateError::BuildNotAvailable {
                run_id: request.run_id.clone(),
            })?;

        let definition = self
            .client
            .build_definition(
                organization,
                &request.project_id,
                definition_ref.id,
                definition_ref.revision,
            )
            .await?
            .ok_or(GateError::DefinitionNotAvailable {
                kind: PipelineKind::Build,
                definition_id: definition_ref.id,
            })?;

        let project_name = self.build_project_name(request, &build).await?;
        let outcome = self
            .resolve_yaml(request, &build, &definition, &project_name)
            .await?;

        Ok(RunContext {
            organization: organization.clone(),
            project_id: request.project_id.clone(),
            project_name,
            run_id: request.run_id.clone(),
            stage_id: request.stage_id.clone(),
            pipeline: ResolvedPipeline::Build(definition),
            stages: outcome.stages,
            classification: Some(outcome.classification),
            error_message: outcome.error_message,
        })
    }

    /// Project name from the build payload, looked up when absent.
    async fn build_project_name(&self, request: &RunRequest, build: &Build) -> GateResult<String> {
        if let Some(name) = build.project.as_ref().and_then(|p| p.name.clone()) {
            return Ok(name);
        }
        let project = self
            .client
            .project(&request.organization, &request.project_id)
            .await?
            .ok_or_else(|| GateError::ProjectNotAvailable {
                organization: request.organization.clone(),
                project: request.project_id.clone(),
            })?;
        Ok(project.name)
    }

    async fn resolve_yaml(
        &self,
        request: &RunRequest,
        build: &Build,
        definition: &BuildDefinition,
        project_name: &str,
    ) -> GateResult<YamlOutcome> {
        let yaml = match self
            .client
            .yaml_used_in_run(&request.organization, &request.project_id, build)
            .await
        {
            Ok(yaml) => yaml,
            Err(SourceError::BadRequest { message }) => {
                obs::emit_yaml_recovered(&request.run_id, message.as_deref());
                return Ok(invalid_yaml(message));
            }
            Err(e) => return Err(e.into()),
        };

        let stage_names = match parse_stage_names(&yaml) {
            Ok(names) => names,
            Err(e) => {
                let message = e.to_string();
                obs::emit_yaml_recovered(&request.run_id, Some(&message));
                return Ok(invalid_yaml(Some(message)));
            }
        };
        debug!(stages = ?stage_names, "parsed stages from run yaml");

        let classification = match classify_structure(
            &definition.process,
            &stage_names,
            &self.config.default_stage_name,
        ) {
            Some(classification) => classification,
            None => {
                let key = self.config.snapshot_key(&request.organization, project_name);
                let snapshot = self.snapshots.download(&key).await?;
                classify_from_snapshot(&definition.id.to_string(), project_name, snapshot.as_ref())?
            }
        };

        Ok(YamlOutcome {
            stages: stage_names
                .into_iter()
                .map(|name| StageDescriptor::new(name.clone(), name))
                .collect(),
            classification,
            error_message: None,
        })
    }
}

fn invalid_yaml(message: Option<String>) -> YamlOutcome {
    YamlOutcome {
        stages: Vec::new(),
        classification: PipelineClassification::InvalidYamlPipeline,
        error_message: message,
    }
}
