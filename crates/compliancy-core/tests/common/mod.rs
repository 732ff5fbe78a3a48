//! Stub DevOps lookups and rules shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use compliancy_core::domain::{
    DefinitionReference, ProjectReference, ReleaseEnvironment,
};
use compliancy_core::{
    Build, BuildDefinition, BuildPipelineRule, BuildProcess, ClassicReleasePipelineRule,
    DevOpsClient, LinkedResources, PipelineKind, PipelineRegistration, Project, ProjectRule,
    Release, ReleaseDefinition, Repository, RepositoryRule, ResolvedPipeline, Rule,
    SourceError, SourceResult, YamlReleasePipelineRule,
};

pub const ORG: &str = "contoso";
pub const PROJECT_ID: &str = "p-1";
pub const PROJECT_NAME: &str = "Payments";

// ---------------------------------------------------------------------------
// DevOps lookups
// ---------------------------------------------------------------------------

/// What the stub answers for the run's YAML.
#[derive(Debug, Clone)]
pub enum YamlResponse {
    Yaml(String),
    BadRequest(Option<String>),
    Unavailable,
}

#[derive(Debug)]
pub struct StubDevOps {
    projects: Vec<Project>,
    releases: HashMap<String, Release>,
    release_definitions: HashMap<(i64, Option<i32>), ReleaseDefinition>,
    builds: HashMap<String, Build>,
    build_definitions: HashMap<(i64, Option<i32>), BuildDefinition>,
    yaml: YamlResponse,
    calls: Mutex<Vec<String>>,
}

impl Default for StubDevOps {
    fn default() -> Self {
        Self {
            projects: vec![Project {
                id: PROJECT_ID.to_string(),
                name: PROJECT_NAME.to_string(),
            }],
            releases: HashMap::new(),
            release_definitions: HashMap::new(),
            builds: HashMap::new(),
            build_definitions: HashMap::new(),
            yaml: YamlResponse::Unavailable,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl StubDevOps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(mut self, id: &str, name: &str) -> Self {
        self.projects.push(Project {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_release(mut self, release: Release) -> Self {
        self.releases.insert(release.id.to_string(), release);
        self
    }

    pub fn with_release_definition(
        mut self,
        revision: Option<i32>,
        definition: ReleaseDefinition,
    ) -> Self {
        self.release_definitions
            .insert((definition.id, revision), definition);
        self
    }

    pub fn with_build(mut self, build: Build) -> Self {
        self.builds.insert(build.id.to_string(), build);
        self
    }

    pub fn with_build_definition(
        mut self,
        revision: Option<i32>,
        definition: BuildDefinition,
    ) -> Self {
        self.build_definitions
            .insert((definition.id, revision), definition);
        self
    }

    pub fn with_yaml(mut self, yaml: YamlResponse) -> Self {
        self.yaml = yaml;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DevOpsClient for StubDevOps {
    async fn project(&self, _organization: &str, project: &str) -> SourceResult<Option<Project>> {
        self.record(format!("project:{project}"));
        Ok(self
            .projects
            .iter()
            .find(|p| p.id == project || p.name.eq_ignore_ascii_case(project))
            .cloned())
    }

    async fn release(
        &self,
        _organization: &str,
        _project_id: &str,
        release_id: &str,
    ) -> SourceResult<Option<Release>> {
        self.record(format!("release:{release_id}"));
        Ok(self.releases.get(release_id).cloned())
    }

    async fn release_definition(
        &self,
        _organization: &str,
        _project_id: &str,
        definition_id: i64,
        revision: Option<i32>,
    ) -> SourceResult<Option<ReleaseDefinition>> {
        self.record(format!("release_definition:{definition_id}:{revision:?}"));
        Ok(self
            .release_definitions
            .get(&(definition_id, revision))
            .cloned())
    }

    async fn build(
        &self,
        _organization: &str,
        _project_id: &str,
        build_id: &str,
    ) -> SourceResult<Option<Build>> {
        self.record(format!("build:{build_id}"));
        Ok(self.builds.get(build_id).cloned())
    }

    async fn build_definition(
        &self,
        _organization: &str,
        _project_id: &str,
        definition_id: i64,
        revision: Option<i32>,
    ) -> SourceResult<Option<BuildDefinition>> {
        self.record(format!("build_definition:{definition_id}:{revision:?}"));
        Ok(self
            .build_definitions
            .get(&(definition_id, revision))
            .cloned())
    }

    async fn yaml_used_in_run(
        &self,
        _organization: &str,
        _project_id: &str,
        build: &Build,
    ) -> SourceResult<String> {
        self.record(format!("yaml:{}", build.id));
        match &self.yaml {
            YamlResponse::Yaml(yaml) => Ok(yaml.clone()),
            YamlResponse::BadRequest(message) => Err(SourceError::BadRequest {
                message: message.clone(),
            }),
            YamlResponse::Unavailable => Err(SourceError::Http {
                status: 503,
                url: "https://dev.azure.com/contoso/_apis/pipelines".to_string(),
            }),
        }
    }
}

/// Fixed linked build pipelines and repositories.
#[derive(Debug, Default)]
pub struct StubLinked {
    pub builds: Vec<BuildDefinition>,
    pub repositories: Vec<Repository>,
}

#[async_trait]
impl LinkedResources for StubLinked {
    async fn linked_build_pipelines(
        &self,
        _organization: &str,
        _pipeline: &ResolvedPipeline,
        _project_id: &str,
    ) -> SourceResult<Vec<BuildDefinition>> {
        Ok(self.builds.clone())
    }

    async fn linked_repositories(
        &self,
        _organization: &str,
        _pipelines: &[ResolvedPipeline],
        _linked_build_pipelines: &[BuildDefinition],
    ) -> SourceResult<Vec<Repository>> {
        Ok(self.repositories.clone())
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Rule usable in every family. Items listed in `failing` are non-compliant.
#[derive(Debug)]
pub struct StubRule {
    name: String,
    description: String,
    family: String,
    failing: HashSet<String>,
    broken: bool,
    invocations: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<(String, String)>>>,
}

impl StubRule {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            family: name.to_string(),
            failing: HashSet::new(),
            broken: false,
            invocations: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn in_family(mut self, family: &str) -> Self {
        self.family = family.to_string();
        self
    }

    pub fn failing_for(mut self, item_id: &str) -> Self {
        self.failing.insert(item_id.to_string());
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    /// Shared invocation counter; keep a handle before moving the rule into a set.
    pub fn invocations(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.invocations)
    }

    /// `(item id, project id)` pairs the rule was evaluated with.
    pub fn seen(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        Arc::clone(&self.seen)
    }

    fn verdict(&self, item_id: &str, project_id: &str) -> anyhow::Result<bool> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((item_id.to_string(), project_id.to_string()));
        if self.broken {
            anyhow::bail!("policy endpoint returned garbage");
        }
        Ok(!self.failing.contains(item_id))
    }
}

impl Rule for StubRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn family(&self) -> &str {
        &self.family
    }
}

#[async_trait]
impl ProjectRule for StubRule {
    async fn evaluate(&self, _organization: &str, project_id: &str) -> anyhow::Result<bool> {
        self.verdict(project_id, project_id)
    }
}

#[async_trait]
impl ClassicReleasePipelineRule for StubRule {
    async fn evaluate(
        &self,
        _organization: &str,
        project_id: &str,
        pipeline: &ReleaseDefinition,
    ) -> anyhow::Result<bool> {
        self.verdict(&pipeline.id.to_string(), project_id)
    }
}

#[async_trait]
impl BuildPipelineRule for StubRule {
    async fn evaluate(
        &self,
        _organization: &str,
        project_id: &str,
        pipeline: &BuildDefinition,
    ) -> anyhow::Result<bool> {
        self.verdict(&pipeline.id.to_string(), project_id)
    }
}

#[async_trait]
impl YamlReleasePipelineRule for StubRule {
    async fn evaluate(
        &self,
        _organization: &str,
        project_id: &str,
        pipeline: &BuildDefinition,
    ) -> anyhow::Result<bool> {
        self.verdict(&pipeline.id.to_string(), project_id)
    }
}

#[async_trait]
impl RepositoryRule for StubRule {
    async fn evaluate(
        &self,
        _organization: &str,
        project_id: &str,
        repository: &Repository,
    ) -> anyhow::Result<bool> {
        self.verdict(&repository.id, project_id)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn release_definition(id: i64, name: &str, environments: &[(i64, &str)]) -> ReleaseDefinition {
    ReleaseDefinition {
        id,
        name: name.to_string(),
        revision: None,
        environments: environments
            .iter()
            .map(|(id, name)| ReleaseEnvironment {
                id: *id,
                name: name.to_string(),
            })
            .collect(),
        artifacts: Vec::new(),
    }
}

pub fn release(id: i64, definition_id: i64, revision: Option<i32>) -> Release {
    Release {
        id,
        release_definition: Some(DefinitionReference {
            id: definition_id,
            name: None,
            revision: None,
        }),
        release_definition_revision: revision,
    }
}

pub fn build_definition(id: i64, name: &str, process: BuildProcess) -> BuildDefinition {
    BuildDefinition {
        id,
        name: name.to_string(),
        revision: Some(1),
        process,
        repository: None,
        project: Some(ProjectReference {
            id: Some(PROJECT_ID.to_string()),
            name: Some(PROJECT_NAME.to_string()),
        }),
    }
}

pub fn build(id: i64, definition_id: i64, revision: Option<i32>) -> Build {
    Build {
        id,
        definition: Some(DefinitionReference {
            id: definition_id,
            name: None,
            revision,
        }),
        project: Some(ProjectReference {
            id: Some(PROJECT_ID.to_string()),
            name: Some(PROJECT_NAME.to_string()),
        }),
        source_branch: Some("refs/heads/main".to_string()),
        source_version: None,
    }
}

pub fn repository(id: &str, name: &str, project: Option<ProjectReference>) -> Repository {
    Repository {
        id: id.to_string(),
        name: name.to_string(),
        project,
        url: None,
        default_branch: Some("refs/heads/main".to_string()),
    }
}

pub fn registration(
    kind: PipelineKind,
    pipeline_id: &str,
    stage_id: &str,
    ci_identifier: &str,
) -> PipelineRegistration {
    PipelineRegistration {
        pipeline_id: pipeline_id.to_string(),
        pipeline_type: kind,
        stage_id: stage_id.to_string(),
        ci_identifier: ci_identifier.to_string(),
        is_production: true,
        rule_profile_name: None,
        is_sox: false,
    }
}
