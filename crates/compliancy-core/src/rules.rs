//! Rule capability interfaces, one per resource category.
//!
//! Concrete rules live outside this crate. They are injected as a
//! [`RuleSet`] and narrowed to the active [`RuleProfile`] before evaluation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{BuildDefinition, ReleaseDefinition, Repository};
use crate::profile::RuleProfile;

/// Identity shared by every rule.
pub trait Rule: Send + Sync {
    /// Stable rule name, matched against deviations.
    fn name(&self) -> &str;

    /// Human-readable description, reported in findings.
    fn description(&self) -> &str;

    /// Family this rule is a variant of. Defaults to the rule's own name,
    /// which makes it the family's baseline variant.
    fn family(&self) -> &str {
        self.name()
    }
}

/// Rule evaluated once against the run's project.
#[async_trait]
pub trait ProjectRule: Rule {
    async fn evaluate(&self, organization: &str, project_id: &str) -> anyhow::Result<bool>;
}

/// Rule evaluated against a classic release definition.
#[async_trait]
pub trait ClassicReleasePipelineRule: Rule {
    async fn evaluate(
        &self,
        organization: &str,
        project_id: &str,
        pipeline: &ReleaseDefinition,
    ) -> anyhow::Result<bool>;
}

/// Rule evaluated against every linked build pipeline.
#[async_trait]
pub trait BuildPipelineRule: Rule {
    async fn evaluate(
        &self,
        organization: &str,
        project_id: &str,
        pipeline: &BuildDefinition,
    ) -> anyhow::Result<bool>;
}

/// Rule evaluated against a YAML pipeline acting as a release pipeline.
#[async_trait]
pub trait YamlReleasePipelineRule: Rule {
    async fn evaluate(
        &self,
        organization: &str,
        project_id: &str,
        pipeline: &BuildDefinition,
    ) -> anyhow::Result<bool>;
}

/// Rule evaluated against every linked repository.
#[async_trait]
pub trait RepositoryRule: Rule {
    async fn evaluate(
        &self,
        organization: &str,
        project_id: &str,
        repository: &Repository,
    ) -> anyhow::Result<bool>;
}

/// All injected rules, grouped by family.
#[derive(Clone, Default)]
pub struct RuleSet {
    pub project: Option<Arc<dyn ProjectRule>>,
    pub classic_release: Vec<Arc<dyn ClassicReleasePipelineRule>>,
    pub build: Vec<Arc<dyn BuildPipelineRule>>,
    pub yaml_release: Vec<Arc<dyn YamlReleasePipelineRule>>,
    pub repository: Vec<Arc<dyn RepositoryRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_rule(mut self, rule: Arc<dyn ProjectRule>) -> Self {
        self.project = Some(rule);
        self
    }

    pub fn with_classic_release_rule(mut self, rule: Arc<dyn ClassicReleasePipelineRule>) -> Self {
        self.classic_release.push(rule);
        self
    }

    pub fn with_build_rule(mut self, rule: Arc<dyn BuildPipelineRule>) -> Self {
        self.build.push(rule);
        self
    }

    pub fn with_yaml_release_rule(mut self, rule: Arc<dyn YamlReleasePipelineRule>) -> Self {
        self.yaml_release.push(rule);
        self
    }

    pub fn with_repository_rule(mut self, rule: Arc<dyn RepositoryRule>) -> Self {
        self.repository.push(rule);
        self
    }

    /// The subset of rules the profile selects.
    pub fn for_profile(&self, profile: &RuleProfile) -> RuleSet {
        RuleSet {
            project: self
                .project
                .as_ref()
                .filter(|r| profile.selects(r.family(), r.name()))
                .cloned(),
            classic_release: select(&self.classic_release, profile),
            build: select(&self.build, profile),
            yaml_release: select(&self.yaml_release, profile),
            repository: select(&self.repository, profile),
        }
    }

    /// Total number of rules across all families.
    pub fn len(&self) -> usize {
        usize::from(self.project.is_some())
            + self.classic_release.len()
            + self.build.len()
            + self.yaml_release.len()
            + self.repository.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn select<R: Rule + ?Sized>(rules: &[Arc<R>], profile: &RuleProfile) -> Vec<Arc<R>> {
    rules
        .iter()
        .filter(|r| profile.selects(r.family(), r.name()))
        .cloned()
        .collect()
}
