//! Compliance evaluation of a production pipeline run.
//!
//! [`ComplianceEvaluator::evaluate_compliance`] gates the run on its
//! production stages, picks the rule profile, then evaluates each rule family
//! in turn:
//!
//! 1. project rule, once for the run's project
//! 2. classic release rules (classic runs) or YAML release rules (YAML runs)
//! 3. build pipeline rules, for every linked build pipeline
//! 4. repository rules, for every linked repository
//!
//! Within a family every `(resource, rule)` pair is an independent unit run
//! concurrently (bounded by `GateConfig::max_concurrency`); a family is fully
//! joined before the next one starts. Findings are then deduplicated by
//! [`report::aggregate`].

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;

use compliancy_state::{DeviationRepository, PipelineRegistration};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, instrument};

use crate::cancel::CancelSignal;
use crate::config::GateConfig;
use crate::deviation::DeviationMatcher;
use crate::domain::{
    BuildDefinition, ComplianceFinding, ReleaseDefinition, Repository, ResolvedPipeline,
    RunContext,
};
use crate::error::{GateError, GateResult};
use crate::obs;
use crate::production_gate::{is_production_run, registrations_for_run};
use crate::profile::ProfileCatalog;
use crate::report;
use crate::rules::RuleSet;
use crate::source::{DevOpsClient, LinkedResources};

/// The item a rule was evaluated against, as deviations address it.
#[derive(Debug, Clone)]
struct Item {
    id: String,
    name: String,
    /// Owning project; differs from the run's project for cross-project resources.
    project_id: String,
}

impl Item {
    fn build_pipeline(pipeline: &BuildDefinition, fallback_project: &str) -> Self {
        Self {
            id: pipeline.id.to_string(),
            name: pipeline.name.clone(),
            project_id: pipeline
                .project_id()
                .unwrap_or(fallback_project)
                .to_string(),
        }
    }
}

/// Read-only inputs shared by every unit of one evaluation.
struct Scope<'a> {
    ctx: &'a RunContext,
    rules: RuleSet,
    matcher: DeviationMatcher,
}

/// Evaluates the active rule set against a run and its linked resources.
pub struct ComplianceEvaluator {
    client: Arc<dyn DevOpsClient>,
    linked: Arc<dyn LinkedResources>,
    deviations: Arc<dyn DeviationRepository>,
    rules: RuleSet,
    profiles: ProfileCatalog,
    config: Arc<GateConfig>,
}

impl ComplianceEvaluator {
    pub fn new(
        client: Arc<dyn DevOpsClient>,
        linked: Arc<dyn LinkedResources>,
        deviations: Arc<dyn DeviationRepository>,
        rules: RuleSet,
        profiles: ProfileCatalog,
        config: Arc<GateConfig>,
    ) -> Self {
        Self {
            client,
            linked,
            deviations,
            rules,
            profiles,
            config,
        }
    }

    /// Evaluate the run against its registrations.
    ///
    /// Returns an empty report, without invoking any rule, when the run's
    /// stage is not a registered production stage of its pipeline.
    #[instrument(
        skip_all,
        fields(
            organization = %ctx.organization,
            project_id = %ctx.project_id,
            run_id = %ctx.run_id
        )
    )]
    pub async fn evaluate_compliance(
        &self,
        ctx: &RunContext,
        registrations: &[PipelineRegistration],
    ) -> GateResult<Vec<ComplianceFinding>> {
        let registrations = registrations_for_run(ctx, registrations);
        if !is_production_run(ctx, &registrations) {
            obs::emit_gate_skipped(&ctx.run_id, &ctx.stage_id);
            return Ok(Vec::new());
        }

        let profile = self.profiles.select(&registrations);
        let rules = self.rules.for_profile(profile);
        debug!(profile = %profile.name, rules = rules.len(), "selected rule profile");

        let deviations = self
            .deviations
            .deviations(&ctx.organization, &ctx.project_id)
            .await?
            .unwrap_or_default();
        let scope = Scope {
            ctx,
            rules,
            matcher: DeviationMatcher::new(deviations, &registrations),
        };

        let mut families = vec![self.evaluate_project(&scope).await?];
        match &ctx.pipeline {
            ResolvedPipeline::Release(definition) => {
                families.push(self.evaluate_classic_release(&scope, definition).await?);
            }
            ResolvedPipeline::Build(definition) => {
                families.push(self.evaluate_yaml_release(&scope, definition).await?);
            }
        }

        let linked_builds = self
            .linked
            .linked_build_pipelines(&ctx.organization, &ctx.pipeline, &ctx.project_id)
            .await?;
        families.push(self.evaluate_build_pipelines(&scope, &linked_builds).await?);

        let repositories = self
            .linked
            .linked_repositories(
                &ctx.organization,
                std::slice::from_ref(&ctx.pipeline),
                &linked_builds,
            )
            .await?;
        families.push(self.evaluate_repositories(&scope, &repositories).await?);

        let findings = report::aggregate(families);
        obs::emit_gate_evaluated(
            &ctx.run_id,
            &profile.name,
            findings.len(),
            findings.iter().filter(|f| f.is_blocking()).count(),
        );
        Ok(findings)
    }

    /// [`evaluate_compliance`](Self::evaluate_compliance), abandoned with
    /// [`GateError::Cancelled`] as soon as `cancel` fires.
    pub async fn evaluate_compliance_with_cancel(
        &self,
        ctx: &RunContext,
        registrations: &[PipelineRegistration],
        cancel: &CancelSignal,
    ) -> GateResult<Vec<ComplianceFinding>> {
        cancel
            .guard(self.evaluate_compliance(ctx, registrations))
            .await
    }

    async fn evaluate_project(&self, scope: &Scope<'_>) -> GateResult<Vec<ComplianceFinding>> {
        let Some(rule) = scope.rules.project.as_ref() else {
            return Ok(Vec::new());
        };
        let ctx = scope.ctx;
        let item = Item {
            id: ctx.project_id.clone(),
            name: ctx.project_name.clone(),
            project_id: ctx.project_id.clone(),
        };
        let finding = check(
            &scope.matcher,
            rule.name(),
            rule.description(),
            &item,
            rule.evaluate(&ctx.organization, &ctx.project_id),
        )
        .await?;
        Ok(vec![finding])
    }

    async fn evaluate_classic_release(
        &self,
        scope: &Scope<'_>,
        definition: &ReleaseDefinition,
    ) -> GateResult<Vec<ComplianceFinding>> {
        let ctx = scope.ctx;
        let item = Item {
            id: definition.id.to_string(),
            name: definition.name.clone(),
            project_id: ctx.project_id.clone(),
        };
        self.fan_out(scope.rules.classic_release.iter(), |rule| {
            let item = &item;
            async move {
                check(
                    &scope.matcher,
                    rule.name(),
                    rule.description(),
                    item,
                    rule.evaluate(&ctx.organization, &ctx.project_id, definition),
                )
                .await
            }
        })
        .await
    }

    async fn evaluate_yaml_release(
        &self,
        scope: &Scope<'_>,
        definition: &BuildDefinition,
    ) -> GateResult<Vec<ComplianceFinding>> {
        let ctx = scope.ctx;
        let item = Item::build_pipeline(definition, &ctx.project_id);
        self.fan_out(scope.rules.yaml_release.iter(), |rule| {
            let item = &item;
            async move {
                check(
                    &scope.matcher,
                    rule.name(),
                    rule.description(),
                    item,
                    rule.evaluate(&ctx.organization, &ctx.project_id, definition),
                )
                .await
            }
        })
        .await
    }

    async fn evaluate_build_pipelines(
        &self,
        scope: &Scope<'_>,
        pipelines: &[BuildDefinition],
    ) -> GateResult<Vec<ComplianceFinding>> {
        let ctx = scope.ctx;
        let units = pipelines.iter().flat_map(|pipeline| {
            let item = Item::build_pipeline(pipeline, &ctx.project_id);
            scope
                .rules
                .build
                .iter()
                .map(move |rule| (pipeline, item.clone(), rule))
        });
        self.fan_out(units, |(pipeline, item, rule)| async move {
            check(
                &scope.matcher,
                rule.name(),
                rule.description(),
                &item,
                rule.evaluate(&ctx.organization, &item.project_id, pipeline),
            )
            .await
        })
        .await
    }

    async fn evaluate_repositories(
        &self,
        scope: &Scope<'_>,
        repositories: &[Repository],
    ) -> GateResult<Vec<ComplianceFinding>> {
        if scope.rules.repository.is_empty() || repositories.is_empty() {
            return Ok(Vec::new());
        }
        let ctx = scope.ctx;
        let owners = self.repository_owners(ctx, repositories).await?;

        let units = repositories.iter().flat_map(|repository| {
            let item = Item {
                id: repository.id.clone(),
                name: repository.name.clone(),
                project_id: owner_of(repository, &owners, &ctx.project_id),
            };
            scope
                .rules
                .repository
                .iter()
                .map(move |rule| (repository, item.clone(), rule))
        });
        self.fan_out(units, |(repository, item, rule)| async move {
            check(
                &scope.matcher,
                rule.name(),
                rule.description(),
                &item,
                rule.evaluate(&ctx.organization, &item.project_id, repository),
            )
            .await
        })
        .await
    }

    /// Project ids, by project name, of repositories whose payload only names
    /// their project.
    async fn repository_owners(
        &self,
        ctx: &RunContext,
        repositories: &[Repository],
    ) -> GateResult<HashMap<String, String>> {
        let names: BTreeSet<&str> = repositories
            .iter()
            .filter_map(|r| r.project.as_ref())
            .filter(|p| p.id.is_none())
            .filter_map(|p| p.name.as_deref())
            .collect();

        stream::iter(names)
            .map(|name| async move {
                let project = self
                    .client
                    .project(&ctx.organization, name)
                    .await?
                    .ok_or_else(|| GateError::ProjectNotAvailable {
                        organization: ctx.organization.clone(),
                        project: name.to_string(),
                    })?;
                Ok::<_, GateError>((name.to_string(), project.id))
            })
            .buffered(self.config.fan_out())
            .try_collect()
            .await
    }

    /// Run `units` concurrently and collect their findings in unit order.
    async fn fan_out<U, I, F, Fut>(&self, units: I, eval: F) -> GateResult<Vec<ComplianceFinding>>
    where
        I: IntoIterator<Item = U>,
        F: FnMut(U) -> Fut,
        Fut: Future<Output = GateResult<ComplianceFinding>>,
    {
        stream::iter(units)
            .map(eval)
            .buffered(self.config.fan_out())
            .try_collect()
            .await
    }
}

fn owner_of(repository: &Repository, owners: &HashMap<String, String>, fallback: &str) -> String {
    let project = repository.project.as_ref();
    project
        .and_then(|p| p.id.clone())
        .or_else(|| {
            project
                .and_then(|p| p.name.as_ref())
                .and_then(|name| owners.get(name).cloned())
        })
        .unwrap_or_else(|| fallback.to_string())
}

/// Await one rule verdict and pair it with its deviation status.
async fn check<F>(
    matcher: &DeviationMatcher,
    rule_name: &str,
    rule_description: &str,
    item: &Item,
    verdict: F,
) -> GateResult<ComplianceFinding>
where
    F: Future<Output = anyhow::Result<bool>>,
{
    let is_compliant = verdict.await.map_err(|e| GateError::RuleEvaluation {
        rule: rule_name.to_string(),
        detail: format!("{e:#}"),
    })?;

    let has_deviation = matcher.has_deviation(&item.id, rule_name, &item.project_id);
    if has_deviation {
        obs::emit_deviation_matched(rule_name, &item.id);
    }

    Ok(ComplianceFinding {
        rule_description: rule_description.to_string(),
        item_name: item.name.clone(),
        is_compliant,
        has_deviation,
    })
}
