//! Production-stage gate.
//!
//! Only runs of a stage registered as production are evaluated; everything
//! else short-circuits to an empty report.

use std::collections::BTreeSet;

use compliancy_state::{PipelineKind, PipelineRegistration};

use crate::domain::RunContext;

/// Registrations belonging to the run's own pipeline.
pub fn registrations_for_run(
    ctx: &RunContext,
    registrations: &[PipelineRegistration],
) -> Vec<PipelineRegistration> {
    let pipeline_id = ctx.pipeline_id();
    registrations
        .iter()
        .filter(|r| r.is_for(ctx.pipeline_kind(), &pipeline_id))
        .cloned()
        .collect()
}

/// Stage ids registered as production for one pipeline.
pub fn production_stage_ids(
    registrations: &[PipelineRegistration],
    kind: PipelineKind,
    pipeline_id: &str,
) -> BTreeSet<String> {
    registrations
        .iter()
        .filter(|r| r.is_production && r.is_for(kind, pipeline_id))
        .map(|r| r.stage_id.clone())
        .collect()
}

/// Whether the run's requested stage is a registered production stage that
/// the run actually has.
pub fn is_production_run(ctx: &RunContext, registrations: &[PipelineRegistration]) -> bool {
    let production = production_stage_ids(registrations, ctx.pipeline_kind(), &ctx.pipeline_id());
    let resolved = ctx.stage_ids();

    production.contains(ctx.stage_id.as_str()) && resolved.contains(ctx.stage_id.as_str())
}
