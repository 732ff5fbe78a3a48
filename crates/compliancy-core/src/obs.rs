//! Structured observability hooks for the gate lifecycle.
//!
//! Events are emitted at `info!` level unless noted. Filter with `RUST_LOG`;
//! use the CLI's `--json` flag for JSON lines.

use tracing::{debug, info, warn};

use crate::domain::RunContext;

/// Emit event: run enriched with definition, stages and classification.
pub fn emit_run_resolved(ctx: &RunContext) {
    info!(
        event = "run.resolved",
        organization = %ctx.organization,
        project_id = %ctx.project_id,
        run_id = %ctx.run_id,
        pipeline_kind = %ctx.pipeline_kind(),
        pipeline_id = ctx.pipeline.id(),
        stages = ctx.stages.len(),
        classification = ctx.classification.map(|c| c.as_str()).unwrap_or("-"),
    );
}

/// Emit event: the run's YAML could not be compiled; run continues as invalid (warning level).
pub fn emit_yaml_recovered(run_id: &str, message: Option<&str>) {
    warn!(
        event = "yaml.recovered",
        run_id = %run_id,
        message = message.unwrap_or(""),
    );
}

/// Emit event: release definition revision was pruned, latest revision used.
pub fn emit_revision_fallback(definition_id: i64, revision: i32) {
    info!(
        event = "release.revision_fallback",
        definition_id = definition_id,
        revision = revision,
    );
}

/// Emit event: requested stage is not a registered production stage.
pub fn emit_gate_skipped(run_id: &str, stage_id: &str) {
    info!(event = "gate.skipped", run_id = %run_id, stage_id = %stage_id);
}

/// Emit event: gate evaluation completed.
pub fn emit_gate_evaluated(run_id: &str, profile: &str, findings: usize, blocking: usize) {
    info!(
        event = "gate.evaluated",
        run_id = %run_id,
        profile = %profile,
        findings = findings,
        blocking = blocking,
    );
}

/// Emit event: a finding was suppressed by deviations (debug level).
pub fn emit_deviation_matched(rule: &str, item_id: &str) {
    debug!(event = "deviation.matched", rule = %rule, item_id = %item_id);
}
