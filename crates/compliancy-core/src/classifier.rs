//! Stage extraction and pipeline classification.
//!
//! Classification happens in two tiers. The compiled YAML decides the easy
//! cases (classic build, stageless). Anything with real stages is looked up
//! in the classification snapshot, because the branch a run was built from
//! may not carry the stages defined on the pipeline's primary branch.

use compliancy_state::ClassificationSnapshot;
use serde_yaml::Value;

use crate::domain::{BuildProcess, PipelineClassification};
use crate::error::{GateError, GateResult};

/// Stage names of a compiled pipeline document (`stages[*].stage`).
///
/// Entries without a `stage` key (template references, malformed items) are
/// skipped. A document without a `stages` sequence has no stages.
pub fn parse_stage_names(yaml: &str) -> Result<Vec<String>, serde_yaml::Error> {
    let document: Value = serde_yaml::from_str(yaml)?;
    let stages = match document.get("stages").and_then(Value::as_sequence) {
        Some(stages) => stages,
        None => return Ok(Vec::new()),
    };

    Ok(stages
        .iter()
        .filter_map(|stage| stage.get("stage"))
        .filter_map(|name| match name {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect())
}

/// Classify from the pipeline's own content.
///
/// Returns `None` when the pipeline has real stages and the snapshot must
/// be consulted.
pub fn classify_structure(
    process: &BuildProcess,
    stage_names: &[String],
    default_stage_name: &str,
) -> Option<PipelineClassification> {
    if !process.is_yaml() {
        return Some(PipelineClassification::ClassicBuildPipeline);
    }

    match stage_names {
        [] => Some(PipelineClassification::StagelessYamlPipeline),
        [only] if only.eq_ignore_ascii_case(default_stage_name) => {
            Some(PipelineClassification::StagelessYamlPipeline)
        }
        _ => None,
    }
}

/// Classify a staged YAML pipeline from the snapshot written by the scanning batch.
pub fn classify_from_snapshot(
    pipeline_id: &str,
    project: &str,
    snapshot: Option<&ClassificationSnapshot>,
) -> GateResult<PipelineClassification> {
    let pipelines = snapshot
        .and_then(|s| s.build_pipelines.as_ref())
        .ok_or_else(|| GateError::InvalidClassificationSnapshot {
            project: project.to_string(),
            reason: if snapshot.is_none() {
                "snapshot document is missing".to_string()
            } else {
                "build pipeline collection is missing".to_string()
            },
        })?;

    let staged = pipelines
        .iter()
        .filter(|p| p.id == pipeline_id)
        .filter_map(|p| p.pipeline_type.parse::<PipelineClassification>().ok())
        .any(|c| {
            matches!(
                c,
                PipelineClassification::YamlPipelineWithStages
                    | PipelineClassification::StagelessYamlPipeline
            )
        });

    Ok(if staged {
        PipelineClassification::YamlPipelineWithStages
    } else {
        PipelineClassification::YamlReleasePipeline
    })
}
