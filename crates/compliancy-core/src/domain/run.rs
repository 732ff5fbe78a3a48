//! Run reference and the enriched run context.

use std::collections::BTreeSet;
use std::str::FromStr;

use compliancy_state::PipelineKind;
use serde::{Deserialize, Serialize};

use super::devops::{BuildDefinition, ReleaseDefinition};

/// Minimal run reference received by the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub organization: String,
    pub project_id: String,
    pub run_id: String,
    pub stage_id: String,
    /// `release` (any case) for classic releases, anything else for builds.
    pub pipeline_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDescriptor {
    pub id: String,
    pub name: String,
}

impl StageDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Category of a build/YAML pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineClassification {
    ClassicBuildPipeline,
    StagelessYamlPipeline,
    YamlPipelineWithStages,
    YamlReleasePipeline,
    InvalidYamlPipeline,
}

impl PipelineClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineClassification::ClassicBuildPipeline => "ClassicBuildPipeline",
            PipelineClassification::StagelessYamlPipeline => "StagelessYamlPipeline",
            PipelineClassification::YamlPipelineWithStages => "YamlPipelineWithStages",
            PipelineClassification::YamlReleasePipeline => "YamlReleasePipeline",
            PipelineClassification::InvalidYamlPipeline => "InvalidYamlPipeline",
        }
    }
}

impl std::fmt::Display for PipelineClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineClassification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            PipelineClassification::ClassicBuildPipeline,
            PipelineClassification::StagelessYamlPipeline,
            PipelineClassification::YamlPipelineWithStages,
            PipelineClassification::YamlReleasePipeline,
            PipelineClassification::InvalidYamlPipeline,
        ]
        .into_iter()
        .find(|c| c.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("unknown pipeline classification: {s}"))
    }
}

/// The run's pipeline definition: a classic release XOR a build pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "definition", rename_all = "lowercase")]
pub enum ResolvedPipeline {
    Release(ReleaseDefinition),
    Build(BuildDefinition),
}

impl ResolvedPipeline {
    pub fn kind(&self) -> PipelineKind {
        match self {
            ResolvedPipeline::Release(_) => PipelineKind::Release,
            ResolvedPipeline::Build(_) => PipelineKind::Build,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ResolvedPipeline::Release(def) => def.id,
            ResolvedPipeline::Build(def) => def.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ResolvedPipeline::Release(def) => &def.name,
            ResolvedPipeline::Build(def) => &def.name,
        }
    }
}

/// A pipeline run enriched with its definition, stages and classification.
///
/// Owned by a single gate evaluation and not modified once enrichment completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunContext {
    pub organization: String,
    pub project_id: String,
    pub project_name: String,
    pub run_id: String,
    /// Stage the gate was invoked for.
    pub stage_id: String,
    pub pipeline: ResolvedPipeline,
    pub stages: Vec<StageDescriptor>,
    /// Set for build/YAML runs only.
    pub classification: Option<PipelineClassification>,
    /// Service message captured when the run's YAML could not be retrieved.
    pub error_message: Option<String>,
}

impl RunContext {
    pub fn pipeline_kind(&self) -> PipelineKind {
        self.pipeline.kind()
    }

    /// Pipeline id as registrations record it.
    pub fn pipeline_id(&self) -> String {
        self.pipeline.id().to_string()
    }

    pub fn is_classic_release(&self) -> bool {
        matches!(self.pipeline, ResolvedPipeline::Release(_))
    }

    pub fn stage_ids(&self) -> BTreeSet<&str> {
        self.stages.iter().map(|s| s.id.as_str()).collect()
    }
}
