//! Record types read from the external compliancy stores.
//!
//! All records are snapshots: the gate engine never writes them back.

use serde::{Deserialize, Serialize};

/// Which pipeline flavour a registration (or run) refers to.
///
/// Classic release pipelines and build/YAML pipelines live in separate id
/// spaces, so a pipeline is only identified by `(kind, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    /// Classic release pipeline (release definition).
    Release,
    /// Build pipeline, classic or YAML.
    Build,
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineKind::Release => write!(f, "release"),
            PipelineKind::Build => write!(f, "build"),
        }
    }
}

/// A pipeline registered for compliance tracking under a CI identifier.
///
/// One pipeline may carry several registrations, one per registered
/// stage / CI identifier pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRegistration {
    pub pipeline_id: String,
    pub pipeline_type: PipelineKind,
    pub stage_id: String,
    pub ci_identifier: String,
    #[serde(default)]
    pub is_production: bool,
    #[serde(default)]
    pub rule_profile_name: Option<String>,
    #[serde(default)]
    pub is_sox: bool,
}

impl PipelineRegistration {
    /// Whether this registration belongs to the given pipeline.
    pub fn is_for(&self, kind: PipelineKind, pipeline_id: &str) -> bool {
        self.pipeline_type == kind && self.pipeline_id == pipeline_id
    }
}

/// An approved exception suppressing one rule for one item under one CI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deviation {
    pub item_id: String,
    pub rule_name: String,
    pub ci_identifier: String,
    pub project_id: String,
    /// Owning project of the item when it lives outside `project_id`.
    #[serde(default)]
    pub foreign_project_id: Option<String>,
}

/// A pipeline entry in the classification snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedPipeline {
    pub id: String,
    #[serde(rename = "type")]
    pub pipeline_type: String,
}

/// Per-project classification document produced by the scanning batch.
///
/// `build_pipelines` is `None` when the collection is missing from the
/// document, which consumers treat as corrupted state rather than "no
/// pipelines".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationSnapshot {
    #[serde(default)]
    pub build_pipelines: Option<Vec<ClassifiedPipeline>>,
}

impl ClassificationSnapshot {
    /// Snapshot with the given `(id, type)` entries.
    pub fn with_pipelines<I, S, T>(pipelines: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            build_pipelines: Some(
                pipelines
                    .into_iter()
                    .map(|(id, ty)| ClassifiedPipeline {
                        id: id.into(),
                        pipeline_type: ty.into(),
                    })
                    .collect(),
            ),
        }
    }
}

/// Address of a classification snapshot in extension data storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub publisher: String,
    pub collection: String,
    pub extension_name: String,
    pub organization: String,
    pub project_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_deserializes_with_defaults() {
        let reg: PipelineRegistration = serde_json::from_str(
            r#"{"pipelineId":"12","pipelineType":"release","stageId":"3","ciIdentifier":"CI001"}"#,
        )
        .unwrap();
        assert_eq!(reg.pipeline_type, PipelineKind::Release);
        assert!(!reg.is_production);
        assert!(reg.rule_profile_name.is_none());
        assert!(reg.is_for(PipelineKind::Release, "12"));
        assert!(!reg.is_for(PipelineKind::Build, "12"));
    }

    #[test]
    fn test_snapshot_without_collection_is_none() {
        let snap: ClassificationSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snap.build_pipelines.is_none());

        let snap: ClassificationSnapshot = serde_json::from_str(
            r#"{"buildPipelines":[{"id":"7","type":"StagelessYamlPipeline"}]}"#,
        )
        .unwrap();
        assert_eq!(
            snap.build_pipelines.unwrap()[0].pipeline_type,
            "StagelessYamlPipeline"
        );
    }
}
