//! DevOps resources as returned by the lookup layer.
//!
//! Field names follow the Azure DevOps REST payloads (camelCase) so the HTTP
//! client can deserialize straight into these types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Build process type for YAML pipelines; every other value is a GUI/designer process.
pub const YAML_PROCESS_TYPE: i32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

/// Partial project reference embedded in other payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReference {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionReference {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub revision: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub id: i64,
    #[serde(default)]
    pub release_definition: Option<DefinitionReference>,
    /// Definition revision the release was created from.
    #[serde(default)]
    pub release_definition_revision: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEnvironment {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSourceReference {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Artifact consumed by a release definition (build output, git repo, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseArtifact {
    #[serde(rename = "type")]
    pub artifact_type: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub definition_reference: BTreeMap<String, ArtifactSourceReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDefinition {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub revision: Option<i32>,
    #[serde(default)]
    pub environments: Vec<ReleaseEnvironment>,
    #[serde(default)]
    pub artifacts: Vec<ReleaseArtifact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: i64,
    #[serde(default)]
    pub definition: Option<DefinitionReference>,
    #[serde(default)]
    pub project: Option<ProjectReference>,
    #[serde(default)]
    pub source_branch: Option<String>,
    #[serde(default)]
    pub source_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildProcess {
    #[serde(rename = "type")]
    pub process_type: i32,
    #[serde(default)]
    pub yaml_filename: Option<String>,
}

impl BuildProcess {
    pub fn yaml(filename: &str) -> Self {
        Self {
            process_type: YAML_PROCESS_TYPE,
            yaml_filename: Some(filename.to_string()),
        }
    }

    pub fn designer() -> Self {
        Self {
            process_type: 1,
            yaml_filename: None,
        }
    }

    pub fn is_yaml(&self) -> bool {
        self.process_type == YAML_PROCESS_TYPE
    }
}

impl Default for BuildProcess {
    fn default() -> Self {
        Self::designer()
    }
}

/// Repository reference embedded in a build definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRepository {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub repository_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDefinition {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub revision: Option<i32>,
    #[serde(default)]
    pub process: BuildProcess,
    #[serde(default)]
    pub repository: Option<BuildRepository>,
    #[serde(default)]
    pub project: Option<ProjectReference>,
}

impl BuildDefinition {
    /// Owning project id when the payload carries one.
    pub fn project_id(&self) -> Option<&str> {
        self.project.as_ref().and_then(|p| p.id.as_deref())
    }
}

/// A source repository linked from a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub project: Option<ProjectReference>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_definition_from_rest_payload() {
        let def: BuildDefinition = serde_json::from_str(
            r#"{
                "id": 12,
                "name": "payments-ci",
                "revision": 4,
                "process": {"type": 2, "yamlFilename": "azure-pipelines.yml"},
                "repository": {"id": "r-1", "name": "payments", "type": "TfsGit"},
                "project": {"id": "p-1", "name": "Payments"}
            }"#,
        )
        .unwrap();
        assert!(def.process.is_yaml());
        assert_eq!(def.project_id(), Some("p-1"));
        assert_eq!(
            def.repository.unwrap().repository_type.as_deref(),
            Some("TfsGit")
        );
    }

    #[test]
    fn test_release_without_definition_reference() {
        let release: Release = serde_json::from_str(r#"{"id": 5}"#).unwrap();
        assert!(release.release_definition.is_none());
        assert!(release.release_definition_revision.is_none());
    }

    #[test]
    fn test_missing_process_defaults_to_designer() {
        let def: BuildDefinition = serde_json::from_str(r#"{"id": 1, "name": "classic"}"#).unwrap();
        assert!(!def.process.is_yaml());
    }
}
