//! Gate configuration and well-known constants.
//!
//! A single [`GateConfig`] is built at startup and shared by reference
//! (`Arc<GateConfig>`) with the resolver and evaluator.

use std::path::Path;

use compliancy_state::{PipelineKind, SnapshotKey};
use serde::{Deserialize, Serialize};

use crate::profile::{ProfileCatalog, RuleProfile};

/// Stage name the YAML compiler gives to the implicit stage of a stageless pipeline.
pub const DEFAULT_STAGE_NAME: &str = "__default";

/// Pipeline-type tag identifying classic release runs.
pub const RELEASE_PIPELINE_TAG: &str = "release";

/// Name of the baseline rule profile.
pub const BASELINE_PROFILE: &str = "Default";

/// Where the classification snapshot lives in extension data storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionScope {
    pub publisher: String,
    pub extension_name: String,
    pub collection: String,
}

impl Default for ExtensionScope {
    fn default() -> Self {
        Self {
            publisher: "stevedores".to_string(),
            extension_name: "compliancy".to_string(),
            collection: "pipelines".to_string(),
        }
    }
}

/// Gate engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GateConfig {
    pub extension: ExtensionScope,
    pub default_stage_name: String,
    pub release_pipeline_tag: String,
    pub baseline_profile: String,
    /// Upper bound on concurrently running rule evaluations within a family.
    pub max_concurrency: usize,
    /// Named rule profiles besides the baseline.
    pub profiles: Vec<RuleProfile>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            extension: ExtensionScope::default(),
            default_stage_name: DEFAULT_STAGE_NAME.to_string(),
            release_pipeline_tag: RELEASE_PIPELINE_TAG.to_string(),
            baseline_profile: BASELINE_PROFILE.to_string(),
            max_concurrency: 8,
            profiles: Vec::new(),
        }
    }
}

impl GateConfig {
    /// Load a JSON config file; missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Interpret an incoming pipeline-type tag (case-insensitive).
    pub fn pipeline_kind(&self, tag: &str) -> PipelineKind {
        if tag.eq_ignore_ascii_case(&self.release_pipeline_tag) {
            PipelineKind::Release
        } else {
            PipelineKind::Build
        }
    }

    /// Snapshot address for a project.
    pub fn snapshot_key(&self, organization: &str, project_name: &str) -> SnapshotKey {
        SnapshotKey {
            publisher: self.extension.publisher.clone(),
            collection: self.extension.collection.clone(),
            extension_name: self.extension.extension_name.clone(),
            organization: organization.to_string(),
            project_name: project_name.to_string(),
        }
    }

    /// Catalog of the configured profiles around the baseline profile.
    pub fn profile_catalog(&self) -> ProfileCatalog {
        self.profiles
            .iter()
            .cloned()
            .fold(
                ProfileCatalog::new(&self.baseline_profile),
                ProfileCatalog::with_profile,
            )
    }

    pub(crate) fn fan_out(&self) -> usize {
        self.max_concurrency.max(1)
    }
}
