//! REST endpoint URLs.

use compliancy_state::SnapshotKey;

use crate::config::AzdoConfig;

pub fn project(config: &AzdoConfig, organization: &str, project: &str) -> String {
    format!(
        "{}/{organization}/_apis/projects/{project}?api-version={}",
        config.base_url, config.api_version
    )
}

pub fn release(
    config: &AzdoConfig,
    organization: &str,
    project_id: &str,
    release_id: &str,
) -> String {
    format!(
        "{}/{organization}/{project_id}/_apis/release/releases/{release_id}?api-version={}",
        config.release_url, config.api_version
    )
}

/// A pinned revision is served from the definition's revision history.
pub fn release_definition(
    config: &AzdoConfig,
    organization: &str,
    project_id: &str,
    definition_id: i64,
    revision: Option<i32>,
) -> String {
    let base = format!(
        "{}/{organization}/{project_id}/_apis/release/definitions/{definition_id}",
        config.release_url
    );
    match revision {
        Some(revision) => format!(
            "{base}/revisions/{revision}?api-version={}",
            config.api_version
        ),
        None => format!("{base}?api-version={}", config.api_version),
    }
}

pub fn build(config: &AzdoConfig, organization: &str, project_id: &str, build_id: &str) -> String {
    format!(
        "{}/{organization}/{project_id}/_apis/build/builds/{build_id}?api-version={}",
        config.base_url, config.api_version
    )
}

pub fn build_definition(
    config: &AzdoConfig,
    organization: &str,
    project_id: &str,
    definition_id: i64,
    revision: Option<i32>,
) -> String {
    let url = format!(
        "{}/{organization}/{project_id}/_apis/build/definitions/{definition_id}?api-version={}",
        config.base_url, config.api_version
    );
    match revision {
        Some(revision) => format!("{url}&revision={revision}"),
        None => url,
    }
}

pub fn pipeline_preview(
    config: &AzdoConfig,
    organization: &str,
    project_id: &str,
    pipeline_id: i64,
) -> String {
    format!(
        "{}/{organization}/{project_id}/_apis/pipelines/{pipeline_id}/preview?api-version={}",
        config.base_url, config.api_version
    )
}

/// Extension data document named after the project.
pub fn extension_document(config: &AzdoConfig, key: &SnapshotKey) -> String {
    format!(
        "{}/{}/_apis/ExtensionManagement/InstalledExtensions/{}/{}/Data/Scopes/Default/Current/Collections/{}/Documents/{}?api-version={}-preview.1",
        config.extmgmt_url,
        key.organization,
        key.publisher,
        key.extension_name,
        key.collection,
        key.project_name,
        config.api_version
    )
}
