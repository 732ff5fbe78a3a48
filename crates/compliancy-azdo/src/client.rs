//! Azure DevOps REST client
//!
//! Implements the engine's [`DevOpsClient`] lookups and the
//! [`ClassificationSnapshotStore`] over the REST API. Status handling:
//!
//! - 404 on a lookup is `Ok(None)`
//! - 400 is [`SourceError::BadRequest`] with the service's `message`
//! - any other non-success status is [`SourceError::Http`]

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use compliancy_core::domain::{Build, BuildDefinition, Project, Release, ReleaseDefinition};
use compliancy_core::{DevOpsClient, SourceError, SourceResult};
use compliancy_state::{
    ClassificationSnapshot, ClassificationSnapshotStore, SnapshotKey, StorageError, StorageResult,
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::AzdoConfig;
use crate::endpoints;

/// Azure DevOps client for gate lookups
pub struct AzdoClient {
    config: AzdoConfig,
    http_client: reqwest::Client,
}

impl AzdoClient {
    /// Create a new client
    pub fn new(config: AzdoConfig) -> SourceResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("compliancy-azdo/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(transport)?;

        Ok(AzdoClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> SourceResult<Self> {
        Self::new(AzdoConfig::from_env())
    }

    pub fn config(&self) -> &AzdoConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.basic_auth("", Some(token)),
            None => request,
        }
    }

    /// GET a resource; 404 means the resource does not exist.
    async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> SourceResult<Option<T>> {
        debug!(url = %url, "GET");
        let response = self
            .authorize(self.http_client.get(url))
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(url, response).await.map(Some)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> SourceResult<T> {
        debug!(url = %url, "POST");
        let response = self
            .authorize(self.http_client.post(url).json(body))
            .send()
            .await
            .map_err(transport)?;

        read_json(url, response).await
    }
}

#[async_trait]
impl DevOpsClient for AzdoClient {
    async fn project(&self, organization: &str, project: &str) -> SourceResult<Option<Project>> {
        self.get_optional(&endpoints::project(&self.config, organization, project))
            .await
    }

    async fn release(
        &self,
        organization: &str,
        project_id: &str,
        release_id: &str,
    ) -> SourceResult<Option<Release>> {
        self.get_optional(&endpoints::release(
            &self.config,
            organization,
            project_id,
            release_id,
        ))
        .await
    }

    async fn release_definition(
        &self,
        organization: &str,
        project_id: &str,
        definition_id: i64,
        revision: Option<i32>,
    ) -> SourceResult<Option<ReleaseDefinition>> {
        self.get_optional(&endpoints::release_definition(
            &self.config,
            organization,
            project_id,
            definition_id,
            revision,
        ))
        .await
    }

    async fn build(
        &self,
        organization: &str,
        project_id: &str,
        build_id: &str,
    ) -> SourceResult<Option<Build>> {
        self.get_optional(&endpoints::build(
            &self.config,
            organization,
            project_id,
            build_id,
        ))
        .await
    }

    async fn build_definition(
        &self,
        organization: &str,
        project_id: &str,
        definition_id: i64,
        revision: Option<i32>,
    ) -> SourceResult<Option<BuildDefinition>> {
        self.get_optional(&endpoints::build_definition(
            &self.config,
            organization,
            project_id,
            definition_id,
            revision,
        ))
        .await
    }

    /// Compiles the pipeline at the run's source branch without queueing it.
    #[instrument(skip(self, build), fields(build_id = build.id))]
    async fn yaml_used_in_run(
        &self,
        organization: &str,
        project_id: &str,
        build: &Build,
    ) -> SourceResult<String> {
        let pipeline_id = build
            .definition
            .as_ref()
            .map(|d| d.id)
            .ok_or_else(|| {
                SourceError::Decode(format!(
                    "build {} carries no definition reference",
                    build.id
                ))
            })?;

        let url = endpoints::pipeline_preview(&self.config, organization, project_id, pipeline_id);
        let preview: PreviewResponse = self
            .post(
                &url,
                &PreviewRequest::for_branch(build.source_branch.as_deref()),
            )
            .await?;
        Ok(preview.final_yaml)
    }
}

#[async_trait]
impl ClassificationSnapshotStore for AzdoClient {
    async fn download(&self, key: &SnapshotKey) -> StorageResult<Option<ClassificationSnapshot>> {
        let url = endpoints::extension_document(&self.config, key);
        self.get_optional(&url).await.map_err(|e| match e {
            SourceError::Decode(detail) => StorageError::Malformed(detail),
            other => StorageError::Unavailable(other.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewRequest {
    preview_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    resources: Option<PreviewResources>,
}

#[derive(Debug, Serialize)]
struct PreviewResources {
    repositories: BTreeMap<&'static str, RepositoryRef>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryRef {
    ref_name: String,
}

impl PreviewRequest {
    fn for_branch(branch: Option<&str>) -> Self {
        PreviewRequest {
            preview_run: true,
            resources: branch.map(|branch| PreviewResources {
                repositories: BTreeMap::from([(
                    "self",
                    RepositoryRef {
                        ref_name: branch.to_string(),
                    },
                )]),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewResponse {
    final_yaml: String,
}

/// Error payload returned by the service on failed requests.
#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

async fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> SourceResult<T> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(status_error(status, url, &body));
    }
    serde_json::from_str(&body)
        .map_err(|e| SourceError::Decode(format!("{url}: {e}")))
}

fn status_error(status: StatusCode, url: &str, body: &str) -> SourceError {
    if status == StatusCode::BAD_REQUEST {
        return SourceError::BadRequest {
            message: service_message(body),
        };
    }
    SourceError::Http {
        status: status.as_u16(),
        url: url.to_string(),
    }
}

fn service_message(body: &str) -> Option<String> {
    serde_json::from_str::<ServiceError>(body)
        .ok()
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
}

fn transport(err: reqwest::Error) -> SourceError {
    SourceError::Transport(err.to_string())
}
