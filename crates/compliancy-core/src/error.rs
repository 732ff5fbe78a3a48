//! Error taxonomy for the compliancy gate.

use compliancy_state::{PipelineKind, StorageError};
use thiserror::Error;

/// Failures reported by DevOps lookups.
///
/// "Not found" is not an error here: lookups return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The service rejected the request (HTTP 400), with its message if any.
    #[error("bad request: {}", .message.as_deref().unwrap_or("no message"))]
    BadRequest { message: Option<String> },

    /// Any other non-success response.
    #[error("unexpected status {status} from {url}")]
    Http { status: u16, url: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Result type for DevOps lookups.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Errors produced while enriching or evaluating a pipeline run.
#[derive(Debug, Error)]
pub enum GateError {
    /// The release (or its definition reference) could not be located.
    #[error("release run {run_id} is not available")]
    RunNotAvailable { run_id: String },

    /// The build (or its definition reference) could not be located.
    #[error("build run {run_id} is not available")]
    BuildNotAvailable { run_id: String },

    #[error("project '{project}' is not available in organization '{organization}'")]
    ProjectNotAvailable {
        organization: String,
        project: String,
    },

    #[error("{kind} definition {definition_id} is not available")]
    DefinitionNotAvailable {
        kind: PipelineKind,
        definition_id: i64,
    },

    /// The classification snapshot is missing or lacks its pipeline collection.
    #[error("invalid classification snapshot for project '{project}': {reason}")]
    InvalidClassificationSnapshot { project: String, reason: String },

    #[error("rule '{rule}' failed: {detail}")]
    RuleEvaluation { rule: String, detail: String },

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("gate evaluation cancelled")]
    Cancelled,
}

/// Result type for gate operations.
pub type GateResult<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_display_includes_service_message() {
        let err = SourceError::BadRequest {
            message: Some("Unexpected value 'stagess'".to_string()),
        };
        assert!(err.to_string().contains("stagess"));

        let err = SourceError::BadRequest { message: None };
        assert!(err.to_string().contains("no message"));
    }

    #[test]
    fn test_resolution_errors_name_the_run() {
        let err = GateError::RunNotAvailable {
            run_id: "42".to_string(),
        };
        assert!(err.to_string().contains("42"));

        let err = GateError::DefinitionNotAvailable {
            kind: PipelineKind::Release,
            definition_id: 7,
        };
        assert_eq!(err.to_string(), "release definition 7 is not available");
    }

    #[test]
    fn test_source_error_converts() {
        let err: GateError = SourceError::Transport("connection reset".to_string()).into();
        assert!(matches!(err, GateError::Source(_)));
    }
}
