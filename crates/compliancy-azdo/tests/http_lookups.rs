//! Drives the REST client against a one-shot loopback responder.

use compliancy_azdo::{AzdoClient, AzdoConfig};
use compliancy_core::domain::{Build, DefinitionReference};
use compliancy_core::{DevOpsClient, SourceError};
use compliancy_state::{ClassificationSnapshotStore, SnapshotKey, StorageError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve exactly one request with the given status and JSON body.
/// The handle yields the raw request head.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];

        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before request head");
            request.extend_from_slice(&chunk[..n]);
            if let Some(pos) = find(&request, b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&request[..head_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while request.len() < head_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).to_string()
    });

    (base, handle)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn client(base: &str) -> AzdoClient {
    AzdoClient::new(AzdoConfig::new(base).with_token("pat")).unwrap()
}

fn run_build() -> Build {
    Build {
        id: 55,
        definition: Some(DefinitionReference {
            id: 12,
            name: None,
            revision: Some(3),
        }),
        project: None,
        source_branch: Some("refs/heads/release".to_string()),
        source_version: None,
    }
}

#[tokio::test]
async fn lookup_decodes_success_payload() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"id":"p-1","name":"Payments","state":"wellFormed"}"#,
    )
    .await;

    let project = client(&base)
        .project("contoso", "p-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(project.name, "Payments");

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /contoso/_apis/projects/p-1?api-version=7.1 "));
    assert!(request.to_ascii_lowercase().contains("authorization: basic "));
}

#[tokio::test]
async fn not_found_is_none() {
    let (base, server) =
        serve_once("404 Not Found", r#"{"message":"release 9 not found"}"#).await;

    let release = client(&base).release("contoso", "p-1", "9").await.unwrap();
    assert!(release.is_none());
    server.await.unwrap();
}

#[tokio::test]
async fn pinned_release_revision_uses_revision_history() {
    let (base, server) = serve_once("404 Not Found", "").await;

    let definition = client(&base)
        .release_definition("contoso", "p-1", 7, Some(3))
        .await
        .unwrap();
    assert!(definition.is_none());

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /contoso/p-1/_apis/release/definitions/7/revisions/3?"));
}

#[tokio::test]
async fn yaml_preview_returns_final_yaml() {
    let (base, server) =
        serve_once("200 OK", r#"{"finalYaml":"stages:\n- stage: Prod\n"}"#).await;

    let yaml = client(&base)
        .yaml_used_in_run("contoso", "p-1", &run_build())
        .await
        .unwrap();
    assert_eq!(yaml, "stages:\n- stage: Prod\n");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /contoso/p-1/_apis/pipelines/12/preview?api-version=7.1 "));
    assert!(request.contains(r#""refName":"refs/heads/release""#));
}

#[tokio::test]
async fn yaml_preview_bad_request_carries_message() {
    let (base, server) = serve_once(
        "400 Bad Request",
        r#"{"message":"/azure-pipelines.yml (Line: 3, Col: 1): Unexpected value 'stagez'"}"#,
    )
    .await;

    let err = client(&base)
        .yaml_used_in_run("contoso", "p-1", &run_build())
        .await
        .unwrap_err();
    match err {
        SourceError::BadRequest { message } => {
            assert!(message.unwrap().contains("Unexpected value 'stagez'"));
        }
        other => panic!("unexpected error: {other}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn server_error_is_http_error() {
    let (base, server) = serve_once("503 Service Unavailable", "").await;

    let err = client(&base).build("contoso", "p-1", "55").await.unwrap_err();
    assert!(matches!(err, SourceError::Http { status: 503, .. }));
    server.await.unwrap();
}

#[tokio::test]
async fn snapshot_document_is_downloaded() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"id":"Payments","__etag":4,"buildPipelines":[{"id":"12","type":"YamlPipelineWithStages"}]}"#,
    )
    .await;
    let key = SnapshotKey {
        publisher: "stevedores".to_string(),
        collection: "pipelines".to_string(),
        extension_name: "compliancy".to_string(),
        organization: "contoso".to_string(),
        project_name: "Payments".to_string(),
    };

    let snapshot = client(&base).download(&key).await.unwrap().unwrap();
    let pipelines = snapshot.build_pipelines.unwrap();
    assert_eq!(pipelines.len(), 1);
    assert_eq!(pipelines[0].pipeline_type, "YamlPipelineWithStages");
    server.await.unwrap();
}

#[tokio::test]
async fn malformed_snapshot_is_a_storage_error() {
    let (base, server) = serve_once("200 OK", r#"{"buildPipelines": 12}"#).await;
    let key = SnapshotKey {
        publisher: "stevedores".to_string(),
        collection: "pipelines".to_string(),
        extension_name: "compliancy".to_string(),
        organization: "contoso".to_string(),
        project_name: "Payments".to_string(),
    };

    let err = client(&base).download(&key).await.unwrap_err();
    assert!(matches!(err, StorageError::Malformed(_)));
    server.await.unwrap();
}
