use std::io::Cursor;
use std::time::Duration;

use pretty_assertions::assert_eq;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tf_app::client::{ArtifactFetch, ArtifactQuery, BackendClient, ResourceKind};
use tf_app::error::BackendError;

fn client(base_url: String) -> BackendClient {
    BackendClient::new(base_url, Duration::from_secs(5), Duration::from_secs(5))
}

fn png_bytes() -> Vec<u8> {
    let img = image::DynamicImage::new_rgba8(4, 4);
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

#[tokio::test]
async fn submit_returns_the_backend_ack() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/prompt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "prompt_id": "abc-123",
            "number": 4,
        })))
        .mount(&server)
        .await;

    let client = client(server.uri());
    let graph = serde_json::json!({"3": {"inputs": {}}});
    let ack = client.submit_workflow(&graph).await.expect("submit ok");
    assert_eq!(ack.prompt_id, "abc-123");
    assert_eq!(ack.number, 4);
}

#[tokio::test]
async fn submit_surfaces_non_200_as_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/prompt"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid prompt"))
        .mount(&server)
        .await;

    let client = client(server.uri());
    let err = client
        .submit_workflow(&serde_json::json!({}))
        .await
        .unwrap_err();
    match err {
        BackendError::Status { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "invalid prompt");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn fetch_distinguishes_ready_from_not_ready() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();
    let query = ArtifactQuery::for_job(id);

    Mock::given(method("GET"))
        .and(path("/view"))
        .and(query_param("filename", query.filename.clone()))
        .and(query_param("subfolder", "texforge"))
        .and(query_param("type", "output"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
        .mount(&server)
        .await;

    let client = client(server.uri());
    match client.fetch_artifact(&query).await.unwrap() {
        ArtifactFetch::Ready(bytes) => assert!(!bytes.is_empty()),
        ArtifactFetch::NotReady => panic!("expected bytes"),
    }

    // An artifact the backend has not produced yet.
    let missing = ArtifactQuery::for_job(Uuid::new_v4());
    Mock::given(method("GET"))
        .and(path("/view"))
        .and(query_param("filename", missing.filename.clone()))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    assert!(matches!(
        client.fetch_artifact(&missing).await.unwrap(),
        ArtifactFetch::NotReady
    ));
}

#[tokio::test]
async fn fetch_treats_other_statuses_as_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/view"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client(server.uri());
    let err = client
        .fetch_artifact(&ArtifactQuery::for_job(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(503));
}

#[tokio::test]
async fn fetch_reports_transport_failure_without_status() {
    // Nothing listens on port 1.
    let client = BackendClient::new(
        "http://127.0.0.1:1".into(),
        Duration::from_millis(500),
        Duration::from_millis(500),
    );
    let err = client
        .fetch_artifact(&ArtifactQuery::for_job(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(err.status_code().is_none());
    assert!(matches!(err, BackendError::Transport(_)));
}

#[tokio::test]
async fn list_resources_parses_the_name_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models/checkpoints"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!(["sd_xl_base_1.0.safetensors", "flux1-dev.safetensors"])),
        )
        .mount(&server)
        .await;

    let client = client(server.uri());
    let models = client
        .list_resources(ResourceKind::Checkpoints)
        .await
        .unwrap();
    assert_eq!(
        models,
        vec![
            "sd_xl_base_1.0.safetensors".to_string(),
            "flux1-dev.safetensors".to_string()
        ]
    );
}

#[tokio::test]
async fn upload_image_posts_multipart_and_checks_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload/image"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(server.uri());
    client
        .upload_image("depth_input.png", png_bytes())
        .await
        .expect("upload ok");
}
