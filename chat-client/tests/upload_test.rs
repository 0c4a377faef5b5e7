mod common;

use chat_client::upload::{PollConfig, UploadStatus};
use chat_client::services::document_client::FileUpload;
use chat_client::ClientError;
use common::TestApp;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn sample_pdf() -> FileUpload {
    FileUpload::new("relatorio.pdf", b"%PDF-1.4 fake".to_vec())
}

async fn mock_upload(app: &TestApp) {
    app.mock_json(
        "POST",
        "/api/documents/upload",
        201,
        json!({"status": "success", "data": {"document": {"id": "doc-1", "status": "pending"}}}),
    )
    .await;
}

#[tokio::test]
async fn upload_polls_until_completed() {
    let app = TestApp::spawn().await;
    app.mock_healthy_processor().await;
    mock_upload(&app).await;

    Mock::given(method("GET"))
        .and(path("/api/documents/doc-1/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"status": "success", "data": {"status": "processing", "processing_progress": 30}}),
        ))
        .up_to_n_times(3)
        .mount(&app.server)
        .await;
    app.mock_json(
        "GET",
        "/api/documents/doc-1/status",
        200,
        json!({"status": "success", "data": {"status": "Concluído"}}),
    )
    .await;

    let processed = app
        .processor
        .try_process_document(&sample_pdf(), "conv-1")
        .await
        .expect("Processing should succeed");

    assert_eq!(processed.document_id, "doc-1");
    assert_eq!(processed.filename, "relatorio.pdf");
    assert!(processed.poll.success);
    assert_eq!(processed.poll.progress, 100);
    assert_eq!(processed.poll.attempts, 4);
    assert_eq!(app.requests_to("/api/documents/doc-1/status").await.len(), 4);
    assert_eq!(app.sleeper.delays(), vec![Duration::from_secs(2); 3]);

    let uploads = app.requests_to("/api/documents/upload").await;
    assert_eq!(uploads.len(), 1);
    let body = String::from_utf8_lossy(&uploads[0].body);
    assert!(body.contains("name=\"conversationId\""));
    assert!(body.contains("conv-1"));
    assert!(body.contains("filename=\"relatorio.pdf\""));
}

#[tokio::test]
async fn upload_sends_bearer_token() {
    let app = TestApp::spawn().await;
    app.mock_healthy_processor().await;

    Mock::given(method("POST"))
        .and(path("/api/documents/upload"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documentId": "doc-9"})))
        .expect(1)
        .mount(&app.server)
        .await;
    app.mock_json(
        "GET",
        "/api/documents/doc-9/status",
        200,
        json!({"status": "ready"}),
    )
    .await;

    let outcome = app.processor.process_document(&sample_pdf(), "conv-1").await;
    assert!(outcome.success);
    assert_eq!(outcome.document_id.as_deref(), Some("doc-9"));
}

#[tokio::test]
async fn session_returns_to_idle_after_completion() {
    let app = TestApp::spawn().await;
    app.mock_healthy_processor().await;
    mock_upload(&app).await;
    app.mock_json(
        "GET",
        "/api/documents/doc-1/status",
        200,
        json!({"data": {"status": "completed"}}),
    )
    .await;

    let mut updates = app.processor.subscribe();
    let outcome = app.processor.process_document(&sample_pdf(), "conv-1").await;
    assert!(outcome.success);

    tokio::time::timeout(Duration::from_secs(1), async {
        while updates.borrow_and_update().status != UploadStatus::Idle {
            updates.changed().await.unwrap();
        }
    })
    .await
    .expect("Session should reset to idle");
    assert!(app.sleeper.delays().contains(&Duration::from_secs(3)));
}

#[tokio::test]
async fn unavailable_processor_skips_upload() {
    let app = TestApp::spawn().await;
    app.mock_json(
        "GET",
        "/api/documents/processor-health",
        200,
        json!({"status": "success", "data": {"available": false}}),
    )
    .await;
    mock_upload(&app).await;

    let err = app
        .processor
        .try_process_document(&sample_pdf(), "conv-1")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::ProcessorUnavailable(_)));
    assert!(app.requests_to("/api/documents/upload").await.is_empty());
}

#[tokio::test]
async fn validation_happens_before_any_request() {
    let app = TestApp::spawn().await;

    let err = app
        .processor
        .try_process_document(&FileUpload::new("empty.pdf", Vec::new()), "conv-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));

    let outcome = app.processor.process_document(&sample_pdf(), "  ").await;
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("Conversation id is required"));

    assert!(app.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_document_id_fails_the_session() {
    let app = TestApp::spawn().await;
    app.mock_healthy_processor().await;
    app.mock_json(
        "POST",
        "/api/documents/upload",
        200,
        json!({"status": "success", "data": {"filename": "relatorio.pdf"}}),
    )
    .await;

    let err = app
        .processor
        .try_process_document(&sample_pdf(), "conv-1")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::MissingDocumentId));
    assert_eq!(app.processor.session().status, UploadStatus::Error);
}

#[tokio::test]
async fn failed_processing_reports_backend_error() {
    let app = TestApp::spawn().await;
    app.mock_healthy_processor().await;
    mock_upload(&app).await;
    app.mock_json(
        "GET",
        "/api/documents/doc-1/status",
        200,
        json!({"status": "success", "data": {"status": "falha", "processing_error": "PDF protegido"}}),
    )
    .await;

    let outcome = app.processor.process_document(&sample_pdf(), "conv-1").await;

    assert!(!outcome.success);
    assert_eq!(outcome.document_id.as_deref(), Some("doc-1"));
    assert!(outcome.error.unwrap().contains("PDF protegido"));
}

#[tokio::test]
async fn polling_gives_up_after_max_attempts() {
    let app = TestApp::spawn_with(PollConfig {
        max_attempts: 3,
        ..Default::default()
    })
    .await;
    app.mock_healthy_processor().await;
    mock_upload(&app).await;
    app.mock_json(
        "GET",
        "/api/documents/doc-1/status",
        200,
        json!({"data": {"status": "processing"}}),
    )
    .await;

    let err = app
        .processor
        .try_process_document(&sample_pdf(), "conv-1")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Timeout { attempts: 3, .. }));
    assert_eq!(app.requests_to("/api/documents/doc-1/status").await.len(), 3);
}

#[tokio::test]
async fn status_errors_are_retried() {
    let app = TestApp::spawn().await;
    app.mock_healthy_processor().await;
    mock_upload(&app).await;

    Mock::given(method("GET"))
        .and(path("/api/documents/doc-1/status"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&app.server)
        .await;
    app.mock_json(
        "GET",
        "/api/documents/doc-1/status",
        200,
        json!({"status": "success", "data": {"status": "available"}}),
    )
    .await;

    let processed = app
        .processor
        .try_process_document(&sample_pdf(), "conv-1")
        .await
        .unwrap();
    assert_eq!(processed.poll.attempts, 3);
}

#[tokio::test]
async fn concurrent_uploads_do_not_interfere() {
    let app = TestApp::spawn().await;
    app.mock_healthy_processor().await;

    // The first upload is still in flight when the second one starts.
    Mock::given(method("POST"))
        .and(path("/api/documents/upload"))
        .and(body_string_contains("filename=\"vendas.pdf\""))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"data": {"documentId": "doc-a"}}))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&app.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/documents/upload"))
        .and(body_string_contains("filename=\"custos.pdf\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"documentId": "doc-b"}})))
        .mount(&app.server)
        .await;
    app.mock_json(
        "GET",
        "/api/documents/doc-a/status",
        200,
        json!({"data": {"status": "erro", "processing_error": "Planilha vazia"}}),
    )
    .await;
    app.mock_json(
        "GET",
        "/api/documents/doc-b/status",
        200,
        json!({"data": {"status": "completed"}}),
    )
    .await;

    let first = FileUpload::new("vendas.pdf", b"%PDF a".to_vec());
    let second = FileUpload::new("custos.pdf", b"%PDF b".to_vec());
    let (first, second) = tokio::join!(
        app.processor.process_document(&first, "conv-1"),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            app.processor.process_document(&second, "conv-1").await
        }
    );

    assert!(!first.success);
    assert_eq!(first.document_id.as_deref(), Some("doc-a"));
    assert!(first.error.unwrap().contains("Planilha vazia"));

    assert!(second.success);
    assert_eq!(second.document_id.as_deref(), Some("doc-b"));

    assert_eq!(app.requests_to("/api/documents/doc-a/status").await.len(), 1);
    assert_eq!(app.requests_to("/api/documents/doc-b/status").await.len(), 1);
}

#[tokio::test]
async fn cancel_during_upload_returns_to_idle() {
    let app = TestApp::spawn().await;
    app.mock_healthy_processor().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/upload"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"data": {"documentId": "doc-1"}}))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&app.server)
        .await;
    app.mock_json(
        "GET",
        "/api/documents/doc-1/status",
        200,
        json!({"data": {"status": "completed"}}),
    )
    .await;

    let mut updates = app.processor.subscribe();
    let file = sample_pdf();
    let (result, cancelled) = tokio::join!(
        app.processor.try_process_document(&file, "conv-1"),
        async {
            while updates.borrow_and_update().status != UploadStatus::Uploading {
                updates.changed().await.unwrap();
            }
            app.processor.cancel()
        }
    );

    assert!(cancelled);
    assert!(matches!(result, Err(ClientError::Cancelled)));
    assert_eq!(app.processor.session().status, UploadStatus::Idle);
    assert_eq!(app.processor.session().document_id, None);

    // The upload itself was left to finish; polling never started.
    assert_eq!(app.requests_to("/api/documents/upload").await.len(), 1);
    assert!(app.requests_to("/api/documents/doc-1/status").await.is_empty());
}

#[tokio::test]
async fn cancel_is_ignored_once_completed() {
    let app = TestApp::spawn().await;
    app.mock_healthy_processor().await;
    mock_upload(&app).await;
    app.mock_json(
        "GET",
        "/api/documents/doc-1/status",
        200,
        json!({"data": {"status": "completed"}}),
    )
    .await;

    let outcome = app.processor.process_document(&sample_pdf(), "conv-1").await;
    assert!(outcome.success);

    assert!(!app.processor.cancel());
    assert_eq!(app.processor.session().status, UploadStatus::Completed);
}
