//! Upload a document, wait for indexing, ask about it and render the answer.

mod common;

use chat_client::extract::{analyze_message, ChartType, ReferenceKind, VisualizationKind};
use chat_client::services::document_client::FileUpload;
use chat_client::upload::{PollConfig, UploadStatus};
use chat_client::ClientError;
use serde_json::json;
use std::time::Duration;
use workflow_tests::status_body;

/// Flow: login → new conversation → upload → poll → ask → analyze reply
#[tokio::test]
async fn upload_then_ask_about_document() {
    let ctx = common::setup().await;
    let backend = &ctx.backend;

    backend
        .mount_new_conversation(common::TOKEN, "conv-42", "Vendas 2024")
        .await;
    backend.mount_processor_health(true).await;
    backend
        .mount_document(
            "doc-7",
            &[
                status_body("pending", None),
                status_body("processing", Some(35)),
                status_body("indexing", Some(85)),
                status_body("indexing", Some(95)),
                status_body("disponível", None),
            ],
        )
        .await;
    backend
        .mount_reply(
            "conv-42",
            "Segundo o documento vendas.xlsx, o faturamento foi:\n\n\
             | Mês | Total |\n|---|---|\n| 2024-01-01 | 120 |\n| 2024-02-01 | 135 |\n\n\
             Fonte: vendas.xlsx",
            json!([{"documentId": "doc-7", "documentName": "vendas.xlsx", "content": "jan 120", "score": 0.93}]),
        )
        .await;

    let conversation = ctx
        .state
        .chat
        .create_conversation("Vendas 2024")
        .await
        .expect("Conversation should be created with the login token");
    assert_eq!(conversation.id, "conv-42");

    let processed = ctx
        .processor
        .try_process_document(
            &FileUpload::new("vendas.xlsx", b"PK fake workbook".to_vec()),
            &conversation.id,
        )
        .await
        .expect("Document should be processed");

    assert_eq!(processed.document_id, "doc-7");
    assert_eq!(processed.poll.attempts, 5);
    assert_eq!(backend.hits("/api/documents/doc-7/status").await, 5);
    // Base interval until progress passes 80, then halved.
    assert_eq!(
        ctx.sleeper.delays()[..4],
        [
            Duration::from_secs(2),
            Duration::from_secs(2),
            Duration::from_secs(1),
            Duration::from_millis(500),
        ]
    );

    let reply = ctx
        .state
        .chat
        .send_message(&conversation.id, "Qual foi o faturamento?")
        .await
        .expect("Assistant should answer");
    assert_eq!(reply.sources.len(), 1);

    let insights = analyze_message(&reply.content);
    let visualization = insights.visualization.expect("table in reply");
    assert_eq!(visualization.kind, VisualizationKind::Table);
    assert_eq!(visualization.data[1]["Total"], json!(135));
    assert_eq!(insights.chart_type, Some(ChartType::Line));

    let kinds: Vec<ReferenceKind> = insights.references.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, vec![ReferenceKind::Cited, ReferenceKind::Source]);
    assert!(insights.references.iter().all(|r| r.name == "vendas.xlsx"));
}

/// Flow: upload → processor reports failure → session shows the error
#[tokio::test]
async fn failed_document_surfaces_processing_error() {
    let ctx = common::setup().await;
    ctx.backend.mount_processor_health(true).await;
    ctx.backend
        .mount_document(
            "doc-8",
            &[
                status_body("processing", Some(10)),
                json!({"status": "success", "data": {"document": {
                    "status": "error",
                    "processing_error": "Arquivo corrompido"
                }}}),
            ],
        )
        .await;

    let err = ctx
        .processor
        .try_process_document(&FileUpload::new("ruim.pdf", b"%PDF".to_vec()), "conv-1")
        .await
        .unwrap_err();

    match err {
        ClientError::Processing(message) => assert_eq!(message, "Arquivo corrompido"),
        other => panic!("unexpected error: {other:?}"),
    }
    let session = ctx.processor.session();
    assert_eq!(session.status, UploadStatus::Error);
    assert_eq!(session.document_id.as_deref(), Some("doc-8"));
}

/// Flow: processor down → nothing is uploaded
#[tokio::test]
async fn processor_down_blocks_upload() {
    let ctx = common::setup().await;
    ctx.backend.mount_processor_health(false).await;
    ctx.backend.mount_document("doc-9", &[status_body("completed", None)]).await;

    let outcome = ctx
        .processor
        .process_document(&FileUpload::new("a.pdf", b"%PDF".to_vec()), "conv-1")
        .await;

    assert!(!outcome.success);
    assert_eq!(ctx.backend.hits("/api/documents/upload").await, 0);
}

/// Flow: document never finishes → timeout after the attempt budget
#[tokio::test]
async fn slow_document_times_out() {
    let ctx = common::setup()
        .await
        .with_poll_config(PollConfig {
            max_attempts: 4,
            ..Default::default()
        });
    ctx.backend.mount_processor_health(true).await;
    ctx.backend
        .mount_document("doc-10", &[status_body("processing", Some(20))])
        .await;

    let err = ctx
        .processor
        .try_process_document(&FileUpload::new("grande.pdf", b"%PDF".to_vec()), "conv-1")
        .await
        .unwrap_err();

    match err {
        ClientError::Timeout { attempts, elapsed } => {
            assert_eq!(attempts, 4);
            assert_eq!(elapsed, Duration::from_secs(6));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Flow: session expires while polling → loop stops and credentials are dropped
#[tokio::test]
async fn expired_session_stops_polling() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    let ctx = common::setup().await;
    ctx.backend.mount_processor_health(true).await;
    ctx.backend.mount_document("doc-11", &[]).await;
    Mock::given(method("GET"))
        .and(path("/api/documents/doc-11/status"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .mount(&ctx.backend.server)
        .await;

    let err = ctx
        .processor
        .try_process_document(&FileUpload::new("a.pdf", b"%PDF".to_vec()), "conv-1")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized(_)));
    assert_eq!(ctx.backend.hits("/api/documents/doc-11/status").await, 1);
    assert!(!ctx.state.session.is_authenticated().await);
    assert!(ctx.store.snapshot().is_none());
}
