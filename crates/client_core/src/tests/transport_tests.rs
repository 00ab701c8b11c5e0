use super::*;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header as http_header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

#[derive(Clone)]
struct ServerState {
    submitted: Arc<Mutex<Option<oneshot::Sender<SubmitAnswersRequest>>>>,
}

async fn handle_submit(
    State(state): State<ServerState>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Json<Value> {
    if let Some(tx) = state.submitted.lock().await.take() {
        let _ = tx.send(payload);
    }
    Json(json!({ "message": "Answers saved", "next": "q2" }))
}

async fn serve(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn spawn_submit_server() -> (String, oneshot::Receiver<SubmitAnswersRequest>) {
    let (tx, rx) = oneshot::channel();
    let state = ServerState {
        submitted: Arc::new(Mutex::new(Some(tx))),
    };
    let app = Router::new()
        .route(submit_answers_route(), post(handle_submit))
        .with_state(state);
    (serve(app).await, rx)
}

#[tokio::test]
async fn fetch_questions_decodes_step_name_as_next_flag() {
    let app = Router::new().route(
        get_questions_route(),
        get(|| async {
            Json(json!({
                "questions": ["Project title?", "Sponsoring agency?"],
                "variables": ["title", "agency"],
                "next": "q2"
            }))
        }),
    );
    let service = HttpFormService::new(&serve(app).await).expect("service");

    let batch = service.fetch_questions().await.expect("batch");

    assert_eq!(batch.variables, vec!["title".to_string(), "agency".to_string()]);
    assert!(batch.next);
}

#[tokio::test]
async fn fetch_questions_treats_null_next_as_final() {
    let app = Router::new().route(
        get_questions_route(),
        get(|| async { Json(json!({ "questions": [], "variables": [], "next": null })) }),
    );
    let service = HttpFormService::new(&serve(app).await).expect("service");

    let batch = service.fetch_questions().await.expect("batch");

    assert!(batch.is_empty());
    assert!(!batch.next);
}

#[tokio::test]
async fn submit_answers_posts_wrapped_answer_map() {
    let (url, rx) = spawn_submit_server().await;
    let service = HttpFormService::new(&url).expect("service");
    let mut answers = AnswerMap::new();
    answers.insert("name".into(), "Alice".into());

    let message = service.submit_answers(&answers).await.expect("submit");

    assert_eq!(message.as_deref(), Some("Answers saved"));
    let payload = rx.await.expect("payload");
    assert_eq!(payload.answers, answers);
}

#[tokio::test]
async fn server_error_maps_to_status_error() {
    let app = Router::new().route(
        submit_answers_route(),
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let service = HttpFormService::new(&serve(app).await).expect("service");

    let err = service
        .submit_answers(&AnswerMap::new())
        .await
        .expect_err("must fail");

    match err {
        TransportError::Status { route, status } => {
            assert_eq!(route, "/submit-answers");
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_batch_maps_to_decode_error() {
    let app = Router::new().route(get_questions_route(), get(|| async { "not json" }));
    let service = HttpFormService::new(&serve(app).await).expect("service");

    let err = service.fetch_questions().await.expect_err("must fail");

    assert!(matches!(err, TransportError::Decode { .. }));
}

#[tokio::test]
async fn acknowledgement_without_json_is_still_success() {
    let app = Router::new()
        .route(restart_route(), post(|| async { "restarted" }))
        .route(
            generate_docx_route(),
            post(|| async { Json(json!({ "message": "Word document generated" })) }),
        );
    let service = HttpFormService::new(&serve(app).await).expect("service");

    assert_eq!(service.restart().await.expect("restart"), None);
    assert_eq!(
        service.render_document().await.expect("render").as_deref(),
        Some("Word document generated")
    );
}

#[tokio::test]
async fn generate_json_requires_message_field() {
    let app = Router::new().route(
        generate_json_route(),
        post(|| async { Json(json!({ "filename": "PC1_Output.json" })) }),
    );
    let service = HttpFormService::new(&serve(app).await).expect("service");

    let err = service.generate_json().await.expect_err("must fail");

    assert!(matches!(err, TransportError::Decode { .. }));
}

#[tokio::test]
async fn download_returns_document_bytes() {
    let app = Router::new().route(
        download_docx_route(),
        get(|| async {
            (
                [(
                    http_header::CONTENT_TYPE,
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                )],
                b"PK\x03\x04rendered".to_vec(),
            )
                .into_response()
        }),
    );
    let service = HttpFormService::new(&serve(app).await).expect("service");

    let bytes = service.download_document().await.expect("download");

    assert_eq!(bytes, b"PK\x03\x04rendered");
}

#[tokio::test]
async fn download_json_error_body_is_a_service_error() {
    let app = Router::new().route(
        download_docx_route(),
        get(|| async {
            Json(json!({ "error": "Document not found. Please generate the document first." }))
        }),
    );
    let service = HttpFormService::new(&serve(app).await).expect("service");

    let err = service.download_document().await.expect_err("must fail");

    match err {
        TransportError::Service { route, message } => {
            assert_eq!(route, "/download-docx");
            assert!(message.starts_with("Document not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn download_json_content_type_is_matched_case_insensitively() {
    let app = Router::new().route(
        download_docx_route(),
        get(|| async {
            (
                [(http_header::CONTENT_TYPE, "Application/JSON; charset=UTF-8")],
                r#"{"error": "Document not found. Please generate the document first."}"#,
            )
        }),
    );
    let service = HttpFormService::new(&serve(app).await).expect("service");

    let err = service.download_document().await.expect_err("must fail");

    assert!(matches!(err, TransportError::Service { .. }));
}

#[tokio::test]
async fn empty_download_is_rejected() {
    let app = Router::new().route(
        download_docx_route(),
        get(|| async { ([(http_header::CONTENT_TYPE, "application/octet-stream")], Vec::<u8>::new()) }),
    );
    let service = HttpFormService::new(&serve(app).await).expect("service");

    let err = service.download_document().await.expect_err("must fail");

    assert!(matches!(err, TransportError::EmptyBody { .. }));
}

#[tokio::test]
async fn base_url_path_prefix_is_preserved() {
    let app = Router::new().nest(
        "/api",
        Router::new().route(
            get_questions_route(),
            get(|| async { Json(json!({ "questions": ["Name?"], "variables": ["name"], "next": false })) }),
        ),
    );
    let base = format!("{}/api", serve(app).await);
    let service = HttpFormService::new(&base).expect("service");

    assert_eq!(service.base_url().path(), "/api/");
    let batch = service.fetch_questions().await.expect("batch");
    assert_eq!(batch.questions, vec!["Name?".to_string()]);
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = HttpFormService::new("not a url").err().expect("must fail");
    assert!(matches!(err, TransportError::InvalidUrl { .. }));
}

#[tokio::test]
async fn unreachable_service_is_an_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let service = HttpFormService::new(&format!("http://{addr}")).expect("service");

    let err = service.fetch_questions().await.expect_err("must fail");

    assert!(matches!(err, TransportError::Http(_)));
}
