pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::archive::handlers as candidates;
use crate::documents::MAX_DOCUMENT_BYTES;
use crate::interview::handlers as session;
use crate::state::AppState;

/// Headroom over the document limit for multipart framing, so oversized files
/// reach the extractor and get a precise error.
const UPLOAD_BODY_LIMIT: usize = MAX_DOCUMENT_BYTES + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview session
        .route("/api/v1/session", get(session::handle_get_session))
        .route("/api/v1/session/saved", get(session::handle_get_saved))
        .route(
            "/api/v1/session/upload",
            post(session::handle_upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/v1/session/info", post(session::handle_submit_info))
        .route("/api/v1/session/draft", put(session::handle_update_draft))
        .route("/api/v1/session/answer", post(session::handle_submit_answer))
        .route("/api/v1/session/resume", post(session::handle_resume))
        .route("/api/v1/session/reset", post(session::handle_reset))
        // Completed candidates
        .route("/api/v1/candidates", get(candidates::handle_list_candidates))
        .route(
            "/api/v1/candidates/stats",
            get(candidates::handle_candidate_stats),
        )
        .route("/api/v1/candidates/:id", get(candidates::handle_get_candidate))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::interview::orchestrator::TierLimits;
    use crate::interview::testing::{ScriptedProvider, StaticExtractor};
    use crate::interview::{InterviewConfig, SessionController};
    use crate::store::MemoryStore;

    fn app() -> Router {
        let controller = SessionController::new(
            Arc::new(ScriptedProvider::new()),
            Arc::new(StaticExtractor::new("Ada Lovelace\nada@example.com\n555-0100")),
            Arc::new(MemoryStore::new()),
            InterviewConfig::default(),
        );
        let config = Config {
            anthropic_api_key: "test-key".to_string(),
            redis_url: None,
            data_dir: None,
            port: 0,
            rust_log: "info".to_string(),
            tier_limits: TierLimits::default(),
            llm_max_attempts: 1,
        };
        build_router(AppState { controller, config })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "memory");
    }

    #[tokio::test]
    async fn test_fresh_session_is_in_upload() {
        let (status, body) = send(&app(), Method::GET, "/api/v1/session", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "upload");
        assert_eq!(body["busy"], false);

        let (_, saved) = send(&app(), Method::GET, "/api/v1/session/saved", None).await;
        assert_eq!(saved["saved"], Value::Null);
    }

    #[tokio::test]
    async fn test_manual_info_validation_and_interview_flow() {
        let app = app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/session/info",
            Some(json!({"name": "Ada", "email": "nope", "phone": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["missing_fields"], json!(["valid_email", "phone"]));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/session/info",
            Some(json!({"name": "Ada", "email": "ada@example.com", "phone": "555-0100"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "interviewing");
        assert_eq!(body["question"]["question_number"], 1);
        assert_eq!(body["question"]["time_display"], "0:45");

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/v1/session/draft",
            Some(json!({"text": "Hooks let"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/session/answer",
            Some(json!({"answer": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/session/answer",
            Some(json!({"answer": "Hooks let function components hold state."})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["progress"]["answered"], 1);
        assert_eq!(body["question"]["question_number"], 2);

        let (_, saved) = send(&app, Method::GET, "/api/v1/session/saved", None).await;
        assert_eq!(saved["saved"]["question_number"], 2);

        let (status, body) = send(&app, Method::POST, "/api/v1/session/reset", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["phase"], "upload");
    }

    #[tokio::test]
    async fn test_answer_outside_interview_is_conflict() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/v1/session/answer",
            Some(json!({"answer": "early"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_resume_without_saved_session_is_not_found() {
        let (status, _) = send(&app(), Method::POST, "/api/v1/session/resume", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_multipart_upload() {
        let app = app();
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"cv.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n%PDF-1.4 fake\r\n--{boundary}--\r\n"
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/session/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["phase"], "interviewing");
        assert_eq!(body["candidate"]["name"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_candidate_endpoints_on_empty_archive() {
        let app = app();

        let (status, body) = send(&app, Method::GET, "/api/v1/candidates?sort=name-asc&q=ada", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));

        let (status, body) = send(&app, Method::GET, "/api/v1/candidates/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_candidates"], 0);

        let uri = format!("/api/v1/candidates/{}", uuid::Uuid::new_v4());
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
