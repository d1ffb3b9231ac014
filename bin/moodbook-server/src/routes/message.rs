//! Guestbook message routes.
//!
//! - `POST /message` – classify and store `{name, email, message}`.
//! - `GET  /message` – the stored log, newest first.
//!
//! Sub-paths under `/message/` are served by the same handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use moodbook_core::{Entry, NewMessage};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::ServerError;
use crate::state::AppState;

/// Register message routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/message", get(list_messages).post(store_message))
        .route("/message/{*rest}", get(list_messages).post(store_message))
}

/// Store a submitted message (`POST /message`).
///
/// The body is decoded as JSON whatever its declared content type; the
/// only validation is that it decodes into the expected object.
/// Storage failures report whether the log could not be read or written.
pub async fn store_message(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>, ServerError> {
    let submitted = NewMessage::from_json(&body).map_err(|e| {
        debug!(error = %e, "rejecting undecodable message body");
        ServerError::BadRequest("Invalid JSON request".into())
    })?;

    state.log.append(submitted).await.map_err(|e| {
        let message = if e.is_read_failure() {
            "Failed to fetch messages"
        } else {
            "Failed to store message"
        };
        ServerError::storage(message)(e)
    })?;

    Ok(Json(json!({ "message": "Message stored successfully" })))
}

/// List stored messages, newest first (`GET /message`).
pub async fn list_messages(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Entry>>, ServerError> {
    let entries = state
        .log
        .list()
        .await
        .map_err(ServerError::storage("Failed to retrieve messages"))?;
    Ok(Json(entries))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicI64, Ordering};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use moodbook_core::{
        BlobStore, Classifier, Clock, Emotion, InMemoryBlobStore, MessageLog, Precondition, StoreError,
        VersionedBlob, WriteMode,
    };
    use tower::ServiceExt;
    use tracing_test::traced_test;

    use crate::config::{Config, StoreBackend};
    use crate::routes;
    use crate::state::AppState;

    use super::*;

    struct FixedClassifier(Emotion);

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _text: &str) -> Emotion {
            self.0
        }
    }

    struct StepClock(AtomicI64);

    impl Clock for StepClock {
        fn now(&self) -> i64 {
            self.0.fetch_add(1, Ordering::SeqCst)
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl BlobStore for BrokenStore {
        async fn fetch(&self, key: &str) -> Result<Option<VersionedBlob>, StoreError> {
            Err(StoreError::Backend {
                operation: "fetch",
                key: key.to_owned(),
                message: "secret-bucket: access denied".into(),
            })
        }

        async fn replace(&self, key: &str, _bytes: Bytes, _p: Precondition) -> Result<(), StoreError> {
            Err(StoreError::Backend {
                operation: "replace",
                key: key.to_owned(),
                message: "secret-bucket: access denied".into(),
            })
        }
    }

    /// Reads succeed (empty log) but every write is refused.
    struct ReadOnlyStore;

    #[async_trait]
    impl BlobStore for ReadOnlyStore {
        async fn fetch(&self, _key: &str) -> Result<Option<VersionedBlob>, StoreError> {
            Ok(None)
        }

        async fn replace(&self, key: &str, _bytes: Bytes, _p: Precondition) -> Result<(), StoreError> {
            Err(StoreError::Backend {
                operation: "replace",
                key: key.to_owned(),
                message: "read-only bucket".into(),
            })
        }
    }

    fn test_config() -> Config {
        Config {
            bind_address: "127.0.0.1:0".into(),
            store: StoreBackend::Memory,
            messages_key: "messages.json".into(),
            classifier: Default::default(),
            write_mode: WriteMode::LastWriterWins,
            write_attempts: 5,
            log_level: "info".into(),
            log_json: false,
        }
    }

    fn app_with(store: Arc<dyn BlobStore>, emotion: Emotion) -> Router {
        let log = MessageLog::new(store, Arc::new(FixedClassifier(emotion)), "messages.json")
            .with_clock(Arc::new(StepClock(AtomicI64::new(1_700_000_000))));
        routes::build(Arc::new(AppState {
            config: Arc::new(test_config()),
            log: Arc::new(log),
        }))
    }

    fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_cors(response: &Response) {
        let h = response.headers();
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    }

    #[tokio::test]
    async fn submit_then_list() {
        let app = app_with(Arc::new(InMemoryBlobStore::new()), Emotion::Happy);

        let body = json!({ "name": "A", "email": "a@x.com", "message": "I am so happy today" });
        let response = app.clone().oneshot(post("/message", body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        assert_eq!(json_body(response).await["message"], "Message stored successfully");

        let response = app.oneshot(get_req("/message")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);

        let listed = json_body(response).await;
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["name"], "A");
        assert_eq!(listed[0]["email"], "a@x.com");
        assert_eq!(listed[0]["message"], "I am so happy today");
        assert_eq!(listed[0]["emotion_type"], "happy");
        assert_eq!(listed[0]["time"], 1_700_000_000_i64);
        assert!(listed[0]["id"].is_string());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_capped() {
        let app = app_with(Arc::new(InMemoryBlobStore::new()), Emotion::Calm);

        for i in 0..25 {
            let body = json!({ "name": "n", "email": "e", "message": format!("m{i}") });
            let response = app.clone().oneshot(post("/message", body.to_string())).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let listed = json_body(app.oneshot(get_req("/message")).await.unwrap()).await;
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 20);
        assert_eq!(listed[0]["message"], "m24");
        assert_eq!(listed[19]["message"], "m5");
        let times: Vec<i64> = listed.iter().map(|e| e["time"].as_i64().unwrap()).collect();
        assert!(times.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn first_list_is_empty_array() {
        let app = app_with(Arc::new(InMemoryBlobStore::new()), Emotion::Calm);
        let response = app.oneshot(get_req("/message")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!([]));
    }

    #[tokio::test]
    async fn undecodable_body_is_client_error() {
        let app = app_with(Arc::new(InMemoryBlobStore::new()), Emotion::Calm);
        let response = app.oneshot(post("/message", "name=A")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_cors(&response);
        assert_eq!(json_body(response).await["error"], "Invalid JSON request");
    }

    #[tokio::test]
    async fn array_body_is_client_error() {
        let app = app_with(Arc::new(InMemoryBlobStore::new()), Emotion::Calm);

        for body in ["[]", r#"["A","a@x.com","hi"]"#] {
            let response = app.clone().oneshot(post("/message", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(response).await["error"], "Invalid JSON request");
        }

        let listed = json_body(app.oneshot(get_req("/message")).await.unwrap()).await;
        assert_eq!(listed, json!([]));
    }

    #[tokio::test]
    async fn body_is_decoded_without_content_type() {
        let app = app_with(Arc::new(InMemoryBlobStore::new()), Emotion::Calm);
        let request = Request::post("/message")
            .body(Body::from(r#"{"name":"A","email":"a@x.com","message":"hi"}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_routes_are_client_errors() {
        let app = app_with(Arc::new(InMemoryBlobStore::new()), Emotion::Calm);

        let response = app.clone().oneshot(get_req("/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_cors(&response);
        assert_eq!(json_body(response).await["error"], "Invalid route");

        let delete = Request::delete("/message").body(Body::empty()).unwrap();
        let response = app.oneshot(delete).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sub_paths_share_the_handlers() {
        let app = app_with(Arc::new(InMemoryBlobStore::new()), Emotion::Calm);
        let response = app.oneshot(get_req("/message/latest")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn preflight_is_answered() {
        let app = app_with(Arc::new(InMemoryBlobStore::new()), Emotion::Calm);
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/message")
            .header(header::ORIGIN, "https://example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
    }

    #[tokio::test]
    #[traced_test]
    async fn storage_failure_is_server_error_without_detail() {
        let app = app_with(Arc::new(BrokenStore), Emotion::Calm);

        let body = json!({ "name": "A", "email": "a@x.com", "message": "hi" });
        let response = app.clone().oneshot(post("/message", body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        let text = json_body(response).await.to_string();
        assert!(text.contains("Failed to fetch messages"));
        assert!(!text.contains("secret-bucket"));
        assert!(logs_contain("secret-bucket"));

        let response = app.oneshot(get_req("/message")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "Failed to retrieve messages");
    }

    #[tokio::test]
    async fn write_failure_reports_store_message() {
        let app = app_with(Arc::new(ReadOnlyStore), Emotion::Calm);
        let body = json!({ "name": "A", "email": "a@x.com", "message": "hi" });
        let response = app.oneshot(post("/message", body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "Failed to store message");
    }

    #[tokio::test]
    async fn trace_id_is_echoed() {
        let app = app_with(Arc::new(InMemoryBlobStore::new()), Emotion::Calm);
        let id = "6f1d4a52-3c9e-4a8e-9f0a-2b6f6d1c2e7a";
        let request = Request::get("/health").header("x-trace-id", id).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-trace-id"], id);
        assert_eq!(json_body(response).await["status"], "ok");
    }
}
