//! Thesis Review Server
//!
//! HTTP API for thesis submission and peer review. Authors submit
//! theses with an optional document upload, experts score the theses
//! assigned to them, and an assignment pass distributes pending theses
//! across the expert pool.
//!
//! State lives in an embedded SQLite database plus a local directory
//! for uploaded documents.

mod error;
mod extractors;
mod handlers;
mod services;
mod storage;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use services::{AssignmentService, AuthService, ReviewService, ThesisService};
use storage::{Database, UploadStore};

/// Request bodies (and therefore uploads) are capped at 16 MiB
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub uploads: Arc<UploadStore>,
    pub auth_service: Arc<AuthService>,
    pub thesis_service: Arc<ThesisService>,
    pub review_service: Arc<ReviewService>,
    pub assignment_service: Arc<AssignmentService>,
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Thesis Review Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    let config = Config::from_env();
    info!("Config: bind={}, db={}", config.bind_address, config.database_path);

    let db = Arc::new(
        Database::new(&config.database_path)
            .await
            .context("Failed to initialize database")?,
    );
    let uploads = Arc::new(
        UploadStore::new(&config.upload_dir)
            .await
            .context("Failed to initialize upload storage")?,
    );

    let state = build_state(db, uploads, config.jwt_secret);
    let app = build_router(state);

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_address))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn build_state(db: Arc<Database>, uploads: Arc<UploadStore>, jwt_secret: String) -> AppState {
    let auth_service = Arc::new(AuthService::new(db.clone(), jwt_secret));
    let thesis_service = Arc::new(ThesisService::new(db.clone()));
    let review_service = Arc::new(ReviewService::new(db.clone()));
    let assignment_service = Arc::new(AssignmentService::new(db.clone()));

    AppState {
        db,
        uploads,
        auth_service,
        thesis_service,
        review_service,
        assignment_service,
    }
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::index))
        .nest("/api", api_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/test", get(handlers::health::test))
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/thesis", get(handlers::thesis::list).post(handlers::thesis::create))
        .route("/thesis/:id", get(handlers::thesis::detail))
        .route("/thesis/:id/review", post(handlers::reviews::submit))
        .route("/assign-thesis", post(handlers::assignment::assign))
        .route("/stats", get(handlers::stats::stats))
        .route("/uploads/:filename", get(handlers::uploads::download))
}

#[derive(Debug, Clone)]
struct Config {
    bind_address: String,
    database_path: String,
    upload_dir: String,
    jwt_secret: String,
}

impl Config {
    fn from_env() -> Self {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:5000".to_string());
        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "data/thesis.db".to_string());
        let upload_dir =
            std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "data/uploads".to_string());
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using the insecure development default");
            "thesis-dev-secret-change-me".to_string()
        });

        Self {
            bind_address,
            database_path,
            upload_dir,
            jwt_secret,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    async fn test_app() -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(Database::in_memory().await.unwrap());
        let uploads = Arc::new(UploadStore::new(dir.path()).await.unwrap());
        let state = build_state(db, uploads, "test-secret".to_string());
        (build_router(state), dir)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    const BOUNDARY: &str = "thesis-test-boundary";

    fn push_text_field(body: &mut Vec<u8>, name: &str, value: &str) {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }

    fn multipart_request(
        token: &str,
        title: &str,
        content: &str,
        file: Option<(&str, &[u8])>,
    ) -> Request<Body> {
        let mut body = Vec::new();
        push_text_field(&mut body, "title", title);
        push_text_field(&mut body, "content", content);
        if let Some((filename, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/thesis")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn register(app: &Router, username: &str, is_expert: bool) {
        let req = json_request(
            "POST",
            "/api/register",
            None,
            json!({
                "username": username,
                "password": "secret123",
                "confirmPassword": "secret123",
                "is_expert": is_expert,
            }),
        );
        let (status, _) = send(app, req).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn login(app: &Router, username: &str) -> String {
        let req = json_request(
            "POST",
            "/api/login",
            None,
            json!({ "username": username, "password": "secret123" }),
        );
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_thesis(app: &Router, token: &str, title: &str) -> i64 {
        let (status, body) = send(app, multipart_request(token, title, "Full text", None)).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_banner_and_liveness() {
        let (app, _dir) = test_app().await;

        let (status, body) = send(&app, get_request("/", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
        assert!(body["endpoints"].is_object());

        let (status, body) = send(&app, get_request("/api/test", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "API is working!");
    }

    #[tokio::test]
    async fn test_register_and_login_flow() {
        let (app, _dir) = test_app().await;

        register(&app, "alice", false).await;
        let token = login(&app, "alice").await;
        assert!(!token.is_empty());

        let req = json_request(
            "POST",
            "/api/login",
            None,
            json!({ "username": "alice", "password": "wrong" }),
        );
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid username or password");
    }

    #[tokio::test]
    async fn test_login_response_carries_user_info() {
        let (app, _dir) = test_app().await;
        register(&app, "carol", true).await;

        let req = json_request(
            "POST",
            "/api/login",
            None,
            json!({ "username": "carol", "password": "secret123" }),
        );
        let (_, body) = send(&app, req).await;
        assert_eq!(body["user"]["username"], "carol");
        assert_eq!(body["user"]["is_expert"], true);
        assert!(body["user"]["id"].is_i64());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let (app, _dir) = test_app().await;
        register(&app, "alice", false).await;

        let req = json_request(
            "POST",
            "/api/register",
            None,
            json!({
                "username": "alice",
                "password": "other",
                "confirmPassword": "other",
            }),
        );
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "username already exists");
    }

    #[tokio::test]
    async fn test_password_mismatch_rejected() {
        let (app, _dir) = test_app().await;

        let req = json_request(
            "POST",
            "/api/register",
            None,
            json!({
                "username": "alice",
                "password": "one",
                "confirmPassword": "two",
            }),
        );
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "passwords do not match");

        // Nothing was created
        let req = json_request(
            "POST",
            "/api/login",
            None,
            json!({ "username": "alice", "password": "one" }),
        );
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let (app, _dir) = test_app().await;

        for uri in ["/api/thesis", "/api/stats", "/api/thesis/1"] {
            let (status, body) = send(&app, get_request(uri, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert!(body["error"].is_string(), "{uri}");
        }

        let (status, _) = send(&app, get_request("/api/thesis", Some("garbage"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_and_fetch_thesis() {
        let (app, _dir) = test_app().await;
        register(&app, "alice", false).await;
        let token = login(&app, "alice").await;

        let id = create_thesis(&app, &token, "A Study of Things").await;

        let (status, body) = send(&app, get_request(&format!("/api/thesis/{id}"), Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "A Study of Things");
        assert_eq!(body["author"], "alice");
        assert_eq!(body["status"], "pending");
        assert_eq!(body["average_score"].as_f64().unwrap(), 0.0);
        assert_eq!(body["reviews"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_detail_of_unknown_thesis_is_404() {
        let (app, _dir) = test_app().await;
        register(&app, "alice", false).await;
        let token = login(&app, "alice").await;

        let (status, _) = send(&app, get_request("/api/thesis/999", Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_title_rejected() {
        let (app, _dir) = test_app().await;
        register(&app, "alice", false).await;
        let token = login(&app, "alice").await;

        let (status, body) = send(&app, multipart_request(&token, "", "content", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "title is required");
    }

    #[tokio::test]
    async fn test_listing_with_search_and_status() {
        let (app, _dir) = test_app().await;
        register(&app, "alice", false).await;
        let token = login(&app, "alice").await;
        create_thesis(&app, &token, "Neural Networks").await;
        create_thesis(&app, &token, "Graph Theory").await;

        let (status, body) = send(&app, get_request("/api/thesis", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, body) = send(&app, get_request("/api/thesis?search=NEURAL", Some(&token))).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["title"], "Neural Networks");

        let (_, body) = send(&app, get_request("/api/thesis?status=completed", Some(&token))).await;
        assert_eq!(body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_review_flow_completes_thesis() {
        let (app, _dir) = test_app().await;
        register(&app, "author", false).await;
        for name in ["r1", "r2", "r3"] {
            register(&app, name, true).await;
        }
        let author_token = login(&app, "author").await;
        let id = create_thesis(&app, &author_token, "Reviewed Work").await;

        for (name, score) in [("r1", 80), ("r2", 85)] {
            let token = login(&app, name).await;
            let req = json_request(
                "POST",
                &format!("/api/thesis/{id}/review"),
                Some(&token),
                json!({ "score": score, "comments": "fine" }),
            );
            let (status, _) = send(&app, req).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, body) = send(&app, get_request(&format!("/api/thesis/{id}"), Some(&author_token))).await;
        assert_eq!(body["status"], "pending");

        let token = login(&app, "r3").await;
        let req = json_request(
            "POST",
            &format!("/api/thesis/{id}/review"),
            Some(&token),
            json!({ "score": 90 }),
        );
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = send(&app, get_request(&format!("/api/thesis/{id}"), Some(&author_token))).await;
        assert_eq!(body["status"], "completed");
        assert_eq!(body["average_score"].as_f64().unwrap(), 85.0);
        assert_eq!(body["reviews"].as_array().unwrap().len(), 3);

        // A second submission from the same reviewer is rejected
        let req = json_request(
            "POST",
            &format!("/api/thesis/{id}/review"),
            Some(&token),
            json!({ "score": 10 }),
        );
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "you have already reviewed this thesis");
    }

    #[tokio::test]
    async fn test_review_of_unknown_thesis_is_404() {
        let (app, _dir) = test_app().await;
        register(&app, "r1", true).await;
        let token = login(&app, "r1").await;

        let req = json_request(
            "POST",
            "/api/thesis/999/review",
            Some(&token),
            json!({ "score": 80 }),
        );
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_assignment_fills_slots_and_gates_visibility() {
        let (app, _dir) = test_app().await;
        register(&app, "author", false).await;
        for name in ["e1", "e2", "e3", "e4"] {
            register(&app, name, true).await;
        }
        let author_token = login(&app, "author").await;
        let id = create_thesis(&app, &author_token, "Distributed Work").await;

        // Experts see nothing before assignment
        let e1_token = login(&app, "e1").await;
        let (_, body) = send(&app, get_request("/api/thesis", Some(&e1_token))).await;
        assert_eq!(body.as_array().unwrap().len(), 0);

        let req = json_request("POST", "/api/assign-thesis", Some(&author_token), json!({}));
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["assigned"], 3);

        // Running it again changes nothing
        let req = json_request("POST", "/api/assign-thesis", Some(&author_token), json!({}));
        let (_, body) = send(&app, req).await;
        assert_eq!(body["assigned"], 0);

        let (_, body) = send(&app, get_request(&format!("/api/thesis/{id}"), Some(&author_token))).await;
        let reviews = body["reviews"].as_array().unwrap();
        assert_eq!(reviews.len(), 3);
        assert!(reviews.iter().all(|r| r["score"].is_null()));

        // Exactly the assigned experts now see the thesis
        let mut visible = 0;
        for name in ["e1", "e2", "e3", "e4"] {
            let token = login(&app, name).await;
            let (_, body) = send(&app, get_request("/api/thesis", Some(&token))).await;
            visible += body.as_array().unwrap().len();
        }
        assert_eq!(visible, 3);
    }

    #[tokio::test]
    async fn test_stats_uses_legacy_field_names() {
        let (app, _dir) = test_app().await;
        register(&app, "alice", false).await;
        let token = login(&app, "alice").await;
        create_thesis(&app, &token, "One").await;
        create_thesis(&app, &token, "Two").await;

        let (status, body) = send(&app, get_request("/api/stats", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_thesis"], 2);
        assert_eq!(body["completed_reviews"], 0);
        assert_eq!(body["pending_reviews"], 2);
    }

    #[tokio::test]
    async fn test_upload_roundtrip() {
        let (app, _dir) = test_app().await;
        register(&app, "alice", false).await;
        let token = login(&app, "alice").await;

        let req = multipart_request(&token, "With File", "text", Some(("draft.pdf", b"%PDF-1.4 body")));
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_i64().unwrap();

        let (_, body) = send(&app, get_request(&format!("/api/thesis/{id}"), Some(&token))).await;
        let stored = body["file_path"].as_str().unwrap().to_string();
        assert!(stored.ends_with("_draft.pdf"));

        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/uploads/{stored}"), Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.4 body");

        let (status, _) = send(&app, get_request("/api/uploads/missing.pdf", Some(&token))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, get_request(&format!("/api/uploads/{stored}"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_empty_file_part_counts_as_absent() {
        let (app, _dir) = test_app().await;
        register(&app, "alice", false).await;
        let token = login(&app, "alice").await;

        // A file input left empty submits a nameless zero-byte part
        let mut body = Vec::new();
        push_text_field(&mut body, "title", "No Attachment");
        push_text_field(&mut body, "content", "text");
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"\"\r\nContent-Type: application/octet-stream\r\n\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri("/api/thesis")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_i64().unwrap();

        let (_, body) = send(&app, get_request(&format!("/api/thesis/{id}"), Some(&token))).await;
        assert!(body["file_path"].is_null());
    }

    #[tokio::test]
    async fn test_disallowed_upload_extension_rejected() {
        let (app, _dir) = test_app().await;
        register(&app, "alice", false).await;
        let token = login(&app, "alice").await;

        let req = multipart_request(&token, "Sneaky", "text", Some(("payload.exe", b"MZ")));
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "file type not allowed");
    }
}
