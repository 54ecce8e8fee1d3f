#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Form, Router,
    body::{Body, to_bytes},
    extract::State,
    http::{Request, StatusCode},
    routing::post,
};
use followiz_bridge::{
    bootstrap,
    config::{AppConfig, DatabaseConfig, ProviderConfig, ServerConfig},
    store::OrderStore,
};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt;

/// In-process stand-in for the Followiz API. Replies with a fixed JSON value and keeps
/// every form it receives.
#[derive(Clone)]
pub struct MockFollowiz {
    pub url: String,
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

#[derive(Clone)]
struct MockState {
    reply: Arc<String>,
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl MockFollowiz {
    pub async fn start(reply: Value) -> Self {
        Self::start_raw(reply.to_string()).await
    }

    /// Replies with `body` verbatim, which lets tests send non-JSON.
    pub async fn start_raw(body: String) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            reply: Arc::new(body),
            requests: requests.clone(),
        };

        let app = Router::new()
            .route("/api/v2", post(handle))
            .with_state(state);
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock");
        let addr = listener.local_addr().expect("mock addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server");
        });

        Self {
            url: format!("http://{}/api/v2", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.requests.lock().expect("lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("lock").len()
    }
}

async fn handle(
    State(state): State<MockState>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, String) {
    state.requests.lock().expect("lock").push(form);
    (StatusCode::OK, state.reply.as_ref().clone())
}

pub struct TestApp {
    pub app: Router,
    pub store: OrderStore,
    _dir: TempDir,
}

pub fn provider_config(api_url: &str, api_key: Option<&str>, service_id: Option<&str>) -> ProviderConfig {
    ProviderConfig {
        api_url: api_url.to_string(),
        api_key: api_key.map(str::to_string),
        service_id: service_id.map(str::to_string),
        timeout: Duration::from_secs(5),
        fallback_link: "https://fallback.example/profile".to_string(),
    }
}

/// Builds the real router against a fresh SQLite file.
pub async fn test_app(provider: ProviderConfig) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("orders.db").to_string_lossy().into_owned();

    let config = AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig { path: path.clone() },
        provider,
    };

    let app = bootstrap::build_app(config).await.expect("build app");
    TestApp {
        app,
        store: OrderStore::new(path),
        _dir: dir,
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}
