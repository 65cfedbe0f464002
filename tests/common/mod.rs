#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use rightsdesk::config::ServerConfig;
use rightsdesk::identity::{bootstrap_admin, issue_token};
use rightsdesk::server::{AppState, create_router};
use rightsdesk::store::SqliteStore;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@label.test";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const MANAGER_PASSWORD: &str = "manager-password";

const BOUNDARY: &str = "rightsdesk-test-boundary";

/// An in-process server over a fresh database with one admin.
pub struct TestApp {
    pub temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    pub admin_token: String,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config = ServerConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..ServerConfig::default()
        };

        let store = SqliteStore::new(config.db_path()).expect("open store");
        store.initialize().expect("initialize store");

        let admin = bootstrap_admin(&store, ADMIN_EMAIL, ADMIN_PASSWORD, Some("admin"))
            .expect("bootstrap admin")
            .expect("first admin");
        let (_token, admin_token) = issue_token(&store, admin.id, None).expect("issue token");

        let store = Arc::new(store);
        let router = create_router(Arc::new(AppState::new(store.clone(), &config)));

        Self {
            temp_dir,
            store,
            admin_token,
            router,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn post_empty(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), None).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Creates a manager through the admin API and returns a login token.
    pub async fn manager_token(&self, email: &str) -> String {
        let (status, _) = self
            .post(
                "/api/v1/admin/managers",
                &self.admin_token,
                json!({ "email": email, "password": MANAGER_PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.login(email, MANAGER_PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    /// Uploads a report as a multipart form.
    pub async fn upload_report(
        &self,
        token: &str,
        file_name: &str,
        content: &[u8],
        description: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
        if let Some(description) = description {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\n{description}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/reports")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("build request");

        self.send(request).await
    }
}

pub fn person(email: &str) -> Value {
    json!({
        "last_name": "Ivanova",
        "first_name": "Maria",
        "email": email,
    })
}

pub fn album(title: &str) -> Value {
    json!({ "title": title, "type": "single" })
}

pub fn id_of(body: &Value) -> i64 {
    body["data"]["id"].as_i64().expect("id in response")
}
