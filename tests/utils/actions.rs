#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use super::setup::TestSetup;

const BOUNDARY: &str = "integration-boundary";

/// Smallest valid PNG: a 1x1 transparent pixel
pub const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Buffered response, so assertions can look at it more than once
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    /// The session token carried by a `Set-Cookie` header, if any
    pub fn session_token(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|cookie| cookie.split(';').next())
            .and_then(|pair| pair.strip_prefix("token="))
            .map(str::to_string)
    }
}

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Run one request through the full router
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// GET with an optional session token
    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("token={}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    /// Register a user with valid contact details
    pub async fn register(&self, username: &str, password: &str) -> TestResponse {
        self.post_json(
            "/register",
            json!({
                "username": username,
                "password": password,
                "email": format!("{}@example.com", username),
                "phone": "0912345678",
                "address": "Bole"
            }),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.post_json(
            "/login",
            json!({"username": username, "password": password}),
        )
        .await
    }

    /// Register then log in, returning the session token
    pub async fn signed_in(&self, username: &str) -> String {
        self.register(username, "s3cret").await;
        self.login(username, "s3cret")
            .await
            .session_token()
            .expect("login should set a session cookie")
    }

    pub async fn refresh(&self, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("POST").uri("/refresh");
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("token={}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn list_users(&self, token: &str, query: &str) -> TestResponse {
        self.get(&format!("/users{}", query), Some(token)).await
    }

    /// Upload bytes under the multipart field `image`
    pub async fn upload(&self, token: &str, file_name: &str, content: &[u8]) -> TestResponse {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        self.send(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(header::COOKIE, format!("token={}", token))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }
}
