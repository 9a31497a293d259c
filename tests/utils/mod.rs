// Shared helpers for the HTTP flow tests. Each test gets a fresh router
// wired to in-memory collaborators it can inspect directly.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

use account_service::{
    routes, AppState, InMemoryAccountStore, InMemoryBlobStore, InMemoryIdentityProvider,
    TokenIssuer,
};

pub const TEST_SECRET: &str = "integration-secret";
pub const DEFAULT_PICTURE: &str =
    "https://storage.googleapis.com/local/userProfile/default.jpg";
pub const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

pub struct TestApp {
    pub router: Router,
    pub accounts: Arc<InMemoryAccountStore>,
    pub identity: Arc<InMemoryIdentityProvider>,
    pub blobs: Arc<InMemoryBlobStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let accounts = Arc::new(InMemoryAccountStore::new());
        let identity = Arc::new(InMemoryIdentityProvider::new());
        let blobs = Arc::new(InMemoryBlobStore::new());

        let state = AppState::new(
            accounts.clone(),
            identity.clone(),
            blobs.clone(),
            TokenIssuer::new(TEST_SECRET.to_string(), 365),
            DEFAULT_PICTURE.to_string(),
        );

        Self {
            router: routes::app(state),
            accounts,
            identity,
            blobs,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Response {
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

    pub async fn post_auth(&self, uri: &str, token: &str) -> Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn get_auth(&self, uri: &str, token: &str) -> Response {
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn patch_json_auth(&self, uri: &str, token: &str, body: Value) -> Response {
        self.send(
            Request::builder()
                .method("PATCH")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn patch_multipart_auth(
        &self,
        uri: &str,
        token: &str,
        parts: &[FormPart],
    ) -> Response {
        self.send(
            Request::builder()
                .method("PATCH")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(BOUNDARY, parts)))
                .unwrap(),
        )
        .await
    }

    /// Registers an account and logs in, returning (id, token)
    pub async fn register_and_login(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> (String, String) {
        let response = self
            .post_json(
                "/register",
                serde_json::json!({ "name": name, "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status(), 201, "registration should succeed");
        let registered = body_json(response).await;
        let id = registered["user"]["id"].as_str().unwrap().to_string();

        let response = self
            .post_json(
                "/login",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status(), 200, "login should succeed");
        let logged_in = body_json(response).await;
        let token = logged_in["user"]["token"].as_str().unwrap().to_string();

        (id, token)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads a response body as JSON
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// One part of a multipart form
pub struct FormPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    value: Vec<u8>,
}

pub fn text_part(name: &str, value: &str) -> FormPart {
    FormPart {
        name: name.to_string(),
        file_name: None,
        content_type: None,
        value: value.as_bytes().to_vec(),
    }
}

pub fn file_part(name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> FormPart {
    FormPart {
        name: name.to_string(),
        file_name: Some(file_name.to_string()),
        content_type: Some(content_type.to_string()),
        value: bytes.to_vec(),
    }
}

/// Encodes parts as a multipart/form-data body with the given boundary
pub fn multipart_body(boundary: &str, parts: &[FormPart]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match (&part.file_name, &part.content_type) {
            (Some(file_name), Some(content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        part.name, file_name, content_type
                    )
                    .as_bytes(),
                );
            }
            _ => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(&part.value);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
