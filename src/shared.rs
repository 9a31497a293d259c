use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::account::repository::AccountStore;
use crate::auth::TokenIssuer;
use crate::blob::BlobStore;
use crate::identity::IdentityProvider;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore + Send + Sync>,
    pub identity: Arc<dyn IdentityProvider>,
    pub blobs: Arc<dyn BlobStore>,
    pub tokens: TokenIssuer,
    pub default_profile_picture: String,
}

impl AppState {
    pub fn new(
        accounts: Arc<dyn AccountStore + Send + Sync>,
        identity: Arc<dyn IdentityProvider>,
        blobs: Arc<dyn BlobStore>,
        tokens: TokenIssuer,
        default_profile_picture: String,
    ) -> Self {
        Self {
            accounts,
            identity,
            blobs,
            tokens,
            default_profile_picture,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Dependency error: {0}")]
    Dependency(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Dependency(detail) => {
                // Collaborator failures are logged in full but never echoed
                // back to the client
                error!(detail = %detail, "Dependency failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Service temporarily unavailable".to_string(),
                )
            }
        };

        let body = Json(json!({
            "message": message
        }));

        (status, body).into_response()
    }
}
