use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{info, instrument, warn};

use crate::shared::{AppError, AppState};

/// Bearer token middleware - validates the Authorization header, checks the
/// token version against the stored account and adds AccessClaims to the request.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), auth::bearer_auth))
/// Handlers can then extract Extension(claims): Extension<AccessClaims>.
#[instrument(skip(state, req, next))]
pub async fn bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    info!(
        "Bearer authentication middleware triggered for request {}",
        req.uri()
    );

    // Extract token from Authorization Bearer header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header in request");
            AppError::Authentication("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format (expected Bearer token)");
        AppError::Authentication("Invalid authorization header format".to_string())
    })?;

    // Validate token signature and expiry
    let claims = match state.tokens.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("Bearer authentication failed: {}", e);
            return Err(e);
        }
    };

    // A token is only live while its version matches the account. Login and
    // logout both bump the stored version, which invalidates older tokens.
    let account = state
        .accounts
        .find_by_id(&claims.id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %claims.id, "Token references an unknown account");
            AppError::Authentication("Token has been revoked".to_string())
        })?;

    if account.token_version != claims.ver {
        warn!(
            user_id = %claims.id,
            token_version = claims.ver,
            current_version = account.token_version,
            "Token version mismatch, token has been revoked"
        );
        return Err(AppError::Authentication("Token has been revoked".to_string()));
    }

    info!(
        user_id = %claims.id,
        token_version = claims.ver,
        "Authentication successful, adding claims to request"
    );

    // Add claims to request extensions for handlers to use
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
