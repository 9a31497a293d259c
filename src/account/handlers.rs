use axum::{
    extract::multipart::{Multipart, MultipartError},
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use tracing::{info, instrument};

use super::service::AccountService;
use super::types::{
    ChangeDataResponse, ChangePasswordRequest, DashboardResponse, LoginRequest, LoginResponse,
    MessageResponse, ProfileEdit, RegisterRequest, RegisterResponse, UploadedImage,
};
use crate::auth::AccessClaims;
use crate::shared::{AppError, AppState};

/// HTTP handler for account registration
///
/// POST /register
/// Returns 201 with the created account's public fields
#[instrument(name = "register", skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    info!("Handling registration request");

    let service = AccountService::from_state(&state);
    let response = service.register(payload).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// HTTP handler for login
///
/// POST /login
/// Returns the account identity and a fresh bearer token
#[instrument(name = "login", skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    info!("Handling login request");

    let service = AccountService::from_state(&state);
    let response = service.login(payload).await?;

    Ok(Json(response))
}

/// HTTP handler for logout
///
/// POST /logout (requires bearer token)
/// Invalidates the presented token
#[instrument(name = "logout", skip(state, claims))]
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<MessageResponse>, AppError> {
    info!(user_id = %claims.id, "Handling logout request");

    let service = AccountService::from_state(&state);
    let response = service.logout(&claims.id).await?;

    Ok(Json(response))
}

/// HTTP handler for the profile dashboard
///
/// GET /dashboard (requires bearer token)
#[instrument(name = "dashboard", skip(state, claims))]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<DashboardResponse>, AppError> {
    info!(user_id = %claims.id, "Handling dashboard request");

    let service = AccountService::from_state(&state);
    let response = service.dashboard(&claims.id).await?;

    Ok(Json(response))
}

/// HTTP handler for password change
///
/// PATCH /dashboard/ChangePassword (requires bearer token)
#[instrument(name = "change_password", skip(state, claims, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    info!(user_id = %claims.id, "Handling password change request");

    let service = AccountService::from_state(&state);
    let response = service.change_password(&claims.id, payload).await?;

    Ok(Json(response))
}

/// HTTP handler for profile-data update
///
/// PATCH /dashboard/changeData (requires bearer token)
/// Accepts a multipart form with optional text fields and an optional
/// `pictureProfile` image file
#[instrument(name = "change_data", skip(state, claims, multipart))]
pub async fn change_data(
    State(state): State<AppState>,
    Extension(claims): Extension<AccessClaims>,
    mut multipart: Multipart,
) -> Result<Json<ChangeDataResponse>, AppError> {
    info!(user_id = %claims.id, "Handling profile data update request");

    let edit = collect_profile_edit(&mut multipart).await?;

    let service = AccountService::from_state(&state);
    let response = service.update_profile(&claims.id, edit).await?;

    Ok(Json(response))
}

/// Drains the multipart form into a raw ProfileEdit. Unknown fields are
/// ignored so clients can send extra keys without breaking.
async fn collect_profile_edit(multipart: &mut Multipart) -> Result<ProfileEdit, AppError> {
    let mut edit = ProfileEdit::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        match name.as_str() {
            "name" => edit.name = Some(field.text().await.map_err(malformed)?),
            "email" => edit.email = Some(field.text().await.map_err(malformed)?),
            "no_hp" => edit.phone = Some(field.text().await.map_err(malformed)?),
            "age" => edit.age = Some(field.text().await.map_err(malformed)?),
            "gender" => edit.gender = Some(field.text().await.map_err(malformed)?),
            "pictureProfile" => {
                // Copy the metadata out before the field is consumed
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(malformed)?.to_vec();
                edit.picture = Some(UploadedImage {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    Ok(edit)
}

fn malformed(e: MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart request: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{header, Request},
        Router,
    };
    use tower::ServiceExt; // for `oneshot`

    fn register_app() -> Router {
        Router::new()
            .route("/register", axum::routing::post(register))
            .with_state(AppStateBuilder::new().build())
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_handler_created() {
        let app = register_app();

        let response = app
            .oneshot(json_request(
                "/register",
                "{\"name\":\"A\",\"email\":\"a@x.com\",\"password\":\"pw\"}",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: RegisterResponse = serde_json::from_slice(&body).unwrap();
        assert!(!parsed.user.id.is_empty());
        assert_eq!(parsed.user.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_register_handler_incomplete_form() {
        let app = register_app();

        let response = app
            .oneshot(json_request(
                "/register",
                "{\"email\":\"a@x.com\",\"password\":\"pw\"}",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
