use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::account;
use crate::auth;
use crate::shared::AppState;

/// Builds the application router: public registration and login plus the
/// dashboard endpoints gated by bearer authentication.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/dashboard", get(account::dashboard))
        .route("/dashboard/ChangePassword", patch(account::change_password))
        .route("/dashboard/changeData", patch(account::change_data))
        .route("/logout", post(account::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::bearer_auth,
        ));

    Router::new()
        .route("/", get(|| async { "Account service is running" }))
        .route("/register", post(account::register))
        .route("/login", post(account::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt; // for `oneshot`

    #[tokio::test]
    async fn test_root_is_public() {
        let app = app(AppStateBuilder::new().build());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dashboard_requires_token() {
        let app = app(AppStateBuilder::new().build());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_requires_token() {
        let app = app(AppStateBuilder::new().build());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/logout")
                    .header("Authorization", "NotBearer abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
