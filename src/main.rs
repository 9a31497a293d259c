use std::sync::Arc;

use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use account_service::account::repository::{
    AccountStore, InMemoryAccountStore, PostgresAccountStore,
};
use account_service::auth::TokenIssuer;
use account_service::blob::{gcs::GcsBlobStore, BlobStore, InMemoryBlobStore};
use account_service::config::AppConfig;
use account_service::identity::{
    firebase::FirebaseIdentityProvider, IdentityProvider, InMemoryIdentityProvider,
};
use account_service::routes;
use account_service::shared::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting account service");

    let config = AppConfig::load();

    // Create shared application state with dependency injection.
    // Each collaborator has an in-memory fallback so the server can run
    // locally without any external services.
    let accounts: Arc<dyn AccountStore + Send + Sync> = match &config.database_url {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url)
                .await
                .expect("Failed to connect to database");
            info!("Using Postgres account store");
            Arc::new(PostgresAccountStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory account store");
            Arc::new(InMemoryAccountStore::new())
        }
    };

    let (identity, blobs): (Arc<dyn IdentityProvider>, Arc<dyn BlobStore>) =
        match &config.service_account {
            Some(key) => {
                info!(project_id = %key.project_id, "Using managed identity provider");
                let identity: Arc<dyn IdentityProvider> =
                    Arc::new(FirebaseIdentityProvider::new(key.clone()));

                let blobs: Arc<dyn BlobStore> = match &config.storage.bucket {
                    Some(bucket) => {
                        info!(bucket = %bucket, "Using cloud blob store");
                        Arc::new(GcsBlobStore::new(key.clone(), bucket.clone()))
                    }
                    None => {
                        warn!("BUCKET_NAME not set, using in-memory blob store");
                        Arc::new(InMemoryBlobStore::new())
                    }
                };

                (identity, blobs)
            }
            None => {
                warn!("No service-account credentials, using in-memory identity provider and blob store");
                (
                    Arc::new(InMemoryIdentityProvider::new()),
                    Arc::new(InMemoryBlobStore::new()),
                )
            }
        };

    let tokens = TokenIssuer::new(config.auth.secret.clone(), config.auth.token_expiry_days);

    let app_state = AppState::new(
        accounts,
        identity,
        blobs,
        tokens,
        config.storage.default_profile_picture.clone(),
    );

    let app = routes::app(app_state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    info!("Server running on http://{}", addr);
    axum::serve(listener, app).await.unwrap();
}
