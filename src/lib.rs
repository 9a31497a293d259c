// Library crate for the account service
// This file exposes the public API for integration tests

pub mod account;
pub mod auth;
pub mod blob;
pub mod config;
pub mod gcp;
pub mod identity;
pub mod routes;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use account::repository::{AccountStore, InMemoryAccountStore};
pub use auth::{AccessClaims, TokenIssuer};
pub use blob::{BlobStore, InMemoryBlobStore};
pub use config::AppConfig;
pub use identity::{IdentityProvider, InMemoryIdentityProvider};
pub use shared::{AppError, AppState};
