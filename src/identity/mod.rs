pub mod firebase;

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::shared::AppError;

/// External identity provider owning authentication credentials.
///
/// The provider assigns the opaque account identifier at creation; all other
/// operations address that identifier. Credential verification itself is not
/// part of this trait: login compares against the hash held in the account
/// store.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a credential record, returning the provider-assigned id.
    async fn create_user(&self, email: &str, password: &str) -> Result<String, AppError>;

    /// Replace the provider-side password for an existing user.
    async fn update_password(&self, id: &str, new_password: &str) -> Result<(), AppError>;

    /// Replace the provider-side email for an existing user.
    async fn update_email(&self, id: &str, new_email: &str) -> Result<(), AppError>;

    /// Remove the credential record. Used as registration compensation when
    /// the follow-up store write fails.
    async fn delete_user(&self, id: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
struct IdentityRecord {
    email: String,
    #[allow(dead_code)] // Held to mimic the provider; never read back
    password: String,
}

/// In-memory identity provider for development and testing.
///
/// Stands in for the managed service so the server can run without
/// credentials. Records are lost on restart.
pub struct InMemoryIdentityProvider {
    users: RwLock<HashMap<String, IdentityRecord>>,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the current number of credential records.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Checks whether a record exists for the given id.
    pub async fn has_user(&self, id: &str) -> bool {
        self.users.read().await.contains_key(id)
    }

    /// Returns the provider-side email for the given id.
    pub async fn email_of(&self, id: &str) -> Option<String> {
        self.users.read().await.get(id).map(|u| u.email.clone())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == email) {
            warn!(email = %email, "Identity record already exists for email");
            return Err(AppError::Validation("Email already in use".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        users.insert(
            id.clone(),
            IdentityRecord {
                email: email.to_string(),
                password: password.to_string(),
            },
        );

        debug!(id = %id, "Identity record created in memory");
        Ok(id)
    }

    async fn update_password(&self, id: &str, new_password: &str) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        match users.get_mut(id) {
            Some(record) => {
                record.password = new_password.to_string();
                debug!(id = %id, "Identity password updated in memory");
                Ok(())
            }
            None => Err(AppError::Dependency(format!(
                "identity provider has no user {id}"
            ))),
        }
    }

    async fn update_email(&self, id: &str, new_email: &str) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        match users.get_mut(id) {
            Some(record) => {
                record.email = new_email.to_string();
                debug!(id = %id, "Identity email updated in memory");
                Ok(())
            }
            None => Err(AppError::Dependency(format!(
                "identity provider has no user {id}"
            ))),
        }
    }

    async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if users.remove(id).is_none() {
            warn!(id = %id, "Identity record not found for deletion");
            return Err(AppError::Dependency(format!(
                "identity provider has no user {id}"
            )));
        }

        debug!(id = %id, "Identity record deleted from memory");
        Ok(())
    }
}
