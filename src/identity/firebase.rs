use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::IdentityProvider;
use crate::config::ServiceAccountKey;
use crate::gcp::GcpTokenSource;
use crate::shared::AppError;

const BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SCOPE: &str = "https://www.googleapis.com/auth/identitytoolkit";

/// Identity Toolkit admin client: credential records live entirely in the
/// managed provider, addressed by the `localId` it assigns.
pub struct FirebaseIdentityProvider {
    project_id: String,
    base_url: String,
    http: reqwest::Client,
    tokens: GcpTokenSource,
}

#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(rename = "localId")]
    local_id: String,
}

impl FirebaseIdentityProvider {
    pub fn new(key: ServiceAccountKey) -> Self {
        let project_id = key.project_id.clone();
        Self {
            project_id,
            base_url: BASE_URL.to_string(),
            http: reqwest::Client::new(),
            tokens: GcpTokenSource::new(key, SCOPE),
        }
    }

    /// `action` is an RPC-style suffix such as `update` or `delete`; `None`
    /// addresses the collection itself (account creation).
    fn accounts_url(&self, action: Option<&str>) -> String {
        match action {
            Some(action) => format!(
                "{}/projects/{}/accounts:{}",
                self.base_url, self.project_id, action
            ),
            None => format!("{}/projects/{}/accounts", self.base_url, self.project_id),
        }
    }

    async fn post(&self, url: &str, body: serde_json::Value) -> Result<reqwest::Response, AppError> {
        let bearer = self.tokens.bearer().await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(bearer)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Dependency(format!("identity provider unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            warn!(status = %status, detail = %detail, "Identity provider call rejected");

            // Duplicate emails are a client mistake, not a provider outage
            if detail.contains("EMAIL_EXISTS") || detail.contains("DUPLICATE_EMAIL") {
                return Err(AppError::Validation("Email already in use".to_string()));
            }

            return Err(AppError::Dependency(format!(
                "identity provider call failed with status {status}"
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    #[instrument(skip(self, password))]
    async fn create_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let response = self
            .post(
                &self.accounts_url(None),
                json!({ "email": email, "password": password }),
            )
            .await?;

        let created: SignUpResponse = response
            .json()
            .await
            .map_err(|e| AppError::Dependency(format!("malformed identity response: {e}")))?;

        debug!(id = %created.local_id, "Identity record created");
        Ok(created.local_id)
    }

    #[instrument(skip(self, new_password))]
    async fn update_password(&self, id: &str, new_password: &str) -> Result<(), AppError> {
        self.post(
            &self.accounts_url(Some("update")),
            json!({ "localId": id, "password": new_password }),
        )
        .await?;

        debug!(id = %id, "Identity password updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_email(&self, id: &str, new_email: &str) -> Result<(), AppError> {
        self.post(
            &self.accounts_url(Some("update")),
            json!({ "localId": id, "email": new_email }),
        )
        .await?;

        debug!(id = %id, "Identity email updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        self.post(
            &self.accounts_url(Some("delete")),
            json!({ "localId": id }),
        )
        .await?;

        debug!(id = %id, "Identity record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> FirebaseIdentityProvider {
        FirebaseIdentityProvider::new(ServiceAccountKey {
            project_id: "demo-project".to_string(),
            private_key: "unused".to_string(),
            client_email: "svc@demo-project.iam.gserviceaccount.com".to_string(),
        })
    }

    #[test]
    fn test_accounts_url_for_create() {
        assert_eq!(
            provider().accounts_url(None),
            "https://identitytoolkit.googleapis.com/v1/projects/demo-project/accounts"
        );
    }

    #[test]
    fn test_accounts_url_for_actions() {
        let provider = provider();
        assert_eq!(
            provider.accounts_url(Some("update")),
            "https://identitytoolkit.googleapis.com/v1/projects/demo-project/accounts:update"
        );
        assert_eq!(
            provider.accounts_url(Some("delete")),
            "https://identitytoolkit.googleapis.com/v1/projects/demo-project/accounts:delete"
        );
    }
}
