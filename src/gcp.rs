use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::ServiceAccountKey;
use crate::shared::AppError;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Seconds a Google-issued access token lives; grants request the maximum.
const GRANT_LIFETIME_SECS: i64 = 3600;

/// Refresh this long before the cached token actually expires.
const REFRESH_MARGIN_SECS: i64 = 60;

/// OAuth bearer-token source for Google APIs, authenticated with the
/// configured service account.
///
/// Mints a self-signed RS256 grant, exchanges it at the token endpoint and
/// caches the resulting access token until shortly before expiry. Shared by
/// the identity-provider and blob-store clients, one instance per scope.
pub struct GcpTokenSource {
    key: ServiceAccountKey,
    scope: String,
    token_url: String,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Claims of the self-signed JWT grant.
#[derive(Debug, Serialize)]
struct GrantClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: usize,
    exp: usize,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

impl GcpTokenSource {
    pub fn new(key: ServiceAccountKey, scope: impl Into<String>) -> Self {
        Self {
            key,
            scope: scope.into(),
            token_url: TOKEN_URL.to_string(),
            http: reqwest::Client::new(),
            cached: Mutex::new(None),
        }
    }

    /// Returns a valid access token, reusing the cached one when fresh.
    #[instrument(skip(self))]
    pub async fn bearer(&self) -> Result<String, AppError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Utc::now() < token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) {
                return Ok(token.token.clone());
            }
            debug!("Cached access token near expiry, refreshing");
        }

        let fresh = self.exchange().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    async fn exchange(&self) -> Result<CachedToken, AppError> {
        let assertion = self.sign_grant()?;

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Dependency(format!("token endpoint unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Token exchange rejected");
            return Err(AppError::Dependency(format!(
                "token exchange failed with status {status}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Dependency(format!("malformed token response: {e}")))?;

        debug!(expires_in = token.expires_in, "Access token obtained");
        Ok(CachedToken {
            token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }

    fn sign_grant(&self) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = GrantClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.token_url,
            iat: now.timestamp() as usize,
            exp: (now + Duration::seconds(GRANT_LIFETIME_SECS)).timestamp() as usize,
        };

        let encoding_key = jsonwebtoken::EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| AppError::Dependency(format!("invalid service-account key: {e}")))?;

        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
            &claims,
            &encoding_key,
        )
        .map_err(|e| AppError::Dependency(format!("failed to sign grant: {e}")))
    }
}
