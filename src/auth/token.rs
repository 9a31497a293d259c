use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};

use super::types::AccessClaims;
use crate::shared::AppError;

/// Signs and verifies access tokens. The secret and expiry are injected
/// at construction so the issuer never reads the environment itself.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    pub expiry_days: i64,
}

impl TokenIssuer {
    pub fn new(secret: String, expiry_days: i64) -> Self {
        Self {
            secret,
            expiry_days,
        }
    }

    /// Creates a new JWT access token for the given account identity
    #[instrument(skip(self, id, email))]
    pub fn issue(&self, id: String, email: String, ver: i64) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = (now + Duration::days(self.expiry_days)).timestamp() as usize;

        debug!(
            expiry_days = self.expiry_days,
            exp_timestamp = exp,
            token_version = ver,
            "Creating JWT access token"
        );

        let claims = AccessClaims {
            id,
            email,
            ver,
            exp,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode JWT token");
            AppError::Authentication("Invalid token".to_string())
        })
    }

    /// Verifies a JWT access token and returns the claims if valid
    #[instrument(skip(self, token))]
    pub fn verify(&self, token: &str) -> Result<AccessClaims, AppError> {
        debug!("Decoding and verifying JWT access token");

        decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| {
            debug!(
                user_id = %data.claims.id,
                token_version = data.claims.ver,
                exp = data.claims.exp,
                "JWT token decoded successfully"
            );
            data.claims
        })
        .map_err(|e| {
            debug!(error = %e, "Failed to decode JWT token");
            AppError::Authentication("Invalid token".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret".to_string(), 365)
    }

    #[test]
    fn test_issue_and_verify_token() {
        let tokens = issuer();

        let token = tokens
            .issue("user-1".to_string(), "user@example.com".to_string(), 1)
            .unwrap();
        assert!(!token.is_empty());

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.id, "user-1");
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.ver, 1);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_invalid_token() {
        let result = issuer().verify("invalid.token.here");
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[test]
    fn test_token_signed_with_different_secret_is_rejected() {
        let tokens = issuer();
        let other = TokenIssuer::new("another-secret".to_string(), 365);

        let token = tokens
            .issue("user-1".to_string(), "user@example.com".to_string(), 1)
            .unwrap();

        // Should verify with the issuing secret
        assert!(tokens.verify(&token).is_ok());

        // Should be rejected by an issuer holding a different secret
        assert!(matches!(
            other.verify(&token),
            Err(AppError::Authentication(_))
        ));
    }

    #[test]
    fn test_claims_carry_token_version() {
        let tokens = issuer();

        let token = tokens
            .issue("user-1".to_string(), "user@example.com".to_string(), 7)
            .unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.ver, 7);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // A negative validity window produces an already-expired token
        let expired_issuer = TokenIssuer::new("test-secret".to_string(), -1);

        let token = expired_issuer
            .issue("user-1".to_string(), "user@example.com".to_string(), 1)
            .unwrap();

        assert!(matches!(
            issuer().verify(&token),
            Err(AppError::Authentication(_))
        ));
    }
}
