use serde::{Deserialize, Serialize};

/// JWT claims carried by an access token. The `id` and `email` keys are
/// read by downstream consumers of the token, so their names are fixed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    pub id: String,
    pub email: String,
    pub ver: i64,   // Token version, compared against the account on each request
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[test]
    fn test_access_claims_serialization() {
        let claims = AccessClaims {
            id: "user-1".to_string(),
            email: "user@example.com".to_string(),
            ver: 3,
            exp: 1234567890,
            iat: 1234567800,
        };

        // Should serialize to JSON with fixed key names
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"id\":\"user-1\""));
        assert!(json.contains("\"email\":\"user@example.com\""));
        assert!(json.contains("\"ver\":3"));

        // Should deserialize from JSON
        let deserialized: AccessClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, claims);
    }
}
