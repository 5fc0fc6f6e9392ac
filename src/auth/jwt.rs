//! JWT token generation and validation
//!
//! HS256 tokens carrying the user id, identifier, and role label.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::roles::Role;
use crate::types::CuratorError;

/// Claims embedded in a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User document id (hex)
    pub sub: String,
    /// User identifier (email)
    pub identifier: String,
    /// Role label consumed by route guards
    pub role: Role,
    /// Issued-at (unix seconds)
    pub iat: u64,
    /// Expiry (unix seconds)
    pub exp: u64,
}

/// Result of token verification
#[derive(Debug)]
pub struct TokenValidationResult {
    pub valid: bool,
    pub claims: Option<Claims>,
    pub error: Option<String>,
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    expiry_seconds: u64,
}

impl JwtValidator {
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, CuratorError> {
        if secret.is_empty() {
            return Err(CuratorError::Auth("JWT secret must not be empty".into()));
        }
        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Validator with the fixed development secret; only for dev mode
    pub fn new_dev() -> Self {
        Self {
            secret: "dev-only-insecure-secret".to_string(),
            expiry_seconds: 86400,
        }
    }

    /// Generate a signed token for a user
    pub fn generate_token(
        &self,
        sub: &str,
        identifier: &str,
        role: Role,
    ) -> Result<String, CuratorError> {
        let now = Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: sub.to_string(),
            identifier: identifier.to_string(),
            role,
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| CuratorError::Auth(format!("Failed to sign token: {e}")))
    }

    /// Verify a token, returning claims on success
    pub fn verify_token(&self, token: &str) -> TokenValidationResult {
        let validation = Validation::default();
        match decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        ) {
            Ok(data) => TokenValidationResult {
                valid: true,
                claims: Some(data.claims),
                error: None,
            },
            Err(e) => TokenValidationResult {
                valid: false,
                claims: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Extract a bearer token from an Authorization header value
pub fn extract_token_from_header(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let jwt = JwtValidator::new("test-secret".to_string(), 3600).unwrap();
        let token = jwt
            .generate_token("abc123", "curator@example.org", Role::Curator)
            .unwrap();

        let result = jwt.verify_token(&token);
        assert!(result.valid);
        let claims = result.claims.unwrap();
        assert_eq!(claims.sub, "abc123");
        assert_eq!(claims.identifier, "curator@example.org");
        assert_eq!(claims.role, Role::Curator);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtValidator::new("secret-a".to_string(), 3600).unwrap();
        let verifier = JwtValidator::new("secret-b".to_string(), 3600).unwrap();

        let token = issuer
            .generate_token("abc", "a@b.c", Role::Viewer)
            .unwrap();
        assert!(!verifier.verify_token(&token).valid);
    }

    #[test]
    fn test_garbage_token_rejected() {
        let jwt = JwtValidator::new("test-secret".to_string(), 3600).unwrap();
        let result = jwt.verify_token("not-a-token");
        assert!(!result.valid);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(JwtValidator::new(String::new(), 3600).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_token_from_header(Some("Bearer abc.def.ghi")),
            Some("abc.def.ghi")
        );
        assert_eq!(extract_token_from_header(Some("Basic xyz")), None);
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(None), None);
    }
}
