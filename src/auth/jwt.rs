//! JWT utilities for token generation and validation
//!
//! Provides JWT token creation and validation using HS256 algorithm.
//! Access tokens are short-lived (1 hour), refresh tokens are long-lived
//! (1 day). Both carry the same claims shape and fixed issuer/subject
//! metadata; they differ only in lifetime.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default access token expiration time (1 hour)
const ACCESS_TOKEN_EXPIRATION_MINUTES: i64 = 60;

/// Default refresh token expiration time (1 day)
const REFRESH_TOKEN_EXPIRATION_DAYS: i64 = 1;

/// Token issuer, fixed by the wire contract
const TOKEN_ISSUER: &str = "weather";

/// Token subject, fixed by the wire contract
const TOKEN_SUBJECT: &str = "user_info";

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Access token expiration in minutes
    pub access_token_expiration_minutes: i64,
    /// Refresh token expiration in days
    pub refresh_token_expiration_days: i64,
    /// Token issuer
    pub issuer: String,
}

impl JwtConfig {
    /// Create a new JWT configuration
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_expiration_minutes: ACCESS_TOKEN_EXPIRATION_MINUTES,
            refresh_token_expiration_days: REFRESH_TOKEN_EXPIRATION_DAYS,
            issuer: TOKEN_ISSUER.to_string(),
        }
    }

    /// Set access token expiration
    pub fn access_token_expiration(mut self, minutes: i64) -> Self {
        self.access_token_expiration_minutes = minutes;
        self
    }

    /// Set refresh token expiration
    pub fn refresh_token_expiration(mut self, days: i64) -> Self {
        self.refresh_token_expiration_days = days;
        self
    }
}

/// JWT errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingError(String),

    #[error("Token decoding failed: {0}")]
    DecodingError(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    InvalidToken,
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidToken | ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                JwtError::InvalidToken
            }
            _ => JwtError::DecodingError(err.to_string()),
        }
    }
}

/// JWT claims structure.
///
/// The payload carries the user's numeric identity, login identifier, and
/// display name. Secret material is never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Numeric user identity
    pub user_id: i64,
    /// Login identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Subject
    pub sub: String,
    /// JWT ID. Every issued token gets a fresh one, so two logins in the
    /// same second still mint distinct refresh tokens and rotation always
    /// invalidates the predecessor.
    pub jti: String,
}

/// JWT service for token operations
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn issue(&self, user_id: i64, login_id: &str, name: &str, lifetime: Duration) -> Result<String, JwtError> {
        let now = Utc::now();
        let exp = now + lifetime;

        let claims = Claims {
            user_id,
            id: login_id.to_string(),
            name: name.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.config.issuer.clone(),
            sub: TOKEN_SUBJECT.to_string(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Generate an access token
    pub fn issue_access(&self, user_id: i64, login_id: &str, name: &str) -> Result<String, JwtError> {
        self.issue(
            user_id,
            login_id,
            name,
            Duration::minutes(self.config.access_token_expiration_minutes),
        )
    }

    /// Generate a refresh token
    pub fn issue_refresh(&self, user_id: i64, login_id: &str, name: &str) -> Result<String, JwtError> {
        self.issue(
            user_id,
            login_id,
            name,
            Duration::days(self.config.refresh_token_expiration_days),
        )
    }

    /// Validate and decode a token, checking signature, expiry, issuer, and subject
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        // Set leeway to 0 for strict expiration checking
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        if token_data.claims.sub != TOKEN_SUBJECT {
            return Err(JwtError::InvalidToken);
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        let config = JwtConfig::new("test_secret_key_for_testing_only_32bytes!");
        JwtService::new(config)
    }

    // ========================================================================
    // JwtConfig Tests
    // ========================================================================

    #[test]
    fn test_jwt_config_new() {
        let config = JwtConfig::new("my_secret");

        assert_eq!(config.secret, "my_secret");
        assert_eq!(
            config.access_token_expiration_minutes,
            ACCESS_TOKEN_EXPIRATION_MINUTES
        );
        assert_eq!(
            config.refresh_token_expiration_days,
            REFRESH_TOKEN_EXPIRATION_DAYS
        );
        assert_eq!(config.issuer, "weather");
    }

    #[test]
    fn test_jwt_config_builder() {
        let config = JwtConfig::new("secret")
            .access_token_expiration(30)
            .refresh_token_expiration(14);

        assert_eq!(config.access_token_expiration_minutes, 30);
        assert_eq!(config.refresh_token_expiration_days, 14);
    }

    // ========================================================================
    // JWT Service Tests
    // ========================================================================

    #[test]
    fn test_issue_access_token() {
        let service = create_test_service();

        let token = service.issue_access(1, "alice", "Alice").unwrap();
        assert!(!token.is_empty());
    }

    #[test]
    fn test_access_token_round_trips_claims() {
        let service = create_test_service();

        let token = service.issue_access(42, "alice", "Alice").unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.id, "alice");
        assert_eq!(claims.name, "Alice");
        assert_eq!(claims.iss, "weather");
        assert_eq!(claims.sub, "user_info");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_same_second_tokens_are_distinct() {
        let service = create_test_service();

        // Issued back to back, almost certainly within one second; the jti
        // must still make them distinct tokens.
        let first = service.issue_refresh(1, "alice", "Alice").unwrap();
        let second = service.issue_refresh(1, "alice", "Alice").unwrap();

        assert_ne!(first, second);

        let first_claims = service.validate_token(&first).unwrap();
        let second_claims = service.validate_token(&second).unwrap();
        assert_ne!(first_claims.jti, second_claims.jti);
    }

    #[test]
    fn test_refresh_token_outlives_access_token() {
        let service = create_test_service();

        let access = service.issue_access(1, "alice", "Alice").unwrap();
        let refresh = service.issue_refresh(1, "alice", "Alice").unwrap();

        let access_claims = service.validate_token(&access).unwrap();
        let refresh_claims = service.validate_token(&refresh).unwrap();

        assert!(refresh_claims.exp > access_claims.exp);
    }

    #[test]
    fn test_tampered_signature_fails() {
        let service = create_test_service();

        let token = service.issue_access(1, "alice", "Alice").unwrap();

        // Flip one byte of the signature segment
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert!(service.validate_token(&tampered).is_err());
    }

    #[test]
    fn test_validate_invalid_token() {
        let service = create_test_service();

        let result = service.validate_token("invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_token_wrong_secret() {
        let service1 = JwtService::new(JwtConfig::new("secret_one"));
        let service2 = JwtService::new(JwtConfig::new("secret_two"));

        let token = service1.issue_access(1, "alice", "Alice").unwrap();

        let result = service2.validate_token(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        // Negative expiration so the token is already expired
        let config = JwtConfig::new("test_secret").access_token_expiration(-1);
        let service = JwtService::new(config);

        let token = service.issue_access(1, "alice", "Alice").unwrap();

        let result = service.validate_token(&token);
        assert!(
            matches!(result, Err(JwtError::Expired)),
            "Expected Expired error, got: {:?}",
            result
        );
    }

    #[test]
    fn test_issuer_mismatch_fails() {
        let mut config = JwtConfig::new("shared_secret");
        config.issuer = "someone_else".to_string();
        let other = JwtService::new(config);

        let service = JwtService::new(JwtConfig::new("shared_secret"));

        let token = other.issue_access(1, "alice", "Alice").unwrap();
        assert!(service.validate_token(&token).is_err());
    }

    // ========================================================================
    // Error Tests
    // ========================================================================

    #[test]
    fn test_jwt_error_display() {
        assert_eq!(format!("{}", JwtError::Expired), "Token expired");
        assert_eq!(format!("{}", JwtError::InvalidToken), "Invalid token");
    }
}
