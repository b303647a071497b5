//! Authentication service
//!
//! Provides business logic for user registration, login, token refresh, and
//! account removal. Coordinates between the user repository, the single-slot
//! refresh token storage, and the JWT service.

use crate::auth::jwt::{Claims, JwtError, JwtService};
use crate::db::models::{User, UserResponse};
use crate::db::repositories::{UserRepository, UserRepositoryError};

/// Authentication service error types.
///
/// The token-level variants (`InvalidToken`, `TokenExpired`, `SessionMismatch`)
/// are distinguished here for logging; they all collapse to a bare 401 at the
/// API boundary so callers cannot probe which check failed.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Login identifier already taken")]
    LoginAlreadyExists,

    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Refresh token does not match stored session")]
    SessionMismatch,

    #[error("Already authenticated")]
    AlreadyAuthenticated,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::NotFound => AuthError::UserNotFound,
            UserRepositoryError::LoginAlreadyExists => AuthError::LoginAlreadyExists,
            _ => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::TokenExpired,
            JwtError::InvalidToken => AuthError::InvalidToken,
            JwtError::DecodingError(_) => AuthError::InvalidToken,
            _ => AuthError::InternalError(err.to_string()),
        }
    }
}

/// Registration request data. Fields default to empty so an absent field
/// surfaces as `MissingFields` (400) rather than a deserialization error.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub id: String,
    pub password: String,
    pub name: String,
    pub email: String,
}

/// Login request data
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub id: String,
    pub password: String,
}

/// Successful login: the user's public identity plus both tokens.
/// The refresh token travels only in the cookie; the access token is
/// additionally returned in the response body.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_service: JwtService,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(user_repo: UserRepository, jwt_service: JwtService) -> Self {
        Self {
            user_repo,
            jwt_service,
        }
    }

    /// Register a new user
    pub async fn register(&self, request: RegisterRequest) -> Result<(), AuthError> {
        if request.id.is_empty()
            || request.password.is_empty()
            || request.name.is_empty()
            || request.email.is_empty()
        {
            return Err(AuthError::MissingFields);
        }

        self.user_repo
            .create(&request.id, &request.password, &request.name, &request.email)
            .await?;

        Ok(())
    }

    /// Login an existing user: verify credentials, mint an access and a
    /// refresh token, and persist the refresh token in the user's slot
    /// (overwriting any prior value).
    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, AuthError> {
        if request.id.is_empty() || request.password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let user = self
            .user_repo
            .authenticate(&request.id, &request.password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let access_token =
            self.jwt_service
                .issue_access(user.user_id, &user.login_id, &user.name)?;
        let refresh_token =
            self.jwt_service
                .issue_refresh(user.user_id, &user.login_id, &user.name)?;

        // Single-active-session semantics: the new refresh token replaces
        // whatever was stored before.
        self.user_repo
            .store_refresh_token(user.user_id, &refresh_token)
            .await?;

        Ok(LoginOutcome {
            user: user.into(),
            access_token,
            refresh_token,
        })
    }

    /// Renew an access token from a refresh token.
    ///
    /// The token must decode cleanly, its user must still exist, and its
    /// digest must equal the user's stored slot. Renewal rotates only the
    /// access token; the refresh token stays as issued.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.jwt_service.validate_token(refresh_token)?;

        let user = self
            .user_repo
            .find_by_login(&claims.id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let presented = UserRepository::hash_refresh_token(refresh_token);
        if user.refresh_token_hash.as_deref() != Some(presented.as_str()) {
            return Err(AuthError::SessionMismatch);
        }

        let access_token =
            self.jwt_service
                .issue_access(user.user_id, &user.login_id, &user.name)?;

        Ok(access_token)
    }

    /// Resolve an access token to a live user record. Stale tokens for
    /// deleted users do not authenticate.
    pub async fn current_user(&self, access_token: &str) -> Result<User, AuthError> {
        let claims: Claims = self.jwt_service.validate_token(access_token)?;

        self.user_repo
            .find_by_login(&claims.id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Delete the user's account, cascading boards and memberships
    pub async fn delete_account(&self, user_id: i64) -> Result<(), AuthError> {
        let deleted = self.user_repo.delete_account(user_id).await?;
        if !deleted {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }

    /// Recover a login identifier from email and name
    pub async fn find_login(&self, email: &str, name: &str) -> Result<String, AuthError> {
        self.user_repo
            .find_login_by_email_and_name(email, name)
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }

    /// Check a (login, name, email) triple before a password reset
    pub async fn verify_identity(
        &self,
        login_id: &str,
        name: &str,
        email: &str,
    ) -> Result<(), AuthError> {
        let matches = self
            .user_repo
            .matches_identity(login_id, name, email)
            .await?;

        if matches {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Reset a user's password
    pub async fn reset_password(
        &self,
        login_id: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.user_repo.update_password(login_id, new_password).await?;
        Ok(())
    }
}
