//! Auth API endpoints
//!
//! Provides REST API endpoints for authentication and account management:
//! - POST /join - Register a new user (guest only)
//! - POST /login - Login, set token cookies (guest only)
//! - POST /refresh-token - Renew the access token from the refresh cookie
//! - POST /logout - Clear both token cookies
//! - GET /user - Current user's display name
//! - GET /mypage - Current user's profile with joined groups
//! - POST /findId - Recover a login identifier
//! - POST /findPassword - Verify identity before a password reset
//! - POST /resetPassword - Store a new password
//! - POST /exit - Delete the account
//! - GET /exit/check - Deletion confirmation prompt

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::gate::{authenticate, require_guest};
use crate::auth::service::{AuthError, AuthService, LoginRequest, RegisterRequest};
use crate::db::models::{UserProfile, UserResponse};
use crate::db::repositories::GroupRepository;

/// Cookie holding the access token (session cookie, no explicit max-age)
const ACCESS_COOKIE: &str = "access_token";

/// Cookie holding the refresh token (max-age 24h)
const REFRESH_COOKIE: &str = "refresh_token";

/// Auth API state containing the auth service and the group repository
/// (the latter only for the profile view)
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
    pub group_repo: GroupRepository,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Convert AuthError to API response.
///
/// All token-level failures share one opaque 401 body; which verification
/// step failed is logged server-side only.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::MissingFields => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::SessionMismatch => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AuthError::UserNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AuthError::LoginAlreadyExists | AuthError::AlreadyAuthenticated => {
                (StatusCode::CONFLICT, "CONFLICT")
            }
            AuthError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal auth error: {self}");
        } else {
            tracing::debug!("auth rejection: {self}");
        }

        let message = match status {
            StatusCode::UNAUTHORIZED => "Unauthorized".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(ApiError::new(message, code))).into_response()
    }
}

/// Response body for a successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(rename = "accessToken")]
    pub access_token: String,
    pub user: UserResponse,
}

/// Response body for a successful token refresh
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

/// Generic message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Request for login identifier recovery
#[derive(Debug, Deserialize)]
pub struct FindIdRequest {
    pub email: String,
    pub name: String,
}

/// Response for login identifier recovery
#[derive(Debug, Serialize)]
pub struct FindIdResponse {
    pub id: String,
}

/// Request for pre-reset identity verification
#[derive(Debug, Deserialize)]
pub struct FindPasswordRequest {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Request for a password reset
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub id: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/join", post(join_handler))
        .route("/login", post(login_handler))
        .route("/refresh-token", post(refresh_handler))
        .route("/logout", post(logout_handler))
        .route("/user", get(user_handler))
        .route("/mypage", get(mypage_handler))
        .route("/findId", post(find_id_handler))
        .route("/findPassword", post(find_password_handler))
        .route("/resetPassword", post(reset_password_handler))
        .route("/exit", post(exit_handler))
        .route("/exit/check", get(exit_check_handler))
        .with_state(state)
}

/// POST /join
/// Register a new user; rejects callers that are already authenticated
async fn join_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
    Json(request): Json<RegisterRequest>,
) -> Result<StatusCode, AuthError> {
    require_guest(&state.auth_service, &headers).await?;

    tracing::info!("registration attempt for login: {}", request.id);
    state.auth_service.register(request).await?;

    Ok(StatusCode::OK)
}

/// POST /login
/// Verify credentials, rotate the refresh token slot, set both cookies
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AuthError> {
    require_guest(&state.auth_service, &headers).await?;

    tracing::info!("login attempt for login: {}", request.id);
    let outcome = state.auth_service.login(request).await?;

    let access_cookie = Cookie::build((ACCESS_COOKIE, outcome.access_token.clone()))
        .path("/")
        .http_only(true)
        .build();

    let refresh_cookie = Cookie::build((REFRESH_COOKIE, outcome.refresh_token))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::hours(24))
        .build();

    let jar = jar.add(access_cookie).add(refresh_cookie);

    tracing::info!("user logged in: {}", outcome.user.id);

    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            access_token: outcome.access_token,
            user: outcome.user,
        }),
    ))
}

/// POST /refresh-token
/// Renew the access token from the refresh cookie
async fn refresh_handler(
    State(state): State<Arc<AuthApiState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RefreshResponse>), AuthError> {
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AuthError::InvalidToken)?;

    let access_token = match state.auth_service.refresh(&refresh_token).await {
        Ok(token) => token,
        Err(AuthError::InternalError(e)) => return Err(AuthError::InternalError(e)),
        Err(reason) => {
            tracing::debug!("refresh token rejected: {reason}");
            return Err(AuthError::InvalidToken);
        }
    };

    let access_cookie = Cookie::build((ACCESS_COOKIE, access_token.clone()))
        .path("/")
        .http_only(true)
        .build();

    let jar = jar.add(access_cookie);

    Ok((
        jar,
        Json(RefreshResponse {
            success: true,
            access_token,
        }),
    ))
}

/// POST /logout
/// Clear both token cookies unconditionally; safe to call repeatedly
async fn logout_handler(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar
        .remove(Cookie::build(ACCESS_COOKIE).path("/").build())
        .remove(Cookie::build(REFRESH_COOKIE).path("/").build());

    (
        jar,
        Json(MessageResponse {
            message: "Successfully logged out".to_string(),
        }),
    )
}

/// GET /user
/// Current user's display name
async fn user_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AuthError> {
    let user = authenticate(&state.auth_service, &headers).await?;

    Ok(Json(serde_json::json!({ "name": user.name })))
}

/// GET /mypage
/// Current user's profile plus joined groups
async fn mypage_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, AuthError> {
    let user = authenticate(&state.auth_service, &headers).await?;

    let groups = state
        .group_repo
        .groups_of_user(user.user_id)
        .await
        .map_err(|e| AuthError::InternalError(e.to_string()))?;

    Ok(Json(UserProfile {
        id: user.login_id,
        name: user.name,
        email: user.email,
        groups,
    }))
}

/// POST /findId
/// Recover a login identifier from email and name
async fn find_id_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(request): Json<FindIdRequest>,
) -> Result<Json<FindIdResponse>, AuthError> {
    let id = state
        .auth_service
        .find_login(&request.email, &request.name)
        .await?;

    Ok(Json(FindIdResponse { id }))
}

/// POST /findPassword
/// Verify a (login, name, email) triple before a password reset
async fn find_password_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(request): Json<FindPasswordRequest>,
) -> Result<StatusCode, AuthError> {
    state
        .auth_service
        .verify_identity(&request.id, &request.name, &request.email)
        .await?;

    Ok(StatusCode::OK)
}

/// POST /resetPassword
/// Rehash and store a new password
async fn reset_password_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<StatusCode, AuthError> {
    state
        .auth_service
        .reset_password(&request.id, &request.new_password)
        .await?;

    Ok(StatusCode::OK)
}

/// POST /exit
/// Delete the account, cascading boards and memberships
async fn exit_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AuthError> {
    let user = authenticate(&state.auth_service, &headers).await?;

    state.auth_service.delete_account(user.user_id).await?;

    tracing::info!("account deleted: {}", user.login_id);

    let jar = jar
        .remove(Cookie::build(ACCESS_COOKIE).path("/").build())
        .remove(Cookie::build(REFRESH_COOKIE).path("/").build());

    Ok((
        jar,
        Json(MessageResponse {
            message: "Successfully exited.".to_string(),
        }),
    ))
}

/// GET /exit/check
/// Deletion confirmation prompt
async fn exit_check_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, AuthError> {
    authenticate(&state.auth_service, &headers).await?;

    Ok(Json(MessageResponse {
        message: "Do you really want to exit?".to_string(),
    }))
}
