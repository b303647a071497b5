//! Authentication module for StudyHub
//!
//! This module provides authentication functionality including:
//! - JWT token generation and validation
//! - User registration and login
//! - Single-slot refresh token rotation
//! - Request guards (authenticated / guest-only)
//! - REST API endpoints for auth operations

pub mod api;
pub mod gate;
pub mod jwt;
pub mod service;

pub use api::{AuthApiState, auth_api_router};
pub use gate::{authenticate, extract_bearer_token, require_guest};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use service::{AuthError, AuthService, LoginOutcome, LoginRequest, RegisterRequest};
