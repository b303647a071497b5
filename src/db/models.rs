//! Database models for StudyHub
//!
//! This module defines the database entity structs that map to PostgreSQL tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// User Model
// ============================================================================

/// User entity representing a registered user.
///
/// `refresh_token_hash` is the single refresh-token slot: it holds the SHA-256
/// digest of the most recently issued refresh token, or NULL when none is live.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: i64,
    pub login_id: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User without sensitive data (for API responses and token claims shaping)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: i64,
    pub id: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            id: user.login_id,
            name: user.name,
        }
    }
}

/// User profile with contact details (for the mypage view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub groups: Vec<GroupSummary>,
}

// ============================================================================
// Group Model
// ============================================================================

/// Group entity. `owner_id` is a denormalized pointer to the creating user;
/// ownership is distinct from membership.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub group_id: i64,
    pub group_name: String,
    pub group_description: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Group identity without description (for membership listings)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupSummary {
    pub group_id: i64,
    pub group_name: String,
}

/// Group with the caller's membership flag (for the group detail view)
#[derive(Debug, Clone, Serialize)]
pub struct GroupWithMembership {
    #[serde(flatten)]
    pub group: Group,
    pub members: Vec<MemberInfo>,
    pub is_member: bool,
}

/// Membership row participant (name-only view)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MemberInfo {
    pub user_id: i64,
    pub name: String,
}

/// Membership row participant with contact details (group detail view)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MemberDetail {
    pub name: String,
    pub email: String,
}

// ============================================================================
// Board Model
// ============================================================================

/// Board entity representing a post scoped to a group
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Board {
    pub board_id: i64,
    pub title: String,
    pub contents: String,
    pub author_id: i64,
    pub group_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
