//! Group repository for database operations
//!
//! Provides CRUD operations for groups and the membership join table.
//! Leaving a group runs the remove/count/maybe-delete sequence inside a
//! single transaction so two concurrent leaves cannot race the group row.

use sqlx::PgPool;

use crate::db::models::{Group, GroupSummary, MemberDetail, MemberInfo};

/// Group repository error types
#[derive(Debug, thiserror::Error)]
pub enum GroupRepositoryError {
    #[error("Group not found")]
    NotFound,

    #[error("Group name already exists")]
    NameAlreadyExists,

    #[error("Already a member of this group")]
    AlreadyMember,

    #[error("Not a member of this group")]
    NotMember,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Outcome of a leave operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// True when the leaving user was the last member and the group was deleted
    pub group_deleted: bool,
}

/// Group repository for database operations
#[derive(Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Create a new group repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a group owned by `owner_id`, who becomes its first member.
    /// Group creation and the owner's membership row commit atomically.
    pub async fn create_with_owner(
        &self,
        group_name: &str,
        group_description: Option<&str>,
        owner_id: i64,
    ) -> Result<Group, GroupRepositoryError> {
        if self.find_by_name(group_name).await?.is_some() {
            return Err(GroupRepositoryError::NameAlreadyExists);
        }

        let mut tx = self.pool.begin().await?;

        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (group_name, group_description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING group_id, group_name, group_description, owner_id, created_at
            "#,
        )
        .bind(group_name)
        .bind(group_description)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO memberships (user_id, group_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(owner_id)
        .bind(group.group_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(group)
    }

    /// Find a group by ID
    pub async fn find_by_id(&self, group_id: i64) -> Result<Option<Group>, GroupRepositoryError> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            SELECT group_id, group_name, group_description, owner_id, created_at
            FROM groups
            WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// Find a group by its (globally unique) name
    pub async fn find_by_name(&self, group_name: &str) -> Result<Option<Group>, GroupRepositoryError> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            SELECT group_id, group_name, group_description, owner_id, created_at
            FROM groups
            WHERE group_name = $1
            "#,
        )
        .bind(group_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// List all groups
    pub async fn list(&self) -> Result<Vec<Group>, GroupRepositoryError> {
        let groups = sqlx::query_as::<_, Group>(
            r#"
            SELECT group_id, group_name, group_description, owner_id, created_at
            FROM groups
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    /// Delete a group by ID (memberships and boards cascade)
    pub async fn delete(&self, group_id: i64) -> Result<bool, GroupRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM groups
            WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check whether a (user, group) membership row exists
    pub async fn is_member(&self, user_id: i64, group_id: i64) -> Result<bool, GroupRepositoryError> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT user_id FROM memberships
            WHERE user_id = $1 AND group_id = $2
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Add a membership row; at most one per (user, group) pair
    pub async fn add_member(&self, user_id: i64, group_id: i64) -> Result<(), GroupRepositoryError> {
        if self.is_member(user_id, group_id).await? {
            return Err(GroupRepositoryError::AlreadyMember);
        }

        sqlx::query(
            r#"
            INSERT INTO memberships (user_id, group_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a membership row; when the last member leaves, the group itself
    /// is deleted. The removal, the remaining-member count, and the conditional
    /// delete all run in one transaction.
    pub async fn remove_member(
        &self,
        user_id: i64,
        group_id: i64,
    ) -> Result<LeaveOutcome, GroupRepositoryError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            r#"
            DELETE FROM memberships
            WHERE user_id = $1 AND group_id = $2
            "#,
        )
        .bind(user_id)
        .bind(group_id)
        .execute(&mut *tx)
        .await?;

        if removed.rows_affected() == 0 {
            return Err(GroupRepositoryError::NotMember);
        }

        let remaining: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM memberships
            WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_one(&mut *tx)
        .await?;

        let group_deleted = remaining.0 == 0;

        if group_deleted {
            sqlx::query("DELETE FROM groups WHERE group_id = $1")
                .bind(group_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(LeaveOutcome { group_deleted })
    }

    /// Count memberships for a group
    pub async fn member_count(&self, group_id: i64) -> Result<i64, GroupRepositoryError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM memberships
            WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// List members of a group (id and display name)
    pub async fn members(&self, group_id: i64) -> Result<Vec<MemberInfo>, GroupRepositoryError> {
        let members = sqlx::query_as::<_, MemberInfo>(
            r#"
            SELECT u.user_id, u.name
            FROM memberships m
            JOIN users u ON u.user_id = m.user_id
            WHERE m.group_id = $1
            ORDER BY m.joined_at
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// List members of a group with contact details
    pub async fn member_details(
        &self,
        group_id: i64,
    ) -> Result<Vec<MemberDetail>, GroupRepositoryError> {
        let members = sqlx::query_as::<_, MemberDetail>(
            r#"
            SELECT u.name, u.email
            FROM memberships m
            JOIN users u ON u.user_id = m.user_id
            WHERE m.group_id = $1
            ORDER BY m.joined_at
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// List the groups a user belongs to
    pub async fn groups_of_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<GroupSummary>, GroupRepositoryError> {
        let groups = sqlx::query_as::<_, GroupSummary>(
            r#"
            SELECT g.group_id, g.group_name
            FROM memberships m
            JOIN groups g ON g.group_id = m.group_id
            WHERE m.user_id = $1
            ORDER BY m.joined_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }
}
