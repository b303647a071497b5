//! User repository for database operations
//!
//! Provides CRUD operations for users with secure password hashing using
//! bcrypt, plus the single-slot refresh token storage used for session
//! rotation. Refresh tokens are stored as SHA-256 digests, never raw.

use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::db::models::User;

/// Cost factor for bcrypt hashing
const BCRYPT_COST: u32 = 10;

/// User repository error types
#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("User not found")]
    NotFound,

    #[error("Login identifier already exists")]
    LoginAlreadyExists,

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Hash a password using bcrypt with automatic salt generation
    pub fn hash_password(password: &str) -> Result<String, UserRepositoryError> {
        bcrypt::hash(password, BCRYPT_COST)
            .map_err(|e| UserRepositoryError::HashingError(e.to_string()))
    }

    /// Verify a password against a bcrypt hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, UserRepositoryError> {
        bcrypt::verify(password, hash).map_err(|e| UserRepositoryError::HashingError(e.to_string()))
    }

    /// Hash a refresh token using SHA-256 for at-rest storage
    pub fn hash_refresh_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Create a new user with a plain text password (will be hashed)
    pub async fn create(
        &self,
        login_id: &str,
        password: &str,
        name: &str,
        email: &str,
    ) -> Result<User, UserRepositoryError> {
        // Check if login identifier already exists
        if self.find_by_login(login_id).await?.is_some() {
            return Err(UserRepositoryError::LoginAlreadyExists);
        }

        let password_hash = Self::hash_password(password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (login_id, password_hash, name, email)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, login_id, password_hash, name, email,
                      refresh_token_hash, created_at, updated_at
            "#,
        )
        .bind(login_id)
        .bind(&password_hash)
        .bind(name)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by numeric ID
    pub async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, login_id, password_hash, name, email,
                   refresh_token_hash, created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by login identifier
    pub async fn find_by_login(&self, login_id: &str) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, login_id, password_hash, name, email,
                   refresh_token_hash, created_at, updated_at
            FROM users
            WHERE login_id = $1
            "#,
        )
        .bind(login_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a login identifier by email and name (id recovery)
    pub async fn find_login_by_email_and_name(
        &self,
        email: &str,
        name: &str,
    ) -> Result<Option<String>, UserRepositoryError> {
        let login: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT login_id FROM users
            WHERE email = $1 AND name = $2
            "#,
        )
        .bind(email)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(login.map(|(id,)| id))
    }

    /// Check that a (login, name, email) triple matches a stored user
    /// (password recovery precondition)
    pub async fn matches_identity(
        &self,
        login_id: &str,
        name: &str,
        email: &str,
    ) -> Result<bool, UserRepositoryError> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT user_id FROM users
            WHERE login_id = $1 AND name = $2 AND email = $3
            "#,
        )
        .bind(login_id)
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Update a user's password by login identifier (takes plain text, hashes it)
    pub async fn update_password(
        &self,
        login_id: &str,
        new_password: &str,
    ) -> Result<(), UserRepositoryError> {
        let password_hash = Self::hash_password(new_password)?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE login_id = $1
            "#,
        )
        .bind(login_id)
        .bind(&password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserRepositoryError::NotFound);
        }

        Ok(())
    }

    /// Store a refresh token in the user's single slot (last-write-wins).
    /// The raw token is hashed before storage; issuing a new refresh token
    /// overwrites the previous value, invalidating it immediately.
    pub async fn store_refresh_token(
        &self,
        user_id: i64,
        raw_token: &str,
    ) -> Result<(), UserRepositoryError> {
        let token_hash = Self::hash_refresh_token(raw_token);

        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token_hash = $2, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(&token_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserRepositoryError::NotFound);
        }

        Ok(())
    }

    /// Authenticate a user by login identifier and password.
    /// Returns the user if credentials are valid, None otherwise.
    pub async fn authenticate(
        &self,
        login_id: &str,
        password: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let user = match self.find_by_login(login_id).await? {
            Some(u) => u,
            None => return Ok(None),
        };

        let is_valid = Self::verify_password(password, &user.password_hash)?;

        if is_valid { Ok(Some(user)) } else { Ok(None) }
    }

    /// Delete a user account. Groups the user owns are disbanded, their
    /// boards and other members' membership rows cascading with them; any
    /// remaining group the exit leaves empty is deleted as well. Runs in a
    /// single transaction so a partial cascade is never visible.
    pub async fn delete_account(&self, user_id: i64) -> Result<bool, UserRepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Groups the user belongs to, checked for emptiness once the
        // membership rows are gone.
        let joined: Vec<(i64,)> =
            sqlx::query_as("SELECT group_id FROM memberships WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&mut *tx)
                .await?;
        let joined_ids: Vec<i64> = joined.into_iter().map(|(id,)| id).collect();

        sqlx::query("DELETE FROM boards WHERE author_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM groups WHERE owner_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM memberships WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            DELETE FROM groups
            WHERE group_id = ANY($1)
              AND NOT EXISTS (
                  SELECT 1 FROM memberships m WHERE m.group_id = groups.group_id
              )
            "#,
        )
        .bind(&joined_ids)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Password Hashing Tests (don't require database)
    // ========================================================================

    #[test]
    fn test_hash_password_produces_valid_bcrypt_hash() {
        let password = "my_secure_password123!";
        let hash = UserRepository::hash_password(password).unwrap();

        // Bcrypt hashes start with $2b$ (or $2a$, $2y$)
        assert!(hash.starts_with("$2b$") || hash.starts_with("$2a$") || hash.starts_with("$2y$"));

        // Bcrypt hash should be 60 characters
        assert_eq!(hash.len(), 60);
    }

    #[test]
    fn test_hash_password_produces_different_hashes_for_same_password() {
        let password = "same_password";
        let hash1 = UserRepository::hash_password(password).unwrap();
        let hash2 = UserRepository::hash_password(password).unwrap();

        // Due to random salt, hashes should be different
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct() {
        let password = "correct_password";
        let hash = UserRepository::hash_password(password).unwrap();

        let is_valid = UserRepository::verify_password(password, &hash).unwrap();
        assert!(is_valid);
    }

    #[test]
    fn test_verify_password_incorrect() {
        let password = "correct_password";
        let wrong_password = "wrong_password";
        let hash = UserRepository::hash_password(password).unwrap();

        let is_valid = UserRepository::verify_password(wrong_password, &hash).unwrap();
        assert!(!is_valid);
    }

    #[test]
    fn test_verify_password_never_accepts_hash_as_password() {
        // Presenting the stored hash itself must not authenticate
        let password = "original_password";
        let hash = UserRepository::hash_password(password).unwrap();

        let is_valid = UserRepository::verify_password(&hash, &hash).unwrap();
        assert!(!is_valid);
    }

    #[test]
    fn test_verify_password_unicode() {
        let password = "пароль_密码_🔐";
        let hash = UserRepository::hash_password(password).unwrap();

        let is_valid = UserRepository::verify_password(password, &hash).unwrap();
        assert!(is_valid);
    }

    #[test]
    fn test_verify_password_invalid_hash_format() {
        let result = UserRepository::verify_password("password", "not_a_valid_hash");
        assert!(result.is_err());
    }

    // ========================================================================
    // Refresh Token Hashing Tests
    // ========================================================================

    #[test]
    fn test_hash_refresh_token_consistent() {
        let token = "eyJhbGciOiJIUzI1NiJ9.payload.signature";
        let hash1 = UserRepository::hash_refresh_token(token);
        let hash2 = UserRepository::hash_refresh_token(token);

        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_refresh_token_is_sha256_hex() {
        let hash = UserRepository::hash_refresh_token("some_token");

        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_refresh_token_differs_per_token() {
        let hash1 = UserRepository::hash_refresh_token("token_one");
        let hash2 = UserRepository::hash_refresh_token("token_two");

        assert_ne!(hash1, hash2);
    }

    // ========================================================================
    // Error Type Tests
    // ========================================================================

    #[test]
    fn test_user_repository_error_display() {
        let err = UserRepositoryError::NotFound;
        assert_eq!(format!("{}", err), "User not found");

        let err = UserRepositoryError::LoginAlreadyExists;
        assert_eq!(format!("{}", err), "Login identifier already exists");

        let err = UserRepositoryError::HashingError("test error".to_string());
        assert!(format!("{}", err).contains("test error"));
    }

    // ========================================================================
    // Integration Tests (require database)
    // ========================================================================

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_user() {
        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let user = repo
            .create("test_create", "secure_password123", "Test User", "test_create@example.com")
            .await
            .unwrap();

        assert_eq!(user.login_id, "test_create");
        assert_eq!(user.name, "Test User");
        assert!(user.refresh_token_hash.is_none());
        // Password should be hashed, not plain text
        assert_ne!(user.password_hash, "secure_password123");
        assert!(user.password_hash.starts_with("$2"));

        // Cleanup
        repo.delete_account(user.user_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_user_duplicate_login() {
        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let user = repo
            .create("dup_login", "password", "First", "first@example.com")
            .await
            .unwrap();

        let result = repo
            .create("dup_login", "password", "Second", "second@example.com")
            .await;

        assert!(matches!(result, Err(UserRepositoryError::LoginAlreadyExists)));

        // Cleanup
        repo.delete_account(user.user_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_authenticate_wrong_password() {
        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let created = repo
            .create("auth_fail", "correct_password", "Auth Fail", "auth_fail@example.com")
            .await
            .unwrap();

        let result = repo
            .authenticate("auth_fail", "wrong_password")
            .await
            .unwrap();

        assert!(result.is_none());

        // Cleanup
        repo.delete_account(created.user_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_authenticate_nonexistent_user() {
        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let result = repo.authenticate("no_such_user", "password").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_store_refresh_token_overwrites_slot() {
        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let created = repo
            .create("slot_user", "password", "Slot User", "slot@example.com")
            .await
            .unwrap();

        repo.store_refresh_token(created.user_id, "first_token")
            .await
            .unwrap();
        repo.store_refresh_token(created.user_id, "second_token")
            .await
            .unwrap();

        let user = repo.find_by_id(created.user_id).await.unwrap().unwrap();
        assert_eq!(
            user.refresh_token_hash,
            Some(UserRepository::hash_refresh_token("second_token"))
        );

        // Cleanup
        repo.delete_account(created.user_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_delete_account_while_owning_group() {
        use crate::db::repositories::GroupRepository;

        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool.clone());
        let groups = GroupRepository::new(pool);

        let owner = repo
            .create("exit_owner", "password", "Exit Owner", "exit_owner@example.com")
            .await
            .unwrap();
        let member = repo
            .create("exit_member", "password", "Exit Member", "exit_member@example.com")
            .await
            .unwrap();

        let group = groups
            .create_with_owner("Owned At Exit", None, owner.user_id)
            .await
            .unwrap();
        groups
            .add_member(member.user_id, group.group_id)
            .await
            .unwrap();

        // The owner's exit disbands the group even with other members in it
        let deleted = repo.delete_account(owner.user_id).await.unwrap();
        assert!(deleted);

        assert!(repo.find_by_id(owner.user_id).await.unwrap().is_none());
        assert!(groups.find_by_id(group.group_id).await.unwrap().is_none());

        // The other member's account is untouched
        assert!(repo.find_by_id(member.user_id).await.unwrap().is_some());

        // Cleanup
        repo.delete_account(member.user_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_delete_account_of_last_member_deletes_group() {
        use crate::db::repositories::GroupRepository;

        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool.clone());
        let groups = GroupRepository::new(pool);

        let owner = repo
            .create("empty_owner", "password", "Empty Owner", "empty_owner@example.com")
            .await
            .unwrap();
        let member = repo
            .create("empty_member", "password", "Empty Member", "empty_member@example.com")
            .await
            .unwrap();

        let group = groups
            .create_with_owner("Emptied At Exit", None, owner.user_id)
            .await
            .unwrap();
        groups
            .add_member(member.user_id, group.group_id)
            .await
            .unwrap();

        // The owner leaves; the group survives with one member left
        let outcome = groups
            .remove_member(owner.user_id, group.group_id)
            .await
            .unwrap();
        assert!(!outcome.group_deleted);

        // The last member's exit empties the group, which goes with them
        repo.delete_account(member.user_id).await.unwrap();
        assert!(groups.find_by_id(group.group_id).await.unwrap().is_none());

        // Cleanup
        repo.delete_account(owner.user_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_delete_account() {
        let pool = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let created = repo
            .create("delete_me", "password", "Delete Me", "delete@example.com")
            .await
            .unwrap();

        let deleted = repo.delete_account(created.user_id).await.unwrap();
        assert!(deleted);

        let found = repo.find_by_id(created.user_id).await.unwrap();
        assert!(found.is_none());
    }

    // Helper function to create test pool
    async fn create_test_pool() -> PgPool {
        use crate::db::pool::{DbConfig, create_pool};

        let config = DbConfig::from_env().expect("DATABASE_URL must be set for tests");
        create_pool(&config)
            .await
            .expect("Failed to create test pool")
    }
}
