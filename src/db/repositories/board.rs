//! Board repository for database operations
//!
//! Boards are posts scoped to a group. Lookups are always scoped by
//! (board_id, group_id) so a board can never be addressed through the
//! wrong group.

use sqlx::PgPool;

use crate::db::models::Board;

/// Board repository error types
#[derive(Debug, thiserror::Error)]
pub enum BoardRepositoryError {
    #[error("Board not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Board repository for database operations
#[derive(Clone)]
pub struct BoardRepository {
    pool: PgPool,
}

impl BoardRepository {
    /// Create a new board repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a board in a group
    pub async fn create(
        &self,
        title: &str,
        contents: &str,
        author_id: i64,
        group_id: i64,
    ) -> Result<Board, BoardRepositoryError> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            INSERT INTO boards (title, contents, author_id, group_id)
            VALUES ($1, $2, $3, $4)
            RETURNING board_id, title, contents, author_id, group_id, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(contents)
        .bind(author_id)
        .bind(group_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(board)
    }

    /// Find a board by ID within a group
    pub async fn find_in_group(
        &self,
        board_id: i64,
        group_id: i64,
    ) -> Result<Option<Board>, BoardRepositoryError> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            SELECT board_id, title, contents, author_id, group_id, created_at, updated_at
            FROM boards
            WHERE board_id = $1 AND group_id = $2
            "#,
        )
        .bind(board_id)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(board)
    }

    /// List all boards in a group
    pub async fn list_in_group(&self, group_id: i64) -> Result<Vec<Board>, BoardRepositoryError> {
        let boards = sqlx::query_as::<_, Board>(
            r#"
            SELECT board_id, title, contents, author_id, group_id, created_at, updated_at
            FROM boards
            WHERE group_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(boards)
    }

    /// Update a board's title and contents
    pub async fn update(
        &self,
        board_id: i64,
        title: &str,
        contents: &str,
    ) -> Result<Board, BoardRepositoryError> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            UPDATE boards
            SET title = $2, contents = $3, updated_at = NOW()
            WHERE board_id = $1
            RETURNING board_id, title, contents, author_id, group_id, created_at, updated_at
            "#,
        )
        .bind(board_id)
        .bind(title)
        .bind(contents)
        .fetch_optional(&self.pool)
        .await?;

        board.ok_or(BoardRepositoryError::NotFound)
    }

    /// Delete a board by ID
    pub async fn delete(&self, board_id: i64) -> Result<bool, BoardRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM boards
            WHERE board_id = $1
            "#,
        )
        .bind(board_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_repository_error_display() {
        let err = BoardRepositoryError::NotFound;
        assert_eq!(format!("{}", err), "Board not found");
    }

    // ========================================================================
    // Integration Tests (require database)
    // ========================================================================

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_board_scoped_lookup() {
        use crate::db::repositories::{GroupRepository, UserRepository};

        let pool = {
            use crate::db::pool::{DbConfig, create_pool};
            let config = DbConfig::from_env().expect("DATABASE_URL must be set for tests");
            create_pool(&config).await.expect("Failed to create test pool")
        };

        let users = UserRepository::new(pool.clone());
        let groups = GroupRepository::new(pool.clone());
        let boards = BoardRepository::new(pool.clone());

        let author = users
            .create("board_author", "Password123", "Board Author", "board_author@example.com")
            .await
            .unwrap();
        let group_a = groups
            .create_with_owner("Board Group A", None, author.user_id)
            .await
            .unwrap();
        let group_b = groups
            .create_with_owner("Board Group B", None, author.user_id)
            .await
            .unwrap();

        let board = boards
            .create("Title", "Contents", author.user_id, group_a.group_id)
            .await
            .unwrap();

        // Visible through its own group, invisible through another
        let found = boards
            .find_in_group(board.board_id, group_a.group_id)
            .await
            .unwrap();
        assert!(found.is_some());

        let misrouted = boards
            .find_in_group(board.board_id, group_b.group_id)
            .await
            .unwrap();
        assert!(misrouted.is_none());

        // Cleanup
        groups.delete(group_a.group_id).await.unwrap();
        groups.delete(group_b.group_id).await.unwrap();
        users.delete_account(author.user_id).await.unwrap();
    }
}
