//! Group service
//!
//! Business logic for groups, memberships, and boards, including the
//! authorization rules that gate every mutation:
//! - creating a group requires a free name; the creator becomes owner and
//!   first member
//! - disbanding requires ownership AND a current membership, checked
//!   independently (an owner who left may not disband)
//! - posting a board requires membership in the target group
//! - editing or deleting a board requires strict authorship, not membership

use crate::auth::service::AuthError;
use crate::db::models::{Board, Group, GroupWithMembership, MemberDetail};
use crate::db::repositories::{
    BoardRepository, BoardRepositoryError, GroupRepository, GroupRepositoryError, LeaveOutcome,
};

/// Group service error types
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("Group not found")]
    GroupNotFound,

    #[error("Board not found")]
    BoardNotFound,

    #[error("Group name already exists")]
    NameTaken,

    #[error("Already a member of this group")]
    AlreadyMember,

    #[error("Not a member of this group")]
    NotMember,

    #[error("Requester does not own this group")]
    NotOwner,

    #[error("Membership required")]
    MembershipRequired,

    #[error("Requester is not the author of this board")]
    NotAuthor,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<GroupRepositoryError> for GroupError {
    fn from(err: GroupRepositoryError) -> Self {
        match err {
            GroupRepositoryError::NotFound => GroupError::GroupNotFound,
            GroupRepositoryError::NameAlreadyExists => GroupError::NameTaken,
            GroupRepositoryError::AlreadyMember => GroupError::AlreadyMember,
            GroupRepositoryError::NotMember => GroupError::NotMember,
            GroupRepositoryError::DatabaseError(e) => GroupError::InternalError(e.to_string()),
        }
    }
}

impl From<BoardRepositoryError> for GroupError {
    fn from(err: BoardRepositoryError) -> Self {
        match err {
            BoardRepositoryError::NotFound => GroupError::BoardNotFound,
            BoardRepositoryError::DatabaseError(e) => GroupError::InternalError(e.to_string()),
        }
    }
}

/// Group creation request
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateGroupRequest {
    pub group_name: String,
    pub group_description: Option<String>,
}

/// Board creation/update request
#[derive(Debug, Clone, serde::Deserialize)]
pub struct BoardRequest {
    pub title: String,
    pub contents: String,
}

/// Group service
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
    board_repo: BoardRepository,
}

impl GroupService {
    /// Create a new group service
    pub fn new(group_repo: GroupRepository, board_repo: BoardRepository) -> Self {
        Self {
            group_repo,
            board_repo,
        }
    }

    /// List all groups
    pub async fn list_groups(&self) -> Result<Vec<Group>, GroupError> {
        Ok(self.group_repo.list().await?)
    }

    /// Look up a group with its members and the viewer's membership flag
    pub async fn group_detail(
        &self,
        group_id: i64,
        viewer_id: i64,
    ) -> Result<GroupWithMembership, GroupError> {
        let group = self
            .group_repo
            .find_by_id(group_id)
            .await?
            .ok_or(GroupError::GroupNotFound)?;

        let members = self.group_repo.members(group_id).await?;
        let is_member = members.iter().any(|m| m.user_id == viewer_id);

        Ok(GroupWithMembership {
            group,
            members,
            is_member,
        })
    }

    /// List a group's members with contact details
    pub async fn member_details(&self, group_id: i64) -> Result<Vec<MemberDetail>, GroupError> {
        if self.group_repo.find_by_id(group_id).await?.is_none() {
            return Err(GroupError::GroupNotFound);
        }

        Ok(self.group_repo.member_details(group_id).await?)
    }

    /// Create a group; the requester becomes its owner and first member
    pub async fn create_group(
        &self,
        request: CreateGroupRequest,
        owner_id: i64,
    ) -> Result<Group, GroupError> {
        let group = self
            .group_repo
            .create_with_owner(
                &request.group_name,
                request.group_description.as_deref(),
                owner_id,
            )
            .await?;

        Ok(group)
    }

    /// Disband a group. Requires the requester to be the group's owner AND a
    /// current member; the checks are independent and either failing rejects.
    pub async fn disband_group(&self, group_id: i64, requester_id: i64) -> Result<(), GroupError> {
        let group = self
            .group_repo
            .find_by_id(group_id)
            .await?
            .ok_or(GroupError::GroupNotFound)?;

        if group.owner_id != requester_id {
            return Err(GroupError::NotOwner);
        }

        if !self.group_repo.is_member(requester_id, group_id).await? {
            return Err(GroupError::NotMember);
        }

        self.group_repo.delete(group_id).await?;

        Ok(())
    }

    /// Join a group
    pub async fn join_group(&self, group_id: i64, user_id: i64) -> Result<(), GroupError> {
        if self.group_repo.find_by_id(group_id).await?.is_none() {
            return Err(GroupError::GroupNotFound);
        }

        self.group_repo.add_member(user_id, group_id).await?;

        Ok(())
    }

    /// Leave a group; the group is deleted when its last member leaves
    pub async fn leave_group(
        &self,
        group_id: i64,
        user_id: i64,
    ) -> Result<LeaveOutcome, GroupError> {
        Ok(self.group_repo.remove_member(user_id, group_id).await?)
    }

    /// List boards in a group
    pub async fn list_boards(&self, group_id: i64) -> Result<Vec<Board>, GroupError> {
        Ok(self.board_repo.list_in_group(group_id).await?)
    }

    /// Look up one board within a group
    pub async fn get_board(&self, group_id: i64, board_id: i64) -> Result<Board, GroupError> {
        self.board_repo
            .find_in_group(board_id, group_id)
            .await?
            .ok_or(GroupError::BoardNotFound)
    }

    /// Create a board; the author must currently be a member of the group
    pub async fn create_board(
        &self,
        group_id: i64,
        author_id: i64,
        request: BoardRequest,
    ) -> Result<Board, GroupError> {
        if !self.group_repo.is_member(author_id, group_id).await? {
            return Err(GroupError::MembershipRequired);
        }

        let board = self
            .board_repo
            .create(&request.title, &request.contents, author_id, group_id)
            .await?;

        Ok(board)
    }

    /// Update a board. Existence is checked before authorship, so an outsider
    /// probing a missing board sees 404, and a co-member sees 403.
    pub async fn update_board(
        &self,
        group_id: i64,
        board_id: i64,
        requester_id: i64,
        request: BoardRequest,
    ) -> Result<Board, GroupError> {
        let board = self.get_board(group_id, board_id).await?;

        if board.author_id != requester_id {
            return Err(GroupError::NotAuthor);
        }

        let board = self
            .board_repo
            .update(board.board_id, &request.title, &request.contents)
            .await?;

        Ok(board)
    }

    /// Delete a board; same existence-then-authorship order as update
    pub async fn delete_board(
        &self,
        group_id: i64,
        board_id: i64,
        requester_id: i64,
    ) -> Result<(), GroupError> {
        let board = self.get_board(group_id, board_id).await?;

        if board.author_id != requester_id {
            return Err(GroupError::NotAuthor);
        }

        self.board_repo.delete(board.board_id).await?;

        Ok(())
    }
}
