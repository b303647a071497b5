//! Group API endpoints
//!
//! REST API for groups, memberships, and boards, mounted under `/group`:
//! - GET / - List all groups
//! - GET /{group_id} - Group detail with the caller's membership flag
//! - GET /{group_id}/detail - Members with contact details
//! - POST /create - Create a group (creator becomes owner and first member)
//! - DELETE /{group_id}/delete - Disband (owner + member required)
//! - POST /{group_id}/join - Join a group
//! - POST /{group_id}/leave - Leave; last member out deletes the group
//! - GET /{group_id}/board - List boards
//! - GET /{group_id}/board/{board_id} - One board
//! - POST /{group_id}/board/create - Post a board (members only)
//! - PATCH /{group_id}/board/{board_id}/update - Edit (author only)
//! - DELETE /{group_id}/board/{board_id}/delete - Delete (author only)

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::gate::authenticate;
use crate::auth::service::AuthService;
use crate::db::models::{Board, Group, GroupWithMembership, MemberDetail};
use crate::groups::service::{BoardRequest, CreateGroupRequest, GroupError, GroupService};

/// Group API state containing the group service and the auth service for
/// request guarding
#[derive(Clone)]
pub struct GroupApiState {
    pub auth_service: AuthService,
    pub group_service: GroupService,
}

/// Convert GroupError to API response
impl IntoResponse for GroupError {
    fn into_response(self) -> Response {
        let status = match &self {
            GroupError::GroupNotFound | GroupError::BoardNotFound | GroupError::NotMember => {
                StatusCode::NOT_FOUND
            }
            GroupError::NameTaken | GroupError::AlreadyMember => StatusCode::CONFLICT,
            GroupError::NotOwner => StatusCode::UNAUTHORIZED,
            GroupError::MembershipRequired | GroupError::NotAuthor => StatusCode::FORBIDDEN,
            GroupError::Auth(_) => StatusCode::UNAUTHORIZED,
            GroupError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match status {
            StatusCode::UNAUTHORIZED => "Unauthorized".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("internal group error: {self}");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

/// Generic message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Create the group API router
pub fn group_api_router(state: GroupApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/", get(list_groups_handler))
        .route("/create", post(create_group_handler))
        .route("/{group_id}", get(group_detail_handler))
        .route("/{group_id}/detail", get(member_details_handler))
        .route("/{group_id}/delete", delete(disband_group_handler))
        .route("/{group_id}/join", post(join_group_handler))
        .route("/{group_id}/leave", post(leave_group_handler))
        .route("/{group_id}/board", get(list_boards_handler))
        .route("/{group_id}/board/create", post(create_board_handler))
        .route("/{group_id}/board/{board_id}", get(get_board_handler))
        .route(
            "/{group_id}/board/{board_id}/update",
            patch(update_board_handler),
        )
        .route(
            "/{group_id}/board/{board_id}/delete",
            delete(delete_board_handler),
        )
        .with_state(state)
}

/// GET /group
/// List all groups (no authentication required)
async fn list_groups_handler(
    State(state): State<Arc<GroupApiState>>,
) -> Result<Json<Vec<Group>>, GroupError> {
    let groups = state.group_service.list_groups().await?;

    Ok(Json(groups))
}

/// GET /group/{group_id}
/// Group detail with members and the caller's membership flag
async fn group_detail_handler(
    State(state): State<Arc<GroupApiState>>,
    Path(group_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<GroupWithMembership>, GroupError> {
    let user = authenticate(&state.auth_service, &headers).await?;

    let detail = state
        .group_service
        .group_detail(group_id, user.user_id)
        .await?;

    Ok(Json(detail))
}

/// GET /group/{group_id}/detail
/// Members with contact details
async fn member_details_handler(
    State(state): State<Arc<GroupApiState>>,
    Path(group_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Vec<MemberDetail>>, GroupError> {
    authenticate(&state.auth_service, &headers).await?;

    let members = state.group_service.member_details(group_id).await?;

    Ok(Json(members))
}

/// POST /group/create
/// Create a group owned by the caller
async fn create_group_handler(
    State(state): State<Arc<GroupApiState>>,
    headers: HeaderMap,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), GroupError> {
    let user = authenticate(&state.auth_service, &headers).await?;

    let group = state
        .group_service
        .create_group(request, user.user_id)
        .await?;

    tracing::info!("group created: {} (owner {})", group.group_name, user.login_id);

    Ok((StatusCode::CREATED, Json(group)))
}

/// DELETE /group/{group_id}/delete
/// Disband a group; requires ownership and membership
async fn disband_group_handler(
    State(state): State<Arc<GroupApiState>>,
    Path(group_id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, GroupError> {
    let user = authenticate(&state.auth_service, &headers).await?;

    match state
        .group_service
        .disband_group(group_id, user.user_id)
        .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        // Both rejection reasons surface as a bare 401
        Err(GroupError::NotOwner) | Err(GroupError::NotMember) => {
            tracing::debug!("disband rejected for user {}", user.user_id);
            Err(GroupError::NotOwner)
        }
        Err(e) => Err(e),
    }
}

/// POST /group/{group_id}/join
async fn join_group_handler(
    State(state): State<Arc<GroupApiState>>,
    Path(group_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, GroupError> {
    let user = authenticate(&state.auth_service, &headers).await?;

    state.group_service.join_group(group_id, user.user_id).await?;

    Ok(Json(MessageResponse {
        message: "Successfully joined the group.".to_string(),
    }))
}

/// POST /group/{group_id}/leave
async fn leave_group_handler(
    State(state): State<Arc<GroupApiState>>,
    Path(group_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, GroupError> {
    let user = authenticate(&state.auth_service, &headers).await?;

    let outcome = state
        .group_service
        .leave_group(group_id, user.user_id)
        .await?;

    if outcome.group_deleted {
        tracing::info!("group {} deleted after last member left", group_id);
    }

    Ok(Json(MessageResponse {
        message: "Successfully left the group".to_string(),
    }))
}

/// GET /group/{group_id}/board
async fn list_boards_handler(
    State(state): State<Arc<GroupApiState>>,
    Path(group_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Vec<Board>>, GroupError> {
    authenticate(&state.auth_service, &headers).await?;

    let boards = state.group_service.list_boards(group_id).await?;

    Ok(Json(boards))
}

/// GET /group/{group_id}/board/{board_id}
async fn get_board_handler(
    State(state): State<Arc<GroupApiState>>,
    Path((group_id, board_id)): Path<(i64, i64)>,
    headers: HeaderMap,
) -> Result<Json<Board>, GroupError> {
    authenticate(&state.auth_service, &headers).await?;

    let board = state.group_service.get_board(group_id, board_id).await?;

    Ok(Json(board))
}

/// POST /group/{group_id}/board/create
/// Post a board; the author must be a member of the group
async fn create_board_handler(
    State(state): State<Arc<GroupApiState>>,
    Path(group_id): Path<i64>,
    headers: HeaderMap,
    Json(request): Json<BoardRequest>,
) -> Result<(StatusCode, Json<Board>), GroupError> {
    let user = authenticate(&state.auth_service, &headers).await?;

    let board = state
        .group_service
        .create_board(group_id, user.user_id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(board)))
}

/// PATCH /group/{group_id}/board/{board_id}/update
/// Edit a board; author only
async fn update_board_handler(
    State(state): State<Arc<GroupApiState>>,
    Path((group_id, board_id)): Path<(i64, i64)>,
    headers: HeaderMap,
    Json(request): Json<BoardRequest>,
) -> Result<Json<MessageResponse>, GroupError> {
    let user = authenticate(&state.auth_service, &headers).await?;

    state
        .group_service
        .update_board(group_id, board_id, user.user_id, request)
        .await?;

    Ok(Json(MessageResponse {
        message: "Update successful".to_string(),
    }))
}

/// DELETE /group/{group_id}/board/{board_id}/delete
/// Delete a board; author only
async fn delete_board_handler(
    State(state): State<Arc<GroupApiState>>,
    Path((group_id, board_id)): Path<(i64, i64)>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, GroupError> {
    let user = authenticate(&state.auth_service, &headers).await?;

    state
        .group_service
        .delete_board(group_id, board_id, user.user_id)
        .await?;

    Ok(Json(MessageResponse {
        message: "Delete successful".to_string(),
    }))
}
