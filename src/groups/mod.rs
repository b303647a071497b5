//! Groups module for StudyHub
//!
//! Groups, memberships, boards, and the authorization rules that gate their
//! mutation (ownership, membership, authorship).

pub mod api;
pub mod service;

pub use api::{GroupApiState, group_api_router};
pub use service::{BoardRequest, CreateGroupRequest, GroupError, GroupService};
