//! Database repositories for StudyHub
//!
//! This module provides repository implementations for database operations.
//! Repositories encapsulate data access logic and provide a clean API for
//! business logic to interact with the database.

pub mod board;
pub mod group;
pub mod user;

pub use board::{BoardRepository, BoardRepositoryError};
pub use group::{GroupRepository, GroupRepositoryError, LeaveOutcome};
pub use user::{UserRepository, UserRepositoryError};
