//! StudyHub - Group Membership Platform
//!
//! A membership service where users register, authenticate with dual JWT
//! tokens (access + rotating refresh), form groups, and post boards scoped
//! to a group.

pub mod auth;
pub mod config;
pub mod db;
pub mod groups;
