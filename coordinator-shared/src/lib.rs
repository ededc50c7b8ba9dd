//! # Session Coordinator Shared Library
//!
//! Types and data access shared by the session coordinator API.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, JWTs, request auth context and authorization checks
//! - `db`: connection pool and embedded migrations
//! - `models`: database models for users, projects, sessions, payments and messages
//! - `realtime`: per-user rooms and the real-time event types

pub mod auth;
pub mod db;
pub mod models;
pub mod realtime;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
