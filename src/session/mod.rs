//! Per-user state kept by a front end between requests.

pub mod command;
pub mod rate_limit;
pub mod settings;

/// Identifier of the user a request belongs to
pub type UserId = u64;
