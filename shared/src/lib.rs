//! Userbase Shared Types
//!
//! API request/response types, the response envelope, and input validation
//! helpers shared between the backend and API consumers.

pub mod types;
pub mod validation;
