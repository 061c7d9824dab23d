//! Request middleware
//!
//! Composable request transformations applied before transport, using sum
//! types rather than trait object inheritance.

pub mod auth;

pub use auth::{Auth, AuthError};
