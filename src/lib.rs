// src/lib.rs
//! Authentication and authorization core for the user/blog management
//! backend: password hashing, signed bearer tokens and role-based
//! (resource, action) permission checks, plus the axum routes that host them.

pub mod auth;
pub mod config;
pub mod logging;

pub use auth::{AuthError, AuthService};
pub use config::AppConfig;
