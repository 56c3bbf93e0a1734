//! Core business logic

pub mod password_service;
pub mod permission_service;
pub mod token_service;

pub use password_service::{
    PasswordDigest, PasswordService, MAX_PASSWORD_BYTES, MIN_BCRYPT_COST,
};
pub use permission_service::PermissionService;
pub use token_service::{extract_bearer, TokenService};
