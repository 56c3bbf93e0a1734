//! Authentication error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Credential store error
///
/// `NotFound` is the only kind the auth flows treat as an expected outcome;
/// everything else aborts the current request unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Authentication error
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header is required")]
    MissingHeader,

    #[error("authorization header format must be Bearer {{token}}")]
    MalformedHeader,

    #[error("token is required")]
    MissingToken,

    #[error("malformed token")]
    MalformedToken,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("user not found")]
    IdentityNotFound,

    #[error("username already exists")]
    DuplicateUsername,

    #[error("email already exists")]
    DuplicateEmail,

    #[error("permission denied: {resource}:{action}")]
    PermissionDenied { resource: String, action: String },

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("password verification failed: {0}")]
    Verification(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,

            Self::MissingHeader
            | Self::MalformedHeader
            | Self::MissingToken
            | Self::MalformedToken
            | Self::InvalidSignature
            | Self::TokenExpired
            | Self::InvalidCredentials
            | Self::IdentityNotFound => StatusCode::UNAUTHORIZED,

            Self::PermissionDenied { .. } => StatusCode::FORBIDDEN,

            Self::DuplicateUsername | Self::DuplicateEmail => StatusCode::CONFLICT,

            Self::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,

            Self::Store(StoreError::Unavailable(_))
            | Self::Hashing(_)
            | Self::Verification(_)
            | Self::Config(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code for clients
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "missing_header",
            Self::MalformedHeader => "malformed_header",
            Self::MissingToken => "missing_token",
            Self::MalformedToken => "malformed_token",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired => "token_expired",
            Self::InvalidCredentials => "invalid_credentials",
            Self::IdentityNotFound => "identity_not_found",
            Self::DuplicateUsername => "duplicate_username",
            Self::DuplicateEmail => "duplicate_email",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Hashing(_) | Self::Verification(_) | Self::Internal(_) => "server_error",
            Self::Validation(_) => "validation_error",
            Self::Config(_) => "config_error",
            Self::Store(StoreError::NotFound) => "not_found",
            Self::Store(_) => "storage_error",
        }
    }

    /// User-facing message. Internal details stay in `details`/logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingHeader => "Authorization header is required",
            Self::MalformedHeader => "Authorization header format must be Bearer {token}",
            Self::MissingToken => "Access token is required",
            Self::MalformedToken | Self::InvalidSignature => "Invalid access token",
            Self::TokenExpired => "Access token has expired, please log in again",
            Self::InvalidCredentials => "Invalid username or password",
            Self::IdentityNotFound => "User no longer exists",
            Self::DuplicateUsername => "Username is already taken",
            Self::DuplicateEmail => "Email is already registered",
            Self::PermissionDenied { .. } => "Permission denied",
            Self::Validation(_) => "Invalid input",
            Self::Store(StoreError::NotFound) => "Not found",
            Self::Hashing(_)
            | Self::Verification(_)
            | Self::Config(_)
            | Self::Store(_)
            | Self::Internal(_) => "Internal server error, please retry later",
        }
    }

    /// True for the 5xx kinds that callers should treat as infrastructure failures
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_internal() {
            tracing::error!(error = %self, "request failed");
        }

        let details = if self.is_internal() {
            self.user_message().to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "code": self.error_code(),
            "message": self.user_message(),
            "details": details,
        }));

        (status, body).into_response()
    }
}
