//! API request handlers (thin)

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::auth::{
    core::MAX_PASSWORD_BYTES,
    errors::AuthError,
    types::{AuthenticatedUser, Identity, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    AuthService,
};

/// Registration handler
pub async fn register(
    State(service): State<Arc<AuthService>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AuthError> {
    validate_register(&req)?;
    info!("API: registration request");

    service.register(req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// Login handler
pub async fn login(
    State(service): State<Arc<AuthService>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(AuthError::Validation("username and password are required".to_string()));
    }

    let token = service.login(&req.username, &req.password).await?;
    Ok(Json(LoginResponse { token }))
}

/// Current user handler
pub async fn me(AuthenticatedUser(identity): AuthenticatedUser) -> Json<Identity> {
    Json(identity)
}

/// Report whether the current user holds `(resource, action)`
pub async fn check_permission(
    State(service): State<Arc<AuthService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path((resource, action)): Path<(String, String)>,
) -> Json<Value> {
    let allowed = service.check_permission(Some(&identity), &resource, &action);
    Json(json!({
        "resource": resource,
        "action": action,
        "allowed": allowed,
    }))
}

fn validate_register(req: &RegisterRequest) -> Result<(), AuthError> {
    let username_len = req.username.chars().count();
    if !(3..=30).contains(&username_len) {
        return Err(AuthError::Validation(
            "username must be between 3 and 30 characters".to_string(),
        ));
    }
    if !is_valid_email(&req.email) {
        return Err(AuthError::Validation("email is not valid".to_string()));
    }
    if req.password.chars().count() < 6 {
        return Err(AuthError::Validation(
            "password must be at least 6 characters".to_string(),
        ));
    }
    if req.password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::Validation(format!(
            "password must be at most {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}
